//! Recommendation queries
//! Look a recipe up, search its neighbors, drop the recipe itself

use indexmap::IndexMap;

use crate::corpus::EncodedCorpus;
use crate::error::{RecommendError, Result};
use crate::index::{IndexParams, Neighbor, SpatialIndex};
use crate::recipe::RecipeId;

/// Number of recommendations returned when the caller does not ask for a count.
pub const DEFAULT_K: usize = 6;

/// Validates a neighbor count coming from an outer layer as a signed integer.
///
/// # Examples
///
/// ```
/// use recipe_knn::query::neighbor_count;
///
/// assert_eq!(neighbor_count(3).unwrap(), 3);
/// assert!(neighbor_count(0).is_err());
/// assert!(neighbor_count(-2).is_err());
/// ```
pub fn neighbor_count(k: i64) -> Result<usize> {
    if k < 1 {
        return Err(RecommendError::InvalidArgument(format!(
            "k must be at least 1, got {}",
            k
        )));
    }
    usize::try_from(k).map_err(|_| RecommendError::InvalidArgument(format!("k {} is too large", k)))
}

/// A querying session: one corpus and the index built over it.
///
/// The index is built once and is read-only afterwards, so a `Recommender`
/// can be shared across threads for concurrent queries.
pub struct Recommender<'a> {
    corpus: &'a EncodedCorpus,
    index: SpatialIndex,
}

impl<'a> Recommender<'a> {
    /// Starts a session with the default index parameters.
    pub fn new(corpus: &'a EncodedCorpus) -> Result<Self> {
        Self::with_params(corpus, &IndexParams::default())
    }

    pub fn with_params(corpus: &'a EncodedCorpus, params: &IndexParams) -> Result<Self> {
        let index = SpatialIndex::from_corpus(corpus, params)?;
        Ok(Recommender { corpus, index })
    }

    pub fn corpus(&self) -> &EncodedCorpus {
        self.corpus
    }

    /// Returns up to `k` recipes nearest to recipe `id`, nearest first, never
    /// including `id` itself.
    ///
    /// The index is asked for `k + 1` neighbors; the first hit carrying `id` is
    /// removed and the rest truncated to `k`. When other recipes share `id`'s
    /// exact ingredients and come earlier in the corpus, `id` may not be among
    /// the hits at all, in which case nothing is removed before truncating.
    ///
    /// # Examples
    ///
    /// ```
    /// use recipe_knn::{build, Recipe, Recommender};
    ///
    /// let corpus = build(&[
    ///     Recipe::new(1, ["egg", "flour"]),
    ///     Recipe::new(2, ["egg", "flour", "sugar"]),
    ///     Recipe::new(3, ["beef", "onion"]),
    /// ]).unwrap();
    /// let session = Recommender::new(&corpus).unwrap();
    ///
    /// assert_eq!(session.recommend(1, 1).unwrap(), vec![2]);
    /// assert_eq!(session.recommend(1, 2).unwrap(), vec![2, 3]);
    /// ```
    pub fn recommend(&self, id: RecipeId, k: usize) -> Result<Vec<RecipeId>> {
        Ok(self.neighbors(id, k)?.into_iter().map(|n| n.id).collect())
    }

    /// Same as [`recommend`](Recommender::recommend), keeping the distances.
    pub fn neighbors(&self, id: RecipeId, k: usize) -> Result<Vec<Neighbor>> {
        check_k(k)?;

        let vector = self.corpus.get(id).ok_or(RecommendError::UnknownRecipe(id))?;
        let mut hits = self.index.query(vector, k.saturating_add(1))?;

        if let Some(own) = hits.iter().position(|hit| hit.id == id) {
            hits.remove(own);
        }
        hits.truncate(k);

        Ok(hits)
    }

    /// Recommends for each id in turn, stopping at the first failure.
    ///
    /// Keys keep the order of `ids`; a repeated id keeps its first position.
    /// `k` is checked even when `ids` is empty.
    pub fn recommend_batch(&self, ids: &[RecipeId], k: usize) -> Result<IndexMap<RecipeId, Vec<RecipeId>>> {
        check_k(k)?;

        let mut results = IndexMap::with_capacity(ids.len());
        for &id in ids {
            if results.contains_key(&id) {
                continue;
            }
            let recommendations = self.recommend(id, k)?;
            results.insert(id, recommendations);
        }
        Ok(results)
    }

    /// Searches for each id independently, keeping distances and reporting
    /// failures per id. Only an invalid `k` fails the whole call.
    pub fn recommend_each(&self, ids: &[RecipeId], k: usize) -> Result<Vec<(RecipeId, Result<Vec<Neighbor>>)>> {
        check_k(k)?;
        Ok(ids.iter().map(|&id| (id, self.neighbors(id, k))).collect())
    }
}

fn check_k(k: usize) -> Result<()> {
    if k < 1 {
        return Err(RecommendError::InvalidArgument("k must be at least 1".to_string()));
    }
    Ok(())
}

/// One-shot [`Recommender::recommend`]: builds the index, answers, drops it.
pub fn recommend(corpus: &EncodedCorpus, id: RecipeId, k: usize) -> Result<Vec<RecipeId>> {
    Recommender::new(corpus)?.recommend(id, k)
}

/// One-shot [`Recommender::recommend_batch`] over a shared index.
pub fn recommend_batch(corpus: &EncodedCorpus, ids: &[RecipeId], k: usize) -> Result<IndexMap<RecipeId, Vec<RecipeId>>> {
    Recommender::new(corpus)?.recommend_batch(ids, k)
}
