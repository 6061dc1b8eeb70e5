//! The encoded corpus module
//! Turns recipes into binary ingredient vectors and persists them

use crate::error::{RecommendError, Result};
use crate::recipe::{Recipe, RecipeId};
use crate::vocab::Vocabulary;
use bincode::Options;
use serde::{Serialize, Deserialize};
use std:: {
    collections::HashMap,
    fs::File,
    io::{
        BufRead,
        BufReader,
        BufWriter,
    },
    path::Path,
};

/// Bumped whenever the on-disk layout changes.
const FORMAT_VERSION: u32 = 1;

/// Recipe id → binary ingredient vector, over one fixed vocabulary.
///
/// Vectors are stored contiguously as `[r1_c1, r1_c2, ..., r2_c1, r2_c2, ...]`
/// in feed order; `ids[i]` owns row `i`. The corpus is read-only once built.
#[derive(Clone, Debug)]
pub struct EncodedCorpus {
    vocabulary: Vocabulary,
    ids: Vec<RecipeId>,
    vectors: Vec<u8>,
    dimension: usize,
    rows: HashMap<RecipeId, usize>,
}

#[derive(Serialize)]
struct StoredCorpusRef<'a> {
    format_version: u32,
    vocabulary: &'a Vocabulary,
    ids: &'a [RecipeId],
    dimension: usize,
    vectors: &'a [u8],
}

#[derive(Deserialize)]
struct StoredCorpus {
    format_version: u32,
    vocabulary: Vocabulary,
    ids: Vec<RecipeId>,
    dimension: usize,
    vectors: Vec<u8>,
}

/// Same wire format as `bincode::serialize`, but bytes left over after the
/// envelope are an error.
fn artifact_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encodes one recipe over `vocabulary`.
///
/// Column `j` is 1 when the vocabulary's `j`-th ingredient appears in the
/// recipe. Ingredients unknown to the vocabulary are skipped.
///
/// # Examples
///
/// ```
/// use recipe_knn::{Recipe, Vocabulary, corpus::encode_recipe};
///
/// let vocab = Vocabulary::build(&[Recipe::new(1, ["egg", "flour", "sugar"])]).unwrap();
/// let row = encode_recipe(&Recipe::new(2, ["sugar", "egg", "saffron"]), &vocab);
/// assert_eq!(row, vec![1, 0, 1]);
/// ```
pub fn encode_recipe(recipe: &Recipe, vocabulary: &Vocabulary) -> Vec<u8> {
    let mut row = vec![0u8; vocabulary.len()];
    for column in recipe.ingredients.iter().filter_map(|i| vocabulary.column_of(i)) {
        row[column] = 1;
    }
    row
}

/// Builds the encoded corpus for a recipe feed.
///
/// Fails with `EmptyCorpus` on zero recipes and with `InvalidArgument` when
/// two recipes share an id.
///
/// # Examples
///
/// ```
/// use recipe_knn::{build, Recipe};
///
/// let corpus = build(&[
///     Recipe::new(1, ["egg", "flour"]),
///     Recipe::new(2, ["egg", "flour", "sugar"]),
/// ]).unwrap();
///
/// assert_eq!(corpus.count(), 2);
/// assert_eq!(corpus.dimension(), 3);
/// assert_eq!(corpus.get(1), Some(&[1u8, 1, 0][..]));
/// ```
pub fn build(recipes: &[Recipe]) -> Result<EncodedCorpus> {
    let vocabulary = Vocabulary::build(recipes)?;
    let dimension = vocabulary.len();

    let mut ids = Vec::with_capacity(recipes.len());
    let mut rows = HashMap::with_capacity(recipes.len());
    let mut vectors = Vec::with_capacity(recipes.len() * dimension);

    for recipe in recipes {
        if rows.insert(recipe.id, ids.len()).is_some() {
            return Err(RecommendError::InvalidArgument(format!(
                "duplicate recipe id {} in corpus",
                recipe.id
            )));
        }
        ids.push(recipe.id);
        vectors.extend(encode_recipe(recipe, &vocabulary));
    }

    Ok(EncodedCorpus { vocabulary, ids, vectors, dimension, rows })
}

/// Encodes the corpus into an opaque byte artifact.
pub fn serialize(corpus: &EncodedCorpus) -> Result<Vec<u8>> {
    let bytes = bincode::serialize(&corpus.stored())
        .map_err(|e| RecommendError::InvalidArgument(format!("Serialization failed: {}", e)))?;
    Ok(bytes)
}

/// Decodes an artifact produced by [`serialize`], validating it before use.
///
/// Any undecodable, truncated, or internally inconsistent artifact fails with
/// `Deserialization`.
pub fn deserialize(bytes: &[u8]) -> Result<EncodedCorpus> {
    let stored: StoredCorpus = artifact_options().deserialize(bytes)?;
    EncodedCorpus::from_stored(stored)
}

impl EncodedCorpus {
    /// Returns the vector of recipe `id`, or `None` if the id is not in the corpus.
    pub fn get(&self, id: RecipeId) -> Option<&[u8]> {
        self.rows.get(&id).map(|&row| self.vector_at(row))
    }

    pub fn contains(&self, id: RecipeId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Row position of recipe `id` (its feed order).
    pub fn row_of(&self, id: RecipeId) -> Option<usize> {
        self.rows.get(&id).copied()
    }

    /// Returns the number of recipes in the corpus.
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// Width of every vector, equal to the vocabulary size.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Recipe ids in row order.
    pub fn ids(&self) -> &[RecipeId] {
        &self.ids
    }

    /// Iterates `(id, vector)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (RecipeId, &[u8])> {
        self.ids
            .iter()
            .enumerate()
            .map(|(row, &id)| (id, self.vector_at(row)))
    }

    /// Ingredients present in recipe `id`, decoded back through the vocabulary.
    pub fn ingredients_of(&self, id: RecipeId) -> Option<Vec<&str>> {
        let vector = self.get(id)?;
        Some(
            vector
                .iter()
                .enumerate()
                .filter(|&(_, &cell)| cell == 1)
                .filter_map(|(column, _)| self.vocabulary.ingredient(column))
                .collect(),
        )
    }

    /// Retrieves a vector slice from the flat array by row.
    ///
    /// # Panics
    ///
    /// Panics if the row is out of bounds.
    pub(crate) fn vector_at(&self, row: usize) -> &[u8] {
        let start = row * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// Saves the corpus to a file using the [`serialize`] format.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use recipe_knn::{build, Recipe};
    ///
    /// let corpus = build(&[Recipe::new(1, ["egg"])]).unwrap();
    /// corpus.save("recipes.db").unwrap();
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;

        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, &self.stored())
            .map_err(|e| match *e {
                bincode::ErrorKind::Io(io) => RecommendError::Io(io),
                other => RecommendError::InvalidArgument(format!("Serialization failed: {}", other)),
            })?;

        Ok(())
    }

    /// Loads a corpus previously written with [`save`](EncodedCorpus::save).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use recipe_knn::EncodedCorpus;
    ///
    /// let corpus = EncodedCorpus::load("recipes.db").unwrap();
    /// println!("Loaded {} recipes", corpus.count());
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;

        let mut reader = BufReader::new(file);
        let stored: StoredCorpus = artifact_options().deserialize_from(&mut reader)?;
        if !reader.fill_buf()?.is_empty() {
            return Err(RecommendError::Deserialization("trailing bytes after corpus".to_string()));
        }

        Self::from_stored(stored)
    }

    fn stored(&self) -> StoredCorpusRef<'_> {
        StoredCorpusRef {
            format_version: FORMAT_VERSION,
            vocabulary: &self.vocabulary,
            ids: &self.ids,
            dimension: self.dimension,
            vectors: &self.vectors,
        }
    }

    fn from_stored(stored: StoredCorpus) -> Result<Self> {
        let StoredCorpus { format_version, vocabulary, ids, dimension, vectors } = stored;

        if format_version != FORMAT_VERSION {
            return Err(RecommendError::Deserialization(format!(
                "unsupported format version {} (expected {})",
                format_version, FORMAT_VERSION
            )));
        }
        if ids.is_empty() {
            return Err(RecommendError::Deserialization("artifact holds no recipes".to_string()));
        }
        if vocabulary.len() != dimension {
            return Err(RecommendError::Deserialization(format!(
                "vocabulary has {} ingredients but vectors have {} dimensions",
                vocabulary.len(),
                dimension
            )));
        }
        if ids.len().checked_mul(dimension) != Some(vectors.len()) {
            return Err(RecommendError::Deserialization(format!(
                "{} cells cannot hold {} vectors of {} dimensions",
                vectors.len(),
                ids.len(),
                dimension
            )));
        }
        if vectors.iter().any(|&cell| cell > 1) {
            return Err(RecommendError::Deserialization("non-binary cell in vectors".to_string()));
        }

        let mut rows = HashMap::with_capacity(ids.len());
        for (row, &id) in ids.iter().enumerate() {
            if rows.insert(id, row).is_some() {
                return Err(RecommendError::Deserialization(format!("duplicate recipe id {}", id)));
            }
        }

        Ok(EncodedCorpus { vocabulary, ids, vectors, dimension, rows })
    }
}

/// Two corpora are equal when they share a vocabulary and map the same ids to
/// the same vectors, regardless of row order.
impl PartialEq for EncodedCorpus {
    fn eq(&self, other: &Self) -> bool {
        self.vocabulary == other.vocabulary
            && self.dimension == other.dimension
            && self.count() == other.count()
            && self.iter().all(|(id, vector)| other.get(id) == Some(vector))
    }
}

impl Eq for EncodedCorpus {}

#[cfg(test)]
mod corpus_test {
    use super::*;

    fn sample() -> Vec<Recipe> {
        vec![
            Recipe::new(1, ["egg", "flour"]),
            Recipe::new(2, ["egg", "flour", "sugar"]),
            Recipe::new(3, ["beef", "onion"]),
        ]
    }

    // ========== Build Tests ==========

    #[test]
    fn test_build_sample() {
        let corpus = build(&sample()).unwrap();

        assert_eq!(corpus.count(), 3);
        assert_eq!(corpus.dimension(), 5);
        assert_eq!(corpus.vectors.len(), 15); // 3 recipes × 5 columns
        assert_eq!(corpus.get(1).unwrap(), &[1, 1, 0, 0, 0]);
        assert_eq!(corpus.get(2).unwrap(), &[1, 1, 1, 0, 0]);
        assert_eq!(corpus.get(3).unwrap(), &[0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_build_every_id_once() {
        let corpus = build(&sample()).unwrap();

        assert_eq!(corpus.ids(), &[1, 2, 3]);
        for id in [1, 2, 3] {
            assert!(corpus.contains(id));
        }
        assert!(!corpus.contains(4));
    }

    #[test]
    fn test_build_empty() {
        assert!(matches!(build(&[]), Err(RecommendError::EmptyCorpus)));
    }

    #[test]
    fn test_build_duplicate_ids() {
        let recipes = vec![Recipe::new(7, ["egg"]), Recipe::new(7, ["milk"])];
        let result = build(&recipes);

        assert!(matches!(result, Err(RecommendError::InvalidArgument(_))));
    }

    #[test]
    fn test_build_repeated_ingredient_is_presence_only() {
        let corpus = build(&[Recipe::new(1, ["salt", "salt"]), Recipe::new(2, ["oil"])]).unwrap();

        assert_eq!(corpus.get(1).unwrap(), &[1, 0]);
    }

    #[test]
    fn test_build_without_ingredients() {
        let corpus = build(&[
            Recipe::new(1, Vec::<String>::new()),
            Recipe::new(2, Vec::<String>::new()),
        ])
        .unwrap();

        assert_eq!(corpus.dimension(), 0);
        assert_eq!(corpus.get(2), Some(&[][..]));
    }

    #[test]
    fn test_encode_skips_unknown_ingredients() {
        let vocab = Vocabulary::build(&sample()).unwrap();
        let row = encode_recipe(&Recipe::new(9, ["onion", "truffle"]), &vocab);

        assert_eq!(row, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_ingredients_of() {
        let corpus = build(&sample()).unwrap();

        assert_eq!(corpus.ingredients_of(2).unwrap(), vec!["egg", "flour", "sugar"]);
        assert!(corpus.ingredients_of(10).is_none());
    }

    // ========== Serialize/Deserialize Tests ==========

    #[test]
    fn test_round_trip() {
        let corpus = build(&sample()).unwrap();
        let bytes = serialize(&corpus).unwrap();
        let restored = deserialize(&bytes).unwrap();

        assert_eq!(restored, corpus);
        assert_eq!(restored.row_of(3), Some(2));
    }

    #[test]
    fn test_equality_ignores_row_order() {
        let forward = build(&sample()).unwrap();
        let mut reversed = forward.clone();
        reversed.ids.reverse();
        reversed.vectors = forward.ids.iter().rev().flat_map(|&id| forward.get(id).unwrap().to_vec()).collect();
        reversed.rows = reversed.ids.iter().enumerate().map(|(row, &id)| (id, row)).collect();

        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_deserialize_garbage() {
        let result = deserialize(&[1, 2, 3]);
        assert!(matches!(result, Err(RecommendError::Deserialization(_))));
    }

    #[test]
    fn test_deserialize_truncated() {
        let bytes = serialize(&build(&sample()).unwrap()).unwrap();
        let result = deserialize(&bytes[..bytes.len() - 4]);

        assert_eq!(result.unwrap_err().kind(), "DeserializationError");
    }

    #[test]
    fn test_deserialize_trailing_bytes() {
        let mut bytes = serialize(&build(&sample()).unwrap()).unwrap();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        assert!(matches!(deserialize(&bytes), Err(RecommendError::Deserialization(_))));
    }

    #[test]
    fn test_deserialize_wrong_version() {
        let corpus = build(&sample()).unwrap();
        let mut stored = corpus.stored();
        stored.format_version = FORMAT_VERSION + 1;
        let bytes = bincode::serialize(&stored).unwrap();

        assert!(matches!(deserialize(&bytes), Err(RecommendError::Deserialization(_))));
    }

    #[test]
    fn test_deserialize_incompatible_vocabulary() {
        let corpus = build(&sample()).unwrap();
        let other_vocab = Vocabulary::build(&[Recipe::new(1, ["egg"])]).unwrap();
        let mut stored = corpus.stored();
        stored.vocabulary = &other_vocab;
        let bytes = bincode::serialize(&stored).unwrap();

        assert!(matches!(deserialize(&bytes), Err(RecommendError::Deserialization(_))));
    }

    #[test]
    fn test_deserialize_non_binary_cell() {
        let corpus = build(&sample()).unwrap();
        let mut cells = corpus.vectors.clone();
        cells[0] = 2;
        let mut stored = corpus.stored();
        stored.vectors = &cells;
        let bytes = bincode::serialize(&stored).unwrap();

        assert!(matches!(deserialize(&bytes), Err(RecommendError::Deserialization(_))));
    }

    #[test]
    fn test_deserialize_duplicate_ids() {
        let corpus = build(&sample()).unwrap();
        let ids = vec![1, 1, 3];
        let mut stored = corpus.stored();
        stored.ids = &ids;
        let bytes = bincode::serialize(&stored).unwrap();

        assert!(matches!(deserialize(&bytes), Err(RecommendError::Deserialization(_))));
    }

    // ========== Save/Load Tests ==========

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.db");

        let corpus = build(&sample()).unwrap();
        corpus.save(&path).unwrap();

        let loaded = EncodedCorpus::load(&path).unwrap();
        assert_eq!(loaded, corpus);
        assert_eq!(loaded.vocabulary().column_of("sugar"), Some(2));
    }

    #[test]
    fn test_save_matches_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.db");

        let corpus = build(&sample()).unwrap();
        corpus.save(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), serialize(&corpus).unwrap());
    }

    #[test]
    fn test_load_nonexistent_file() {
        match EncodedCorpus::load("nonexistent_file.db") {
            Err(e) => assert_eq!(e.kind(), "IoError"),
            Ok(_) => panic!("Expected error for nonexistent file"),
        }
    }

    #[test]
    fn test_load_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded.db");

        let mut bytes = serialize(&build(&sample()).unwrap()).unwrap();
        bytes.push(0);
        std::fs::write(&path, bytes).unwrap();

        let result = EncodedCorpus::load(&path);
        assert!(matches!(result, Err(RecommendError::Deserialization(_))));
    }

    #[test]
    fn test_save_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overwrite.db");

        build(&[Recipe::new(100, ["old"])]).unwrap().save(&path).unwrap();
        build(&sample()).unwrap().save(&path).unwrap();

        let loaded = EncodedCorpus::load(&path).unwrap();
        assert_eq!(loaded.count(), 3);
        assert!(!loaded.contains(100));
    }
}
