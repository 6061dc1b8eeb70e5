//! The ingredient vocabulary
//! Fixes one feature column per distinct ingredient string

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};
use crate::recipe::Recipe;

/// Distinct ingredients of a corpus, enumerated in first-seen order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    ingredients: IndexSet<String>,
}

impl Vocabulary {
    /// Collects every distinct ingredient across `recipes`.
    ///
    /// Columns are assigned in the order ingredients are first seen, walking
    /// recipes in feed order. Fails with `EmptyCorpus` on zero recipes.
    ///
    /// # Examples
    ///
    /// ```
    /// use recipe_knn::{Recipe, Vocabulary};
    ///
    /// let recipes = vec![
    ///     Recipe::new(1, ["egg", "flour"]),
    ///     Recipe::new(2, ["flour", "sugar"]),
    /// ];
    /// let vocab = Vocabulary::build(&recipes).unwrap();
    /// assert_eq!(vocab.len(), 3);
    /// assert_eq!(vocab.column_of("sugar"), Some(2));
    /// ```
    pub fn build(recipes: &[Recipe]) -> Result<Vocabulary> {
        if recipes.is_empty() {
            return Err(RecommendError::EmptyCorpus);
        }

        let ingredients = recipes
            .iter()
            .flat_map(|recipe| recipe.ingredients.iter().cloned())
            .collect();

        Ok(Vocabulary { ingredients })
    }

    /// Column assigned to `ingredient`, if it belongs to the vocabulary.
    pub fn column_of(&self, ingredient: &str) -> Option<usize> {
        self.ingredients.get_index_of(ingredient)
    }

    /// Ingredient stored at `column`.
    pub fn ingredient(&self, column: usize) -> Option<&str> {
        self.ingredients.get_index(column).map(String::as_str)
    }

    /// Number of columns, V.
    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(String::as_str)
    }
}

/// Equal only when every column holds the same ingredient.
impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.ingredients.iter().eq(other.ingredients.iter())
    }
}

impl Eq for Vocabulary {}
