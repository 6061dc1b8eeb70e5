//! Recipe records and the JSON feed they arrive in.

use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

/// Identifier of a recipe, unique within a corpus.
pub type RecipeId = i64;

/// A recipe as consumed by the recommender. Other fields present in the feed
/// (title, url, ratings...) are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub ingredients: Vec<String>,
}

impl Recipe {
    pub fn new<I, S>(id: RecipeId, ingredients: I) -> Recipe
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Recipe { id, ingredients: ingredients.into_iter().map(Into::into).collect() }
    }
}

/// Parses a feed: a JSON array of `{id, ingredients}` objects.
///
/// Records with a missing or mistyped `id`/`ingredients` are rejected as
/// `InvalidArgument`.
///
/// # Examples
///
/// ```
/// use recipe_knn::recipe::parse_feed;
///
/// let recipes = parse_feed(r#"[{"id": 1, "ingredients": ["egg"], "title": "Omelette"}]"#).unwrap();
/// assert_eq!(recipes[0].id, 1);
/// assert_eq!(recipes[0].ingredients, vec!["egg".to_string()]);
/// ```
pub fn parse_feed(json: &str) -> Result<Vec<Recipe>> {
    serde_json::from_str(json)
        .map_err(|e| RecommendError::InvalidArgument(format!("malformed recipe feed: {}", e)))
}
