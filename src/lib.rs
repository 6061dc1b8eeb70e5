//! # recipe_knn - Recipe Recommendations by Shared Ingredients
//!
//! recipe_knn encodes every recipe of a corpus as a binary vector over the
//! corpus's ingredient vocabulary (1 = ingredient present) and recommends the
//! recipes whose vectors are nearest in Euclidean distance. For 0/1 vectors the
//! squared distance between two recipes is the number of ingredients found in
//! exactly one of them.
//!
//! ## Example
//!
//! ```
//! use recipe_knn::{build, Recipe, Recommender};
//!
//! let corpus = build(&[
//!     Recipe::new(1, ["egg", "flour"]),
//!     Recipe::new(2, ["egg", "flour", "sugar"]),
//!     Recipe::new(3, ["beef", "onion"]),
//! ]).unwrap();
//!
//! // The index is built once per session and reused for every query
//! let session = Recommender::new(&corpus).unwrap();
//! assert_eq!(session.recommend(1, 2).unwrap(), vec![2, 3]);
//!
//! // The encoded corpus round-trips through bytes
//! let bytes = recipe_knn::serialize(&corpus).unwrap();
//! assert_eq!(recipe_knn::deserialize(&bytes).unwrap(), corpus);
//! ```

pub mod corpus;
pub mod error;
pub mod index;
pub mod query;
pub mod recipe;
pub mod server;
pub mod vector;
pub mod vocab;

pub use corpus::{build, deserialize, serialize, EncodedCorpus};
pub use error::{RecommendError, Result};
pub use index::{IndexParams, Neighbor, SpatialIndex};
pub use query::{recommend, recommend_batch, Recommender, DEFAULT_K};
pub use recipe::{parse_feed, Recipe, RecipeId};
pub use vocab::Vocabulary;
