//! Error kinds shared by every layer of the recommender.

use thiserror::Error;

use crate::recipe::RecipeId;

#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("cannot build a corpus from zero recipes")]
    EmptyCorpus,
    #[error("recipe {0} is not in the corpus")]
    UnknownRecipe(RecipeId),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A vector does not match the index width. Reaching this means build and
    /// query disagree on the vocabulary.
    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("corrupt or incompatible corpus artifact: {0}")]
    Deserialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecommendError>;

impl RecommendError {
    /// Stable name of the error kind, printed by the CLI and returned by the API.
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendError::EmptyCorpus => "EmptyCorpusError",
            RecommendError::UnknownRecipe(_) => "UnknownRecipeError",
            RecommendError::InvalidArgument(_) => "InvalidArgumentError",
            RecommendError::DimensionMismatch { .. } => "DimensionMismatchError",
            RecommendError::Deserialization(_) => "DeserializationError",
            RecommendError::Io(_) => "IoError",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RecommendError::InvalidArgument(_) => 2,
            RecommendError::EmptyCorpus => 3,
            RecommendError::UnknownRecipe(_) => 4,
            RecommendError::Deserialization(_) => 5,
            RecommendError::DimensionMismatch { .. } => 70,
            RecommendError::Io(_) => 74,
        }
    }
}

impl From<bincode::Error> for RecommendError {
    fn from(value: bincode::Error) -> Self {
        Self::Deserialization(value.to_string())
    }
}
