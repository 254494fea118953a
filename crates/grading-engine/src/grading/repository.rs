use super::method::{GradingMethodDefinition, GradingMethodId};
use super::rating::{Rating, RatingId};

/// Definition store. Retry policy, if any, lives behind this boundary.
pub trait GradingMethodStore: Send + Sync {
    fn insert(
        &self,
        method: GradingMethodDefinition,
    ) -> Result<GradingMethodDefinition, RepositoryError>;
    fn fetch(&self, id: &GradingMethodId)
        -> Result<Option<GradingMethodDefinition>, RepositoryError>;
    fn public(&self, limit: usize) -> Result<Vec<GradingMethodDefinition>, RepositoryError>;
}

/// Storage for materialized ratings.
pub trait RatingRepository: Send + Sync {
    fn insert(&self, rating: Rating) -> Result<Rating, RepositoryError>;
    fn fetch(&self, id: &RatingId) -> Result<Option<Rating>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
