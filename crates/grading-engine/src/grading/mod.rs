//! Composite grading methods: authoring validation, value propagation, and rating projections.

pub mod component;
pub mod engine;
pub mod error;
pub mod materialize;
pub mod method;
pub mod normalize;
pub mod projection;
pub mod propagation;
pub mod rating;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use component::{Block, GradableComponent, Grade, Operator, UnknownOperator};
pub use engine::{Evaluation, GradingEngine};
pub use error::{ComponentError, ErrorKind, EvaluationError};
pub use materialize::{LeafInput, LeafValuePolicy, LeafValues, Materializer};
pub use method::{
    BlockDefinition, ComponentDefinition, GradeDefinition, GradingMethodDefinition,
    GradingMethodDraft, GradingMethodId, OwnerId,
};
pub use normalize::{normalize, DisplayScale};
pub use projection::{BlockProjection, ComponentProjection, GradeProjection, RatingProjection};
pub use propagation::Bounds;
pub use rating::{BasicScore, Rating, RatingId, RatingScore, RatingView};
pub use repository::{GradingMethodStore, RatingRepository, RepositoryError};
pub use router::{grading_router, EvaluationRequest, RatingRequest};
pub use service::{GradingService, GradingServiceError};
pub use validation::{MethodValidator, ValidationFailure};
