use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::engine::GradingEngine;
use super::error::{ErrorKind, EvaluationError};
use super::materialize::LeafInput;
use super::method::{GradingMethodDefinition, GradingMethodDraft, GradingMethodId};
use super::projection::RatingProjection;
use super::rating::{BasicScore, Rating, RatingId, RatingScore};
use super::repository::{GradingMethodStore, RatingRepository, RepositoryError};
use super::validation::{MethodValidator, ValidationFailure};
use crate::config::GradingConfig;

/// Service composing the validator, evaluation engine, and storage collaborators.
pub struct GradingService<M, R> {
    validator: Arc<MethodValidator>,
    engine: Arc<GradingEngine>,
    methods: Arc<M>,
    ratings: Arc<R>,
}

static METHOD_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RATING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_method_id() -> GradingMethodId {
    let id = METHOD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    GradingMethodId(format!("gm-{id:06}"))
}

fn next_rating_id() -> RatingId {
    let id = RATING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RatingId(format!("rating-{id:06}"))
}

impl<M, R> GradingService<M, R>
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    pub fn new(methods: Arc<M>, ratings: Arc<R>, config: &GradingConfig) -> Self {
        Self {
            validator: Arc::new(MethodValidator::from_config(config)),
            engine: Arc::new(GradingEngine::new(config)),
            methods,
            ratings,
        }
    }

    pub fn engine(&self) -> &GradingEngine {
        &self.engine
    }

    /// Check a candidate without storing it.
    pub fn validate(&self, draft: &GradingMethodDraft) -> Result<(), ValidationFailure> {
        self.validator.validate(draft)
    }

    /// Validate and persist a new grading method under a fresh id.
    pub fn author(
        &self,
        draft: GradingMethodDraft,
    ) -> Result<GradingMethodDefinition, GradingServiceError> {
        if let Err(failure) = self.validator.validate(&draft) {
            warn!(path = %failure.path, kind = failure.reason.label(), "grading method rejected");
            return Err(failure.into());
        }

        let method = draft.into_definition(next_method_id());
        let stored = self.methods.insert(method)?;
        info!(method_id = %stored.id, name = %stored.name, "grading method stored");
        Ok(stored)
    }

    pub fn method(
        &self,
        method_id: &GradingMethodId,
    ) -> Result<GradingMethodDefinition, GradingServiceError> {
        self.methods
            .fetch(method_id)?
            .ok_or_else(|| GradingServiceError::MethodNotFound(method_id.clone()))
    }

    pub fn public_methods(
        &self,
        limit: usize,
    ) -> Result<Vec<GradingMethodDefinition>, GradingServiceError> {
        Ok(self.methods.public(limit)?)
    }

    /// Evaluate submitted leaf values against a stored method without persisting anything.
    pub fn evaluate(
        &self,
        method_id: &GradingMethodId,
        inputs: &[LeafInput],
    ) -> Result<RatingProjection, GradingServiceError> {
        let method = self.method(method_id)?;
        let evaluation = self
            .engine
            .evaluate(&method, inputs)
            .inspect_err(|err| log_rejection(method_id, err))?;
        Ok(evaluation.projection)
    }

    /// Projection of the method with every leaf at its authored default.
    pub fn preview(
        &self,
        method_id: &GradingMethodId,
    ) -> Result<RatingProjection, GradingServiceError> {
        let method = self.method(method_id)?;
        Ok(self.engine.preview(&method)?)
    }

    /// Evaluate and persist a complex rating.
    pub fn rate(
        &self,
        method_id: &GradingMethodId,
        inputs: &[LeafInput],
    ) -> Result<Rating, GradingServiceError> {
        let method = self.method(method_id)?;
        let evaluation = self
            .engine
            .evaluate(&method, inputs)
            .inspect_err(|err| log_rejection(method_id, err))?;

        let rating = Rating {
            rating_id: next_rating_id(),
            score: RatingScore::Complex {
                method_id: method.id,
                tree: evaluation.tree,
                projection: evaluation.projection,
            },
            created_at: Utc::now(),
        };
        let stored = self.ratings.insert(rating)?;
        info!(
            rating_id = %stored.rating_id,
            method_id = %method_id,
            display_grade = stored.display_grade(),
            "complex rating stored"
        );
        Ok(stored)
    }

    /// Persist a basic rating on the fixed 1-10 scale.
    pub fn rate_basic(&self, score: f64) -> Result<Rating, GradingServiceError> {
        let score = BasicScore::new(score)?;
        let rating = Rating {
            rating_id: next_rating_id(),
            score: RatingScore::Basic(score),
            created_at: Utc::now(),
        };
        let stored = self.ratings.insert(rating)?;
        info!(rating_id = %stored.rating_id, score = score.value(), "basic rating stored");
        Ok(stored)
    }

    pub fn rating(&self, rating_id: &RatingId) -> Result<Rating, GradingServiceError> {
        let rating = self
            .ratings
            .fetch(rating_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(rating)
    }
}

fn log_rejection(method_id: &GradingMethodId, err: &EvaluationError) {
    warn!(
        method_id = %method_id,
        kind = err.kind().label(),
        path = err.path().unwrap_or_default(),
        "evaluation aborted"
    );
}

/// Error raised by the grading service.
#[derive(Debug, thiserror::Error)]
pub enum GradingServiceError {
    #[error("invalid grading method at {0}")]
    Validation(#[from] ValidationFailure),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("grading method '{0}' not found")]
    MethodNotFound(GradingMethodId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl GradingServiceError {
    /// Error kind for domain failures; `None` for storage infrastructure errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            GradingServiceError::Validation(failure) => Some(failure.reason),
            GradingServiceError::Evaluation(err) => Some(err.kind()),
            GradingServiceError::MethodNotFound(_)
            | GradingServiceError::Repository(RepositoryError::NotFound) => {
                Some(ErrorKind::NotFound)
            }
            GradingServiceError::Repository(_) => None,
        }
    }

    /// Location of the failure inside the method, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            GradingServiceError::Validation(failure) => Some(&failure.path),
            GradingServiceError::Evaluation(err) => err.path(),
            GradingServiceError::MethodNotFound(_) | GradingServiceError::Repository(_) => None,
        }
    }
}
