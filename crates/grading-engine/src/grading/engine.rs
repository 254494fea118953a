use tracing::debug;

use super::component::Block;
use super::error::EvaluationError;
use super::materialize::{LeafInput, LeafValues, Materializer};
use super::method::GradingMethodDefinition;
use super::normalize::DisplayScale;
use super::projection::{project_root, RatingProjection};
use crate::config::GradingConfig;

/// Stateless evaluator applying a display scale and a submission policy to definitions.
#[derive(Debug, Clone)]
pub struct GradingEngine {
    scale: DisplayScale,
    materializer: Materializer,
    preview_materializer: Materializer,
}

/// Materialized tree together with its projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub tree: Block,
    pub projection: RatingProjection,
}

impl GradingEngine {
    pub fn new(config: &GradingConfig) -> Self {
        Self {
            scale: config.display_scale,
            materializer: Materializer::new(config.submission_value_policy),
            preview_materializer: Materializer::new(config.authoring_value_policy),
        }
    }

    pub fn scale(&self) -> &DisplayScale {
        &self.scale
    }

    /// Fill the tree from `inputs`, propagate, and project. Any failure aborts the whole run.
    pub fn evaluate(
        &self,
        method: &GradingMethodDefinition,
        inputs: &[LeafInput],
    ) -> Result<Evaluation, EvaluationError> {
        let values: LeafValues = inputs.iter().collect();
        let tree = self.materializer.materialize(method, &values)?;
        let projection = project_root(&tree, Some(method.id.clone()), &self.scale)?;

        debug!(
            method_id = %method.id,
            current = projection.root.current_value,
            normalized = ?projection.normalized_grade,
            "grading method evaluated"
        );

        Ok(Evaluation { tree, projection })
    }

    /// Evaluate the method with every leaf at its authored default.
    pub fn preview(
        &self,
        method: &GradingMethodDefinition,
    ) -> Result<RatingProjection, EvaluationError> {
        let tree = self.preview_materializer.materialize_defaults(method)?;
        project_root(&tree, Some(method.id.clone()), &self.scale)
    }
}
