use serde::{Deserialize, Serialize};

use super::component::GradableComponent;
use super::error::EvaluationError;
use super::propagation::Bounds;

pub const DEFAULT_DISPLAY_MIN: f64 = 1.0;
pub const DEFAULT_DISPLAY_MAX: f64 = 10.0;

/// Fixed external range ratings are displayed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayScale {
    min: f64,
    max: f64,
}

impl Default for DisplayScale {
    fn default() -> Self {
        Self {
            min: DEFAULT_DISPLAY_MIN,
            max: DEFAULT_DISPLAY_MAX,
        }
    }
}

impl DisplayScale {
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min < max).then_some(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Linear remap of `bounds.current` from `[bounds.min, bounds.max]` onto this scale.
    pub fn normalize(&self, bounds: &Bounds) -> Result<f64, EvaluationError> {
        let span = bounds.max - bounds.min;
        if span == 0.0 {
            return Err(EvaluationError::DegenerateRange {
                min: bounds.min,
                max: bounds.max,
            });
        }
        Ok(self.min + (bounds.current - bounds.min) / span * (self.max - self.min))
    }
}

/// Normalize a node onto `scale`. Only rating roots are normalized in practice.
pub fn normalize(
    component: &GradableComponent,
    scale: &DisplayScale,
) -> Result<f64, EvaluationError> {
    scale.normalize(&component.bounds()?)
}
