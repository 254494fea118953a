use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::component::Block;
use super::error::EvaluationError;
use super::method::GradingMethodId;
use super::projection::RatingProjection;

pub const BASIC_SCALE_MIN: f64 = 1.0;
pub const BASIC_SCALE_MAX: f64 = 10.0;

/// Identifier wrapper for stored ratings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RatingId(pub String);

impl fmt::Display for RatingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single scalar on the fixed basic scale; no aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicScore(f64);

impl BasicScore {
    pub fn new(value: f64) -> Result<Self, EvaluationError> {
        if (BASIC_SCALE_MIN..=BASIC_SCALE_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EvaluationError::ValueOutOfRange {
                path: "score".to_string(),
                value,
                min: BASIC_SCALE_MIN,
                max: BASIC_SCALE_MAX,
            })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// What a rating was scored with.
#[derive(Debug, Clone, PartialEq)]
pub enum RatingScore {
    Basic(BasicScore),
    Complex {
        method_id: GradingMethodId,
        tree: Block,
        projection: RatingProjection,
    },
}

/// Usage-time rating. Complex ratings own their materialized tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub rating_id: RatingId,
    pub score: RatingScore,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn method_id(&self) -> Option<&GradingMethodId> {
        match &self.score {
            RatingScore::Basic(_) => None,
            RatingScore::Complex { method_id, .. } => Some(method_id),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.score, RatingScore::Complex { .. })
    }

    /// Value shown to readers: normalized for complex ratings, raw for basic ones.
    pub fn display_grade(&self) -> f64 {
        match &self.score {
            RatingScore::Basic(score) => score.value(),
            RatingScore::Complex { projection, .. } => projection.display_grade(),
        }
    }

    pub fn view(&self) -> RatingView {
        let detail = match &self.score {
            RatingScore::Basic(_) => None,
            RatingScore::Complex { projection, .. } => Some(projection.clone()),
        };
        RatingView {
            rating_id: self.rating_id.clone(),
            method_id: self.method_id().cloned(),
            kind: if self.is_complex() { "complex" } else { "basic" },
            display_grade: self.display_grade(),
            created_at: self.created_at,
            detail,
        }
    }
}

/// Sanitized representation of a rating for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub rating_id: RatingId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_id: Option<GradingMethodId>,
    pub kind: &'static str,
    pub display_grade: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<RatingProjection>,
}
