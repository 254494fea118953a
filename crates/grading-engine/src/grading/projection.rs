//! Serializable detail view of an evaluated component tree.
//!
//! This is the only place that knows the external DTO shape. Each node is visited once:
//! children are projected first, and their bounds feed the parent's fold.

use serde::{Deserialize, Serialize};

use super::component::{child_path, Block, GradableComponent, Operator};
use super::error::EvaluationError;
use super::method::GradingMethodId;
use super::normalize::DisplayScale;
use super::propagation::{fold_bounds, Bounds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeProjection {
    pub name: String,
    pub current_value: f64,
    pub min: f64,
    pub max: f64,
    pub step_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockProjection {
    pub name: String,
    pub current_value: f64,
    pub min: f64,
    pub max: f64,
    pub children: Vec<ComponentProjection>,
    pub operators: Vec<Operator>,
}

/// Recursive DTO discriminated by `componentType` (`"grade"` or `"block"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "componentType", rename_all = "lowercase")]
pub enum ComponentProjection {
    Grade(GradeProjection),
    Block(BlockProjection),
}

impl ComponentProjection {
    pub fn name(&self) -> &str {
        match self {
            ComponentProjection::Grade(grade) => &grade.name,
            ComponentProjection::Block(block) => &block.name,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            ComponentProjection::Grade(grade) => Bounds {
                current: grade.current_value,
                min: grade.min,
                max: grade.max,
            },
            ComponentProjection::Block(block) => Bounds {
                current: block.current_value,
                min: block.min,
                max: block.max,
            },
        }
    }
}

/// Root of a rating's projection: a block node, so it decodes as a [`ComponentProjection`],
/// carrying the normalized grade next to the raw values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "componentType", rename = "block", rename_all = "camelCase")]
pub struct RatingProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_id: Option<GradingMethodId>,
    #[serde(flatten)]
    pub root: BlockProjection,
    /// `None` when the root range is degenerate; display the raw value instead.
    pub normalized_grade: Option<f64>,
    pub display_min: f64,
    pub display_max: f64,
}

impl RatingProjection {
    pub fn display_grade(&self) -> f64 {
        self.normalized_grade.unwrap_or(self.root.current_value)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            current: self.root.current_value,
            min: self.root.min,
            max: self.root.max,
        }
    }

    /// Drop the rating metadata and keep the tree.
    pub fn into_component(self) -> ComponentProjection {
        ComponentProjection::Block(self.root)
    }
}

/// Project any node, addressing nested blocks beneath `scope`.
pub fn project(
    component: &GradableComponent,
    scope: &str,
) -> Result<ComponentProjection, EvaluationError> {
    match component {
        GradableComponent::Grade(grade) => Ok(ComponentProjection::Grade(GradeProjection {
            name: grade.name().to_string(),
            current_value: grade.current_value(),
            min: grade.min_grade(),
            max: grade.max_grade(),
            step_amount: grade.step_amount(),
        })),
        GradableComponent::Block(block) => {
            let path = child_path(scope, block.name());
            let (children, bounds) = project_children(block, &path, &path)?;
            Ok(ComponentProjection::Block(BlockProjection {
                name: block.name().to_string(),
                current_value: bounds.current,
                min: bounds.min,
                max: bounds.max,
                children,
                operators: block.operators().to_vec(),
            }))
        }
    }
}

/// Project a rating root and normalize it onto `scale`.
pub fn project_root(
    root: &Block,
    method_id: Option<GradingMethodId>,
    scale: &DisplayScale,
) -> Result<RatingProjection, EvaluationError> {
    let (children, bounds) = project_children(root, "", root.name())?;
    let normalized_grade = match scale.normalize(&bounds) {
        Ok(value) => Some(value),
        Err(EvaluationError::DegenerateRange { .. }) => None,
        Err(other) => return Err(other),
    };

    Ok(RatingProjection {
        method_id,
        root: BlockProjection {
            name: root.name().to_string(),
            current_value: bounds.current,
            min: bounds.min,
            max: bounds.max,
            children,
            operators: root.operators().to_vec(),
        },
        normalized_grade,
        display_min: scale.min(),
        display_max: scale.max(),
    })
}

fn project_children(
    block: &Block,
    scope: &str,
    fold_path: &str,
) -> Result<(Vec<ComponentProjection>, Bounds), EvaluationError> {
    let children = block
        .children()
        .iter()
        .map(|child| project(child, scope))
        .collect::<Result<Vec<_>, _>>()?;
    let child_bounds: Vec<Bounds> = children.iter().map(ComponentProjection::bounds).collect();
    let bounds = fold_bounds(fold_path, &child_bounds, block.operators())?;
    Ok((children, bounds))
}
