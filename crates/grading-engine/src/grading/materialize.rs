//! Rehydrates grading method definitions into component trees with leaf values filled in.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::component::{child_path, Block, GradableComponent, Grade};
use super::error::{ComponentError, EvaluationError};
use super::method::{ComponentDefinition, GradeDefinition, GradingMethodDefinition};

/// How a leaf value outside `[minGrade, maxGrade]` is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafValuePolicy {
    Reject,
    Clamp,
}

impl LeafValuePolicy {
    pub const fn label(self) -> &'static str {
        match self {
            LeafValuePolicy::Reject => "reject",
            LeafValuePolicy::Clamp => "clamp",
        }
    }
}

impl fmt::Display for LeafValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LeafValuePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            other => Err(format!("unknown leaf value policy '{other}'")),
        }
    }
}

impl LeafValuePolicy {
    /// Apply the policy to `value` for the leaf at `path`.
    pub fn resolve(
        self,
        path: &str,
        value: f64,
        min_grade: f64,
        max_grade: f64,
    ) -> Result<f64, EvaluationError> {
        if value >= min_grade && value <= max_grade {
            return Ok(value);
        }
        match self {
            LeafValuePolicy::Clamp if !value.is_nan() => Ok(value.clamp(min_grade, max_grade)),
            _ => Err(EvaluationError::ValueOutOfRange {
                path: path.to_string(),
                value,
                min: min_grade,
                max: max_grade,
            }),
        }
    }

    /// Apply the policy to a rater's value. Under `Reject` the value must also sit on the
    /// leaf's step grid; `Clamp` leaves off-step values to be snapped.
    pub fn resolve_submitted(
        self,
        path: &str,
        value: f64,
        grade: &GradeDefinition,
    ) -> Result<f64, EvaluationError> {
        let value = self.resolve(path, value, grade.min_grade, grade.max_grade)?;
        if self == LeafValuePolicy::Reject
            && !Grade::is_on_step(grade.min_grade, grade.step_amount, value)
        {
            return Err(EvaluationError::ValueOutOfRange {
                path: path.to_string(),
                value,
                min: grade.min_grade,
                max: grade.max_grade,
            });
        }
        Ok(value)
    }
}

/// One submitted leaf value, addressed by dot path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafInput {
    pub component_path: String,
    pub value: f64,
}

impl LeafInput {
    pub fn new(component_path: impl Into<String>, value: f64) -> Self {
        Self {
            component_path: component_path.into(),
            value,
        }
    }
}

/// Lookup table built from a submission. Later entries for the same path win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafValues {
    values: HashMap<String, f64>,
}

impl LeafValues {
    pub fn get(&self, path: &str) -> Option<f64> {
        self.values.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn paths(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl FromIterator<LeafInput> for LeafValues {
    fn from_iter<T: IntoIterator<Item = LeafInput>>(iter: T) -> Self {
        let values = iter
            .into_iter()
            .map(|input| (input.component_path, input.value))
            .collect();
        Self { values }
    }
}

impl<'a> FromIterator<&'a LeafInput> for LeafValues {
    fn from_iter<T: IntoIterator<Item = &'a LeafInput>>(iter: T) -> Self {
        iter.into_iter().cloned().collect()
    }
}

/// Builds a fresh, exclusively owned tree per evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Materializer {
    policy: LeafValuePolicy,
}

impl Materializer {
    pub fn new(policy: LeafValuePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LeafValuePolicy {
        self.policy
    }

    /// Fill every leaf from `values`. The returned root block carries the method name and
    /// the top-level operators; its children are addressed without a prefix.
    pub fn materialize(
        &self,
        method: &GradingMethodDefinition,
        values: &LeafValues,
    ) -> Result<Block, EvaluationError> {
        let root = self.build_root(method, &mut |path: &str, grade: &GradeDefinition| {
            let value = values
                .get(path)
                .ok_or_else(|| EvaluationError::MissingLeafValue(path.to_string()))?;
            self.policy.resolve_submitted(path, value, grade)
        })?;

        let known = method.leaf_paths();
        for path in values.paths() {
            if !known.iter().any(|leaf| leaf == path) {
                warn!(method_id = %method.id, path, "ignoring value for unknown component path");
            }
        }

        Ok(root)
    }

    /// Fill every leaf with its authored default, or its minimum when none was given.
    pub fn materialize_defaults(
        &self,
        method: &GradingMethodDefinition,
    ) -> Result<Block, EvaluationError> {
        self.build_root(method, &mut |path: &str, grade: &GradeDefinition| {
            match grade.default_value {
                Some(value) => self
                    .policy
                    .resolve(path, value, grade.min_grade, grade.max_grade),
                None => Ok(grade.min_grade),
            }
        })
    }

    fn build_root<F>(
        &self,
        method: &GradingMethodDefinition,
        leaf_value: &mut F,
    ) -> Result<Block, EvaluationError>
    where
        F: FnMut(&str, &GradeDefinition) -> Result<f64, EvaluationError>,
    {
        let children = method
            .top_level
            .iter()
            .map(|component| build_component(component, "", leaf_value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Block::new(
            method.name.clone(),
            children,
            method.top_level_operators.clone(),
        )?)
    }
}

fn build_component<F>(
    definition: &ComponentDefinition,
    scope: &str,
    leaf_value: &mut F,
) -> Result<GradableComponent, EvaluationError>
where
    F: FnMut(&str, &GradeDefinition) -> Result<f64, EvaluationError>,
{
    let path = child_path(scope, definition.name());
    match definition {
        ComponentDefinition::Grade(grade) => {
            if !Grade::bounds_are_valid(grade.min_grade, grade.max_grade, grade.step_amount) {
                return Err(ComponentError::InvalidLeafBounds {
                    name: path,
                    min: grade.min_grade,
                    max: grade.max_grade,
                    step: grade.step_amount,
                }
                .into());
            }
            let value = leaf_value(&path, grade)?;
            let leaf = Grade::new(
                grade.name.clone(),
                grade.min_grade,
                grade.max_grade,
                grade.step_amount,
                value,
            )
            .map_err(|err| err.at_path(&path))?;
            Ok(leaf.into())
        }
        ComponentDefinition::Block(block) => {
            let children = block
                .children
                .iter()
                .map(|child| build_component(child, &path, leaf_value))
                .collect::<Result<Vec<_>, _>>()?;
            let built = Block::new(block.name.clone(), children, block.operators.clone())
                .map_err(|err| err.at_path(&path))?;
            Ok(built.into())
        }
    }
}
