use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::component::Grade;
use super::error::ErrorKind;
use super::materialize::LeafValuePolicy;
use super::method::{ComponentDefinition, GradingMethodDraft};
use crate::config::GradingConfig;

/// First structural violation found in a candidate grading method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{path}: {detail}")]
pub struct ValidationFailure {
    /// Index path of the offending node, e.g. `block[2].child[0]`.
    pub path: String,
    pub reason: ErrorKind,
    pub detail: String,
}

impl ValidationFailure {
    fn new(path: impl Into<String>, reason: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason,
            detail: detail.into(),
        }
    }
}

/// Pure, fail-fast checker for authored grading methods.
#[derive(Debug, Clone)]
pub struct MethodValidator {
    max_name_length: usize,
    authoring_policy: LeafValuePolicy,
}

impl MethodValidator {
    pub fn new(max_name_length: usize, authoring_policy: LeafValuePolicy) -> Self {
        Self {
            max_name_length,
            authoring_policy,
        }
    }

    pub fn from_config(config: &GradingConfig) -> Self {
        Self::new(config.max_name_length, config.authoring_value_policy)
    }

    pub fn validate(&self, draft: &GradingMethodDraft) -> Result<(), ValidationFailure> {
        self.check_name("name", &draft.name)?;

        if draft.top_level.is_empty() {
            return Err(ValidationFailure::new(
                "topLevel",
                ErrorKind::EmptyBlock,
                "a grading method needs at least one component",
            ));
        }
        check_arity(
            "topLevelOperators",
            draft.top_level.len(),
            draft.top_level_operators.len(),
        )?;

        let mut siblings = HashSet::new();
        for (index, component) in draft.top_level.iter().enumerate() {
            let path = format!("{}[{index}]", segment(component));
            self.check_component(&path, component)?;
            check_unique(&path, component.name(), &mut siblings)?;
        }

        Ok(())
    }

    fn check_component(
        &self,
        path: &str,
        component: &ComponentDefinition,
    ) -> Result<(), ValidationFailure> {
        let name = component.name();
        self.check_name(path, name)?;
        if name.contains('.') {
            return Err(ValidationFailure::new(
                path,
                ErrorKind::InvalidName,
                format!("component name '{name}' must not contain '.'"),
            ));
        }

        match component {
            ComponentDefinition::Grade(grade) => {
                if !Grade::bounds_are_valid(grade.min_grade, grade.max_grade, grade.step_amount) {
                    return Err(ValidationFailure::new(
                        path,
                        ErrorKind::InvalidLeafBounds,
                        format!(
                            "grade '{}' needs min < max and a positive step (min {}, max {}, step {})",
                            grade.name, grade.min_grade, grade.max_grade, grade.step_amount
                        ),
                    ));
                }
                if let Some(value) = grade.default_value {
                    let in_range = value >= grade.min_grade && value <= grade.max_grade;
                    let clampable =
                        self.authoring_policy == LeafValuePolicy::Clamp && !value.is_nan();
                    if !in_range && !clampable {
                        return Err(ValidationFailure::new(
                            path,
                            ErrorKind::ValueOutOfRange,
                            format!(
                                "default value {value} for '{}' is outside [{}, {}]",
                                grade.name, grade.min_grade, grade.max_grade
                            ),
                        ));
                    }
                }
                Ok(())
            }
            ComponentDefinition::Block(block) => {
                if block.children.is_empty() {
                    return Err(ValidationFailure::new(
                        path,
                        ErrorKind::EmptyBlock,
                        format!("block '{}' has no children", block.name),
                    ));
                }
                check_arity(path, block.children.len(), block.operators.len())?;

                let mut siblings = HashSet::new();
                for (index, child) in block.children.iter().enumerate() {
                    let child_path = format!("{path}.child[{index}]");
                    self.check_component(&child_path, child)?;
                    check_unique(&child_path, child.name(), &mut siblings)?;
                }
                Ok(())
            }
        }
    }

    fn check_name(&self, path: &str, name: &str) -> Result<(), ValidationFailure> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationFailure::new(
                path,
                ErrorKind::InvalidName,
                "name must not be empty",
            ));
        }
        if trimmed.chars().count() > self.max_name_length {
            return Err(ValidationFailure::new(
                path,
                ErrorKind::InvalidName,
                format!("name exceeds {} characters", self.max_name_length),
            ));
        }
        Ok(())
    }
}

fn segment(component: &ComponentDefinition) -> &'static str {
    match component {
        ComponentDefinition::Grade(_) => "grade",
        ComponentDefinition::Block(_) => "block",
    }
}

fn check_arity(path: &str, children: usize, operators: usize) -> Result<(), ValidationFailure> {
    if operators + 1 == children {
        return Ok(());
    }
    Err(ValidationFailure::new(
        path,
        ErrorKind::ArityMismatch,
        format!(
            "{children} component(s) need {} operator(s), found {operators}",
            children.saturating_sub(1)
        ),
    ))
}

fn check_unique<'a>(
    path: &str,
    name: &'a str,
    seen: &mut HashSet<&'a str>,
) -> Result<(), ValidationFailure> {
    if seen.insert(name) {
        return Ok(());
    }
    Err(ValidationFailure::new(
        path,
        ErrorKind::DuplicatePath,
        format!("sibling name '{name}' is already used"),
    ))
}
