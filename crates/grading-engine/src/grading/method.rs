use std::fmt;

use serde::{Deserialize, Serialize};

use super::component::{child_path, Operator};

/// Identifier wrapper for persisted grading methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GradingMethodId(pub String);

impl fmt::Display for GradingMethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the user who authored a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

/// Authoring-time leaf description. Bounds are unchecked until validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDefinition {
    pub name: String,
    pub min_grade: f64,
    pub max_grade: f64,
    pub step_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<f64>,
}

/// Authoring-time block description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    pub name: String,
    pub children: Vec<ComponentDefinition>,
    #[serde(default)]
    pub operators: Vec<Operator>,
}

/// Serializable shape of a component as exchanged with authoring clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "componentType", rename_all = "lowercase")]
pub enum ComponentDefinition {
    Grade(GradeDefinition),
    Block(BlockDefinition),
}

impl ComponentDefinition {
    pub fn name(&self) -> &str {
        match self {
            ComponentDefinition::Grade(grade) => &grade.name,
            ComponentDefinition::Block(block) => &block.name,
        }
    }

    fn collect_leaf_paths(&self, scope: &str, paths: &mut Vec<String>) {
        let path = child_path(scope, self.name());
        match self {
            ComponentDefinition::Grade(_) => paths.push(path),
            ComponentDefinition::Block(block) => {
                for child in &block.children {
                    child.collect_leaf_paths(&path, paths);
                }
            }
        }
    }
}

/// Candidate grading method submitted by an author, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingMethodDraft {
    pub name: String,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub is_public: bool,
    pub top_level: Vec<ComponentDefinition>,
    #[serde(default)]
    pub top_level_operators: Vec<Operator>,
}

impl GradingMethodDraft {
    pub fn into_definition(self, id: GradingMethodId) -> GradingMethodDefinition {
        GradingMethodDefinition {
            id,
            name: self.name,
            owner_id: self.owner_id,
            is_public: self.is_public,
            top_level: self.top_level,
            top_level_operators: self.top_level_operators,
        }
    }
}

/// Persisted grading method. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingMethodDefinition {
    pub id: GradingMethodId,
    pub name: String,
    pub owner_id: OwnerId,
    #[serde(default)]
    pub is_public: bool,
    pub top_level: Vec<ComponentDefinition>,
    #[serde(default)]
    pub top_level_operators: Vec<Operator>,
}

impl GradingMethodDefinition {
    /// Dot paths of every leaf, in tree order. A submission must cover each of them.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for component in &self.top_level {
            component.collect_leaf_paths("", &mut paths);
        }
        paths
    }

    pub fn draft(&self) -> GradingMethodDraft {
        GradingMethodDraft {
            name: self.name.clone(),
            owner_id: self.owner_id.clone(),
            is_public: self.is_public,
            top_level: self.top_level.clone(),
            top_level_operators: self.top_level_operators.clone(),
        }
    }
}
