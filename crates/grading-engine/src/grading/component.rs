use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ComponentError, EvaluationError};
use super::propagation::{self, Bounds};

/// Tolerance used when checking whether a value already sits on a step boundary.
const STEP_TOLERANCE: f64 = 1e-9;

/// Arithmetic operator placed between two adjacent siblings of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub const fn ordered() -> [Self; 4] {
        [Self::Add, Self::Subtract, Self::Multiply, Self::Divide]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Subtract",
            Self::Multiply => "Multiply",
            Self::Divide => "Divide",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    /// Returns `None` when dividing by exactly zero.
    pub fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Self::Add => Some(lhs + rhs),
            Self::Subtract => Some(lhs - rhs),
            Self::Multiply => Some(lhs * rhs),
            Self::Divide if rhs == 0.0 => None,
            Self::Divide => Some(lhs / rhs),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|op| op.label().eq_ignore_ascii_case(trimmed) || op.symbol() == trimmed)
            .ok_or_else(|| UnknownOperator(raw.to_string()))
    }
}

/// Leaf scoring component with a fixed range and step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    name: String,
    min_grade: f64,
    max_grade: f64,
    step_amount: f64,
    current_value: f64,
}

impl Grade {
    /// Build a leaf. The value is clamped into range and snapped onto the step grid.
    pub fn new(
        name: impl Into<String>,
        min_grade: f64,
        max_grade: f64,
        step_amount: f64,
        value: f64,
    ) -> Result<Self, ComponentError> {
        let name = name.into();
        if !Self::bounds_are_valid(min_grade, max_grade, step_amount) {
            return Err(ComponentError::InvalidLeafBounds {
                name,
                min: min_grade,
                max: max_grade,
                step: step_amount,
            });
        }

        let current_value = snap_to_step(value, min_grade, max_grade, step_amount);
        Ok(Self {
            name,
            min_grade,
            max_grade,
            step_amount,
            current_value,
        })
    }

    pub fn bounds_are_valid(min_grade: f64, max_grade: f64, step_amount: f64) -> bool {
        min_grade.is_finite()
            && max_grade.is_finite()
            && step_amount.is_finite()
            && min_grade < max_grade
            && step_amount > 0.0
    }

    /// Whether `value` sits on the step grid anchored at `min_grade`.
    pub fn is_on_step(min_grade: f64, step_amount: f64, value: f64) -> bool {
        let steps = (value - min_grade) / step_amount;
        (steps - steps.round()).abs() <= STEP_TOLERANCE
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_grade(&self) -> f64 {
        self.min_grade
    }

    pub fn max_grade(&self) -> f64 {
        self.max_grade
    }

    pub fn step_amount(&self) -> f64 {
        self.step_amount
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_grade && value <= self.max_grade
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            current: self.current_value,
            min: self.min_grade,
            max: self.max_grade,
        }
    }
}

fn snap_to_step(value: f64, min: f64, max: f64, step: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    let clamped = value.clamp(min, max);
    if Grade::is_on_step(min, step, clamped) {
        return clamped;
    }
    let steps = (clamped - min) / step;
    let snapped = min + steps.round() * step;
    if snapped > max {
        min + steps.floor() * step
    } else {
        snapped
    }
}

/// Composite component: children combined left to right by the interleaved operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    name: String,
    children: Vec<GradableComponent>,
    operators: Vec<Operator>,
}

impl Block {
    pub fn new(
        name: impl Into<String>,
        children: Vec<GradableComponent>,
        operators: Vec<Operator>,
    ) -> Result<Self, ComponentError> {
        let name = name.into();
        if children.is_empty() {
            return Err(ComponentError::EmptyBlock { name });
        }
        if operators.len() != children.len() - 1 {
            return Err(ComponentError::ArityMismatch {
                name,
                children: children.len(),
                operators: operators.len(),
            });
        }

        Ok(Self {
            name,
            children,
            operators,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[GradableComponent] {
        &self.children
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn bounds(&self) -> Result<Bounds, EvaluationError> {
        propagation::evaluate_block(self, "")
    }
}

/// Closed set of scoring tree nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "componentType", rename_all = "lowercase")]
pub enum GradableComponent {
    Grade(Grade),
    Block(Block),
}

impl GradableComponent {
    pub fn name(&self) -> &str {
        match self {
            GradableComponent::Grade(grade) => grade.name(),
            GradableComponent::Block(block) => block.name(),
        }
    }

    pub fn bounds(&self) -> Result<Bounds, EvaluationError> {
        propagation::evaluate(self)
    }

    pub fn current_value(&self) -> Result<f64, EvaluationError> {
        self.bounds().map(|bounds| bounds.current)
    }

    pub fn min(&self) -> Result<f64, EvaluationError> {
        self.bounds().map(|bounds| bounds.min)
    }

    pub fn max(&self) -> Result<f64, EvaluationError> {
        self.bounds().map(|bounds| bounds.max)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, GradableComponent::Grade(_))
    }
}

impl From<Grade> for GradableComponent {
    fn from(grade: Grade) -> Self {
        GradableComponent::Grade(grade)
    }
}

impl From<Block> for GradableComponent {
    fn from(block: Block) -> Self {
        GradableComponent::Block(block)
    }
}

/// Joins a parent scope and a component name into a dot path.
pub(crate) fn child_path(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::ErrorKind;

    #[test]
    fn grade_rejects_inverted_or_flat_ranges() {
        let inverted = Grade::new("Lyrics", 10.0, 1.0, 1.0, 5.0).unwrap_err();
        assert_eq!(inverted.kind(), ErrorKind::InvalidLeafBounds);

        let flat = Grade::new("Lyrics", 5.0, 5.0, 1.0, 5.0).unwrap_err();
        assert_eq!(flat.kind(), ErrorKind::InvalidLeafBounds);
    }

    #[test]
    fn grade_rejects_non_positive_steps() {
        assert!(Grade::new("Lyrics", 0.0, 10.0, 0.0, 5.0).is_err());
        assert!(Grade::new("Lyrics", 0.0, 10.0, -0.5, 5.0).is_err());
        assert!(Grade::new("Lyrics", 0.0, f64::INFINITY, 1.0, 5.0).is_err());
    }

    #[test]
    fn grade_clamps_values_into_range() {
        let high = Grade::new("Lyrics", 1.0, 10.0, 1.0, 14.0).expect("valid grade");
        assert_eq!(high.current_value(), 10.0);

        let low = Grade::new("Lyrics", 1.0, 10.0, 1.0, -3.0).expect("valid grade");
        assert_eq!(low.current_value(), 1.0);
    }

    #[test]
    fn grade_snaps_values_onto_step_grid() {
        let grade = Grade::new("Mixing", 0.0, 10.0, 0.5, 7.3).expect("valid grade");
        assert_eq!(grade.current_value(), 7.5);

        let exact = Grade::new("Mixing", 0.0, 1.0, 0.1, 0.7).expect("valid grade");
        assert_eq!(exact.current_value(), 0.7);

        let uneven = Grade::new("Mixing", 0.0, 10.0, 3.0, 10.0).expect("valid grade");
        assert_eq!(uneven.current_value(), 9.0);
    }

    #[test]
    fn step_grid_membership_tolerates_float_noise() {
        assert!(Grade::is_on_step(0.0, 0.1, 0.7));
        assert!(Grade::is_on_step(1.0, 0.5, 8.5));
        assert!(!Grade::is_on_step(1.0, 1.0, 7.4));
    }

    #[test]
    fn block_requires_children() {
        let err = Block::new("Overall", Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyBlock);
    }

    #[test]
    fn block_requires_one_operator_between_each_pair() {
        let child = GradableComponent::from(Grade::new("A", 0.0, 10.0, 1.0, 5.0).unwrap());
        let err = Block::new(
            "Overall",
            vec![child.clone(), child.clone()],
            vec![Operator::Add, Operator::Add],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ComponentError::ArityMismatch {
                name: "Overall".to_string(),
                children: 2,
                operators: 2,
            }
        );

        let identity = Block::new("Overall", vec![child], Vec::new()).expect("single child block");
        assert!(identity.operators().is_empty());
    }

    #[test]
    fn operators_parse_from_names_and_symbols() {
        assert_eq!("Add".parse::<Operator>(), Ok(Operator::Add));
        assert_eq!("divide".parse::<Operator>(), Ok(Operator::Divide));
        assert_eq!("*".parse::<Operator>(), Ok(Operator::Multiply));
        assert!("Modulo".parse::<Operator>().is_err());
    }

    #[test]
    fn operators_serialize_under_stable_names() {
        let encoded = serde_json::to_string(&Operator::ordered()).expect("serializes");
        assert_eq!(encoded, r#"["Add","Subtract","Multiply","Divide"]"#);
    }

    #[test]
    fn child_paths_join_with_dots() {
        assert_eq!(child_path("", "Production"), "Production");
        assert_eq!(child_path("Production", "Mixing"), "Production.Mixing");
    }
}
