//! Value and bound propagation over a component tree.
//!
//! A block's current value, minimum, and maximum come from three independent left-to-right
//! folds over the same operator sequence: `((c0 op0 c1) op1 c2) ...`. There is no operator
//! precedence. Because the same fold is applied to the bounds as to the value, `Subtract` and
//! `Divide` chains can yield a "min" that does not bound the value, or exceeds the "max".
//! Persisted grading methods rely on these ranges, so they are reproduced as-is.

use serde::{Deserialize, Serialize};

use super::component::{child_path, Block, GradableComponent, Operator};
use super::error::EvaluationError;

/// Current value and range of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub current: f64,
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn contains_current(&self) -> bool {
        self.min <= self.current && self.current <= self.max
    }
}

/// Evaluate any node, addressing blocks by their own name.
pub fn evaluate(component: &GradableComponent) -> Result<Bounds, EvaluationError> {
    evaluate_in_scope(component, "")
}

/// Evaluate a method root: its children are addressed from the top level, while fold
/// failures on the root itself are reported under the root's name.
pub fn evaluate_root(root: &Block) -> Result<Bounds, EvaluationError> {
    let children = root
        .children()
        .iter()
        .map(|child| evaluate_in_scope(child, ""))
        .collect::<Result<Vec<_>, _>>()?;
    fold_bounds(root.name(), &children, root.operators())
}

pub(crate) fn evaluate_block(block: &Block, scope: &str) -> Result<Bounds, EvaluationError> {
    let path = child_path(scope, block.name());
    let children = block
        .children()
        .iter()
        .map(|child| evaluate_in_scope(child, &path))
        .collect::<Result<Vec<_>, _>>()?;
    fold_bounds(&path, &children, block.operators())
}

fn evaluate_in_scope(
    component: &GradableComponent,
    scope: &str,
) -> Result<Bounds, EvaluationError> {
    match component {
        GradableComponent::Grade(grade) => Ok(grade.bounds()),
        GradableComponent::Block(block) => evaluate_block(block, scope),
    }
}

/// Combine already-evaluated children. `path` names the block being folded.
pub(crate) fn fold_bounds(
    path: &str,
    children: &[Bounds],
    operators: &[Operator],
) -> Result<Bounds, EvaluationError> {
    Ok(Bounds {
        current: fold(path, children.iter().map(|bounds| bounds.current), operators)?,
        min: fold(path, children.iter().map(|bounds| bounds.min), operators)?,
        max: fold(path, children.iter().map(|bounds| bounds.max), operators)?,
    })
}

/// Strict left-to-right reduction of `values` with the interleaved `operators`.
pub fn fold<I>(path: &str, values: I, operators: &[Operator]) -> Result<f64, EvaluationError>
where
    I: IntoIterator<Item = f64>,
{
    let mut values = values.into_iter();
    let mut accumulator = values.next().unwrap_or(0.0);
    for (operator, value) in operators.iter().zip(values) {
        accumulator = operator
            .apply(accumulator, value)
            .ok_or_else(|| EvaluationError::DivisionByZero(path.to_string()))?;
    }
    Ok(accumulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::component::Grade;

    fn leaf(name: &str, min: f64, max: f64, value: f64) -> GradableComponent {
        Grade::new(name, min, max, 1.0, value)
            .expect("valid grade")
            .into()
    }

    #[test]
    fn fold_is_left_associative() {
        let value = fold(
            "chain",
            [10.0, 3.0, 2.0],
            &[Operator::Subtract, Operator::Subtract],
        )
        .expect("fold succeeds");
        assert_eq!(value, 5.0);
    }

    #[test]
    fn fold_ignores_precedence() {
        let value = fold("chain", [2.0, 3.0, 4.0], &[Operator::Add, Operator::Multiply])
            .expect("fold succeeds");
        assert_eq!(value, 20.0);
    }

    #[test]
    fn fold_reports_division_by_zero_with_path() {
        let err = fold("Overall", [8.0, 0.0], &[Operator::Divide]).unwrap_err();
        assert_eq!(err, EvaluationError::DivisionByZero("Overall".to_string()));
    }

    #[test]
    fn leaf_bounds_are_its_stored_fields() {
        let bounds = evaluate(&leaf("Lyrics", 1.0, 10.0, 7.0)).expect("leaf evaluates");
        assert_eq!(
            bounds,
            Bounds {
                current: 7.0,
                min: 1.0,
                max: 10.0
            }
        );
    }

    #[test]
    fn single_child_block_passes_through() {
        let block = Block::new("Solo", vec![leaf("A", 0.0, 5.0, 3.0)], Vec::new()).unwrap();
        let bounds = evaluate(&block.into()).expect("block evaluates");
        assert_eq!(bounds.current, 3.0);
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 5.0);
    }

    #[test]
    fn subtract_folds_bounds_without_interval_arithmetic() {
        let block = Block::new(
            "Balance",
            vec![leaf("A", 0.0, 10.0, 6.0), leaf("B", 0.0, 10.0, 2.0)],
            vec![Operator::Subtract],
        )
        .unwrap();
        let bounds = block.bounds().expect("block evaluates");

        assert_eq!(bounds.current, 4.0);
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 0.0);
        assert!(!bounds.contains_current());
    }

    #[test]
    fn divide_chains_can_invert_min_and_max() {
        let block = Block::new(
            "Ratio",
            vec![leaf("A", 2.0, 4.0, 3.0), leaf("B", 1.0, 8.0, 2.0)],
            vec![Operator::Divide],
        )
        .unwrap();
        let bounds = block.bounds().expect("block evaluates");

        assert_eq!(bounds.current, 1.5);
        assert_eq!(bounds.min, 2.0);
        assert_eq!(bounds.max, 0.5);
        assert!(bounds.min > bounds.max);
    }

    #[test]
    fn nested_division_by_zero_names_the_inner_block() {
        let inner = Block::new(
            "Mixing",
            vec![leaf("Clarity", 1.0, 10.0, 4.0), leaf("Balance", 0.0, 10.0, 0.0)],
            vec![Operator::Divide],
        )
        .unwrap();
        let outer = Block::new(
            "Production",
            vec![inner.into(), leaf("Mastering", 1.0, 10.0, 5.0)],
            vec![Operator::Add],
        )
        .unwrap();

        let err = evaluate(&outer.into()).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::DivisionByZero("Production.Mixing".to_string())
        );
    }

    #[test]
    fn root_children_are_addressed_from_the_top_level() {
        let overall = Block::new(
            "Overall",
            vec![leaf("A", 0.0, 10.0, 8.0), leaf("B", 0.0, 10.0, 0.0)],
            vec![Operator::Divide],
        )
        .unwrap();
        let root = Block::new("Album method", vec![overall.into()], Vec::new()).unwrap();

        let err = evaluate_root(&root).unwrap_err();
        assert_eq!(err, EvaluationError::DivisionByZero("Overall".to_string()));
    }

    #[test]
    fn root_level_fold_failures_use_the_root_name() {
        let root = Block::new(
            "Album method",
            vec![leaf("A", 0.0, 10.0, 8.0), leaf("B", 0.0, 10.0, 0.0)],
            vec![Operator::Divide],
        )
        .unwrap();

        let err = evaluate_root(&root).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::DivisionByZero("Album method".to_string())
        );
    }
}
