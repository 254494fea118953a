use proptest::prelude::*;

use crate::grading::propagation::{evaluate, fold};
use crate::grading::{
    Block, Bounds, DisplayScale, ErrorKind, GradableComponent, Grade, Operator,
};

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Add),
        Just(Operator::Subtract),
        Just(Operator::Multiply),
        Just(Operator::Divide),
    ]
}

fn growing_operator() -> impl Strategy<Value = Operator> {
    prop_oneof![Just(Operator::Add), Just(Operator::Multiply)]
}

fn non_negative_leaf() -> impl Strategy<Value = GradableComponent> {
    (0.0f64..5.0, 1.0f64..5.0, 0.0f64..=1.0).prop_map(|(min, width, position)| {
        Grade::new("leaf", min, min + width, 0.5, min + position * width)
            .expect("generated bounds are valid")
            .into()
    })
}

fn growing_tree() -> impl Strategy<Value = GradableComponent> {
    non_negative_leaf().prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec((inner, growing_operator()), 1..4).prop_map(|pairs| {
            let operators = pairs.iter().skip(1).map(|(_, op)| *op).collect();
            let children = pairs.into_iter().map(|(child, _)| child).collect();
            Block::new("node", children, operators)
                .expect("operators align with children")
                .into()
        })
    })
}

fn leaf(value: f64) -> GradableComponent {
    Grade::new("leaf", 0.0, 10.0, 1.0, value)
        .expect("valid leaf")
        .into()
}

proptest! {
    #[test]
    fn blocks_accept_exactly_one_operator_fewer_than_children(
        children in 0usize..6,
        operators in prop::collection::vec(operator(), 0..6),
    ) {
        let nodes: Vec<GradableComponent> = (0..children).map(|i| leaf(i as f64)).collect();
        let expected = children >= 1 && operators.len() + 1 == children;

        let built = Block::new("node", nodes, operators);

        prop_assert_eq!(built.is_ok(), expected);
        if let Err(err) = built {
            let kind = if children == 0 { ErrorKind::EmptyBlock } else { ErrorKind::ArityMismatch };
            prop_assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn growing_trees_keep_the_value_inside_its_range(tree in growing_tree()) {
        let bounds = evaluate(&tree).expect("no division in growing trees");
        prop_assert!(
            bounds.contains_current(),
            "{} outside [{}, {}]",
            bounds.current,
            bounds.min,
            bounds.max
        );
    }

    #[test]
    fn normalization_maps_endpoints_and_preserves_order(
        min in -100.0f64..100.0,
        width in 0.1f64..100.0,
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
    ) {
        let scale = DisplayScale::default();
        let max = min + width;
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let at = |current: f64| scale.normalize(&Bounds { current, min, max }).expect("non-degenerate");

        prop_assert!((at(min) - scale.min()).abs() < 1e-9);
        prop_assert!((at(max) - scale.max()).abs() < 1e-9);
        prop_assert!(at(min + low * width) <= at(min + high * width));
    }

    #[test]
    fn folding_a_prefix_first_gives_the_same_result(
        values in prop::collection::vec(-50.0f64..50.0, 2..7),
        operators in prop::collection::vec(
            prop_oneof![Just(Operator::Add), Just(Operator::Subtract), Just(Operator::Multiply)],
            6,
        ),
        split in 1usize..6,
    ) {
        let operators = &operators[..values.len() - 1];
        let split = split.min(values.len() - 1);

        let whole = fold("node", values.iter().copied(), operators).expect("no division");
        let prefix = fold("node", values[..split].iter().copied(), &operators[..split - 1])
            .expect("no division");
        let rest = std::iter::once(prefix).chain(values[split..].iter().copied());
        let resumed = fold("node", rest, &operators[split - 1..]).expect("no division");

        prop_assert_eq!(whole.to_bits(), resumed.to_bits());
    }

    #[test]
    fn any_zero_divisor_aborts_the_fold(
        values in prop::collection::vec(1.0f64..50.0, 1..6),
        zero_at in 0usize..6,
    ) {
        let mut values = values;
        let position = 1 + zero_at % values.len();
        values.insert(position, 0.0);
        let operators = vec![Operator::Divide; values.len() - 1];

        let err = fold("Overall", values, &operators).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::DivisionByZero);
        prop_assert_eq!(err.path(), Some("Overall"));
    }
}
