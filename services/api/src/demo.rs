use crate::infra::{InMemoryGradingMethodStore, InMemoryRatingRepository};
use chrono::SecondsFormat;
use clap::Args;
use grading_engine::config::{AppConfig, GradingConfig};
use grading_engine::error::AppError;
use grading_engine::grading::{
    ComponentProjection, GradingEngine, GradingMethodDraft, GradingMethodId, GradingService,
    LeafInput, MethodValidator, Rating, RatingProjection,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Grading method JSON file (authoring payload, without an id)
    #[arg(long)]
    pub(crate) method: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Grading method JSON file (authoring payload, without an id)
    #[arg(long)]
    pub(crate) method: PathBuf,
    /// JSON array of `{ "componentPath": ..., "value": ... }` entries
    #[arg(long)]
    pub(crate) inputs: PathBuf,
    /// Print the full projection as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print each projection tree after its summary line.
    #[arg(long)]
    pub(crate) show_tree: bool,
}

const LOCAL_METHOD_ID: &str = "local";

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let draft: GradingMethodDraft = read_json(&args.method)?;

    let validator = MethodValidator::from_config(&config.grading);
    if let Err(failure) = validator.validate(&draft) {
        println!(
            "Grading method '{}' is invalid at {} ({}): {}",
            draft.name,
            failure.path,
            failure.reason.label(),
            failure.detail
        );
        return Err(AppError::Grading(failure.into()));
    }

    let method = draft.into_definition(GradingMethodId(LOCAL_METHOD_ID.to_string()));
    println!("Grading method '{}' is valid", method.name);
    println!("Leaf paths a submission must supply:");
    for path in method.leaf_paths() {
        println!("  - {path}");
    }
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let draft: GradingMethodDraft = read_json(&args.method)?;
    let inputs: Vec<LeafInput> = read_json(&args.inputs)?;

    MethodValidator::from_config(&config.grading)
        .validate(&draft)
        .map_err(|failure| AppError::Grading(failure.into()))?;

    let method = draft.into_definition(GradingMethodId(LOCAL_METHOD_ID.to_string()));
    let engine = GradingEngine::new(&config.grading);
    let evaluation = engine
        .evaluate(&method, &inputs)
        .map_err(|err| AppError::Grading(err.into()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation.projection)?);
    } else {
        render_projection(&evaluation.projection, true);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let methods = Arc::new(InMemoryGradingMethodStore::default());
    let ratings = Arc::new(InMemoryRatingRepository::default());
    let service = GradingService::new(methods, ratings.clone(), &GradingConfig::default());

    println!("Composite grading demo");

    let scenarios = [
        (
            "Single grade",
            single_grade_method(),
            vec![LeafInput::new("Lyrics", 7.0)],
        ),
        (
            "Added grades",
            two_part_method("Add"),
            vec![LeafInput::new("Overall.A", 8.0), LeafInput::new("Overall.B", 4.0)],
        ),
        (
            "Divided by zero",
            two_part_method("Divide"),
            vec![LeafInput::new("Overall.A", 8.0), LeafInput::new("Overall.B", 0.0)],
        ),
    ];

    for (label, draft, inputs) in scenarios {
        let draft: GradingMethodDraft = serde_json::from_value(draft)?;
        println!("\n{label}");
        let method = match service.author(draft) {
            Ok(method) => method,
            Err(err) => {
                println!("  Authoring rejected: {err}");
                continue;
            }
        };
        println!(
            "- Authored {} '{}' expecting {}",
            method.id,
            method.name,
            method.leaf_paths().join(", ")
        );

        match service.rate(&method.id, &inputs) {
            Ok(rating) => render_rating(&rating, args.show_tree),
            Err(err) => println!(
                "  Evaluation aborted ({}): {err}",
                err.kind().map(|kind| kind.label()).unwrap_or("Storage")
            ),
        }
    }

    println!("\nBasic rating");
    match service.rate_basic(8.0) {
        Ok(rating) => render_rating(&rating, false),
        Err(err) => println!("  Basic rating rejected: {err}"),
    }

    println!("\n{} rating(s) stored", ratings.len());
    Ok(())
}

fn read_json<T>(path: &Path) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn render_rating(rating: &Rating, show_tree: bool) {
    let view = rating.view();
    println!(
        "- Rating {} ({}) at {} -> display grade {:.2}",
        view.rating_id,
        view.kind,
        view.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        view.display_grade
    );
    if let Some(projection) = &view.detail {
        render_projection(projection, show_tree);
    }
}

fn render_projection(projection: &RatingProjection, show_tree: bool) {
    let normalized = projection
        .normalized_grade
        .map(|grade| format!("{grade:.2}"))
        .unwrap_or_else(|| "n/a (degenerate range)".to_string());
    println!(
        "  {}: current {} in [{}, {}], normalized {} on [{}, {}]",
        projection.root.name,
        projection.root.current_value,
        projection.root.min,
        projection.root.max,
        normalized,
        projection.display_min,
        projection.display_max
    );
    if show_tree {
        for component in &projection.root.children {
            render_component(component, 2);
        }
    }
}

fn render_component(component: &ComponentProjection, depth: usize) {
    let indent = "  ".repeat(depth);
    match component {
        ComponentProjection::Grade(grade) => println!(
            "{indent}- {} = {} (range {}..{}, step {})",
            grade.name, grade.current_value, grade.min, grade.max, grade.step_amount
        ),
        ComponentProjection::Block(block) => {
            let operators: Vec<&str> = block.operators.iter().map(|op| op.symbol()).collect();
            println!(
                "{indent}- {} = {} (range {}..{}, operators [{}])",
                block.name,
                block.current_value,
                block.min,
                block.max,
                operators.join(" ")
            );
            for child in &block.children {
                render_component(child, depth + 1);
            }
        }
    }
}

fn single_grade_method() -> serde_json::Value {
    json!({
        "name": "Lyrics only",
        "ownerId": "demo",
        "isPublic": true,
        "topLevel": [
            { "componentType": "grade", "name": "Lyrics", "minGrade": 1, "maxGrade": 10, "stepAmount": 1 }
        ]
    })
}

fn two_part_method(operator: &str) -> serde_json::Value {
    json!({
        "name": format!("Two part ({operator})"),
        "ownerId": "demo",
        "isPublic": true,
        "topLevel": [{
            "componentType": "block",
            "name": "Overall",
            "children": [
                { "componentType": "grade", "name": "A", "minGrade": 0, "maxGrade": 10, "stepAmount": 1 },
                { "componentType": "grade", "name": "B", "minGrade": 0, "maxGrade": 10, "stepAmount": 1 }
            ],
            "operators": [operator]
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_methods_deserialize_as_drafts() {
        let single: GradingMethodDraft =
            serde_json::from_value(single_grade_method()).expect("single grade draft");
        assert_eq!(single.top_level.len(), 1);

        let divided: GradingMethodDraft =
            serde_json::from_value(two_part_method("Divide")).expect("two part draft");
        assert_eq!(divided.name, "Two part (Divide)");
        let validator = MethodValidator::from_config(&GradingConfig::default());
        assert!(validator.validate(&divided).is_ok());
    }

    #[test]
    fn demo_runs_every_scenario() {
        run_demo(DemoArgs { show_tree: true }).expect("demo completes");
    }
}
