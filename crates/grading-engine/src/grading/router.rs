use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::materialize::LeafInput;
use super::method::{GradingMethodDraft, GradingMethodId};
use super::rating::RatingId;
use super::repository::{GradingMethodStore, RatingRepository};
use super::service::GradingService;
use crate::error::AppError;

const PUBLIC_METHOD_LIMIT: usize = 50;

/// Leaf values submitted against a stored method.
#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub inputs: Vec<LeafInput>,
}

/// Either a complex rating against a method or a basic 1-10 score.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RatingRequest {
    #[serde(rename_all = "camelCase")]
    Complex {
        method_id: GradingMethodId,
        inputs: Vec<LeafInput>,
    },
    Basic { score: f64 },
}

/// Router builder exposing authoring, evaluation, and rating endpoints.
pub fn grading_router<M, R>(service: Arc<GradingService<M, R>>) -> Router
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/grading-methods",
            get(public_methods_handler::<M, R>).post(author_handler::<M, R>),
        )
        .route(
            "/api/v1/grading-methods/validate",
            post(validate_handler::<M, R>),
        )
        .route(
            "/api/v1/grading-methods/:method_id",
            get(method_handler::<M, R>),
        )
        .route(
            "/api/v1/grading-methods/:method_id/preview",
            get(preview_handler::<M, R>),
        )
        .route(
            "/api/v1/grading-methods/:method_id/evaluate",
            post(evaluate_handler::<M, R>),
        )
        .route("/api/v1/ratings", post(rate_handler::<M, R>))
        .route("/api/v1/ratings/:rating_id", get(rating_handler::<M, R>))
        .with_state(service)
}

pub(crate) async fn validate_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
    axum::Json(draft): axum::Json<GradingMethodDraft>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    match service.validate(&draft) {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "valid": true }))).into_response(),
        Err(failure) => {
            let payload = json!({
                "valid": false,
                "path": failure.path,
                "reason": failure.reason,
                "detail": failure.detail,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn author_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
    axum::Json(draft): axum::Json<GradingMethodDraft>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    match service.author(draft) {
        Ok(method) => (StatusCode::CREATED, axum::Json(method)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn public_methods_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    match service.public_methods(PUBLIC_METHOD_LIMIT) {
        Ok(methods) => (StatusCode::OK, axum::Json(methods)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn method_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
    Path(method_id): Path<String>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    match service.method(&GradingMethodId(method_id)) {
        Ok(method) => {
            let leaf_paths = method.leaf_paths();
            let payload = json!({ "method": method, "leafPaths": leaf_paths });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn preview_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
    Path(method_id): Path<String>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    match service.preview(&GradingMethodId(method_id)) {
        Ok(projection) => (StatusCode::OK, axum::Json(projection)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn evaluate_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
    Path(method_id): Path<String>,
    axum::Json(request): axum::Json<EvaluationRequest>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    match service.evaluate(&GradingMethodId(method_id), &request.inputs) {
        Ok(projection) => (StatusCode::OK, axum::Json(projection)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn rate_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
    axum::Json(request): axum::Json<RatingRequest>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    let result = match request {
        RatingRequest::Complex { method_id, inputs } => service.rate(&method_id, &inputs),
        RatingRequest::Basic { score } => service.rate_basic(score),
    };
    match result {
        Ok(rating) => (StatusCode::CREATED, axum::Json(rating.view())).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn rating_handler<M, R>(
    State(service): State<Arc<GradingService<M, R>>>,
    Path(rating_id): Path<String>,
) -> Response
where
    M: GradingMethodStore + 'static,
    R: RatingRepository + 'static,
{
    match service.rating(&RatingId(rating_id)) {
        Ok(rating) => (StatusCode::OK, axum::Json(rating.view())).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
