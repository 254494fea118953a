use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryGradingMethodStore, InMemoryRatingRepository};
use crate::routes::with_grading_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grading_engine::config::AppConfig;
use grading_engine::error::AppError;
use grading_engine::grading::GradingService;
use grading_engine::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let methods = Arc::new(InMemoryGradingMethodStore::default());
    let ratings = Arc::new(InMemoryRatingRepository::default());
    let grading_service = Arc::new(GradingService::new(methods, ratings, &config.grading));

    let app = with_grading_routes(grading_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        display_min = config.grading.display_scale.min(),
        display_max = config.grading.display_scale.max(),
        submission_policy = %config.grading.submission_value_policy,
        "grading engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
