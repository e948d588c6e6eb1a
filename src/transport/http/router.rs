use crate::transport::http::handlers::{compare, health, model_info, statistics};
use crate::transport::http::types::{
    CompareRequest, CompareResponse, ErrorResponse, HealthResponse, ModelInfo, StatisticsSnapshot,
    Status,
};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GraphQL schema diff",
        description = "Model-backed breaking change detection for GraphQL schemas"
    ),
    paths(
        compare::compare_handler,
        statistics::statistics_handler,
        model_info::model_info_handler,
        health::healthcheck_handler
    ),
    components(schemas(
        CompareRequest,
        CompareResponse,
        ErrorResponse,
        HealthResponse,
        ModelInfo,
        StatisticsSnapshot,
        Status
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/compare", post(compare::compare_handler))
        .route("/statistics", get(statistics::statistics_handler))
        .route("/model-info", get(model_info::model_info_handler))
        .route("/health", get(health::healthcheck_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
