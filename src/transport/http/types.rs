use crate::app::comparator_service::{ComparatorService, ComparisonOutcome};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

pub use crate::app::comparator_service::{ModelInfo, StatisticsSnapshot};

pub const MISSING_SCHEMAS_MESSAGE: &str = "Both schemas must be provided";

#[derive(Clone)]
pub struct AppState {
    pub comparator: Arc<ComparatorService>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CompareRequest {
    /// The first GraphQL schema (SDL).
    #[schema(example = "type Query { hello: String }")]
    #[serde(default)]
    pub schema1: Option<String>,
    /// The second GraphQL schema (SDL).
    #[schema(example = "type Query { hello: String, goodbye: String }")]
    #[serde(default)]
    pub schema2: Option<String>,
}

impl CompareRequest {
    /// Both schemas, if both are present and non-empty.
    pub fn schemas(&self) -> Option<(&str, &str)> {
        match (self.schema1.as_deref(), self.schema2.as_deref()) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some((a, b)),
            _ => None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct CompareResponse {
    pub status: Status,
    /// The comparison result (`{}` on failure).
    #[schema(value_type = Object)]
    pub result: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<ComparisonOutcome> for CompareResponse {
    fn from(outcome: ComparisonOutcome) -> Self {
        match outcome {
            ComparisonOutcome::Success { result } => CompareResponse {
                status: Status::Success,
                result,
                error_message: None,
            },
            ComparisonOutcome::Failure { message } => CompareResponse {
                status: Status::Failure,
                result: JsonValue::Object(Default::default()),
                error_message: Some(message),
            },
        }
    }
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub status: Status,
    #[schema(example = "Both schemas must be provided")]
    pub message: String,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `unhealthy`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn json_400(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            status: Status::Failure,
            message: message.into(),
        }),
    )
}

pub fn json_rejection_400(err: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    json_400(format!("Invalid JSON body: {}", err))
}
