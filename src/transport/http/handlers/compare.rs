use crate::transport::http::types::{
    json_400, json_rejection_400, AppState, CompareRequest, CompareResponse,
    MISSING_SCHEMAS_MESSAGE,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Compare two GraphQL schemas and return the comparison results.
///
/// Model failures still answer 200 with `status: "failure"`; only malformed
/// requests are rejected.
#[utoipa::path(
    post,
    path = "/compare",
    request_body = CompareRequest,
    responses(
        (status = 200, description = "Comparison finished (see `status`)", body = CompareResponse),
        (
            status = 400,
            description = "Missing schemas or invalid body",
            body = crate::transport::http::types::ErrorResponse
        )
    )
)]
pub async fn compare_handler(
    State(state): State<AppState>,
    request: Result<Json<CompareRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_rejection_400(e).into_response(),
    };

    let Some((schema1, schema2)) = request.schemas() else {
        return json_400(MISSING_SCHEMAS_MESSAGE).into_response();
    };

    let outcome = state.comparator.compare(schema1, schema2).await;
    (StatusCode::OK, Json(CompareResponse::from(outcome))).into_response()
}
