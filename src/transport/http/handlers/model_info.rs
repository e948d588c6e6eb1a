use crate::transport::http::types::{AppState, ModelInfo};
use axum::extract::State;
use axum::Json;

/// Get information about the loaded model (path, load time, size, load-time configuration).
#[utoipa::path(
    get,
    path = "/model-info",
    responses(
        (status = 200, description = "Information about the model", body = ModelInfo)
    )
)]
pub async fn model_info_handler(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.comparator.model_info())
}
