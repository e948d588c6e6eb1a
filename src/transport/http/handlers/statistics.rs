use crate::transport::http::types::{AppState, StatisticsSnapshot};
use axum::extract::State;
use axum::Json;

/// Get statistics of API calls, query times, and breaking change counts.
#[utoipa::path(
    get,
    path = "/statistics",
    responses(
        (status = 200, description = "Comparator usage counters", body = StatisticsSnapshot)
    )
)]
pub async fn statistics_handler(State(state): State<AppState>) -> Json<StatisticsSnapshot> {
    Json(state.comparator.statistics().await)
}
