use axum::{extract::State, Json};

use crate::refresh::{PipelineStatus, PublishedSet};
use crate::web::auth::AppState;

#[utoipa::path(
    get,
    path = "/api/positions",
    responses(
        (status = 200, description = "Positions from the last completed pass", body = PublishedSet)
    ),
    tag = "positions"
)]
pub async fn positions(State(state): State<AppState>) -> Json<PublishedSet> {
    Json(state.pipeline.published().as_ref().clone())
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Pipeline status", body = PipelineStatus)
    ),
    tag = "positions"
)]
pub async fn status(State(state): State<AppState>) -> Json<PipelineStatus> {
    Json(state.pipeline.status())
}
