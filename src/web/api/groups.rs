use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::ObjectGroup;
use crate::config::Permission;
use crate::refresh::Trigger;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, AuthenticatedUser};

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupResponse {
    #[serde(flatten)]
    pub group: ObjectGroup,
    /// Element sets currently cached for this group.
    pub cached: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// False if the scheduler was not accepting triggers.
    pub queued: bool,
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "Configured object groups", body = Vec<GroupResponse>)
    ),
    tag = "groups"
)]
pub async fn list_groups(State(state): State<AppState>) -> Json<Vec<GroupResponse>> {
    let cache = state.pipeline.cache();
    let groups = state
        .pipeline
        .groups()
        .iter()
        .map(|group| GroupResponse {
            group: group.clone(),
            cached: cache.get(&group.id).len(),
        })
        .collect();
    Json(groups)
}

#[utoipa::path(
    post,
    path = "/api/groups/{id}/toggle",
    params(
        ("id" = String, Path, description = "Group id")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Group after toggling", body = ObjectGroup),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn toggle_group(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ObjectGroup>> {
    require_permission(&user, Permission::ToggleGroups)?;

    let group = state.pipeline.toggle_group(&id)?;
    log::info!("{} toggled group {}", user.name, id);
    state.scheduler.trigger(Trigger::GroupToggled);

    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/refresh",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 202, description = "Refresh queued", body = RefreshResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    tag = "groups"
)]
pub async fn refresh(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<(StatusCode, Json<RefreshResponse>)> {
    require_permission(&user, Permission::Refresh)?;

    let queued = state.scheduler.trigger(Trigger::Refresh);
    Ok((StatusCode::ACCEPTED, Json(RefreshResponse { queued })))
}
