use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::groups::{GroupResponse, RefreshResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::positions::positions,
        super::api::positions::status,
        super::api::groups::list_groups,
        super::api::groups::toggle_group,
        super::api::groups::refresh,
    ),
    components(
        schemas(
            GroupResponse,
            RefreshResponse,
            ErrorResponse,
            crate::catalog::ObjectGroup,
            crate::propagate::PropagatedPosition,
            crate::refresh::PublishedSet,
            crate::refresh::PipelineStatus,
            crate::refresh::PipelineMode,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Sat-Fusion API",
        description = "Deduplicated, propagated positions from merged orbital catalogs",
        version = "0.1.0"
    ),
    tags(
        (name = "positions", description = "Published position set and pipeline status"),
        (name = "groups", description = "Object group selection and catalog refresh")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
