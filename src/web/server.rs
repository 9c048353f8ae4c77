use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::catalog::FeedSource;
use crate::config::Config;
use crate::propagate::{BatchPropagator, Sgp4Model};
use crate::refresh::{self, Pipeline};

use super::api::groups as group_handlers;
use super::api::positions as position_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let source = FeedSource::new(config.pipeline.fetch_timeout)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let pipeline = Arc::new(Pipeline::new(
        source,
        BatchPropagator::new(Sgp4Model, config.pipeline.chunk_size),
        config.groups.clone(),
    ));
    let (scheduler, scheduler_task) =
        refresh::spawn(pipeline.clone(), config.pipeline.fetch_interval);

    let state = AppState {
        config: Arc::new(config),
        pipeline,
        scheduler,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/positions", get(position_handlers::positions))
        .route("/api/status", get(position_handlers::status))
        .route("/api/groups", get(group_handlers::list_groups))
        .route(
            "/api/groups/{id}/toggle",
            post(group_handlers::toggle_group),
        )
        .route("/api/refresh", post(group_handlers::refresh))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let served = axum::serve(listener, app).await;

    scheduler_task.stop().await;
    served
}
