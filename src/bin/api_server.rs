// src/bin/api_server.rs

use graphql_schema_diff::infra::telemetry;
use graphql_schema_diff::transport;
use graphql_schema_diff::{ComparatorSlot, Config};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    let config = Config::from_env()?;

    // --- Comparator Initialization (loads the schema and the model, fatal on error) ---
    info!(
        model = ?config.model_file,
        schema = ?config.expected_json_path,
        "Initializing comparator"
    );
    let slot = ComparatorSlot::new();
    let comparator = slot.get_or_bootstrap(&config).await?;
    info!(model_info = ?comparator.model_info(), "Comparator ready");

    let app_state = transport::http::AppState { comparator };

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let swagger = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi());
    let app = transport::http::create_router(app_state)
        .merge(swagger)
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("API server listening on http://{}", listener.local_addr()?);
    info!("Swagger UI available at /swagger-ui");

    transport::http::serve(listener, app, transport::http::shutdown_signal()).await?;

    info!("Graceful shutdown complete");
    Ok(())
}
