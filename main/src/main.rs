use api_router::{api_state::ApiState, control_routes_v1};
use axum::Router;
use common::{storage::store::StorageManager, utils::config::get_config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    // Create global storage manager
    let storage = StorageManager::new(&config).await?;

    let api_state = ApiState::new(&config, storage).await?;
    info!(
        backends = ?api_state
            .cleanup
            .as_ref()
            .map(|coordinator| coordinator.backend_names()),
        "cleanup coordinator initialized"
    );

    // Create Axum router
    let app = Router::new()
        .nest("/api/v1", control_routes_v1())
        .with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
