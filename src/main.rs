use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sharebox::{
    app,
    config::Config,
    state::AppState,
    storage::LocalStorage,
    store::init_store,
};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sharebox=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = init_store(&config).await?;
    let blobs = LocalStorage::new(&config.upload_dir).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = app(AppState {
        store,
        blobs,
        config,
    });

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
