//! Homescreen CMS server: loads settings, connects storage, serves the REST API.
//!
//! Run from repo root: `cargo run -p homescreen-server`

use homescreen_cms::{app, blob, AppState, BlobStorage, Models, Settings, StoreConnector};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("homescreen_cms=info,homescreen_server=info,tower_http=info")
            }),
        )
        .init();

    let settings = Settings::from_env()?;

    let connector = StoreConnector::new(settings.store.clone());
    let store = connector.connect().await?;
    let models = Models::init(store.clone()).await?;

    let blobs = blob::open(&settings.blobs).await?;
    blobs.ensure_bucket().await?;

    let state = AppState::new(store, &models, blobs, settings.max_upload_bytes);
    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!("homescreen server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
