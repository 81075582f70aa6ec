use anyhow::Result;
use services::storage_service::{ObjectStoreClient, StorageService, StoreClient};
use state::AppState;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> Result<()> {
    // --- .env before logging so RUST_LOG can come from it ---
    let dotenv = dotenvy::dotenv();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = dotenv {
        tracing::warn!("No .env file loaded: {}", err);
    }

    // --- Parse config; a missing bucket ends the process here ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting gcs-uploader with config: {:?}", cfg);

    // --- Initialize store client ---
    let client: Arc<dyn StoreClient> = if cfg.in_memory {
        tracing::warn!("Using in-memory store; uploaded objects are lost on exit");
        Arc::new(ObjectStoreClient::in_memory(&cfg.bucket))
    } else {
        Arc::new(ObjectStoreClient::gcs(&cfg.bucket)?)
    };
    let storage = StorageService::new(client, cfg.upload_timeout);

    // --- Build router ---
    let state = AppState::new(cfg.bucket.clone(), storage);
    let app = routes::routes::app(state, cfg.max_upload_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
