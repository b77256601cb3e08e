use std::sync::Arc;

use anyhow::Context;
use db::DBService;
use server::{
    AppState,
    config::{BlobBackend, ServerConfig},
    router,
};
use services::services::blob_store::{BlobStore, HttpBlobStore, LocalBlobStore};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json().with_target(false)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = ServerConfig::from_env().context("failed to load configuration")?;

    let db = DBService::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_url))?;

    let blobs: Arc<dyn BlobStore> = match &config.blob_backend {
        BlobBackend::Local { root } => {
            tokio::fs::create_dir_all(root)
                .await
                .with_context(|| format!("failed to create blob root {}", root.display()))?;
            info!(root = %root.display(), "storing pictures on local disk");
            Arc::new(LocalBlobStore::new(
                root.clone(),
                config.blob_public_url.clone(),
            ))
        }
        BlobBackend::Http { endpoint } => {
            info!(%endpoint, "storing pictures in remote blob store");
            Arc::new(HttpBlobStore::new(
                endpoint.clone(),
                config.blob_public_url.clone(),
            )?)
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(config, db, blobs));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("profile server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("profile server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for shutdown signal");
    }
}
