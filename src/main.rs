use std::time::Duration;

use anyhow::{Context, Result};
use bfh_auth::metadata::InMemoryMetadataCache;
use bfh_auth::middleware::{AuthConfig, auth_routes};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_LOG_FILTER: &str = "bfh_auth=info,tower_http=info,warn";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real env vars take precedence either way.
    let _ = dotenvy::dotenv();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .init();

    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let config = AuthConfig::from_env()
        .context("invalid auth configuration")?
        .with_http_client(http);

    let app = auth_routes(config, InMemoryMetadataCache::new()).layer(TraceLayer::new_for_http());

    let addr = std::env::var("BFH_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %addr, "bfh-auth listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
