mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use clash_common::config::ProxyConfig;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct AppState {
    pub http: reqwest::Client,
    pub config: ProxyConfig,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream.request_timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self { http, config })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber; LOG_FORMAT=json for log collectors
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_target(false);
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Clash proxy booting...");

    // A proxy without credentials can only fail every request
    let config = ProxyConfig::from_env().map_err(|e| {
        error!("Invalid proxy configuration: {}", e);
        e
    })?;

    info!(upstream = %config.upstream.base_url, "Forwarding submissions upstream");

    let addr = config.listen_addr;
    let state = Arc::new(AppState::new(config)?);
    let app = routes::routes().with_state(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
