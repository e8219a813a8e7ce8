//! Relay server setup and routing

use axum::{
    extract::State,
    routing::{any, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handler::RelayHandler;
use crate::config::AppConfig;

/// Shared state for the relay
///
/// The only value shared across requests is read-only: the configuration and
/// the credential. Requests do not otherwise interact.
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<AppConfig>,
    pub http_client: reqwest::Client,
    /// Upstream bearer credential; `None` yields a 500 on every request
    /// rather than a startup crash.
    pub api_key: Option<String>,
}

impl RelayState {
    pub fn new(
        config: AppConfig,
        api_key: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = build_http_client(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http_client,
            api_key,
        })
    }
}

/// Build the HTTP client used for upstream connections
fn build_http_client(config: &AppConfig) -> Result<reqwest::Client, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_seconds))
        .build()?;
    Ok(client)
}

/// Build the relay router
pub fn build_router(state: RelayState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // The relay endpoint; registered with any() so the handler itself
        // can answer non-POST methods with a plain-text 405
        .route("/v1/chat/completions", any(relay_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay server
pub async fn run_server(
    config: AppConfig,
    api_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let upstream = config.upstream.endpoint().to_string();

    let state = RelayState::new(config, api_key)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("chat-relay listening on {}", addr);
    tracing::info!("Relaying to {}", upstream);

    Ok(axum::serve(listener, app).await?)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Relay endpoint handler
async fn relay_handler(
    State(state): State<RelayState>,
    req: axum::extract::Request,
) -> axum::response::Response {
    let handler = RelayHandler::new(state);
    handler.handle(req).await
}
