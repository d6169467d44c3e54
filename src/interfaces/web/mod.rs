mod handlers;
mod router;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::notify::TelegramNotifier;

pub use router::build_router;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Clone)]
pub struct AppState {
    pub(crate) client: reqwest::Client,
    /// Present only when notifications are enabled; `/chat` is mounted
    /// only in that case.
    pub(crate) notifier: Option<TelegramNotifier>,
}

impl AppState {
    pub fn new(client: reqwest::Client, notifier: Option<TelegramNotifier>) -> Self {
        Self { client, notifier }
    }
}

/// Bind `addr` and serve the listing API until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let notifications = state.notifier.is_some();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(notifications, "API Server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("API server crashed")
}
