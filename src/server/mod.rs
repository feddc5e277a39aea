//! HTTP API the dialog platform talks to.

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::dialog::DialogState;
use crate::script::ScriptRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub scripts: Arc<ScriptRegistry>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(scripts: ScriptRegistry, settings: Settings) -> Self {
        Self {
            scripts: Arc::new(scripts),
            settings: Arc::new(settings),
        }
    }

    /// A fresh dialog for one request against `script`.
    pub fn dialog(&self, script: &str) -> DialogState {
        DialogState::new(self.settings.dialog_url(script))
    }
}

/// Serve until Ctrl+C.
pub async fn serve(state: AppState, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(
        addr = %listener.local_addr()?,
        host = %state.settings.host,
        scripts = ?state.scripts.names(),
        "dialog server listening"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
