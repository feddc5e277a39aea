//! Server settings.
//!
//! Resolved from the environment first, then overridden by command-line
//! flags in `main`.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::consts::{BIND_ENV, DEFAULT_BIND, DEFAULT_HOST, HOST_ENV, SCRIPTS_ENV, dialog_base_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Public URL the dialog platform reaches this server on.
    pub host: String,
    /// Local address to listen on.
    pub bind: SocketAddr,
    /// Directory of extra `*.json` dialog scripts.
    pub scripts_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through `lookup`, falling back to defaults for
    /// unset or empty keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let bind = get(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = parse_bind(&bind).with_context(|| format!("invalid {BIND_ENV}"))?;
        let scripts_dir = get(SCRIPTS_ENV).map(PathBuf::from);

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            bind,
            scripts_dir,
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        bind: Option<SocketAddr>,
        scripts_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host.trim_end_matches('/').to_string();
        }
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if scripts_dir.is_some() {
            self.scripts_dir = scripts_dir;
        }
        self
    }

    /// Base URL of a script's dialog.
    pub fn dialog_url(&self, script: &str) -> String {
        dialog_base_url(&self.host, script)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            scripts_dir: None,
        }
    }
}

fn parse_bind(value: &str) -> Result<SocketAddr> {
    value
        .trim()
        .parse()
        .with_context(|| format!("`{value}` is not a socket address"))
}
