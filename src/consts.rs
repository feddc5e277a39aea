//! Project-wide constants.

/// Public host the dialog platform uses to reach this server.
pub const DEFAULT_HOST: &str = "http://localhost:8080";

/// Socket address the server listens on when none is configured.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

pub const HOST_ENV: &str = "ASKFAST_HOST";
pub const BIND_ENV: &str = "ASKFAST_BIND";
pub const SCRIPTS_ENV: &str = "ASKFAST_SCRIPTS";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "askfast=info";

/// Identifier of the placeholder question a fresh dialog starts with.
pub const INITIAL_QUESTION_ID: &str = "1";

/// Scheme the platform uses for inline (non-fetched) text.
pub const TEXT_SCHEME: &str = "text://";

/// Mount point of the dialog routes.
pub const DIALOGS_PATH: &str = "/dialogs";

/// Base URL of a script's dialog, e.g. `http://host/dialogs/party`.
pub fn dialog_base_url(host: &str, script: &str) -> String {
    format!("{}{DIALOGS_PATH}/{script}", host.trim_end_matches('/'))
}
