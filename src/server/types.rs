//! Request and response bodies of the HTTP surface.

use serde::{Deserialize, Serialize};

/// Query parameters the platform appends to every dialog request.
#[derive(Debug, Default, Deserialize)]
pub struct DialogQuery {
    pub preferred_medium: Option<String>,
    pub responder: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScriptListResponse {
    pub scripts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
