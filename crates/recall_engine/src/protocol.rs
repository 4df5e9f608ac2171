//! Messages exchanged with other extension contexts (popup, background).
//!
//! A liveness probe is answered on the spot. A retrieve command first signals
//! that the answer will come later, then resolves once the lookup finishes.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionRequest {
    Ping,
    RetrieveMemoriesForContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtensionResponse {
    pub fn alive(timestamp: i64) -> Self {
        Self {
            ok: true,
            timestamp: Some(timestamp),
            error: None,
        }
    }

    pub fn success() -> Self {
        Self {
            ok: true,
            timestamp: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            timestamp: None,
            error: Some(error.into()),
        }
    }
}

/// The two completion paths of a request.
#[derive(Debug)]
pub enum Reply {
    Immediate(ExtensionResponse),
    /// The channel stays open until the runtime resolves the request.
    Deferred(oneshot::Receiver<ExtensionResponse>),
}

impl Reply {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Reply::Deferred(_))
    }

    pub async fn resolve(self) -> ExtensionResponse {
        match self {
            Reply::Immediate(response) => response,
            Reply::Deferred(rx) => rx
                .await
                .unwrap_or_else(|_| ExtensionResponse::failure("content script went away")),
        }
    }
}

pub fn parse_request(line: &str) -> Result<ExtensionRequest, serde_json::Error> {
    serde_json::from_str(line)
}
