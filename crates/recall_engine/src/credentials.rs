use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use recall_logging::{recall_debug, recall_warn};
use serde::Deserialize;

/// Snapshot of the signed-in state, read once per retrieval attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credential {
    pub token: String,
    pub is_valid: bool,
}

impl Credential {
    pub fn valid(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            is_valid: true,
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }
}

pub trait CredentialStore: Send + Sync {
    fn current(&self) -> Credential;
}

/// Always hands out the same credential.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    credential: Credential,
}

impl StaticCredentialStore {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

impl CredentialStore for StaticCredentialStore {
    fn current(&self) -> Credential {
        self.credential.clone()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAuth {
    id_token: Option<String>,
    /// Milliseconds since the Unix epoch.
    expires_at: Option<i64>,
}

/// Reads `{ "idToken": "...", "expiresAt": <ms> }` from disk on every call.
pub struct FileCredentialStore {
    path: PathBuf,
    now_ms: Arc<dyn Fn() -> i64 + Send + Sync>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(|| chrono::Utc::now().timestamp_millis()))
    }

    pub fn with_clock(path: impl Into<PathBuf>, now_ms: Arc<dyn Fn() -> i64 + Send + Sync>) -> Self {
        Self {
            path: path.into(),
            now_ms,
        }
    }

    fn read(&self) -> Option<StoredAuth> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                recall_debug!("No stored credentials at {:?}", self.path);
                return None;
            }
            Err(err) => {
                recall_warn!("Auth error: failed to read {:?}: {}", self.path, err);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(stored) => Some(stored),
            Err(err) => {
                recall_warn!("Auth error: failed to parse {:?}: {}", self.path, err);
                None
            }
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn current(&self) -> Credential {
        let Some(stored) = self.read() else {
            return Credential::missing();
        };
        match (stored.id_token, stored.expires_at) {
            (Some(token), Some(expires_at))
                if !token.is_empty() && (self.now_ms)() < expires_at =>
            {
                Credential::valid(token)
            }
            _ => Credential::missing(),
        }
    }
}
