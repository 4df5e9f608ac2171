use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of a successful retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedAnswer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// One memory the answer drew on. The endpoint sends either bare strings or records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Record(SourceRecord),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

const LABEL_CHARS: usize = 80;

impl Source {
    /// Short human-readable label for the details view.
    pub fn label(&self) -> String {
        let raw = match self {
            Source::Text(text) => Some(text.as_str()),
            Source::Record(record) => record
                .title
                .as_deref()
                .filter(|title| !title.trim().is_empty())
                .or(record.content.as_deref()),
        };
        match raw.map(str::trim).filter(|text| !text.is_empty()) {
            Some(text) if text.chars().count() > LABEL_CHARS => {
                let cut: String = text.chars().take(LABEL_CHARS).collect();
                format!("{cut}...")
            }
            Some(text) => text.to_string(),
            None => "untitled memory".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RetrievalError {
    pub kind: FailureKind,
    pub message: String,
}

impl RetrievalError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A non-success response, described by the status's reason phrase.
    pub fn http_status(code: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("unknown status");
        Self::new(FailureKind::HttpStatus(code), reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Unauthenticated,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unauthenticated => write!(f, "not authenticated"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "HTTP {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RetrievedAnswer, Source, SourceRecord};

    #[test]
    fn sources_accept_strings_and_records() {
        let body = r#"{"answer":"ok","sources":["plain",{"title":"Standup","score":0.9},{"content":"body only"}]}"#;
        let parsed: RetrievedAnswer = serde_json::from_str(body).unwrap();
        let labels: Vec<_> = parsed.sources.iter().map(Source::label).collect();
        assert_eq!(labels, vec!["plain", "Standup", "body only"]);
    }

    #[test]
    fn missing_sources_default_to_empty() {
        let parsed: RetrievedAnswer = serde_json::from_str(r#"{"answer":"ok"}"#).unwrap();
        assert!(parsed.sources.is_empty());
    }

    #[test]
    fn empty_record_gets_a_placeholder_label() {
        assert_eq!(Source::Record(SourceRecord::default()).label(), "untitled memory");
    }
}
