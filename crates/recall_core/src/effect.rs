use crate::{Epoch, ReplyToken, RequestId, SuggestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Ok,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace any running poll timer with one tagged `epoch`.
    StartPolling { epoch: Epoch },
    StopPolling,
    Retrieve { request_id: RequestId, query: String },
    Notify { severity: Severity, text: String },
    PresentSuggestion { view: crate::SuggestionView },
    FadeSuggestion { id: SuggestionId },
    DismissSuggestion { id: SuggestionId },
    /// Write the full answer into the compose input.
    WriteCompose { text: String },
    OpenDetails { answer: String, sources: Vec<String> },
    CloseDetails,
    Reply { token: ReplyToken, outcome: ReplyOutcome },
}
