/// One read of the last visible chat message.
///
/// Produced fresh on every DOM read and never mutated. Two observations with the
/// same text are indistinguishable, even when they came from different bubbles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMessage {
    pub text: String,
    pub is_from_self: bool,
    pub observed_at_ms: i64,
}

impl ObservedMessage {
    /// Builds an observation from raw text, or `None` when the trimmed text is empty.
    pub fn new(text: &str, is_from_self: bool, observed_at_ms: i64) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            is_from_self,
            observed_at_ms,
        })
    }
}

/// Decides whether an observation warrants a retrieval.
///
/// "No observation" is never a change, and the user's own messages never fire.
pub fn should_trigger(previous: Option<&str>, current: Option<&ObservedMessage>) -> bool {
    match current {
        None => false,
        Some(message) if message.is_from_self => false,
        Some(message) => previous != Some(message.text.as_str()),
    }
}
