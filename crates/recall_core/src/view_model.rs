use crate::{Answer, Epoch, SuggestionId, SuggestionPhase};

pub const SUGGESTION_PREFIX: &str = "Based on our conversation history: ";
/// Preview length in characters before the ellipsis is appended.
pub const PREVIEW_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub polling: bool,
    pub epoch: Option<Epoch>,
    pub last_seen: Option<String>,
    pub current_url: Option<String>,
    pub in_flight: usize,
    pub auto_in_flight: bool,
    pub suggestion: Option<SuggestionView>,
    pub details_open: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionView {
    pub id: SuggestionId,
    pub preview: String,
    pub answer: String,
    pub sources: Vec<String>,
    pub phase: SuggestionPhase,
}

impl SuggestionView {
    pub fn new(id: SuggestionId, answer: &Answer, phase: SuggestionPhase) -> Self {
        Self {
            id,
            preview: suggestion_preview(&answer.text),
            answer: answer.text.clone(),
            sources: answer.sources.clone(),
            phase,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

/// Prefixes the answer and cuts it to [`PREVIEW_LIMIT`] characters.
pub fn suggestion_preview(answer: &str) -> String {
    let full = format!("{SUGGESTION_PREFIX}{answer}");
    if full.chars().count() <= PREVIEW_LIMIT {
        return full;
    }
    let cut: String = full.chars().take(PREVIEW_LIMIT).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::{suggestion_preview, PREVIEW_LIMIT, SUGGESTION_PREFIX};

    #[test]
    fn short_answers_are_kept_whole() {
        assert_eq!(
            suggestion_preview("see you at 3"),
            "Based on our conversation history: see you at 3"
        );
    }

    #[test]
    fn long_answers_are_cut_on_char_boundaries() {
        let answer = "é".repeat(300);
        let preview = suggestion_preview(&answer);
        assert!(preview.starts_with(SUGGESTION_PREFIX));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_LIMIT + 3);
    }
}
