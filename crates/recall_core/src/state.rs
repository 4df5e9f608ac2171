use std::collections::BTreeMap;

use crate::view_model::{AppViewModel, SuggestionView};

pub type Epoch = u64;
pub type RequestId = u64;
pub type SuggestionId = u64;
pub type ReplyToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Stopped,
    Polling {
        epoch: Epoch,
    },
}

/// Who asked for a retrieval. Only automatic ones are tied to a poll epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalOrigin {
    Auto { epoch: Epoch },
    Shortcut,
    Remote { reply: ReplyToken },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// Display labels of the memories the answer was built from.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalFailure {
    Unauthenticated,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionPhase {
    Visible,
    Fading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingRetrieval {
    pub(crate) origin: RetrievalOrigin,
    pub(crate) query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LiveSuggestion {
    pub(crate) id: SuggestionId,
    pub(crate) answer: Answer,
    pub(crate) phase: SuggestionPhase,
}

/// The single retrieval state of one page context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    poll: PollState,
    last_epoch: Epoch,
    last_seen: Option<String>,
    current_url: Option<String>,
    next_request_id: RequestId,
    pending: BTreeMap<RequestId, PendingRetrieval>,
    suggestion: Option<LiveSuggestion>,
    next_suggestion_id: SuggestionId,
    details_open: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            polling: self.is_polling(),
            epoch: self.polling_epoch(),
            last_seen: self.last_seen.clone(),
            current_url: self.current_url.clone(),
            in_flight: self.pending.len(),
            auto_in_flight: self.auto_in_flight(),
            suggestion: self.suggestion.as_ref().map(|live| {
                SuggestionView::new(live.id, &live.answer, live.phase)
            }),
            details_open: self.details_open,
            dirty: self.dirty,
        }
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.poll, PollState::Polling { .. })
    }

    pub fn polling_epoch(&self) -> Option<Epoch> {
        match self.poll {
            PollState::Polling { epoch } => Some(epoch),
            PollState::Stopped => None,
        }
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_polling(&mut self) -> Epoch {
        self.last_epoch += 1;
        let epoch = self.last_epoch;
        self.poll = PollState::Polling { epoch };
        self.mark_dirty();
        epoch
    }

    /// Stops polling and resets the last-seen text. Returns whether a timer was live.
    pub(crate) fn end_polling(&mut self) -> bool {
        let was_polling = self.is_polling();
        self.poll = PollState::Stopped;
        self.last_seen = None;
        // Results of automatic requests from the old epoch must not land.
        self.pending
            .retain(|_, pending| !matches!(pending.origin, RetrievalOrigin::Auto { .. }));
        self.mark_dirty();
        was_polling
    }

    pub(crate) fn set_last_seen(&mut self, text: String) {
        self.last_seen = Some(text);
        self.mark_dirty();
    }

    pub(crate) fn set_current_url(&mut self, url: String) {
        self.current_url = Some(url);
        self.mark_dirty();
    }

    pub(crate) fn auto_in_flight(&self) -> bool {
        self.pending
            .values()
            .any(|pending| matches!(pending.origin, RetrievalOrigin::Auto { .. }))
    }

    pub(crate) fn register_request(&mut self, origin: RetrievalOrigin, query: String) -> RequestId {
        self.next_request_id += 1;
        let id = self.next_request_id;
        self.pending.insert(id, PendingRetrieval { origin, query });
        self.mark_dirty();
        id
    }

    pub(crate) fn take_request(&mut self, id: RequestId) -> Option<PendingRetrieval> {
        let pending = self.pending.remove(&id);
        if pending.is_some() {
            self.mark_dirty();
        }
        pending
    }

    pub(crate) fn suggestion(&self) -> Option<&LiveSuggestion> {
        self.suggestion.as_ref()
    }

    /// Installs a new suggestion, handing back the one it replaces.
    pub(crate) fn replace_suggestion(&mut self, answer: Answer) -> (SuggestionId, Option<SuggestionId>) {
        self.next_suggestion_id += 1;
        let id = self.next_suggestion_id;
        let previous = self.suggestion.replace(LiveSuggestion {
            id,
            answer,
            phase: SuggestionPhase::Visible,
        });
        self.mark_dirty();
        (id, previous.map(|live| live.id))
    }

    pub(crate) fn clear_suggestion(&mut self) -> Option<LiveSuggestion> {
        let removed = self.suggestion.take();
        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn fade_suggestion(&mut self, id: SuggestionId) -> bool {
        match self.suggestion.as_mut() {
            Some(live) if live.id == id && live.phase == SuggestionPhase::Visible => {
                live.phase = SuggestionPhase::Fading;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn details_open(&self) -> bool {
        self.details_open
    }

    pub(crate) fn set_details_open(&mut self, open: bool) {
        if self.details_open != open {
            self.details_open = open;
            self.mark_dirty();
        }
    }
}
