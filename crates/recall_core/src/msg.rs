use crate::{Answer, Epoch, ObservedMessage, ReplyToken, RequestId, RetrievalFailure, SuggestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualOrigin {
    /// Keyboard shortcut on the bound compose input.
    Shortcut,
    /// "Retrieve now" command from another extension context.
    Remote { reply: ReplyToken },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsCloseReason {
    CloseButton,
    Backdrop,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin polling; no-op while already polling.
    Start,
    /// Cancel the poll timer and forget the last-seen message.
    Stop,
    /// Stop followed by Start.
    Restart,
    /// The poll timer for `epoch` fired and the DOM was read.
    PollTick {
        epoch: Epoch,
        observation: Option<ObservedMessage>,
    },
    /// The page address as currently reported by the host.
    UrlObserved(String),
    /// Retrieval requested outside the poll loop.
    ManualRetrieval {
        origin: ManualOrigin,
        observation: Option<ObservedMessage>,
    },
    /// The remote lookup for `request_id` resolved.
    RetrievalFinished {
        request_id: RequestId,
        result: Result<Answer, RetrievalFailure>,
    },
    /// No compose anchor was found for the suggestion.
    SuggestionUnavailable { id: SuggestionId },
    /// User clicked "Use This Reply".
    SuggestionUsed,
    /// User clicked "View Details".
    DetailsRequested,
    DetailsClosed(DetailsCloseReason),
    /// User clicked the dismiss button.
    SuggestionClosed,
    /// The auto-dismiss delay elapsed.
    SuggestionExpired { id: SuggestionId },
    /// The fade step finished.
    SuggestionFadeElapsed { id: SuggestionId },
    /// Outcome of writing the answer into the compose input.
    ComposeWritten { written: bool },
    NoOp,
}
