//! Recall core: pure polling state machine and view-model helpers.
mod detect;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use detect::{should_trigger, ObservedMessage};
pub use effect::{Effect, ReplyOutcome, Severity};
pub use msg::{DetailsCloseReason, ManualOrigin, Msg};
pub use state::{
    Answer, AppState, Epoch, ReplyToken, RequestId, RetrievalFailure, RetrievalOrigin,
    SuggestionId, SuggestionPhase,
};
pub use update::update;
pub use view_model::{
    suggestion_preview, AppViewModel, SuggestionView, PREVIEW_LIMIT, SUGGESTION_PREFIX,
};
