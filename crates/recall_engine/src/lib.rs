//! Recall engine: page access, memory retrieval and the host-facing IO.
mod binding;
mod credentials;
mod dom;
mod fingerprint;
mod page;
mod present;
mod protocol;
mod retrieve;
mod selectors;
mod types;
mod watch;

pub use binding::{ChordParseError, InputBinder, KeyChord};
pub use credentials::{Credential, CredentialStore, FileCredentialStore, StaticCredentialStore};
pub use dom::{DomReader, InputKind, InputTarget, LastMessage};
pub use page::{ComposeState, FilePage, Fragment, MemoryPage, Overlay, Page, PageError, Placement};
pub use present::{
    escape_html, NoticeLevel, PresentError, Presenter, SuggestionContent, BACKDROP_ID, DETAILS_ID,
    SUGGESTION_ID,
};
pub use protocol::{parse_request, ExtensionRequest, ExtensionResponse, Reply};
pub use retrieve::{ReqwestRetriever, RetrieveSettings, Retriever};
pub use selectors::{CompiledSelectors, LocatorChain, SelectorError, SelectorTable};
pub use types::{FailureKind, RetrievalError, RetrievedAnswer, Source, SourceRecord};
pub use watch::{watch_snapshot, SnapshotWatcher, WatchError};
