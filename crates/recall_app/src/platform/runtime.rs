//! The event loop that owns [`AppState`].
//!
//! Every input (timer ticks, navigation checks, key presses, protocol requests,
//! spawned lookups finishing) arrives as a [`RuntimeEvent`] on one channel and
//! is handled to completion before the next one is taken.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use recall_core::{update, AppState, DetailsCloseReason, Epoch, ManualOrigin, Msg, ObservedMessage};
use recall_engine::{
    DomReader, ExtensionRequest, ExtensionResponse, InputBinder, KeyChord, Page, Reply, Retriever,
};
use recall_logging::{recall_debug, recall_info, recall_warn, set_poll_tick};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::config::Timings;
use super::effects::EffectRunner;

#[derive(Debug)]
pub enum RuntimeEvent {
    Msg(Msg),
    PollDue { epoch: Epoch },
    CheckNavigation,
    DomMutated,
    Key(KeyChord),
    /// Close button: closes the details view when open, else the suggestion.
    CloseClicked,
    RetrieveNow {
        respond: oneshot::Sender<ExtensionResponse>,
    },
    NoticeExpired { id: String },
    Shutdown,
}

/// Cheap, cloneable way to talk to a running [`Runtime`].
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    events: mpsc::UnboundedSender<RuntimeEvent>,
}

impl RuntimeHandle {
    /// Answers a liveness probe on the spot; a retrieve command replies later.
    pub fn request(&self, request: ExtensionRequest) -> Reply {
        match request {
            ExtensionRequest::Ping => {
                Reply::Immediate(ExtensionResponse::alive(Utc::now().timestamp_millis()))
            }
            ExtensionRequest::RetrieveMemoriesForContext => {
                let (respond, rx) = oneshot::channel();
                if self.events.send(RuntimeEvent::RetrieveNow { respond }).is_err() {
                    return Reply::Immediate(ExtensionResponse::failure("content script stopped"));
                }
                Reply::Deferred(rx)
            }
        }
    }

    pub fn key(&self, chord: KeyChord) {
        self.send(RuntimeEvent::Key(chord));
    }

    pub fn use_suggestion(&self) {
        self.send(RuntimeEvent::Msg(Msg::SuggestionUsed));
    }

    pub fn view_details(&self) {
        self.send(RuntimeEvent::Msg(Msg::DetailsRequested));
    }

    pub fn close(&self) {
        self.send(RuntimeEvent::CloseClicked);
    }

    pub fn close_details(&self, reason: DetailsCloseReason) {
        self.send(RuntimeEvent::Msg(Msg::DetailsClosed(reason)));
    }

    pub fn dom_mutated(&self) {
        self.send(RuntimeEvent::DomMutated);
    }

    pub fn shutdown(&self) {
        self.send(RuntimeEvent::Shutdown);
    }

    pub(crate) fn send(&self, event: RuntimeEvent) {
        if self.events.send(event).is_err() {
            recall_debug!("Runtime already stopped; event dropped");
        }
    }
}

pub struct Runtime {
    state: AppState,
    page: Arc<dyn Page>,
    reader: Arc<DomReader>,
    binder: InputBinder,
    effects: EffectRunner,
    timings: Timings,
    events: mpsc::UnboundedReceiver<RuntimeEvent>,
    handle: RuntimeHandle,
    poll_ticks: u64,
}

impl Runtime {
    pub fn new(
        page: Arc<dyn Page>,
        reader: Arc<DomReader>,
        retriever: Arc<dyn Retriever>,
        timings: Timings,
    ) -> (Self, RuntimeHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RuntimeHandle { events: tx.clone() };
        let effects = EffectRunner::new(page.clone(), reader.clone(), retriever, timings, tx);
        let runtime = Self {
            state: AppState::new(),
            page,
            reader,
            binder: InputBinder::new(),
            effects,
            timings,
            events: rx,
            handle: handle.clone(),
            poll_ticks: 0,
        };
        (runtime, handle)
    }

    /// Runs until [`RuntimeHandle::shutdown`] is called.
    pub async fn run(mut self) {
        self.initialize();
        let navigation = self.spawn_navigation_check();

        while let Some(event) = self.events.recv().await {
            if matches!(event, RuntimeEvent::Shutdown) {
                break;
            }
            self.handle_event(event);
        }

        navigation.cancel();
        self.effects.shutdown();
        recall_info!("Runtime stopped after {} poll ticks", self.poll_ticks);
    }

    fn initialize(&mut self) {
        recall_info!("Recall content script initializing on {}", self.page.url());
        self.dispatch(Msg::UrlObserved(self.page.url()));
        self.bind_input();
        self.dispatch(Msg::Start);
    }

    fn spawn_navigation_check(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let handle = self.handle.clone();
        let period = self.timings.navigation_interval;
        tokio::spawn(async move {
            let mut checks = interval_at(Instant::now() + period, period);
            checks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = checks.tick() => handle.send(RuntimeEvent::CheckNavigation),
                }
            }
        });
        token
    }

    fn handle_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Msg(msg) => self.dispatch(msg),
            RuntimeEvent::PollDue { epoch } => {
                // Skip the DOM read for ticks of a cancelled timer.
                if self.state.polling_epoch() != Some(epoch) {
                    recall_debug!("Discarding tick of stale epoch {}", epoch);
                    return;
                }
                self.poll_ticks += 1;
                set_poll_tick(self.poll_ticks);
                let observation = self.observe();
                self.dispatch(Msg::PollTick { epoch, observation });
            }
            RuntimeEvent::CheckNavigation => {
                let url = self.page.url();
                let changed = self.state.current_url().is_some_and(|current| current != url);
                if changed {
                    recall_info!("URL changed to {}, restarting", url);
                }
                self.dispatch(Msg::UrlObserved(url));
                if changed {
                    self.bind_input();
                }
            }
            RuntimeEvent::DomMutated => self.bind_input(),
            RuntimeEvent::Key(chord) => {
                if !chord.is_manual_retrieval() {
                    return;
                }
                if self.binder.current().is_none() {
                    recall_debug!("Shortcut {} ignored: no bound input", chord);
                    return;
                }
                recall_info!("Shortcut {} pressed, retrieving memories", chord);
                let observation = self.observe();
                self.dispatch(Msg::ManualRetrieval {
                    origin: ManualOrigin::Shortcut,
                    observation,
                });
            }
            RuntimeEvent::CloseClicked => {
                let msg = if self.state.view().details_open {
                    Msg::DetailsClosed(DetailsCloseReason::CloseButton)
                } else {
                    Msg::SuggestionClosed
                };
                self.dispatch(msg);
            }
            RuntimeEvent::RetrieveNow { respond } => {
                let reply = self.effects.register_reply(respond);
                let observation = self.observe();
                self.dispatch(Msg::ManualRetrieval {
                    origin: ManualOrigin::Remote { reply },
                    observation,
                });
            }
            RuntimeEvent::NoticeExpired { id } => {
                self.page.remove(&id);
            }
            RuntimeEvent::Shutdown => {}
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            if state.consume_dirty() {
                recall_debug!("State now {:?}", state.view());
            }
            self.state = state;
            queue.extend(self.effects.run(effects));
        }
    }

    /// Reads the last visible message, if any.
    fn observe(&self) -> Option<ObservedMessage> {
        let html = match self.page.html() {
            Ok(html) => html,
            Err(err) => {
                recall_warn!("Page unavailable: {}", err);
                return None;
            }
        };
        let message = self.reader.read_last_message(&html)?;
        ObservedMessage::new(
            &message.text,
            message.from_self,
            Utc::now().timestamp_millis(),
        )
    }

    fn bind_input(&mut self) {
        let html = match self.page.html() {
            Ok(html) => html,
            Err(err) => {
                recall_warn!("Page unavailable: {}", err);
                return;
            }
        };
        match self.reader.find_text_input(&html) {
            Some(target) => {
                let selector = target.selector.clone();
                if self.binder.bind(target) {
                    recall_info!("Keyboard shortcut bound to {}", selector);
                }
            }
            None => recall_debug!("No text input found to bind"),
        }
    }
}
