use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use recall_core::{
    Answer, Effect, Epoch, Msg, ReplyOutcome, ReplyToken, RetrievalFailure, Severity,
    SuggestionView,
};
use recall_engine::{
    DomReader, ExtensionResponse, FailureKind, NoticeLevel, Page, Presenter, RetrievalError,
    RetrievedAnswer, Retriever, Source, SuggestionContent,
};
use recall_logging::{recall_debug, recall_error, recall_info, recall_warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::config::Timings;
use super::runtime::RuntimeEvent;

/// Executes effects against the page and the retrieval endpoint.
///
/// Anything that completes later (timers, lookups) posts a [`RuntimeEvent`]
/// back; anything that completes on the spot is returned as a follow-up message.
pub struct EffectRunner {
    page: Arc<dyn Page>,
    reader: Arc<DomReader>,
    presenter: Presenter,
    retriever: Arc<dyn Retriever>,
    timings: Timings,
    events: mpsc::UnboundedSender<RuntimeEvent>,
    poll_timer: Option<CancellationToken>,
    replies: HashMap<ReplyToken, oneshot::Sender<ExtensionResponse>>,
    next_reply: ReplyToken,
}

impl EffectRunner {
    pub fn new(
        page: Arc<dyn Page>,
        reader: Arc<DomReader>,
        retriever: Arc<dyn Retriever>,
        timings: Timings,
        events: mpsc::UnboundedSender<RuntimeEvent>,
    ) -> Self {
        Self {
            presenter: Presenter::new(reader.clone()),
            page,
            reader,
            retriever,
            timings,
            events,
            poll_timer: None,
            replies: HashMap::new(),
            next_reply: 0,
        }
    }

    /// Parks a deferred reply until the core resolves `token`.
    pub fn register_reply(&mut self, respond: oneshot::Sender<ExtensionResponse>) -> ReplyToken {
        self.next_reply += 1;
        self.replies.insert(self.next_reply, respond);
        self.next_reply
    }

    #[cfg(test)]
    pub fn poll_timer_active(&self) -> bool {
        self.poll_timer.is_some()
    }

    pub fn run(&mut self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut follow_ups = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartPolling { epoch } => self.start_polling(epoch),
                Effect::StopPolling => self.stop_polling(),
                Effect::Retrieve { request_id, query } => {
                    recall_debug!("Retrieve request_id={} query_len={}", request_id, query.len());
                    let retriever = self.retriever.clone();
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        let result = retriever.retrieve(&query).await.map(map_answer);
                        let result = result.map_err(map_failure);
                        let _ = events.send(RuntimeEvent::Msg(Msg::RetrievalFinished {
                            request_id,
                            result,
                        }));
                    });
                }
                Effect::Notify { severity, text } => self.notify(severity, &text),
                Effect::PresentSuggestion { view } => {
                    if let Some(msg) = self.present(&view) {
                        follow_ups.push(msg);
                    }
                }
                Effect::FadeSuggestion { id } => {
                    self.presenter.fade(self.page.as_ref());
                    self.post_after(
                        self.timings.suggestion_fade,
                        RuntimeEvent::Msg(Msg::SuggestionFadeElapsed { id }),
                    );
                }
                Effect::DismissSuggestion { id } => {
                    if self.presenter.dismiss(self.page.as_ref()) {
                        recall_debug!("Suggestion {} dismissed", id);
                    }
                }
                Effect::WriteCompose { text } => {
                    let written = self.write_compose(&text);
                    follow_ups.push(Msg::ComposeWritten { written });
                }
                Effect::OpenDetails { answer, sources } => {
                    self.presenter
                        .open_details(self.page.as_ref(), &answer, &sources);
                }
                Effect::CloseDetails => self.presenter.close_details(self.page.as_ref()),
                Effect::Reply { token, outcome } => self.reply(token, outcome),
            }
        }
        follow_ups
    }

    /// Cancels the poll timer and drops pending replies.
    pub fn shutdown(&mut self) {
        self.stop_polling();
        for (_, respond) in self.replies.drain() {
            let _ = respond.send(ExtensionResponse::failure("content script stopped"));
        }
    }

    fn start_polling(&mut self, epoch: Epoch) {
        self.stop_polling();
        let token = CancellationToken::new();
        let period = self.timings.poll_interval;
        let events = self.events.clone();
        let cancelled = token.clone();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticks.tick() => {
                        if events.send(RuntimeEvent::PollDue { epoch }).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        recall_info!("Started polling, epoch {}", epoch);
        self.poll_timer = Some(token);
    }

    fn stop_polling(&mut self) {
        if let Some(token) = self.poll_timer.take() {
            token.cancel();
            recall_info!("Stopped polling");
        }
    }

    fn notify(&self, severity: Severity, text: &str) {
        let level = match severity {
            Severity::Info => {
                recall_info!("{}", text);
                NoticeLevel::Info
            }
            Severity::Success => {
                recall_info!("{}", text);
                NoticeLevel::Success
            }
            Severity::Warning => {
                recall_warn!("{}", text);
                NoticeLevel::Warning
            }
            Severity::Error => {
                recall_error!("{}", text);
                NoticeLevel::Error
            }
        };
        let id = self.presenter.show_notice(self.page.as_ref(), level, text);
        self.post_after(
            self.timings.notification_ttl,
            RuntimeEvent::NoticeExpired { id },
        );
    }

    fn present(&self, view: &SuggestionView) -> Option<Msg> {
        let content = SuggestionContent {
            preview: &view.preview,
            source_count: view.source_count(),
        };
        match self.presenter.present(self.page.as_ref(), content) {
            Ok(()) => {
                recall_info!("Suggested reply {} shown", view.id);
                self.post_after(
                    self.timings.suggestion_ttl,
                    RuntimeEvent::Msg(Msg::SuggestionExpired { id: view.id }),
                );
                None
            }
            Err(err) => {
                recall_warn!("Could not show suggestion {}: {}", view.id, err);
                Some(Msg::SuggestionUnavailable { id: view.id })
            }
        }
    }

    fn write_compose(&self, text: &str) -> bool {
        let html = match self.page.html() {
            Ok(html) => html,
            Err(err) => {
                recall_warn!("Cannot read page to insert reply: {}", err);
                return false;
            }
        };
        let Some(target) = self.reader.find_text_input(&html) else {
            recall_warn!("No compose input found for the suggested reply");
            return false;
        };
        match self.page.set_editable_content(&target, text) {
            Ok(()) => true,
            Err(err) => {
                recall_warn!("Failed to write reply into {}: {}", target.selector, err);
                false
            }
        }
    }

    fn reply(&mut self, token: ReplyToken, outcome: ReplyOutcome) {
        let Some(respond) = self.replies.remove(&token) else {
            recall_debug!("Reply {} has no waiting caller", token);
            return;
        };
        let response = match outcome {
            ReplyOutcome::Ok => ExtensionResponse::success(),
            ReplyOutcome::Failed(reason) => ExtensionResponse::failure(reason),
        };
        let _ = respond.send(response);
    }

    fn post_after(&self, delay: Duration, event: RuntimeEvent) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(event);
        });
    }
}

fn map_answer(answer: RetrievedAnswer) -> Answer {
    Answer {
        text: answer.answer,
        sources: answer.sources.iter().map(Source::label).collect(),
    }
}

fn map_failure(err: RetrievalError) -> RetrievalFailure {
    match err.kind {
        FailureKind::Unauthenticated => RetrievalFailure::Unauthenticated,
        _ => RetrievalFailure::Failed(err.to_string()),
    }
}
