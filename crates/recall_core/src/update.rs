use crate::{
    should_trigger, Answer, AppState, Effect, ManualOrigin, Msg, ReplyOutcome, RequestId,
    RetrievalFailure, RetrievalOrigin, Severity, SuggestionView,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Start => start(&mut state),
        Msg::Stop => stop(&mut state),
        Msg::Restart => restart(&mut state),
        Msg::PollTick { epoch, observation } => {
            // A tick queued before the last stop/restart belongs to a dead timer.
            if state.polling_epoch() != Some(epoch) {
                return (state, Vec::new());
            }
            // Ticks keep firing while a lookup is suspended; one at a time.
            if state.auto_in_flight() {
                return (state, Vec::new());
            }
            match observation {
                Some(message) if should_trigger(state.last_seen(), Some(&message)) => {
                    dispatch(&mut state, RetrievalOrigin::Auto { epoch }, message.text)
                }
                _ => Vec::new(),
            }
        }
        Msg::UrlObserved(url) => match state.current_url() {
            None => {
                state.set_current_url(url);
                Vec::new()
            }
            Some(current) if current == url => Vec::new(),
            Some(_) => {
                state.set_current_url(url);
                restart(&mut state)
            }
        },
        Msg::ManualRetrieval {
            origin,
            observation,
        } => {
            let origin = match origin {
                ManualOrigin::Shortcut => RetrievalOrigin::Shortcut,
                ManualOrigin::Remote { reply } => RetrievalOrigin::Remote { reply },
            };
            match observation {
                Some(message) => dispatch(&mut state, origin, message.text),
                None => {
                    let mut effects = vec![notify(
                        Severity::Warning,
                        "No last message for memory retrieval",
                    )];
                    if let RetrievalOrigin::Remote { reply } = origin {
                        effects.push(Effect::Reply {
                            token: reply,
                            outcome: ReplyOutcome::Failed("no last message".to_string()),
                        });
                    }
                    effects
                }
            }
        }
        Msg::RetrievalFinished { request_id, result } => finish(&mut state, request_id, result),
        Msg::SuggestionUnavailable { id } => {
            if state.suggestion().is_some_and(|live| live.id == id) {
                state.clear_suggestion();
                vec![notify(Severity::Warning, "Could not create suggested reply")]
            } else {
                Vec::new()
            }
        }
        Msg::SuggestionUsed => match state.clear_suggestion() {
            Some(live) => vec![
                Effect::WriteCompose {
                    text: live.answer.text,
                },
                Effect::DismissSuggestion { id: live.id },
            ],
            None => Vec::new(),
        },
        Msg::ComposeWritten { written } => {
            if written {
                vec![notify(Severity::Success, "Contextual reply added")]
            } else {
                Vec::new()
            }
        }
        Msg::DetailsRequested => {
            let opened = match state.suggestion() {
                Some(live) if !state.details_open() => Some(Effect::OpenDetails {
                    answer: live.answer.text.clone(),
                    sources: live.answer.sources.clone(),
                }),
                _ => None,
            };
            match opened {
                Some(effect) => {
                    state.set_details_open(true);
                    vec![effect]
                }
                None => Vec::new(),
            }
        }
        Msg::DetailsClosed(_reason) => {
            if state.details_open() {
                state.set_details_open(false);
                vec![Effect::CloseDetails]
            } else {
                Vec::new()
            }
        }
        Msg::SuggestionClosed => match state.clear_suggestion() {
            Some(live) => vec![Effect::DismissSuggestion { id: live.id }],
            None => Vec::new(),
        },
        Msg::SuggestionExpired { id } => {
            if state.fade_suggestion(id) {
                vec![Effect::FadeSuggestion { id }]
            } else {
                Vec::new()
            }
        }
        Msg::SuggestionFadeElapsed { id } => {
            if state.suggestion().is_some_and(|live| live.id == id) {
                state.clear_suggestion();
                vec![Effect::DismissSuggestion { id }]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start(state: &mut AppState) -> Vec<Effect> {
    if state.is_polling() {
        return Vec::new();
    }
    let epoch = state.begin_polling();
    vec![Effect::StartPolling { epoch }]
}

fn stop(state: &mut AppState) -> Vec<Effect> {
    if state.end_polling() {
        vec![Effect::StopPolling]
    } else {
        Vec::new()
    }
}

fn restart(state: &mut AppState) -> Vec<Effect> {
    let mut effects = stop(state);
    effects.extend(start(state));
    effects
}

fn dispatch(state: &mut AppState, origin: RetrievalOrigin, query: String) -> Vec<Effect> {
    let request_id = state.register_request(origin, query.clone());
    vec![
        notify(Severity::Info, "Retrieving memories..."),
        Effect::Retrieve { request_id, query },
    ]
}

fn finish(
    state: &mut AppState,
    request_id: RequestId,
    result: Result<Answer, RetrievalFailure>,
) -> Vec<Effect> {
    let Some(pending) = state.take_request(request_id) else {
        return Vec::new();
    };

    if let RetrievalOrigin::Auto { epoch } = pending.origin {
        if state.polling_epoch() != Some(epoch) {
            return Vec::new();
        }
        // Recorded on failure too, so an unchanged message is not retried.
        state.set_last_seen(pending.query);
    }

    let mut effects = Vec::new();
    let outcome = match result {
        Ok(answer) => {
            effects.push(notify(Severity::Success, "Retrieved answers"));
            effects.extend(present(state, answer));
            ReplyOutcome::Ok
        }
        Err(RetrievalFailure::Unauthenticated) => {
            effects.push(notify(Severity::Error, "Please sign in first"));
            ReplyOutcome::Failed("Not authenticated".to_string())
        }
        Err(RetrievalFailure::Failed(reason)) => {
            effects.push(notify(Severity::Error, format!("Error: {reason}")));
            ReplyOutcome::Failed(reason)
        }
    };

    if let RetrievalOrigin::Remote { reply } = pending.origin {
        effects.push(Effect::Reply {
            token: reply,
            outcome,
        });
    }
    effects
}

fn present(state: &mut AppState, answer: Answer) -> Vec<Effect> {
    let (_id, previous) = state.replace_suggestion(answer);
    let mut effects = Vec::with_capacity(3);
    // The modal describes the previous answer.
    if state.details_open() {
        state.set_details_open(false);
        effects.push(Effect::CloseDetails);
    }
    if let Some(previous) = previous {
        effects.push(Effect::DismissSuggestion { id: previous });
    }
    if let Some(live) = state.suggestion() {
        effects.push(Effect::PresentSuggestion {
            view: SuggestionView::new(live.id, &live.answer, live.phase),
        });
    }
    effects
}

fn notify(severity: Severity, text: impl Into<String>) -> Effect {
    Effect::Notify {
        severity,
        text: text.into(),
    }
}
