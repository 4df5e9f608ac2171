use std::sync::Once;

use pretty_assertions::assert_eq;
use recall_core::{
    update, Answer, AppState, Effect, Epoch, ObservedMessage, Msg, RequestId, RetrievalFailure,
    Severity,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(recall_logging::initialize_for_tests);
}

fn incoming(text: &str) -> Option<ObservedMessage> {
    ObservedMessage::new(text, false, 1_700_000_000_000)
}

fn started() -> (AppState, Epoch) {
    let (state, effects) = update(AppState::new(), Msg::Start);
    let epoch = match effects.as_slice() {
        [Effect::StartPolling { epoch }] => *epoch,
        other => panic!("unexpected start effects: {other:?}"),
    };
    (state, epoch)
}

fn tick(state: AppState, epoch: Epoch, observation: Option<ObservedMessage>) -> (AppState, Vec<Effect>) {
    update(state, Msg::PollTick { epoch, observation })
}

fn retrieve_ids(effects: &[Effect]) -> Vec<RequestId> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Retrieve { request_id, .. } => Some(*request_id),
            _ => None,
        })
        .collect()
}

fn answer(text: &str) -> Answer {
    Answer {
        text: text.to_string(),
        sources: vec!["standup notes".to_string()],
    }
}

fn finish(state: AppState, request_id: RequestId, result: Result<Answer, RetrievalFailure>) -> (AppState, Vec<Effect>) {
    update(state, Msg::RetrievalFinished { request_id, result })
}

#[test]
fn start_is_idempotent() {
    init_logging();
    let (state, epoch) = started();
    assert_eq!(state.polling_epoch(), Some(epoch));

    let (state, effects) = update(state, Msg::Start);
    assert!(effects.is_empty());
    assert_eq!(state.polling_epoch(), Some(epoch));
}

#[test]
fn first_incoming_message_triggers_once() {
    init_logging();
    let (state, epoch) = started();

    let (state, effects) = tick(state, epoch, incoming("  Hello "));
    assert_eq!(
        effects,
        vec![
            Effect::Notify {
                severity: Severity::Info,
                text: "Retrieving memories...".to_string(),
            },
            Effect::Retrieve {
                request_id: 1,
                query: "Hello".to_string(),
            },
        ]
    );
    assert!(state.view().auto_in_flight);
}

#[test]
fn unchanged_then_edited_message_triggers_on_first_and_third_read() {
    init_logging();
    let (state, epoch) = started();

    let (state, first) = tick(state, epoch, incoming("Hello"));
    let ids = retrieve_ids(&first);
    assert_eq!(ids.len(), 1);
    let (state, _) = finish(state, ids[0], Ok(answer("Hi!")));
    assert_eq!(state.last_seen(), Some("Hello"));

    let (state, second) = tick(state, epoch, incoming("Hello"));
    assert!(retrieve_ids(&second).is_empty());

    let (state, third) = tick(state, epoch, incoming("Hello there"));
    assert_eq!(retrieve_ids(&third).len(), 1);
    assert_eq!(state.view().in_flight, 1);
}

#[test]
fn own_messages_are_ignored() {
    init_logging();
    let (state, epoch) = started();
    let own = ObservedMessage::new("on my way", true, 0);

    let (state, effects) = tick(state, epoch, own);
    assert!(effects.is_empty());
    assert_eq!(state.last_seen(), None);
}

#[test]
fn missing_observation_issues_no_retrieval() {
    init_logging();
    let (state, epoch) = started();

    let (state, effects) = tick(state, epoch, None);
    assert!(effects.is_empty());
    let (_state, effects) = tick(state, epoch, None);
    assert!(effects.is_empty());
}

#[test]
fn tick_after_stop_is_discarded() {
    init_logging();
    let (state, epoch) = started();
    let (state, effects) = update(state, Msg::Stop);
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert!(!state.is_polling());

    let (state, effects) = tick(state, epoch, incoming("Hello"));
    assert!(effects.is_empty());
    assert_eq!(state.view().in_flight, 0);
}

#[test]
fn stop_while_stopped_emits_nothing() {
    init_logging();
    let (_state, effects) = update(AppState::new(), Msg::Stop);
    assert!(effects.is_empty());
}

#[test]
fn restart_clears_last_seen_so_the_same_message_triggers_again() {
    init_logging();
    let (state, epoch) = started();
    let (state, effects) = tick(state, epoch, incoming("Hello"));
    let (state, _) = finish(state, retrieve_ids(&effects)[0], Ok(answer("Hi")));
    assert_eq!(state.last_seen(), Some("Hello"));

    let (state, effects) = update(state, Msg::Restart);
    let new_epoch = match effects.as_slice() {
        [Effect::StopPolling, Effect::StartPolling { epoch }] => *epoch,
        other => panic!("unexpected restart effects: {other:?}"),
    };
    assert_ne!(new_epoch, epoch);
    assert_eq!(state.last_seen(), None);

    let (_state, effects) = tick(state, new_epoch, incoming("Hello"));
    assert_eq!(retrieve_ids(&effects).len(), 1);
}

#[test]
fn overlapping_ticks_are_skipped_while_a_lookup_is_in_flight() {
    init_logging();
    let (state, epoch) = started();
    let (state, effects) = tick(state, epoch, incoming("Hello"));
    let first = retrieve_ids(&effects)[0];

    let (state, effects) = tick(state, epoch, incoming("Something else"));
    assert!(effects.is_empty());

    let (state, _) = finish(state, first, Ok(answer("Hi")));
    let (_state, effects) = tick(state, epoch, incoming("Something else"));
    assert_eq!(retrieve_ids(&effects).len(), 1);
}

#[test]
fn network_failure_notifies_and_still_records_the_message() {
    init_logging();
    let (state, epoch) = started();
    let (state, effects) = tick(state, epoch, incoming("Hello"));
    let id = retrieve_ids(&effects)[0];

    let (state, effects) = finish(
        state,
        id,
        Err(RetrievalFailure::Failed("network error".to_string())),
    );
    assert_eq!(
        effects,
        vec![Effect::Notify {
            severity: Severity::Error,
            text: "Error: network error".to_string(),
        }]
    );
    assert!(state.is_polling());
    assert_eq!(state.last_seen(), Some("Hello"));

    let (_state, effects) = tick(state, epoch, incoming("Hello"));
    assert!(effects.is_empty());
}

#[test]
fn unauthenticated_asks_the_user_to_sign_in() {
    init_logging();
    let (state, epoch) = started();
    let (state, effects) = tick(state, epoch, incoming("Hello"));
    let id = retrieve_ids(&effects)[0];

    let (state, effects) = finish(state, id, Err(RetrievalFailure::Unauthenticated));
    assert_eq!(
        effects,
        vec![Effect::Notify {
            severity: Severity::Error,
            text: "Please sign in first".to_string(),
        }]
    );
    assert!(state.is_polling());
}

#[test]
fn result_arriving_after_stop_is_ignored() {
    init_logging();
    let (state, epoch) = started();
    let (state, effects) = tick(state, epoch, incoming("Hello"));
    let id = retrieve_ids(&effects)[0];

    let (state, _) = update(state, Msg::Stop);
    let (state, effects) = finish(state, id, Ok(answer("late")));
    assert!(effects.is_empty());
    assert_eq!(state.last_seen(), None);
    assert!(state.view().suggestion.is_none());
}

#[test]
fn result_arriving_after_restart_does_not_block_the_new_epoch() {
    init_logging();
    let (state, epoch) = started();
    let (state, effects) = tick(state, epoch, incoming("Hello"));
    let stale = retrieve_ids(&effects)[0];

    let (state, effects) = update(state, Msg::Restart);
    let new_epoch = match effects.last() {
        Some(Effect::StartPolling { epoch }) => *epoch,
        other => panic!("unexpected restart effects: {other:?}"),
    };

    let (state, effects) = tick(state, new_epoch, incoming("Hello"));
    let fresh = retrieve_ids(&effects)[0];
    assert_ne!(fresh, stale);

    let (state, effects) = finish(state, stale, Ok(answer("stale")));
    assert!(effects.is_empty());
    assert_eq!(state.last_seen(), None);

    let (state, _) = finish(state, fresh, Ok(answer("fresh")));
    assert_eq!(state.last_seen(), Some("Hello"));
}
