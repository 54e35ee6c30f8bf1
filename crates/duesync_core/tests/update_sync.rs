use std::sync::Once;

use duesync_core::{
    update, AppState, Effect, EventFailure, FormField, ManualEvent, Msg, RunState, StatusKind,
    SyncSummary, SyncTarget,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(duesync_logging::initialize_for_tests);
}

fn fill_form(state: AppState, title: &str, date: &str, time: &str) -> AppState {
    let fields = [
        (FormField::Title, title),
        (FormField::Date, date),
        (FormField::Time, time),
    ];
    fields.into_iter().fold(state, |state, (field, value)| {
        update(
            state,
            Msg::FormFieldChanged {
                field,
                value: value.to_string(),
            },
        )
        .0
    })
}

#[test]
fn sync_click_starts_run_and_emits_effect() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), Msg::SyncClicked(SyncTarget::Calendar));

    assert_eq!(
        effects,
        vec![Effect::RunSync {
            target: SyncTarget::Calendar
        }]
    );
    assert_eq!(state.run_state(), RunState::Syncing(SyncTarget::Calendar));
    assert!(state.consume_dirty());
}

#[test]
fn second_sync_click_while_running_is_ignored() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SyncClicked(SyncTarget::Tasks));
    let (state, effects) = update(state, Msg::SyncClicked(SyncTarget::Tasks));
    assert!(effects.is_empty());
    assert_eq!(state.run_state(), RunState::Syncing(SyncTarget::Tasks));
}

#[test]
fn sync_finished_reports_aggregate_and_returns_to_idle() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SyncClicked(SyncTarget::Calendar));
    let (state, _) = update(state, Msg::DueDatesReceived { count: 3 });
    let summary = SyncSummary {
        target: Some(SyncTarget::Calendar),
        total: 3,
        succeeded: 2,
        skipped: 1,
        failed: 0,
        network_failures: 0,
    };
    let (state, _) = update(state, Msg::SyncFinished(Ok(summary)));

    let view = state.view();
    assert_eq!(view.run, RunState::Idle);
    assert_eq!(view.extracted_count, Some(3));
    assert_eq!(view.last_summary, Some(summary));
    let status = view.status.unwrap();
    assert_eq!(status.message, "Added 2 out of 3 due dates as events");
    assert_eq!(status.kind, StatusKind::Info);

    // A new run may start once idle again.
    let (_state, effects) = update(state, Msg::SyncClicked(SyncTarget::Calendar));
    assert_eq!(effects.len(), 1);
}

#[test]
fn network_failures_surface_in_batch_status() {
    init_logging();
    let summary = SyncSummary {
        target: Some(SyncTarget::Tasks),
        total: 2,
        succeeded: 1,
        skipped: 0,
        failed: 1,
        network_failures: 1,
    };
    let line = summary.status_line();
    assert_eq!(
        line.message,
        "Added 1 out of 2 due dates as tasks; 1 failed, please check your internet connection"
    );
}

#[test]
fn empty_page_is_reported_as_nothing_found() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SyncClicked(SyncTarget::Calendar));
    let (state, _) = update(state, Msg::DueDatesReceived { count: 0 });
    let summary = SyncSummary {
        target: Some(SyncTarget::Calendar),
        ..SyncSummary::default()
    };
    let (state, _) = update(state, Msg::SyncFinished(Ok(summary)));

    let status = state.view().status.unwrap();
    assert_eq!(status.message, "No due dates found on the page");
    assert_eq!(status.kind, StatusKind::Info);
    assert_eq!(state.run_state(), RunState::Idle);
}

#[test]
fn sync_error_is_shown_as_error_status() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::SyncClicked(SyncTarget::Calendar));
    let (state, _) = update(
        state,
        Msg::SyncFinished(Err("Due date table not found".into())),
    );
    let status = state.view().status.unwrap();
    assert_eq!(status.message, "Due date table not found");
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(state.run_state(), RunState::Idle);
}

#[test]
fn add_event_with_missing_fields_is_rejected() {
    init_logging();
    let state = fill_form(AppState::new(), "Essay", "", "09:00");
    assert!(!state.view().form_valid);

    let (state, effects) = update(state, Msg::AddEventClicked);
    assert!(effects.is_empty());
    assert_eq!(
        state.view().status.unwrap().message,
        "Please fill in all required fields"
    );
}

#[test]
fn add_event_emits_effect_and_clears_form_on_success() {
    init_logging();
    let state = fill_form(AppState::new(), " Essay ", "2024-10-05", "09:00");
    assert!(state.view().form_valid);

    let (state, effects) = update(state, Msg::AddEventClicked);
    assert_eq!(
        effects,
        vec![Effect::CreateEvent(ManualEvent {
            title: "Essay".into(),
            date: "2024-10-05".into(),
            time: "09:00".into(),
            description: String::new(),
        })]
    );
    assert_eq!(state.run_state(), RunState::AddingEvent);

    let (state, _) = update(state, Msg::EventCreated(Ok(())));
    assert_eq!(state.form().title, "");
    assert!(!state.view().form_valid);
    assert_eq!(
        state.view().status.unwrap().message,
        "Event added successfully"
    );
}

#[test]
fn add_event_failures_map_to_user_messages() {
    init_logging();
    let cases = [
        (EventFailure::Unauthorized, "Error adding event. Please try signing in again."),
        (
            EventFailure::Network,
            "Error adding event. Please check your internet connection.",
        ),
        (
            EventFailure::Other("http status 500".into()),
            "Error adding event. http status 500",
        ),
    ];
    for (failure, expected) in cases {
        let state = fill_form(AppState::new(), "Essay", "2024-10-05", "09:00");
        let (state, _) = update(state, Msg::AddEventClicked);
        let (state, _) = update(state, Msg::EventCreated(Err(failure)));
        assert_eq!(state.view().status.unwrap().message, expected);
        // Form is kept so the user can retry.
        assert_eq!(state.form().title, "Essay");
    }
}
