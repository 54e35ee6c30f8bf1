use duesync_logging::{ds_debug, ds_info};

use crate::{AppState, AuthStatus, Effect, EventFailure, Msg, RunState, StatusKind};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::CheckAuth],
        Msg::AuthorizeClicked => vec![Effect::Authorize],
        Msg::SignOutClicked => {
            if state.auth() == AuthStatus::SignedIn {
                vec![Effect::SignOut]
            } else {
                Vec::new()
            }
        }
        Msg::SyncClicked(target) => {
            // A second trigger while busy would race the first on the token slot.
            if state.run_state() != RunState::Idle {
                ds_debug!("Ignoring sync trigger while {:?}", state.run_state());
                return (state, Vec::new());
            }
            state.set_run(RunState::Syncing(target));
            state.set_status("Getting due dates...", StatusKind::Info);
            vec![Effect::RunSync { target }]
        }
        Msg::FormFieldChanged { field, value } => {
            state.form_mut().set(field, value);
            Vec::new()
        }
        Msg::AddEventClicked => match state.form().to_event() {
            None => {
                state.set_status("Please fill in all required fields", StatusKind::Error);
                Vec::new()
            }
            Some(_) if state.run_state() != RunState::Idle => Vec::new(),
            Some(event) => {
                state.set_run(RunState::AddingEvent);
                state.set_status("Adding event...", StatusKind::Info);
                vec![Effect::CreateEvent(event)]
            }
        },
        Msg::AuthChecked { signed_in } => {
            if signed_in {
                state.set_auth(AuthStatus::SignedIn);
                state.set_status("Already signed in", StatusKind::Success);
            } else {
                state.set_auth(AuthStatus::SignedOut);
                state.set_status("Please sign in to continue", StatusKind::Info);
            }
            Vec::new()
        }
        Msg::AuthorizeFinished(result) => {
            match result {
                Ok(()) => {
                    state.set_auth(AuthStatus::SignedIn);
                    state.set_status("Signed in successfully", StatusKind::Success);
                }
                Err(message) => {
                    state.set_status(
                        format!("Authentication failed: {message}"),
                        StatusKind::Error,
                    );
                }
            }
            Vec::new()
        }
        Msg::SignOutFinished(result) => {
            state.set_auth(AuthStatus::SignedOut);
            match result {
                Ok(()) => state.set_status("Signed out successfully", StatusKind::Success),
                Err(_) => {
                    state.set_status("Error signing out. Please try again.", StatusKind::Error)
                }
            }
            Vec::new()
        }
        Msg::Status { message, kind } => {
            state.set_status(message, kind);
            Vec::new()
        }
        Msg::DueDatesReceived { count } => {
            ds_info!("Received {} due dates from the page", count);
            state.record_extracted(count);
            Vec::new()
        }
        Msg::SyncFinished(result) => {
            state.set_run(RunState::Idle);
            match result {
                Ok(summary) => {
                    state.set_status_line(summary.status_line());
                    state.record_summary(summary);
                }
                Err(message) => state.set_status(message, StatusKind::Error),
            }
            Vec::new()
        }
        Msg::EventCreated(result) => {
            state.set_run(RunState::Idle);
            match result {
                Ok(()) => {
                    state.set_status("Event added successfully", StatusKind::Success);
                    state.form_mut().clear();
                }
                Err(failure) => {
                    let detail = match failure {
                        EventFailure::Unauthorized => "Please try signing in again.".to_string(),
                        EventFailure::Network => {
                            "Please check your internet connection.".to_string()
                        }
                        EventFailure::Other(message) => message,
                    };
                    state.set_status(format!("Error adding event. {detail}"), StatusKind::Error);
                }
            }
            Vec::new()
        }
    };

    (state, effects)
}
