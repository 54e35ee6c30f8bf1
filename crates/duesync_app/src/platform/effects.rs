use std::time::Duration;

use duesync_core::{Effect, EventFailure, ManualEvent, Msg, StatusKind, SyncSummary, SyncTarget};
use duesync_engine::{
    EngineConfig, EngineError, EngineEvent, EngineHandle, EventError, ManualEventInput,
    StatusLevel, SubmissionReport, SubmitTarget,
};
use duesync_logging::{ds_debug, ds_info};

/// Turns core effects into engine commands and engine events back into
/// core messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(config)?,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            ds_debug!("Running effect {:?}", effect);
            match effect {
                Effect::CheckAuth => self.engine.check_auth(),
                Effect::Authorize => self.engine.authorize(),
                Effect::SignOut => self.engine.sign_out(),
                Effect::RunSync { target } => self.engine.sync(map_target(target)),
                Effect::CreateEvent(event) => self.engine.create_event(map_manual_event(event)),
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Status { message, level } => Msg::Status {
            message,
            kind: map_level(level),
        },
        EngineEvent::DueDatesExtracted(records) => {
            for record in &records {
                ds_info!(
                    "Due date: {} -> {}",
                    record.title.as_deref().unwrap_or("(untitled)"),
                    record.due_date_text
                );
            }
            Msg::DueDatesReceived {
                count: records.len(),
            }
        }
        EngineEvent::AuthChecked { signed_in } => Msg::AuthChecked { signed_in },
        EngineEvent::Authorized(result) => Msg::AuthorizeFinished(result),
        EngineEvent::SignedOut(result) => Msg::SignOutFinished(result),
        EngineEvent::SyncCompleted(result) => {
            Msg::SyncFinished(result.map(|report| map_report(&report)))
        }
        EngineEvent::EventCreated(result) => Msg::EventCreated(result.map_err(map_event_error)),
    }
}

fn map_level(level: StatusLevel) -> StatusKind {
    match level {
        StatusLevel::Success => StatusKind::Success,
        StatusLevel::Error => StatusKind::Error,
        StatusLevel::Info => StatusKind::Info,
    }
}

fn map_target(target: SyncTarget) -> SubmitTarget {
    match target {
        SyncTarget::Calendar => SubmitTarget::Calendar,
        SyncTarget::Tasks => SubmitTarget::Tasks,
    }
}

fn map_report(report: &SubmissionReport) -> SyncSummary {
    SyncSummary {
        target: Some(match report.target {
            SubmitTarget::Calendar => SyncTarget::Calendar,
            SubmitTarget::Tasks => SyncTarget::Tasks,
        }),
        total: report.total,
        succeeded: report.succeeded,
        skipped: report.skipped,
        failed: report.failed(),
        network_failures: report.network_failures(),
    }
}

fn map_event_error(err: EventError) -> EventFailure {
    match err {
        EventError::Unauthorized => EventFailure::Unauthorized,
        EventError::Network => EventFailure::Network,
        EventError::Other(message) => EventFailure::Other(message),
    }
}

fn map_manual_event(event: ManualEvent) -> ManualEventInput {
    ManualEventInput {
        title: event.title,
        date: event.date,
        time: event.time,
        description: event.description,
    }
}
