use serde::{Deserialize, Serialize};

use crate::submit::SubmissionReport;

/// One row scraped from the schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDateRecord {
    pub title: Option<String>,
    pub due_date_text: String,
}

impl DueDateRecord {
    pub fn new(title: Option<String>, due_date_text: impl Into<String>) -> Self {
        Self {
            title,
            due_date_text: due_date_text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    Calendar,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Success,
    Error,
    Info,
}

/// A manual calendar entry as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEventInput {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    Unauthorized,
    Network,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Status { message: String, level: StatusLevel },
    /// One-shot hand-off of the scraped list; receivers only log it.
    DueDatesExtracted(Vec<DueDateRecord>),
    AuthChecked { signed_in: bool },
    Authorized(Result<(), String>),
    SignedOut(Result<(), String>),
    SyncCompleted(Result<SubmissionReport, String>),
    EventCreated(Result<(), EventError>),
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);

    fn status(&self, message: &str, level: StatusLevel) {
        self.emit(EngineEvent::Status {
            message: message.to_string(),
            level,
        });
    }
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
