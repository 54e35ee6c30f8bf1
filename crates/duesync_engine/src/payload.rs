use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::dates::local_to_rfc3339;
use crate::transport::ApiRequest;
use crate::{DueDateRecord, SubmitTarget};

pub const DEFAULT_CALENDAR_EVENTS_URL: &str =
    "https://www.googleapis.com/calendar/v3/calendars/primary/events";
pub const DEFAULT_TASKS_URL: &str = "https://tasks.googleapis.com/tasks/v1/lists/@default/tasks";

const DEFAULT_TITLE: &str = "Assignment due";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEventPayload {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPayload {
    pub title: String,
    pub notes: String,
    pub due: String,
}

/// Strategy turning a parsed due date into an API request.
pub trait PayloadBuilder: Send + Sync {
    fn target(&self) -> SubmitTarget;

    fn build(
        &self,
        record: &DueDateRecord,
        due: NaiveDateTime,
    ) -> Result<ApiRequest, serde_json::Error>;
}

/// One-hour calendar event at 09:00 local on the due day, default reminders.
#[derive(Debug, Clone)]
pub struct CalendarEventBuilder {
    endpoint: String,
    time_zone: Option<String>,
    start_time: NaiveTime,
    duration: Duration,
}

impl CalendarEventBuilder {
    pub fn new(endpoint: impl Into<String>, time_zone: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            time_zone,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            duration: Duration::hours(1),
        }
    }

    pub fn event_payload(
        &self,
        summary: &str,
        description: &str,
        start: NaiveDateTime,
        reminders: bool,
    ) -> CalendarEventPayload {
        let at = |local: NaiveDateTime| EventTime {
            date_time: local_to_rfc3339(local),
            time_zone: self.time_zone.clone(),
        };
        CalendarEventPayload {
            summary: summary.to_string(),
            description: description.to_string(),
            start: at(start),
            end: at(start + self.duration),
            reminders: reminders.then_some(Reminders { use_default: true }),
        }
    }

    /// Request for an event typed into the manual form, starting exactly at `start`.
    pub fn build_manual(
        &self,
        title: &str,
        description: &str,
        start: NaiveDateTime,
    ) -> Result<ApiRequest, serde_json::Error> {
        let payload = self.event_payload(title, description, start, false);
        ApiRequest::post_json(&self.endpoint, &payload)
    }
}

impl PayloadBuilder for CalendarEventBuilder {
    fn target(&self) -> SubmitTarget {
        SubmitTarget::Calendar
    }

    fn build(
        &self,
        record: &DueDateRecord,
        due: NaiveDateTime,
    ) -> Result<ApiRequest, serde_json::Error> {
        let start = due.date().and_time(self.start_time);
        let payload = self.event_payload(
            record.title.as_deref().unwrap_or(DEFAULT_TITLE),
            &format!("Due: {}", record.due_date_text),
            start,
            true,
        );
        ApiRequest::post_json(&self.endpoint, &payload)
    }
}

/// Task due at the parsed instant.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    endpoint: String,
}

impl TaskBuilder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl PayloadBuilder for TaskBuilder {
    fn target(&self) -> SubmitTarget {
        SubmitTarget::Tasks
    }

    fn build(
        &self,
        record: &DueDateRecord,
        due: NaiveDateTime,
    ) -> Result<ApiRequest, serde_json::Error> {
        let payload = TaskPayload {
            title: record.title.clone().unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            notes: format!("Due: {}", record.due_date_text),
            due: local_to_rfc3339(due),
        };
        ApiRequest::post_json(&self.endpoint, &payload)
    }
}
