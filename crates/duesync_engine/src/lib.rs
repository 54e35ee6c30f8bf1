//! Duesync engine: page scraping, token handling and API submission.
mod auth;
mod dates;
mod engine;
mod extract;
mod orchestrate;
mod page;
mod payload;
mod request;
mod submit;
mod token_cache;
mod transport;
mod types;

pub use auth::{AuthError, AuthManager, AuthState, IdentityProvider, DEFAULT_REVOKE_URL};
pub use dates::{local_to_rfc3339, parse_date_and_time, parse_due_date};
pub use engine::{EngineConfig, EngineError, EngineHandle, Endpoints, PageSource};
pub use extract::{DueDateExtractor, ExtractError, ExtractSettings};
pub use orchestrate::{OrchestrateError, Orchestrator, ReadinessSettings};
pub use page::{
    decode_html, FilePageSession, HttpPageSession, PageError, PageSession, PageSettings,
};
pub use payload::{
    CalendarEventBuilder, CalendarEventPayload, EventTime, PayloadBuilder, Reminders,
    TaskBuilder, TaskPayload, DEFAULT_CALENDAR_EVENTS_URL, DEFAULT_TASKS_URL,
};
pub use request::{RequestError, ResilientRequest, DEFAULT_RETRIES};
pub use submit::{ItemFailure, SubmissionReport, Submitter};
pub use token_cache::{FileTokenCache, TokenPrompt};
pub use transport::{
    ApiMethod, ApiRequest, ApiResponse, ApiTransport, HttpSettings, ReqwestTransport,
    TransportError,
};
pub use types::{
    ChannelEventSink, DueDateRecord, EngineEvent, EventError, EventSink, ManualEventInput,
    StatusLevel, SubmitTarget,
};
