use crate::{FormField, StatusKind, SyncSummary, SyncTarget};

/// Why a manual event could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFailure {
    /// The API kept answering 401 after the token refresh.
    Unauthorized,
    Network,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// App started; check for an existing session without prompting.
    Started,
    /// User clicked Authorize.
    AuthorizeClicked,
    /// User clicked Sign out.
    SignOutClicked,
    /// User asked to pull due dates from the page into the given target.
    SyncClicked(SyncTarget),
    /// User edited a field of the manual event form.
    FormFieldChanged { field: FormField, value: String },
    /// User clicked Add event on the manual form.
    AddEventClicked,
    /// Silent token check finished.
    AuthChecked { signed_in: bool },
    /// Interactive authorization finished; `Err` carries the provider message.
    AuthorizeFinished(Result<(), String>),
    /// Sign-out finished. The session is gone either way; `Err` means the
    /// local cache clear failed.
    SignOutFinished(Result<(), String>),
    /// Engine progress line for the status display.
    Status { message: String, kind: StatusKind },
    /// The page yielded this many due-date records.
    DueDatesReceived { count: usize },
    /// A sync pass ended.
    SyncFinished(Result<SyncSummary, String>),
    /// A manual event submission ended.
    EventCreated(Result<(), EventFailure>),
}
