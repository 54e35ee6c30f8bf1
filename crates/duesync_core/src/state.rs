use crate::view_model::AppViewModel;
use crate::EventForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    SignedOut,
    SignedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Calendar,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Syncing(SyncTarget),
    AddingEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
    Info,
}

impl StatusKind {
    /// Display color as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            StatusKind::Success => "#28a745",
            StatusKind::Error => "#dc3545",
            StatusKind::Info => "#17a2b8",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub kind: StatusKind,
}

impl StatusLine {
    pub fn new(message: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

/// Aggregate outcome of one sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSummary {
    pub target: Option<SyncTarget>,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub network_failures: usize,
}

impl SyncSummary {
    pub fn status_line(&self) -> StatusLine {
        if self.total == 0 {
            return StatusLine::new("No due dates found on the page", StatusKind::Info);
        }
        let noun = match self.target {
            Some(SyncTarget::Tasks) => "tasks",
            _ => "events",
        };
        let mut message = format!(
            "Added {} out of {} due dates as {}",
            self.succeeded, self.total, noun
        );
        if self.network_failures > 0 {
            message.push_str(&format!(
                "; {} failed, please check your internet connection",
                self.network_failures
            ));
        }
        let kind = if self.failed == 0 && self.skipped == 0 {
            StatusKind::Success
        } else if self.succeeded == 0 && self.total > 0 {
            StatusKind::Error
        } else {
            StatusKind::Info
        };
        StatusLine::new(message, kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    auth: AuthStatus,
    run: RunState,
    form: EventForm,
    status: Option<StatusLine>,
    last_summary: Option<SyncSummary>,
    extracted: Option<usize>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let signed_in = self.auth == AuthStatus::SignedIn;
        AppViewModel {
            auth: self.auth,
            run: self.run,
            status: self.status.clone(),
            authorize_visible: !signed_in,
            sign_out_visible: signed_in,
            form_visible: signed_in,
            form_valid: self.form.is_valid(),
            last_summary: self.last_summary,
            extracted_count: self.extracted,
            dirty: self.dirty,
        }
    }

    pub fn auth(&self) -> AuthStatus {
        self.auth
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn form(&self) -> &EventForm {
        &self.form
    }

    /// Returns whether the view changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn form_mut(&mut self) -> &mut EventForm {
        self.dirty = true;
        &mut self.form
    }

    pub(crate) fn set_auth(&mut self, auth: AuthStatus) {
        self.auth = auth;
        self.dirty = true;
    }

    pub(crate) fn set_run(&mut self, run: RunState) {
        self.run = run;
        self.dirty = true;
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusLine::new(message, kind));
        self.dirty = true;
    }

    pub(crate) fn set_status_line(&mut self, line: StatusLine) {
        self.status = Some(line);
        self.dirty = true;
    }

    pub(crate) fn record_extracted(&mut self, count: usize) {
        self.extracted = Some(count);
        self.dirty = true;
    }

    pub(crate) fn record_summary(&mut self, summary: SyncSummary) {
        self.last_summary = Some(summary);
        self.dirty = true;
    }
}
