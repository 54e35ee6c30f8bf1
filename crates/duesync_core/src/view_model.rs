use crate::{AuthStatus, RunState, StatusLine, SyncSummary};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub auth: AuthStatus,
    pub run: RunState,
    pub status: Option<StatusLine>,
    pub authorize_visible: bool,
    pub sign_out_visible: bool,
    pub form_visible: bool,
    pub form_valid: bool,
    pub last_summary: Option<SyncSummary>,
    pub extracted_count: Option<usize>,
    pub dirty: bool,
}
