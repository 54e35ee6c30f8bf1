use crate::{ManualEvent, SyncTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Look for a cached token without prompting.
    CheckAuth,
    /// Acquire a token, prompting the user if needed.
    Authorize,
    SignOut,
    RunSync { target: SyncTarget },
    CreateEvent(ManualEvent),
}
