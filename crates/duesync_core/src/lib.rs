//! Duesync core: pure state machine and view-model helpers.
mod effect;
mod form;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use form::{EventForm, FormField, ManualEvent};
pub use msg::{EventFailure, Msg};
pub use state::{AppState, AuthStatus, RunState, StatusKind, StatusLine, SyncSummary, SyncTarget};
pub use update::update;
pub use view_model::AppViewModel;
