use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use duesync_logging::{ds_error, ds_info, ds_warn};

use crate::auth::{AuthManager, IdentityProvider, DEFAULT_REVOKE_URL};
use crate::dates::parse_date_and_time;
use crate::extract::{DueDateExtractor, ExtractError, ExtractSettings};
use crate::orchestrate::{OrchestrateError, Orchestrator, ReadinessSettings};
use crate::page::{FilePageSession, HttpPageSession, PageError, PageSession, PageSettings};
use crate::payload::{
    CalendarEventBuilder, TaskBuilder, DEFAULT_CALENDAR_EVENTS_URL, DEFAULT_TASKS_URL,
};
use crate::request::{RequestError, ResilientRequest};
use crate::submit::Submitter;
use crate::transport::{ApiTransport, HttpSettings, ReqwestTransport, TransportError};
use crate::{
    ChannelEventSink, EngineEvent, EventError, EventSink, ManualEventInput, SubmitTarget,
};

#[derive(Debug, Clone)]
pub enum PageSource {
    Url(PageSettings),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub calendar_events: String,
    pub tasks: String,
    pub revoke: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            calendar_events: DEFAULT_CALENDAR_EVENTS_URL.to_string(),
            tasks: DEFAULT_TASKS_URL.to_string(),
            revoke: DEFAULT_REVOKE_URL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct EngineConfig {
    pub http: HttpSettings,
    /// Schedule page to scrape; only `sync` needs one.
    pub page: Option<PageSource>,
    pub extract: ExtractSettings,
    pub readiness: ReadinessSettings,
    pub endpoints: Endpoints,
    /// IANA zone attached to calendar event times; offsets are always sent.
    pub time_zone: Option<String>,
    /// Whether a sync may prompt for authorization when no token is cached.
    pub interactive_auth: bool,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("failed to start runtime: {0}")]
    Runtime(String),
}

enum EngineCommand {
    CheckAuth,
    Authorize,
    SignOut,
    Sync { target: SubmitTarget },
    CreateEvent(ManualEventInput),
}

struct Services {
    auth: Arc<AuthManager>,
    request: Arc<ResilientRequest>,
    orchestrator: Option<Orchestrator>,
    calendar: Arc<CalendarEventBuilder>,
    tasks: Arc<TaskBuilder>,
    interactive_auth: bool,
}

/// Runs engine commands on a background tokio runtime and streams
/// [`EngineEvent`]s back.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let services = Arc::new(build_services(config)?);
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|err| EngineError::Runtime(err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let services = services.clone();
                let sink = ChannelEventSink::new(event_tx.clone());
                runtime.spawn(async move {
                    handle_command(&services, command, &sink).await;
                });
            }
            ds_info!("Engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn check_auth(&self) {
        self.send(EngineCommand::CheckAuth);
    }

    pub fn authorize(&self) {
        self.send(EngineCommand::Authorize);
    }

    pub fn sign_out(&self) {
        self.send(EngineCommand::SignOut);
    }

    pub fn sync(&self, target: SubmitTarget) {
        self.send(EngineCommand::Sync { target });
    }

    pub fn create_event(&self, input: ManualEventInput) {
        self.send(EngineCommand::CreateEvent(input));
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            ds_error!("Engine thread is gone; command dropped");
        }
    }
}

fn build_services(config: EngineConfig) -> Result<Services, EngineError> {
    let transport: Arc<dyn ApiTransport> = Arc::new(ReqwestTransport::new(&config.http)?);
    let auth = Arc::new(AuthManager::new(
        config.identity,
        transport.clone(),
        config.endpoints.revoke,
    ));
    let request = Arc::new(ResilientRequest::new(transport, auth.clone()));

    let extractor = DueDateExtractor::new(&config.extract)?;
    let orchestrator = match config.page {
        Some(source) => {
            let page: Arc<dyn PageSession> = match source {
                PageSource::Url(settings) => {
                    Arc::new(HttpPageSession::new(settings, &config.http)?)
                }
                PageSource::File(path) => Arc::new(FilePageSession::new(path)),
            };
            Some(Orchestrator::new(page, extractor, config.readiness))
        }
        None => None,
    };

    Ok(Services {
        auth,
        request,
        orchestrator,
        calendar: Arc::new(CalendarEventBuilder::new(
            config.endpoints.calendar_events,
            config.time_zone,
        )),
        tasks: Arc::new(TaskBuilder::new(config.endpoints.tasks)),
        interactive_auth: config.interactive_auth,
    })
}

async fn handle_command(services: &Services, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::CheckAuth => {
            let signed_in = services.auth.ensure_token(false).await.is_ok();
            sink.emit(EngineEvent::AuthChecked { signed_in });
        }
        EngineCommand::Authorize => {
            let result = services
                .auth
                .ensure_token(true)
                .await
                .map(|_| ())
                .map_err(|err| err.to_string());
            sink.emit(EngineEvent::Authorized(result));
        }
        EngineCommand::SignOut => {
            let result = services.auth.revoke().await.map_err(|err| {
                ds_warn!("Sign-out cache clear failed: {}", err);
                err.to_string()
            });
            sink.emit(EngineEvent::SignedOut(result));
        }
        EngineCommand::Sync { target } => {
            let Some(orchestrator) = services.orchestrator.as_ref() else {
                ds_warn!("Sync requested without a schedule page");
                sink.emit(EngineEvent::SyncCompleted(Err(
                    "No schedule page configured".to_string()
                )));
                return;
            };
            let submitter = match target {
                SubmitTarget::Calendar => Submitter::new(
                    services.request.clone(),
                    services.calendar.clone(),
                    services.interactive_auth,
                ),
                SubmitTarget::Tasks => Submitter::new(
                    services.request.clone(),
                    services.tasks.clone(),
                    services.interactive_auth,
                ),
            };
            let result = orchestrator
                .run(&submitter, sink)
                .await
                .map_err(|err| sync_error_message(&err));
            sink.emit(EngineEvent::SyncCompleted(result));
        }
        EngineCommand::CreateEvent(input) => {
            let result = create_event(services, &input).await;
            sink.emit(EngineEvent::EventCreated(result));
        }
    }
}

fn sync_error_message(err: &OrchestrateError) -> String {
    match err {
        OrchestrateError::Extract(ExtractError::ElementNotFound { .. }) => {
            "Due date table not found on the page".to_string()
        }
        OrchestrateError::Auth(auth) => format!("Authentication failed: {auth}"),
        other => other.to_string(),
    }
}

async fn create_event(services: &Services, input: &ManualEventInput) -> Result<(), EventError> {
    let start = parse_date_and_time(&input.date, &input.time).ok_or_else(|| {
        EventError::Other(format!("invalid date or time: {} {}", input.date, input.time))
    })?;
    let request = services
        .calendar
        .build_manual(&input.title, &input.description, start)
        .map_err(|err| EventError::Other(err.to_string()))?;

    match services.request.send(&request).await {
        Ok(response) if response.is_success() => {
            ds_info!("Event {:?} created", input.title);
            Ok(())
        }
        Ok(response) if response.is_unauthorized() => Err(EventError::Unauthorized),
        Ok(response) => Err(EventError::Other(format!("http status {}", response.status))),
        Err(RequestError::Transport(_)) => Err(EventError::Network),
        Err(RequestError::Auth(_)) => Err(EventError::Unauthorized),
    }
}

