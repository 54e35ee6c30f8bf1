use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use duesync_engine::{
    EngineConfig, Endpoints, ExtractSettings, FileTokenCache, HttpSettings, PageSettings,
    PageSource, ReadinessSettings,
};
use duesync_logging::ds_info;
use serde::{Deserialize, Serialize};

use super::cli::Cli;

/// Settings read from the RON config file. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub page_url: Option<String>,
    pub page_file: Option<PathBuf>,
    pub reveal_url: Option<String>,
    pub max_page_bytes: u64,
    pub table_class: String,
    pub row_selector: String,
    pub due_column: usize,
    pub title_column: Option<usize>,
    pub poll_interval_ms: u64,
    pub ready_timeout_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub calendar_events_url: String,
    pub tasks_url: String,
    pub revoke_url: String,
    pub time_zone: Option<String>,
    pub token_cache: PathBuf,
    /// Shown above the token prompt, e.g. where to obtain a token.
    pub authorize_hint: Option<String>,
    /// Let `sync` prompt for a token when none is cached.
    pub interactive_auth: bool,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let extract = ExtractSettings::default();
        let readiness = ReadinessSettings::default();
        let http = HttpSettings::default();
        let endpoints = Endpoints::default();
        Self {
            page_url: None,
            page_file: None,
            reveal_url: None,
            max_page_bytes: PageSettings::for_url("").max_bytes,
            table_class: extract.table_class,
            row_selector: extract.row_selector,
            due_column: extract.due_column,
            title_column: extract.title_column,
            poll_interval_ms: readiness.poll_interval.as_millis() as u64,
            ready_timeout_ms: readiness.timeout.as_millis() as u64,
            connect_timeout_secs: http.connect_timeout.as_secs(),
            request_timeout_secs: http.request_timeout.as_secs(),
            calendar_events_url: endpoints.calendar_events,
            tasks_url: endpoints.tasks,
            revoke_url: endpoints.revoke,
            time_zone: None,
            token_cache: PathBuf::from(".duesync_token"),
            authorize_hint: None,
            interactive_auth: true,
            log_file: PathBuf::from("duesync.log"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl AppConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                ds_info!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Command-line flags win over the file. A page given on the command
    /// line replaces both page settings from the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if cli.page_url.is_some() || cli.page_file.is_some() {
            self.page_url = cli.page_url.clone();
            self.page_file = cli.page_file.clone();
        }
        if let Some(path) = &cli.token_cache {
            self.token_cache = path.clone();
        }
    }

    fn page_source(&self) -> Option<PageSource> {
        if let Some(path) = &self.page_file {
            return Some(PageSource::File(path.clone()));
        }
        let url = self.page_url.as_ref()?;
        let mut settings = PageSettings::for_url(url.clone());
        settings.reveal_url = self.reveal_url.clone();
        settings.max_bytes = self.max_page_bytes;
        Some(PageSource::Url(settings))
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            http: HttpSettings {
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
            },
            page: self.page_source(),
            extract: ExtractSettings {
                table_class: self.table_class.clone(),
                row_selector: self.row_selector.clone(),
                due_column: self.due_column,
                title_column: self.title_column,
            },
            readiness: ReadinessSettings {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                timeout: Duration::from_millis(self.ready_timeout_ms),
            },
            endpoints: Endpoints {
                calendar_events: self.calendar_events_url.clone(),
                tasks: self.tasks_url.clone(),
                revoke: self.revoke_url.clone(),
            },
            time_zone: self.time_zone.clone(),
            interactive_auth: self.interactive_auth,
            identity: Arc::new(FileTokenCache::new(
                self.token_cache.clone(),
                self.authorize_hint.clone(),
            )),
        }
    }
}
