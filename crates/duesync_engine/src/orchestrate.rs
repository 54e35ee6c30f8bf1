use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use duesync_logging::{ds_debug, ds_error, ds_info, ds_warn};
use tokio::time::Instant;

use crate::auth::AuthError;
use crate::extract::{DueDateExtractor, ExtractError};
use crate::page::{PageError, PageSession};
use crate::submit::{SubmissionReport, Submitter};
use crate::{EngineEvent, EventSink, StatusLevel};

#[derive(Debug, Clone)]
pub struct ReadinessSettings {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestrateError {
    #[error("a sync is already running")]
    AlreadyRunning,
    #[error("could not load the page: {0}")]
    Page(#[from] PageError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("authorization failed: {0}")]
    Auth(#[from] AuthError),
}

/// Reveal, wait for the table, extract, submit.
pub struct Orchestrator {
    page: Arc<dyn PageSession>,
    extractor: DueDateExtractor,
    readiness: ReadinessSettings,
    running: AtomicBool,
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Orchestrator {
    pub fn new(
        page: Arc<dyn PageSession>,
        extractor: DueDateExtractor,
        readiness: ReadinessSettings,
    ) -> Self {
        Self {
            page,
            extractor,
            readiness,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn run(
        &self,
        submitter: &Submitter,
        sink: &dyn EventSink,
    ) -> Result<SubmissionReport, OrchestrateError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            ds_warn!("Sync requested while another is in flight");
            return Err(OrchestrateError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        sink.status("Opening schedule...", StatusLevel::Info);
        if let Err(err) = self.page.reveal().await {
            ds_warn!("Reveal step failed, reading page as is: {}", err);
        }

        let html = self.await_table().await?;
        let records = match self.extractor.extract(&html) {
            Ok(records) => records,
            Err(err) => {
                ds_error!("Extraction failed: {}", err);
                return Err(err.into());
            }
        };
        ds_info!("Extracted {} due dates", records.len());
        sink.emit(EngineEvent::DueDatesExtracted(records.clone()));

        if records.is_empty() {
            sink.status("No due dates found on the page", StatusLevel::Info);
            return Ok(SubmissionReport {
                target: submitter.target(),
                total: 0,
                succeeded: 0,
                skipped: 0,
                failures: Vec::new(),
            });
        }

        sink.status(
            &format!("Found {} due dates, adding...", records.len()),
            StatusLevel::Info,
        );
        let report = submitter.submit_all(&records).await?;
        Ok(report)
    }

    /// Polls the page until the schedule table shows up or the timeout passes.
    /// On timeout the last snapshot is returned and extraction reports the
    /// missing table.
    async fn await_table(&self) -> Result<String, OrchestrateError> {
        let deadline = Instant::now() + self.readiness.timeout;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let html = self.page.snapshot().await?;
            if self.extractor.has_table(&html) {
                ds_debug!("Schedule table ready after {} snapshot(s)", attempts);
                return Ok(html);
            }
            if Instant::now() >= deadline {
                ds_warn!("Schedule table not ready after {} snapshot(s)", attempts);
                return Ok(html);
            }
            tokio::time::sleep(self.readiness.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{OrchestrateError, Orchestrator, ReadinessSettings};
    use crate::auth::AuthManager;
    use crate::extract::{DueDateExtractor, ExtractError, ExtractSettings};
    use crate::page::{PageError, PageSession};
    use crate::payload::CalendarEventBuilder;
    use crate::request::tests::{ScriptedTransport, StubProvider};
    use crate::request::ResilientRequest;
    use crate::submit::Submitter;
    use crate::{EngineEvent, EventSink};

    const READY: &str = r#"<table class="customTable">
        <tr class="fixedContent tableContent">
          <td>1</td><td>Essay</td><td></td><td></td><td><span>Oct 5, 2024 11:59 PM</span></td>
        </tr></table>"#;

    /// Page that only shows the table from the n-th snapshot on.
    struct SlowPage {
        ready_from: usize,
        snapshots: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PageSession for SlowPage {
        async fn reveal(&self) -> Result<(), PageError> {
            Err(PageError::HttpStatus(404))
        }

        async fn snapshot(&self) -> Result<String, PageError> {
            let n = self.snapshots.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.ready_from {
                Ok(READY.to_string())
            } else {
                Ok("<p>loading</p>".to_string())
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<EngineEvent>>);

    impl EventSink for RecordingSink {
        fn emit(&self, event: EngineEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn orchestrator(ready_from: usize) -> (Orchestrator, Arc<SlowPage>) {
        let page = Arc::new(SlowPage {
            ready_from,
            snapshots: AtomicUsize::new(0),
        });
        let readiness = ReadinessSettings {
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(200),
        };
        let extractor = DueDateExtractor::new(&ExtractSettings::default()).unwrap();
        (Orchestrator::new(page.clone(), extractor, readiness), page)
    }

    fn submitter() -> Submitter {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let auth = Arc::new(AuthManager::new(
            Arc::new(StubProvider::with_cached("tok")),
            transport.clone(),
            "http://localhost/revoke",
        ));
        Submitter::new(
            Arc::new(ResilientRequest::new(transport, auth)),
            Arc::new(CalendarEventBuilder::new("http://cal/", None)),
            false,
        )
    }

    #[tokio::test]
    async fn polls_until_table_appears_then_submits() {
        let (orchestrator, page) = orchestrator(3);
        let sink = RecordingSink::default();

        let report = orchestrator.run(&submitter(), &sink).await.unwrap();

        assert_eq!(page.snapshots.load(Ordering::SeqCst), 3);
        assert_eq!(report.total, 1);
        assert_eq!(report.succeeded, 1);
        let events = sink.0.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::DueDatesExtracted(list) if list.len() == 1)));
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn missing_table_after_timeout_is_element_not_found() {
        let (orchestrator, _page) = orchestrator(usize::MAX);
        let sink = RecordingSink::default();

        let err = orchestrator.run(&submitter(), &sink).await.unwrap_err();

        assert_eq!(
            err,
            OrchestrateError::Extract(ExtractError::ElementNotFound {
                class: "customTable".into()
            })
        );
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let (orchestrator, _page) = orchestrator(2);
        let sink = RecordingSink::default();
        let submitter = submitter();

        let (first, second) = tokio::join!(
            orchestrator.run(&submitter, &sink),
            orchestrator.run(&submitter, &sink)
        );

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), OrchestrateError::AlreadyRunning);
    }
}
