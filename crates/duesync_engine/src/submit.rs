use std::sync::Arc;

use duesync_logging::{ds_debug, ds_info, ds_warn};

use crate::auth::AuthError;
use crate::dates::parse_due_date;
use crate::payload::PayloadBuilder;
use crate::request::{RequestError, ResilientRequest};
use crate::{DueDateRecord, SubmitTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFailure {
    /// Final non-2xx status, including a 401 that survived the refresh.
    HttpStatus(u16),
    Network(String),
    Auth(String),
    Payload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub target: SubmitTarget,
    pub total: usize,
    pub succeeded: usize,
    /// Records whose date text did not parse.
    pub skipped: usize,
    /// `(record index, failure)` in submission order.
    pub failures: Vec<(usize, ItemFailure)>,
}

impl SubmissionReport {
    fn new(target: SubmitTarget, total: usize) -> Self {
        Self {
            target,
            total,
            succeeded: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn network_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|(_, failure)| matches!(failure, ItemFailure::Network(_)))
            .count()
    }
}

/// Pushes due dates one at a time through a payload strategy.
pub struct Submitter {
    request: Arc<ResilientRequest>,
    builder: Arc<dyn PayloadBuilder>,
    interactive_auth: bool,
}

impl Submitter {
    pub fn new(
        request: Arc<ResilientRequest>,
        builder: Arc<dyn PayloadBuilder>,
        interactive_auth: bool,
    ) -> Self {
        Self {
            request,
            builder,
            interactive_auth,
        }
    }

    pub fn target(&self) -> SubmitTarget {
        self.builder.target()
    }

    /// Submits every record in order. Only a failure to obtain a token before
    /// the first request aborts the batch; per-item failures are tallied.
    pub async fn submit_all(
        &self,
        records: &[DueDateRecord],
    ) -> Result<SubmissionReport, AuthError> {
        self.request
            .auth()
            .ensure_token(self.interactive_auth)
            .await?;

        let mut report = SubmissionReport::new(self.target(), records.len());
        for (index, record) in records.iter().enumerate() {
            let Some(due) = parse_due_date(&record.due_date_text) else {
                ds_debug!("Skipping unparseable due date {:?}", record.due_date_text);
                report.skipped += 1;
                continue;
            };

            match self.submit_one(record, due).await {
                Ok(()) => report.succeeded += 1,
                Err(failure) => {
                    ds_warn!(
                        "Failed to submit {:?} ({}): {:?}",
                        record.title,
                        record.due_date_text,
                        failure
                    );
                    report.failures.push((index, failure));
                }
            }
        }

        ds_info!(
            "{:?} submission: {} out of {} added ({} skipped, {} failed)",
            report.target,
            report.succeeded,
            report.total,
            report.skipped,
            report.failed()
        );
        Ok(report)
    }

    async fn submit_one(
        &self,
        record: &DueDateRecord,
        due: chrono::NaiveDateTime,
    ) -> Result<(), ItemFailure> {
        let request = self
            .builder
            .build(record, due)
            .map_err(|err| ItemFailure::Payload(err.to_string()))?;

        match self.request.send(&request).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(ItemFailure::HttpStatus(response.status)),
            Err(RequestError::Transport(err)) => Err(ItemFailure::Network(err.to_string())),
            Err(RequestError::Auth(err)) => Err(ItemFailure::Auth(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::{ItemFailure, Submitter};
    use crate::auth::{AuthError, AuthManager};
    use crate::payload::TaskBuilder;
    use crate::request::tests::{ScriptedTransport, StubProvider};
    use crate::request::ResilientRequest;
    use crate::transport::TransportError;
    use crate::{DueDateRecord, SubmitTarget};

    fn submitter(
        provider: Arc<StubProvider>,
        script: Vec<Result<u16, TransportError>>,
    ) -> (Submitter, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(script));
        let auth = Arc::new(AuthManager::new(
            provider,
            transport.clone(),
            "http://localhost/revoke",
        ));
        let request = Arc::new(ResilientRequest::new(transport.clone(), auth));
        (
            Submitter::new(request, Arc::new(TaskBuilder::new("http://tasks/")), true),
            transport,
        )
    }

    fn records(texts: &[&str]) -> Vec<DueDateRecord> {
        texts
            .iter()
            .map(|text| DueDateRecord::new(None, *text))
            .collect()
    }

    #[tokio::test]
    async fn unparseable_dates_count_toward_total_only() {
        let (submitter, transport) =
            submitter(Arc::new(StubProvider::with_cached("tok")), vec![]);

        let report = submitter
            .submit_all(&records(&["Oct 5, 2024 11:59 PM", "not a date", "Nov 1, 2024 11:59 PM"]))
            .await
            .unwrap();

        assert_eq!(report.target, SubmitTarget::Tasks);
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.failures.is_empty());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn item_failures_do_not_abort_the_batch() {
        let (submitter, transport) = submitter(
            Arc::new(StubProvider::with_cached("tok")),
            vec![
                Ok(500),
                Err(TransportError::Network("reset".into())),
                Err(TransportError::Network("reset".into())),
                Ok(201),
            ],
        );

        let report = submitter
            .submit_all(&records(&["2024-10-01", "2024-10-02", "2024-10-03"]))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.network_failures(), 1);
        assert_eq!(report.failures[0], (0, ItemFailure::HttpStatus(500)));
        assert!(matches!(report.failures[1], (1, ItemFailure::Network(_))));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn persistent_unauthorized_counts_as_failed_item() {
        let provider = Arc::new(StubProvider::with_cached("tok"));
        let (submitter, _transport) = submitter(provider.clone(), vec![Ok(401), Ok(401), Ok(200)]);

        let report = submitter
            .submit_all(&records(&["2024-10-01", "2024-10-02"]))
            .await
            .unwrap();

        assert_eq!(report.failures, vec![(0, ItemFailure::HttpStatus(401))]);
        assert_eq!(report.succeeded, 1);
        assert_eq!(provider.interactive_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn denied_authorization_halts_before_any_request() {
        let provider = Arc::new(StubProvider {
            deny_interactive: true,
            ..StubProvider::default()
        });
        let (submitter, transport) = submitter(provider, vec![]);

        let err = submitter
            .submit_all(&records(&["2024-10-01"]))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Denied(_)));
        assert_eq!(transport.calls(), 0);
    }
}
