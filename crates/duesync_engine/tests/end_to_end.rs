use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use duesync_engine::{
    EngineConfig, EngineEvent, EngineHandle, Endpoints, EventError, ExtractSettings,
    FileTokenCache, HttpSettings, ManualEventInput, PageSettings, PageSource, ReadinessSettings,
    SubmissionReport, SubmitTarget, TokenPrompt,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html><body><table class="customTable">
<tr class="fixedContent tableContent"><td>1</td><td>Essay</td><td></td><td></td><td><span>Oct 5, 2024 11:59 PM</span></td></tr>
<tr class="fixedContent tableContent"><td>2</td><td>Lab</td><td></td><td></td><td><span>not a date</span></td></tr>
<tr class="fixedContent tableContent"><td>3</td><td>Quiz</td><td></td><td></td><td><span>Nov 1, 2024 11:59 PM</span></td></tr>
</table></body></html>"#;

struct Fixture {
    runtime: tokio::runtime::Runtime,
    server: MockServer,
    _dir: tempfile::TempDir,
    engine: EngineHandle,
}

impl Fixture {
    fn new(mount: impl FnOnce(&tokio::runtime::Runtime, &MockServer)) -> Self {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/course"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
                .mount(&server),
        );
        mount(&runtime, &server);

        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        fs::write(&token_path, "cached-token\n").unwrap();
        let declined: TokenPrompt = Arc::new(|| Ok(String::new()));

        let config = EngineConfig {
            http: HttpSettings::default(),
            page: Some(PageSource::Url(PageSettings::for_url(format!(
                "{}/course",
                server.uri()
            )))),
            extract: ExtractSettings::default(),
            readiness: ReadinessSettings {
                poll_interval: Duration::from_millis(10),
                timeout: Duration::from_millis(200),
            },
            endpoints: Endpoints {
                calendar_events: format!("{}/calendar", server.uri()),
                tasks: format!("{}/tasks", server.uri()),
                revoke: format!("{}/revoke", server.uri()),
            },
            time_zone: None,
            interactive_auth: false,
            identity: Arc::new(FileTokenCache::with_prompt(token_path, declined)),
        };
        let engine = EngineHandle::new(config).unwrap();

        Self {
            runtime,
            server,
            _dir: dir,
            engine,
        }
    }

    fn wait_for<T>(&self, mut pick: impl FnMut(EngineEvent) -> Option<T>) -> (T, Vec<EngineEvent>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            if let Some(event) = self.engine.recv_timeout(Duration::from_millis(100)) {
                if let Some(found) = pick(event.clone()) {
                    return (found, seen);
                }
                seen.push(event);
            }
        }
        panic!("engine did not answer in time; saw {seen:?}");
    }

    fn verify(&self) {
        self.runtime.block_on(self.server.verify());
    }
}

#[test]
fn calendar_sync_adds_parseable_due_dates() {
    let fixture = Fixture::new(|runtime, server| {
        runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/calendar"))
                .and(header("Authorization", "Bearer cached-token"))
                .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
                .expect(2)
                .mount(server),
        );
    });

    fixture.engine.sync(SubmitTarget::Calendar);
    let (report, seen): (SubmissionReport, _) = fixture.wait_for(|event| match event {
        EngineEvent::SyncCompleted(result) => Some(result.unwrap()),
        _ => None,
    });

    assert_eq!(report.target, SubmitTarget::Calendar);
    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
    assert!(seen
        .iter()
        .any(|event| matches!(event, EngineEvent::DueDatesExtracted(list) if list.len() == 3)));
    fixture.verify();
}

#[test]
fn tasks_sync_posts_to_tasks_endpoint() {
    let fixture = Fixture::new(|runtime, server| {
        runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/tasks"))
                .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
                .expect(2)
                .mount(server),
        );
    });

    fixture.engine.sync(SubmitTarget::Tasks);
    let (report, _) = fixture.wait_for(|event| match event {
        EngineEvent::SyncCompleted(result) => Some(result.unwrap()),
        _ => None,
    });

    assert_eq!(report.target, SubmitTarget::Tasks);
    assert_eq!(report.succeeded, 2);
    fixture.verify();
}

#[test]
fn check_auth_reports_cached_token() {
    let fixture = Fixture::new(|_, _| {});

    fixture.engine.check_auth();
    let (signed_in, _) = fixture.wait_for(|event| match event {
        EngineEvent::AuthChecked { signed_in } => Some(signed_in),
        _ => None,
    });

    assert!(signed_in);
}

#[test]
fn manual_event_rejected_twice_is_unauthorized() {
    let fixture = Fixture::new(|runtime, server| {
        runtime.block_on(
            Mock::given(method("POST"))
                .and(path("/calendar"))
                .respond_with(ResponseTemplate::new(401))
                .mount(server),
        );
    });

    fixture.engine.create_event(ManualEventInput {
        title: "Office hours".into(),
        date: "2024-10-05".into(),
        time: "14:30".into(),
        description: String::new(),
    });
    let (result, _) = fixture.wait_for(|event| match event {
        EngineEvent::EventCreated(result) => Some(result),
        _ => None,
    });

    // The user declines the re-authorization prompt after the first 401.
    assert_eq!(result, Err(EventError::Unauthorized));
}

#[test]
fn sign_out_removes_cached_token() {
    let fixture = Fixture::new(|runtime, server| {
        runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/revoke"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(server),
        );
    });

    fixture.engine.sign_out();
    let (result, _) = fixture.wait_for(|event| match event {
        EngineEvent::SignedOut(result) => Some(result),
        _ => None,
    });
    assert_eq!(result, Ok(()));

    fixture.engine.check_auth();
    let (signed_in, _) = fixture.wait_for(|event| match event {
        EngineEvent::AuthChecked { signed_in } => Some(signed_in),
        _ => None,
    });
    assert!(!signed_in);
    fixture.verify();
}

#[test]
fn sync_without_page_reports_missing_page() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineHandle::new(EngineConfig {
        http: HttpSettings::default(),
        page: None,
        extract: ExtractSettings::default(),
        readiness: ReadinessSettings::default(),
        endpoints: Endpoints::default(),
        time_zone: None,
        interactive_auth: false,
        identity: Arc::new(FileTokenCache::new(dir.path().join("token"), None)),
    })
    .unwrap();

    engine.sync(SubmitTarget::Tasks);
    let event = engine.recv_timeout(Duration::from_secs(5));

    assert_eq!(
        event,
        Some(EngineEvent::SyncCompleted(Err(
            "No schedule page configured".to_string()
        )))
    );
}
