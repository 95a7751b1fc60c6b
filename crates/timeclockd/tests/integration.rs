//! Integration tests for timeclockd
//!
//! Drive the daemon against a fake HR service and check which writes reach it.

use chrono::{DateTime, Local, TimeZone};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use timeclock_api::{ClientRole, Command, ReconcileOutcome, ResponsePayload, Secret, Signal};
use timeclock_config::parse_config;
use timeclock_core::{
    AttendanceClient, AttendanceEngine, CoreEvent, MockAttendanceApi, SessionConfig,
};
use timeclock_host_api::{CredentialStore, EventSource, MemoryCredentialStore, ScriptedEventSource};
use timeclock_host_linux::FileCredentialStore;
use timeclock_util::ClientId;
use timeclockd::Daemon;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const CLOCK_IN: &str = "/api/2025-10-01/resources/attendance/shifts/clock_in";
const CLOCK_OUT: &str = "/api/2025-10-01/resources/attendance/shifts/clock_out";

fn october_15(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 10, 15, hour, minute, 0).unwrap()
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/sign_in"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<head><meta name="csrf-token" content="abc123" /></head>"#),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/sign_in"))
        .and(body_string_contains("authenticity_token=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>dashboard</html>"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/attendance/periods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"year": 2025, "month": 10, "id": 42, "employee_id": 7}
        ])))
        .mount(server)
        .await;
}

async fn mount_calendar(server: &MockServer, is_laborable: bool) {
    Mock::given(method("GET"))
        .and(path("/attendance/calendar"))
        .and(query_param("id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"day": 15, "is_leave": false, "is_laborable": is_laborable, "date": "2025-10-15"}
        ])))
        .mount(server)
        .await;
}

/// Today's shifts as the service sees them. Clock writes update it.
#[derive(Clone, Default)]
struct Shifts(Arc<Mutex<Vec<serde_json::Value>>>);

fn minute_of(request: &Request) -> String {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == "now")
        .map(|(_, v)| v[11..16].to_string())
        .unwrap_or_default()
}

impl Respond for Shifts {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut shifts = self.0.lock().unwrap();
        if request.url.path().ends_with("/clock_in") {
            shifts.push(json!({"day": 15, "clock_in": minute_of(request), "clock_out": null}));
            ResponseTemplate::new(201)
        } else if request.url.path().ends_with("/clock_out") {
            if let Some(last) = shifts.last_mut() {
                last["clock_out"] = json!(minute_of(request));
            }
            ResponseTemplate::new(201)
        } else {
            ResponseTemplate::new(200).set_body_json(json!(*shifts))
        }
    }
}

async fn mount_shifts(server: &MockServer, shifts: &Shifts) {
    Mock::given(method("GET"))
        .and(path("/attendance/shifts"))
        .respond_with(shifts.clone())
        .mount(server)
        .await;
}

fn credential_store(dir: &tempfile::TempDir) -> Arc<FileCredentialStore> {
    let store = Arc::new(FileCredentialStore::in_data_dir(dir.path()));
    store.set_credentials("me@example.com", "hunter2").unwrap();
    store
}

fn daemon(server: &MockServer, store: Arc<FileCredentialStore>) -> Daemon<AttendanceClient> {
    let client = AttendanceClient::new(SessionConfig {
        base_url: server.uri(),
        return_host: "factorialhr.es".into(),
        request_timeout: Some(Duration::from_secs(5)),
    })
    .unwrap();
    Daemon::new(AttendanceEngine::new(client, 8), store)
}

#[tokio::test]
async fn workday_lifecycle() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_calendar(&server, true).await;
    let shifts = Shifts::default();
    mount_shifts(&server, &shifts).await;

    Mock::given(method("POST"))
        .and(path(CLOCK_IN))
        .and(query_param("now", "2025-10-15T09:00:00"))
        .respond_with(shifts.clone())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLOCK_OUT))
        .and(query_param("now", "2025-10-15T17:10:00"))
        .respond_with(shifts.clone())
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut daemon = daemon(&server, credential_store(&dir));

    let events = daemon.startup(october_15(9, 0)).await;
    assert!(matches!(events[0], CoreEvent::LoggedIn { .. }));
    assert_eq!(
        daemon.engine().status().displayable_text,
        "Status: Not clocked in today"
    );

    let events = daemon.handle_signal(Signal::Login, october_15(9, 0)).await;
    assert_eq!(
        events[0],
        CoreEvent::ClockedIn {
            signal: Signal::Login,
            at: "09:00".into()
        }
    );
    assert_eq!(
        daemon.engine().status().displayable_text,
        "Status: Clocked in: 09:00 (8h 0m left)"
    );

    // Waking up with the shift still open is a no-op
    let events = daemon.handle_signal(Signal::Wake, october_15(13, 0)).await;
    assert!(matches!(events[0], CoreEvent::AlreadyClockedIn { .. }));

    // Suspend closes the shift
    let events = daemon.handle_signal(Signal::Sleep, october_15(17, 10)).await;
    assert_eq!(
        events[0],
        CoreEvent::ClockedOut {
            signal: Signal::Sleep,
            at: "17:10".into()
        }
    );
    assert_eq!(
        daemon.engine().status().displayable_text,
        "Status: Clocked: 09:00 - 17:10"
    );
}

#[tokio::test]
async fn break_then_return_keeps_one_open_shift() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_calendar(&server, true).await;
    let shifts = Shifts::default();
    mount_shifts(&server, &shifts).await;

    Mock::given(method("POST"))
        .and(path(CLOCK_IN))
        .respond_with(shifts.clone())
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLOCK_OUT))
        .respond_with(shifts.clone())
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut daemon = daemon(&server, credential_store(&dir));
    daemon.startup(october_15(9, 0)).await;

    daemon.handle_signal(Signal::Login, october_15(9, 0)).await;
    daemon.handle_signal(Signal::Sleep, october_15(13, 0)).await;

    let events = daemon.handle_signal(Signal::Wake, october_15(14, 0)).await;
    assert_eq!(
        events[0],
        CoreEvent::ClockedIn {
            signal: Signal::Wake,
            at: "14:00".into()
        }
    );
    assert_eq!(
        daemon.engine().status().displayable_text,
        "Status: Clocked in: 14:00 (8h 0m left)"
    );

    // The afternoon shift is open, so a second wake-up writes nothing
    let events = daemon.handle_signal(Signal::Wake, october_15(15, 0)).await;
    assert_eq!(
        events[0],
        CoreEvent::AlreadyClockedIn {
            signal: Signal::Wake,
            since: Some("14:00".into())
        }
    );

    let events = daemon.handle_signal(Signal::Sleep, october_15(18, 0)).await;
    assert_eq!(
        events[0],
        CoreEvent::ClockedOut {
            signal: Signal::Sleep,
            at: "18:00".into()
        }
    );
    assert_eq!(
        daemon.engine().status().displayable_text,
        "Status: Clocked: 14:00 - 18:00"
    );

    let recorded = shifts.0.lock().unwrap().clone();
    assert_eq!(recorded.len(), 2);
    assert!(recorded.iter().all(|s| !s["clock_out"].is_null()));
}

#[tokio::test]
async fn non_working_day_writes_nothing() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_calendar(&server, false).await;
    mount_shifts(&server, &Shifts::default()).await;
    Mock::given(method("POST"))
        .and(path(CLOCK_IN))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut daemon = daemon(&server, credential_store(&dir));
    daemon.startup(october_15(9, 0)).await;

    let handled = daemon
        .handle_command(
            &ClientId::new(),
            ClientRole::Owner,
            Command::Signal {
                signal: Signal::Wake,
            },
            october_15(9, 0),
        )
        .await;

    match handled.response.unwrap() {
        ResponsePayload::SignalHandled { outcome, .. } => assert_eq!(
            outcome,
            ReconcileOutcome::NotWorkingDay {
                reason: "Non-working day: Wednesday".into()
            }
        ),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn rejected_login_then_new_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/sign_in"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<meta name="csrf-token" content="tok">"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/sign_in"))
        .and(body_string_contains("hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="flash flash--wrong">Invalid email or password.</div>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/sign_in"))
        .and(body_string_contains("correct-horse"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/attendance/periods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"year": 2025, "month": 10, "id": 42, "employee_id": 7}
        ])))
        .mount(&server)
        .await;
    mount_calendar(&server, true).await;
    mount_shifts(&server, &Shifts::default()).await;

    let dir = tempfile::tempdir().unwrap();
    let store = credential_store(&dir);
    let mut daemon = daemon(&server, store.clone());

    let events = daemon.startup(october_15(9, 0)).await;
    assert!(matches!(events[0], CoreEvent::LoginFailed { .. }));
    assert!(!daemon.engine().is_logged_in());
    assert_eq!(
        daemon.engine().status().displayable_text,
        "Status: Not connected"
    );

    let handled = daemon
        .handle_command(
            &ClientId::new(),
            ClientRole::Owner,
            Command::SetCredentials {
                email: "me@example.com".into(),
                password: Secret::new("correct-horse"),
            },
            october_15(9, 5),
        )
        .await;

    assert!(matches!(
        handled.response,
        Ok(ResponsePayload::LoggedIn { .. })
    ));
    assert!(daemon.engine().is_logged_in());
    assert_eq!(
        store.get_password("me@example.com").as_deref(),
        Some("correct-horse")
    );
}

#[tokio::test]
async fn repeated_wakeups_clock_in_once() {
    let mut daemon = Daemon::new(
        AttendanceEngine::new(MockAttendanceApi::logged_in(), 8),
        Arc::new(MemoryCredentialStore::new()),
    );

    let source = ScriptedEventSource::new(vec![
        Signal::Login,
        Signal::Wake,
        Signal::Sleep,
        Signal::Sleep,
        Signal::Wake,
        Signal::Login,
    ]);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    source.run(tx).await.unwrap();

    let mut minute = 0;
    while let Some(signal) = rx.recv().await {
        minute += 1;
        daemon.handle_signal(signal, october_15(9, minute)).await;
    }

    let api = daemon.engine().api();
    // Login, then Wake after the Sleep closed the shift
    assert_eq!(api.clock_in_calls, 2);
    assert_eq!(api.clock_out_calls, 1);
}

#[test]
fn config_drives_session_settings() {
    let settings = parse_config(
        r#"
        config_version = 1

        [service]
        base_url = "https://hr.example.com/"
        request_timeout_seconds = 10

        [workday]
        hours = 7

        [schedule]
        refresh_interval_seconds = 30
        login_delay_seconds = 5
        "#,
    )
    .unwrap();

    assert_eq!(settings.workday_hours, 7);
    assert_eq!(settings.service.request_timeout, Some(Duration::from_secs(10)));
    assert_eq!(settings.schedule.refresh_interval, Duration::from_secs(30));
    assert_eq!(settings.schedule.login_delay, Duration::from_secs(5));
}
