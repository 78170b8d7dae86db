/// Integration tests for the HTTP backend client.
///
/// Each test starts a `tiny_http` server on an ephemeral port that answers
/// like the SafeVision backend, then drives `HttpBackend` (and, in one case,
/// the full controller) against it.
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use safevision::api::{Backend, HttpBackend, Severity, TriggerRequest};
use safevision::dashboard::view::AlertHistory;
use safevision::dashboard::{ControllerOptions, DashboardController, Dispatcher};
use safevision::logging::RequestLog;
use safevision::ui::console::Input;
use safevision::ui::{ConsoleUi, Element, UiBinding};
use tiny_http::{Header, Method, Response, Server};

/// One request as seen by the mock server.
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    url: String,
    body: String,
}

type Handler = fn(&Method, &str, &str) -> (u16, String);

struct MockBackend {
    server: Arc<Server>,
    url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockBackend {
    fn start(handler: Handler) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let worker = Arc::clone(&server);
        let log = Arc::clone(&seen);
        thread::spawn(move || {
            for mut request in worker.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let method = request.method().clone();
                let url = request.url().to_string();
                log.lock().unwrap().push(Seen {
                    method: method.to_string(),
                    url: url.clone(),
                    body: body.clone(),
                });

                let (status, payload) = handler(&method, &url, &body);
                let header =
                    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap();
                let response = Response::from_string(payload)
                    .with_header(header)
                    .with_status_code(status);
                let _ = request.respond(response);
            }
        });

        Self {
            server,
            url: format!("http://{addr}"),
            seen,
        }
    }

    fn client(&self) -> HttpBackend {
        HttpBackend::new(&self.url, Duration::from_secs(5))
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Answers like a healthy SafeVision backend.
fn healthy(method: &Method, url: &str, body: &str) -> (u16, String) {
    let json = match (method, url) {
        (Method::Post, "/api/control") => {
            let request: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
            match request["action"].as_str() {
                Some("toggle_recording") => r#"{"recording_active": false}"#.to_string(),
                Some("toggle_detection") => r#"{"detection_active": false}"#.to_string(),
                Some("get_status") => r#"{"detection_active": true, "recording_active": false,
                    "threat_level": "MEDIUM"}"#
                    .to_string(),
                _ => return (400, r#"{"error": "Invalid action"}"#.to_string()),
            }
        }
        (Method::Get, "/api/snapshot") => {
            r#"{"success": true, "filename": "snapshot_20261017_081500.jpg"}"#.to_string()
        }
        (Method::Post, "/api/clear_alerts") => r#"{"success": true, "deleted": 4}"#.to_string(),
        (Method::Get, "/api/stats") => r#"{
            "total_alerts": 4,
            "last_detection": "08:14:59",
            "active_cameras": 1,
            "threat_level": "HIGH",
            "detection_accuracy": 94.7,
            "threat_detections": 2,
            "uptime": "01:02:03"
        }"#
        .to_string(),
        (Method::Get, "/api/alerts") => r#"[
            {"id": "ALT-0004", "timestamp": "2026-10-17 08:14:59", "detectedClass": "knife",
             "severity": "High", "zone": "Zone A", "description": "Weapon detected",
             "confidence": "97.0%"},
            {"id": "ALT-0003", "timestamp": null, "detectedClass": "person",
             "severity": "Medium", "zone": "Zone B", "description": "Person detected",
             "confidence": "N/A"},
            {"id": "ALT-0002", "timestamp": "2026-10-17 08:10:00", "detectedClass": "car",
             "severity": "LOW", "zone": "Zone C", "description": "Vehicle detected",
             "confidence": 0.81}
        ]"#
        .to_string(),
        (Method::Get, "/api/camera_status") => {
            r#"{"status": "connected", "message": "Camera is working"}"#.to_string()
        }
        (Method::Post, "/api/trigger_alert") => {
            r#"{"success": true, "message": "Test alert triggered successfully"}"#.to_string()
        }
        _ => return (404, r#"{"error": "not found"}"#.to_string()),
    };
    (200, json)
}

/// Every endpoint fails or answers nonsense.
fn broken(_method: &Method, url: &str, _body: &str) -> (u16, String) {
    match url {
        "/api/stats" => (200, r#"{"total_alerts": "many"}"#.to_string()),
        "/api/alerts" => (200, "<html>oops</html>".to_string()),
        _ => (500, r#"{"error": "internal"}"#.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[test]
fn control_actions_post_expected_bodies() {
    let mock = MockBackend::start(healthy);
    let client = mock.client();

    assert!(!client.toggle_recording().unwrap().recording_active);
    assert!(!client.toggle_detection().unwrap().detection_active);
    let status = client.control_status().unwrap();
    assert!(status.detection_active);
    assert!(!status.recording_active);
    assert_eq!(status.threat_level, "MEDIUM");

    let seen = mock.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|s| s.method == "POST" && s.url == "/api/control"));
    let actions: Vec<String> = seen
        .iter()
        .map(|s| {
            let body: serde_json::Value = serde_json::from_str(&s.body).unwrap();
            body["action"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(actions, ["toggle_recording", "toggle_detection", "get_status"]);
}

#[test]
fn stats_and_alerts_parse_backend_shapes() {
    let mock = MockBackend::start(healthy);
    let client = mock.client();

    let stats = client.stats().unwrap();
    assert_eq!(stats.total_alerts, 4);
    assert_eq!(stats.threat_level, "HIGH");
    assert_eq!(stats.uptime.as_deref(), Some("01:02:03"));

    let alerts = client.alerts().unwrap();
    assert_eq!(alerts.len(), 3);
    assert_eq!(alerts[0].severity, Severity::High);
    assert_eq!(alerts[0].confidence.to_string(), "97.0%");
    assert_eq!(alerts[1].timestamp_label(), "");
    assert_eq!(alerts[2].severity, Severity::Low);
    assert_eq!(alerts[2].confidence.to_string(), "0.81");
}

#[test]
fn snapshot_clear_camera_and_trigger() {
    let mock = MockBackend::start(healthy);
    let client = mock.client();

    let snapshot = client.snapshot().unwrap();
    assert!(snapshot.success);
    assert_eq!(
        snapshot.filename.as_deref(),
        Some("snapshot_20261017_081500.jpg")
    );

    let cleared = client.clear_alerts().unwrap();
    assert!(cleared.success);
    assert_eq!(cleared.deleted, Some(4));

    let camera = client.camera_status().unwrap();
    assert_eq!(camera.status, "connected");
    assert!(camera.is_connected());

    let triggered = client
        .trigger_alert(&TriggerRequest::new("Fence breach", Severity::Medium))
        .unwrap();
    assert!(triggered.success);

    let seen = mock.seen();
    let clear = seen.iter().find(|s| s.url == "/api/clear_alerts").unwrap();
    assert_eq!(clear.method, "POST");
    assert!(clear.body.is_empty());

    let trigger = seen.iter().find(|s| s.url == "/api/trigger_alert").unwrap();
    let body: serde_json::Value = serde_json::from_str(&trigger.body).unwrap();
    assert_eq!(body["type"], "Fence breach");
    assert_eq!(body["severity"], "Medium");
}

#[test]
fn bad_status_and_bad_shapes_are_errors() {
    let mock = MockBackend::start(broken);
    let client = mock.client();

    assert!(client.toggle_recording().is_err());
    assert!(client.snapshot().is_err());

    let err = client.stats().unwrap_err();
    assert!(format!("{err:#}").contains("/api/stats"));
    assert!(client.alerts().is_err());
}

// ---------------------------------------------------------------------------
// Controller over HTTP
// ---------------------------------------------------------------------------

#[test]
fn controller_start_renders_live_backend() {
    let mock = MockBackend::start(healthy);
    let dir = tempfile::tempdir().unwrap();
    let log = RequestLog::at(dir.path().join("requests.jsonl"));

    let ui = ConsoleUi::new(Input::AssumeYes, Default::default());
    let mut controller = DashboardController::new(
        ui,
        Dispatcher::threaded(Arc::new(mock.client())),
        ControllerOptions::default(),
        log.clone(),
    );

    controller.start(std::time::Instant::now());
    controller.settle(Duration::from_secs(10));

    let page = controller.ui().page();
    assert_eq!(page.text(Element::ThreatLevel), "HIGH");
    assert_eq!(page.class(Element::ThreatLevel), "stat-value red");
    assert_eq!(page.text(Element::DetectionAccuracy), "94.7%");
    assert_eq!(page.text(Element::Uptime), "01:02:03");
    assert_eq!(page.text(Element::RecordButton), "Start Recording");
    assert_eq!(page.recent().len(), 3);
    assert!(matches!(page.history(), AlertHistory::Rows(rows) if rows.len() == 3));
    assert!(controller.ui().alert_filter().search.is_empty());

    controller.clear_alerts();
    controller.settle(Duration::from_secs(10));
    assert_eq!(
        controller.ui().last_notice(),
        Some("All alerts cleared successfully")
    );
    assert!(log.read_all().iter().any(|e| e.request == "clear_alerts"));
}
