/// HTTP client for the SafeVision backend.
///
/// Uses a shared synchronous `ureq` agent. `ureq` reports non-2xx statuses as
/// errors, so every failure mode ends up in the same `anyhow::Error` with the
/// endpoint named in its context.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Backend;
use super::types::{
    Alert, CameraStatus, ClearResult, ControlAction, ControlRequest, ControlStatus, DetectionAck,
    RecordingAck, SnapshotResult, Stats, TriggerRequest, TriggerResult,
};
use crate::config::BackendConfig;

/// Synchronous backend client.
///
/// Cheap to share: the underlying agent is reference counted and safe to use
/// from the dispatcher's worker threads.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Build a client from the resolved `[backend]` config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.url, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: normalize_base_url(base_url),
            timeout,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .agent
            .get(&self.url(path))
            .call()
            .with_context(|| format!("GET {path} failed"))?;
        resp.into_json()
            .with_context(|| format!("failed to parse GET {path} response"))
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self
            .agent
            .post(&self.url(path))
            .send_json(body)
            .with_context(|| format!("POST {path} failed"))?;
        resp.into_json()
            .with_context(|| format!("failed to parse POST {path} response"))
    }

    fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .agent
            .post(&self.url(path))
            .call()
            .with_context(|| format!("POST {path} failed"))?;
        resp.into_json()
            .with_context(|| format!("failed to parse POST {path} response"))
    }

    fn control<T: DeserializeOwned>(&self, action: ControlAction) -> Result<T> {
        self.post_json("/api/control", &ControlRequest { action })
    }
}

impl Backend for HttpBackend {
    fn toggle_recording(&self) -> Result<RecordingAck> {
        self.control(ControlAction::ToggleRecording)
    }

    fn toggle_detection(&self) -> Result<DetectionAck> {
        self.control(ControlAction::ToggleDetection)
    }

    fn control_status(&self) -> Result<ControlStatus> {
        self.control(ControlAction::GetStatus)
    }

    fn snapshot(&self) -> Result<SnapshotResult> {
        self.get_json("/api/snapshot")
    }

    fn clear_alerts(&self) -> Result<ClearResult> {
        self.post_empty("/api/clear_alerts")
    }

    fn stats(&self) -> Result<Stats> {
        self.get_json("/api/stats")
    }

    fn alerts(&self) -> Result<Vec<Alert>> {
        self.get_json("/api/alerts")
    }

    fn camera_status(&self) -> Result<CameraStatus> {
        self.get_json("/api/camera_status")
    }

    fn trigger_alert(&self, request: &TriggerRequest) -> Result<TriggerResult> {
        self.post_json("/api/trigger_alert", request)
    }
}

/// Strip trailing slashes and pin `localhost` to IPv4.
///
/// On some platforms "localhost" resolves to `::1` first, which stalls
/// every request when the backend only binds IPv4.
fn normalize_base_url(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('/')
        .replace("://localhost", "://127.0.0.1")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
