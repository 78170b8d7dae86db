//! Backend access for the dashboard.
//!
//! The controller never talks HTTP directly. It builds a [`Request`], the
//! dispatcher runs it against a [`Backend`] and hands back a [`Reply`].
//! Transport failures, non-2xx statuses and malformed bodies all surface as
//! the same `anyhow::Error`; callers never need to tell them apart.

pub mod client;
pub mod types;

use anyhow::Result;

pub use client::HttpBackend;
pub use types::{
    Alert, CAMERA_CONNECTED, CameraStatus, ClearResult, ControlAction, ControlStatus, DetectionAck, RecordingAck,
    Severity, SnapshotResult, Stats, ThreatLevel, TriggerRequest, TriggerResult,
};

// ---------------------------------------------------------------------------
// Backend capability
// ---------------------------------------------------------------------------

/// The REST surface the dashboard consumes.
///
/// Implementations must be shareable across the dispatcher's worker threads.
pub trait Backend: Send + Sync {
    fn toggle_recording(&self) -> Result<RecordingAck>;
    fn toggle_detection(&self) -> Result<DetectionAck>;
    fn control_status(&self) -> Result<ControlStatus>;
    fn snapshot(&self) -> Result<SnapshotResult>;
    fn clear_alerts(&self) -> Result<ClearResult>;
    fn stats(&self) -> Result<Stats>;
    fn alerts(&self) -> Result<Vec<Alert>>;
    fn camera_status(&self) -> Result<CameraStatus>;
    fn trigger_alert(&self, request: &TriggerRequest) -> Result<TriggerResult>;
}

// ---------------------------------------------------------------------------
// Request / reply pair
// ---------------------------------------------------------------------------

/// One backend call, as issued by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ToggleRecording,
    ToggleDetection,
    SyncStatus,
    Snapshot,
    ClearAlerts,
    Stats,
    Alerts,
    CameraStatus,
    TriggerAlert(TriggerRequest),
}

impl Request {
    /// Short stable name for log entries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleRecording => "toggle_recording",
            Self::ToggleDetection => "toggle_detection",
            Self::SyncStatus => "get_status",
            Self::Snapshot => "snapshot",
            Self::ClearAlerts => "clear_alerts",
            Self::Stats => "stats",
            Self::Alerts => "alerts",
            Self::CameraStatus => "camera_status",
            Self::TriggerAlert(_) => "trigger_alert",
        }
    }

    /// Run this request to completion against `backend`.
    pub fn execute(self, backend: &dyn Backend) -> Reply {
        match self {
            Self::ToggleRecording => Reply::Recording(backend.toggle_recording()),
            Self::ToggleDetection => Reply::Detection(backend.toggle_detection()),
            Self::SyncStatus => Reply::Status(backend.control_status()),
            Self::Snapshot => Reply::Snapshot(backend.snapshot()),
            Self::ClearAlerts => Reply::Cleared(backend.clear_alerts()),
            Self::Stats => Reply::Stats(backend.stats()),
            Self::Alerts => Reply::Alerts(backend.alerts()),
            Self::CameraStatus => Reply::Camera(backend.camera_status()),
            Self::TriggerAlert(body) => Reply::Triggered(backend.trigger_alert(&body)),
        }
    }

    /// The reply this request produces when it could not be executed at all.
    pub fn into_failure(self, error: anyhow::Error) -> Reply {
        match self {
            Self::ToggleRecording => Reply::Recording(Err(error)),
            Self::ToggleDetection => Reply::Detection(Err(error)),
            Self::SyncStatus => Reply::Status(Err(error)),
            Self::Snapshot => Reply::Snapshot(Err(error)),
            Self::ClearAlerts => Reply::Cleared(Err(error)),
            Self::Stats => Reply::Stats(Err(error)),
            Self::Alerts => Reply::Alerts(Err(error)),
            Self::CameraStatus => Reply::Camera(Err(error)),
            Self::TriggerAlert(_) => Reply::Triggered(Err(error)),
        }
    }
}

/// The outcome of one [`Request`].
#[derive(Debug)]
pub enum Reply {
    Recording(Result<RecordingAck>),
    Detection(Result<DetectionAck>),
    Status(Result<ControlStatus>),
    Snapshot(Result<SnapshotResult>),
    Cleared(Result<ClearResult>),
    Stats(Result<Stats>),
    Alerts(Result<Vec<Alert>>),
    Camera(Result<CameraStatus>),
    Triggered(Result<TriggerResult>),
}

impl Reply {
    /// Name of the request this reply answers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recording(_) => "toggle_recording",
            Self::Detection(_) => "toggle_detection",
            Self::Status(_) => "get_status",
            Self::Snapshot(_) => "snapshot",
            Self::Cleared(_) => "clear_alerts",
            Self::Stats(_) => "stats",
            Self::Alerts(_) => "alerts",
            Self::Camera(_) => "camera_status",
            Self::Triggered(_) => "trigger_alert",
        }
    }
}
