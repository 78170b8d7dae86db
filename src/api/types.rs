/// Wire types for the SafeVision backend REST API.
///
/// Field names follow the backend's JSON exactly (`detectedClass` is the one
/// camelCase key). Every record is transient: it lives for one render pass
/// and is never persisted locally.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Severity / threat level
// ---------------------------------------------------------------------------

/// Severity of a single alert record.
///
/// The backend emits `"High"`/`"Medium"`/`"Low"`; older builds emit the
/// upper-case form. Both are accepted, anything else is a malformed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parse a severity name, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Lower-case class name used for styling (`"high"`, ...).
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Title-case form the backend expects in request bodies.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown severity: {raw}")))
    }
}

/// Overall threat level reported by `/api/stats`.
///
/// Anything that is not exactly `HIGH` or `MEDIUM` counts as low.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    /// Classify a raw level string. Matching is exact.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

// ---------------------------------------------------------------------------
// Alert records
// ---------------------------------------------------------------------------

/// Detection confidence. Current backends send a preformatted string
/// (`"97.0%"`, `"N/A"`); a bare number is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Score(f64),
    Label(String),
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score(value) => write!(f, "{value}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

/// A single alert record from `GET /api/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "detectedClass")]
    pub detected_class: String,
    pub severity: Severity,
    pub zone: String,
    pub description: String,
    pub confidence: Confidence,
}

impl Alert {
    /// Timestamp for display; a missing timestamp renders empty.
    pub fn timestamp_label(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Caption the backend uses for `last_detection` before anything is seen.
pub const NO_DETECTIONS_YET: &str = "No detections yet";

/// Dashboard statistics from `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_alerts: u64,
    pub last_detection: String,
    pub active_cameras: u64,
    /// Raw level string, displayed as-is. See [`ThreatLevel::classify`].
    pub threat_level: String,
    pub detection_accuracy: f64,
    pub threat_detections: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
}

impl Stats {
    pub fn level(&self) -> ThreatLevel {
        ThreatLevel::classify(&self.threat_level)
    }
}

// ---------------------------------------------------------------------------
// Command payloads
// ---------------------------------------------------------------------------

/// Actions accepted by `POST /api/control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    ToggleRecording,
    ToggleDetection,
    GetStatus,
}

/// Request body for `POST /api/control`.
#[derive(Debug, Serialize)]
pub struct ControlRequest {
    pub action: ControlAction,
}

/// Response to `toggle_recording`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordingAck {
    pub recording_active: bool,
}

/// Response to `toggle_detection`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DetectionAck {
    pub detection_active: bool,
}

/// Response to `get_status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlStatus {
    pub detection_active: bool,
    pub recording_active: bool,
    pub threat_level: String,
}

/// Response from `GET /api/snapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotResult {
    pub success: bool,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Response from `POST /api/clear_alerts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClearResult {
    pub success: bool,
    #[serde(default)]
    pub deleted: Option<u64>,
}

/// `status` value the backend reports for a working camera.
pub const CAMERA_CONNECTED: &str = "connected";

/// Response from `GET /api/camera_status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CameraStatus {
    pub status: String,
    pub message: String,
}

impl CameraStatus {
    /// True when the backend has an open capture device.
    pub fn is_connected(&self) -> bool {
        self.status == CAMERA_CONNECTED
    }
}

/// Request body for `POST /api/trigger_alert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
}

impl TriggerRequest {
    pub fn new(kind: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: kind.into(),
            severity: severity.wire_name().to_string(),
        }
    }
}

/// Response from `POST /api/trigger_alert`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_parses_backend_shape() {
        let json = r#"{
            "id": "ALT-007",
            "timestamp": "2025-01-02 10:11:12",
            "detectedClass": "Weapon",
            "severity": "High",
            "zone": "Zone 1",
            "description": "Weapon detected with 91.20% confidence",
            "confidence": "91.2%"
        }"#;
        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.id, "ALT-007");
        assert_eq!(alert.detected_class, "Weapon");
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.confidence.to_string(), "91.2%");
    }

    #[test]
    fn alert_accepts_numeric_confidence_and_null_timestamp() {
        let json = r#"{"id":"a","timestamp":null,"detectedClass":"person",
            "severity":"LOW","zone":"z","description":"d","confidence":88.5}"#;
        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.timestamp_label(), "");
        assert_eq!(alert.confidence, Confidence::Score(88.5));
        assert_eq!(alert.severity, Severity::Low);
    }

    #[test]
    fn unknown_severity_is_malformed() {
        let json = r#"{"id":"a","detectedClass":"x","severity":"Critical",
            "zone":"z","description":"d","confidence":"1%"}"#;
        assert!(serde_json::from_str::<Alert>(json).is_err());
    }

    #[test]
    fn threat_level_classification_is_exact() {
        assert_eq!(ThreatLevel::classify("HIGH"), ThreatLevel::High);
        assert_eq!(ThreatLevel::classify("MEDIUM"), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::classify("LOW"), ThreatLevel::Low);
        assert_eq!(ThreatLevel::classify("high"), ThreatLevel::Low);
        assert_eq!(ThreatLevel::classify(""), ThreatLevel::Low);
    }

    #[test]
    fn control_request_serializes_snake_case_action() {
        let body = ControlRequest {
            action: ControlAction::ToggleRecording,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"action":"toggle_recording"}"#
        );
    }

    #[test]
    fn trigger_request_uses_type_key() {
        let body = TriggerRequest::new("Test Alert", Severity::High);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "Test Alert");
        assert_eq!(json["severity"], "High");
    }

    #[test]
    fn camera_connected_only_for_connected_status() {
        let up: CameraStatus =
            serde_json::from_str(r#"{"status":"connected","message":"Camera is working"}"#)
                .unwrap();
        assert!(up.is_connected());

        let down: CameraStatus = serde_json::from_str(
            r#"{"status":"disconnected","message":"Camera not available"}"#,
        )
        .unwrap();
        assert!(!down.is_connected());

        let odd = CameraStatus {
            status: "online".to_string(),
            message: String::new(),
        };
        assert!(!odd.is_connected());
    }

    #[test]
    fn stats_uptime_is_optional() {
        let json = r#"{"total_alerts":0,"last_detection":"No detections yet",
            "active_cameras":0,"threat_level":"LOW","detection_accuracy":94.7,
            "threat_detections":0}"#;
        let stats: Stats = serde_json::from_str(json).unwrap();
        assert!(stats.uptime.is_none());
        assert_eq!(stats.level(), ThreatLevel::Low);
    }
}
