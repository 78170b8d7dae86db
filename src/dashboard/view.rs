/// Pure view rules for the dashboard.
///
/// Everything here maps backend payloads to display text and classes with no
/// side effects, so rendering the same payload twice always yields the same
/// page.
use crate::api::{Alert, Severity, Stats, ThreatLevel};
use crate::ui::Element;

/// Shown in the history panel when the backend has no alerts at all.
pub const NO_ALERTS_PLACEHOLDER: &str = "No alerts found";

/// Column headings of the alert history table.
pub const HISTORY_COLUMNS: [&str; 7] = [
    "Alert ID",
    "Timestamp",
    "Detection Type",
    "Severity",
    "Zone",
    "Description",
    "Confidence",
];

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Severity selector of the history table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeverityFilter {
    #[default]
    All,
    Only(Severity),
}

impl SeverityFilter {
    /// Parse `all` or a severity name (any case).
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        Severity::parse(raw).map(Self::Only)
    }

    pub fn admits(self, severity: Severity) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == severity,
        }
    }
}

impl std::fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(severity) => write!(f, "{severity}"),
        }
    }
}

/// Client-side filter applied to the fetched alert list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// Free-text query; empty matches everything.
    pub search: String,
    pub severity: SeverityFilter,
}

impl AlertFilter {
    pub fn new(search: impl Into<String>, severity: SeverityFilter) -> Self {
        Self {
            search: search.into(),
            severity,
        }
    }

    /// Case-insensitive substring match on detection type, description or id,
    /// combined with the severity selector.
    pub fn matches(&self, alert: &Alert) -> bool {
        let query = self.search.to_lowercase();
        let matches_search = alert.detected_class.to_lowercase().contains(&query)
            || alert.description.to_lowercase().contains(&query)
            || alert.id.to_lowercase().contains(&query);
        matches_search && self.severity.admits(alert.severity)
    }
}

// ---------------------------------------------------------------------------
// Alert panels
// ---------------------------------------------------------------------------

/// Content of the alert history panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AlertHistory {
    /// Nothing fetched yet.
    #[default]
    Pending,
    /// The backend returned no alerts at all.
    Placeholder,
    /// Filtered rows, in backend order. May be empty.
    Rows(Vec<Alert>),
}

/// Build the history panel for `alerts` under `filter`.
pub fn alert_history(alerts: &[Alert], filter: &AlertFilter) -> AlertHistory {
    if alerts.is_empty() {
        return AlertHistory::Placeholder;
    }
    AlertHistory::Rows(
        alerts
            .iter()
            .filter(|alert| filter.matches(alert))
            .cloned()
            .collect(),
    )
}

/// The most recent `limit` alerts. The backend sends newest first.
pub fn recent_alerts(alerts: &[Alert], limit: usize) -> &[Alert] {
    &alerts[..alerts.len().min(limit)]
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Color name for a threat level.
pub fn threat_color(level: ThreatLevel) -> &'static str {
    match level {
        ThreatLevel::High => "red",
        ThreatLevel::Medium => "orange",
        ThreatLevel::Low => "green",
    }
}

/// Full class of the threat-level stat.
pub fn threat_class(level: ThreatLevel) -> String {
    format!("stat-value {}", threat_color(level))
}

/// Threat indicator for one reported level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatView {
    pub level: ThreatLevel,
    /// Raw level string, displayed as-is.
    pub text: String,
    pub class: String,
    /// High-threat banner visibility.
    pub banner: bool,
}

impl ThreatView {
    pub fn for_level(raw: &str) -> Self {
        let level = ThreatLevel::classify(raw);
        Self {
            level,
            text: raw.to_string(),
            class: threat_class(level),
            banner: level == ThreatLevel::High,
        }
    }
}

/// Everything a stats payload changes on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    /// Text of each stat field and caption, threat level excluded.
    pub texts: Vec<(Element, String)>,
    pub threat: ThreatView,
}

impl StatsView {
    pub fn from_stats(stats: &Stats) -> Self {
        let alerts_caption = if stats.total_alerts > 0 {
            format!("+{} high priority", stats.threat_detections)
        } else {
            "No alerts yet".to_string()
        };
        let detection_caption = if stats.last_detection != crate::api::types::NO_DETECTIONS_YET {
            "Recent activity detected"
        } else {
            "System ready"
        };
        let camera_caption = if stats.active_cameras > 0 {
            "All systems operational"
        } else {
            "Camera offline"
        };

        let mut texts = vec![
            (Element::TotalAlerts, stats.total_alerts.to_string()),
            (Element::LastDetection, stats.last_detection.clone()),
            (Element::ActiveCameras, format!("{}/1", stats.active_cameras)),
            (
                Element::DetectionAccuracy,
                format!("{}%", stats.detection_accuracy),
            ),
            (Element::ObjectsDetected, stats.total_alerts.to_string()),
            (Element::AlertsCaption, alerts_caption),
            (Element::DetectionCaption, detection_caption.to_string()),
            (Element::CameraCaption, camera_caption.to_string()),
        ];
        if let Some(uptime) = &stats.uptime {
            texts.push((Element::Uptime, uptime.clone()));
        }

        Self {
            texts,
            threat: ThreatView::for_level(&stats.threat_level),
        }
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Record control texts for a confirmed recording state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingView {
    pub button: &'static str,
    pub button_class: &'static str,
    pub status: &'static str,
}

impl RecordingView {
    pub fn for_state(recording: bool) -> Self {
        if recording {
            Self {
                button: "Stop Recording",
                button_class: "destructive",
                status: "Recording",
            }
        } else {
            Self {
                button: "Start Recording",
                button_class: "",
                status: "Stopped",
            }
        }
    }
}

/// Detection control texts for a confirmed detection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionView {
    pub button: &'static str,
    pub badge: &'static str,
    pub badge_class: &'static str,
}

impl DetectionView {
    pub fn for_state(active: bool) -> Self {
        if active {
            Self {
                button: "Pause Detection",
                badge: "AI Detection: ACTIVE",
                badge_class: "badge green",
            }
        } else {
            Self {
                button: "Resume Detection",
                badge: "AI Detection: INACTIVE",
                badge_class: "badge outline",
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
