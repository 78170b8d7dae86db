//! UI binding for the dashboard page.
//!
//! The controller only ever talks to a [`UiBinding`]. [`Page`] is the
//! in-memory display model every binding keeps; [`console::ConsoleUi`] draws
//! it to a terminal.

pub mod console;

use std::collections::BTreeMap;

use crate::api::Alert;
use crate::dashboard::view::{AlertFilter, AlertHistory, DetectionView, RecordingView};

pub use console::ConsoleUi;

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// Addressable single-value elements of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    RecordButton,
    RecordStatus,
    DetectionButton,
    DetectionBadge,
    TotalAlerts,
    LastDetection,
    ActiveCameras,
    ThreatLevel,
    DetectionAccuracy,
    ObjectsDetected,
    Uptime,
    AlertsCaption,
    DetectionCaption,
    CameraCaption,
    /// Shown while the threat level is HIGH.
    ThreatAlert,
    /// Raised when the level turns HIGH, dismissed by acknowledging it.
    DangerBanner,
}

impl Element {
    /// Stable identifier, matching the element ids of the web page.
    pub fn id(self) -> &'static str {
        match self {
            Self::RecordButton => "record-btn",
            Self::RecordStatus => "record-status",
            Self::DetectionButton => "detection-btn",
            Self::DetectionBadge => "ai-detection-badge",
            Self::TotalAlerts => "total-alerts",
            Self::LastDetection => "last-detection",
            Self::ActiveCameras => "active-cameras",
            Self::ThreatLevel => "threat-level",
            Self::DetectionAccuracy => "detection-accuracy",
            Self::ObjectsDetected => "objects-detected",
            Self::Uptime => "uptime",
            Self::AlertsCaption => "alerts-desc",
            Self::DetectionCaption => "detection-desc",
            Self::CameraCaption => "camera-status",
            Self::ThreatAlert => "threat-alert",
            Self::DangerBanner => "danger-banner",
        }
    }
}

// ---------------------------------------------------------------------------
// Binding capability
// ---------------------------------------------------------------------------

/// Everything the controller may do to the page.
pub trait UiBinding {
    fn set_text(&mut self, element: Element, text: &str);
    fn set_class(&mut self, element: Element, class: &str);
    fn set_visible(&mut self, element: Element, visible: bool);
    fn render_recent_alerts(&mut self, alerts: &[Alert]);
    fn render_alert_history(&mut self, history: AlertHistory);
    /// Current search text and severity selector.
    fn alert_filter(&self) -> AlertFilter;
    /// Blocking, user-visible notice.
    fn notify(&mut self, message: &str);
    /// Blocking yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, prompt: &str) -> bool;
}

// ---------------------------------------------------------------------------
// Display model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementState {
    pub text: String,
    pub class: String,
    pub visible: bool,
}

/// In-memory page: element states plus the two alert panels.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    elements: BTreeMap<Element, ElementState>,
    recent: Vec<Alert>,
    history: AlertHistory,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// A page as first served: recording and detection on, stats empty,
    /// banners hidden.
    pub fn new() -> Self {
        let mut page = Self {
            elements: BTreeMap::new(),
            recent: Vec::new(),
            history: AlertHistory::Pending,
        };

        let recording = RecordingView::for_state(true);
        page.set_text(Element::RecordButton, recording.button);
        page.set_class(Element::RecordButton, recording.button_class);
        page.set_text(Element::RecordStatus, recording.status);

        let detection = DetectionView::for_state(true);
        page.set_text(Element::DetectionButton, detection.button);
        page.set_text(Element::DetectionBadge, detection.badge);
        page.set_class(Element::DetectionBadge, detection.badge_class);

        page.set_text(Element::ThreatLevel, "LOW");
        page.set_class(Element::ThreatLevel, "stat-value green");
        page.set_visible(Element::ThreatAlert, false);
        page.set_visible(Element::DangerBanner, false);
        page
    }

    fn entry(&mut self, element: Element) -> &mut ElementState {
        self.elements.entry(element).or_insert_with(|| ElementState {
            visible: true,
            ..ElementState::default()
        })
    }

    pub fn set_text(&mut self, element: Element, text: &str) {
        self.entry(element).text = text.to_string();
    }

    pub fn set_class(&mut self, element: Element, class: &str) {
        self.entry(element).class = class.to_string();
    }

    pub fn set_visible(&mut self, element: Element, visible: bool) {
        self.entry(element).visible = visible;
    }

    pub fn set_recent(&mut self, alerts: &[Alert]) {
        self.recent = alerts.to_vec();
    }

    pub fn set_history(&mut self, history: AlertHistory) {
        self.history = history;
    }

    /// Text of an element; empty when never set.
    pub fn text(&self, element: Element) -> &str {
        self.elements
            .get(&element)
            .map(|state| state.text.as_str())
            .unwrap_or("")
    }

    pub fn class(&self, element: Element) -> &str {
        self.elements
            .get(&element)
            .map(|state| state.class.as_str())
            .unwrap_or("")
    }

    /// Elements never touched count as visible.
    pub fn is_visible(&self, element: Element) -> bool {
        self.elements
            .get(&element)
            .map(|state| state.visible)
            .unwrap_or(true)
    }

    pub fn recent(&self) -> &[Alert] {
        &self.recent
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
