//! Polling-and-render controller for the SafeVision dashboard.
//!
//! [`DashboardController`] turns user actions into backend requests, runs the
//! stats and alerts refresh cycles, and applies every reply to the page
//! through a [`UiBinding`]. Local flags only ever change from a backend
//! acknowledgement; nothing is toggled optimistically.
//!
//! Requests are fire-and-forget. Replies are applied by [`pump`], so the
//! owner of the page loop decides when state changes. No ordering guard
//! exists between a user-triggered fetch and a timer-triggered one: the
//! last reply applied wins.
//!
//! [`pump`]: DashboardController::pump

pub mod command;
pub mod dispatch;
pub mod schedule;
pub mod view;

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::api::{
    Alert, CameraStatus, ClearResult, ControlStatus, Reply, Request, Severity, SnapshotResult,
    Stats, ThreatLevel, TriggerRequest, TriggerResult,
};
use crate::config::DashConfig;
use crate::logging::RequestLog;
use crate::ui::{Element, UiBinding};

pub use command::Command;
pub use dispatch::{DispatchMode, Dispatcher};
pub use schedule::{Schedule, TaskKind};
use view::{DetectionView, RecordingView, StatsView, ThreatView};

/// Prompt shown before the destructive clear.
pub const CLEAR_CONFIRMATION: &str =
    "Are you sure you want to clear all alerts? This action cannot be undone.";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Backend-confirmed flags for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub is_recording: bool,
    pub detection_active: bool,
    pub threat_level: ThreatLevel,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            is_recording: true,
            detection_active: true,
            threat_level: ThreatLevel::Low,
        }
    }
}

/// Tunables taken from `[polling]` and `[display]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub stats_interval: Duration,
    pub alerts_interval: Duration,
    pub recent_alerts: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&DashConfig::default())
    }
}

impl ControllerOptions {
    pub fn from_config(config: &DashConfig) -> Self {
        Self {
            stats_interval: config.polling.stats_interval(),
            alerts_interval: config.polling.alerts_interval(),
            recent_alerts: config.display.recent_alerts,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct DashboardController<U: UiBinding> {
    ui: U,
    dispatcher: Dispatcher,
    schedule: Schedule,
    state: ControllerState,
    log: RequestLog,
    recent_limit: usize,
    destroyed: bool,
}

impl<U: UiBinding> DashboardController<U> {
    /// Build an idle controller. Nothing is requested and no timer runs
    /// until [`start`](Self::start).
    pub fn new(ui: U, dispatcher: Dispatcher, options: ControllerOptions, log: RequestLog) -> Self {
        Self {
            ui,
            dispatcher,
            schedule: Schedule::new(options.stats_interval, options.alerts_interval),
            state: ControllerState::default(),
            log,
            recent_limit: options.recent_alerts,
            destroyed: false,
        }
    }

    /// Start both refresh cycles and issue the initial load.
    pub fn start(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        self.schedule.start(now);
        self.sync_status();
        self.fetch_stats();
        self.fetch_alerts();
    }

    /// Stop both cycles. Replies still in flight are dropped when they land.
    pub fn destroy(&mut self) {
        self.schedule.stop();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Earliest moment [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.next_deadline()
    }

    // -- User actions --

    pub fn toggle_recording(&mut self) {
        self.issue(Request::ToggleRecording);
    }

    pub fn toggle_detection(&mut self) {
        self.issue(Request::ToggleDetection);
    }

    pub fn take_snapshot(&mut self) {
        self.issue(Request::Snapshot);
    }

    /// Clear every alert on the backend, after an explicit yes from the user.
    pub fn clear_alerts(&mut self) {
        if self.destroyed {
            return;
        }
        if !self.ui.confirm(CLEAR_CONFIRMATION) {
            return;
        }
        self.issue(Request::ClearAlerts);
    }

    /// Re-read recording/detection/threat state from the backend.
    pub fn sync_status(&mut self) {
        self.issue(Request::SyncStatus);
    }

    pub fn check_camera(&mut self) {
        self.issue(Request::CameraStatus);
    }

    pub fn trigger_alert(&mut self, kind: &str, severity: Severity) {
        self.issue(Request::TriggerAlert(TriggerRequest::new(kind, severity)));
    }

    /// Dismiss the danger banner. Local only.
    pub fn acknowledge_threat(&mut self) {
        if self.destroyed {
            return;
        }
        self.ui.set_visible(Element::DangerBanner, false);
    }

    /// The search or severity filter changed: fetch the list again.
    pub fn refilter(&mut self) {
        self.fetch_alerts();
    }

    // -- Refreshes --

    pub fn fetch_stats(&mut self) {
        self.issue(Request::Stats);
    }

    pub fn fetch_alerts(&mut self) {
        self.issue(Request::Alerts);
    }

    /// Fire any refresh cycle due at `now`.
    pub fn tick(&mut self, now: Instant) {
        for task in self.schedule.due(now) {
            match task {
                TaskKind::Stats => self.fetch_stats(),
                TaskKind::Alerts => self.fetch_alerts(),
            }
        }
    }

    /// Apply every reply that has arrived. Returns how many were drained.
    pub fn pump(&mut self) -> usize {
        let mut drained = 0;
        while let Some(reply) = self.dispatcher.try_next() {
            self.apply(reply);
            drained += 1;
        }
        drained
    }

    /// Wait up to `timeout` for one reply and apply it, plus anything else
    /// that is ready. Returns how many were applied.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.dispatcher.next_timeout(timeout) {
            Some(reply) => {
                self.apply(reply);
                1 + self.pump()
            }
            None => 0,
        }
    }

    /// Pump until nothing is in flight or `timeout` elapses.
    pub fn settle(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.dispatcher.in_flight() > 0 {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.pump_timeout(deadline - now);
        }
    }

    fn issue(&mut self, request: Request) {
        if self.destroyed {
            return;
        }
        self.dispatcher.submit(request);
    }

    // -- Reply handling --

    /// Apply one reply to state and page. Replies after teardown are no-ops.
    pub fn apply(&mut self, reply: Reply) {
        if self.destroyed {
            return;
        }

        let name = reply.name();
        match reply {
            Reply::Recording(result) => match result {
                Ok(ack) => {
                    let detail = format!("recording_active={}", ack.recording_active);
                    self.log.success(name, Some(detail));
                    self.state.is_recording = ack.recording_active;
                    self.render_recording();
                }
                Err(err) => self.log.failure(name, &err),
            },
            Reply::Detection(result) => match result {
                Ok(ack) => {
                    let detail = format!("detection_active={}", ack.detection_active);
                    self.log.success(name, Some(detail));
                    self.state.detection_active = ack.detection_active;
                    self.render_detection();
                }
                Err(err) => self.log.failure(name, &err),
            },
            Reply::Status(result) => self.on_status(name, result),
            Reply::Snapshot(result) => self.on_snapshot(name, result),
            Reply::Cleared(result) => self.on_cleared(name, result),
            Reply::Stats(result) => match result {
                Ok(stats) => self.render_stats(&stats),
                Err(err) => self.log.failure(name, &err),
            },
            Reply::Alerts(result) => match result {
                Ok(alerts) => self.render_alerts(&alerts),
                Err(err) => self.log.failure(name, &err),
            },
            Reply::Camera(result) => self.on_camera(name, result),
            Reply::Triggered(result) => self.on_triggered(name, result),
        }
    }

    fn on_status(&mut self, name: &str, result: Result<ControlStatus>) {
        match result {
            Ok(status) => {
                let detail = format!(
                    "recording_active={} detection_active={}",
                    status.recording_active, status.detection_active
                );
                self.log.success(name, Some(detail));
                self.state.is_recording = status.recording_active;
                self.state.detection_active = status.detection_active;
                self.render_recording();
                self.render_detection();
                self.render_threat(&ThreatView::for_level(&status.threat_level));
            }
            Err(err) => self.log.failure(name, &err),
        }
    }

    fn on_snapshot(&mut self, name: &str, result: Result<SnapshotResult>) {
        match result {
            Ok(snapshot) if snapshot.success => {
                let filename = snapshot.filename.unwrap_or_default();
                self.log.success(name, Some(filename.clone()));
                self.ui.notify(&format!("Snapshot saved: {filename}"));
            }
            Ok(_) => {
                self.log.failure(name, &anyhow::anyhow!("backend reported success=false"));
                self.ui.notify("Failed to take snapshot");
            }
            Err(err) => {
                self.log.failure(name, &err);
                self.ui.notify("Error taking snapshot");
            }
        }
    }

    fn on_cleared(&mut self, name: &str, result: Result<ClearResult>) {
        match result {
            Ok(cleared) if cleared.success => {
                self.log.success(name, cleared.deleted.map(|n| format!("deleted={n}")));
                self.ui.notify("All alerts cleared successfully");
                self.fetch_alerts();
                self.fetch_stats();
            }
            Ok(_) => {
                self.log.failure(name, &anyhow::anyhow!("backend reported success=false"));
                self.ui.notify("Failed to clear alerts");
            }
            Err(err) => {
                self.log.failure(name, &err);
                self.ui.notify("Error clearing alerts");
            }
        }
    }

    fn on_camera(&mut self, name: &str, result: Result<CameraStatus>) {
        match result {
            Ok(camera) => {
                self.log.success(name, Some(camera.status.clone()));
                self.ui
                    .notify(&format!("Camera {}: {}", camera.status, camera.message));
            }
            Err(err) => {
                self.log.failure(name, &err);
                self.ui.notify("Error checking camera");
            }
        }
    }

    fn on_triggered(&mut self, name: &str, result: Result<TriggerResult>) {
        match result {
            Ok(TriggerResult {
                success: true,
                message,
            }) => {
                let message = message.unwrap_or_else(|| "Alert triggered".to_string());
                self.log.success(name, Some(message.clone()));
                self.ui.notify(&message);
                self.fetch_alerts();
                self.fetch_stats();
            }
            Ok(TriggerResult { message, .. }) => {
                let message = message.unwrap_or_else(|| "Failed to trigger alert".to_string());
                self.log.failure(name, &anyhow::anyhow!("{message}"));
                self.ui.notify(&message);
            }
            Err(err) => {
                self.log.failure(name, &err);
                self.ui.notify("Failed to trigger alert");
            }
        }
    }

    // -- Rendering --

    fn render_recording(&mut self) {
        let view = RecordingView::for_state(self.state.is_recording);
        self.ui.set_text(Element::RecordButton, view.button);
        self.ui.set_class(Element::RecordButton, view.button_class);
        self.ui.set_text(Element::RecordStatus, view.status);
    }

    fn render_detection(&mut self) {
        let view = DetectionView::for_state(self.state.detection_active);
        self.ui.set_text(Element::DetectionButton, view.button);
        self.ui.set_text(Element::DetectionBadge, view.badge);
        self.ui.set_class(Element::DetectionBadge, view.badge_class);
    }

    /// Threat text, color, banners and confirmed threat state.
    ///
    /// The danger banner is raised only when the level turns HIGH, so an
    /// acknowledged banner stays down while the level remains HIGH.
    fn render_threat(&mut self, threat: &ThreatView) {
        let was_high = self.state.threat_level == ThreatLevel::High;
        self.state.threat_level = threat.level;

        self.ui.set_text(Element::ThreatLevel, &threat.text);
        self.ui.set_class(Element::ThreatLevel, &threat.class);
        self.ui.set_visible(Element::ThreatAlert, threat.banner);

        if !threat.banner {
            self.ui.set_visible(Element::DangerBanner, false);
        } else if !was_high {
            self.ui.set_visible(Element::DangerBanner, true);
        }
    }

    fn render_stats(&mut self, stats: &Stats) {
        let view = StatsView::from_stats(stats);
        for (element, text) in &view.texts {
            self.ui.set_text(*element, text);
        }
        self.render_threat(&view.threat);
    }

    fn render_alerts(&mut self, alerts: &[Alert]) {
        self.ui
            .render_recent_alerts(view::recent_alerts(alerts, self.recent_limit));
        let filter = self.ui.alert_filter();
        self.ui
            .render_alert_history(view::alert_history(alerts, &filter));
    }
}
