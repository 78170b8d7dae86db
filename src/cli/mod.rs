//! CLI command implementations for the SafeVision dashboard.
//!
//! Provides subcommand handlers for:
//! - `safevision stats` / `alerts`: one fetch, rendered as a table or JSON
//! - `safevision snapshot` / `clear` / `trigger`: one-shot dashboard actions
//! - `safevision control recording|detection|status`: control endpoint
//! - `safevision health`: backend, camera, config and log checks
//! - `safevision theme` / `log`: local preference and request log
//! - `safevision config show|init|set|reset`: configuration management

use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::{CameraStatus, Reply, Request, Severity, Stats, ThreatLevel};
use crate::app::AppContext;
use crate::config::{self, ConfigFile};
use crate::dashboard::view::{
    self, AlertFilter, AlertHistory, DetectionView, HISTORY_COLUMNS, NO_ALERTS_PLACEHOLDER,
    RecordingView, SeverityFilter, StatsView,
};
use crate::dashboard::{DashboardController, Dispatcher};
use crate::logging::Outcome;
use crate::ui::console::{Input, truncate};
use crate::ui::{ConsoleUi, Element};

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// What `safevision control` should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTarget {
    Recording,
    Detection,
    Status,
}

// ---------------------------------------------------------------------------
// safevision stats
// ---------------------------------------------------------------------------

/// Fetch `/api/stats` once and print it.
pub fn run_stats(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let stats = fetch(ctx, Request::Stats, |reply| match reply {
        Reply::Stats(result) => Some(result),
        _ => None,
    })?;

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Table => print_stats_table(&stats),
    }
    Ok(())
}

fn print_stats_table(stats: &Stats) {
    let rendered = StatsView::from_stats(stats);
    let text = |element: Element| {
        rendered
            .texts
            .iter()
            .find(|(el, _)| *el == element)
            .map(|(_, text)| text.as_str())
            .unwrap_or("")
    };

    println!("{}", "SafeVision Stats".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {} {:<12} {}",
        "Total alerts:    ".bold(),
        text(Element::TotalAlerts),
        text(Element::AlertsCaption).dimmed()
    );
    println!(
        "  {} {:<12} {}",
        "Last detection:  ".bold(),
        text(Element::LastDetection),
        text(Element::DetectionCaption).dimmed()
    );
    println!(
        "  {} {:<12} {}",
        "Active cameras:  ".bold(),
        text(Element::ActiveCameras),
        text(Element::CameraCaption).dimmed()
    );
    println!(
        "  {} {}",
        "Threat level:    ".bold(),
        colorize_threat(
            &rendered.threat.text,
            view::threat_color(rendered.threat.level)
        )
    );
    println!(
        "  {} {}",
        "Accuracy:        ".bold(),
        text(Element::DetectionAccuracy)
    );
    println!(
        "  {} {}",
        "Objects detected:".bold(),
        text(Element::ObjectsDetected)
    );
    if let Some(uptime) = &stats.uptime {
        println!("  {} {}", "Uptime:          ".bold(), uptime);
    }
    if rendered.threat.banner {
        println!();
        println!("  {}", "HIGH THREAT LEVEL DETECTED".red().bold());
    }
}

// ---------------------------------------------------------------------------
// safevision alerts
// ---------------------------------------------------------------------------

/// Fetch `/api/alerts` once and print the rows passing the filter.
pub fn run_alerts(
    ctx: &AppContext,
    search: &str,
    severity: &str,
    format: OutputFormat,
) -> Result<()> {
    let severity = SeverityFilter::parse(severity).with_context(|| {
        format!("unknown severity '{severity}' (expected all, low, medium or high)")
    })?;
    let filter = AlertFilter::new(search, severity);

    let alerts = fetch(ctx, Request::Alerts, |reply| match reply {
        Reply::Alerts(result) => Some(result),
        _ => None,
    })?;
    let history = view::alert_history(&alerts, &filter);

    match format {
        OutputFormat::Json => {
            let rows = match history {
                AlertHistory::Rows(rows) => rows,
                AlertHistory::Pending | AlertHistory::Placeholder => Vec::new(),
            };
            print_json(&rows)?;
        }
        OutputFormat::Table => print_alerts_table(&history),
    }
    Ok(())
}

fn print_alerts_table(history: &AlertHistory) {
    let rows = match history {
        AlertHistory::Rows(rows) => rows,
        AlertHistory::Pending | AlertHistory::Placeholder => {
            println!("{}", NO_ALERTS_PLACEHOLDER.yellow());
            return;
        }
    };

    let [id, ts, kind, severity, zone, description, confidence] = HISTORY_COLUMNS;
    println!(
        "  {:<10} {:<19} {:<16} {:<8} {:<12} {:<28} {}",
        id, ts, kind, severity, zone, description, confidence
    );
    println!("  {}", "-".repeat(104));

    for (i, alert) in rows.iter().enumerate() {
        let line = format!(
            "  {:<10} {:<19} {:<16} {:<8} {:<12} {:<28} {}",
            truncate(&alert.id, 10),
            truncate(alert.timestamp_label(), 19),
            truncate(&alert.detected_class, 16),
            colorize_severity(alert.severity),
            truncate(&alert.zone, 12),
            truncate(&alert.description, 28),
            alert.confidence,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
    println!();
    println!("  {}", format!("{} alert(s)", rows.len()).dimmed());
}

// ---------------------------------------------------------------------------
// safevision snapshot | clear | trigger
// ---------------------------------------------------------------------------

/// Take one snapshot through the dashboard controller.
pub fn run_snapshot(ctx: &AppContext) -> Result<()> {
    one_shot(ctx, Input::Stdin, |controller| controller.take_snapshot());
    Ok(())
}

/// Clear all alerts, asking first unless `assume_yes`.
pub fn run_clear(ctx: &AppContext, assume_yes: bool) -> Result<()> {
    let input = if assume_yes {
        Input::AssumeYes
    } else {
        Input::Stdin
    };
    one_shot(ctx, input, |controller| controller.clear_alerts());
    Ok(())
}

/// Raise a manual alert.
pub fn run_trigger(ctx: &AppContext, kind: &str, severity: &str) -> Result<()> {
    let severity = Severity::parse(severity)
        .with_context(|| format!("unknown severity '{severity}' (expected low, medium or high)"))?;
    one_shot(ctx, Input::Stdin, |controller| {
        controller.trigger_alert(kind, severity)
    });
    Ok(())
}

/// Run one controller action to completion on an inline dispatcher.
fn one_shot(
    ctx: &AppContext,
    input: Input,
    action: impl FnOnce(&mut DashboardController<ConsoleUi>),
) {
    let ui = ConsoleUi::new(input, ctx.theme);
    let mut controller = ctx.controller(ui, Dispatcher::inline(ctx.backend()));
    action(&mut controller);
    controller.settle(settle_timeout(ctx));
    controller.destroy();
}

fn settle_timeout(ctx: &AppContext) -> Duration {
    Duration::from_millis(ctx.config.backend.timeout_ms.saturating_mul(3))
}

// ---------------------------------------------------------------------------
// safevision control
// ---------------------------------------------------------------------------

/// Toggle recording or detection, or show the confirmed control state.
pub fn run_control(ctx: &AppContext, target: ControlTarget) -> Result<()> {
    match target {
        ControlTarget::Recording => {
            let ack = fetch(ctx, Request::ToggleRecording, |reply| match reply {
                Reply::Recording(result) => Some(result),
                _ => None,
            })?;
            let recording = RecordingView::for_state(ack.recording_active);
            println!(
                "{} {}  {}",
                "✓".green().bold(),
                recording.status.bold(),
                format!("[{}]", recording.button).dimmed()
            );
        }
        ControlTarget::Detection => {
            let ack = fetch(ctx, Request::ToggleDetection, |reply| match reply {
                Reply::Detection(result) => Some(result),
                _ => None,
            })?;
            let detection = DetectionView::for_state(ack.detection_active);
            println!(
                "{} {}  {}",
                "✓".green().bold(),
                detection.badge.bold(),
                format!("[{}]", detection.button).dimmed()
            );
        }
        ControlTarget::Status => {
            let status = fetch(ctx, Request::SyncStatus, |reply| match reply {
                Reply::Status(result) => Some(result),
                _ => None,
            })?;
            let recording = RecordingView::for_state(status.recording_active);
            let detection = DetectionView::for_state(status.detection_active);
            let level = ThreatLevel::classify(&status.threat_level);

            println!("{}", "SafeVision Control Status".bold().cyan());
            println!("{}", "=".repeat(40));
            println!("  {} {}", "Recording:   ".bold(), recording.status);
            println!("  {} {}", "Detection:   ".bold(), detection.badge);
            println!(
                "  {} {}",
                "Threat level:".bold(),
                colorize_threat(&status.threat_level, view::threat_color(level))
            );
        }
    }
    Ok(())
}

/// Execute one request synchronously and unwrap its reply.
///
/// Success of a user-requested call and every failure are logged.
fn fetch<T>(
    ctx: &AppContext,
    request: Request,
    extract: impl FnOnce(Reply) -> Option<Result<T>>,
) -> Result<T> {
    let name = request.name();
    let backend = ctx.backend();
    let reply = request.execute(backend.as_ref());
    let result = extract(reply).with_context(|| format!("unexpected reply to {name}"))?;

    match result {
        Ok(value) => {
            if !matches!(name, "stats" | "alerts") {
                ctx.log.success(name, None);
            }
            Ok(value)
        }
        Err(err) => {
            ctx.log.failure(name, &err);
            Err(err.context(format!("{name} request failed")))
        }
    }
}

// ---------------------------------------------------------------------------
// safevision health
// ---------------------------------------------------------------------------

/// Check backend reachability, camera status, config files and the log.
pub fn run_health(ctx: &AppContext) -> Result<()> {
    println!("{}", "SafeVision Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    for file in config::config_files() {
        let (ok, detail) = config_file_verdict(&file);
        print_health_item(file.label, ok, &detail);
    }
    let overrides = config::env_overrides();
    if !overrides.is_empty() {
        let names: Vec<&str> = overrides.iter().map(|(key, _)| *key).collect();
        print_health_item("Env overrides", true, &names.join(", "));
    }

    let backend = ctx.backend();
    match backend.stats() {
        Ok(stats) => print_health_item(
            "Backend",
            true,
            &format!(
                "reachable at {} (threat level {})",
                ctx.config.backend.url, stats.threat_level
            ),
        ),
        Err(err) => {
            ctx.log.failure("stats", &err);
            print_health_item(
                "Backend",
                false,
                &format!("not reachable at {}: {err:#}", ctx.config.backend.url),
            );
        }
    }

    match backend.camera_status() {
        Ok(camera) => {
            let (ok, detail) = camera_verdict(&camera);
            print_health_item("Camera", ok, &detail);
        }
        Err(err) => {
            ctx.log.failure("camera_status", &err);
            print_health_item("Camera", false, "status unavailable");
        }
    }

    print_health_item(
        "Polling",
        true,
        &format!(
            "stats every {}ms, alerts every {}ms",
            ctx.config.polling.stats_interval().as_millis(),
            ctx.config.polling.alerts_interval().as_millis()
        ),
    );

    match ctx.log.path() {
        Some(path) if path.exists() => print_health_item(
            "Request log",
            true,
            &format!("{} entries", ctx.log.read_all().len()),
        ),
        Some(_) => print_health_item("Request log", true, "no log file yet"),
        None => print_health_item("Request log", false, "disabled"),
    }

    print_health_item("Theme", true, ctx.theme.as_str());
    Ok(())
}

/// Health line for one config file layer.
fn config_file_verdict(file: &ConfigFile) -> (bool, String) {
    let detail = if file.exists() {
        "found".to_string()
    } else if file.optional {
        "none (optional)".to_string()
    } else {
        "not found (run `safevision config init` to create)".to_string()
    };
    (file.is_healthy(), detail)
}

/// Health line for the backend's camera report.
fn camera_verdict(camera: &CameraStatus) -> (bool, String) {
    (
        camera.is_connected(),
        format!("{}: {}", camera.status, camera.message),
    )
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<26} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// safevision theme
// ---------------------------------------------------------------------------

pub fn run_theme_show(ctx: &AppContext) -> Result<()> {
    println!("{}", ctx.theme);
    Ok(())
}

/// Flip the persisted theme.
pub fn run_theme_toggle(ctx: &mut AppContext) -> Result<()> {
    let theme = ctx.themes.toggle(ctx.theme)?;
    ctx.theme = theme;
    println!("{} Theme set to {}", "✓".green().bold(), theme.to_string().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// safevision log
// ---------------------------------------------------------------------------

/// Print the last `lines` request log entries.
pub fn run_log(ctx: &AppContext, lines: usize) -> Result<()> {
    let Some(path) = ctx.log.path() else {
        println!("{}", "Request logging is disabled.".yellow());
        return Ok(());
    };

    let entries = ctx.log.tail(lines);
    if entries.is_empty() {
        println!(
            "{}",
            format!("No requests logged yet at {}.", path.display()).yellow()
        );
        return Ok(());
    }

    for entry in entries {
        let outcome = match entry.outcome {
            Outcome::Ok => "ok".green(),
            Outcome::Failed => "failed".red(),
        };
        println!(
            "  {} {:<16} {:<6} {}",
            entry.timestamp.dimmed(),
            entry.request,
            outcome,
            entry.detail.unwrap_or_default()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// safevision config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective SafeVision Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for file in config::config_files() {
        let shown = file
            .path
            .as_deref()
            .map_or_else(|| file.label.to_string(), |p| p.display().to_string());
        print_source(&shown, file.exists());
    }

    let overrides = config::env_overrides();
    for key in config::ENV_OVERRIDES {
        match overrides.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => println!("  {} {}={}", "✓".green(), key, value),
            None => println!("  {} {}", "·".dimmed(), format!("{key} (unset)").dimmed()),
        }
    }
    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Write the annotated default config to `~/.safevision/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn colorize_threat(text: &str, color: &str) -> colored::ColoredString {
    match color {
        "red" => text.red().bold(),
        "orange" => text.truecolor(255, 165, 0).bold(),
        _ => text.green(),
    }
}

fn colorize_severity(severity: Severity) -> colored::ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::High => label.red(),
        Severity::Medium => label.truecolor(255, 165, 0),
        Severity::Low => label.green(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn camera_health_follows_backend_status() {
        let connected = CameraStatus {
            status: "connected".to_string(),
            message: "Camera is working".to_string(),
        };
        assert_eq!(
            camera_verdict(&connected),
            (true, "connected: Camera is working".to_string())
        );

        let disconnected = CameraStatus {
            status: "disconnected".to_string(),
            message: "Camera not available".to_string(),
        };
        let (ok, detail) = camera_verdict(&disconnected);
        assert!(!ok);
        assert_eq!(detail, "disconnected: Camera not available");
    }

    #[test]
    fn missing_project_config_is_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let project = ConfigFile {
            label: ".safevision.toml",
            path: Some(dir.path().join(".safevision.toml")),
            optional: true,
        };
        assert_eq!(
            config_file_verdict(&project),
            (true, "none (optional)".to_string())
        );

        let global = ConfigFile {
            label: "~/.safevision/config.toml",
            path: Some(dir.path().join("config.toml")),
            optional: false,
        };
        let (ok, detail) = config_file_verdict(&global);
        assert!(!ok);
        assert!(detail.contains("config init"));

        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        assert_eq!(config_file_verdict(&global), (true, "found".to_string()));
    }
}
