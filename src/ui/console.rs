//! Terminal rendering of the dashboard page.
//!
//! [`ConsoleUi`] keeps a [`Page`] and redraws it as colored text. Notices are
//! printed as they arrive and repeated in the page footer; confirmations
//! read one line from the same input source the command loop uses, so a
//! prompt never races the loop for stdin.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};

use super::{Element, Page, UiBinding};
use crate::api::Alert;
use crate::dashboard::view::{
    AlertFilter, AlertHistory, HISTORY_COLUMNS, NO_ALERTS_PLACEHOLDER, SeverityFilter,
};
use crate::theme::Theme;

/// Where typed lines come from.
#[derive(Debug)]
pub enum Input {
    /// Read stdin directly, blocking. For one-shot commands.
    Stdin,
    /// Answer every confirmation with yes and never yield a line.
    AssumeYes,
    /// Lines posted by a reader thread (see [`spawn_input_reader`]).
    Lines(Receiver<String>),
}

/// Result of waiting for one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Line(String),
    /// Nothing typed before the timeout.
    Idle,
    /// Input is exhausted.
    Closed,
}

/// Read stdin on a background thread, one message per line.
///
/// The channel disconnects at end of input.
pub fn spawn_input_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("safevision-input".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(rx)
}

#[derive(Debug)]
pub struct ConsoleUi {
    page: Page,
    filter: AlertFilter,
    theme: Theme,
    input: Input,
    last_notice: Option<String>,
    dirty: bool,
    clear_screen: bool,
}

impl ConsoleUi {
    pub fn new(input: Input, theme: Theme) -> Self {
        Self {
            page: Page::new(),
            filter: AlertFilter::default(),
            theme,
            input,
            last_notice: None,
            dirty: true,
            clear_screen: false,
        }
    }

    /// Clear the terminal before every redraw.
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.dirty = true;
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.search = search.to_string();
        self.dirty = true;
    }

    pub fn set_severity(&mut self, severity: SeverityFilter) {
        self.filter.severity = severity;
        self.dirty = true;
    }

    pub fn last_notice(&self) -> Option<&str> {
        self.last_notice.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Wait up to `timeout` for a typed line.
    pub fn next_line(&mut self, timeout: Duration) -> LineEvent {
        match &self.input {
            Input::Lines(rx) => match rx.recv_timeout(timeout) {
                Ok(line) => LineEvent::Line(line),
                Err(RecvTimeoutError::Timeout) => LineEvent::Idle,
                Err(RecvTimeoutError::Disconnected) => LineEvent::Closed,
            },
            Input::Stdin => {
                let mut line = String::new();
                match io::stdin().lock().read_line(&mut line) {
                    Ok(0) | Err(_) => LineEvent::Closed,
                    Ok(_) => LineEvent::Line(line.trim_end_matches(['\r', '\n']).to_string()),
                }
            }
            Input::AssumeYes => LineEvent::Closed,
        }
    }

    /// Redraw the page if anything changed since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        if self.clear_screen {
            write!(out, "\x1B[2J\x1B[H").context("failed to clear terminal")?;
        }
        write!(out, "{}", self.render()).context("failed to draw dashboard")?;
        write!(out, "{} ", ">".bold()).context("failed to draw prompt")?;
        out.flush().context("failed to flush stdout")?;
        self.dirty = false;
        Ok(())
    }

    /// The whole page as terminal text.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        let page = &self.page;

        lines.push(format!(
            "{}  {}",
            "SafeVision Dashboard".bold().cyan(),
            format!("[{} theme]", self.theme).dimmed()
        ));
        lines.push("=".repeat(64));

        lines.push(format!(
            "  {:<22} {}",
            self.styled(page.text(Element::RecordStatus), page.class(Element::RecordButton)),
            format!("[{}]", page.text(Element::RecordButton)).dimmed()
        ));
        lines.push(format!(
            "  {:<22} {}",
            self.styled(
                page.text(Element::DetectionBadge),
                page.class(Element::DetectionBadge)
            ),
            format!("[{}]", page.text(Element::DetectionButton)).dimmed()
        ));
        lines.push(String::new());

        let stat_rows = [
            ("Total alerts", Element::TotalAlerts, Some(Element::AlertsCaption)),
            (
                "Last detection",
                Element::LastDetection,
                Some(Element::DetectionCaption),
            ),
            (
                "Active cameras",
                Element::ActiveCameras,
                Some(Element::CameraCaption),
            ),
            ("Threat level", Element::ThreatLevel, None),
            ("Accuracy", Element::DetectionAccuracy, None),
            ("Objects detected", Element::ObjectsDetected, None),
            ("Uptime", Element::Uptime, None),
        ];
        for (label, element, caption) in stat_rows {
            let value = page.text(element);
            if element == Element::Uptime && value.is_empty() {
                continue;
            }
            let caption = caption.map(|c| page.text(c)).unwrap_or("");
            lines.push(format!(
                "  {:<18} {:<24} {}",
                label.bold(),
                self.styled(value, page.class(element)),
                caption.dimmed()
            ));
        }

        if page.is_visible(Element::ThreatAlert) {
            lines.push(String::new());
            lines.push(format!("  {}", self.danger("HIGH THREAT LEVEL DETECTED")));
        }
        if page.is_visible(Element::DangerBanner) {
            lines.push(format!(
                "  {} {}",
                self.danger("DANGER: immediate attention required."),
                "Type 'ack' to acknowledge.".dimmed()
            ));
        }

        lines.push(String::new());
        lines.push("Recent Alerts".bold().cyan().to_string());
        if page.recent().is_empty() {
            lines.push(format!("  {}", "none".dimmed()));
        }
        for alert in page.recent() {
            lines.push(format!(
                "  {} {}  {}  {}",
                self.severity_tag(alert),
                alert.detected_class,
                alert.zone.dimmed(),
                alert.timestamp_label().dimmed()
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "{}  {}",
            "Alert History".bold().cyan(),
            format!(
                "search: \"{}\"  severity: {}",
                self.filter.search, self.filter.severity
            )
            .dimmed()
        ));
        match page.history() {
            AlertHistory::Pending => lines.push(format!("  {}", "loading...".dimmed())),
            AlertHistory::Placeholder => {
                lines.push(format!("  {}", NO_ALERTS_PLACEHOLDER.dimmed()))
            }
            AlertHistory::Rows(rows) => {
                lines.push(format!("  {}", history_header().bold()));
                lines.push(format!("  {}", "-".repeat(96)));
                for alert in rows {
                    lines.push(format!("  {}", self.history_row(alert)));
                }
            }
        }

        if let Some(notice) = &self.last_notice {
            lines.push(String::new());
            lines.push(format!("{} {}", "»".cyan().bold(), notice));
        }
        lines.push(String::new());

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn history_row(&self, alert: &Alert) -> String {
        format!(
            "{:<10} {:<19} {:<14} {:<8} {:<10} {:<24} {}",
            truncate(&alert.id, 10),
            truncate(alert.timestamp_label(), 19),
            truncate(&alert.detected_class, 14),
            self.severity_tag(alert),
            truncate(&alert.zone, 10),
            truncate(&alert.description, 24),
            alert.confidence
        )
    }

    fn severity_tag(&self, alert: &Alert) -> ColoredString {
        self.styled(&alert.severity.to_string(), alert.severity.css_class())
    }

    fn danger(&self, text: &str) -> ColoredString {
        match self.theme {
            Theme::Dark => text.bright_red().bold(),
            Theme::Light => text.red().bold(),
        }
    }

    /// Color `text` from the class names the page assigns.
    fn styled(&self, text: &str, class: &str) -> ColoredString {
        let dark = self.theme == Theme::Dark;
        let has = |name: &str| class.split_whitespace().any(|c| c == name);

        if has("red") || has("high") || has("destructive") {
            if dark { text.bright_red() } else { text.red() }
        } else if has("orange") || has("medium") {
            if dark {
                text.truecolor(255, 179, 71)
            } else {
                text.truecolor(204, 102, 0)
            }
        } else if has("green") || has("low") {
            if dark { text.bright_green() } else { text.green() }
        } else if has("outline") {
            text.dimmed()
        } else {
            text.normal()
        }
    }
}

fn history_header() -> String {
    let [id, ts, kind, severity, zone, description, confidence] = HISTORY_COLUMNS;
    format!(
        "{id:<10} {ts:<19} {kind:<14} {severity:<8} {zone:<10} {description:<24} {confidence}"
    )
}

/// Truncate to `max_len` characters, appending "…" if truncated.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl UiBinding for ConsoleUi {
    fn set_text(&mut self, element: Element, text: &str) {
        self.page.set_text(element, text);
        self.dirty = true;
    }

    fn set_class(&mut self, element: Element, class: &str) {
        self.page.set_class(element, class);
        self.dirty = true;
    }

    fn set_visible(&mut self, element: Element, visible: bool) {
        self.page.set_visible(element, visible);
        self.dirty = true;
    }

    fn render_recent_alerts(&mut self, alerts: &[Alert]) {
        self.page.set_recent(alerts);
        self.dirty = true;
    }

    fn render_alert_history(&mut self, history: AlertHistory) {
        self.page.set_history(history);
        self.dirty = true;
    }

    fn alert_filter(&self) -> AlertFilter {
        self.filter.clone()
    }

    fn notify(&mut self, message: &str) {
        println!("{} {}", "»".cyan().bold(), message);
        self.last_notice = Some(message.to_string());
        self.dirty = true;
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if matches!(self.input, Input::AssumeYes) {
            return true;
        }
        print!("{} {} ", prompt.yellow(), "[y/N]".dimmed());
        let _ = io::stdout().flush();

        // Wait as long as it takes; a modal blocks the page.
        let answer = match &self.input {
            Input::Lines(rx) => rx.recv().ok(),
            Input::Stdin => {
                let mut line = String::new();
                match io::stdin().lock().read_line(&mut line) {
                    Ok(n) if n > 0 => Some(line),
                    _ => None,
                }
            }
            Input::AssumeYes => None,
        };
        self.dirty = true;
        answer.is_some_and(|line| is_yes(&line))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Confidence, Severity};

    fn alert(id: &str, class: &str, severity: Severity) -> Alert {
        Alert {
            id: id.to_string(),
            timestamp: Some("2026-10-17 09:15:00".to_string()),
            detected_class: class.to_string(),
            severity,
            zone: "Gate".to_string(),
            description: format!("{class} seen"),
            confidence: Confidence::Label("91.0%".to_string()),
        }
    }

    fn with_lines(lines: &[&str]) -> ConsoleUi {
        let (tx, rx) = mpsc::channel();
        for line in lines {
            tx.send(line.to_string()).unwrap();
        }
        ConsoleUi::new(Input::Lines(rx), Theme::Light)
    }

    #[test]
    fn confirm_reads_from_line_channel() {
        let mut ui = with_lines(&["yes", "n", "whatever"]);
        assert!(ui.confirm("sure?"));
        assert!(!ui.confirm("sure?"));
        assert!(!ui.confirm("sure?"));
    }

    #[test]
    fn confirm_on_closed_input_is_no() {
        let (tx, rx) = mpsc::channel::<String>();
        drop(tx);
        let mut ui = ConsoleUi::new(Input::Lines(rx), Theme::Light);
        assert!(!ui.confirm("sure?"));
    }

    #[test]
    fn assume_yes_confirms() {
        let mut ui = ConsoleUi::new(Input::AssumeYes, Theme::Dark);
        assert!(ui.confirm("sure?"));
        assert_eq!(ui.next_line(Duration::from_millis(1)), LineEvent::Closed);
    }

    #[test]
    fn next_line_idle_then_closed() {
        let (tx, rx) = mpsc::channel();
        let mut ui = ConsoleUi::new(Input::Lines(rx), Theme::Light);
        assert_eq!(ui.next_line(Duration::from_millis(5)), LineEvent::Idle);
        tx.send("r".to_string()).unwrap();
        assert_eq!(
            ui.next_line(Duration::from_millis(5)),
            LineEvent::Line("r".to_string())
        );
        drop(tx);
        assert_eq!(ui.next_line(Duration::from_millis(5)), LineEvent::Closed);
    }

    #[test]
    fn render_shows_placeholder_and_banner() {
        let mut ui = with_lines(&[]);
        ui.render_alert_history(AlertHistory::Placeholder);
        ui.set_visible(Element::ThreatAlert, true);
        let text = ui.render();
        assert!(text.contains(NO_ALERTS_PLACEHOLDER));
        assert!(text.contains("HIGH THREAT LEVEL DETECTED"));
        assert!(!text.contains("Type 'ack'"));
    }

    #[test]
    fn render_lists_history_rows() {
        let mut ui = with_lines(&[]);
        let rows = vec![alert("A-1", "person", Severity::High)];
        ui.render_recent_alerts(&rows);
        ui.render_alert_history(AlertHistory::Rows(rows));
        let text = ui.render();
        assert!(text.contains("Alert ID"));
        assert!(text.contains("A-1"));
        assert!(text.contains("91.0%"));
    }

    #[test]
    fn filter_setters_feed_alert_filter() {
        let mut ui = with_lines(&[]);
        ui.set_search("person");
        ui.set_severity(SeverityFilter::Only(Severity::High));
        let filter = ui.alert_filter();
        assert_eq!(filter.search, "person");
        assert_eq!(filter.severity, SeverityFilter::Only(Severity::High));
    }

    #[test]
    fn notify_is_kept_for_footer() {
        let mut ui = with_lines(&[]);
        ui.notify("Snapshot saved: a.jpg");
        assert_eq!(ui.last_notice(), Some("Snapshot saved: a.jpg"));
        assert!(ui.render().contains("Snapshot saved: a.jpg"));
    }

    #[test]
    fn page_changes_mark_dirty_until_flushed() {
        let mut ui = with_lines(&[]);
        assert!(ui.is_dirty());
        ui.flush().unwrap();
        assert!(!ui.is_dirty());
        ui.set_text(Element::TotalAlerts, "3");
        assert!(ui.is_dirty());
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }
}
