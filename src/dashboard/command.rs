/// Interactive commands typed into the `watch` page.
use crate::api::Severity;

use super::view::SeverityFilter;

/// Default alert type for `trigger` without arguments.
pub const DEFAULT_TRIGGER_TYPE: &str = "Test Alert";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleRecording,
    ToggleDetection,
    Snapshot,
    ClearAlerts,
    Search(String),
    Severity(SeverityFilter),
    Acknowledge,
    CheckCamera,
    Trigger { kind: String, severity: Severity },
    SyncStatus,
    Refresh,
    ToggleTheme,
    Help,
    Quit,
    /// A line that did not parse, with the reason.
    Invalid(String),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "r" | "record" => Self::ToggleRecording,
            "d" | "detect" | "detection" => Self::ToggleDetection,
            "s" | "snap" | "snapshot" => Self::Snapshot,
            "c" | "clear" => Self::ClearAlerts,
            "/" | "search" => Self::Search(rest.to_string()),
            "severity" | "sev" => {
                let raw = if rest.is_empty() { "all" } else { rest };
                match SeverityFilter::parse(raw) {
                    Some(filter) => Self::Severity(filter),
                    None => Self::Invalid(format!(
                        "unknown severity '{raw}' (expected all, low, medium or high)"
                    )),
                }
            }
            "ack" | "acknowledge" => Self::Acknowledge,
            "camera" | "cam" => Self::CheckCamera,
            "trigger" => parse_trigger(rest),
            "status" => Self::SyncStatus,
            "refresh" | "f" => Self::Refresh,
            "theme" | "t" => Self::ToggleTheme,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => Self::Invalid(format!("unknown command '{other}' (type 'help')")),
        };
        Some(command)
    }
}

/// `trigger [type words...] [severity]`. A trailing severity word is taken
/// as the severity; the default is High.
fn parse_trigger(rest: &str) -> Command {
    let mut words: Vec<&str> = rest.split_whitespace().collect();
    let severity = match words.last().and_then(|w| Severity::parse(w)) {
        Some(severity) => {
            words.pop();
            severity
        }
        None => Severity::High,
    };
    let kind = if words.is_empty() {
        DEFAULT_TRIGGER_TYPE.to_string()
    } else {
        words.join(" ")
    };
    Command::Trigger { kind, severity }
}

/// One-screen help text for the `watch` page.
pub const HELP: &str = "\
commands:
  r, record            toggle recording
  d, detect            toggle AI detection
  s, snapshot          save a snapshot
  c, clear             clear all alerts (asks first)
  search <text>        filter alert history by text (empty clears)
  severity <level>     filter by all, low, medium or high
  ack                  dismiss the danger banner
  camera               check camera status
  trigger [type] [sev] raise a manual alert
  status               re-read recording/detection state
  refresh              fetch stats and alerts now
  theme                toggle dark/light theme
  q, quit              leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("   \n"), None);
    }

    #[test]
    fn short_and_long_forms() {
        assert_eq!(Command::parse("r"), Some(Command::ToggleRecording));
        assert_eq!(Command::parse("RECORD"), Some(Command::ToggleRecording));
        assert_eq!(Command::parse("d"), Some(Command::ToggleDetection));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("?"), Some(Command::Help));
    }

    #[test]
    fn search_keeps_the_rest_of_the_line() {
        assert_eq!(
            Command::parse("search  Person near gate "),
            Some(Command::Search("Person near gate".to_string()))
        );
        assert_eq!(Command::parse("search"), Some(Command::Search(String::new())));
    }

    #[test]
    fn severity_parses_or_reports() {
        assert_eq!(
            Command::parse("severity HIGH"),
            Some(Command::Severity(SeverityFilter::Only(Severity::High)))
        );
        assert_eq!(
            Command::parse("severity"),
            Some(Command::Severity(SeverityFilter::All))
        );
        assert!(matches!(
            Command::parse("severity extreme"),
            Some(Command::Invalid(_))
        ));
    }

    #[test]
    fn trigger_defaults_and_trailing_severity() {
        assert_eq!(
            Command::parse("trigger"),
            Some(Command::Trigger {
                kind: DEFAULT_TRIGGER_TYPE.to_string(),
                severity: Severity::High,
            })
        );
        assert_eq!(
            Command::parse("trigger Fence breach medium"),
            Some(Command::Trigger {
                kind: "Fence breach".to_string(),
                severity: Severity::Medium,
            })
        );
    }

    #[test]
    fn unknown_verb_is_invalid() {
        assert!(matches!(Command::parse("launch"), Some(Command::Invalid(_))));
    }
}
