/// Configuration schema and defaults for the dashboard client.
///
/// Defines the TOML-serializable structure with the sections `[backend]`,
/// `[polling]`, `[display]` and `[logging]`. Every field has a built-in
/// default; users only set what they want to change.
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level dashboard configuration.
///
/// Maps directly to `~/.safevision/config.toml` and `.safevision.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub backend: BackendConfig,
    pub polling: PollingConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the SafeVision backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend, without the `/api` suffix.
    pub url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            timeout_ms: 4_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [polling]
// ---------------------------------------------------------------------------

/// Refresh intervals for the two background cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub stats_interval_ms: u64,
    pub alerts_interval_ms: u64,
}

impl PollingConfig {
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn alerts_interval(&self) -> Duration {
        Duration::from_millis(self.alerts_interval_ms.max(MIN_INTERVAL_MS))
    }
}

/// Floor applied to configured intervals so a typo cannot hammer the backend.
const MIN_INTERVAL_MS: u64 = 250;

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            stats_interval_ms: 5_000,
            alerts_interval_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Terminal page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of alerts shown in the compact "recent" panel.
    pub recent_alerts: usize,
    /// Clear the screen before each redraw in `watch` mode.
    pub clear_screen: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            recent_alerts: 3,
            clear_screen: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Request log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Override for the log file location. Defaults to
    /// `~/.safevision/requests.jsonl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl DashConfig {
    /// Annotated default config written by `safevision config init`.
    pub fn default_toml() -> &'static str {
        DEFAULT_TOML
    }
}

const DEFAULT_TOML: &str = r#"# SafeVision dashboard configuration
#
# Precedence (highest wins): SAFEVISION_* env vars > ./.safevision.toml >
# ~/.safevision/config.toml > built-in defaults.

[backend]
# Base URL of the SafeVision backend
url = "http://localhost:5000"
# Per-request timeout in milliseconds
timeout_ms = 4000

[polling]
# Statistics refresh interval (ms)
stats_interval_ms = 5000
# Alert list refresh interval (ms)
alerts_interval_ms = 10000

[display]
# Alerts shown in the recent panel
recent_alerts = 3
# Clear the terminal before each redraw in watch mode
clear_screen = true

[logging]
# Append failed and user-triggered requests to ~/.safevision/requests.jsonl
enabled = true
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
