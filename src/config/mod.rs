/// Configuration system for the dashboard client.
///
/// Layered, later layers win:
///
/// 1. **Built-in defaults**: [`schema::DashConfig::default()`]
/// 2. **User global config**: `~/.safevision/config.toml`
/// 3. **Project local config**: `.safevision.toml` in the current directory
/// 4. **Environment variables**: `SAFEVISION_*` overrides
///
/// Malformed files are ignored rather than aborting start-up.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::{BackendConfig, DashConfig, DisplayConfig, LoggingConfig, PollingConfig};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// File layers merge at the field level: a key missing from a later file
/// keeps the earlier layer's value.
pub fn load() -> DashConfig {
    let mut merged = toml::Table::new();

    for layer in [global_config_path(), project_config_path()] {
        if let Some(table) = load_toml_layer(layer) {
            merge_tables(&mut merged, table);
        }
    }

    let mut config = toml::Value::Table(merged)
        .try_into::<DashConfig>()
        .unwrap_or_default();

    apply_env_overrides(&mut config);

    config
}

/// Read one config file as a raw table, or `None` when missing or malformed.
///
/// A file only counts if it also deserializes as a [`DashConfig`] on its own.
fn load_toml_layer(path: Option<PathBuf>) -> Option<toml::Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str::<DashConfig>(&content).ok()?;
    toml::from_str(&content).ok()
}

/// Overlay `overlay` onto `base`, recursing into sub-tables.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Per-user state directory: `~/.safevision`.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".safevision"))
}

fn global_config_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".safevision.toml"))
}

/// One config file layer, as listed by `health` and `config show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub label: &'static str,
    pub path: Option<PathBuf>,
    /// Absence is normal and not worth flagging.
    pub optional: bool,
}

impl ConfigFile {
    pub fn exists(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }

    /// Present, or allowed to be missing.
    pub fn is_healthy(&self) -> bool {
        self.optional || self.exists()
    }
}

/// File layers in load order (lowest priority first).
pub fn config_files() -> [ConfigFile; 2] {
    [
        ConfigFile {
            label: "~/.safevision/config.toml",
            path: global_config_path(),
            optional: false,
        },
        ConfigFile {
            label: ".safevision.toml",
            path: project_config_path(),
            optional: true,
        },
    ]
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

pub const ENV_BACKEND_URL: &str = "SAFEVISION_BACKEND_URL";
pub const ENV_TIMEOUT_MS: &str = "SAFEVISION_TIMEOUT_MS";
pub const ENV_STATS_INTERVAL_MS: &str = "SAFEVISION_STATS_INTERVAL_MS";
pub const ENV_ALERTS_INTERVAL_MS: &str = "SAFEVISION_ALERTS_INTERVAL_MS";
pub const ENV_LOG: &str = "SAFEVISION_LOG";

/// Every variable [`load`] reads, in the order they are applied.
pub const ENV_OVERRIDES: [&str; 5] = [
    ENV_BACKEND_URL,
    ENV_TIMEOUT_MS,
    ENV_STATS_INTERVAL_MS,
    ENV_ALERTS_INTERVAL_MS,
    ENV_LOG,
];

/// The override variables currently set, with their raw values.
pub fn env_overrides() -> Vec<(&'static str, String)> {
    ENV_OVERRIDES
        .iter()
        .filter_map(|&key| std::env::var(key).ok().map(|val| (key, val)))
        .collect()
}

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `SAFEVISION_BACKEND_URL`: backend base URL
/// - `SAFEVISION_TIMEOUT_MS`: per-request timeout
/// - `SAFEVISION_STATS_INTERVAL_MS`: stats refresh interval
/// - `SAFEVISION_ALERTS_INTERVAL_MS`: alerts refresh interval
/// - `SAFEVISION_LOG`: request log on/off (`1`/`true`/`yes`/`on`)
///
/// Unparsable numbers are ignored.
fn apply_env_overrides(config: &mut DashConfig) {
    if let Ok(val) = std::env::var(ENV_BACKEND_URL)
        && !val.is_empty()
    {
        config.backend.url = val;
    }
    if let Ok(val) = std::env::var(ENV_TIMEOUT_MS)
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var(ENV_STATS_INTERVAL_MS)
        && let Ok(ms) = val.parse::<u64>()
    {
        config.polling.stats_interval_ms = ms;
    }
    if let Ok(val) = std::env::var(ENV_ALERTS_INTERVAL_MS)
        && let Ok(ms) = val.parse::<u64>()
    {
        config.polling.alerts_interval_ms = ms;
    }
    if let Ok(val) = std::env::var(ENV_LOG) {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.safevision/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, DashConfig::default_toml()).context("failed to write config file")?;
    Ok(())
}

/// Set a single dotted key (e.g. `backend.url`) in the global config file.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

/// Set a dotted key in the config file at `path`.
///
/// The file is overlaid on the serialized defaults first, so every known key
/// exists with its proper type. The result must still deserialize as a
/// [`DashConfig`].
pub fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let defaults = toml::to_string_pretty(&DashConfig::default())
        .context("failed to serialize default config")?;
    let mut table: toml::Table =
        toml::from_str(&defaults).context("failed to parse default config")?;

    if path.exists() {
        let content = fs::read_to_string(path).context("failed to read config file")?;
        let current: toml::Table =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_tables(&mut table, current);
    }

    let mut root = toml::Value::Table(table);
    set_toml_value(&mut root, key, value)?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    toml::from_str::<DashConfig>(&output)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML tree using a dotted key path.
///
/// The new value keeps the type of the value it replaces; unknown leaves are
/// stored as strings.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section_path, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be dotted, e.g. backend.url (got '{key}')");
    };

    let mut current = root;
    for part in section_path.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section_path}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to the annotated defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn read_config(path: PathBuf) -> Option<DashConfig> {
        load_toml_layer(Some(path)).and_then(|table| toml::Value::Table(table).try_into().ok())
    }

    #[test]
    fn optional_config_file_is_healthy_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let required = ConfigFile {
            label: "global",
            path: Some(path.clone()),
            optional: false,
        };
        let optional = ConfigFile {
            optional: true,
            ..required.clone()
        };
        assert!(!required.exists());
        assert!(!required.is_healthy());
        assert!(optional.is_healthy());

        fs::write(&path, "").unwrap();
        assert!(required.is_healthy());

        let unresolved = ConfigFile {
            path: None,
            ..required
        };
        assert!(!unresolved.exists());
    }

    #[test]
    fn env_override_names_match_prefix() {
        assert!(ENV_OVERRIDES.iter().all(|key| key.starts_with("SAFEVISION_")));
        assert!(ENV_OVERRIDES.contains(&ENV_LOG));
    }

    #[test]
    fn is_truthy_accepts_variants() {
        for yes in ["1", "true", "TRUE", "yes", "on", "ON"] {
            assert!(is_truthy(yes), "{yes} should be truthy");
        }
        for no in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(no), "{no} should be falsy");
        }
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[backend]
url = "http://localhost:5000"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "backend.url", "http://cam:9000").unwrap();
        assert_eq!(root["backend"]["url"].as_str(), Some("http://cam:9000"));
    }

    #[test]
    fn set_toml_value_keeps_integer_type() {
        let mut root: toml::Value = toml::from_str(
            r#"
[polling]
stats_interval_ms = 5000
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "polling.stats_interval_ms", "2500").unwrap();
        assert_eq!(root["polling"]["stats_interval_ms"].as_integer(), Some(2500));

        let err = set_toml_value(&mut root, "polling.stats_interval_ms", "soon");
        assert!(err.is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_section_and_undotted_key() {
        let mut root: toml::Value = toml::from_str("[backend]\nurl = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, "url", "v").is_err());
    }

    #[test]
    fn set_config_value_at_creates_file_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config_value_at(&path, "display.recent_alerts", "5").unwrap();

        let loaded = read_config(path).unwrap();
        assert_eq!(loaded.display.recent_alerts, 5);
        assert_eq!(loaded.backend, BackendConfig::default());
    }

    #[test]
    fn set_config_value_at_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backend]\nurl = \"http://cam:9000\"\n").unwrap();

        set_config_value_at(&path, "display.clear_screen", "off").unwrap();
        let loaded = read_config(path.clone()).unwrap();
        assert!(!loaded.display.clear_screen);
        assert_eq!(loaded.backend.url, "http://cam:9000");

        set_config_value_at(&path, "logging.path", "/tmp/sv.jsonl").unwrap();
        let loaded = read_config(path).unwrap();
        assert_eq!(loaded.logging.path, Some(PathBuf::from("/tmp/sv.jsonl")));
    }

    #[test]
    fn set_config_value_at_rejects_type_breaking_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[display]\nrecent_alerts = 3\n").unwrap();

        assert!(set_config_value_at(&path, "display.recent_alerts", "lots").is_err());
        let loaded = read_config(path).unwrap();
        assert_eq!(loaded.display.recent_alerts, 3);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_default_config(&path, false).unwrap();
        assert!(write_default_config(&path, false).is_err());
        assert!(write_default_config(&path, true).is_ok());
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        assert!(read_config(path).is_none());
    }

    #[test]
    fn wrongly_typed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[display]\nrecent_alerts = \"three\"\n").unwrap();
        assert!(load_toml_layer(Some(path)).is_none());
    }

    #[test]
    fn later_layer_overrides_single_fields() {
        let mut base: toml::Table =
            toml::from_str("[backend]\nurl = \"http://a:1\"\ntimeout_ms = 900\n").unwrap();
        let overlay: toml::Table = toml::from_str("[backend]\nurl = \"http://b:2\"\n").unwrap();
        merge_tables(&mut base, overlay);

        let config: DashConfig = toml::Value::Table(base).try_into().unwrap();
        assert_eq!(config.backend.url, "http://b:2");
        assert_eq!(config.backend.timeout_ms, 900);
        assert_eq!(config.polling, PollingConfig::default());
    }
}
