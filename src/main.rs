use anyhow::Result;
use clap::{Parser, Subcommand};

use safevision::app::{self, AppContext};
use safevision::cli::{self, ControlTarget, OutputFormat};
use safevision::dashboard::command::DEFAULT_TRIGGER_TYPE;

#[derive(Debug, Parser)]
#[command(name = "safevision")]
#[command(about = "Terminal dashboard for the SafeVision monitoring backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive dashboard: live stats, alerts and typed commands
    Watch,
    /// Fetch and show dashboard statistics once
    Stats {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Fetch and list alerts once
    Alerts {
        /// Case-insensitive text matched against type, description and id
        #[arg(long, default_value = "")]
        search: String,
        /// Severity filter: all (default), low, medium, high
        #[arg(long, default_value = "all")]
        severity: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Save a camera snapshot on the backend
    Snapshot,
    /// Delete every alert (asks for confirmation)
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Toggle recording or detection, or show the control status
    Control {
        #[command(subcommand)]
        target: ControlCommand,
    },
    /// Raise a manual alert
    Trigger {
        /// Alert type
        #[arg(long = "type", default_value = DEFAULT_TRIGGER_TYPE)]
        kind: String,
        /// Severity: low, medium, high (default)
        #[arg(long, default_value = "high")]
        severity: String,
    },
    /// Check backend, camera, config and request log
    Health,
    /// Show or toggle the persisted theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeCommand>,
    },
    /// Show the most recent request log entries
    Log {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        lines: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ControlCommand {
    /// Toggle recording
    Recording,
    /// Toggle AI detection
    Detection,
    /// Show recording, detection and threat state
    Status,
}

#[derive(Debug, Subcommand)]
enum ThemeCommand {
    /// Print the current theme
    Show,
    /// Switch between dark and light
    Toggle,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.safevision/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `backend.url http://cam:5000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let mut ctx = AppContext::load();

    match app.command {
        Commands::Watch => app::watch(&mut ctx),
        Commands::Stats { format } => {
            cli::run_stats(&ctx, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Alerts {
            search,
            severity,
            format,
        } => cli::run_alerts(
            &ctx,
            &search,
            &severity,
            OutputFormat::from_str_opt(Some(&format)),
        ),
        Commands::Snapshot => cli::run_snapshot(&ctx),
        Commands::Clear { yes } => cli::run_clear(&ctx, yes),
        Commands::Control { target } => {
            let target = match target {
                ControlCommand::Recording => ControlTarget::Recording,
                ControlCommand::Detection => ControlTarget::Detection,
                ControlCommand::Status => ControlTarget::Status,
            };
            cli::run_control(&ctx, target)
        }
        Commands::Trigger { kind, severity } => cli::run_trigger(&ctx, &kind, &severity),
        Commands::Health => cli::run_health(&ctx),
        Commands::Theme { action } => match action.unwrap_or(ThemeCommand::Show) {
            ThemeCommand::Show => cli::run_theme_show(&ctx),
            ThemeCommand::Toggle => cli::run_theme_toggle(&mut ctx),
        },
        Commands::Log { lines } => cli::run_log(&ctx, lines),
        Commands::Config { action } => match action {
            ConfigCommand::Show => cli::run_config_show(),
            ConfigCommand::Init { force } => cli::run_config_init(force),
            ConfigCommand::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigCommand::Reset => cli::run_config_reset(),
        },
    }
}
