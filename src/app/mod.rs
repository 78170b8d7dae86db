//! Application context and the interactive `watch` page.
//!
//! [`AppContext`] is built once per process and handed to whoever owns the
//! page lifecycle. The watch loop is single-threaded: it fires due refreshes,
//! applies replies, redraws, then waits briefly for a typed command.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::api::{Backend, HttpBackend};
use crate::config::{self, DashConfig};
use crate::dashboard::command::{Command, HELP};
use crate::dashboard::{ControllerOptions, DashboardController, Dispatcher};
use crate::logging::RequestLog;
use crate::theme::{Theme, ThemeStore};
use crate::ui::console::{self, Input, LineEvent};
use crate::ui::{ConsoleUi, UiBinding};

/// Longest the loop waits for input before checking for replies.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Process-wide state: configuration, theme preference and request log.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: DashConfig,
    pub themes: ThemeStore,
    /// Theme read once at start-up; changed only by an explicit toggle.
    pub theme: Theme,
    pub log: RequestLog,
}

impl AppContext {
    /// Load config from all layers and the persisted theme.
    pub fn load() -> Self {
        Self::new(config::load(), ThemeStore::default_location())
    }

    pub fn new(config: DashConfig, themes: ThemeStore) -> Self {
        let theme = themes.load();
        let log = RequestLog::from_config(&config.logging);
        Self {
            config,
            themes,
            theme,
            log,
        }
    }

    /// HTTP backend for the configured URL.
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::new(HttpBackend::from_config(&self.config.backend))
    }

    /// A fresh, idle controller bound to `ui`.
    pub fn controller<U: UiBinding>(&self, ui: U, dispatcher: Dispatcher) -> DashboardController<U> {
        DashboardController::new(
            ui,
            dispatcher,
            ControllerOptions::from_config(&self.config),
            self.log.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// safevision watch
// ---------------------------------------------------------------------------

/// Run the interactive page until `quit` or end of input.
pub fn watch(ctx: &mut AppContext) -> Result<()> {
    let lines = console::spawn_input_reader()?;
    let ui = ConsoleUi::new(Input::Lines(lines), ctx.theme)
        .with_clear_screen(ctx.config.display.clear_screen);
    let dispatcher = Dispatcher::threaded(ctx.backend());

    let mut controller = ctx.controller(ui, dispatcher);
    controller.start(Instant::now());
    let result = run_page(ctx, &mut controller);
    controller.destroy();
    result
}

/// Page loop. Returns when the user quits or input closes.
pub fn run_page(ctx: &mut AppContext, controller: &mut DashboardController<ConsoleUi>) -> Result<()> {
    loop {
        controller.tick(Instant::now());
        controller.pump();
        controller.ui_mut().flush()?;

        let wait = controller
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(POLL_SLICE, |until| until.min(POLL_SLICE));

        match controller.ui_mut().next_line(wait) {
            LineEvent::Idle => {}
            LineEvent::Closed => return Ok(()),
            LineEvent::Line(line) => {
                if let Some(command) = Command::parse(&line)
                    && handle_command(ctx, controller, command) == Flow::Quit
                {
                    return Ok(());
                }
            }
        }
    }
}

/// Whether the page loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Apply one typed command to the page.
pub fn handle_command(
    ctx: &mut AppContext,
    controller: &mut DashboardController<ConsoleUi>,
    command: Command,
) -> Flow {
    match command {
        Command::ToggleRecording => controller.toggle_recording(),
        Command::ToggleDetection => controller.toggle_detection(),
        Command::Snapshot => controller.take_snapshot(),
        Command::ClearAlerts => controller.clear_alerts(),
        Command::Search(text) => {
            controller.ui_mut().set_search(&text);
            controller.refilter();
        }
        Command::Severity(filter) => {
            controller.ui_mut().set_severity(filter);
            controller.refilter();
        }
        Command::Acknowledge => controller.acknowledge_threat(),
        Command::CheckCamera => controller.check_camera(),
        Command::Trigger { kind, severity } => controller.trigger_alert(&kind, severity),
        Command::SyncStatus => controller.sync_status(),
        Command::Refresh => {
            controller.fetch_stats();
            controller.fetch_alerts();
        }
        Command::ToggleTheme => match ctx.themes.toggle(ctx.theme) {
            Ok(theme) => {
                ctx.theme = theme;
                controller.ui_mut().set_theme(theme);
            }
            Err(err) => controller
                .ui_mut()
                .notify(&format!("Could not save theme: {err:#}")),
        },
        Command::Help => controller.ui_mut().notify(HELP),
        Command::Quit => return Flow::Quit,
        Command::Invalid(reason) => controller.ui_mut().notify(&reason),
    }
    Flow::Continue
}
