//! SafeVision dashboard client.
//!
//! Keeps a monitoring dashboard in sync with a SafeVision backend: recording
//! and detection controls, periodic stats and alert refresh, snapshots and
//! alert management. The page itself sits behind [`ui::UiBinding`]; the
//! shipped surface is a colored terminal page plus one-shot CLI commands.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod theme;
pub mod ui;
