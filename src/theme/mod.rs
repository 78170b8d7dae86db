//! Persisted theme preference.
//!
//! A single key (`~/.safevision/theme`) holding `dark` or `light`. It is read
//! once when the dashboard starts and written only when the user toggles it.
//! Anything other than `dark` reads as light.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "dark" {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File-backed key/value store for the theme flag.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: Option<PathBuf>,
}

impl ThemeStore {
    /// Store at the default location, if a home directory exists.
    pub fn default_location() -> Self {
        Self {
            path: config::state_dir().map(|dir| dir.join("theme")),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the stored preference. Missing or unreadable means light.
    pub fn load(&self) -> Theme {
        self.path
            .as_ref()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|raw| Theme::parse(&raw))
            .unwrap_or_default()
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .context("could not determine home directory")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create theme directory")?;
        }
        fs::write(path, theme.as_str()).context("failed to write theme preference")
    }

    /// Flip `current`, persist it and return the new value.
    pub fn toggle(&self, current: Theme) -> Result<Theme> {
        let next = current.toggled();
        self.save(next)?;
        Ok(next)
    }
}
