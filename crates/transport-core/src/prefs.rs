//! Persisted display preferences.
//!
//! Preferences live in a small JSON object on disk. The only entry today is
//! the ordering of the dashboard panels, read once at startup and written
//! whenever the user reorders them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Key of the panel ordering entry.
pub const DISPLAY_ORDER_KEY: &str = "dashboard_order";

/// Panel ordering used when nothing has been saved.
pub const DEFAULT_DISPLAY_ORDER: [&str; 4] = ["bar", "pie", "line", "predLine"];

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("position {index} out of range for {len} panels")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered sequence of opaque panel identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayOrder(Vec<String>);

impl Default for DisplayOrder {
    fn default() -> Self {
        Self(DEFAULT_DISPLAY_ORDER.iter().map(|s| s.to_string()).collect())
    }
}

impl DisplayOrder {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[String] {
        &self.0
    }

    /// Move the panel at `from` so it ends up at position `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), PreferenceError> {
        let len = self.0.len();
        for index in [from, to] {
            if index >= len {
                return Err(PreferenceError::OutOfRange { index, len });
            }
        }
        let item = self.0.remove(from);
        self.0.insert(to, item);
        Ok(())
    }
}

/// JSON file holding the preference entries.
#[derive(Debug, Clone)]
pub struct PreferenceFile {
    path: PathBuf,
}

impl PreferenceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<serde_json::Map<String, serde_json::Value>, PreferenceError> {
        if !self.path.exists() {
            return Ok(serde_json::Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saved panel ordering, or the default when none is stored.
    pub fn load_display_order(&self) -> Result<DisplayOrder, PreferenceError> {
        let entries = self.read_entries()?;
        match entries.get(DISPLAY_ORDER_KEY) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => {
                debug!(path = %self.path.display(), "No saved display order, using default");
                Ok(DisplayOrder::default())
            }
        }
    }

    /// Like [`load_display_order`](Self::load_display_order), but an
    /// unreadable file falls back to the default.
    pub fn load_display_order_or_default(&self) -> DisplayOrder {
        self.load_display_order().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring unreadable preferences");
            DisplayOrder::default()
        })
    }

    /// Store the panel ordering, keeping any other entries in the file.
    ///
    /// An existing file that cannot be parsed is left untouched and the save
    /// fails.
    pub fn save_display_order(&self, order: &DisplayOrder) -> Result<(), PreferenceError> {
        let mut entries = self.read_entries()?;
        entries.insert(DISPLAY_ORDER_KEY.to_string(), serde_json::to_value(order)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        debug!(path = %self.path.display(), "Display order saved");
        Ok(())
    }
}
