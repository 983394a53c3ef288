//! Persistence of the rotating refresh token
//!
//! The state file is a small JSON document with a `refresh_token` field.
//! A missing or unreadable file degrades to an empty state; writes go through
//! a temporary file and a rename so a crash never leaves a truncated document.

use crate::error::{BridgeError, Result};
use crate::logging::get_logger;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Most recently issued rotating refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Unknown fields written by other tools are carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// File-backed store for [`SessionState`]
pub struct SessionStore {
    file_path: PathBuf,
    state: SessionState,
    logger: crate::logging::StructuredLogger,
}

impl SessionStore {
    /// Create a store with an empty state; call [`SessionStore::load`] to read the file
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            state: SessionState::default(),
            logger: get_logger("persistence"),
        }
    }

    /// Create a store and load whatever the file holds
    pub fn open<P: AsRef<Path>>(file_path: P) -> Self {
        let mut store = Self::new(file_path);
        store.load();
        store
    }

    /// Load state from disk; absence or corruption yields an empty state
    pub fn load(&mut self) {
        let path = self.file_path.as_path();

        if !path.exists() {
            self.logger
                .info("No session state file found, starting without a refresh token");
            self.state = SessionState::default();
            return;
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(BridgeError::from)
            .and_then(|contents| {
                serde_json::from_str::<SessionState>(&contents).map_err(BridgeError::from)
            });

        match parsed {
            Ok(state) => {
                self.state = state;
                self.logger.debug("Loaded session state from disk");
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Ignoring unreadable session state file: {e}"));
                self.state = SessionState::default();
            }
        }
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&self.state)?;
        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.file_path)?;
        self.logger.debug("Saved session state to disk");

        Ok(())
    }

    /// Current refresh token, if one has been issued
    pub fn refresh_token(&self) -> Option<&str> {
        self.state.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Overwrite the refresh token and persist immediately
    pub fn set_refresh_token(&mut self, token: impl Into<String>) -> Result<()> {
        self.state.refresh_token = Some(token.into());
        self.save()
    }

    /// Current in-memory state
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Path of the backing file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }
}
