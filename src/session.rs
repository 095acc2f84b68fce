//! Room designer session state.
//!
//! The session records the initial room description, every component added
//! since, and the image set produced by the last successful generation. The
//! CLI keeps it in a JSON file so `init` and `add` can run as separate
//! invocations.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Violations of the session's input rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionRule {
    #[error("Please enter a valid room description.")]
    EmptyDescription,
    #[error("Please initialize the room first.")]
    NotInitialized,
    #[error("Please enter a valid component description.")]
    EmptyComponent,
}

/// Failures reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read session file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse session file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write session file '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSession {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl RoomSession {
    /// Starts a new room, discarding components and images.
    pub fn initialize(&mut self, description: &str) -> Result<(), SessionRule> {
        check_description(description)?;
        self.description = description.to_string();
        self.components.clear();
        self.images.clear();
        Ok(())
    }

    /// Records a component addition.
    pub fn add_component(&mut self, component: &str) -> Result<(), SessionRule> {
        self.check_component(component)?;
        self.components.push(component.to_string());
        Ok(())
    }

    /// Checks whether `component` could be added without adding it.
    pub fn check_component(&self, component: &str) -> Result<(), SessionRule> {
        if !self.is_initialized() {
            return Err(SessionRule::NotInitialized);
        }
        if component.trim().is_empty() {
            return Err(SessionRule::EmptyComponent);
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        !self.description.is_empty()
    }

    /// Description followed by every component, space separated.
    pub fn cumulative_description(&self) -> String {
        let mut text = self.description.clone();
        for component in &self.components {
            text.push(' ');
            text.push_str(component);
        }
        text
    }

    pub fn set_images(&mut self, images: Vec<String>) {
        self.images = images;
    }

    /// Loads a session; a missing file is an empty session.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SessionError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| SessionError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let write_err = |source: io::Error| SessionError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let body = serde_json::to_string_pretty(self).map_err(|err| SessionError::Write {
            path: path.to_path_buf(),
            source: io::Error::other(err),
        })?;
        fs::write(path, body).map_err(write_err)
    }
}

pub fn check_description(description: &str) -> Result<(), SessionRule> {
    if description.trim().is_empty() {
        return Err(SessionRule::EmptyDescription);
    }
    Ok(())
}

/// Resolves the session file: explicit path, `ROOMGEN_SESSION`, then the
/// XDG state directory.
pub fn session_path(explicit: Option<&Path>) -> Result<PathBuf, String> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = env::var("ROOMGEN_SESSION") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(state) = env::var("XDG_STATE_HOME") {
        let trimmed = state.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed).join("roomgen").join("session.json"));
        }
    }

    let home = env::var("HOME").map_err(|_| {
        "Cannot resolve session path: set --session, ROOMGEN_SESSION or HOME/XDG_STATE_HOME."
            .to_string()
    })?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("state")
        .join("roomgen")
        .join("session.json"))
}
