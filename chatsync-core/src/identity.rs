// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local Identity
//!
//! Where the local user id comes from.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Identity persistence errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("identity file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("identity serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("user id must not be empty")]
    Empty,
}

/// Provides the local user id, if one is known.
pub trait IdentityProvider {
    /// Returns the local user id, or `None` if not signed in.
    fn local_user_id(&self) -> Option<String>;
}

/// Fixed identity.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    /// Creates a provider for a known user.
    pub fn new(user_id: impl Into<String>) -> Self {
        StaticIdentity(Some(user_id.into()))
    }

    /// Creates a provider with no user.
    pub fn anonymous() -> Self {
        StaticIdentity(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn local_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    user_id: String,
}

/// Identity persisted as `{"userId": "..."}` in a JSON file.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileIdentityStore { path: path.into() }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored user id. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<String>, IdentityError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: IdentityRecord = serde_json::from_str(&raw)?;
        Ok(Some(record.user_id).filter(|id| !id.is_empty()))
    }

    /// Stores the user id, creating parent directories as needed.
    pub fn save(&self, user_id: &str) -> Result<(), IdentityError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(IdentityError::Empty);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let record = IdentityRecord {
            user_id: user_id.to_string(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&record)?)?;
        Ok(())
    }

    /// Removes the stored identity. Missing files are not an error.
    pub fn clear(&self) -> Result<(), IdentityError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl IdentityProvider for FileIdentityStore {
    fn local_user_id(&self) -> Option<String> {
        match self.load() {
            Ok(id) => id,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable identity file");
                None
            }
        }
    }
}
