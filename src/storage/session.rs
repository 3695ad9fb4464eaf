//! File persistence for the signed-in session.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Session;
use crate::storage::{read_json, remove_file, write_json};

/// Keeps the current session in a JSON file between CLI runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, if any.
    pub async fn load(&self) -> Result<Option<Session>> {
        read_json(&self.path).await
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        write_json(&self.path, session).await
    }

    /// Forget the stored session; missing files are fine.
    pub async fn clear(&self) -> Result<()> {
        remove_file(&self.path).await
    }
}
