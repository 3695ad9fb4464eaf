//! Storage abstractions for pitch persistence.
//!
//! Two backends implement [`PitchStore`]:
//! - [`SupabaseStore`]: the hosted `pitches` table behind the PostgREST API
//! - [`LocalStore`]: a JSON file in the data directory for offline use
//!
//! ## Data Directory
//!
//! ```text
//! storage/
//! ├── config.toml       # Application configuration
//! ├── session.json      # Signed-in session (supabase backend)
//! ├── pitches.json      # Pitch rows (local backend)
//! └── previews/         # Landing pages written by `preview`
//!     └── {id}.html
//! ```

pub mod local;
pub mod session;
pub mod supabase;

use std::path::Path;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{NewPitch, Pitch, PitchId};

// Re-export for convenience
pub use local::LocalStore;
pub use session::SessionStore;
pub use supabase::SupabaseStore;

/// Trait for pitch storage backends.
///
/// Every operation is scoped to one owning user.
#[async_trait]
pub trait PitchStore: Send + Sync {
    /// Insert a pitch and return the stored row.
    async fn insert(&self, pitch: NewPitch) -> Result<Pitch>;

    /// All pitches of a user, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Pitch>>;

    /// One pitch of a user.
    async fn get(&self, user_id: &str, id: &PitchId) -> Result<Pitch> {
        self.list(user_id)
            .await?
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("pitch {id}")))
    }

    /// Delete a pitch of a user; unknown ids are `NotFound`.
    async fn delete(&self, user_id: &str, id: &PitchId) -> Result<()>;
}

/// Write bytes atomically (write to temp, then rename).
pub(crate) async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Write pretty JSON atomically.
pub(crate) async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_bytes(path, &bytes).await
}

/// Read JSON, returning None if the file doesn't exist.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Remove a file, ignoring a missing one.
pub(crate) async fn remove_file(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Io(e)),
    }
}
