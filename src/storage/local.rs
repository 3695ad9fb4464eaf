//! Local filesystem storage implementation.
//!
//! Keeps every pitch row in a single `pitches.json` file so the generator can
//! run without a hosted backend. Writes are atomic (temp file + rename) and
//! serialized through a mutex.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{NewPitch, Pitch, PitchId};
use crate::storage::{PitchStore, read_json, write_json};

/// Local filesystem pitch store.
pub struct LocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a store keeping `pitches.json` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("pitches.json"),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_all(&self) -> Result<Vec<Pitch>> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    /// Stable short id from owner, title, timestamp and row position.
    fn make_id(user_id: &str, title: &str, created_at: DateTime<Utc>, seq: usize) -> PitchId {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update(title.as_bytes());
        hasher.update(created_at.to_rfc3339().as_bytes());
        hasher.update(seq.to_le_bytes());
        PitchId(hex::encode(hasher.finalize())[..16].to_string())
    }
}

#[async_trait]
impl PitchStore for LocalStore {
    async fn insert(&self, pitch: NewPitch) -> Result<Pitch> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load_all().await?;

        let created_at = Utc::now();
        let row = Pitch {
            id: Self::make_id(&pitch.user_id, &pitch.title, created_at, rows.len()),
            user_id: pitch.user_id,
            title: pitch.title,
            short_description: pitch.short_description,
            industry: Some(pitch.industry),
            tone: Some(pitch.tone),
            language: Some(pitch.language),
            generated_data: pitch.generated_data,
            landing_code: pitch.landing_code,
            created_at,
        };

        rows.push(row.clone());
        write_json(&self.path, &rows).await?;
        log::info!("Saved pitch {} to {}", row.id, self.path.display());
        Ok(row)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Pitch>> {
        let mut rows: Vec<Pitch> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|p| p.user_id == user_id)
            .collect();
        // Later inserts win ties on equal timestamps.
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn delete(&self, user_id: &str, id: &PitchId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.load_all().await?;

        let before = rows.len();
        rows.retain(|p| !(p.user_id == user_id && &p.id == id));
        if rows.len() == before {
            return Err(AppError::NotFound(format!("pitch {id}")));
        }

        write_json(&self.path, &rows).await?;
        log::info!("Deleted pitch {} from {}", id, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PitchData;
    use tempfile::TempDir;

    fn new_pitch(user: &str, name: &str) -> NewPitch {
        let data = PitchData {
            name: name.into(),
            ..PitchData::default()
        }
        .with_defaults();
        NewPitch::new(user, data, Some("<html></html>".into()))
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let first = store.insert(new_pitch("u1", "Alpha")).await.unwrap();
        let second = store.insert(new_pitch("u1", "Beta")).await.unwrap();
        store.insert(new_pitch("u2", "Gamma")).await.unwrap();

        let rows = store.list("u1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].id, first.id);
        assert_ne!(first.id, second.id);
        assert_eq!(rows[0].industry.as_deref(), Some("Technology"));
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_owner() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let row = store.insert(new_pitch("u1", "Alpha")).await.unwrap();
        assert_eq!(store.get("u1", &row.id).await.unwrap().title, "Alpha");
        assert!(matches!(
            store.get("u2", &row.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let row = store.insert(new_pitch("u1", "Alpha")).await.unwrap();

        assert!(matches!(
            store.delete("u2", &row.id).await,
            Err(AppError::NotFound(_))
        ));
        store.delete("u1", &row.id).await.unwrap();
        assert!(store.list("u1").await.unwrap().is_empty());
        assert!(matches!(
            store.delete("u1", &row.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        assert!(store.list("u1").await.unwrap().is_empty());
        assert!(!store.path().exists());
    }
}
