//! Durable local storage for the wizard session.
//!
//! One fixed key maps to the whole serialized record. Absence of the file
//! means "no prior session". Persistence is a convenience: callers treat
//! every failure here as non-fatal and keep the in-memory record
//! authoritative.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::models::record::CvRecord;

/// The single storage key for the wizard session.
pub const STORAGE_KEY: &str = "cv_builder_data";

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        FileStore {
            path: data_dir.join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Loads the saved record, if any. A missing file is a normal first run;
    /// an unreadable or unparsable blob is logged and treated as absent.
    pub async fn load(&self) -> Option<CvRecord> {
        let blob = match tokio::fs::read_to_string(&self.path).await {
            Ok(blob) => blob,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read saved session {}: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&blob) {
            Ok(record) => {
                info!("Restored saved session from {}", self.path.display());
                Some(record)
            }
            Err(e) => {
                warn!("Saved session is not valid JSON, ignoring: {e}");
                None
            }
        }
    }

    /// Writes an already-serialized record blob.
    pub async fn save(&self, blob: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, blob).await
    }

    /// Erases the saved session. Erasing an absent session is a no-op.
    pub async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut record = CvRecord::default();
        record.personal_info.first_name = "Ahmed".to_string();
        let blob = serde_json::to_string(&record).unwrap();

        store.save(&blob).await.unwrap();
        let loaded = store.load().await.expect("record should load");
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_corrupt_blob_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("{not json").await.unwrap();
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("{}").await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.is_none());
    }
}
