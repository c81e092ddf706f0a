//! Local filesystem backend: one pretty-printed JSON file per UI.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};
use uischema::{NamedUi, UiSchema};

use super::{StorageError, UiRecord, UiStore, UiSummary, decode_record, encode_record, now, sort_summaries};
use crate::config::StorageMode;

/// Suffix for in-flight writes; `list` only picks up `.json` files.
const TEMP_SUFFIX: &str = "tmp";

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// The directory is created lazily on first save or list.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Unique sibling path for one in-flight write of `name`.
    fn temp_path_for(&self, name: &str) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(".{name}.{}.{seq}.{TEMP_SUFFIX}", std::process::id()))
    }

    /// Write to a temp file in the same directory, then rename it over the
    /// target. Readers see either the old record or the new one.
    async fn write_atomic(&self, name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let temp = self.temp_path_for(name);
        tokio::fs::write(&temp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&temp, self.path_for(name)).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                warn!(file = %temp.display(), error = %cleanup, "failed to remove temp record");
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn read_record(&self, name: &str) -> Result<Option<UiRecord>, StorageError> {
        match tokio::fs::read(self.path_for(name)).await {
            Ok(bytes) => decode_record(name, &bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl UiStore for LocalStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    async fn save(&self, name: &str, schema: &UiSchema) -> Result<(), StorageError> {
        self.ensure_dir().await?;

        let created_at = match self.read_record(name).await {
            Ok(Some(existing)) => existing.created_at.unwrap_or_else(now),
            Ok(None) => now(),
            Err(e) => {
                warn!(name, error = %e, "existing record unreadable; resetting createdAt");
                now()
            }
        };

        let record = UiRecord { schema: schema.clone(), created_at: Some(created_at) };
        self.write_atomic(name, encode_record(&record)?).await?;
        info!(name, path = %self.path_for(name).display(), "UI record written");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<NamedUi>, StorageError> {
        Ok(self.read_record(name).await?.map(|record| record.into_named(name)))
    }

    async fn list(&self) -> Result<Vec<UiSummary>, StorageError> {
        self.ensure_dir().await?;

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if uischema::validate_name(name).is_err() {
                debug!(file = %path.display(), "skipping file with invalid UI name");
                continue;
            }

            let created_at = match self.read_record(name).await {
                Ok(Some(record)) => record.created_at,
                Ok(None) => continue,
                Err(e) => {
                    warn!(name, error = %e, "record metadata unreadable; listing name only");
                    None
                }
            };
            entries.push(UiSummary { name: name.to_owned(), created_at });
        }

        sort_summaries(&mut entries);
        Ok(entries)
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(name)).await {
            Ok(()) => {
                info!(name, "UI record deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_owned())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
