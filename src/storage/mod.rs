//! Storage gateway: persistence of named UI schemas.
//!
//! ARCHITECTURE
//! ============
//! Handlers talk to an `Arc<dyn UiStore>`. Two interchangeable backends
//! implement it: a local directory of JSON files and a GitHub repository
//! accessed through the contents API. The backend is chosen once at startup
//! by [`build_store`] and never switched afterwards.
//!
//! DESIGN
//! ======
//! - Record format is shared: `{ "schema": [...], "createdAt": "<RFC 3339>" }`
//!   addressed as `<name>.json`.
//! - `createdAt` is set on first write and preserved on every overwrite, in
//!   both backends.
//! - Stores do not validate names; callers pass names that already passed
//!   `uischema::validate_name`. Schemas are typed, so they are well-formed
//!   by construction.
//! - No locking: concurrent saves of one name race and the last write wins.

pub mod github;
pub mod local;

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};
use uischema::{NamedUi, UiSchema};

use crate::config::{Config, StorageMode};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("UI not found: {0}")]
    NotFound(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored record {name} is invalid: {reason}")]
    Corrupt { name: String, reason: String },
    #[error("remote request failed: {0}")]
    Request(String),
    #[error("remote responded with status {status}")]
    Remote { status: u16, body: String },
    #[error("invalid storage configuration: {0}")]
    Config(String),
}

// =============================================================================
// RECORDS
// =============================================================================

/// On-disk / in-repo record for one named UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiRecord {
    pub schema: UiSchema,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}

impl UiRecord {
    #[must_use]
    pub fn into_named(self, name: &str) -> NamedUi {
        NamedUi { name: name.to_owned(), schema: self.schema, created_at: self.created_at }
    }
}

/// Listing entry. `created_at` is absent when the record could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSummary {
    pub name: String,
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}

/// Decode a record, treating any parse or schema failure as corruption.
pub(crate) fn decode_record(name: &str, bytes: &[u8]) -> Result<UiRecord, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt { name: name.to_owned(), reason: e.to_string() })
}

pub(crate) fn encode_record(record: &UiRecord) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec_pretty(record)?)
}

/// Current UTC time truncated to milliseconds.
pub(crate) fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_millisecond(now.millisecond()).unwrap_or(now)
}

/// Timestamped entries newest first (ties by name), then the rest by name.
pub fn sort_summaries(entries: &mut [UiSummary]) {
    entries.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
}

// =============================================================================
// STORE CONTRACT
// =============================================================================

/// Backend-agnostic persistence contract for named UIs.
#[async_trait::async_trait]
pub trait UiStore: Send + Sync {
    /// Backend identifier reported by the health endpoint.
    fn mode(&self) -> StorageMode;

    /// Create or overwrite the record for `name`.
    async fn save(&self, name: &str, schema: &UiSchema) -> Result<(), StorageError>;

    /// Fetch one record. `Ok(None)` means not found.
    async fn get(&self, name: &str) -> Result<Option<NamedUi>, StorageError>;

    /// All stored names, ordered by [`sort_summaries`].
    async fn list(&self) -> Result<Vec<UiSummary>, StorageError>;

    /// Remove one record; `StorageError::NotFound` if absent.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Build the configured backend, falling back to local storage if the
/// GitHub backend cannot be constructed.
#[must_use]
pub fn build_store(config: &Config) -> Arc<dyn UiStore> {
    if let (StorageMode::GitHub, Some(gh)) = (config.storage_mode, &config.github) {
        match github::GitHubStore::new(gh) {
            Ok(store) => return Arc::new(store),
            Err(e) => warn!(error = %e, "GitHub storage unavailable; falling back to local storage"),
        }
    }
    let store = local::LocalStore::new(config.storage_dir.clone());
    info!(dir = %store.dir().display(), "local storage initialized");
    Arc::new(store)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
