//! GitHub backend: records live under `schemas/<name>.json` in a repository
//! branch and are read and written through the REST contents API.
//!
//! ERROR HANDLING
//! ==============
//! Saving is read-then-write without compare-and-swap. Two concurrent first
//! saves of the same new name both attempt a create; GitHub rejects the
//! second (409/422) and that surfaces as `StorageError::Remote`. The race is
//! logged, not retried as an update.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::join_all;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uischema::{NamedUi, UiSchema};

use super::{StorageError, UiRecord, UiStore, UiSummary, decode_record, encode_record, now, sort_summaries};
use crate::config::{GitHubConfig, StorageMode};

const SCHEMA_DIR: &str = "schemas";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("uiforge/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CLIENT
// =============================================================================

pub struct GitHubStore {
    http: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

impl GitHubStore {
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the repository is not `owner/repo`
    /// or the HTTP client cannot be built.
    pub fn new(config: &GitHubConfig) -> Result<Self, StorageError> {
        let (owner, repo) = parse_repo(&config.repo)?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        info!(%owner, %repo, branch = %config.branch, "GitHub storage initialized");
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            owner,
            repo,
            branch: config.branch.clone(),
            token: config.token.clone(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/contents/{path}", self.api_url, self.owner, self.repo)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.contents_url(path))
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, StorageError> {
        builder.send().await.map_err(|e| StorageError::Request(e.to_string()))
    }

    /// Fetch the contents entry for one record. `Ok(None)` on 404.
    async fn fetch_file(&self, name: &str) -> Result<Option<ContentFile>, StorageError> {
        let response = Self::send(self.request(Method::GET, &file_path(name)).query(&[("ref", &self.branch)])).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = success_text(response).await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn fetch_record(&self, name: &str) -> Result<Option<UiRecord>, StorageError> {
        let Some(file) = self.fetch_file(name).await? else {
            return Ok(None);
        };
        let bytes = decode_content(name, file.content.as_deref().unwrap_or_default())?;
        decode_record(name, &bytes).map(Some)
    }
}

#[async_trait::async_trait]
impl UiStore for GitHubStore {
    fn mode(&self) -> StorageMode {
        StorageMode::GitHub
    }

    async fn save(&self, name: &str, schema: &UiSchema) -> Result<(), StorageError> {
        let existing = self.fetch_file(name).await?;

        let created_at = match &existing {
            None => now(),
            Some(file) => match decode_content(name, file.content.as_deref().unwrap_or_default())
                .and_then(|bytes| decode_record(name, &bytes))
            {
                Ok(record) => record.created_at.unwrap_or_else(now),
                Err(e) => {
                    warn!(name, error = %e, "existing record unreadable; resetting createdAt");
                    now()
                }
            },
        };

        let record = UiRecord { schema: schema.clone(), created_at: Some(created_at) };
        let sha = existing.as_ref().map(|file| file.sha.as_str());
        let verb = if sha.is_some() { "Update" } else { "Create" };
        let body = PutBody {
            message: format!("{verb} UI schema: {name}"),
            content: STANDARD.encode(encode_record(&record)?),
            sha,
            branch: &self.branch,
        };

        let response = Self::send(self.request(Method::PUT, &file_path(name)).json(&body)).await?;
        match success_text(response).await {
            Ok(_) => {
                info!(name, action = verb, "UI record committed");
                Ok(())
            }
            Err(StorageError::Remote { status: status @ (409 | 422), body }) if sha.is_none() => {
                warn!(name, status, "concurrent first save of this name; create rejected by remote");
                Err(StorageError::Remote { status, body })
            }
            Err(e) => Err(e),
        }
    }

    async fn get(&self, name: &str) -> Result<Option<NamedUi>, StorageError> {
        Ok(self.fetch_record(name).await?.map(|record| record.into_named(name)))
    }

    async fn list(&self) -> Result<Vec<UiSummary>, StorageError> {
        let response = Self::send(self.request(Method::GET, SCHEMA_DIR).query(&[("ref", &self.branch)])).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let listing: Value = serde_json::from_str(&success_text(response).await?)?;
        let names = schema_names(&listing);

        let lookups = names.iter().map(|name| async move {
            let created_at = match self.fetch_record(name).await {
                Ok(record) => record.and_then(|r| r.created_at),
                Err(e) => {
                    warn!(name = %name, error = %e, "record metadata unreadable; listing name only");
                    None
                }
            };
            UiSummary { name: name.clone(), created_at }
        });
        let mut entries = join_all(lookups).await;

        sort_summaries(&mut entries);
        Ok(entries)
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let Some(file) = self.fetch_file(name).await? else {
            return Err(StorageError::NotFound(name.to_owned()));
        };

        let body = DeleteBody { message: format!("Delete UI schema: {name}"), sha: &file.sha, branch: &self.branch };
        let response = Self::send(self.request(Method::DELETE, &file_path(name)).json(&body)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(name.to_owned()));
        }
        success_text(response).await?;
        info!(name, "UI record deleted");
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ContentFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    message: String,
    sha: &'a str,
    branch: &'a str,
}

// =============================================================================
// PARSING
// =============================================================================

fn file_path(name: &str) -> String {
    format!("{SCHEMA_DIR}/{name}.json")
}

/// Return the body of a 2xx response, or `StorageError::Remote`.
async fn success_text(response: Response) -> Result<String, StorageError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| StorageError::Request(e.to_string()))?;
    if !status.is_success() {
        return Err(StorageError::Remote { status: status.as_u16(), body: text });
    }
    Ok(text)
}

/// Split `owner/repo`, stripping a trailing `.git`. URLs are rejected.
fn parse_repo(raw: &str) -> Result<(String, String), StorageError> {
    let invalid = || StorageError::Config(format!("invalid GITHUB_REPO {raw:?}; expected \"owner/repo\""));

    let trimmed = raw.trim();
    if trimmed.contains("http://") || trimmed.contains("https://") || trimmed.contains("github.com") {
        return Err(invalid());
    }
    let trimmed = match trimmed.strip_suffix(".git") {
        Some(stripped) => {
            warn!(repo = trimmed, "removing .git suffix from GITHUB_REPO");
            stripped
        }
        None => trimmed,
    };

    match trimmed.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_owned(), repo.to_owned()))
        }
        _ => Err(invalid()),
    }
}

/// Decode the base64 `content` field; GitHub wraps it at 60 columns.
fn decode_content(name: &str, content: &str) -> Result<Vec<u8>, StorageError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| StorageError::Corrupt { name: name.to_owned(), reason: format!("base64: {e}") })
}

/// Record names from a directory listing: `*.json` files with valid names.
fn schema_names(listing: &Value) -> Vec<String> {
    let Some(entries) = listing.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|entry| entry.get("type").and_then(Value::as_str) == Some("file"))
        .filter_map(|entry| entry.get("name").and_then(Value::as_str))
        .filter_map(|file| file.strip_suffix(".json"))
        .filter(|name| uischema::validate_name(name).is_ok())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "github_test.rs"]
mod tests;
