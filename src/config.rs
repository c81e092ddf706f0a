//! Process configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Parsing goes through a lookup function so tests can feed a plain map
//! instead of mutating the process environment. GitHub storage is only
//! selected when its token and repository are both present; otherwise the
//! local backend is used and a warning is logged.

use std::path::PathBuf;

use axum::http::HeaderValue;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_STORAGE_DIR: &str = "storage";
pub const DEFAULT_GITHUB_BRANCH: &str = "main";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0:?}")]
    InvalidPort(String),
    #[error("invalid CORS_ORIGIN: {0:?}")]
    InvalidCorsOrigin(String),
}

/// Which storage backend serves the CRUD surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    GitHub,
}

impl StorageMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::GitHub => "github",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub token: String,
    /// `owner/repo`, validated when the store is built.
    pub repo: String,
    pub branch: String,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub cors_origin: HeaderValue,
    pub storage_mode: StorageMode,
    pub storage_dir: PathBuf,
    /// Present only when `storage_mode` is `GitHub`.
    pub github: Option<GitHubConfig>,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 5001
    /// - `CORS_ORIGIN`: default `http://localhost:5173`; `*` is rejected
    /// - `STORAGE_MODE`: `local` (default) or `github`
    /// - `STORAGE_DIR`: local backend directory, default `storage`
    /// - `GITHUB_TOKEN`, `GITHUB_REPO`: required for `github` mode
    /// - `GITHUB_BRANCH`: default `main`
    /// - `GITHUB_API_URL`: default `https://api.github.com`
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `CORS_ORIGIN` cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` cannot be parsed or `CORS_ORIGIN` is not a
    /// single concrete origin.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let origin = get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_owned());
        // Credentialed CORS cannot use the wildcard origin.
        if origin == "*" {
            return Err(ConfigError::InvalidCorsOrigin(origin));
        }
        let cors_origin = HeaderValue::from_str(&origin).map_err(|_| ConfigError::InvalidCorsOrigin(origin.clone()))?;

        let storage_dir = get("STORAGE_DIR").map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let requested = get("STORAGE_MODE");
        let github = match requested.as_deref() {
            None | Some("local") => None,
            Some("github") => match (get("GITHUB_TOKEN"), get("GITHUB_REPO")) {
                (Some(token), Some(repo)) => Some(GitHubConfig {
                    token,
                    repo,
                    branch: get("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_GITHUB_BRANCH.to_owned()),
                    api_url: get("GITHUB_API_URL")
                        .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_owned())
                        .trim_end_matches('/')
                        .to_owned(),
                }),
                _ => {
                    warn!("STORAGE_MODE is github but GITHUB_TOKEN or GITHUB_REPO is missing; using local storage");
                    None
                }
            },
            Some(other) => {
                warn!(storage_mode = other, "unknown STORAGE_MODE; using local storage");
                None
            }
        };

        let storage_mode = if github.is_some() { StorageMode::GitHub } else { StorageMode::Local };

        Ok(Self { port, cors_origin, storage_mode, storage_dir, github })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
