//! Error types for fastfoodz.
//!
//! One enum covers the snapshot cache, configuration, the search API and the
//! refresh worker. Messages are written to be shown to the user as-is.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong in fastfoodz.
#[derive(Error, Debug)]
pub enum Error {
    // Snapshot cache
    /// The cache database could not be opened.
    #[error("cannot open snapshot cache at {path}: {source}")]
    OpenCache {
        /// Database file.
        path: PathBuf,
        /// Cause.
        #[source]
        source: rusqlite::Error,
    },

    /// A cache read or write failed.
    #[error("snapshot cache error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The cache schema is missing, unreadable or too new.
    #[error("snapshot cache schema: {message}")]
    Schema {
        /// What is wrong with the schema.
        message: String,
    },

    /// The directory for the cache could not be created.
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Cause.
        #[source]
        source: std::io::Error,
    },

    // Configuration
    /// A config source could not be read or did not match the expected shape.
    #[error("cannot load configuration: {0}")]
    LoadConfig(Box<figment::Error>),

    /// A config value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Which value and why.
        message: String,
    },

    // Search API
    /// No API key was configured.
    #[error("no Yelp API key configured (set api.api_key or FASTFOODZ_API__API_KEY)")]
    MissingApiKey,

    /// A search parameter was out of range or inconsistent.
    #[error("invalid search parameter '{name}': {message}")]
    InvalidParam {
        /// Query key of the offending parameter.
        name: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The request never got a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    ApiStatus {
        /// HTTP status code.
        status: u16,
        /// Error description reported by the API.
        message: String,
    },

    /// The configured base URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // Everything else
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A body or stored column was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The refresh worker has shut down.
    #[error("cache worker is not running")]
    WorkerStopped,

    /// A bug.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::LoadConfig(Box::new(err))
    }
}

impl Error {
    /// Build an [`Error::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Build an [`Error::InvalidParam`] for the query key `name`.
    #[must_use]
    pub fn invalid_param(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            name,
            message: message.into(),
        }
    }

    /// Build an [`Error::InvalidConfig`].
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error came from talking to the remote API.
    #[must_use]
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::ApiStatus { .. } | Self::MissingApiKey
        )
    }

    /// Whether the refresh worker is gone.
    #[must_use]
    pub fn is_worker_stopped(&self) -> bool {
        matches!(self, Self::WorkerStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::WorkerStopped.to_string(),
            "cache worker is not running"
        );
        assert_eq!(
            Error::internal("lost the plot").to_string(),
            "internal error: lost the plot"
        );
        assert_eq!(
            Error::invalid_param("limit", "must be at most 50").to_string(),
            "invalid search parameter 'limit': must be at most 50"
        );
        assert_eq!(
            Error::config_validation("keep must be at least 1").to_string(),
            "invalid configuration: keep must be at least 1"
        );
    }

    #[test]
    fn test_api_status_message() {
        let err = Error::ApiStatus {
            status: 401,
            message: "TOKEN_INVALID: Invalid access token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API returned 401: TOKEN_INVALID: Invalid access token"
        );
    }

    #[test]
    fn test_missing_api_key_mentions_env_var() {
        assert!(Error::MissingApiKey
            .to_string()
            .contains("FASTFOODZ_API__API_KEY"));
    }

    #[test]
    fn test_classification() {
        assert!(Error::MissingApiKey.is_api_error());
        assert!(Error::ApiStatus {
            status: 500,
            message: String::new()
        }
        .is_api_error());
        assert!(!Error::WorkerStopped.is_api_error());
        assert!(!Error::internal("x").is_api_error());

        assert!(Error::WorkerStopped.is_worker_stopped());
        assert!(!Error::MissingApiKey.is_worker_stopped());
    }

    #[test]
    fn test_conversions() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));

        let err: Error = serde_json::from_str::<i32>("{").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));

        let err: Error = url::Url::parse("no scheme").unwrap_err().into();
        assert!(matches!(err, Error::Url(_)));

        let err: Error = rusqlite::Connection::open_in_memory()
            .unwrap()
            .execute("NOT SQL", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Sqlite(_)));
    }

    #[test]
    fn test_create_dir_names_the_path() {
        let err = Error::CreateDir {
            path: PathBuf::from("/srv/fastfoodz"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "cannot create directory /srv/fastfoodz: denied"
        );
    }
}
