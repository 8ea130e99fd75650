use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// One of the dashboard inputs could not be fetched; no stats were computed.
    #[error("{message}")]
    Fetch { message: String },

    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap any error as a dashboard fetch failure, keeping its message verbatim.
    pub fn fetch(e: impl fmt::Display) -> Self {
        Error::Fetch {
            message: e.to_string(),
        }
    }

    /// Convert into a fetch failure. Backend errors keep only the backend's message.
    pub fn into_fetch(self) -> Self {
        match self {
            Error::Fetch { .. } => self,
            Error::Api { message, .. } => Error::Fetch { message },
            other => Error::fetch(other),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Database(e.to_string())
    }
}

impl From<rusqlite_migration::Error> for Error {
    fn from(e: rusqlite_migration::Error) -> Self {
        Error::Migration(e.to_string())
    }
}

impl<E: fmt::Display> From<tokio_rusqlite::Error<E>> for Error {
    fn from(e: tokio_rusqlite::Error<E>) -> Self {
        Error::Database(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
