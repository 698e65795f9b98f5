//! Error types shared by the execution and materialization layers

use rusqlite::Error as SqliteError;
use thiserror::Error;

/// Boxed driver-side cause carried by [`Error::Statement`].
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced to callers. Nothing is retried or swallowed internally.
#[derive(Debug, Error)]
pub enum Error {
    /// Preparation, binding, execution or cursor access failed at the database boundary.
    #[error("statement failed: {message}")]
    Statement {
        message: String,
        #[source]
        source: Option<DriverError>,
    },

    /// The record type has no zero-argument constructor.
    #[error("cannot instantiate `{record}`: no zero-argument constructor")]
    Instantiation { record: String },

    /// A cell could not be assigned to its target.
    #[error("cannot assign column {column} to `{target}`: {source}")]
    Access {
        target: String,
        column: usize,
        #[source]
        source: ValueError,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Statement error without an underlying driver cause.
    pub fn statement(message: impl Into<String>) -> Self {
        Error::Statement {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A cell value does not fit the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ValueError {
    pub fn new(expected: &'static str, found: &'static str) -> Self {
        ValueError { expected, found }
    }
}

pub(crate) fn to_statement_error(err: SqliteError) -> Error {
    Error::Statement {
        message: format!("SQLite Error: {}", err),
        source: Some(Box::new(err)),
    }
}
