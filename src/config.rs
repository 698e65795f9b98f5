//! Configuration shared by every call: how cells become JSON and how SQLite connections are set up
//!
//! A `Config` is built once at startup and handed out by reference; nothing mutates it afterwards.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Representation of date-like cells in generic documents
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateEncoding {
    /// Milliseconds since the Unix epoch
    #[default]
    EpochMillis,
    /// Seconds since the Unix epoch
    EpochSeconds,
    /// RFC 3339 string with millisecond precision
    Rfc3339,
}

/// Representation of binary cells in generic documents
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlobEncoding {
    /// Standard base64 string
    #[default]
    Base64,
    /// Array of byte values
    Array,
}

/// Connection setup applied by [`SqliteConnection`](crate::SqliteConnection)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SqliteOptions {
    pub foreign_keys: bool,
    pub journal_mode: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        SqliteOptions {
            foreign_keys: true,
            journal_mode: None,
            busy_timeout_ms: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub date_encoding: DateEncoding,
    pub blob_encoding: BlobEncoding,
    pub sqlite: SqliteOptions,
}

impl Config {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
