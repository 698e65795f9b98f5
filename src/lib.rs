//! Map SQL query results onto Rust records, scalar lists and JSON documents.
//!
//! [`Executor`] prepares and runs statements or stored-procedure calls on any [`Connection`],
//! binding [`Value`] parameters positionally. Result rows are materialized into records described
//! by a [`RecordType`], into a single column of scalars, or into ordered JSON [`Document`]s.
//! [`SqliteConnection`] provides the SQLite-backed connection.

pub mod config;
pub mod db;
pub mod driver;
mod error;
pub mod executor;
pub mod materialize;
mod models;
pub mod record;
mod value;

pub use config::{BlobEncoding, Config, DateEncoding, SqliteOptions};
pub use db::{SqliteConnection, SqliteCursor, SqliteStatement};
pub use driver::{Connection, Cursor, GeneratedKeys, MemoryCursor, PreparedStatement};
pub use error::{DriverError, Error, Result, ValueError};
pub use executor::{call_statement_sql, Executor};
pub use materialize::{documents_to_json, Document};
pub use models::{column_info, ColumnInfo, ColumnMap};
pub use record::{Binding, Field, RecordType, UNSPECIFIED_COLUMN};
pub use value::{params_from_json, FromValue, Value};
