//! Db module - SQLite implementation of the driver capabilities

mod database;
mod params;
mod row;
mod statement;

pub use database::{parse_call, SqliteConnection};
pub use params::{format_timestamp, TIMESTAMP_FORMAT};
pub use row::{is_temporal_decltype, parse_timestamp, sqlite_to_value, SqliteCursor};
pub use statement::SqliteStatement;
