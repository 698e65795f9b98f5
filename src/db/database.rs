//! Database module - provides the SqliteConnection struct for SQLite connections

use std::collections::HashMap;
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{Config, SqliteOptions};
use crate::db::SqliteStatement;
use crate::driver::{Connection, GeneratedKeys};
use crate::error::{to_statement_error, Error, Result};

/// `call <name>(?, ?, ...)` as produced by [`call_statement_sql`](crate::call_statement_sql)
static CALL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*call\s+([A-Za-z_][A-Za-z0-9_.]*)\s*\(\s*((?:\?\s*,\s*)*\?)?\s*\)\s*;?\s*$")
        .unwrap()
});

/// Parse a procedure call into its name and placeholder count
pub fn parse_call(sql: &str) -> Option<(&str, usize)> {
    let captures = CALL_REGEX.captures(sql)?;
    let name = captures.get(1)?.as_str();
    let arity = captures
        .get(2)
        .map_or(0, |args| args.as_str().matches('?').count());
    Some((name, arity))
}

/// SQLite database connection
///
/// SQLite has no stored procedures. Procedures are registered single-statement bodies that
/// `call <name>(...)` invocations are resolved to.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    procedures: HashMap<String, String>,
}

impl SqliteConnection {
    /// Open a database file
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let conn = rusqlite::Connection::open(path).map_err(to_statement_error)?;
        Self::configured(conn, &config.sqlite)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(config: &Config) -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(to_statement_error)?;
        Self::configured(conn, &config.sqlite)
    }

    /// Wrap an already configured rusqlite connection
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        SqliteConnection {
            conn,
            procedures: HashMap::new(),
        }
    }

    fn configured(conn: rusqlite::Connection, options: &SqliteOptions) -> Result<Self> {
        // Enable extended result codes for better error handling
        conn.execute_batch("PRAGMA extended_result_codes = ON")
            .map_err(to_statement_error)?;
        conn.pragma_update(None, "foreign_keys", options.foreign_keys)
            .map_err(to_statement_error)?;
        if let Some(mode) = &options.journal_mode {
            // journal_mode reports the resulting mode as a row
            let applied: String = conn
                .pragma_update_and_check(None, "journal_mode", mode, |row| row.get(0))
                .map_err(to_statement_error)?;
            debug!("journal_mode = {}", applied);
        }
        if let Some(ms) = options.busy_timeout_ms {
            conn.busy_timeout(std::time::Duration::from_millis(ms))
                .map_err(to_statement_error)?;
        }
        Ok(Self::from_connection(conn))
    }

    /// Register `body` as the statement run by `call <name>(...)`
    pub fn register_procedure(&mut self, name: impl Into<String>, body: impl Into<String>) {
        let name = name.into();
        debug!("registered procedure {}", name);
        self.procedures.insert(name, body.into());
    }

    /// Run one or more statements outside the execution layer, e.g. schema setup
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(to_statement_error)
    }
}

impl Connection for SqliteConnection {
    type Statement<'c> = SqliteStatement<'c>;

    fn prepare(&self, sql: &str, keys: GeneratedKeys) -> Result<SqliteStatement<'_>> {
        let stmt = self.conn.prepare(sql).map_err(to_statement_error)?;
        Ok(SqliteStatement::new(&self.conn, stmt, keys))
    }

    fn prepare_call(&self, sql: &str) -> Result<SqliteStatement<'_>> {
        let (name, arity) = parse_call(sql)
            .ok_or_else(|| Error::statement(format!("malformed procedure call: {}", sql)))?;
        let body = self
            .procedures
            .get(name)
            .ok_or_else(|| Error::statement(format!("no such procedure: {}", name)))?;

        let stmt = self.prepare(body, GeneratedKeys::NotReturned)?;
        if stmt.parameter_count() != arity {
            return Err(Error::statement(format!(
                "procedure {} takes {} parameters, called with {}",
                name,
                stmt.parameter_count(),
                arity
            )));
        }
        Ok(stmt)
    }
}
