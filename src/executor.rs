//! Executor module - runs statements and stored procedures against a [`Connection`]
//!
//! Every call prepares its own statement, binds the parameters positionally, and releases the
//! cursor and then the statement before returning, whether it succeeded or not.

use log::{debug, trace, warn};

use crate::config::Config;
use crate::driver::{Connection, Cursor, GeneratedKeys, PreparedStatement};
use crate::error::Result;
use crate::materialize::{self, Document};
use crate::record::RecordType;
use crate::value::{FromValue, Value};

/// Build the invocation text for a stored procedure taking `param_count` parameters.
///
/// ```
/// use sqlite_rowmap::call_statement_sql;
///
/// assert_eq!(call_statement_sql("add_user", 2), "call add_user(?, ?)");
/// assert_eq!(call_statement_sql("purge", 0), "call purge()");
/// ```
pub fn call_statement_sql(name: &str, param_count: usize) -> String {
    format!("call {}({})", name, vec!["?"; param_count].join(", "))
}

#[derive(Debug, Clone, Copy)]
enum Source<'s> {
    Sql(&'s str),
    Procedure(&'s str),
}

/// Statement execution against a borrowed connection.
///
/// The connection is used exclusively for the duration of each call; callers sharing it across
/// threads must serialize access themselves.
#[derive(Debug)]
pub struct Executor<'a, C: Connection> {
    conn: &'a C,
    config: &'a Config,
}

impl<'a, C: Connection> Executor<'a, C> {
    pub fn new(conn: &'a C, config: &'a Config) -> Self {
        Executor { conn, config }
    }

    /// Execute an INSERT/UPDATE/DELETE and return the affected row count.
    pub fn execute_update(&self, sql: &str, params: &[Value]) -> Result<u64> {
        debug!("update: {} ({} params)", sql, params.len());
        let stmt = self.conn.prepare(sql, GeneratedKeys::NotReturned)?;
        run(stmt, params, |stmt| stmt.execute_update())
    }

    /// Execute an INSERT and return the first generated key.
    ///
    /// Returns -1 when `has_generated_key` is false or the statement produced no key.
    pub fn execute_insert(
        &self,
        sql: &str,
        has_generated_key: bool,
        params: &[Value],
    ) -> Result<i64> {
        debug!("insert: {} ({} params)", sql, params.len());
        let keys = if has_generated_key {
            GeneratedKeys::Returned
        } else {
            GeneratedKeys::NotReturned
        };
        let stmt = self.conn.prepare(sql, keys)?;
        run(stmt, params, |stmt| {
            stmt.execute_update()?;
            if !has_generated_key {
                return Ok(-1);
            }
            Ok(stmt.generated_key()?.unwrap_or(-1))
        })
    }

    /// Call a stored procedure for its update count.
    pub fn execute_stored_procedure(&self, name: &str, params: &[Value]) -> Result<u64> {
        let sql = call_statement_sql(name, params.len());
        debug!("procedure: {}", sql);
        let stmt = self.conn.prepare_call(&sql)?;
        run(stmt, params, |stmt| stmt.execute_update())
    }

    pub fn query_documents(&self, sql: &str, params: &[Value]) -> Result<Vec<Document>> {
        self.query_rows(Source::Sql(sql), params, |cursor| {
            materialize::documents(cursor, self.config)
        })
    }

    /// First row of [`query_documents`](Self::query_documents); further rows are discarded.
    pub fn query_document(&self, sql: &str, params: &[Value]) -> Result<Option<Document>> {
        first(self.query_documents(sql, params))
    }

    /// Procedure results as documents. A procedure without a result set yields no documents.
    pub fn query_documents_sp(&self, name: &str, params: &[Value]) -> Result<Vec<Document>> {
        self.query_rows(Source::Procedure(name), params, |cursor| {
            materialize::documents(cursor, self.config)
        })
    }

    pub fn query_document_sp(&self, name: &str, params: &[Value]) -> Result<Option<Document>> {
        first(self.query_documents_sp(name, params))
    }

    pub fn query_records<T>(
        &self,
        sql: &str,
        record: &RecordType<T>,
        params: &[Value],
    ) -> Result<Vec<T>> {
        self.query_rows(Source::Sql(sql), params, |cursor| {
            materialize::records(cursor, record)
        })
    }

    pub fn query_record<T>(
        &self,
        sql: &str,
        record: &RecordType<T>,
        params: &[Value],
    ) -> Result<Option<T>> {
        first(self.query_records(sql, record, params))
    }

    pub fn query_records_sp<T>(
        &self,
        name: &str,
        record: &RecordType<T>,
        params: &[Value],
    ) -> Result<Vec<T>> {
        self.query_rows(Source::Procedure(name), params, |cursor| {
            materialize::records(cursor, record)
        })
    }

    pub fn query_record_sp<T>(
        &self,
        name: &str,
        record: &RecordType<T>,
        params: &[Value],
    ) -> Result<Option<T>> {
        first(self.query_records_sp(name, record, params))
    }

    /// Values of the 1-based `column` across all rows.
    pub fn query_column<T: FromValue>(
        &self,
        sql: &str,
        column: usize,
        params: &[Value],
    ) -> Result<Vec<T>> {
        self.query_rows(Source::Sql(sql), params, |cursor| {
            materialize::column(cursor, column)
        })
    }

    pub fn query_scalar<T: FromValue>(
        &self,
        sql: &str,
        column: usize,
        params: &[Value],
    ) -> Result<Option<T>> {
        first(self.query_column(sql, column, params))
    }

    pub fn query_column_sp<T: FromValue>(
        &self,
        name: &str,
        column: usize,
        params: &[Value],
    ) -> Result<Vec<T>> {
        self.query_rows(Source::Procedure(name), params, |cursor| {
            materialize::column(cursor, column)
        })
    }

    pub fn query_scalar_sp<T: FromValue>(
        &self,
        name: &str,
        column: usize,
        params: &[Value],
    ) -> Result<Option<T>> {
        first(self.query_column_sp(name, column, params))
    }

    fn query_rows<T, F>(&self, source: Source<'_>, params: &[Value], convert: F) -> Result<Vec<T>>
    where
        F: FnOnce(&mut dyn Cursor) -> Result<Vec<T>>,
    {
        let list = match source {
            Source::Sql(sql) => {
                debug!("query: {} ({} params)", sql, params.len());
                let stmt = self.conn.prepare(sql, GeneratedKeys::NotReturned)?;
                run(stmt, params, |stmt| {
                    let mut cursor = stmt.execute_query()?;
                    let rows: &mut dyn Cursor = &mut cursor;
                    let outcome = convert(rows);
                    finish(outcome, cursor.close(), "cursor")
                })?
            }
            Source::Procedure(name) => {
                let sql = call_statement_sql(name, params.len());
                debug!("procedure query: {}", sql);
                let stmt = self.conn.prepare_call(&sql)?;
                run(stmt, params, |stmt| match stmt.execute()? {
                    Some(mut cursor) => {
                        let rows: &mut dyn Cursor = &mut cursor;
                        let outcome = convert(rows);
                        finish(outcome, cursor.close(), "cursor")
                    }
                    None => {
                        debug!("{} produced no result set", sql);
                        Ok(Vec::new())
                    }
                })?
            }
        };
        debug!("materialized {} rows", list.len());
        Ok(list)
    }
}

fn bind_params<S: PreparedStatement>(stmt: &mut S, params: &[Value]) -> Result<()> {
    for (i, param) in params.iter().enumerate() {
        trace!("bind {} = {:?}", i + 1, param);
        stmt.bind(i + 1, param)?;
    }
    Ok(())
}

/// Bind, run `body`, then close the statement.
fn run<S, T, F>(mut stmt: S, params: &[Value], body: F) -> Result<T>
where
    S: PreparedStatement,
    F: FnOnce(&mut S) -> Result<T>,
{
    let outcome = bind_params(&mut stmt, params).and_then(|()| body(&mut stmt));
    finish(outcome, stmt.close(), "statement")
}

/// Combine an operation's outcome with the release of its resource.
///
/// The operation's own error takes precedence over a release failure.
fn finish<T>(outcome: Result<T>, released: Result<()>, resource: &str) -> Result<T> {
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            warn!("failed to close {} after error ({}): {}", resource, err, release_err);
            Err(err)
        }
    }
}

fn first<T>(list: Result<Vec<T>>) -> Result<Option<T>> {
    list.map(|list| list.into_iter().next())
}
