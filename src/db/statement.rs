//! Statement module - prepared SQLite statements behind the [`PreparedStatement`] capability

use rusqlite::Connection;

use crate::db::row::{is_temporal_decltype, SqliteColumn, SqliteCursor};
use crate::driver::{GeneratedKeys, PreparedStatement};
use crate::error::{to_statement_error, Error, Result};
use crate::value::Value;

/// A prepared statement on a [`SqliteConnection`](crate::SqliteConnection)
pub struct SqliteStatement<'c> {
    conn: &'c Connection,
    stmt: rusqlite::Statement<'c>,
    keys: GeneratedKeys,
    changes: u64,
}

impl<'c> SqliteStatement<'c> {
    pub(crate) fn new(
        conn: &'c Connection,
        stmt: rusqlite::Statement<'c>,
        keys: GeneratedKeys,
    ) -> Self {
        SqliteStatement {
            conn,
            stmt,
            keys,
            changes: 0,
        }
    }

    /// Number of `?` placeholders in the statement
    pub fn parameter_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    fn columns(&self) -> Vec<SqliteColumn> {
        self.stmt
            .columns()
            .iter()
            .map(|column| SqliteColumn {
                name: column.name().to_string(),
                temporal: column.decl_type().is_some_and(is_temporal_decltype),
            })
            .collect()
    }

    fn open_cursor(&mut self) -> SqliteCursor<'_> {
        let columns = self.columns();
        SqliteCursor::new(columns, self.stmt.raw_query())
    }
}

impl<'c> PreparedStatement for SqliteStatement<'c> {
    type Cursor<'s>
        = SqliteCursor<'s>
    where
        Self: 's;

    fn bind(&mut self, position: usize, value: &Value) -> Result<()> {
        self.stmt
            .raw_bind_parameter(position, value)
            .map_err(to_statement_error)
    }

    fn execute_update(&mut self) -> Result<u64> {
        let changes = self.stmt.raw_execute().map_err(to_statement_error)?;
        self.changes = changes as u64;
        Ok(self.changes)
    }

    fn execute_query(&mut self) -> Result<SqliteCursor<'_>> {
        if self.stmt.column_count() == 0 {
            return Err(Error::statement("statement does not return rows"));
        }
        Ok(self.open_cursor())
    }

    fn execute(&mut self) -> Result<Option<SqliteCursor<'_>>> {
        if self.stmt.column_count() == 0 {
            self.execute_update()?;
            return Ok(None);
        }
        Ok(Some(self.open_cursor()))
    }

    fn generated_key(&mut self) -> Result<Option<i64>> {
        // A multi-row INSERT reports the rowid of its last row
        if self.keys == GeneratedKeys::Returned && self.changes > 0 {
            Ok(Some(self.conn.last_insert_rowid()))
        } else {
            Ok(None)
        }
    }

    fn close(self) -> Result<()> {
        self.stmt.finalize().map_err(to_statement_error)
    }
}
