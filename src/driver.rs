//! Driver module - the capabilities the execution layer needs from a database connection
//!
//! Positions passed to [`PreparedStatement::bind`], [`Cursor::column_name`] and
//! [`Cursor::value`] are 1-based. A cursor borrows the statement that produced it, so it is
//! always released first.

use crate::error::{Error, Result};
use crate::value::Value;

/// Whether an insert should report the key it generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKeys {
    Returned,
    NotReturned,
}

/// A database connection able to prepare statements with positional `?` placeholders.
pub trait Connection {
    type Statement<'c>: PreparedStatement
    where
        Self: 'c;

    /// Prepare a plain SQL statement.
    fn prepare(&self, sql: &str, keys: GeneratedKeys) -> Result<Self::Statement<'_>>;

    /// Prepare a `call <name>(?, ...)` stored-procedure invocation.
    fn prepare_call(&self, sql: &str) -> Result<Self::Statement<'_>>;
}

/// A prepared statement owned by a single operation.
pub trait PreparedStatement {
    type Cursor<'s>: Cursor
    where
        Self: 's;

    fn bind(&mut self, position: usize, value: &Value) -> Result<()>;

    /// Execute and return the number of affected rows.
    fn execute_update(&mut self) -> Result<u64>;

    /// Execute a statement that must produce a result set.
    fn execute_query(&mut self) -> Result<Self::Cursor<'_>>;

    /// Execute a statement that may or may not produce a result set.
    fn execute(&mut self) -> Result<Option<Self::Cursor<'_>>>;

    /// First key generated by the last execution, if any.
    fn generated_key(&mut self) -> Result<Option<i64>>;

    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Forward-only view over a tabular result.
pub trait Cursor {
    fn column_count(&self) -> usize;

    fn column_name(&self, position: usize) -> Result<&str>;

    /// Move to the next row, returning `false` once the rows are exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Cell of the current row.
    fn value(&self, position: usize) -> Result<Value>;

    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// An owned in-memory table exposed through [`Cursor`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    current: Option<usize>,
}

impl MemoryCursor {
    pub fn new<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryCursor {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            current: None,
        }
    }

    fn current_row(&self) -> Result<&[Value]> {
        self.current
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
            .ok_or_else(|| Error::statement("cursor is not positioned on a row"))
    }
}

impl Cursor for MemoryCursor {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, position: usize) -> Result<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .map(String::as_str)
            .ok_or_else(|| {
                Error::statement(format!(
                    "column index {} out of range (1..={})",
                    position,
                    self.columns.len()
                ))
            })
    }

    fn advance(&mut self) -> Result<bool> {
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn value(&self, position: usize) -> Result<Value> {
        let row = self.current_row()?;
        position
            .checked_sub(1)
            .and_then(|i| row.get(i))
            .cloned()
            .ok_or_else(|| {
                Error::statement(format!(
                    "column index {} out of range (1..={})",
                    position,
                    row.len()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cursor_iteration() {
        let mut cursor = MemoryCursor::new(
            ["id", "name"],
            vec![
                vec![Value::Integer(1), Value::from("a")],
                vec![Value::Integer(2), Value::from("b")],
            ],
        );
        assert_eq!(cursor.column_count(), 2);
        assert_eq!(cursor.column_name(2).unwrap(), "name");
        assert!(cursor.value(1).is_err());

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.value(1).unwrap(), Value::Integer(1));
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.value(2).unwrap(), Value::from("b"));
        assert!(!cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
        assert!(cursor.value(1).is_err());
    }

    #[test]
    fn test_memory_cursor_positions_are_one_based() {
        let mut cursor = MemoryCursor::new(["only"], vec![vec![Value::Null]]);
        assert!(cursor.column_name(0).is_err());
        assert!(cursor.column_name(2).is_err());
        cursor.advance().unwrap();
        assert!(cursor.value(0).is_err());
        assert_eq!(cursor.value(1).unwrap(), Value::Null);
    }
}
