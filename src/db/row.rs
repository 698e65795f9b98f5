//! Row module - the SQLite cursor and conversion of SQLite cells to [`Value`]s

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::{Row, Rows};

use crate::driver::Cursor;
use crate::error::{to_statement_error, Error, Result};
use crate::value::Value;

/// Declared column types whose text cells are read as timestamps
static TEMPORAL_DECLTYPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(date|datetime|timestamp)\b").unwrap());

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Whether a declared column type holds dates
pub fn is_temporal_decltype(decl_type: &str) -> bool {
    TEMPORAL_DECLTYPE_REGEX.is_match(decl_type)
}

/// Parse the text forms SQLite commonly stores dates in. Zone-less forms are UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Convert SQLite cell to a [`Value`]
///
/// # Arguments
/// * `row` - Reference to the SQLite row
/// * `i` - 0-based column index
/// * `temporal` - Whether the column is declared as a date type
pub fn sqlite_to_value(row: &Row, i: usize, temporal: bool) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(i)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => {
            let text = String::from_utf8_lossy(t).into_owned();
            match temporal.then(|| parse_timestamp(&text)).flatten() {
                Some(ts) => Value::Timestamp(ts),
                None => Value::Text(text),
            }
        }
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

#[derive(Debug, Clone)]
pub(crate) struct SqliteColumn {
    pub name: String,
    pub temporal: bool,
}

/// Cursor over the rows of an executing SQLite statement
pub struct SqliteCursor<'s> {
    columns: Vec<SqliteColumn>,
    rows: Rows<'s>,
    current: Option<Vec<Value>>,
}

impl<'s> SqliteCursor<'s> {
    pub(crate) fn new(columns: Vec<SqliteColumn>, rows: Rows<'s>) -> Self {
        SqliteCursor {
            columns,
            rows,
            current: None,
        }
    }

    fn out_of_range(&self, position: usize) -> Error {
        Error::statement(format!(
            "column index {} out of range (1..={})",
            position,
            self.columns.len()
        ))
    }
}

impl Cursor for SqliteCursor<'_> {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, position: usize) -> Result<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .map(|column| column.name.as_str())
            .ok_or_else(|| self.out_of_range(position))
    }

    fn advance(&mut self) -> Result<bool> {
        match self.rows.next().map_err(to_statement_error)? {
            Some(row) => {
                let mut values = Vec::with_capacity(self.columns.len());
                for (i, column) in self.columns.iter().enumerate() {
                    let value =
                        sqlite_to_value(row, i, column.temporal).map_err(to_statement_error)?;
                    values.push(value);
                }
                self.current = Some(values);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn value(&self, position: usize) -> Result<Value> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| Error::statement("cursor is not positioned on a row"))?;
        position
            .checked_sub(1)
            .and_then(|i| row.get(i))
            .cloned()
            .ok_or_else(|| self.out_of_range(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_decltypes() {
        assert!(is_temporal_decltype("DATETIME"));
        assert!(is_temporal_decltype("date"));
        assert!(is_temporal_decltype("TIMESTAMP"));
        assert!(!is_temporal_decltype("TEXT"));
        assert!(!is_temporal_decltype("UPDATED_AT"));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T05:04:05+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-02"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
