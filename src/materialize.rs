//! Materialize module - turns a cursor into records, scalar lists or generic documents

use chrono::SecondsFormat;
use serde_json::{Map, Number};

use crate::config::{BlobEncoding, Config, DateEncoding};
use crate::driver::Cursor;
use crate::error::{Error, Result};
use crate::models::{column_info, ColumnMap};
use crate::record::RecordType;
use crate::value::{FromValue, Value};

/// One row keyed by column name, in column order.
pub type Document = Map<String, serde_json::Value>;

/// Map every remaining row of `cursor` onto a new `T`.
///
/// Fields without a matching column keep the value the constructor gave them.
pub fn records<T, K>(cursor: &mut K, record: &RecordType<T>) -> Result<Vec<T>>
where
    K: Cursor + ?Sized,
{
    let columns = ColumnMap::from_cursor(&*cursor)?;
    let bindings = record.bindings(&columns);
    log::trace!(
        "{}: {} of {} fields bound to {} columns",
        record.name(),
        bindings.len(),
        record.fields().len(),
        columns.len()
    );

    let mut list = Vec::new();
    while cursor.advance()? {
        let mut instance = record.instantiate()?;
        for binding in &bindings {
            let value = cursor.value(binding.position)?;
            binding
                .field
                .assign(&mut instance, value)
                .map_err(|source| Error::Access {
                    target: format!("{}.{}", record.name(), binding.field.name()),
                    column: binding.position,
                    source,
                })?;
        }
        list.push(instance);
    }
    Ok(list)
}

/// Read the cell at 1-based `column` of every remaining row.
pub fn column<T, K>(cursor: &mut K, column: usize) -> Result<Vec<T>>
where
    T: FromValue,
    K: Cursor + ?Sized,
{
    let mut list = Vec::new();
    while cursor.advance()? {
        let value = cursor.value(column)?;
        let item = T::from_value(value).map_err(|source| Error::Access {
            target: std::any::type_name::<T>().to_string(),
            column,
            source,
        })?;
        list.push(item);
    }
    Ok(list)
}

/// Convert every remaining row into a [`Document`].
pub fn documents<K>(cursor: &mut K, config: &Config) -> Result<Vec<Document>>
where
    K: Cursor + ?Sized,
{
    let columns = column_info(&*cursor)?;

    let mut list = Vec::new();
    while cursor.advance()? {
        let mut document = Map::new();
        for column in &columns {
            let value = cursor.value(column.position)?;
            document.insert(column.name.clone(), to_json(value, config));
        }
        list.push(document);
    }
    Ok(list)
}

/// Convert a cell to its JSON form
pub fn to_json(value: Value, config: &Config) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        // JSON has no NaN or infinity
        Value::Real(f) => {
            Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Value::Text(s) => serde_json::Value::String(s),
        Value::Blob(b) => match config.blob_encoding {
            BlobEncoding::Base64 => serde_json::Value::String(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                b,
            )),
            BlobEncoding::Array => serde_json::Value::Array(
                b.into_iter()
                    .map(|byte| serde_json::Value::Number(byte.into()))
                    .collect(),
            ),
        },
        Value::Timestamp(ts) => match config.date_encoding {
            DateEncoding::EpochMillis => serde_json::Value::Number(ts.timestamp_millis().into()),
            DateEncoding::EpochSeconds => serde_json::Value::Number(ts.timestamp().into()),
            DateEncoding::Rfc3339 => {
                serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        },
    }
}

/// Wrap documents in a JSON array
pub fn documents_to_json(documents: Vec<Document>) -> serde_json::Value {
    serde_json::Value::Array(documents.into_iter().map(serde_json::Value::Object).collect())
}
