use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::driver::Cursor;
use crate::error::Result;

/// One column of a result: 1-based position and name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub position: usize,
    pub name: String,
}

/// Read the column metadata of a cursor in position order.
pub fn column_info<K: Cursor + ?Sized>(cursor: &K) -> Result<Vec<ColumnInfo>> {
    (1..=cursor.column_count())
        .map(|position| {
            Ok(ColumnInfo {
                position,
                name: cursor.column_name(position)?.to_string(),
            })
        })
        .collect()
}

/// Column name to position lookup.
///
/// When a name repeats, the later position replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn from_cursor<K: Cursor + ?Sized>(cursor: &K) -> Result<Self> {
        Ok(column_info(cursor)?.into_iter().collect())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl FromIterator<ColumnInfo> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = ColumnInfo>>(iter: I) -> Self {
        let mut positions = HashMap::new();
        for column in iter {
            positions.insert(column.name, column.position);
        }
        ColumnMap { positions }
    }
}
