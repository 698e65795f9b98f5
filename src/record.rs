//! Record module - explicit descriptions of the structs that query rows are mapped onto
//!
//! A [`RecordType`] lists a struct's fields, each with an optional column-name override and a
//! setter. Base structs embedded in a record are described once and pulled in with
//! [`RecordType::extends`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result, ValueError};
use crate::models::ColumnMap;
use crate::value::Value;

/// Column override meaning "use the field name".
pub const UNSPECIFIED_COLUMN: &str = "?";

type Setter<T> = Arc<dyn Fn(&mut T, Value) -> std::result::Result<(), ValueError> + Send + Sync>;

/// One assignable field of a record.
pub struct Field<T> {
    name: String,
    column: Option<String>,
    depth: usize,
    setter: Setter<T>,
}

impl<T> Field<T> {
    pub fn new<F>(name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Value) -> std::result::Result<(), ValueError> + Send + Sync + 'static,
    {
        Field {
            name: name.into(),
            column: None,
            depth: 0,
            setter: Arc::new(setter),
        }
    }

    /// Bind this field to a differently named column.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The override if one is set, otherwise the field name.
    pub fn effective_column(&self) -> &str {
        match self.column.as_deref() {
            Some(column) if column != UNSPECIFIED_COLUMN => column,
            _ => &self.name,
        }
    }

    /// 0 for fields declared on the record itself, 1 for its base, and so on.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn assign(&self, record: &mut T, value: Value) -> std::result::Result<(), ValueError> {
        (*self.setter)(record, value)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Field {
            name: self.name.clone(),
            column: self.column.clone(),
            depth: self.depth,
            setter: Arc::clone(&self.setter),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// A field resolved to a result column.
#[derive(Debug)]
pub struct Binding<'r, T> {
    pub field: &'r Field<T>,
    pub position: usize,
}

/// Descriptor of a record type: its fields, inherited ones included, and how to construct it.
pub struct RecordType<T> {
    name: String,
    fields: Vec<Field<T>>,
    constructor: Option<fn() -> T>,
}

impl<T: Default> RecordType<T> {
    /// Descriptor constructed through `T::default`.
    pub fn new(name: impl Into<String>) -> Self {
        RecordType::with_constructor(name, T::default)
    }
}

impl<T> RecordType<T> {
    pub fn with_constructor(name: impl Into<String>, constructor: fn() -> T) -> Self {
        RecordType {
            name: name.into(),
            fields: Vec::new(),
            constructor: Some(constructor),
        }
    }

    /// Descriptor for a type that cannot be built without arguments.
    ///
    /// Materializing any row into it fails with [`Error::Instantiation`].
    pub fn without_constructor(name: impl Into<String>) -> Self {
        RecordType {
            name: name.into(),
            fields: Vec::new(),
            constructor: None,
        }
    }

    pub fn with_field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field<F>(self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, Value) -> std::result::Result<(), ValueError> + Send + Sync + 'static,
    {
        self.with_field(Field::new(name, setter))
    }

    /// Pull in every field of `base`, reached through `project`.
    pub fn extends<B: 'static>(mut self, base: RecordType<B>, project: fn(&mut T) -> &mut B) -> Self
    where
        T: 'static,
    {
        for field in base.fields {
            let setter = field.setter;
            self.fields.push(Field {
                name: field.name,
                column: field.column,
                depth: field.depth + 1,
                setter: Arc::new(move |record: &mut T, value: Value| {
                    (*setter)(project(record), value)
                }),
            });
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields, own and inherited, in declaration order.
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Resolve fields against the columns of a result.
    ///
    /// Own fields are considered before inherited ones. A column claimed by a field is not bound
    /// to any field declared further up the inheritance chain; unmatched fields stay unbound.
    pub fn bindings(&self, columns: &ColumnMap) -> Vec<Binding<'_, T>> {
        let mut ordered: Vec<&Field<T>> = self.fields.iter().collect();
        ordered.sort_by_key(|field| field.depth);

        let mut claimed: HashMap<&str, usize> = HashMap::new();
        let mut bindings = Vec::new();
        for field in ordered {
            let column = field.effective_column();
            let Some(position) = columns.position(column) else {
                continue;
            };
            match claimed.get(column) {
                Some(&depth) if depth < field.depth => {
                    log::trace!(
                        "{}.{} shadowed by a more derived field on column {}",
                        self.name,
                        field.name,
                        column
                    );
                }
                _ => {
                    claimed.insert(column, field.depth);
                    bindings.push(Binding { field, position });
                }
            }
        }
        bindings
    }

    pub fn instantiate(&self) -> Result<T> {
        self.constructor
            .map(|construct| construct())
            .ok_or_else(|| Error::Instantiation {
                record: self.name.clone(),
            })
    }
}

impl<T> Clone for RecordType<T> {
    fn clone(&self) -> Self {
        RecordType {
            name: self.name.clone(),
            fields: self.fields.clone(),
            constructor: self.constructor,
        }
    }
}

impl<T> fmt::Debug for RecordType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

/// Describe a `Default` struct whose fields implement [`FromValue`](crate::FromValue).
///
/// ```
/// use sqlite_rowmap::record_type;
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: Option<String>,
/// }
///
/// let users = record_type!(User { id, name as "usr_name" });
/// assert_eq!(users.fields()[1].effective_column(), "usr_name");
/// ```
#[macro_export]
macro_rules! record_type {
    ($ty:ident { $($field:ident $(as $column:literal)?),* $(,)? }) => {
        $crate::RecordType::<$ty>::new(stringify!($ty))
            $(
                .with_field(
                    $crate::Field::new(
                        stringify!($field),
                        |record: &mut $ty, value: $crate::Value| {
                            record.$field = $crate::FromValue::from_value(value)?;
                            Ok(())
                        },
                    )
                    $(.column($column))?
                )
            )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnInfo;

    #[derive(Debug, Default, PartialEq)]
    struct Base {
        id: i64,
        label: String,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Derived {
        base: Base,
        label: String,
    }

    fn columns(names: &[&str]) -> ColumnMap {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnInfo {
                position: i + 1,
                name: name.to_string(),
            })
            .collect()
    }

    fn derived_type() -> RecordType<Derived> {
        let base = record_type!(Base { id, label });
        record_type!(Derived { label }).extends(base, |d| &mut d.base)
    }

    #[test]
    fn test_effective_column() {
        let plain: Field<Base> = Field::new("id", |_, _| Ok(()));
        assert_eq!(plain.effective_column(), "id");
        assert_eq!(plain.clone().column("base_id").effective_column(), "base_id");
        assert_eq!(plain.column(UNSPECIFIED_COLUMN).effective_column(), "id");
    }

    #[test]
    fn test_inherited_fields_are_included() {
        let record = derived_type();
        let names: Vec<(&str, usize)> = record
            .fields()
            .iter()
            .map(|f| (f.name(), f.depth()))
            .collect();
        assert_eq!(names, vec![("label", 0), ("id", 1), ("label", 1)]);
    }

    #[test]
    fn test_most_derived_field_wins() {
        let record = derived_type();
        let bindings = record.bindings(&columns(&["label", "id"]));
        let bound: Vec<(&str, usize, usize)> = bindings
            .iter()
            .map(|b| (b.field.name(), b.field.depth(), b.position))
            .collect();
        assert_eq!(bound, vec![("label", 0, 1), ("id", 1, 2)]);

        // Same depth, same column: both bind
        let twin = derived_type().with_field(
            Field::new("caption", |d: &mut Derived, v| {
                d.label = crate::FromValue::from_value(v)?;
                Ok(())
            })
            .column("label"),
        );
        let bindings = twin.bindings(&columns(&["label"]));
        let bound: Vec<(&str, usize, usize)> = bindings
            .iter()
            .map(|b| (b.field.name(), b.field.depth(), b.position))
            .collect();
        assert_eq!(bound, vec![("label", 0, 1), ("caption", 0, 1)]);
    }

    #[test]
    fn test_unmatched_fields_are_unbound() {
        let record = derived_type();
        assert!(record.bindings(&columns(&["other"])).is_empty());
    }

    #[test]
    fn test_lifted_setter_reaches_base() {
        let record = derived_type();
        let mut target = record.instantiate().unwrap();
        record.fields()[1]
            .assign(&mut target, Value::Integer(9))
            .unwrap();
        assert_eq!(target.base.id, 9);
    }

    #[test]
    fn test_without_constructor() {
        let record: RecordType<Base> = RecordType::without_constructor("Base");
        match record.instantiate() {
            Err(Error::Instantiation { record }) => assert_eq!(record, "Base"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
