//! Row value model
//!
//! Rows handed to an exporter come in one of three shapes: a record with
//! named members, a string-keyed mapping, or a positional list. The shape is
//! resolved once per row type through [`IntoRow`], so projection never has to
//! inspect arbitrary values at runtime.

use crate::domain::errors::ExportError;
use crate::domain::result::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A single row as seen by the column projector
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RowValue {
    /// Struct-like row; members are matched by their export key
    Record(Record),
    /// String-keyed mapping; columns are looked up by field name
    Mapping(Map<String, Value>),
    /// Positional row; element `i` feeds column `i`
    List(Vec<Value>),
    /// Unrecognized shape, projected as an all-empty row
    #[default]
    Invalid,
}

/// One declared member of a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    name: String,
    export_name: Option<String>,
    value: Value,
}

impl Member {
    /// Member exported under its own name
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            export_name: None,
            value: value.into(),
        }
    }

    /// Member exported under an explicit override name
    pub fn renamed(
        name: impl Into<String>,
        export_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            export_name: Some(export_name.into()),
            value: value.into(),
        }
    }

    /// Declared member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used to match this member against a column field
    pub fn key(&self) -> &str {
        self.export_name.as_deref().unwrap_or(&self.name)
    }

    /// Member value
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Struct-like row made of ordered members
///
/// # Examples
///
/// ```
/// use tabex::domain::row::Record;
///
/// let record = Record::new()
///     .member("id", 7)
///     .member_as("user_name", "name", "ada");
///
/// assert_eq!(record.members().len(), 2);
/// assert_eq!(record.members()[1].key(), "name");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    members: Vec<Member>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member exported under its own name
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push(Member::new(name, value));
        self
    }

    /// Append a member exported under `export_name`
    pub fn member_as(
        mut self,
        name: impl Into<String>,
        export_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.members.push(Member::renamed(name, export_name, value));
        self
    }

    /// Declared members in declaration order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Build a record from any serializable struct
    ///
    /// Field order follows the struct declaration and `#[serde(rename)]`
    /// attributes act as the export key.
    ///
    /// # Errors
    ///
    /// Returns a serialization error when the value does not serialize to an
    /// object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self {
                members: map.into_iter().map(|(k, v)| Member::new(k, v)).collect(),
            }),
            other => Err(ExportError::Serialization(format!(
                "expected a struct-like value, got {}",
                value_kind(&other)
            ))),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Conversion of a caller row type into a [`RowValue`]
pub trait IntoRow {
    /// Resolve the row's shape
    fn into_row(self) -> RowValue;
}

impl IntoRow for RowValue {
    fn into_row(self) -> RowValue {
        self
    }
}

impl IntoRow for Record {
    fn into_row(self) -> RowValue {
        RowValue::Record(self)
    }
}

impl IntoRow for Value {
    fn into_row(self) -> RowValue {
        match self {
            Value::Object(map) => RowValue::Mapping(map),
            Value::Array(items) => RowValue::List(items),
            _ => RowValue::Invalid,
        }
    }
}

impl IntoRow for Map<String, Value> {
    fn into_row(self) -> RowValue {
        RowValue::Mapping(self)
    }
}

impl<V: Into<Value>> IntoRow for HashMap<String, V> {
    fn into_row(self) -> RowValue {
        RowValue::Mapping(self.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<V: Into<Value>> IntoRow for BTreeMap<String, V> {
    fn into_row(self) -> RowValue {
        RowValue::Mapping(self.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<V: Into<Value>> IntoRow for Vec<V> {
    fn into_row(self) -> RowValue {
        RowValue::List(self.into_iter().map(Into::into).collect())
    }
}

impl<T: IntoRow> IntoRow for Option<T> {
    fn into_row(self) -> RowValue {
        match self {
            Some(row) => row.into_row(),
            None => RowValue::Invalid,
        }
    }
}

// one level of indirection is dereferenced
impl<T: IntoRow> IntoRow for Box<T> {
    fn into_row(self) -> RowValue {
        (*self).into_row()
    }
}

impl<T: IntoRow + Clone> IntoRow for Arc<T> {
    fn into_row(self) -> RowValue {
        Arc::unwrap_or_clone(self).into_row()
    }
}
