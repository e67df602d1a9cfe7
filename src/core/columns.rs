//! Column model and row projector
//!
//! [`Columns`] is derived once from a header specification and is read-only
//! afterwards, so a single instance can be shared across exports. Per-row
//! bookkeeping lives in a scratch buffer local to [`Columns::project`].

use crate::domain::{CellRender, ExportError, Headers, Result, RowValue};
use serde_json::Value;
use std::collections::HashMap;

/// Column model derived from a header specification
#[derive(Debug, Clone)]
pub struct Columns {
    headers: Headers,
    fields: Vec<String>,
    titles: Vec<String>,
    key_index: HashMap<String, usize>,
}

impl Columns {
    /// Build the column model
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Configuration` when `headers` is empty.
    pub fn new(headers: Headers) -> Result<Self> {
        if headers.is_empty() {
            return Err(ExportError::Configuration(
                "header specification must not be empty".to_string(),
            ));
        }

        let mut fields = Vec::with_capacity(headers.len());
        let mut titles = Vec::with_capacity(headers.len());
        let mut key_index = HashMap::with_capacity(headers.len());

        for (i, header) in headers.iter().enumerate() {
            fields.push(header.field.clone());
            titles.push(header.title.clone());
            // duplicate fields collide, last one wins
            key_index.insert(header.field.clone(), i);
        }

        Ok(Self {
            headers,
            fields,
            titles,
            key_index,
        })
    }

    /// Number of columns
    pub fn count(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Column index for a field name
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.key_index.get(field).copied()
    }

    fn render_for(&self, index: usize) -> Option<&CellRender> {
        self.headers[index].render.as_ref()
    }

    fn render_cell(&self, row: &RowValue, value: Value, at: (usize, usize), column: usize) -> Value {
        match self.render_for(column) {
            Some(render) => render(row, value, at.0, at.1 + column + 1),
            None => value,
        }
    }

    /// Project one row into exactly [`count`](Self::count) cells
    ///
    /// `row_num` is the 1-based row number handed to render functions and
    /// `col_offset` shifts the 1-based column number they receive. Invalid
    /// rows yield empty cells without invoking any renderer.
    pub fn project(&self, row: &RowValue, row_num: usize, col_offset: usize) -> Vec<Value> {
        let count = self.count();
        let at = (row_num, col_offset);

        match row {
            RowValue::Invalid => vec![Value::Null; count],
            RowValue::Mapping(map) => self
                .fields
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    let value = map.get(field).cloned().unwrap_or(Value::Null);
                    self.render_cell(row, value, at, i)
                })
                .collect(),
            RowValue::List(items) => (0..count)
                .map(|i| {
                    let value = items.get(i).cloned().unwrap_or(Value::Null);
                    self.render_cell(row, value, at, i)
                })
                .collect(),
            RowValue::Record(record) => {
                let mut cells = vec![Value::Null; count];
                let mut populated = vec![false; count];
                let mut matched = 0;

                for member in record.members() {
                    let Some(i) = self.index_of(member.key()) else {
                        continue;
                    };
                    if !populated[i] {
                        populated[i] = true;
                        matched += 1;
                    }
                    cells[i] = self.render_cell(row, member.value().clone(), at, i);
                    if matched == count {
                        break;
                    }
                }

                for (i, done) in populated.iter().enumerate() {
                    if !done {
                        cells[i] = self.render_cell(row, Value::Null, at, i);
                    }
                }

                cells
            }
        }
    }
}

/// Convert a projected cell into its text representation
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
