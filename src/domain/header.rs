//! Header specification
//!
//! A [`Header`] declares one output column: the field it reads, the title
//! written in the header row, an optional cell renderer and spreadsheet-only
//! display hints.

use crate::domain::row::RowValue;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Cell render function
///
/// Called as `render(row, value, row_number, column_number)` with 1-based
/// row and column numbers. `value` is `Value::Null` when the row has no value
/// for the field.
pub type CellRender = Arc<dyn Fn(&RowValue, Value, usize, usize) -> Value + Send + Sync>;

/// Spreadsheet column style hints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStyle {
    /// Bold font
    pub bold: bool,
    /// Italic font
    pub italic: bool,
    /// Wrap long text
    pub text_wrap: bool,
    /// Excel number format, e.g. `"0.00"` or `"yyyy-mm-dd"`
    pub num_format: Option<String>,
    /// Font color as `0xRRGGBB`
    pub font_color: Option<u32>,
    /// Background color as `0xRRGGBB`
    pub background_color: Option<u32>,
}

/// One column of the export
#[derive(Clone)]
pub struct Header {
    /// Field name read from each row
    pub field: String,
    /// Title written in the header row
    pub title: String,
    /// Optional cell renderer
    pub render: Option<CellRender>,
    /// Column width (spreadsheet formats only)
    pub col_width: Option<f64>,
    /// Column style (spreadsheet formats only)
    pub col_style: Option<ColumnStyle>,
}

impl Header {
    /// Create a header reading `field` and titled `title`
    pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
            render: None,
            col_width: None,
            col_style: None,
        }
    }

    /// Attach a cell renderer
    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(&RowValue, Value, usize, usize) -> Value + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Set the spreadsheet column width
    pub fn with_width(mut self, width: f64) -> Self {
        self.col_width = Some(width);
        self
    }

    /// Set the spreadsheet column style
    pub fn with_style(mut self, style: ColumnStyle) -> Self {
        self.col_style = Some(style);
        self
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("field", &self.field)
            .field("title", &self.title)
            .field("render", &self.render.as_ref().map(|_| "<fn>"))
            .field("col_width", &self.col_width)
            .field("col_style", &self.col_style)
            .finish()
    }
}

/// Ordered header specification
pub type Headers = Vec<Header>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_builder() {
        let header = Header::new("amount", "Amount")
            .with_width(14.0)
            .with_style(ColumnStyle {
                num_format: Some("0.00".to_string()),
                ..Default::default()
            })
            .with_render(|_, v, _, _| v);

        assert_eq!(header.field, "amount");
        assert_eq!(header.col_width, Some(14.0));
        assert!(header.render.is_some());
        assert!(format!("{header:?}").contains("<fn>"));
    }

    #[test]
    fn test_render_receives_arguments() {
        let header = Header::new("id", "ID").with_render(|_, v, row, col| {
            json!(format!("{}@{row}:{col}", v.as_i64().unwrap_or_default()))
        });
        let render = header.render.unwrap();
        assert_eq!(render(&RowValue::Invalid, json!(5), 2, 3), json!("5@2:3"));
    }
}
