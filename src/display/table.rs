use crate::api::models::DataTable;
use crate::error::{AppError, StorageError};
use comfy_table::{Attribute, Cell, Color, Table, presets};
use crossterm::terminal;
use std::path::Path;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_CELL_WIDTH: usize = 100;

/// Formatter for query results and dictionaries.
pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    /// Detect terminal width, clamped for stability.
    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => Some((cols as usize).clamp(40, 200)),
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Render a query result in table format.
    pub fn render_data_table(&self, table: &DataTable) -> Result<String, AppError> {
        if table.rows.is_empty() {
            return Ok("Query returned no results.".to_string());
        }

        let mut out = Table::new();
        out.load_preset(presets::UTF8_FULL);
        out.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            out.set_width(width as u16);
        }

        let headers: Vec<Cell> = table
            .columns
            .iter()
            .map(|col| {
                if self.use_colors {
                    Cell::new(col).add_attribute(Attribute::Bold).fg(Color::Green)
                } else {
                    Cell::new(col).add_attribute(Attribute::Bold)
                }
            })
            .collect();
        out.set_header(headers);

        for row in &table.rows {
            let cells: Vec<Cell> = row
                .iter()
                .map(|value| {
                    let formatted = self.format_cell_value(value);
                    if self.use_colors && matches!(value, serde_json::Value::Null) {
                        Cell::new(formatted)
                            .fg(Color::DarkGrey)
                            .add_attribute(Attribute::Italic)
                    } else {
                        Cell::new(formatted)
                    }
                })
                .collect();
            out.add_row(cells);
        }

        Ok(out.to_string())
    }

    /// Render a dictionary as a one-column table.
    pub fn render_dictionary(&self, caption: &str, names: &[String]) -> Result<String, AppError> {
        if names.is_empty() {
            return Ok(format!("Dictionary '{}' is empty.", caption));
        }

        let mut out = Table::new();
        out.load_preset(presets::UTF8_FULL);
        out.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
        let header = if self.use_colors {
            Cell::new(caption).add_attribute(Attribute::Bold).fg(Color::Cyan)
        } else {
            Cell::new(caption).add_attribute(Attribute::Bold)
        };
        out.set_header(vec![header]);
        for name in names {
            out.add_row(vec![Cell::new(name)]);
        }

        Ok(out.to_string())
    }

    pub fn format_cell_value(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::Null => "-".to_string(),
            serde_json::Value::String(s) => {
                if s.width() > MAX_CELL_WIDTH {
                    self.truncate_text(s, MAX_CELL_WIDTH)
                } else {
                    s.clone()
                }
            }
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }

    /// Truncate text to the given display width and add an ellipsis.
    fn truncate_text(&self, text: &str, max_width: usize) -> String {
        if text.width() <= max_width {
            return text.to_string();
        }

        let ellipsis = "...";
        let ellipsis_width = ellipsis.width();
        if max_width <= ellipsis_width {
            return ellipsis[..max_width].to_string();
        }

        let target_width = max_width - ellipsis_width;
        let mut result = String::new();
        let mut current_width = 0;
        for ch in text.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if current_width + ch_width > target_width {
                break;
            }
            result.push(ch);
            current_width += ch_width;
        }
        result.push_str(ellipsis);
        result
    }
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a query result to a CSV file.
pub fn write_csv(table: &DataTable, path: &Path) -> Result<(), AppError> {
    std::fs::write(path, table.to_csv()).map_err(|source| {
        AppError::Storage(StorageError::FileIo {
            path: path.to_string_lossy().to_string(),
            source,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_table() -> DataTable {
        DataTable {
            columns: vec!["param".to_string(), "param_val".to_string()],
            rows: vec![
                vec![json!("Emax"), json!("1.2")],
                vec![json!("EC50"), json!(null)],
            ],
        }
    }

    #[test]
    fn test_render_data_table() {
        let display = TableDisplay::new().with_max_width(80).with_colors(false);
        let rendered = display.render_data_table(&create_test_table()).unwrap();
        assert!(rendered.contains("param"));
        assert!(rendered.contains("param_val"));
        assert!(rendered.contains("Emax"));
        assert!(rendered.contains("1.2"));
        assert!(rendered.contains("-"));
    }

    #[test]
    fn test_render_empty_table() {
        let display = TableDisplay::new().with_colors(false);
        let empty = DataTable {
            columns: vec!["param".to_string()],
            rows: vec![],
        };
        assert_eq!(
            display.render_data_table(&empty).unwrap(),
            "Query returned no results."
        );
    }

    #[test]
    fn test_render_dictionary() {
        let display = TableDisplay::new().with_colors(false);
        let names = vec!["Migration".to_string(), "Proliferation".to_string()];
        let rendered = display.render_dictionary("process_types", &names).unwrap();
        assert!(rendered.contains("process_types"));
        assert!(rendered.contains("Migration"));
        assert!(rendered.contains("Proliferation"));
    }

    #[test]
    fn test_format_cell_value() {
        let display = TableDisplay::new();
        assert_eq!(display.format_cell_value(&json!(null)), "-");
        assert_eq!(display.format_cell_value(&json!("text")), "text");
        assert_eq!(display.format_cell_value(&json!(123)), "123");
        assert_eq!(display.format_cell_value(&json!(true)), "true");
    }

    #[test]
    fn test_truncate_text() {
        let display = TableDisplay::new();
        assert_eq!(display.truncate_text("Hello", 10), "Hello");
        assert_eq!(display.truncate_text("Hello World", 8), "Hello...");
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("fivedb_query_data.csv");
        write_csv(&create_test_table(), &path).expect("write should succeed");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "param,param_val\nEmax,1.2\nEC50,\n");
    }
}
