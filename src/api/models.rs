use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Successful response from the `POST /oauth/token` endpoint.
///
/// Both fields are required; a 200 response missing either one is a fatal
/// configuration error, not a recoverable condition.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Token lifetime in seconds, relative to the time of the response.
    pub expires_in: i64,
}

/// One row of the header catalog: human-readable column description mapped
/// to the machine query-variable name the API expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRecord {
    #[serde(rename = "ColumnDesc")]
    pub description: String,
    #[serde(rename = "ColumnVariable")]
    pub variable: String,
}

/// Tabular query result: ordered rows with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Build a table from a JSON array of row objects.
    ///
    /// Column order follows `requested` (the header variables sent with the
    /// query); any key the server returns beyond those is appended in
    /// first-seen order. Missing cells become JSON null.
    pub fn from_records(content: &str, requested: &[String]) -> serde_json::Result<Self> {
        let records: Vec<serde_json::Map<String, Value>> = serde_json::from_str(content)?;

        let mut columns: Vec<String> = requested.to_vec();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| record.get(col).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize to CSV, one row per record, columns in table order.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&csv_line(self.columns.iter().map(String::as_str)));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(csv_cell).collect();
            out.push_str(&csv_line(cells.iter().map(String::as_str)));
        }
        out
    }
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut line = fields
        .map(csv_escape)
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
