use crate::api::client::ApiClient;
use crate::api::models::HeaderRecord;
use crate::error::{StorageError, ValidationError};
use crate::storage::cache::CacheStore;
use crate::{AppError, Result};
use serde_json::Value;
use std::path::Path;

/// Mapping from column descriptions (human labels) to the query-variable
/// names the API expects, loaded once per session or per cache key.
#[derive(Debug, Clone, Default)]
pub struct HeaderCatalog {
    records: Vec<HeaderRecord>,
}

impl HeaderCatalog {
    pub fn new(records: Vec<HeaderRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    /// Resolve column descriptions to variable names, preserving request
    /// order. Any unmatched description fails the whole selection, naming
    /// every missing one.
    pub fn select(&self, descriptions: &[String]) -> Result<Vec<String>> {
        if self.records.is_empty() {
            return Err(AppError::Validation(ValidationError::HeadersNotLoaded));
        }

        let mut variables = Vec::with_capacity(descriptions.len());
        let mut missing = Vec::new();
        for description in descriptions {
            match self
                .records
                .iter()
                .find(|record| &record.description == description)
            {
                Some(record) => variables.push(record.variable.clone()),
                None => missing.push(description.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(AppError::Validation(ValidationError::HeadersNotFound {
                missing,
            }));
        }
        Ok(variables)
    }

    /// Write all column descriptions to a text file, one per line.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.records.is_empty() {
            return Err(AppError::Validation(ValidationError::HeadersNotLoaded));
        }
        let descriptions: Vec<&str> = self
            .records
            .iter()
            .map(|r| r.description.as_str())
            .collect();
        std::fs::write(path, descriptions.join("\n")).map_err(|source| {
            AppError::Storage(StorageError::FileIo {
                path: path.to_string_lossy().to_string(),
                source,
            })
        })
    }
}

/// Fetch the header catalog, consulting the cache first.
///
/// `cache_key` disambiguates catalogs that vary by context (the Cytocon
/// catalog is scoped by a disease filter; FIVEDB has one fixed catalog).
/// Accepted response shapes: a list of records or a single record. Non-200
/// or an undecodable body yields `None`.
pub async fn get_headers(
    client: &mut ApiClient,
    store: &dyn CacheStore,
    path: &str,
    params: &[(&str, String)],
    cache_key: &str,
    force: bool,
) -> Result<Option<HeaderCatalog>> {
    if !force {
        if let Some(raw) = store.get(cache_key)? {
            if let Ok(records) = serde_json::from_str::<Vec<HeaderRecord>>(&raw) {
                return Ok(Some(HeaderCatalog::new(records)));
            }
        }
    }

    let response = client.call(path, params).await?;
    if !response.is_success() {
        return Ok(None);
    }

    let value: Value = match serde_json::from_str(&response.content) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let records = parse_records(value, path)?;
    store.put(
        cache_key,
        &serde_json::to_string(&records).expect("header records serialize"),
    )?;
    Ok(Some(HeaderCatalog::new(records)))
}

/// The headers endpoint may answer with a single record or a list of them.
fn parse_records(value: Value, endpoint: &str) -> Result<Vec<HeaderRecord>> {
    let shape_error = |detail: String| {
        AppError::Validation(ValidationError::UnexpectedShape {
            endpoint: endpoint.to_string(),
            detail,
        })
    };

    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(|e| shape_error(e.to_string())),
        Value::Object(_) => {
            let record: HeaderRecord =
                serde_json::from_value(value).map_err(|e| shape_error(e.to_string()))?;
            Ok(vec![record])
        }
        _ => Err(shape_error(
            "expected a record or an array of records".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_catalog() -> HeaderCatalog {
        HeaderCatalog::new(vec![
            HeaderRecord {
                description: "Parameter".to_string(),
                variable: "param".to_string(),
            },
            HeaderRecord {
                description: "Parameter value".to_string(),
                variable: "param_val".to_string(),
            },
        ])
    }

    #[test]
    fn test_select_preserves_request_order() {
        let catalog = sample_catalog();
        let selected = catalog
            .select(&["Parameter value".to_string(), "Parameter".to_string()])
            .unwrap();
        assert_eq!(selected, vec!["param_val", "param"]);
    }

    #[test]
    fn test_select_single_description() {
        let catalog = sample_catalog();
        let selected = catalog.select(&["Parameter value".to_string()]).unwrap();
        assert_eq!(selected, vec!["param_val"]);
    }

    #[test]
    fn test_select_names_all_missing_descriptions() {
        let catalog = sample_catalog();
        let result = catalog.select(&[
            "Parameter".to_string(),
            "Unit".to_string(),
            "Source".to_string(),
        ]);
        match result {
            Err(AppError::Validation(ValidationError::HeadersNotFound { missing })) => {
                assert_eq!(missing, vec!["Unit".to_string(), "Source".to_string()]);
            }
            other => panic!("Expected HeadersNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_select_on_empty_catalog_is_fatal() {
        let catalog = HeaderCatalog::default();
        let result = catalog.select(&["Parameter".to_string()]);
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::HeadersNotLoaded))
        ));
    }

    #[test]
    fn test_parse_records_list_shape() {
        let value = json!([
            {"ColumnDesc": "Parameter", "ColumnVariable": "param"},
            {"ColumnDesc": "Parameter value", "ColumnVariable": "param_val"}
        ]);
        let records = parse_records(value, "/api/v1/query_data_headers").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].variable, "param_val");
    }

    #[test]
    fn test_parse_records_single_shape() {
        let value = json!({"ColumnDesc": "Parameter", "ColumnVariable": "param"});
        let records = parse_records(value, "/api/v1/query_data_headers").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "Parameter");
    }

    #[test]
    fn test_parse_records_rejects_scalar() {
        let result = parse_records(json!(42), "/api/v1/query_data_headers");
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::UnexpectedShape { .. }))
        ));
    }

    #[test]
    fn test_save_headers_writes_descriptions() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("5db_headers.txt");
        sample_catalog().save(&path).expect("save should succeed");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Parameter\nParameter value"
        );
    }

    #[test]
    fn test_save_empty_catalog_is_fatal() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = HeaderCatalog::default().save(&dir.path().join("h.txt"));
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::HeadersNotLoaded))
        ));
    }
}
