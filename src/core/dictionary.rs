use crate::api::client::ApiClient;
use crate::error::{StorageError, ValidationError};
use crate::storage::cache::CacheStore;
use crate::{AppError, Result};
use serde_json::Value;
use std::path::Path;

/// Fetch a controlled-vocabulary dictionary, consulting the cache first.
///
/// `force=false` with a cache entry for `name` returns it without a network
/// call. On a fetch, the accepted response shapes are a JSON array of
/// objects with a `Name` field or a single such object; any other valid
/// JSON shape is fatal. Non-200 status or an undecodable body yields
/// `None` — dictionary unavailable, caller must check.
pub async fn get_dictionary(
    client: &mut ApiClient,
    store: &dyn CacheStore,
    path: &str,
    name: &str,
    force: bool,
) -> Result<Option<Vec<String>>> {
    if !force {
        if let Some(raw) = store.get(name)? {
            // Corrupt entries are treated as a miss and refetched.
            if let Ok(names) = serde_json::from_str::<Vec<String>>(&raw) {
                return Ok(Some(names));
            }
        }
    }

    let response = client.call(path, &[]).await?;
    if !response.is_success() {
        return Ok(None);
    }

    let value: Value = match serde_json::from_str(&response.content) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let names = extract_names(value, path)?;
    store.put(
        name,
        &serde_json::to_string(&names).expect("name list serializes"),
    )?;
    Ok(Some(names))
}

/// Pull the `Name` field out of the two accepted response shapes.
fn extract_names(value: Value, endpoint: &str) -> Result<Vec<String>> {
    let shape_error = |detail: &str| {
        AppError::Validation(ValidationError::UnexpectedShape {
            endpoint: endpoint.to_string(),
            detail: detail.to_string(),
        })
    };

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                item.get("Name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| shape_error("array item without a string 'Name' field"))
            })
            .collect(),
        Value::Object(map) => match map.get("Name").and_then(Value::as_str) {
            Some(name) => Ok(vec![name.to_string()]),
            None => Err(shape_error("object without a string 'Name' field")),
        },
        _ => Err(shape_error("expected an object or an array of objects")),
    }
}

/// Write a dictionary to a plain text file, one name per line.
pub fn save_dictionary(names: &[String], path: &Path) -> Result<()> {
    std::fs::write(path, names.join("\n")).map_err(|source| {
        AppError::Storage(StorageError::FileIo {
            path: path.to_string_lossy().to_string(),
            source,
        })
    })
}
