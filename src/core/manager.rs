use crate::api::client::ApiClient;
use crate::api::models::DataTable;
use crate::core::dictionary::{get_dictionary, save_dictionary};
use crate::core::headers::{HeaderCatalog, get_headers};
use crate::error::ValidationError;
use crate::storage::cache::CacheStore;
use crate::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// One independently-selectable dimension of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VocabAxis {
    /// Human caption used in validation errors ("process types").
    pub caption: &'static str,
    /// Dictionary name, doubling as the cache key ("process_types").
    pub dict_name: &'static str,
    /// Dictionary endpoint path ("/api/v1/process_types").
    pub endpoint: &'static str,
    /// Query parameter name ("process_type"); `None` for vocabularies that
    /// are downloadable but not filterable.
    pub query_param: Option<&'static str>,
}

/// Validate a user selection against a dictionary.
///
/// Returns the selected values in input order when every one is a member;
/// otherwise fails naming every missing value, not just the first.
pub fn select_elements(
    user_elements: &[String],
    db_elements: &[String],
    caption: &str,
) -> Result<Vec<String>> {
    let mut missing: Vec<String> = Vec::new();
    for element in user_elements {
        if !db_elements.contains(element) && !missing.contains(element) {
            missing.push(element.clone());
        }
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(ValidationError::ValuesNotFound {
            caption: caption.to_string(),
            missing,
        }));
    }
    Ok(user_elements
        .iter()
        .filter(|e| db_elements.contains(e))
        .cloned()
        .collect())
}

/// Shared state and operations behind both database managers: the
/// authenticated client, the injected cache store, the loaded dictionaries
/// and the header catalog. Composed by the concrete managers instead of
/// inherited from.
pub struct ManagerCore {
    pub client: ApiClient,
    cache: Arc<dyn CacheStore>,
    dictionaries: HashMap<&'static str, Vec<String>>,
    headers: HeaderCatalog,
}

impl ManagerCore {
    pub fn new(client: ApiClient, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            client,
            cache,
            dictionaries: HashMap::new(),
            headers: HeaderCatalog::default(),
        }
    }

    /// Fetch one axis dictionary (cache-aware) and keep it in memory.
    /// `None` means the dictionary is unavailable; dependent selections
    /// will fail.
    pub async fn load_axis(
        &mut self,
        axis: &VocabAxis,
        force: bool,
    ) -> Result<Option<Vec<String>>> {
        let fetched = get_dictionary(
            &mut self.client,
            self.cache.as_ref(),
            axis.endpoint,
            axis.dict_name,
            force,
        )
        .await?;
        match fetched {
            Some(names) => {
                self.dictionaries.insert(axis.dict_name, names.clone());
                Ok(Some(names))
            }
            None => {
                self.dictionaries.remove(axis.dict_name);
                Ok(None)
            }
        }
    }

    /// Load every axis of a system. An unavailable dictionary is not fatal
    /// here; it becomes fatal when a selection depends on it.
    pub async fn load_axes(&mut self, axes: &[VocabAxis], force: bool) -> Result<()> {
        for axis in axes {
            self.load_axis(axis, force).await?;
        }
        Ok(())
    }

    pub fn dictionary(&self, axis: &VocabAxis) -> Option<&[String]> {
        self.dictionaries.get(axis.dict_name).map(Vec::as_slice)
    }

    /// Validate `values` against an axis dictionary.
    ///
    /// Precondition: the dictionary must be loaded. An empty or missing
    /// dictionary triggers one explicit reload before validation; if it is
    /// still unavailable the selection fails. An empty selection is valid
    /// by definition and skips the dictionary entirely.
    pub async fn select_axis(&mut self, axis: &VocabAxis, values: &[String]) -> Result<Vec<String>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let loaded = self
            .dictionaries
            .get(axis.dict_name)
            .is_some_and(|d| !d.is_empty());
        if !loaded {
            self.load_axis(axis, false).await?;
        }

        let dictionary = self
            .dictionaries
            .get(axis.dict_name)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                AppError::Validation(ValidationError::DictionaryUnavailable {
                    name: axis.dict_name.to_string(),
                })
            })?;

        select_elements(values, dictionary, axis.caption)
    }

    /// Export one axis dictionary to a text file, loading it if necessary.
    pub async fn save_axis(&mut self, axis: &VocabAxis, path: &Path) -> Result<()> {
        let loaded = self
            .dictionaries
            .get(axis.dict_name)
            .is_some_and(|d| !d.is_empty());
        if !loaded {
            self.load_axis(axis, false).await?;
        }
        let dictionary = self.dictionaries.get(axis.dict_name).ok_or_else(|| {
            AppError::Validation(ValidationError::DictionaryUnavailable {
                name: axis.dict_name.to_string(),
            })
        })?;
        save_dictionary(dictionary, path)
    }

    /// Fetch the header catalog for this session (cache-aware) and keep it.
    pub async fn load_headers(
        &mut self,
        path: &str,
        params: &[(&str, String)],
        cache_key: &str,
        force: bool,
    ) -> Result<Option<&HeaderCatalog>> {
        let fetched = get_headers(
            &mut self.client,
            self.cache.as_ref(),
            path,
            params,
            cache_key,
            force,
        )
        .await?;
        match fetched {
            Some(catalog) => {
                self.headers = catalog;
                Ok(Some(&self.headers))
            }
            None => Ok(None),
        }
    }

    pub fn headers(&self) -> &HeaderCatalog {
        &self.headers
    }

    pub fn select_header(&self, descriptions: &[String]) -> Result<Vec<String>> {
        self.headers.select(descriptions)
    }

    /// Issue the query call and parse the payload into a table.
    ///
    /// Non-200 yields `None` (caller must check); a 200 payload that is not
    /// a JSON array of row objects is fatal.
    pub async fn query(
        &mut self,
        path: &str,
        params: &[(&str, String)],
        requested: &[String],
    ) -> Result<Option<DataTable>> {
        let response = self.client.call(path, params).await?;
        if !response.is_success() {
            return Ok(None);
        }
        let table = DataTable::from_records(&response.content, requested).map_err(|e| {
            AppError::Validation(ValidationError::UnexpectedShape {
                endpoint: path.to_string(),
                detail: e.to_string(),
            })
        })?;
        Ok(Some(table))
    }
}

/// Capability contract shared by the two database systems. Each system
/// implements it independently over its own `ManagerCore`; there is no
/// base-manager type.
#[async_trait]
pub trait DatabaseManager {
    fn system_type(&self) -> &'static str;

    /// The vocabulary axes of this system, in canonical order.
    fn axes(&self) -> &'static [VocabAxis];

    /// Download (or re-download with `force`) every axis dictionary.
    async fn load_dictionaries(&mut self, force: bool) -> Result<()>;

    /// Fetch one axis dictionary by name, `None` when unavailable.
    async fn get_dictionary(&mut self, axis_name: &str, force: bool)
    -> Result<Option<Vec<String>>>;

    /// Validate a selection against one axis dictionary.
    async fn select(&mut self, axis_name: &str, values: &[String]) -> Result<Vec<String>>;

    /// Export one axis dictionary to a text file.
    async fn save_dictionary(&mut self, axis_name: &str, path: &Path) -> Result<()>;

    /// Resolve column descriptions against the loaded header catalog.
    fn select_header(&self, descriptions: &[String]) -> Result<Vec<String>>;

    /// Delete the cached bearer token (idempotent).
    fn reset_token(&mut self) -> Result<()>;

    /// Whether a token cache entry exists for this system.
    fn has_cached_token(&self) -> Result<bool>;
}

/// Look up an axis by dictionary name.
pub fn find_axis(axes: &'static [VocabAxis], name: &str) -> Result<&'static VocabAxis> {
    axes.iter().find(|a| a.dict_name == name).ok_or_else(|| {
        AppError::Validation(ValidationError::DictionaryUnavailable {
            name: name.to_string(),
        })
    })
}

/// Comma-join one axis selection into its single query parameter value.
/// An empty selection means "unrestricted" and stays an empty string.
pub fn join_values(values: &[String]) -> String {
    values.join(",")
}
