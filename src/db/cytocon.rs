use crate::api::client::ApiClient;
use crate::api::models::DataTable;
use crate::core::auth::Authenticator;
use crate::core::headers::HeaderCatalog;
use crate::core::manager::{DatabaseManager, ManagerCore, VocabAxis, find_axis, join_values};
use crate::storage::cache::CacheStore;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SYSTEM_TYPE: &str = "cytocon";

const QUERY_ENDPOINT: &str = "/api/v1/query_data";
const HEADERS_ENDPOINT: &str = "/api/v1/query_data_headers";

/// The seven Cytocon vocabulary axes. The attribute vocabularies are
/// downloadable but not filterable, so they carry no query parameter.
pub static AXES: [VocabAxis; 7] = [
    VocabAxis {
        caption: "diseases",
        dict_name: "diseases",
        endpoint: "/api/v1/diseases",
        query_param: Some("diseases"),
    },
    VocabAxis {
        caption: "tissues types",
        dict_name: "tissues_types",
        endpoint: "/api/v1/tissues_types",
        query_param: Some("tissue_types"),
    },
    VocabAxis {
        caption: "species",
        dict_name: "species",
        endpoint: "/api/v1/species",
        query_param: Some("species"),
    },
    VocabAxis {
        caption: "markers",
        dict_name: "markers",
        endpoint: "/api/v1/markers",
        query_param: Some("markers"),
    },
    VocabAxis {
        caption: "patient groups",
        dict_name: "patient_groups",
        endpoint: "/api/v1/patient_groups",
        query_param: None,
    },
    VocabAxis {
        caption: "disease attributes",
        dict_name: "disease_attributes",
        endpoint: "/api/v1/disease_attributes",
        query_param: None,
    },
    VocabAxis {
        caption: "patient group attributes",
        dict_name: "patient_group_attributes",
        endpoint: "/api/v1/patient_group_attributes",
        query_param: None,
    },
];

/// One selection per filterable Cytocon axis; an empty vector leaves that
/// axis unrestricted.
#[derive(Debug, Clone, Default)]
pub struct CytoconQueryFilter {
    pub species: Vec<String>,
    pub tissue_types: Vec<String>,
    pub diseases: Vec<String>,
    pub markers: Vec<String>,
}

/// Manager for the Cytocon database: seven vocabulary axes and a header
/// catalog scoped by a disease filter.
pub struct CytoconManager {
    core: ManagerCore,
}

impl CytoconManager {
    pub fn new(
        base_url: &str,
        credentials_path: PathBuf,
        cache: Arc<dyn CacheStore>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self> {
        let authenticator = Authenticator::new(
            base_url.to_string(),
            SYSTEM_TYPE.to_string(),
            credentials_path,
            cache.clone(),
        );
        let client = ApiClient::new(base_url.to_string(), authenticator, timeout_seconds)?;
        Ok(Self {
            core: ManagerCore::new(client, cache),
        })
    }

    pub async fn select_diseases(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[0], values).await
    }

    pub async fn select_tissues_types(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[1], values).await
    }

    pub async fn select_species(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[2], values).await
    }

    pub async fn select_markers(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[3], values).await
    }

    /// Fetch the header catalog for one disease scope (cache-aware). The
    /// cache key carries the scope so catalogs for different diseases do
    /// not collide.
    pub async fn query_headers(
        &mut self,
        diseases: &str,
        force: bool,
    ) -> Result<Option<&HeaderCatalog>> {
        let cache_key = format!("query_headers_{}", diseases);
        let params = [("diseases", diseases.to_string())];
        self.core
            .load_headers(HEADERS_ENDPOINT, &params, &cache_key, force)
            .await
    }

    pub fn headers(&self) -> &HeaderCatalog {
        self.core.headers()
    }

    /// Assemble and issue the filtered query. Non-200 yields `None`.
    pub async fn query_data(
        &mut self,
        filter: &CytoconQueryFilter,
        headers: &[String],
        wstat_switch: bool,
    ) -> Result<Option<DataTable>> {
        let params: Vec<(&str, String)> = vec![
            ("tissue_types", join_values(&filter.tissue_types)),
            ("diseases", join_values(&filter.diseases)),
            ("species", join_values(&filter.species)),
            ("markers", join_values(&filter.markers)),
            ("headers", headers.join(",")),
            ("wstatSwitch", wstat_switch.to_string()),
        ];

        self.core.query(QUERY_ENDPOINT, &params, headers).await
    }
}

#[async_trait]
impl DatabaseManager for CytoconManager {
    fn system_type(&self) -> &'static str {
        SYSTEM_TYPE
    }

    fn axes(&self) -> &'static [VocabAxis] {
        &AXES
    }

    async fn load_dictionaries(&mut self, force: bool) -> Result<()> {
        self.core.load_axes(&AXES, force).await
    }

    async fn get_dictionary(
        &mut self,
        axis_name: &str,
        force: bool,
    ) -> Result<Option<Vec<String>>> {
        let axis = find_axis(&AXES, axis_name)?;
        self.core.load_axis(axis, force).await
    }

    async fn select(&mut self, axis_name: &str, values: &[String]) -> Result<Vec<String>> {
        let axis = find_axis(&AXES, axis_name)?;
        self.core.select_axis(axis, values).await
    }

    async fn save_dictionary(&mut self, axis_name: &str, path: &Path) -> Result<()> {
        let axis = find_axis(&AXES, axis_name)?;
        self.core.save_axis(axis, path).await
    }

    fn select_header(&self, descriptions: &[String]) -> Result<Vec<String>> {
        self.core.select_header(descriptions)
    }

    fn reset_token(&mut self) -> Result<()> {
        self.core.client.reset_token()
    }

    fn has_cached_token(&self) -> Result<bool> {
        self.core.client.has_cached_token()
    }
}
