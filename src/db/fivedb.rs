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

pub const SYSTEM_TYPE: &str = "fivedb";

const QUERY_ENDPOINT: &str = "/api/v1/query_data";
const HEADERS_ENDPOINT: &str = "/api/v1/query_data_headers";
const HEADERS_CACHE_KEY: &str = "query_headers_5db";

/// The nine FIVEDB vocabulary axes, in query-parameter order.
pub static AXES: [VocabAxis; 9] = [
    VocabAxis {
        caption: "process types",
        dict_name: "process_types",
        endpoint: "/api/v1/process_types",
        query_param: Some("process_type"),
    },
    VocabAxis {
        caption: "parameters",
        dict_name: "parameters",
        endpoint: "/api/v1/parameters",
        query_param: Some("parameter"),
    },
    VocabAxis {
        caption: "cell types",
        dict_name: "cell_types",
        endpoint: "/api/v1/cell_types",
        query_param: Some("cell_type"),
    },
    VocabAxis {
        caption: "stimulated factors",
        dict_name: "stimulated",
        endpoint: "/api/v1/stimulated",
        query_param: Some("stimulated"),
    },
    VocabAxis {
        caption: "patient states",
        dict_name: "patient_states",
        endpoint: "/api/v1/patient_states",
        query_param: Some("patient_state"),
    },
    VocabAxis {
        caption: "products",
        dict_name: "products",
        endpoint: "/api/v1/products",
        query_param: Some("product"),
    },
    VocabAxis {
        caption: "daughter cells",
        dict_name: "daughter_cells",
        endpoint: "/api/v1/daughter_cells",
        query_param: Some("daughter"),
    },
    VocabAxis {
        caption: "regulators",
        dict_name: "regulators",
        endpoint: "/api/v1/regulators",
        query_param: Some("regulator"),
    },
    VocabAxis {
        caption: "modifiers",
        dict_name: "modifiers",
        endpoint: "/api/v1/modifiers",
        query_param: Some("modifier"),
    },
];

/// One selection per FIVEDB axis; an empty vector leaves that axis
/// unrestricted.
#[derive(Debug, Clone, Default)]
pub struct FivedbQueryFilter {
    pub process_type: Vec<String>,
    pub parameter: Vec<String>,
    pub cell_type: Vec<String>,
    pub stimulated: Vec<String>,
    pub patient_state: Vec<String>,
    pub product: Vec<String>,
    pub daughter: Vec<String>,
    pub regulator: Vec<String>,
    pub modifier: Vec<String>,
}

impl FivedbQueryFilter {
    /// Axis values in the canonical parameter order.
    fn axis_values(&self) -> [&Vec<String>; 9] {
        [
            &self.process_type,
            &self.parameter,
            &self.cell_type,
            &self.stimulated,
            &self.patient_state,
            &self.product,
            &self.daughter,
            &self.regulator,
            &self.modifier,
        ]
    }
}

/// Manager for the FIVEDB database: nine vocabulary axes and one fixed
/// header catalog.
pub struct FivedbManager {
    core: ManagerCore,
}

impl FivedbManager {
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

    pub async fn select_process_types(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[0], values).await
    }

    pub async fn select_parameters(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[1], values).await
    }

    pub async fn select_cell_types(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[2], values).await
    }

    pub async fn select_stimulated(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[3], values).await
    }

    pub async fn select_patient_states(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[4], values).await
    }

    pub async fn select_products(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[5], values).await
    }

    pub async fn select_daughter_cells(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[6], values).await
    }

    pub async fn select_regulators(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[7], values).await
    }

    pub async fn select_modifiers(&mut self, values: &[String]) -> Result<Vec<String>> {
        self.core.select_axis(&AXES[8], values).await
    }

    /// Fetch the fixed FIVEDB header catalog (cache-aware).
    pub async fn query_headers(&mut self, force: bool) -> Result<Option<&HeaderCatalog>> {
        self.core
            .load_headers(HEADERS_ENDPOINT, &[], HEADERS_CACHE_KEY, force)
            .await
    }

    pub fn headers(&self) -> &HeaderCatalog {
        self.core.headers()
    }

    /// Assemble and issue the filtered query.
    ///
    /// Each axis selection is comma-joined into one parameter; `headers`
    /// carries the requested variable names and `wstat_switch` is sent as
    /// a boolean-as-string flag. Non-200 yields `None`.
    pub async fn query_data(
        &mut self,
        filter: &FivedbQueryFilter,
        headers: &[String],
        wstat_switch: bool,
    ) -> Result<Option<DataTable>> {
        let values = filter.axis_values();
        let mut params: Vec<(&str, String)> = AXES
            .iter()
            .zip(values.iter())
            .map(|(axis, selection)| {
                (
                    axis.query_param.expect("every FIVEDB axis is filterable"),
                    join_values(selection),
                )
            })
            .collect();
        params.push(("headers", headers.join(",")));
        params.push(("wstatSwitch", wstat_switch.to_string()));

        self.core.query(QUERY_ENDPOINT, &params, headers).await
    }
}

#[async_trait]
impl DatabaseManager for FivedbManager {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cache::MemoryCacheStore;

    fn test_manager() -> FivedbManager {
        FivedbManager::new(
            "http://example.test",
            PathBuf::from("/nonexistent/credentials.txt"),
            Arc::new(MemoryCacheStore::new()),
            None,
        )
        .expect("manager creation failed")
    }

    #[test]
    fn test_nine_filterable_axes() {
        assert_eq!(AXES.len(), 9);
        assert!(AXES.iter().all(|a| a.query_param.is_some()));
    }

    #[test]
    fn test_axis_parameter_names() {
        let params: Vec<&str> = AXES.iter().filter_map(|a| a.query_param).collect();
        assert_eq!(
            params,
            vec![
                "process_type",
                "parameter",
                "cell_type",
                "stimulated",
                "patient_state",
                "product",
                "daughter",
                "regulator",
                "modifier"
            ]
        );
    }

    #[test]
    fn test_default_filter_is_unrestricted() {
        let filter = FivedbQueryFilter::default();
        assert!(filter.axis_values().iter().all(|v| v.is_empty()));
    }

    #[test]
    fn test_manager_system_type() {
        let manager = test_manager();
        assert_eq!(manager.system_type(), "fivedb");
        assert_eq!(manager.axes().len(), 9);
    }

    #[tokio::test]
    async fn test_unknown_axis_is_rejected() {
        let mut manager = test_manager();
        let result = manager.select("diseases", &[]).await;
        assert!(result.is_err());
    }
}
