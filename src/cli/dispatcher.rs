use crate::api::models::DataTable;
use crate::cli::main_types::{AuthCommands, Commands, Database, DictCommands, QueryCommands};
use crate::core::headers::HeaderCatalog;
use crate::core::manager::{DatabaseManager, find_axis, join_values};
use crate::db::cytocon::{CytoconManager, CytoconQueryFilter};
use crate::db::fivedb::{FivedbManager, FivedbQueryFilter};
use crate::display::TableDisplay;
use crate::display::table::write_csv;
use crate::error::{AppError, CliError, ConfigError, ValidationError};
use crate::storage::cache::CacheStore;
use crate::storage::config::{DEFAULT_FIVEDB_URL, Profile};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Fallback when neither --credentials nor the profile names a file.
const DEFAULT_CREDENTIALS_FILE: &str = "credentials.txt";

pub struct Dispatcher {
    profile_name: String,
    profile: Profile,
    credentials_path: PathBuf,
    cache: Arc<dyn CacheStore>,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(
        profile_name: String,
        profile: Profile,
        credentials_override: Option<String>,
        cache: Arc<dyn CacheStore>,
        verbose: bool,
    ) -> Self {
        let credentials_path = credentials_override
            .or_else(|| profile.credentials_file.clone())
            .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string());

        Self {
            profile_name,
            profile,
            credentials_path: PathBuf::from(credentials_path),
            cache,
            verbose,
        }
    }

    fn log_verbose(&self, msg: &str) {
        if self.verbose {
            println!("Verbose: {}", msg);
        }
    }

    fn fivedb_manager(&self) -> Result<FivedbManager, AppError> {
        let base_url = self
            .profile
            .fivedb_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FIVEDB_URL.to_string());
        FivedbManager::new(
            &base_url,
            self.credentials_path.clone(),
            self.cache.clone(),
            self.profile.timeout_seconds,
        )
    }

    fn cytocon_manager(&self) -> Result<CytoconManager, AppError> {
        let base_url = self.profile.cytocon_url.clone().ok_or_else(|| {
            AppError::Config(ConfigError::MissingDatabaseUrl {
                name: self.profile_name.clone(),
                database: "cytocon".to_string(),
            })
        })?;
        CytoconManager::new(
            &base_url,
            self.credentials_path.clone(),
            self.cache.clone(),
            self.profile.timeout_seconds,
        )
    }

    fn manager_for(&self, database: Database) -> Result<Box<dyn DatabaseManager>, AppError> {
        Ok(match database {
            Database::Fivedb => Box::new(self.fivedb_manager()?),
            Database::Cytocon => Box::new(self.cytocon_manager()?),
        })
    }

    pub async fn dispatch(&self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Auth { command } => self.handle_auth_command(command).await,
            Commands::Dict { command } => self.handle_dict_command(command).await,
            Commands::Headers {
                database,
                disease,
                force,
                output,
            } => {
                self.handle_headers_command(database, disease, force, output)
                    .await
            }
            Commands::Query { command } => self.handle_query_command(command).await,
        }
    }

    async fn handle_auth_command(&self, commands: AuthCommands) -> Result<(), AppError> {
        match commands {
            AuthCommands::Reset { database } => {
                let mut manager = self.manager_for(database)?;
                self.log_verbose(&format!(
                    "Clearing cached token for {}",
                    manager.system_type()
                ));
                manager.reset_token()?;
                println!("Access token cache cleared for {}", manager.system_type());
                Ok(())
            }
            AuthCommands::Status { database } => {
                let manager = self.manager_for(database)?;
                if manager.has_cached_token()? {
                    println!("{}: a cached access token exists", manager.system_type());
                } else {
                    println!(
                        "{}: no cached access token (one will be requested on the next query)",
                        manager.system_type()
                    );
                }
                Ok(())
            }
        }
    }

    async fn handle_dict_command(&self, commands: DictCommands) -> Result<(), AppError> {
        match commands {
            DictCommands::List {
                database,
                name,
                force,
            } => {
                let mut manager = self.manager_for(database)?;
                let Some(name) = name else {
                    println!("Dictionaries for {}:", manager.system_type());
                    for axis in manager.axes() {
                        match axis.query_param {
                            Some(param) => {
                                println!("  {} (filter parameter: {})", axis.dict_name, param)
                            }
                            None => println!("  {} (not filterable)", axis.dict_name),
                        }
                    }
                    return Ok(());
                };

                let caption = find_axis(manager.axes(), &name)?.caption;
                self.log_verbose(&format!("Fetching dictionary '{}' (force: {})", name, force));
                let values = manager
                    .get_dictionary(&name, force)
                    .await?
                    .ok_or_else(|| AppError::Cli(CliError::DictionaryFetchFailed { name }))?;

                let display = TableDisplay::new();
                println!("{}", display.render_dictionary(caption, &values)?);
                println!("{} values", values.len());
                Ok(())
            }
            DictCommands::Save {
                database,
                name,
                output,
            } => {
                let mut manager = self.manager_for(database)?;
                self.log_verbose(&format!("Saving dictionary '{}' to {}", name, output));
                manager.save_dictionary(&name, Path::new(&output)).await?;
                println!("Dictionary '{}' saved to {}", name, output);
                Ok(())
            }
        }
    }

    async fn handle_headers_command(
        &self,
        database: Database,
        disease: Vec<String>,
        force: bool,
        output: Option<String>,
    ) -> Result<(), AppError> {
        match database {
            Database::Fivedb => {
                if !disease.is_empty() {
                    return Err(AppError::Cli(CliError::InvalidArguments(
                        "--disease only applies to the cytocon header catalog".to_string(),
                    )));
                }
                let mut manager = self.fivedb_manager()?;
                let catalog = manager
                    .query_headers(force)
                    .await?
                    .ok_or(AppError::Validation(ValidationError::HeadersNotLoaded))?;
                self.render_headers(catalog, output.as_deref())
            }
            Database::Cytocon => {
                let mut manager = self.cytocon_manager()?;
                let diseases = manager.select_diseases(&disease).await?;
                let scope = join_values(&diseases);
                self.log_verbose(&format!("Header catalog scope: '{}'", scope));
                let catalog = manager
                    .query_headers(&scope, force)
                    .await?
                    .ok_or(AppError::Validation(ValidationError::HeadersNotLoaded))?;
                self.render_headers(catalog, output.as_deref())
            }
        }
    }

    fn render_headers(&self, catalog: &HeaderCatalog, output: Option<&str>) -> Result<(), AppError> {
        if let Some(path) = output {
            catalog.save(Path::new(path))?;
            println!("{} column descriptions saved to {}", catalog.records().len(), path);
            return Ok(());
        }

        let table = DataTable {
            columns: vec![
                "Column description".to_string(),
                "Query variable".to_string(),
            ],
            rows: catalog
                .records()
                .iter()
                .map(|record| {
                    vec![
                        Value::String(record.description.clone()),
                        Value::String(record.variable.clone()),
                    ]
                })
                .collect(),
        };
        let display = TableDisplay::new();
        println!("{}", display.render_data_table(&table)?);
        Ok(())
    }

    async fn handle_query_command(&self, commands: QueryCommands) -> Result<(), AppError> {
        match commands {
            QueryCommands::Fivedb {
                process_type,
                parameter,
                cell_type,
                stimulated,
                patient_state,
                product,
                daughter_cell,
                regulator,
                modifier,
                header,
                wstat,
                force_headers,
                output,
            } => {
                let mut manager = self.fivedb_manager()?;

                // Every selection is validated against its dictionary before
                // anything is sent to the query endpoint.
                let filter = FivedbQueryFilter {
                    process_type: manager.select_process_types(&process_type).await?,
                    parameter: manager.select_parameters(&parameter).await?,
                    cell_type: manager.select_cell_types(&cell_type).await?,
                    stimulated: manager.select_stimulated(&stimulated).await?,
                    patient_state: manager.select_patient_states(&patient_state).await?,
                    product: manager.select_products(&product).await?,
                    daughter: manager.select_daughter_cells(&daughter_cell).await?,
                    regulator: manager.select_regulators(&regulator).await?,
                    modifier: manager.select_modifiers(&modifier).await?,
                };

                let variables = {
                    let catalog = manager
                        .query_headers(force_headers)
                        .await?
                        .ok_or(AppError::Validation(ValidationError::HeadersNotLoaded))?;
                    self.resolve_headers(catalog, &header)?
                };

                self.log_verbose(&format!("Requesting columns: {}", variables.join(", ")));
                let table = manager
                    .query_data(&filter, &variables, wstat)
                    .await?
                    .ok_or(AppError::Cli(CliError::EmptyQueryResult))?;

                self.render_result(&table, output.as_deref())
            }
            QueryCommands::Cytocon {
                species,
                tissue_type,
                disease,
                marker,
                header,
                wstat,
                force_headers,
                output,
            } => {
                let mut manager = self.cytocon_manager()?;

                let filter = CytoconQueryFilter {
                    species: manager.select_species(&species).await?,
                    tissue_types: manager.select_tissues_types(&tissue_type).await?,
                    diseases: manager.select_diseases(&disease).await?,
                    markers: manager.select_markers(&marker).await?,
                };

                // The Cytocon header catalog varies with the disease scope.
                let scope = join_values(&filter.diseases);
                let variables = {
                    let catalog = manager
                        .query_headers(&scope, force_headers)
                        .await?
                        .ok_or(AppError::Validation(ValidationError::HeadersNotLoaded))?;
                    self.resolve_headers(catalog, &header)?
                };

                self.log_verbose(&format!("Requesting columns: {}", variables.join(", ")));
                let table = manager
                    .query_data(&filter, &variables, wstat)
                    .await?
                    .ok_or(AppError::Cli(CliError::EmptyQueryResult))?;

                self.render_result(&table, output.as_deref())
            }
        }
    }

    /// Resolve requested column descriptions to query variables; with no
    /// request, every catalog column is returned.
    fn resolve_headers(
        &self,
        catalog: &HeaderCatalog,
        descriptions: &[String],
    ) -> Result<Vec<String>, AppError> {
        if descriptions.is_empty() {
            Ok(catalog
                .records()
                .iter()
                .map(|record| record.variable.clone())
                .collect())
        } else {
            catalog.select(descriptions)
        }
    }

    fn render_result(&self, table: &DataTable, output: Option<&str>) -> Result<(), AppError> {
        match output {
            Some(path) => {
                write_csv(table, Path::new(path))?;
                println!("{} rows saved to {}", table.rows.len(), path);
            }
            None => {
                let display = TableDisplay::new();
                println!("{}", display.render_data_table(table)?);
                println!("{} rows", table.rows.len());
            }
        }
        Ok(())
    }
}
