use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("AuthError: {0}")]
    Auth(#[from] AuthError),
    #[error("ValidationError: {0}")]
    Validation(#[from] ValidationError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("DisplayError: {0}")]
    Display(#[from] DisplayError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Query returned no data")]
    EmptyQueryResult,
    #[error("Dictionary '{name}' could not be fetched")]
    DictionaryFetchFailed { name: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP client initialization failed: {0}")]
    ClientInit(String),
    #[error("Transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated: token request failed and no usable token is held")]
    NotAuthenticated,
    #[error("Token endpoint returned an incomplete response: {0}")]
    MalformedTokenResponse(String),
    #[error("Credentials file {path} is malformed: expected '<username> <password>' on the first line")]
    MalformedCredentials { path: String },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("The following {caption} were not found: {}", missing.join(", "))]
    ValuesNotFound {
        caption: String,
        missing: Vec<String>,
    },
    #[error("Column descriptions not found: {}", missing.join(", "))]
    HeadersNotFound { missing: Vec<String> },
    #[error("Headers not loaded. Use query_headers to load the catalog first")]
    HeadersNotLoaded,
    #[error("Dictionary '{name}' is unavailable")]
    DictionaryUnavailable { name: String },
    #[error("Unexpected JSON shape in {endpoint} response: {detail}")]
    UnexpectedShape { endpoint: String, detail: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration save failed")]
    ConfigSaveFailed,
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Credentials file not found: {path}")]
    CredentialsNotFound { path: String },
    #[error("Profile '{name}' has no URL configured for {database}")]
    MissingDatabaseUrl { name: String, database: String },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Table formatting failed: {0}")]
    TableFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_every_missing_value() {
        let err = ValidationError::ValuesNotFound {
            caption: "process_types".to_string(),
            missing: vec!["Invasion".to_string(), "Adhesion".to_string()],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("process_types"));
        assert!(msg.contains("Invasion"));
        assert!(msg.contains("Adhesion"));
    }

    #[test]
    fn test_app_error_wraps_layers() {
        let app_err = AppError::Auth(AuthError::NotAuthenticated);
        assert!(format!("{}", app_err).starts_with("AuthError:"));

        let app_err = AppError::Validation(ValidationError::HeadersNotLoaded);
        assert!(format!("{}", app_err).starts_with("ValidationError:"));

        let app_err = AppError::Api(ApiError::Transport {
            endpoint: "/api/v1/query_data".to_string(),
            message: "connection refused".to_string(),
        });
        assert_eq!(
            format!("{}", app_err),
            "ApiError: Transport error calling /api/v1/query_data: connection refused"
        );
    }

    #[test]
    fn test_headers_not_found_display() {
        let err = ValidationError::HeadersNotFound {
            missing: vec!["Parameter value".to_string()],
        };
        assert_eq!(
            format!("{}", err),
            "Column descriptions not found: Parameter value"
        );
    }
}
