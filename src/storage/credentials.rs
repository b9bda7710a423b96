use crate::error::{AuthError, ConfigError};
use crate::{AppError, Result};
use std::fs;
use std::path::Path;

/// Username/password pair read from a local credentials file.
///
/// File format: first line, two whitespace-separated fields,
/// `<username> <password>`. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::Config(ConfigError::CredentialsNotFound {
                path: path.to_string_lossy().to_string(),
            }));
        }

        let content = fs::read_to_string(path).map_err(|source| {
            AppError::Storage(crate::error::StorageError::FileIo {
                path: path.to_string_lossy().to_string(),
                source,
            })
        })?;

        let first_line = content.lines().next().unwrap_or("");
        let mut fields = first_line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(username), Some(password)) => Ok(Self {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(AppError::Auth(AuthError::MalformedCredentials {
                path: path.to_string_lossy().to_string(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_credentials_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "{}", content).expect("Failed to write credentials");
        file
    }

    #[test]
    fn test_load_credentials() {
        let file = write_credentials_file("alice s3cret\n");
        let creds = Credentials::load(file.path()).expect("Load should succeed");
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_load_ignores_trailing_lines() {
        let file = write_credentials_file("alice s3cret\nleftover junk\n");
        let creds = Credentials::load(file.path()).expect("Load should succeed");
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Credentials::load(Path::new("/nonexistent/credentials.txt"));
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::CredentialsNotFound { .. }))
        ));
    }

    #[test]
    fn test_malformed_first_line_is_fatal() {
        let file = write_credentials_file("only_username\n");
        let result = Credentials::load(file.path());
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::MalformedCredentials { .. }))
        ));
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let file = write_credentials_file("");
        let result = Credentials::load(file.path());
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::MalformedCredentials { .. }))
        ));
    }
}
