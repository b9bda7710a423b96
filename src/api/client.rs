use crate::core::auth::{Authenticator, BearerToken};
use crate::error::{ApiError, AuthError};
use crate::{AppError, Result};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("insysdb-cli/", env!("CARGO_PKG_VERSION"));

/// Raw outcome of an API call. A non-200 status is a normal outcome the
/// caller must check, not an error.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub content: String,
    pub status: u16,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Authenticated REST client for one database system.
///
/// Holds at most one live token for its system type and re-authenticates
/// inline through the `Authenticator` when the token is missing or expired.
pub struct ApiClient {
    client: reqwest::Client,
    pub base_url: String,
    authenticator: Authenticator,
    token: Option<BearerToken>,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        authenticator: Authenticator,
        timeout_seconds: Option<u64>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Api(ApiError::ClientInit(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authenticator,
            token: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_ref().is_some_and(BearerToken::is_valid)
    }

    /// Issue an authenticated GET against `path` with the given query
    /// parameters, authenticating first when no valid token is held.
    ///
    /// Fatal only when authentication cannot produce a usable token or the
    /// transport fails; any HTTP status comes back in the `ApiResponse`.
    pub async fn call(&mut self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        if !self.is_authenticated() {
            let token = self.authenticator.get_valid_token(&self.client).await?;
            self.token = Some(token);
        }

        let token = match self.token.as_ref() {
            Some(t) if t.is_valid() => t,
            _ => return Err(AppError::Auth(AuthError::NotAuthenticated)),
        };

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| {
                AppError::Api(ApiError::Transport {
                    endpoint: path.to_string(),
                    message: e.to_string(),
                })
            })?;

        let status = response.status().as_u16();
        let content = response.text().await.map_err(|e| {
            AppError::Api(ApiError::Transport {
                endpoint: path.to_string(),
                message: e.to_string(),
            })
        })?;

        Ok(ApiResponse { content, status })
    }

    /// Drop the in-process token and delete the on-disk cache entry.
    pub fn reset_token(&mut self) -> Result<()> {
        self.token = None;
        self.authenticator.reset_token()
    }

    /// Whether a token cache entry exists on disk for this system type.
    pub fn has_cached_token(&self) -> Result<bool> {
        self.authenticator.has_cached_token()
    }

    pub fn system_type(&self) -> &str {
        self.authenticator.system_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cache::MemoryCacheStore;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn test_client() -> ApiClient {
        let authenticator = Authenticator::new(
            "http://example.test".to_string(),
            "fivedb".to_string(),
            PathBuf::from("/nonexistent/credentials.txt"),
            Arc::new(MemoryCacheStore::new()),
        );
        ApiClient::new("http://example.test/".to_string(), authenticator, None)
            .expect("client creation failed")
    }

    #[test]
    fn test_client_creation_strips_trailing_slash() {
        let client = test_client();
        assert_eq!(client.base_url, "http://example.test");
    }

    #[test]
    fn test_new_client_is_not_authenticated() {
        let client = test_client();
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_reset_token_drops_live_token() {
        let mut client = test_client();
        client.token = Some(BearerToken::new(
            "abc".to_string(),
            chrono::Utc::now() + chrono::Duration::seconds(60),
        ));
        assert!(client.is_authenticated());

        client.reset_token().expect("reset should succeed");
        assert!(!client.is_authenticated());
        assert!(!client.has_cached_token().expect("cache readable"));
    }

    #[tokio::test]
    async fn test_call_without_credentials_fails_fatally() {
        let mut client = test_client();
        // No cached token and no credentials file: authentication cannot
        // produce a token, so the call must not proceed.
        let result = client.call("/api/v1/process_types", &[]).await;
        assert!(result.is_err());
    }
}
