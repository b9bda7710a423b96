use crate::api::models::TokenResponse;
use crate::error::{ApiError, AuthError};
use crate::storage::cache::CacheStore;
use crate::storage::credentials::Credentials;
use crate::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Bearer token with its absolute expiry time.
///
/// The invalid marker (empty token string) signals a failed token request;
/// the next call that needs authentication fails fatally on it.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// Marker for "not authenticated": empty token, already expired.
    pub fn invalid() -> Self {
        Self {
            token: String::new(),
            expires_at: Utc::now(),
        }
    }

    /// A token is usable while non-empty and strictly before expiry.
    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && self.expires_at > Utc::now()
    }
}

/// On-disk token cache entry, one file per system type.
#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    token: String,
    /// Absolute expiry timestamp (ISO-8601). The field keeps the wire name
    /// used by existing cache files.
    expires_in: DateTime<Utc>,
}

/// Exchanges stored credentials for a bearer token via the OAuth2
/// password grant, consulting the token cache first.
pub struct Authenticator {
    base_url: String,
    system_type: String,
    credentials_path: PathBuf,
    cache: Arc<dyn CacheStore>,
}

impl Authenticator {
    pub fn new(
        base_url: String,
        system_type: String,
        credentials_path: PathBuf,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            system_type,
            credentials_path,
            cache,
        }
    }

    pub fn system_type(&self) -> &str {
        &self.system_type
    }

    fn cache_key(&self) -> String {
        format!("token_cache_{}", self.system_type)
    }

    /// Return a usable token, hitting the network only when the cache holds
    /// no token with expiry strictly in the future.
    ///
    /// A non-200 token response yields the invalid marker instead of an
    /// error so callers can detect "not authenticated" and react. A 200
    /// response missing `access_token` or `expires_in` is fatal.
    pub async fn get_valid_token(&self, http: &reqwest::Client) -> Result<BearerToken> {
        if let Some(raw) = self.cache.get(&self.cache_key())? {
            // A corrupt cache entry is treated as a miss and overwritten.
            if let Ok(cached) = serde_json::from_str::<CachedToken>(&raw) {
                if cached.expires_in > Utc::now() {
                    return Ok(BearerToken::new(cached.token, cached.expires_in));
                }
            }
        }

        let credentials = Credentials::load(&self.credentials_path)?;
        self.request_token(http, &credentials).await
    }

    async fn request_token(
        &self,
        http: &reqwest::Client,
        credentials: &Credentials,
    ) -> Result<BearerToken> {
        let endpoint = format!("{}/oauth/token", self.base_url);
        let form = [
            ("grant_type", "password"),
            ("client_id", &credentials.username),
            ("client_secret", &credentials.password),
            ("username", &credentials.username),
            ("password", &credentials.password),
        ];

        let response = http
            .post(&endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                AppError::Api(ApiError::Transport {
                    endpoint: "/oauth/token".to_string(),
                    message: e.to_string(),
                })
            })?;

        if !response.status().is_success() {
            return Ok(BearerToken::invalid());
        }

        let body = response.text().await.map_err(|e| {
            AppError::Api(ApiError::Transport {
                endpoint: "/oauth/token".to_string(),
                message: e.to_string(),
            })
        })?;

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Auth(AuthError::MalformedTokenResponse(e.to_string())))?;

        let expires_at = Utc::now() + Duration::seconds(token_response.expires_in);
        let token = BearerToken::new(token_response.access_token, expires_at);

        let entry = CachedToken {
            token: token.token.clone(),
            expires_in: token.expires_at,
        };
        self.cache.put(
            &self.cache_key(),
            &serde_json::to_string(&entry).expect("token cache entry serializes"),
        )?;

        Ok(token)
    }

    /// Delete the cached token unconditionally. Idempotent.
    pub fn reset_token(&self) -> Result<()> {
        self.cache.invalidate(&self.cache_key())?;
        Ok(())
    }

    /// Whether a cache entry exists for this system type (valid or not).
    pub fn has_cached_token(&self) -> Result<bool> {
        Ok(self.cache.get(&self.cache_key())?.is_some())
    }
}
