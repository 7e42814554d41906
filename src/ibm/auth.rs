//! IBM Cloud authentication
//!
//! Authenticators hand out bearer tokens. [`IamAuthenticator`] exchanges an
//! API key at the IAM token endpoint and caches the result until shortly
//! before it expires.

use super::error::{classify, ServiceError, TransportError};
use super::http::DEFAULT_TIMEOUT;
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default IAM token service
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

const TOKEN_PATH: &str = "/identity/token";
const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Refresh tokens this many seconds before they actually expire
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Token lifetime assumed when the token service does not say (30 minutes)
const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 60;

/// Source of bearer credentials, shared across concurrent calls
pub trait Authenticator: Send + Sync {
    /// Current bearer token, or `None` when requests go out unauthenticated
    fn token(&self) -> BoxFuture<'_, Result<Option<String>, ServiceError>>;
}

/// Sends no credentials at all. Useful against local mock servers.
#[derive(Debug, Clone, Default)]
pub struct NoAuthAuthenticator;

impl Authenticator for NoAuthAuthenticator {
    fn token(&self) -> BoxFuture<'_, Result<Option<String>, ServiceError>> {
        Box::pin(async { Ok(None) })
    }
}

/// A caller-managed static bearer token
#[derive(Debug, Clone)]
pub struct BearerTokenAuthenticator {
    token: String,
}

impl BearerTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn token(&self) -> BoxFuture<'_, Result<Option<String>, ServiceError>> {
        Box::pin(async move { Ok(Some(self.token.clone())) })
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix timestamp in seconds
    #[serde(default)]
    expiration: Option<i64>,
}

impl TokenResponse {
    fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let expiry = self
            .expiration
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + TimeDelta::seconds(secs)))
            .unwrap_or(now + TimeDelta::seconds(DEFAULT_TOKEN_TTL_SECS));
        expiry - TimeDelta::seconds(TOKEN_EXPIRY_BUFFER_SECS)
    }
}

/// API key authenticator with token caching
#[derive(Clone)]
pub struct IamAuthenticator {
    apikey: String,
    url: String,
    client: Client,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl IamAuthenticator {
    pub fn new(apikey: impl Into<String>) -> Result<Self, ServiceError> {
        let apikey = apikey.into();
        if apikey.trim().is_empty() {
            return Err(ServiceError::Configuration("IAM API key is empty".to_string()));
        }

        Ok(Self {
            apikey,
            url: DEFAULT_IAM_URL.to_string(),
            client: token_client(DEFAULT_TIMEOUT, false)?,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Bound the token exchange by `timeout` and optionally accept
    /// self-signed certificates on the token service
    pub fn with_options(mut self, timeout: Duration, disable_ssl_verification: bool) -> Result<Self, ServiceError> {
        self.client = token_client(timeout, disable_ssl_verification)?;
        Ok(self)
    }

    /// Use a different token service, e.g. a staging IAM or a mock server
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.trim_end_matches('/').to_string();
        self
    }

    fn token_url(&self) -> String {
        if self.url.ends_with(TOKEN_PATH) {
            self.url.clone()
        } else {
            format!("{}{}", self.url, TOKEN_PATH)
        }
    }

    /// Get a bearer token, from cache while it is still valid
    pub async fn get_token(&self) -> Result<String, ServiceError> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let fetched = self.request_token().await?;
        let expires_at = fetched.expires_at(Utc::now());

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: fetched.access_token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, valid until {}",
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        Ok(fetched.access_token)
    }

    /// Drop the cached token and fetch a fresh one
    pub async fn refresh_token(&self) -> Result<String, ServiceError> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }

    async fn request_token(&self) -> Result<TokenResponse, ServiceError> {
        let url = self.token_url();
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", APIKEY_GRANT_TYPE),
                ("apikey", self.apikey.as_str()),
                ("response_type", "cloud_iam"),
            ])
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(TransportError::from)?;

        if !status_ok(status) {
            let failure = classify(status, &headers, &body);
            return Err(ServiceError::Authentication(failure.to_string()));
        }

        serde_json::from_slice(&body)
            .map_err(|e| ServiceError::Authentication(format!("invalid token response: {}", e)))
    }
}

fn status_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

fn token_client(timeout: Duration, disable_ssl_verification: bool) -> Result<Client, ServiceError> {
    Client::builder()
        .user_agent(concat!("ibmcloud-platform/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .danger_accept_invalid_certs(disable_ssl_verification)
        .build()
        .map_err(|e| ServiceError::Configuration(format!("failed to create HTTP client: {}", e)))
}

impl Authenticator for IamAuthenticator {
    fn token(&self) -> BoxFuture<'_, Result<Option<String>, ServiceError>> {
        Box::pin(async move { self.get_token().await.map(Some) })
    }
}
