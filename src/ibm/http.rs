//! HTTP transport for IBM Cloud REST API calls
//!
//! The core never talks to the network directly; it hands a fully resolved
//! [`HttpRequest`] to a [`Transport`]. [`ReqwestTransport`] is the default.

use super::error::TransportError;
use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::time::Duration;
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A request ready for the wire: absolute URL, auth and headers applied
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Whatever came back, before any status interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Pluggable HTTP backend
pub trait Transport: Send + Sync {
    /// Send one request. Non-2xx statuses are returned as data, not errors.
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<RawResponse, TransportError>>;
}

/// HTTP transport backed by reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the default timeout and certificate checks on
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(DEFAULT_TIMEOUT, false)
    }

    pub fn with_options(timeout: Duration, disable_ssl_verification: bool) -> Result<Self, TransportError> {
        if disable_ssl_verification {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .user_agent(concat!("ibmcloud-platform/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(disable_ssl_verification)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn execute(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        Box::pin(self.execute(request))
    }
}
