//! Service client
//!
//! Resolves a [`RequestSpec`] against the service URL, attaches the bearer
//! token and sends it through the transport. Responses with status >= 400
//! are classified; everything else is decoded.

use super::auth::Authenticator;
use super::error::{classify, is_success, ServiceError, TransportError};
use super::http::{HttpRequest, RawResponse, ReqwestTransport, Transport};
use super::request::RequestSpec;
use super::response::{decode, ServiceResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Header carrying a per-request id that IBM services echo in their logs
pub const TRANSACTION_ID_HEADER: &str = "Transaction-Id";

/// Shared HTTP plumbing for one service endpoint
#[derive(Clone)]
pub struct ServiceClient {
    service_url: Url,
    authenticator: Arc<dyn Authenticator>,
    transport: Arc<dyn Transport>,
}

impl ServiceClient {
    /// Create a client over an explicit transport
    pub fn new(
        service_url: &str,
        authenticator: Arc<dyn Authenticator>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ServiceError> {
        let service_url = Url::parse(service_url.trim_end_matches('/')).map_err(|e| {
            ServiceError::Configuration(format!("invalid service URL '{}': {}", service_url, e))
        })?;

        if service_url.cannot_be_a_base() {
            return Err(ServiceError::Configuration(format!(
                "service URL '{}' cannot be used as a base",
                service_url
            )));
        }

        Ok(Self {
            service_url,
            authenticator,
            transport,
        })
    }

    /// Create a client with the default reqwest transport
    pub fn with_default_transport(
        service_url: &str,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self, ServiceError> {
        let transport = ReqwestTransport::new()?;
        Self::new(service_url, authenticator, Arc::new(transport))
    }

    pub fn service_url(&self) -> &str {
        self.service_url.as_str().trim_end_matches('/')
    }

    /// Point the client at a different endpoint
    pub fn set_service_url(&mut self, service_url: &str) -> Result<(), ServiceError> {
        let updated = Self::new(service_url, self.authenticator.clone(), self.transport.clone())?;
        self.service_url = updated.service_url;
        Ok(())
    }

    /// Send a request and decode the result as `T`
    pub async fn execute<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<ServiceResponse<T>, ServiceError> {
        let raw = self.send(spec).await?;
        decode(raw)
    }

    /// Like [`ServiceClient::execute`], but gives up with `Cancelled` as
    /// soon as `cancel` completes
    pub async fn execute_cancellable<T, C>(
        &self,
        spec: RequestSpec,
        cancel: C,
    ) -> Result<ServiceResponse<T>, ServiceError>
    where
        T: DeserializeOwned,
        C: Future<Output = ()>,
    {
        with_cancel(self.execute(spec), cancel).await
    }

    /// Send a request and return the raw response, classifying failures
    pub async fn send(&self, spec: RequestSpec) -> Result<RawResponse, ServiceError> {
        // The token is captured once; a refresh during the call does not
        // affect this request.
        let token = self.authenticator.token().await?;
        let request = self.resolve(spec, token.as_deref())?;

        tracing::debug!("{} {}", request.method, request.url);

        let response = self.transport.send(request).await?;

        if !is_success(response.status) {
            return Err(classify(response.status, &response.headers, &response.body));
        }

        Ok(response)
    }

    fn resolve(&self, spec: RequestSpec, token: Option<&str>) -> Result<HttpRequest, ServiceError> {
        let mut url = self.service_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", base_path, spec.path));

        if !spec.query.is_empty() {
            url.query_pairs_mut().extend_pairs(spec.query.iter());
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }

        for (name, value) in &spec.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Request(format!("invalid header name '{}': {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }

        let transaction_id = HeaderName::from_static("transaction-id");
        if !headers.contains_key(&transaction_id) {
            let id = uuid::Uuid::new_v4().to_string();
            headers.insert(transaction_id, header_value(&id)?);
        }

        let body = spec
            .body
            .map(|body| serde_json::to_vec(&body))
            .transpose()
            .map_err(|e| ServiceError::Encode(e.to_string()))?;

        Ok(HttpRequest {
            method: spec.method,
            url,
            headers,
            body,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ServiceError> {
    HeaderValue::from_str(value)
        .map_err(|e| ServiceError::Transport(TransportError::Request(format!("invalid header value: {}", e))))
}

/// Race an operation against a cancellation signal. When the signal wins,
/// the in-flight request is dropped and the call fails with `Cancelled`.
pub async fn with_cancel<T, F, C>(operation: F, cancel: C) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
    C: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = cancel => {
            tracing::debug!("Request cancelled by caller");
            Err(ServiceError::Cancelled)
        }
        result = operation => result,
    }
}
