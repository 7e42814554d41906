//! IBM Cloud API interaction module
//!
//! The typed resource client core shared by every service:
//!
//! - [`auth`] - Bearer token providers (IAM API key, static token, none)
//! - [`client`] - Service client that resolves, authenticates and sends requests
//! - [`error`] - Error taxonomy and status classification
//! - [`http`] - Pluggable HTTP transport, reqwest by default
//! - [`request`] - Request builder with path, query and precondition handling
//! - [`response`] - Response decoding and entity tags
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ibmcloud_platform::ibm::{auth::IamAuthenticator, client::ServiceClient, request::RequestSpec};
//!
//! async fn example() -> Result<(), ibmcloud_platform::ibm::error::ServiceError> {
//!     let auth = IamAuthenticator::new("my-api-key")?;
//!     let client = ServiceClient::with_default_transport("https://iam.cloud.ibm.com", Arc::new(auth))?;
//!     let spec = RequestSpec::builder(reqwest::Method::GET, "/v1/roles/{role_id}")
//!         .path_param("role_id", "abc")
//!         .build()?;
//!     let role: serde_json::Value = client.execute(spec).await?.into_result();
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod request;
pub mod response;

pub use auth::{Authenticator, BearerTokenAuthenticator, IamAuthenticator, NoAuthAuthenticator};
pub use client::{with_cancel, ServiceClient};
pub use error::{format_service_error, ServiceError, ServiceFailure, TransportError};
pub use http::{HttpRequest, RawResponse, ReqwestTransport, Transport};
pub use request::RequestSpec;
pub use response::{Empty, EntityTag, ServiceResponse};
