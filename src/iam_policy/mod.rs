//! IAM Policy Management v1
//!
//! Access policies and custom roles.
//!
//! - [`models`] - Policy and role result types
//! - [`params`] - One parameter struct per operation
//! - [`service`] - [`IamPolicyManagementV1`] client and request builders

pub mod models;
pub mod params;
pub mod service;

pub use models::*;
pub use params::*;
pub use service::IamPolicyManagementV1;
