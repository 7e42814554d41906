//! Resource Controller v2
//!
//! Provisioning and lifecycle of resource instances, plus the aliases,
//! bindings and keys attached to them and the reclamations left behind
//! after deletion.

pub mod models;
pub mod params;
pub mod service;

pub use models::*;
pub use params::*;
pub use service::ResourceControllerV2;
