//! Typed async clients for IBM Cloud platform services
//!
//! - [`iam_policy`] - IAM Policy Management v1 (access policies, custom roles)
//! - [`resource_controller`] - Resource Controller v2 (instances, aliases,
//!   bindings, keys, reclamations)
//! - [`ibm`] - Shared client core: auth, transport, request/response, errors
//! - [`config`] - External service configuration and persisted CLI state
//! - [`walkthrough`] - End-to-end example sequences with result observers

pub mod config;
pub mod iam_policy;
pub mod ibm;
pub mod resource_controller;
pub mod walkthrough;
