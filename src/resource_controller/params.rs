//! Parameters for Resource Controller operations
//!
//! Fields marked `#[serde(skip)]` travel in the path, query or headers;
//! everything else is the JSON body.

use crate::ibm::response::EntityTag;
use serde::Serialize;
use serde_json::Value;

// =============================================================================
// Resource instances
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateResourceInstanceParams {
    pub name: String,
    /// Deployment location, e.g. `global` or `us-south`
    pub target: String,
    /// Short id of the resource group
    pub resource_group: String,
    pub resource_plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_cleanup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Sent as the `Entity-Lock` header
    #[serde(skip)]
    pub entity_lock: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GetResourceInstanceParams {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateResourceInstanceParams {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub if_match: Option<EntityTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_cleanup: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ListResourceInstancesParams {
    pub guid: Option<String>,
    pub name: Option<String>,
    pub resource_group_id: Option<String>,
    pub resource_id: Option<String>,
    pub resource_plan_id: Option<String>,
    pub instance_type: Option<String>,
    pub sub_type: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<String>,
    pub state: Option<String>,
    pub updated_from: Option<String>,
    pub updated_to: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteResourceInstanceParams {
    pub id: String,
    /// Also delete aliases, bindings and keys of the instance
    pub recursive: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct LockResourceInstanceParams {
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct UnlockResourceInstanceParams {
    pub id: String,
}

// =============================================================================
// Resource aliases
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateResourceAliasParams {
    pub name: String,
    /// GUID of the instance being aliased
    pub source: String,
    /// CRN of the target namespace
    pub target: String,
}

#[derive(Debug, Clone, Default)]
pub struct GetResourceAliasParams {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateResourceAliasParams {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub if_match: Option<EntityTag>,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListResourceAliasesParams {
    pub guid: Option<String>,
    pub name: Option<String>,
    pub resource_instance_id: Option<String>,
    pub region_instance_id: Option<String>,
    pub resource_id: Option<String>,
    pub resource_group_id: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteResourceAliasParams {
    pub id: String,
}

// =============================================================================
// Resource bindings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateResourceBindingParams {
    /// GUID of the alias being bound
    pub source: String,
    /// CRN of the application to bind to
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetResourceBindingParams {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateResourceBindingParams {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub if_match: Option<EntityTag>,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListResourceBindingsParams {
    pub guid: Option<String>,
    pub name: Option<String>,
    pub resource_group_id: Option<String>,
    pub resource_id: Option<String>,
    pub region_binding_id: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteResourceBindingParams {
    pub id: String,
}

// =============================================================================
// Resource keys
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateResourceKeyParams {
    pub name: String,
    /// GUID of the instance or alias the key is for
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetResourceKeyParams {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateResourceKeyParams {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub if_match: Option<EntityTag>,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListResourceKeysParams {
    pub guid: Option<String>,
    pub name: Option<String>,
    pub resource_group_id: Option<String>,
    pub resource_id: Option<String>,
    pub limit: Option<u32>,
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteResourceKeyParams {
    pub id: String,
}

// =============================================================================
// Reclamations
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ListReclamationsParams {
    pub account_id: Option<String>,
    pub resource_instance_id: Option<String>,
    pub resource_group_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReclamationActionParams {
    #[serde(skip)]
    pub id: String,
    /// `reclaim` or `restore`
    #[serde(skip)]
    pub action_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
