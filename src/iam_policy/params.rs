//! Parameters for IAM Policy Management operations
//!
//! Fields marked `#[serde(skip)]` travel in the path, query or headers;
//! everything else is the JSON body.

use super::models::{PolicyResource, PolicyRole, PolicySubject};
use crate::ibm::response::EntityTag;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreatePolicyParams {
    /// `access` or `authorization`
    #[serde(rename = "type")]
    pub policy_type: String,
    pub subjects: Vec<PolicySubject>,
    pub roles: Vec<PolicyRole>,
    pub resources: Vec<PolicyResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub accept_language: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetPolicyParams {
    pub policy_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePolicyParams {
    #[serde(skip)]
    pub policy_id: String,
    /// Entity tag from the latest get/create of this policy
    #[serde(skip)]
    pub if_match: Option<EntityTag>,
    #[serde(rename = "type")]
    pub policy_type: String,
    pub subjects: Vec<PolicySubject>,
    pub roles: Vec<PolicyRole>,
    pub resources: Vec<PolicyResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListPoliciesParams {
    pub account_id: String,
    pub accept_language: Option<String>,
    pub iam_id: Option<String>,
    pub access_group_id: Option<String>,
    pub policy_type: Option<String>,
    pub service_type: Option<String>,
    pub tag_name: Option<String>,
    pub tag_value: Option<String>,
    pub sort: Option<String>,
    /// `include_last_permit` adds last-permit data to each policy
    pub format: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeletePolicyParams {
    pub policy_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateRoleParams {
    pub display_name: String,
    pub actions: Vec<String>,
    pub name: String,
    pub account_id: String,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub accept_language: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetRoleParams {
    pub role_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateRoleParams {
    #[serde(skip)]
    pub role_id: String,
    #[serde(skip)]
    pub if_match: Option<EntityTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ListRolesParams {
    pub accept_language: Option<String>,
    pub account_id: Option<String>,
    pub service_name: Option<String>,
    pub source_service_name: Option<String>,
    pub policy_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteRoleParams {
    pub role_id: String,
}
