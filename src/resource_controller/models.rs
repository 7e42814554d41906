//! Resource Controller result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// A provisioned service instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInstance {
    pub id: String,
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_cleanup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_operation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An alias of an instance into another namespace (e.g. a Cloud Foundry space)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAlias {
    pub id: String,
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Credentials binding an alias to an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBinding {
    pub id: String,
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_binding_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Service credentials for an instance or alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceKey {
    pub id: String,
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A deleted instance awaiting reclamation or restore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reclamation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of a Resource Controller collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ResourceList<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default)]
    pub resources: Vec<T>,
}

impl<T> ResourceList<T> {
    /// The `start` token of the next page, if there is one
    pub fn next_start(&self) -> Option<String> {
        let next = self.next_url.as_deref()?;
        // next_url is usually a relative path such as /v2/resource_instances?start=...
        let url = Url::parse(next)
            .or_else(|_| Url::parse("https://placeholder.invalid").and_then(|base| base.join(next)))
            .ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "start")
            .map(|(_, v)| v.into_owned())
    }
}

pub type ResourceInstancesList = ResourceList<ResourceInstance>;
pub type ResourceAliasesList = ResourceList<ResourceAlias>;
pub type ResourceBindingsList = ResourceList<ResourceBinding>;
pub type ResourceKeysList = ResourceList<ResourceKey>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReclamationsList {
    #[serde(default)]
    pub resources: Vec<Reclamation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_start_relative_url() {
        let list: ResourceInstancesList = serde_json::from_value(json!({
            "rows_count": 1,
            "next_url": "/v2/resource_instances?limit=1&start=g1AAAAA",
            "resources": [{"id": "crn:v1:a", "guid": "a"}]
        }))
        .unwrap();
        assert_eq!(list.next_start().as_deref(), Some("g1AAAAA"));
        assert_eq!(list.resources[0].guid, "a");
    }

    #[test]
    fn test_next_start_absent() {
        let list: ResourceKeysList = serde_json::from_value(json!({
            "rows_count": 0,
            "next_url": null,
            "resources": []
        }))
        .unwrap();
        assert!(list.next_start().is_none());
    }

    #[test]
    fn test_instance_requires_guid() {
        let result: Result<ResourceInstance, _> =
            serde_json::from_value(json!({"id": "crn:v1:a", "name": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_reclamation_roundtrip_keeps_extras() {
        let fixture = json!({
            "id": "rec-1",
            "resource_instance_id": "guid-1",
            "state": "SCHEDULED",
            "target_time": "2021-01-08T12:00:00Z",
            "custom_properties": {"k": "v"},
            "created_by": "IBMid-user1"
        });
        let reclamation: Reclamation = serde_json::from_value(fixture.clone()).unwrap();
        assert_eq!(reclamation.resource_instance_id.as_deref(), Some("guid-1"));
        assert_eq!(serde_json::to_value(&reclamation).unwrap(), fixture);
    }
}
