//! IAM Policy Management result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `name`/`value` pair identifying who a policy applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAttribute {
    pub name: String,
    pub value: String,
}

impl SubjectAttribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicySubject {
    #[serde(default)]
    pub attributes: Vec<SubjectAttribute>,
}

impl PolicySubject {
    /// Subject matching a single IAM id
    pub fn iam_id(iam_id: &str) -> Self {
        Self {
            attributes: vec![SubjectAttribute::new("iam_id", iam_id)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRole {
    /// Role CRN, e.g. `crn:v1:bluemix:public:iam::::role:Viewer`
    pub role_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PolicyRole {
    pub fn new(role_id: &str) -> Self {
        Self {
            role_id: role_id.to_string(),
            display_name: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAttribute {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

impl ResourceAttribute {
    /// Attribute compared with `stringEquals`
    pub fn equals(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            operator: Some("stringEquals".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyResource {
    #[serde(default)]
    pub attributes: Vec<ResourceAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ResourceTag>,
}

/// An access or authorization policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subjects: Vec<PolicySubject>,
    #[serde(default)]
    pub roles: Vec<PolicyRole>,
    #[serde(default)]
    pub resources: Vec<PolicyResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Fields this client does not model, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyList {
    #[serde(default)]
    pub policies: Vec<Policy>,
}

/// A custom role defined in an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A system or service-defined role. These have a CRN but no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRole {
    pub crn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RoleList {
    #[serde(default)]
    pub custom_roles: Vec<Role>,
    #[serde(default)]
    pub service_roles: Vec<SystemRole>,
    #[serde(default)]
    pub system_roles: Vec<SystemRole>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_keeps_unknown_fields() {
        let fixture = json!({
            "id": "p-1",
            "type": "access",
            "subjects": [{"attributes": [{"name": "iam_id", "value": "IBMid-user1"}]}],
            "roles": [{"role_id": "crn:v1:bluemix:public:iam::::role:Viewer", "display_name": "Viewer"}],
            "resources": [{"attributes": [{"name": "accountId", "value": "acct", "operator": "stringEquals"}]}],
            "created_at": "2021-03-01T12:00:00.000Z",
            "template": {"id": "t-1"}
        });

        let policy: Policy = serde_json::from_value(fixture.clone()).unwrap();
        assert_eq!(policy.policy_type.as_deref(), Some("access"));
        assert_eq!(policy.subjects[0], PolicySubject::iam_id("IBMid-user1"));
        assert_eq!(policy.extra.get("template"), Some(&json!({"id": "t-1"})));
        assert_eq!(serde_json::to_value(&policy).unwrap(), fixture);
    }

    #[test]
    fn test_role_list_shapes() {
        let list: RoleList = serde_json::from_value(json!({
            "custom_roles": [{"id": "r-1", "name": "ExampleRole", "actions": ["iam-groups.groups.read"]}],
            "system_roles": [{"crn": "crn:v1:bluemix:public:iam::::role:Viewer", "display_name": "Viewer"}]
        }))
        .unwrap();
        assert_eq!(list.custom_roles[0].id, "r-1");
        assert!(list.service_roles.is_empty());
        assert_eq!(list.system_roles[0].display_name.as_deref(), Some("Viewer"));
    }

    #[test]
    fn test_resource_tags_omitted_when_empty() {
        let resource = PolicyResource {
            attributes: vec![ResourceAttribute::equals("serviceName", "iam-groups")],
            tags: Vec::new(),
        };
        let value = serde_json::to_value(&resource).unwrap();
        assert!(value.get("tags").is_none());
        assert_eq!(value["attributes"][0]["operator"], "stringEquals");
    }
}
