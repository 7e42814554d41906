//! IAM Policy Management v1 client

use super::models::{Policy, PolicyList, Role, RoleList};
use super::params::*;
use crate::config::ServiceConfig;
use crate::ibm::client::ServiceClient;
use crate::ibm::error::ServiceError;
use crate::ibm::request::{require, require_non_empty, RequestSpec};
use crate::ibm::response::{Empty, ServiceResponse};
use reqwest::Method;

/// Client for the IAM Policy Management service
#[derive(Clone)]
pub struct IamPolicyManagementV1 {
    client: ServiceClient,
}

impl IamPolicyManagementV1 {
    pub const DEFAULT_SERVICE_URL: &'static str = "https://iam.cloud.ibm.com";
    pub const DEFAULT_SERVICE_NAME: &'static str = "iam_policy_management";

    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Build a client from `IAM_POLICY_MANAGEMENT_*` configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        Ok(Self::new(config.service_client(Self::DEFAULT_SERVICE_URL)?))
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    // =========================================================================
    // Policies
    // =========================================================================

    pub async fn create_policy(
        &self,
        params: &CreatePolicyParams,
    ) -> Result<ServiceResponse<Policy>, ServiceError> {
        self.client.execute(build_create_policy(params)?).await
    }

    pub async fn get_policy(
        &self,
        params: &GetPolicyParams,
    ) -> Result<ServiceResponse<Policy>, ServiceError> {
        self.client.execute(build_get_policy(params)?).await
    }

    /// Replace a policy. Requires the entity tag of the latest get.
    pub async fn update_policy(
        &self,
        params: &UpdatePolicyParams,
    ) -> Result<ServiceResponse<Policy>, ServiceError> {
        self.client.execute(build_update_policy(params)?).await
    }

    pub async fn list_policies(
        &self,
        params: &ListPoliciesParams,
    ) -> Result<ServiceResponse<PolicyList>, ServiceError> {
        self.client.execute(build_list_policies(params)?).await
    }

    pub async fn delete_policy(
        &self,
        params: &DeletePolicyParams,
    ) -> Result<ServiceResponse<Empty>, ServiceError> {
        self.client.execute(build_delete_policy(params)?).await
    }

    // =========================================================================
    // Custom roles
    // =========================================================================

    pub async fn create_role(
        &self,
        params: &CreateRoleParams,
    ) -> Result<ServiceResponse<Role>, ServiceError> {
        self.client.execute(build_create_role(params)?).await
    }

    pub async fn get_role(&self, params: &GetRoleParams) -> Result<ServiceResponse<Role>, ServiceError> {
        self.client.execute(build_get_role(params)?).await
    }

    pub async fn update_role(
        &self,
        params: &UpdateRoleParams,
    ) -> Result<ServiceResponse<Role>, ServiceError> {
        self.client.execute(build_update_role(params)?).await
    }

    pub async fn list_roles(
        &self,
        params: &ListRolesParams,
    ) -> Result<ServiceResponse<RoleList>, ServiceError> {
        self.client.execute(build_list_roles(params)?).await
    }

    pub async fn delete_role(
        &self,
        params: &DeleteRoleParams,
    ) -> Result<ServiceResponse<Empty>, ServiceError> {
        self.client.execute(build_delete_role(params)?).await
    }
}

// =============================================================================
// Request builders
// =============================================================================

fn validate_policy_body(
    policy_type: &str,
    subjects: &[super::models::PolicySubject],
    roles: &[super::models::PolicyRole],
    resources: &[super::models::PolicyResource],
) -> Result<(), ServiceError> {
    require("type", policy_type)?;
    require_non_empty("subjects", subjects)?;
    require_non_empty("roles", roles)?;
    require_non_empty("resources", resources)?;
    for role in roles {
        require("role_id", &role.role_id)?;
    }
    Ok(())
}

pub fn build_create_policy(params: &CreatePolicyParams) -> Result<RequestSpec, ServiceError> {
    validate_policy_body(
        &params.policy_type,
        &params.subjects,
        &params.roles,
        &params.resources,
    )?;

    RequestSpec::builder(Method::POST, "/v1/policies")
        .header_opt("Accept-Language", params.accept_language.as_deref())
        .json_body(params)
        .build()
}

pub fn build_get_policy(params: &GetPolicyParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v1/policies/{policy_id}")
        .path_param("policy_id", &params.policy_id)
        .build()
}

pub fn build_update_policy(params: &UpdatePolicyParams) -> Result<RequestSpec, ServiceError> {
    require("policy_id", &params.policy_id)?;
    validate_policy_body(
        &params.policy_type,
        &params.subjects,
        &params.roles,
        &params.resources,
    )?;

    RequestSpec::builder(Method::PUT, "/v1/policies/{policy_id}")
        .path_param("policy_id", &params.policy_id)
        .if_match("policy", params.if_match.as_ref())
        .json_body(params)
        .build()
}

pub fn build_list_policies(params: &ListPoliciesParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v1/policies")
        .query("account_id", &params.account_id)
        .query_opt("iam_id", params.iam_id.as_deref())
        .query_opt("access_group_id", params.access_group_id.as_deref())
        .query_opt("type", params.policy_type.as_deref())
        .query_opt("service_type", params.service_type.as_deref())
        .query_opt("tag_name", params.tag_name.as_deref())
        .query_opt("tag_value", params.tag_value.as_deref())
        .query_opt("sort", params.sort.as_deref())
        .query_opt("format", params.format.as_deref())
        .query_opt("state", params.state.as_deref())
        .header_opt("Accept-Language", params.accept_language.as_deref())
        .build()
}

pub fn build_delete_policy(params: &DeletePolicyParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::DELETE, "/v1/policies/{policy_id}")
        .path_param("policy_id", &params.policy_id)
        .build()
}

pub fn build_create_role(params: &CreateRoleParams) -> Result<RequestSpec, ServiceError> {
    require("display_name", &params.display_name)?;
    require_non_empty("actions", &params.actions)?;
    require("name", &params.name)?;
    require("account_id", &params.account_id)?;
    require("service_name", &params.service_name)?;

    RequestSpec::builder(Method::POST, "/v1/roles")
        .header_opt("Accept-Language", params.accept_language.as_deref())
        .json_body(params)
        .build()
}

pub fn build_get_role(params: &GetRoleParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v1/roles/{role_id}")
        .path_param("role_id", &params.role_id)
        .build()
}

pub fn build_update_role(params: &UpdateRoleParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::PUT, "/v1/roles/{role_id}")
        .path_param("role_id", &params.role_id)
        .if_match("role", params.if_match.as_ref())
        .json_body(params)
        .build()
}

pub fn build_list_roles(params: &ListRolesParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v1/roles")
        .query_opt("account_id", params.account_id.as_deref())
        .query_opt("service_name", params.service_name.as_deref())
        .query_opt("source_service_name", params.source_service_name.as_deref())
        .query_opt("policy_type", params.policy_type.as_deref())
        .header_opt("Accept-Language", params.accept_language.as_deref())
        .build()
}

pub fn build_delete_role(params: &DeleteRoleParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::DELETE, "/v1/roles/{role_id}")
        .path_param("role_id", &params.role_id)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam_policy::models::{PolicyResource, PolicyRole, PolicySubject, ResourceAttribute};
    use crate::ibm::response::EntityTag;
    use serde_json::json;

    fn policy_params() -> CreatePolicyParams {
        CreatePolicyParams {
            policy_type: "access".to_string(),
            subjects: vec![PolicySubject::iam_id("IBMid-user1")],
            roles: vec![PolicyRole::new("crn:v1:bluemix:public:iam::::role:Viewer")],
            resources: vec![PolicyResource {
                attributes: vec![
                    ResourceAttribute::equals("accountId", "acct-1"),
                    ResourceAttribute::equals("serviceName", "iam-groups"),
                ],
                tags: Vec::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_create_policy_body() {
        let spec = build_create_policy(&policy_params()).unwrap();
        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.path, "/v1/policies");
        let body = spec.body.unwrap();
        assert_eq!(body["type"], "access");
        assert_eq!(body["subjects"][0]["attributes"][0]["value"], "IBMid-user1");
        assert_eq!(body["roles"][0]["role_id"], "crn:v1:bluemix:public:iam::::role:Viewer");
        assert!(body.get("description").is_none());
        assert!(body.get("accept_language").is_none());
    }

    #[test]
    fn test_create_policy_requires_subjects() {
        let params = CreatePolicyParams {
            subjects: Vec::new(),
            ..policy_params()
        };
        let err = build_create_policy(&params).unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(ref n) if n == "subjects"));
    }

    #[test]
    fn test_update_policy_body_excludes_path_and_tag() {
        let created = policy_params();
        let params = UpdatePolicyParams {
            policy_id: "p-1".to_string(),
            if_match: Some(EntityTag::new("1-abc")),
            policy_type: created.policy_type,
            subjects: created.subjects,
            roles: vec![PolicyRole::new("crn:v1:bluemix:public:iam::::role:Editor")],
            resources: created.resources,
            description: None,
        };
        let spec = build_update_policy(&params).unwrap();
        assert_eq!(spec.method, Method::PUT);
        assert_eq!(spec.path, "/v1/policies/p-1");
        assert_eq!(spec.header("If-Match"), Some("1-abc"));
        let body = spec.body.unwrap();
        assert!(body.get("policy_id").is_none());
        assert!(body.get("if_match").is_none());
        assert_eq!(body["roles"][0]["role_id"], "crn:v1:bluemix:public:iam::::role:Editor");
    }

    #[test]
    fn test_update_policy_requires_tag() {
        let created = policy_params();
        let params = UpdatePolicyParams {
            policy_id: "p-1".to_string(),
            if_match: None,
            policy_type: created.policy_type,
            subjects: created.subjects,
            roles: created.roles,
            resources: created.resources,
            description: None,
        };
        assert!(matches!(
            build_update_policy(&params),
            Err(ServiceError::MissingPrecondition(_))
        ));
    }

    #[test]
    fn test_list_policies_query() {
        let spec = build_list_policies(&ListPoliciesParams {
            account_id: "acct-1".to_string(),
            iam_id: Some("IBMid-user1".to_string()),
            format: Some("include_last_permit".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            spec.query,
            vec![
                ("account_id".to_string(), "acct-1".to_string()),
                ("iam_id".to_string(), "IBMid-user1".to_string()),
                ("format".to_string(), "include_last_permit".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_policies_requires_account() {
        let err = build_list_policies(&ListPoliciesParams::default()).unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(ref n) if n == "account_id"));
    }

    #[test]
    fn test_build_create_role() {
        let spec = build_create_role(&CreateRoleParams {
            display_name: "IAM Groups read access".to_string(),
            actions: vec!["iam-groups.groups.read".to_string()],
            name: "ExampleRoleIAMGroups".to_string(),
            account_id: "acct-1".to_string(),
            service_name: "iam-groups".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            spec.body.unwrap(),
            json!({
                "display_name": "IAM Groups read access",
                "actions": ["iam-groups.groups.read"],
                "name": "ExampleRoleIAMGroups",
                "account_id": "acct-1",
                "service_name": "iam-groups"
            })
        );
    }

    #[test]
    fn test_update_role_partial_body() {
        let spec = build_update_role(&UpdateRoleParams {
            role_id: "r-1".to_string(),
            if_match: Some(EntityTag::new("2-def")),
            actions: Some(vec![
                "iam-groups.groups.read".to_string(),
                "iam-groups.groups.list".to_string(),
            ]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            spec.body.unwrap(),
            json!({"actions": ["iam-groups.groups.read", "iam-groups.groups.list"]})
        );
    }

    #[test]
    fn test_id_operations_require_id() {
        assert!(build_get_policy(&GetPolicyParams::default()).is_err());
        assert!(build_delete_policy(&DeletePolicyParams::default()).is_err());
        assert!(build_get_role(&GetRoleParams::default()).is_err());
        assert!(build_delete_role(&DeleteRoleParams::default()).is_err());
    }

    #[test]
    fn test_list_roles_without_filters() {
        let spec = build_list_roles(&ListRolesParams::default()).unwrap();
        assert!(spec.query.is_empty());
        assert_eq!(spec.path, "/v1/roles");
    }
}
