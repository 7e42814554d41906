//! Resource Controller v2 client

use super::models::*;
use super::params::*;
use crate::config::ServiceConfig;
use crate::ibm::client::ServiceClient;
use crate::ibm::error::ServiceError;
use crate::ibm::request::{require, RequestSpec};
use crate::ibm::response::{Empty, ServiceResponse};
use reqwest::Method;

/// Upper bound on pages followed by the `list_all_*` helpers
const MAX_PAGES: usize = 1000;

/// Client for the Resource Controller service
#[derive(Clone)]
pub struct ResourceControllerV2 {
    client: ServiceClient,
}

impl ResourceControllerV2 {
    pub const DEFAULT_SERVICE_URL: &'static str = "https://resource-controller.cloud.ibm.com";
    pub const DEFAULT_SERVICE_NAME: &'static str = "resource_controller";

    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Build a client from `RESOURCE_CONTROLLER_*` configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        Ok(Self::new(config.service_client(Self::DEFAULT_SERVICE_URL)?))
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    // =========================================================================
    // Resource instances
    // =========================================================================

    pub async fn create_resource_instance(
        &self,
        params: &CreateResourceInstanceParams,
    ) -> Result<ServiceResponse<ResourceInstance>, ServiceError> {
        self.client.execute(build_create_resource_instance(params)?).await
    }

    pub async fn get_resource_instance(
        &self,
        params: &GetResourceInstanceParams,
    ) -> Result<ServiceResponse<ResourceInstance>, ServiceError> {
        self.client.execute(build_get_resource_instance(params)?).await
    }

    pub async fn update_resource_instance(
        &self,
        params: &UpdateResourceInstanceParams,
    ) -> Result<ServiceResponse<ResourceInstance>, ServiceError> {
        self.client.execute(build_update_resource_instance(params)?).await
    }

    pub async fn list_resource_instances(
        &self,
        params: &ListResourceInstancesParams,
    ) -> Result<ServiceResponse<ResourceInstancesList>, ServiceError> {
        self.client.execute(build_list_resource_instances(params)?).await
    }

    /// Follow `next_url` until the last page and return every instance
    pub async fn list_all_resource_instances(
        &self,
        params: &ListResourceInstancesParams,
    ) -> Result<Vec<ResourceInstance>, ServiceError> {
        let mut all_items = Vec::new();
        let mut page = params.clone();

        for _ in 0..MAX_PAGES {
            let list = self.list_resource_instances(&page).await?.into_result();
            let next_start = list.next_start();
            all_items.extend(list.resources);

            match next_start {
                Some(start) => page.start = Some(start),
                None => return Ok(all_items),
            }
        }

        tracing::warn!("Stopped paging resource instances after {} pages", MAX_PAGES);
        Ok(all_items)
    }

    pub async fn delete_resource_instance(
        &self,
        params: &DeleteResourceInstanceParams,
    ) -> Result<ServiceResponse<Empty>, ServiceError> {
        self.client.execute(build_delete_resource_instance(params)?).await
    }

    pub async fn lock_resource_instance(
        &self,
        params: &LockResourceInstanceParams,
    ) -> Result<ServiceResponse<ResourceInstance>, ServiceError> {
        self.client.execute(build_lock_resource_instance(params)?).await
    }

    pub async fn unlock_resource_instance(
        &self,
        params: &UnlockResourceInstanceParams,
    ) -> Result<ServiceResponse<ResourceInstance>, ServiceError> {
        self.client.execute(build_unlock_resource_instance(params)?).await
    }

    // =========================================================================
    // Resource aliases
    // =========================================================================

    pub async fn create_resource_alias(
        &self,
        params: &CreateResourceAliasParams,
    ) -> Result<ServiceResponse<ResourceAlias>, ServiceError> {
        self.client.execute(build_create_resource_alias(params)?).await
    }

    pub async fn get_resource_alias(
        &self,
        params: &GetResourceAliasParams,
    ) -> Result<ServiceResponse<ResourceAlias>, ServiceError> {
        self.client.execute(build_get_resource_alias(params)?).await
    }

    pub async fn update_resource_alias(
        &self,
        params: &UpdateResourceAliasParams,
    ) -> Result<ServiceResponse<ResourceAlias>, ServiceError> {
        self.client.execute(build_update_resource_alias(params)?).await
    }

    pub async fn list_resource_aliases(
        &self,
        params: &ListResourceAliasesParams,
    ) -> Result<ServiceResponse<ResourceAliasesList>, ServiceError> {
        self.client.execute(build_list_resource_aliases(params)?).await
    }

    pub async fn delete_resource_alias(
        &self,
        params: &DeleteResourceAliasParams,
    ) -> Result<ServiceResponse<Empty>, ServiceError> {
        self.client.execute(build_delete_resource_alias(params)?).await
    }

    // =========================================================================
    // Resource bindings
    // =========================================================================

    pub async fn create_resource_binding(
        &self,
        params: &CreateResourceBindingParams,
    ) -> Result<ServiceResponse<ResourceBinding>, ServiceError> {
        self.client.execute(build_create_resource_binding(params)?).await
    }

    pub async fn get_resource_binding(
        &self,
        params: &GetResourceBindingParams,
    ) -> Result<ServiceResponse<ResourceBinding>, ServiceError> {
        self.client.execute(build_get_resource_binding(params)?).await
    }

    pub async fn update_resource_binding(
        &self,
        params: &UpdateResourceBindingParams,
    ) -> Result<ServiceResponse<ResourceBinding>, ServiceError> {
        self.client.execute(build_update_resource_binding(params)?).await
    }

    pub async fn list_resource_bindings(
        &self,
        params: &ListResourceBindingsParams,
    ) -> Result<ServiceResponse<ResourceBindingsList>, ServiceError> {
        self.client.execute(build_list_resource_bindings(params)?).await
    }

    pub async fn delete_resource_binding(
        &self,
        params: &DeleteResourceBindingParams,
    ) -> Result<ServiceResponse<Empty>, ServiceError> {
        self.client.execute(build_delete_resource_binding(params)?).await
    }

    // =========================================================================
    // Resource keys
    // =========================================================================

    pub async fn create_resource_key(
        &self,
        params: &CreateResourceKeyParams,
    ) -> Result<ServiceResponse<ResourceKey>, ServiceError> {
        self.client.execute(build_create_resource_key(params)?).await
    }

    pub async fn get_resource_key(
        &self,
        params: &GetResourceKeyParams,
    ) -> Result<ServiceResponse<ResourceKey>, ServiceError> {
        self.client.execute(build_get_resource_key(params)?).await
    }

    pub async fn update_resource_key(
        &self,
        params: &UpdateResourceKeyParams,
    ) -> Result<ServiceResponse<ResourceKey>, ServiceError> {
        self.client.execute(build_update_resource_key(params)?).await
    }

    pub async fn list_resource_keys(
        &self,
        params: &ListResourceKeysParams,
    ) -> Result<ServiceResponse<ResourceKeysList>, ServiceError> {
        self.client.execute(build_list_resource_keys(params)?).await
    }

    pub async fn delete_resource_key(
        &self,
        params: &DeleteResourceKeyParams,
    ) -> Result<ServiceResponse<Empty>, ServiceError> {
        self.client.execute(build_delete_resource_key(params)?).await
    }

    // =========================================================================
    // Reclamations
    // =========================================================================

    pub async fn list_reclamations(
        &self,
        params: &ListReclamationsParams,
    ) -> Result<ServiceResponse<ReclamationsList>, ServiceError> {
        self.client.execute(build_list_reclamations(params)?).await
    }

    pub async fn run_reclamation_action(
        &self,
        params: &RunReclamationActionParams,
    ) -> Result<ServiceResponse<Reclamation>, ServiceError> {
        self.client.execute(build_run_reclamation_action(params)?).await
    }
}

// =============================================================================
// Request builders
// =============================================================================

fn by_id(method: Method, template: &str, id: &str) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(method, template).path_param("id", id).build()
}

pub fn build_create_resource_instance(
    params: &CreateResourceInstanceParams,
) -> Result<RequestSpec, ServiceError> {
    require("name", &params.name)?;
    require("target", &params.target)?;
    require("resource_group", &params.resource_group)?;
    require("resource_plan_id", &params.resource_plan_id)?;

    RequestSpec::builder(Method::POST, "/v2/resource_instances")
        .header_opt("Entity-Lock", params.entity_lock.map(|l| if l { "true" } else { "false" }))
        .json_body(params)
        .build()
}

pub fn build_get_resource_instance(
    params: &GetResourceInstanceParams,
) -> Result<RequestSpec, ServiceError> {
    by_id(Method::GET, "/v2/resource_instances/{id}", &params.id)
}

pub fn build_update_resource_instance(
    params: &UpdateResourceInstanceParams,
) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::PATCH, "/v2/resource_instances/{id}")
        .path_param("id", &params.id)
        .if_match("resource instance", params.if_match.as_ref())
        .json_body(params)
        .build()
}

pub fn build_list_resource_instances(
    params: &ListResourceInstancesParams,
) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v2/resource_instances")
        .query_opt("guid", params.guid.as_deref())
        .query_opt("name", params.name.as_deref())
        .query_opt("resource_group_id", params.resource_group_id.as_deref())
        .query_opt("resource_id", params.resource_id.as_deref())
        .query_opt("resource_plan_id", params.resource_plan_id.as_deref())
        .query_opt("type", params.instance_type.as_deref())
        .query_opt("sub_type", params.sub_type.as_deref())
        .query_opt("limit", params.limit)
        .query_opt("start", params.start.as_deref())
        .query_opt("state", params.state.as_deref())
        .query_opt("updated_from", params.updated_from.as_deref())
        .query_opt("updated_to", params.updated_to.as_deref())
        .build()
}

pub fn build_delete_resource_instance(
    params: &DeleteResourceInstanceParams,
) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::DELETE, "/v2/resource_instances/{id}")
        .path_param("id", &params.id)
        .query_opt("recursive", params.recursive)
        .build()
}

pub fn build_lock_resource_instance(
    params: &LockResourceInstanceParams,
) -> Result<RequestSpec, ServiceError> {
    by_id(Method::POST, "/v2/resource_instances/{id}/lock", &params.id)
}

pub fn build_unlock_resource_instance(
    params: &UnlockResourceInstanceParams,
) -> Result<RequestSpec, ServiceError> {
    by_id(Method::DELETE, "/v2/resource_instances/{id}/lock", &params.id)
}

pub fn build_create_resource_alias(
    params: &CreateResourceAliasParams,
) -> Result<RequestSpec, ServiceError> {
    require("name", &params.name)?;
    require("source", &params.source)?;
    require("target", &params.target)?;

    RequestSpec::builder(Method::POST, "/v2/resource_aliases")
        .json_body(params)
        .build()
}

pub fn build_get_resource_alias(params: &GetResourceAliasParams) -> Result<RequestSpec, ServiceError> {
    by_id(Method::GET, "/v2/resource_aliases/{id}", &params.id)
}

pub fn build_update_resource_alias(
    params: &UpdateResourceAliasParams,
) -> Result<RequestSpec, ServiceError> {
    require("name", &params.name)?;

    RequestSpec::builder(Method::PATCH, "/v2/resource_aliases/{id}")
        .path_param("id", &params.id)
        .if_match("resource alias", params.if_match.as_ref())
        .json_body(params)
        .build()
}

pub fn build_list_resource_aliases(
    params: &ListResourceAliasesParams,
) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v2/resource_aliases")
        .query_opt("guid", params.guid.as_deref())
        .query_opt("name", params.name.as_deref())
        .query_opt("resource_instance_id", params.resource_instance_id.as_deref())
        .query_opt("region_instance_id", params.region_instance_id.as_deref())
        .query_opt("resource_id", params.resource_id.as_deref())
        .query_opt("resource_group_id", params.resource_group_id.as_deref())
        .query_opt("limit", params.limit)
        .query_opt("start", params.start.as_deref())
        .build()
}

pub fn build_delete_resource_alias(
    params: &DeleteResourceAliasParams,
) -> Result<RequestSpec, ServiceError> {
    by_id(Method::DELETE, "/v2/resource_aliases/{id}", &params.id)
}

pub fn build_create_resource_binding(
    params: &CreateResourceBindingParams,
) -> Result<RequestSpec, ServiceError> {
    require("source", &params.source)?;
    require("target", &params.target)?;

    RequestSpec::builder(Method::POST, "/v2/resource_bindings")
        .json_body(params)
        .build()
}

pub fn build_get_resource_binding(
    params: &GetResourceBindingParams,
) -> Result<RequestSpec, ServiceError> {
    by_id(Method::GET, "/v2/resource_bindings/{id}", &params.id)
}

pub fn build_update_resource_binding(
    params: &UpdateResourceBindingParams,
) -> Result<RequestSpec, ServiceError> {
    require("name", &params.name)?;

    RequestSpec::builder(Method::PATCH, "/v2/resource_bindings/{id}")
        .path_param("id", &params.id)
        .if_match("resource binding", params.if_match.as_ref())
        .json_body(params)
        .build()
}

pub fn build_list_resource_bindings(
    params: &ListResourceBindingsParams,
) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v2/resource_bindings")
        .query_opt("guid", params.guid.as_deref())
        .query_opt("name", params.name.as_deref())
        .query_opt("resource_group_id", params.resource_group_id.as_deref())
        .query_opt("resource_id", params.resource_id.as_deref())
        .query_opt("region_binding_id", params.region_binding_id.as_deref())
        .query_opt("limit", params.limit)
        .query_opt("start", params.start.as_deref())
        .build()
}

pub fn build_delete_resource_binding(
    params: &DeleteResourceBindingParams,
) -> Result<RequestSpec, ServiceError> {
    by_id(Method::DELETE, "/v2/resource_bindings/{id}", &params.id)
}

pub fn build_create_resource_key(
    params: &CreateResourceKeyParams,
) -> Result<RequestSpec, ServiceError> {
    require("name", &params.name)?;
    require("source", &params.source)?;

    RequestSpec::builder(Method::POST, "/v2/resource_keys")
        .json_body(params)
        .build()
}

pub fn build_get_resource_key(params: &GetResourceKeyParams) -> Result<RequestSpec, ServiceError> {
    by_id(Method::GET, "/v2/resource_keys/{id}", &params.id)
}

pub fn build_update_resource_key(
    params: &UpdateResourceKeyParams,
) -> Result<RequestSpec, ServiceError> {
    require("name", &params.name)?;

    RequestSpec::builder(Method::PATCH, "/v2/resource_keys/{id}")
        .path_param("id", &params.id)
        .if_match("resource key", params.if_match.as_ref())
        .json_body(params)
        .build()
}

pub fn build_list_resource_keys(params: &ListResourceKeysParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v2/resource_keys")
        .query_opt("guid", params.guid.as_deref())
        .query_opt("name", params.name.as_deref())
        .query_opt("resource_group_id", params.resource_group_id.as_deref())
        .query_opt("resource_id", params.resource_id.as_deref())
        .query_opt("limit", params.limit)
        .query_opt("start", params.start.as_deref())
        .build()
}

pub fn build_delete_resource_key(
    params: &DeleteResourceKeyParams,
) -> Result<RequestSpec, ServiceError> {
    by_id(Method::DELETE, "/v2/resource_keys/{id}", &params.id)
}

pub fn build_list_reclamations(params: &ListReclamationsParams) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::GET, "/v1/reclamations")
        .query_opt("account_id", params.account_id.as_deref())
        .query_opt("resource_instance_id", params.resource_instance_id.as_deref())
        .query_opt("resource_group_id", params.resource_group_id.as_deref())
        .build()
}

pub fn build_run_reclamation_action(
    params: &RunReclamationActionParams,
) -> Result<RequestSpec, ServiceError> {
    RequestSpec::builder(Method::POST, "/v1/reclamations/{id}/actions/{action_name}")
        .path_param("id", &params.id)
        .path_param("action_name", &params.action_name)
        .json_body(params)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ibm::response::EntityTag;
    use serde_json::json;

    #[test]
    fn test_build_create_resource_instance() {
        let spec = build_create_resource_instance(&CreateResourceInstanceParams {
            name: "RcSdkInstance1".to_string(),
            target: "global".to_string(),
            resource_group: "rg-1".to_string(),
            resource_plan_id: "plan-1".to_string(),
            entity_lock: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.path, "/v2/resource_instances");
        assert_eq!(spec.header("Entity-Lock"), Some("true"));
        assert_eq!(
            spec.body.unwrap(),
            json!({
                "name": "RcSdkInstance1",
                "target": "global",
                "resource_group": "rg-1",
                "resource_plan_id": "plan-1"
            })
        );
    }

    #[test]
    fn test_create_resource_instance_requires_plan() {
        let err = build_create_resource_instance(&CreateResourceInstanceParams {
            name: "x".to_string(),
            target: "global".to_string(),
            resource_group: "rg".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(ref n) if n == "resource_plan_id"));
    }

    #[test]
    fn test_update_resource_instance() {
        let spec = build_update_resource_instance(&UpdateResourceInstanceParams {
            id: "guid-1".to_string(),
            if_match: Some(EntityTag::new("\"3-xyz\"")),
            name: Some("RcSdkInstanceUpdate1".to_string()),
            parameters: Some(json!({"example": "property"})),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(spec.method, Method::PATCH);
        assert_eq!(spec.path, "/v2/resource_instances/guid-1");
        assert_eq!(spec.header("If-Match"), Some("\"3-xyz\""));
        assert_eq!(
            spec.body.unwrap(),
            json!({"name": "RcSdkInstanceUpdate1", "parameters": {"example": "property"}})
        );
    }

    #[test]
    fn test_updates_require_entity_tag() {
        let err = build_update_resource_key(&UpdateResourceKeyParams {
            id: "k".to_string(),
            if_match: None,
            name: "n".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::MissingPrecondition(ref e) if e == "resource key"));

        assert!(matches!(
            build_update_resource_alias(&UpdateResourceAliasParams {
                id: "a".to_string(),
                if_match: None,
                name: "n".to_string(),
            }),
            Err(ServiceError::MissingPrecondition(_))
        ));
        assert!(matches!(
            build_update_resource_binding(&UpdateResourceBindingParams {
                id: "b".to_string(),
                if_match: None,
                name: "n".to_string(),
            }),
            Err(ServiceError::MissingPrecondition(_))
        ));
        assert!(matches!(
            build_update_resource_instance(&UpdateResourceInstanceParams {
                id: "i".to_string(),
                ..Default::default()
            }),
            Err(ServiceError::MissingPrecondition(_))
        ));
    }

    #[test]
    fn test_lock_and_unlock_paths() {
        let lock = build_lock_resource_instance(&LockResourceInstanceParams { id: "g".into() }).unwrap();
        assert_eq!((lock.method, lock.path.as_str()), (Method::POST, "/v2/resource_instances/g/lock"));

        let unlock =
            build_unlock_resource_instance(&UnlockResourceInstanceParams { id: "g".into() }).unwrap();
        assert_eq!(
            (unlock.method, unlock.path.as_str()),
            (Method::DELETE, "/v2/resource_instances/g/lock")
        );
    }

    #[test]
    fn test_delete_instance_recursive_query() {
        let spec = build_delete_resource_instance(&DeleteResourceInstanceParams {
            id: "g".to_string(),
            recursive: Some(false),
        })
        .unwrap();
        assert_eq!(spec.query_param("recursive"), Some("false"));

        let spec = build_delete_resource_instance(&DeleteResourceInstanceParams {
            id: "g".to_string(),
            recursive: None,
        })
        .unwrap();
        assert!(spec.query.is_empty());
    }

    #[test]
    fn test_list_filters_only_when_present() {
        let spec = build_list_resource_keys(&ListResourceKeysParams {
            name: Some("RcSdkKey1".to_string()),
            limit: Some(25),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            spec.query,
            vec![
                ("name".to_string(), "RcSdkKey1".to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_run_reclamation_action() {
        let spec = build_run_reclamation_action(&RunReclamationActionParams {
            id: "rec-1".to_string(),
            action_name: "reclaim".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(spec.path, "/v1/reclamations/rec-1/actions/reclaim");
        assert_eq!(spec.body.unwrap(), json!({}));

        let err = build_run_reclamation_action(&RunReclamationActionParams {
            id: "rec-1".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(ref n) if n == "action_name"));
    }

    #[test]
    fn test_create_binding_and_key_validation() {
        assert!(build_create_resource_binding(&CreateResourceBindingParams {
            source: "alias-guid".to_string(),
            ..Default::default()
        })
        .is_err());
        assert!(build_create_resource_key(&CreateResourceKeyParams {
            name: "key".to_string(),
            ..Default::default()
        })
        .is_err());
        assert!(build_create_resource_alias(&CreateResourceAliasParams {
            name: "alias".to_string(),
            source: "guid".to_string(),
            target: "crn:v1:target".to_string(),
        })
        .is_ok());
    }
}
