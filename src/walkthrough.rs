//! Example walkthroughs
//!
//! End-to-end create/get/update/list/delete sequences against a live
//! account. Every step reports its result or error to an [`Observer`];
//! the first failing step ends the walkthrough.

use crate::config::ServiceConfig;
use crate::iam_policy::{
    CreatePolicyParams, CreateRoleParams, DeletePolicyParams, DeleteRoleParams, GetPolicyParams,
    GetRoleParams, IamPolicyManagementV1, ListPoliciesParams, ListRolesParams, PolicyResource,
    PolicyRole, PolicySubject, ResourceAttribute, ResourceTag, UpdatePolicyParams,
    UpdateRoleParams,
};
use crate::ibm::error::ServiceError;
use crate::ibm::response::ServiceResponse;
use crate::resource_controller::*;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;

const EXAMPLE_USER_ID: &str = "IBMid-user1";
const EXAMPLE_SERVICE_NAME: &str = "iam-groups";
const VIEWER_ROLE: &str = "crn:v1:bluemix:public:iam::::role:Viewer";
const EDITOR_ROLE: &str = "crn:v1:bluemix:public:iam::::role:Editor";

const INSTANCE_NAME: &str = "RcSdkInstance1Rust";
const INSTANCE_UPDATE_NAME: &str = "RcSdkInstanceUpdate1Rust";
const ALIAS_NAME: &str = "RcSdkAlias1Rust";
const ALIAS_UPDATE_NAME: &str = "RcSdkAliasUpdate1Rust";
const BINDING_NAME: &str = "RcSdkBinding1Rust";
const BINDING_UPDATE_NAME: &str = "RcSdkBindingUpdate1Rust";
const KEY_NAME: &str = "RcSdkKey1Rust";
const KEY_UPDATE_NAME: &str = "RcSdkKeyUpdate1Rust";
const TARGET_REGION: &str = "global";
const RECLAIM_ACTION: &str = "reclaim";

/// Default wait between deleting an instance and looking for its reclamation
pub const DEFAULT_RECLAMATION_DELAY: Duration = Duration::from_secs(20);

/// Receives the outcome of every walkthrough step
pub trait Observer: Send + Sync {
    fn on_success(&self, operation: &str, result: &Value);
    fn on_failure(&self, operation: &str, error: &ServiceError);
}

/// Logs each step through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_success(&self, operation: &str, result: &Value) {
        tracing::info!(operation, "{} succeeded", operation);
        tracing::debug!("{} result: {}", operation, result);
    }

    fn on_failure(&self, operation: &str, error: &ServiceError) {
        match error.failure() {
            Some(failure) => tracing::error!(
                operation,
                status = failure.status,
                code = failure.code.as_deref().unwrap_or(""),
                "{} failed: {}",
                operation,
                error
            ),
            None => tracing::error!(operation, "{} failed: {}", operation, error),
        }
    }
}

/// Prints each result as pretty JSON on stdout, failures on stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPrinter;

impl Observer for JsonPrinter {
    fn on_success(&self, operation: &str, result: &Value) {
        let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
        println!("# {}\n{}", operation, pretty);
    }

    fn on_failure(&self, operation: &str, error: &ServiceError) {
        eprintln!("# {} failed\n{}", operation, crate::ibm::format_service_error(error));
    }
}

impl<A: Observer, B: Observer> Observer for (A, B) {
    fn on_success(&self, operation: &str, result: &Value) {
        self.0.on_success(operation, result);
        self.1.on_success(operation, result);
    }

    fn on_failure(&self, operation: &str, error: &ServiceError) {
        self.0.on_failure(operation, error);
        self.1.on_failure(operation, error);
    }
}

/// Await one operation and report it
async fn step<T, F>(
    observer: &dyn Observer,
    operation: &str,
    call: F,
) -> Result<ServiceResponse<T>, ServiceError>
where
    T: Serialize,
    F: Future<Output = Result<ServiceResponse<T>, ServiceError>>,
{
    tracing::info!("Running {}", operation);
    match call.await {
        Ok(response) => {
            observer.on_success(operation, &response.to_json());
            Ok(response)
        }
        Err(error) => {
            observer.on_failure(operation, &error);
            Err(error)
        }
    }
}

// =============================================================================
// IAM Policy Management
// =============================================================================

/// Policy lifecycle followed by custom role lifecycle
pub async fn run_iam_policy(
    service: &IamPolicyManagementV1,
    account_id: &str,
    observer: &dyn Observer,
) -> Result<(), ServiceError> {
    let subjects = vec![PolicySubject::iam_id(EXAMPLE_USER_ID)];
    let attributes = vec![
        ResourceAttribute::equals("accountId", account_id),
        ResourceAttribute::equals("serviceName", EXAMPLE_SERVICE_NAME),
    ];

    let create = CreatePolicyParams {
        policy_type: "access".to_string(),
        subjects: subjects.clone(),
        roles: vec![PolicyRole::new(VIEWER_ROLE)],
        resources: vec![PolicyResource {
            attributes: attributes.clone(),
            tags: vec![ResourceTag {
                name: "project".to_string(),
                value: "prototype".to_string(),
                operator: Some("stringEquals".to_string()),
            }],
        }],
        ..Default::default()
    };
    let policy_id = step(observer, "create_policy", service.create_policy(&create))
        .await?
        .into_result()
        .id;

    let fetched = step(
        observer,
        "get_policy",
        service.get_policy(&GetPolicyParams {
            policy_id: policy_id.clone(),
        }),
    )
    .await?;

    let update = UpdatePolicyParams {
        policy_id: policy_id.clone(),
        if_match: fetched.etag,
        policy_type: "access".to_string(),
        subjects,
        roles: vec![PolicyRole::new(EDITOR_ROLE)],
        resources: vec![PolicyResource {
            attributes,
            tags: Vec::new(),
        }],
        description: None,
    };
    step(observer, "update_policy", service.update_policy(&update)).await?;

    let list = ListPoliciesParams {
        account_id: account_id.to_string(),
        iam_id: Some(EXAMPLE_USER_ID.to_string()),
        format: Some("include_last_permit".to_string()),
        ..Default::default()
    };
    step(observer, "list_policies", service.list_policies(&list)).await?;

    step(
        observer,
        "delete_policy",
        service.delete_policy(&DeletePolicyParams { policy_id }),
    )
    .await?;

    let create_role = CreateRoleParams {
        display_name: "IAM Groups read access".to_string(),
        actions: vec!["iam-groups.groups.read".to_string()],
        name: "ExampleRoleIAMGroups".to_string(),
        account_id: account_id.to_string(),
        service_name: EXAMPLE_SERVICE_NAME.to_string(),
        ..Default::default()
    };
    let role_id = step(observer, "create_role", service.create_role(&create_role))
        .await?
        .into_result()
        .id;

    let fetched = step(
        observer,
        "get_role",
        service.get_role(&GetRoleParams {
            role_id: role_id.clone(),
        }),
    )
    .await?;

    let update_role = UpdateRoleParams {
        role_id: role_id.clone(),
        if_match: fetched.etag,
        actions: Some(vec![
            "iam-groups.groups.read".to_string(),
            "iam-groups.groups.list".to_string(),
        ]),
        ..Default::default()
    };
    step(observer, "update_role", service.update_role(&update_role)).await?;

    let list_roles = ListRolesParams {
        account_id: Some(account_id.to_string()),
        ..Default::default()
    };
    step(observer, "list_roles", service.list_roles(&list_roles)).await?;

    step(
        observer,
        "delete_role",
        service.delete_role(&DeleteRoleParams { role_id }),
    )
    .await?;

    Ok(())
}

// =============================================================================
// Resource Controller
// =============================================================================

/// Account-specific inputs for the Resource Controller walkthrough
#[derive(Debug, Clone)]
pub struct ResourceControllerSettings {
    pub resource_group: String,
    pub resource_plan_id: String,
    pub account_id: String,
    pub alias_target_crn: String,
    pub binding_target_crn: String,
    pub reclamation_delay: Duration,
}

impl ResourceControllerSettings {
    /// Read `RESOURCE_CONTROLLER_RESOURCE_GROUP`, `..._RECLAMATION_PLAN_ID`,
    /// `..._ACCOUNT_ID`, `..._ALIAS_TARGET_CRN` and `..._BINDING_TARGET_CRN`
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            resource_group: config.require_property("resourceGroup")?.to_string(),
            resource_plan_id: config.require_property("reclamationPlanId")?.to_string(),
            account_id: config.require_property("accountId")?.to_string(),
            alias_target_crn: config.require_property("aliasTargetCrn")?.to_string(),
            binding_target_crn: config.require_property("bindingTargetCrn")?.to_string(),
            reclamation_delay: DEFAULT_RECLAMATION_DELAY,
        })
    }
}

/// Instance, alias, binding and key lifecycles, then reclamation of the
/// deleted instance
pub async fn run_resource_controller(
    service: &ResourceControllerV2,
    settings: &ResourceControllerSettings,
    observer: &dyn Observer,
) -> Result<(), ServiceError> {
    // Instance
    let create = CreateResourceInstanceParams {
        name: INSTANCE_NAME.to_string(),
        target: TARGET_REGION.to_string(),
        resource_group: settings.resource_group.clone(),
        resource_plan_id: settings.resource_plan_id.clone(),
        ..Default::default()
    };
    let instance_guid = step(
        observer,
        "create_resource_instance",
        service.create_resource_instance(&create),
    )
    .await?
    .into_result()
    .guid;

    let fetched = step(
        observer,
        "get_resource_instance",
        service.get_resource_instance(&GetResourceInstanceParams {
            id: instance_guid.clone(),
        }),
    )
    .await?;

    let update = UpdateResourceInstanceParams {
        id: instance_guid.clone(),
        if_match: fetched.etag,
        name: Some(INSTANCE_UPDATE_NAME.to_string()),
        parameters: Some(json!({"example": "property"})),
        ..Default::default()
    };
    step(
        observer,
        "update_resource_instance",
        service.update_resource_instance(&update),
    )
    .await?;

    // Alias
    let create = CreateResourceAliasParams {
        name: ALIAS_NAME.to_string(),
        source: instance_guid.clone(),
        target: settings.alias_target_crn.clone(),
    };
    let alias_guid = step(
        observer,
        "create_resource_alias",
        service.create_resource_alias(&create),
    )
    .await?
    .into_result()
    .guid;

    let fetched = step(
        observer,
        "get_resource_alias",
        service.get_resource_alias(&GetResourceAliasParams {
            id: alias_guid.clone(),
        }),
    )
    .await?;

    let update = UpdateResourceAliasParams {
        id: alias_guid.clone(),
        if_match: fetched.etag,
        name: ALIAS_UPDATE_NAME.to_string(),
    };
    step(
        observer,
        "update_resource_alias",
        service.update_resource_alias(&update),
    )
    .await?;

    // Binding
    let create = CreateResourceBindingParams {
        source: alias_guid.clone(),
        target: settings.binding_target_crn.clone(),
        name: Some(BINDING_NAME.to_string()),
        ..Default::default()
    };
    let binding_guid = step(
        observer,
        "create_resource_binding",
        service.create_resource_binding(&create),
    )
    .await?
    .into_result()
    .guid;

    let fetched = step(
        observer,
        "get_resource_binding",
        service.get_resource_binding(&GetResourceBindingParams {
            id: binding_guid.clone(),
        }),
    )
    .await?;

    let update = UpdateResourceBindingParams {
        id: binding_guid.clone(),
        if_match: fetched.etag,
        name: BINDING_UPDATE_NAME.to_string(),
    };
    step(
        observer,
        "update_resource_binding",
        service.update_resource_binding(&update),
    )
    .await?;

    // Key
    let create = CreateResourceKeyParams {
        name: KEY_NAME.to_string(),
        source: instance_guid.clone(),
        ..Default::default()
    };
    let key_guid = step(
        observer,
        "create_resource_key",
        service.create_resource_key(&create),
    )
    .await?
    .into_result()
    .guid;

    let fetched = step(
        observer,
        "get_resource_key",
        service.get_resource_key(&GetResourceKeyParams {
            id: key_guid.clone(),
        }),
    )
    .await?;

    let update = UpdateResourceKeyParams {
        id: key_guid.clone(),
        if_match: fetched.etag,
        name: KEY_UPDATE_NAME.to_string(),
    };
    step(
        observer,
        "update_resource_key",
        service.update_resource_key(&update),
    )
    .await?;

    // Listings are independent of each other
    let instances = ListResourceInstancesParams {
        name: Some(INSTANCE_UPDATE_NAME.to_string()),
        ..Default::default()
    };
    let aliases = ListResourceAliasesParams {
        name: Some(ALIAS_UPDATE_NAME.to_string()),
        ..Default::default()
    };
    let bindings = ListResourceBindingsParams {
        name: Some(BINDING_UPDATE_NAME.to_string()),
        ..Default::default()
    };
    let keys = ListResourceKeysParams {
        name: Some(KEY_UPDATE_NAME.to_string()),
        ..Default::default()
    };
    futures::try_join!(
        step(
            observer,
            "list_resource_instances",
            service.list_resource_instances(&instances)
        ),
        step(
            observer,
            "list_resource_aliases",
            service.list_resource_aliases(&aliases)
        ),
        step(
            observer,
            "list_resource_bindings",
            service.list_resource_bindings(&bindings)
        ),
        step(
            observer,
            "list_resource_keys",
            service.list_resource_keys(&keys)
        ),
    )?;

    // Teardown
    step(
        observer,
        "delete_resource_binding",
        service.delete_resource_binding(&DeleteResourceBindingParams { id: binding_guid }),
    )
    .await?;

    step(
        observer,
        "delete_resource_key",
        service.delete_resource_key(&DeleteResourceKeyParams { id: key_guid }),
    )
    .await?;

    step(
        observer,
        "delete_resource_alias",
        service.delete_resource_alias(&DeleteResourceAliasParams { id: alias_guid }),
    )
    .await?;

    step(
        observer,
        "lock_resource_instance",
        service.lock_resource_instance(&LockResourceInstanceParams {
            id: instance_guid.clone(),
        }),
    )
    .await?;

    step(
        observer,
        "unlock_resource_instance",
        service.unlock_resource_instance(&UnlockResourceInstanceParams {
            id: instance_guid.clone(),
        }),
    )
    .await?;

    step(
        observer,
        "delete_resource_instance",
        service.delete_resource_instance(&DeleteResourceInstanceParams {
            id: instance_guid.clone(),
            recursive: Some(false),
        }),
    )
    .await?;

    // Reclamations appear asynchronously after the delete
    if !settings.reclamation_delay.is_zero() {
        tracing::info!(
            "Waiting {:?} for the reclamation to be scheduled",
            settings.reclamation_delay
        );
        tokio::time::sleep(settings.reclamation_delay).await;
    }

    let list = ListReclamationsParams {
        account_id: Some(settings.account_id.clone()),
        ..Default::default()
    };
    let reclamations = step(observer, "list_reclamations", service.list_reclamations(&list))
        .await?
        .into_result();

    // An empty id fails locally with MissingParameter and is reported
    let reclamation_id = reclamations
        .resources
        .into_iter()
        .find(|r| r.resource_instance_id.as_deref() == Some(instance_guid.as_str()))
        .map(|r| r.id)
        .unwrap_or_default();

    let action = RunReclamationActionParams {
        id: reclamation_id,
        action_name: RECLAIM_ACTION.to_string(),
        ..Default::default()
    };
    step(
        observer,
        "run_reclamation_action",
        service.run_reclamation_action(&action),
    )
    .await?;

    Ok(())
}
