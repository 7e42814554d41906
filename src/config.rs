//! Configuration Management
//!
//! Two kinds of configuration live here:
//!
//! - [`ServiceConfig`]: per-service settings (URL, auth type, API key and
//!   free-form properties) read from an IBM credentials file and from
//!   environment variables.
//! - [`Config`]: small persisted CLI state under the user config dir.

use crate::ibm::auth::{Authenticator, BearerTokenAuthenticator, IamAuthenticator, NoAuthAuthenticator};
use crate::ibm::client::ServiceClient;
use crate::ibm::error::ServiceError;
use crate::ibm::http::{ReqwestTransport, DEFAULT_TIMEOUT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming an explicit credentials file
pub const CREDENTIALS_FILE_ENV: &str = "IBM_CREDENTIALS_FILE";

/// Credentials file looked up in the working directory and home directory
pub const DEFAULT_CREDENTIALS_FILE: &str = "ibm-credentials.env";

/// How requests to a service are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    #[default]
    Iam,
    BearerToken,
    NoAuth,
}

impl AuthType {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "iam" => Some(AuthType::Iam),
            "bearertoken" | "bearer_token" | "bearer-token" => Some(AuthType::BearerToken),
            "noauth" | "no_auth" | "none" => Some(AuthType::NoAuth),
            _ => None,
        }
    }
}

/// External configuration for one service
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub service_name: String,
    pub url: Option<String>,
    pub auth_type: AuthType,
    pub apikey: Option<String>,
    pub auth_url: Option<String>,
    pub bearer_token: Option<String>,
    pub disable_ssl: bool,
    /// Every other `<SERVICE>_<KEY>` property, keyed by normalized name
    properties: HashMap<String, String>,
}

impl ServiceConfig {
    /// Read the credentials file (if any) and then the process environment.
    /// Environment variables override file entries.
    pub fn from_external_sources(service_name: &str) -> Self {
        let file = credentials_file_path().and_then(|path| {
            tracing::debug!("Reading credentials file {:?}", path);
            std::fs::read_to_string(&path).ok()
        });

        Self::from_sources(service_name, file.as_deref(), std::env::vars())
    }

    /// Build a config from credentials file contents and `(key, value)`
    /// environment pairs. Only keys prefixed with the upper-cased service
    /// name are considered.
    pub fn from_sources<I>(service_name: &str, file_contents: Option<&str>, env: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{}_", service_name.to_ascii_uppercase());
        let mut config = Self {
            service_name: service_name.to_string(),
            ..Self::default()
        };

        if let Some(contents) = file_contents {
            for (key, value) in parse_credentials(contents) {
                config.apply(&prefix, &key, &value);
            }
        }

        for (key, value) in env {
            config.apply(&prefix, &key, &value);
        }

        config
    }

    fn apply(&mut self, prefix: &str, key: &str, value: &str) {
        let Some(property) = key.strip_prefix(prefix) else {
            return;
        };

        match property {
            "URL" => self.url = Some(value.to_string()),
            "AUTH_TYPE" => match AuthType::parse(value) {
                Some(auth_type) => self.auth_type = auth_type,
                None => tracing::warn!("Unknown auth type '{}' for {}", value, self.service_name),
            },
            "APIKEY" => self.apikey = Some(value.to_string()),
            "AUTH_URL" => self.auth_url = Some(value.to_string()),
            "BEARER_TOKEN" => self.bearer_token = Some(value.to_string()),
            "DISABLE_SSL" => self.disable_ssl = value.trim().eq_ignore_ascii_case("true"),
            other => {
                self.properties.insert(normalize_key(other), value.to_string());
            }
        }
    }

    /// Look up an extra property. `testAccountId`, `TEST_ACCOUNT_ID` and
    /// `test_account_id` all name the same property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(&normalize_key(name)).map(String::as_str)
    }

    /// Like [`ServiceConfig::property`] but fails when absent or empty
    pub fn require_property(&self, name: &str) -> Result<&str, ServiceError> {
        self.property(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ServiceError::Configuration(format!(
                    "missing property {}_{} for {}",
                    self.service_name.to_ascii_uppercase(),
                    to_env_suffix(name),
                    self.service_name
                ))
            })
    }

    /// Build the authenticator selected by `auth_type`
    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>, ServiceError> {
        match self.auth_type {
            AuthType::Iam => {
                let apikey = self.apikey.as_deref().ok_or_else(|| {
                    ServiceError::Configuration(format!(
                        "{}_APIKEY is required for IAM authentication",
                        self.service_name.to_ascii_uppercase()
                    ))
                })?;
                let mut auth = IamAuthenticator::new(apikey)?.with_options(DEFAULT_TIMEOUT, self.disable_ssl)?;
                if let Some(url) = &self.auth_url {
                    auth = auth.with_url(url);
                }
                Ok(Arc::new(auth))
            }
            AuthType::BearerToken => {
                let token = self.bearer_token.as_deref().ok_or_else(|| {
                    ServiceError::Configuration(format!(
                        "{}_BEARER_TOKEN is required for bearer token authentication",
                        self.service_name.to_ascii_uppercase()
                    ))
                })?;
                Ok(Arc::new(BearerTokenAuthenticator::new(token)))
            }
            AuthType::NoAuth => Ok(Arc::new(NoAuthAuthenticator)),
        }
    }

    /// Build a service client, falling back to `default_url`
    pub fn service_client(&self, default_url: &str) -> Result<ServiceClient, ServiceError> {
        let transport = ReqwestTransport::with_options(DEFAULT_TIMEOUT, self.disable_ssl)?;
        ServiceClient::new(
            self.url.as_deref().unwrap_or(default_url),
            self.authenticator()?,
            Arc::new(transport),
        )
    }
}

/// Lowercase and drop separators so camelCase and SNAKE_CASE compare equal
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// `testAccountId` -> `TEST_ACCOUNT_ID`
fn to_env_suffix(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.char_indices() {
        if c.is_ascii_uppercase() && i > 0 && !name[..i].ends_with('_') {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Parse `KEY=VALUE` lines, skipping blanks and comments
fn parse_credentials(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let value = value.trim().trim_matches('"');
            Some((key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Locate the credentials file: `$IBM_CREDENTIALS_FILE`, then the working
/// directory, then the home directory
fn credentials_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CREDENTIALS_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    let cwd = std::env::current_dir().ok().map(|d| d.join(DEFAULT_CREDENTIALS_FILE));
    let home = dirs::home_dir().map(|d| d.join(DEFAULT_CREDENTIALS_FILE));

    [cwd, home].into_iter().flatten().find(|p| p.exists())
}

/// Persisted CLI state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last walkthrough that was run
    #[serde(default)]
    pub last_service: Option<String>,
    /// Last account id used
    #[serde(default)]
    pub account_id: Option<String>,
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ibmcloud-platform").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        match Self::config_path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Record the walkthrough and account just used, then save. A failed
    /// save is logged and otherwise ignored.
    pub fn remember(&mut self, service: &str, account_id: Option<&str>) {
        self.last_service = Some(service.to_string());
        if let Some(account_id) = account_id {
            self.account_id = Some(account_id.to_string());
        }

        if let Err(e) = self.save() {
            tracing::warn!("Failed to save CLI state: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_only() {
        let config = ServiceConfig::from_sources(
            "iam_policy_management",
            None,
            env(&[
                ("IAM_POLICY_MANAGEMENT_URL", "https://iam.cloud.ibm.com"),
                ("IAM_POLICY_MANAGEMENT_AUTH_TYPE", "iam"),
                ("IAM_POLICY_MANAGEMENT_APIKEY", "secret"),
                ("IAM_POLICY_MANAGEMENT_TEST_ACCOUNT_ID", "acct-1"),
                ("UNRELATED_URL", "https://example.com"),
            ]),
        );

        assert_eq!(config.url.as_deref(), Some("https://iam.cloud.ibm.com"));
        assert_eq!(config.auth_type, AuthType::Iam);
        assert_eq!(config.apikey.as_deref(), Some("secret"));
        assert_eq!(config.property("testAccountId"), Some("acct-1"));
        assert_eq!(config.property("TEST_ACCOUNT_ID"), Some("acct-1"));
        assert!(config.property("url").is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = "\
# resource controller
RESOURCE_CONTROLLER_URL=https://resource-controller.test.cloud.ibm.com
RESOURCE_CONTROLLER_APIKEY=\"from-file\"
RESOURCE_CONTROLLER_RESOURCE_GROUP=rg-file

RESOURCE_CONTROLLER_DISABLE_SSL=true
";
        let config = ServiceConfig::from_sources(
            "resource_controller",
            Some(file),
            env(&[("RESOURCE_CONTROLLER_RESOURCE_GROUP", "rg-env")]),
        );

        assert_eq!(
            config.url.as_deref(),
            Some("https://resource-controller.test.cloud.ibm.com")
        );
        assert_eq!(config.apikey.as_deref(), Some("from-file"));
        assert_eq!(config.property("resourceGroup"), Some("rg-env"));
        assert!(config.disable_ssl);
    }

    #[test]
    fn test_auth_types() {
        let config = ServiceConfig::from_sources(
            "svc",
            None,
            env(&[("SVC_AUTH_TYPE", "bearerToken"), ("SVC_BEARER_TOKEN", "tok")]),
        );
        assert_eq!(config.auth_type, AuthType::BearerToken);
        assert!(config.authenticator().is_ok());

        let config = ServiceConfig::from_sources("svc", None, env(&[("SVC_AUTH_TYPE", "noauth")]));
        assert_eq!(config.auth_type, AuthType::NoAuth);
        assert!(config.authenticator().is_ok());
    }

    #[test]
    fn test_iam_requires_apikey() {
        let config = ServiceConfig::from_sources("svc", None, Vec::new());
        assert!(matches!(
            config.authenticator().err(),
            Some(ServiceError::Configuration(_))
        ));
    }

    #[test]
    fn test_require_property_message() {
        let config = ServiceConfig::from_sources("resource_controller", None, Vec::new());
        let err = config.require_property("aliasTargetCrn").unwrap_err();
        assert!(err.to_string().contains("RESOURCE_CONTROLLER_ALIAS_TARGET_CRN"));
    }

    #[test]
    fn test_require_property_non_ascii_name() {
        let config = ServiceConfig::from_sources("resource_controller", None, Vec::new());
        let err = config.require_property("résuméGroupÜ").unwrap_err();
        assert!(err.to_string().contains("RéSUMé_GROUPÜ"));
    }

    #[test]
    fn test_iam_authenticator_with_disabled_ssl() {
        let config = ServiceConfig::from_sources(
            "svc",
            None,
            env(&[
                ("SVC_APIKEY", "secret"),
                ("SVC_AUTH_URL", "https://iam.internal.example"),
                ("SVC_DISABLE_SSL", "true"),
            ]),
        );
        assert!(config.disable_ssl);
        assert!(config.authenticator().is_ok());
    }

    #[test]
    fn test_parse_credentials_skips_comments() {
        let parsed = parse_credentials("# comment\n; other\n\nA=1\nB = two \nnot a pair\n");
        assert_eq!(
            parsed,
            vec![("A".to_string(), "1".to_string()), ("B".to_string(), "two".to_string())]
        );
    }

    #[test]
    fn test_save_to_unwritable_path_is_an_error() {
        let blocker = std::env::temp_dir().join(format!("ibmcloud-platform-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, "not a directory").unwrap();

        let config = Config {
            last_service: Some("iam-policy".to_string()),
            account_id: Some("acct-1".to_string()),
        };
        let err = config.save_to(&blocker.join("nested").join("config.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to create config directory"));

        std::fs::remove_file(&blocker).unwrap();
    }

    #[test]
    fn test_save_to_round_trips() {
        let dir = std::env::temp_dir().join(format!("ibmcloud-platform-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");

        let config = Config {
            last_service: Some("resource-controller".to_string()),
            account_id: Some("acct-2".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded: Config = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.last_service.as_deref(), Some("resource-controller"));
        assert_eq!(loaded.account_id.as_deref(), Some("acct-2"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_service_client_uses_default_url() {
        let config = ServiceConfig::from_sources("svc", None, env(&[("SVC_AUTH_TYPE", "noauth")]));
        let client = config.service_client("https://iam.cloud.ibm.com").unwrap();
        assert_eq!(client.service_url(), "https://iam.cloud.ibm.com");
    }
}
