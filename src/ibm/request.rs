//! Request builder
//!
//! Turns an operation's parameters into a [`RequestSpec`]. All validation
//! happens here, so a request that fails to build never reaches the network.

use super::error::ServiceError;
use super::response::EntityTag;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// One outbound request, relative to the service URL
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    /// Path with every parameter substituted and percent-encoded
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn builder(method: Method, path_template: &str) -> RequestBuilder {
        RequestBuilder {
            method,
            template: path_template.to_string(),
            path_params: Vec::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            error: None,
        }
    }

    /// Look up a header by name, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for [`RequestSpec`]. The first error recorded wins and is
/// returned from [`RequestBuilder::build`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    template: String,
    path_params: Vec<(String, String)>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    error: Option<ServiceError>,
}

impl RequestBuilder {
    fn fail(&mut self, error: ServiceError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Bind `{name}` in the path template. Empty values are rejected.
    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        match require(name, value) {
            Ok(value) => self.path_params.push((name.to_string(), value.to_string())),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Required query parameter
    pub fn query(mut self, name: &str, value: &str) -> Self {
        match require(name, value) {
            Ok(value) => self.query.push((name.to_string(), value.to_string())),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Optional query parameter, omitted entirely when `None`
    pub fn query_opt<T: ToString>(mut self, name: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.query.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Header names and values are checked here, before any token fetch
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match check_header(name, value) {
            Ok(()) => self.headers.push((name.to_string(), value.to_string())),
            Err(e) => self.fail(e),
        }
        self
    }

    pub fn header_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.header(name, value),
            None => self,
        }
    }

    /// Conditional update guard. `entity` names what is being updated.
    pub fn if_match(mut self, entity: &str, tag: Option<&EntityTag>) -> Self {
        match tag {
            Some(tag) if !tag.as_str().trim().is_empty() => self.header("If-Match", tag.as_str()),
            _ => {
                self.fail(ServiceError::MissingPrecondition(entity.to_string()));
                self
            }
        }
    }

    pub fn json_body<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(e) => self.fail(ServiceError::Encode(e.to_string())),
        }
        self
    }

    pub fn build(self) -> Result<RequestSpec, ServiceError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let path = substitute_path(&self.template, &self.path_params)?;

        let mut headers = self.headers;
        if self.body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        Ok(RequestSpec {
            method: self.method,
            path,
            query: self.query,
            headers,
            body: self.body,
        })
    }
}

/// Fail with `MissingParameter` if a required value is empty
pub fn require<'a>(name: &str, value: &'a str) -> Result<&'a str, ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::MissingParameter(name.to_string()));
    }
    Ok(value)
}

fn check_header(name: &str, value: &str) -> Result<(), ServiceError> {
    let invalid = |reason: String| ServiceError::InvalidParameter {
        name: name.to_string(),
        reason,
    };
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    Ok(())
}

/// Fail with `MissingParameter` if a required list is empty
pub fn require_non_empty<T>(name: &str, values: &[T]) -> Result<(), ServiceError> {
    if values.is_empty() {
        return Err(ServiceError::MissingParameter(name.to_string()));
    }
    Ok(())
}

/// Replace every `{name}` with its percent-encoded value
fn substitute_path(template: &str, params: &[(String, String)]) -> Result<String, ServiceError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // Unterminated brace is literal text
            path.push_str(&rest[open..]);
            return Ok(path);
        };

        let name = &after[..close];
        let value = params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| ServiceError::MissingParameter(name.to_string()))?;

        path.push_str(&urlencoding::encode(value));
        rest = &after[close + 1..];
    }

    path.push_str(rest);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_substitution() {
        let spec = RequestSpec::builder(Method::GET, "/v1/policies/{policy_id}")
            .path_param("policy_id", "abc-123")
            .build()
            .unwrap();
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.path, "/v1/policies/abc-123");
        assert!(spec.query.is_empty());
        assert!(spec.body.is_none());
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let spec = RequestSpec::builder(Method::GET, "/v2/resource_instances/{id}")
            .path_param("id", "crn:v1:bluemix:public:a/b c")
            .build()
            .unwrap();
        assert_eq!(spec.path, "/v2/resource_instances/crn%3Av1%3Abluemix%3Apublic%3Aa%2Fb%20c");
    }

    #[test]
    fn test_multiple_path_params() {
        let spec = RequestSpec::builder(Method::POST, "/v1/reclamations/{id}/actions/{action_name}")
            .path_param("id", "rec-1")
            .path_param("action_name", "reclaim")
            .build()
            .unwrap();
        assert_eq!(spec.path, "/v1/reclamations/rec-1/actions/reclaim");
    }

    #[test]
    fn test_empty_path_param_is_missing() {
        let err = RequestSpec::builder(Method::GET, "/v1/roles/{role_id}")
            .path_param("role_id", "  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(ref name) if name == "role_id"));
    }

    #[test]
    fn test_unbound_placeholder_is_missing() {
        let err = RequestSpec::builder(Method::GET, "/v1/roles/{role_id}")
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(ref name) if name == "role_id"));
    }

    #[test]
    fn test_optional_query_omitted() {
        let spec = RequestSpec::builder(Method::GET, "/v1/policies")
            .query("account_id", "acct")
            .query_opt("iam_id", Some("IBMid-user1"))
            .query_opt::<&str>("format", None)
            .query_opt("limit", Some(10))
            .build()
            .unwrap();
        assert_eq!(spec.query_param("account_id"), Some("acct"));
        assert_eq!(spec.query_param("iam_id"), Some("IBMid-user1"));
        assert_eq!(spec.query_param("limit"), Some("10"));
        assert!(spec.query_param("format").is_none());
        assert_eq!(spec.query.len(), 3);
    }

    #[test]
    fn test_if_match_header() {
        let tag = EntityTag::new("W/\"1-abc\"");
        let spec = RequestSpec::builder(Method::PUT, "/v1/roles/{role_id}")
            .path_param("role_id", "r1")
            .if_match("role", Some(&tag))
            .json_body(&json!({"actions": ["a"]}))
            .build()
            .unwrap();
        assert_eq!(spec.header("if-match"), Some("W/\"1-abc\""));
        assert_eq!(spec.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_missing_entity_tag() {
        let err = RequestSpec::builder(Method::PUT, "/v1/roles/{role_id}")
            .path_param("role_id", "r1")
            .if_match("role", None)
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingPrecondition(ref e) if e == "role"));

        let empty = EntityTag::new("");
        let err = RequestSpec::builder(Method::PUT, "/v1/roles/{role_id}")
            .path_param("role_id", "r1")
            .if_match("role", Some(&empty))
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingPrecondition(_)));
    }

    #[test]
    fn test_malformed_header_values_rejected() {
        let tag = EntityTag::new("1-abc\n");
        let err = RequestSpec::builder(Method::PUT, "/v1/roles/{role_id}")
            .path_param("role_id", "r1")
            .if_match("role", Some(&tag))
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameter { ref name, .. } if name == "If-Match"));
        assert!(err.is_local());

        let err = RequestSpec::builder(Method::GET, "/v1/roles")
            .header_opt("Accept-Language", Some("en\r\nX-Injected: 1"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameter { ref name, .. } if name == "Accept-Language"));

        let err = RequestSpec::builder(Method::GET, "/v1/roles")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameter { .. }));
    }

    #[test]
    fn test_first_error_wins() {
        let err = RequestSpec::builder(Method::PUT, "/v1/roles/{role_id}")
            .path_param("role_id", "")
            .if_match("role", None)
            .build()
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(_)));
    }

    #[test]
    fn test_unterminated_brace_is_literal() {
        let spec = RequestSpec::builder(Method::GET, "/v1/odd{path")
            .build()
            .unwrap();
        assert_eq!(spec.path, "/v1/odd{path");
    }

    #[test]
    fn test_require_helpers() {
        assert_eq!(require("name", "x").unwrap(), "x");
        assert!(require("name", "").is_err());
        assert!(require_non_empty::<String>("actions", &[]).is_err());
        assert!(require_non_empty("actions", &["a"]).is_ok());
    }
}
