//! Error taxonomy and status classification
//!
//! Every operation returns [`ServiceError`] on failure. Local validation
//! errors are produced before any request leaves the process; everything
//! else carries what the service or the transport reported.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body kept in log lines
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Details of a failed service call (status >= 400)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    pub status: u16,
    /// Service-supplied error code, e.g. `policy_not_found`
    pub code: Option<String>,
    pub message: Option<String>,
    /// IBM transaction trace id, when the service returns one
    pub trace: Option<String>,
    /// Raw response body for diagnostics
    pub body: String,
}

impl std::fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Failures below HTTP: connection, DNS, timeouts, body read errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid request: {0}")]
    Request(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("missing entity tag for conditional update of {0}")]
    MissingPrecondition(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to decode response (status {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(ServiceFailure),

    #[error("conflict: {0}")]
    Conflict(ServiceFailure),

    #[error("unauthorized: {0}")]
    Unauthorized(ServiceFailure),

    #[error("invalid request: {0}")]
    Validation(ServiceFailure),

    #[error("rate limited: {failure}")]
    RateLimited {
        failure: ServiceFailure,
        /// Seconds from the `Retry-After` header
        retry_after: Option<u64>,
    },

    #[error("server error: {0}")]
    ServerError(ServiceFailure),

    #[error("unexpected response: {0}")]
    Unknown(ServiceFailure),

    #[error("request cancelled")]
    Cancelled,

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ServiceError {
    /// True for errors raised before anything was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ServiceError::MissingParameter(_)
                | ServiceError::MissingPrecondition(_)
                | ServiceError::InvalidParameter { .. }
                | ServiceError::Encode(_)
                | ServiceError::Configuration(_)
        )
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Decode { status, .. } => Some(*status),
            _ => self.failure().map(|f| f.status),
        }
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            ServiceError::NotFound(f)
            | ServiceError::Conflict(f)
            | ServiceError::Unauthorized(f)
            | ServiceError::Validation(f)
            | ServiceError::ServerError(f)
            | ServiceError::Unknown(f) => Some(f),
            ServiceError::RateLimited { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Whether a status code is treated as success. Everything below 400 is,
/// including redirects the transport did not follow.
pub fn is_success(status: u16) -> bool {
    status < 400
}

/// Map a response with status >= 400 to its error class
pub fn classify(status: u16, headers: &HeaderMap, body: &[u8]) -> ServiceError {
    let text = String::from_utf8_lossy(body).into_owned();
    let (code, message, trace) = extract_error_details(&text);

    tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));

    let failure = ServiceFailure {
        status,
        code,
        message,
        trace,
        body: text,
    };

    match status {
        400 => ServiceError::Validation(failure),
        401 | 403 => ServiceError::Unauthorized(failure),
        404 => ServiceError::NotFound(failure),
        // IAM answers a stale If-Match with 412, Resource Controller with 409
        409 | 412 => ServiceError::Conflict(failure),
        429 => ServiceError::RateLimited {
            failure,
            retry_after: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
        },
        500..=599 => ServiceError::ServerError(failure),
        _ => ServiceError::Unknown(failure),
    }
}

/// Pull code, message and trace out of the error shapes IBM services use
fn extract_error_details(body: &str) -> (Option<String>, Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None, None);
    };

    let str_field = |v: &Value, key: &str| v.get(key).and_then(|s| s.as_str()).map(String::from);

    let trace = str_field(&value, "trace");

    // {"errors": [{"code": .., "message": ..}], "trace": ..}
    // {"error": [{"code": .., "message": ..}]}
    for key in ["errors", "error"] {
        if let Some(first) = value.get(key).and_then(|v| v.as_array()).and_then(|a| a.first()) {
            return (str_field(first, "code"), str_field(first, "message"), trace);
        }
    }

    let code = str_field(&value, "code")
        .or_else(|| str_field(&value, "error_code"))
        .or_else(|| str_field(&value, "errorCode"));
    let message = str_field(&value, "message")
        .or_else(|| str_field(&value, "errorMessage"))
        .or_else(|| str_field(&value, "description"));

    (code, message, trace)
}

/// Truncate long bodies and strip control characters before logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Format a service error for display in the CLI
pub fn format_service_error(error: &ServiceError) -> String {
    match error {
        ServiceError::MissingParameter(name) => format!("Missing required parameter '{}'.", name),
        ServiceError::MissingPrecondition(what) => {
            format!("Updating {} requires the entity tag from a previous get.", what)
        }
        ServiceError::InvalidParameter { name, reason } => {
            format!("Invalid value for '{}': {}.", name, reason)
        }
        ServiceError::Unauthorized(f) if f.status == 401 => {
            "Authentication failed. Check your API key.".to_string()
        }
        ServiceError::Unauthorized(_) => {
            "Permission denied. Check your IAM access policies.".to_string()
        }
        ServiceError::NotFound(_) => "Resource not found.".to_string(),
        ServiceError::Conflict(_) => {
            "Resource conflict. It was modified since it was read; get it again and retry."
                .to_string()
        }
        ServiceError::Validation(f) => match &f.message {
            Some(message) => format!("Invalid request: {}", message),
            None => "Invalid request. Check your parameters.".to_string(),
        },
        ServiceError::RateLimited {
            retry_after: Some(secs),
            ..
        } => format!("Rate limit exceeded. Retry after {} seconds.", secs),
        ServiceError::RateLimited { .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ServiceError::ServerError(_) => {
            "IBM Cloud service temporarily unavailable. Please try again.".to_string()
        }
        ServiceError::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        ServiceError::Cancelled => "Request cancelled.".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_body(status: u16, body: &str) -> ServiceError {
        classify(status, &HeaderMap::new(), body.as_bytes())
    }

    #[test]
    fn test_status_boundary() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(is_success(399));
        assert!(!is_success(400));
        assert!(!is_success(500));
    }

    #[test]
    fn test_classification_table() {
        assert!(matches!(classify_body(400, ""), ServiceError::Validation(_)));
        assert!(matches!(classify_body(401, ""), ServiceError::Unauthorized(_)));
        assert!(matches!(classify_body(403, ""), ServiceError::Unauthorized(_)));
        assert!(matches!(classify_body(404, ""), ServiceError::NotFound(_)));
        assert!(matches!(classify_body(409, ""), ServiceError::Conflict(_)));
        assert!(matches!(classify_body(412, ""), ServiceError::Conflict(_)));
        assert!(matches!(classify_body(429, ""), ServiceError::RateLimited { .. }));
        assert!(matches!(classify_body(500, ""), ServiceError::ServerError(_)));
        assert!(matches!(classify_body(503, ""), ServiceError::ServerError(_)));
        assert!(matches!(classify_body(418, ""), ServiceError::Unknown(_)));
        assert!(matches!(classify_body(600, ""), ServiceError::Unknown(_)));
    }

    #[test]
    fn test_errors_array_shape() {
        let body = r#"{"trace":"abc123","errors":[{"code":"policy_not_found","message":"Policy not found"}],"status_code":404}"#;
        let err = classify_body(404, body);
        let failure = err.failure().unwrap();
        assert_eq!(failure.status, 404);
        assert_eq!(failure.code.as_deref(), Some("policy_not_found"));
        assert_eq!(failure.message.as_deref(), Some("Policy not found"));
        assert_eq!(failure.trace.as_deref(), Some("abc123"));
        assert_eq!(failure.body, body);
    }

    #[test]
    fn test_resource_controller_error_shape() {
        let body = r#"{"error_code":"RC-InstanceLocked","message":"Instance is locked","status_code":409}"#;
        let err = classify_body(409, body);
        let failure = err.failure().unwrap();
        assert_eq!(failure.message.as_deref(), Some("Instance is locked"));
        assert_eq!(failure.code.as_deref(), Some("RC-InstanceLocked"));
    }

    #[test]
    fn test_iam_token_error_shape() {
        let body = r#"{"errorCode":"BXNIM0415E","errorMessage":"Provided API key could not be found"}"#;
        let failure = classify_body(400, body).failure().cloned().unwrap();
        assert_eq!(failure.code.as_deref(), Some("BXNIM0415E"));
        assert_eq!(
            failure.message.as_deref(),
            Some("Provided API key could not be found")
        );
    }

    #[test]
    fn test_non_json_body_kept_raw() {
        let err = classify_body(502, "<html>Bad Gateway</html>");
        let failure = err.failure().unwrap();
        assert!(failure.code.is_none());
        assert!(failure.message.is_none());
        assert_eq!(failure.body, "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_retry_after_captured() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "30".parse().unwrap());
        match classify(429, &headers, b"{}") {
            ServiceError::RateLimited { retry_after, failure } => {
                assert_eq!(retry_after, Some(30));
                assert_eq!(failure.status, 429);
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_local_errors() {
        assert!(ServiceError::MissingParameter("policy_id".into()).is_local());
        assert!(ServiceError::MissingPrecondition("policy".into()).is_local());
        assert!(ServiceError::InvalidParameter {
            name: "If-Match".into(),
            reason: "bad".into()
        }
        .is_local());
        assert!(!ServiceError::Cancelled.is_local());
        assert!(!classify_body(404, "").is_local());
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated, 300 bytes total"));
    }

    #[test]
    fn test_format_service_error() {
        let conflict = classify_body(412, "");
        assert!(format_service_error(&conflict).contains("conflict"));
        assert_eq!(
            format_service_error(&ServiceError::MissingParameter("role_id".into())),
            "Missing required parameter 'role_id'."
        );
        assert!(format_service_error(&classify_body(401, "")).contains("API key"));
        assert!(format_service_error(&classify_body(403, "")).contains("Permission denied"));
    }
}
