//! Structured error taxonomy and HTTP failure translation
//!
//! Every failure in the client core is a [`MoorError`]: an immutable value built
//! once where the failure is detected and handed upward unchanged. The type
//! serializes to JSON so the tool layer can report it verbatim.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Hint attached to errors that a fresh login resolves
pub const CONNECT_HINT: &str = "Call moor_connect_auth(player, password)";

/// Hint attached to rejected logins
pub const CREDENTIALS_HINT: &str = "Verify player/password and call moor_connect_auth again";

/// Category of a [`MoorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// No credentials were available for a call that needs a session
    AuthenticationRequired,
    /// The server rejected the player/password pair
    InvalidCredentials,
    /// The server rejected the cached token
    TokenExpired,
    /// A reference string could not be resolved to an object expression
    InvalidReference,
    /// A value has no representation in MOO literal syntax
    EncodingError,
    /// Caller-supplied arguments were unusable before any request was made
    InvalidArgument,
    /// Any other HTTP, network or server-reported failure
    RequestFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "AuthenticationRequired",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::TokenExpired => "TokenExpired",
            Self::InvalidReference => "InvalidReference",
            Self::EncodingError => "EncodingError",
            Self::InvalidArgument => "InvalidArgument",
            Self::RequestFailed => "RequestFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure reported by the client core
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("[{kind}] {message}")]
pub struct MoorError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl MoorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            payload: None,
            resolution: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_payload(mut self, payload: Option<Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    /// No credentials were supplied or configured
    pub fn authentication_required() -> Self {
        Self::new(
            ErrorKind::AuthenticationRequired,
            "player and password must be provided for authentication",
        )
        .with_resolution(CONNECT_HINT)
    }

    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidReference, message)
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EncodingError, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestFailed, message)
    }

    /// Serialize to a JSON object
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "kind": self.kind, "message": self.message }))
    }
}

/// Which kind of call produced an HTTP failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The `/auth/connect` login call
    Connect,
    /// A call made with the session token attached
    Authenticated,
    /// A call made without a token
    Public,
}

/// Decode a response body the way error payloads are reported
///
/// Empty bodies carry no payload, JSON bodies are decoded, anything else is
/// kept as opaque text.
pub fn decode_payload(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(body.to_string())),
    }
}

/// Map a non-2xx HTTP status and its payload onto the error taxonomy
pub fn translate(status: u16, payload: Option<Value>, origin: Origin, context: &str) -> MoorError {
    debug!(%status, ?origin, %context, "translate: called");
    match (status, origin) {
        (401, Origin::Connect) => MoorError::new(ErrorKind::InvalidCredentials, "invalid credentials")
            .with_status(status)
            .with_payload(payload)
            .with_resolution(CREDENTIALS_HINT),
        (401, Origin::Authenticated) => {
            MoorError::new(ErrorKind::TokenExpired, "authentication required or token invalid")
                .with_status(status)
                .with_payload(payload)
                .with_resolution(CONNECT_HINT)
        }
        (_, Origin::Connect) => MoorError::request_failed("authentication failed")
            .with_status(status)
            .with_payload(payload),
        _ => MoorError::request_failed(format!("mooR API request failed during {}", context))
            .with_status(status)
            .with_payload(payload),
    }
}

/// Reject successful responses whose body reports an evaluation failure
///
/// The server answers some failed evaluations with a 2xx status and an
/// `errors` list or an `error`-style field in the body.
pub fn check_reported_errors(payload: Value, context: &str) -> Result<Value, MoorError> {
    if let Value::Object(map) = &payload {
        if let Some(Value::Array(errors)) = map.get("errors")
            && !errors.is_empty()
        {
            debug!(%context, count = errors.len(), "check_reported_errors: errors list present");
            return Err(reported(context, Value::Array(errors.clone())));
        }
        for key in ["error", "error_msg", "error_message"] {
            if let Some(value) = map.get(key)
                && is_truthy(value)
            {
                debug!(%context, %key, "check_reported_errors: error field present");
                return Err(reported(context, value.clone()));
            }
        }
    }
    Ok(payload)
}

fn reported(context: &str, details: Value) -> MoorError {
    MoorError::request_failed(format!("mooR reported errors during {}", context))
        .with_status(400)
        .with_payload(Some(details))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_401_on_connect_is_invalid_credentials() {
        let err = translate(401, None, Origin::Connect, "connect");
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
        assert_eq!(err.status_code, Some(401));
        assert_eq!(err.resolution.as_deref(), Some(CREDENTIALS_HINT));
    }

    #[test]
    fn test_401_on_authenticated_call_is_token_expired() {
        let err = translate(401, Some(json!({"message": "bad token"})), Origin::Authenticated, "get_verb");
        assert_eq!(err.kind, ErrorKind::TokenExpired);
        assert_eq!(err.payload, Some(json!({"message": "bad token"})));
        assert_eq!(err.resolution.as_deref(), Some(CONNECT_HINT));
    }

    #[test]
    fn test_other_status_is_request_failed_with_context() {
        let err = translate(500, decode_payload("boom"), Origin::Authenticated, "list_verbs");
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert_eq!(err.status_code, Some(500));
        assert_eq!(err.payload, Some(json!("boom")));
        assert!(err.message.contains("list_verbs"));

        let err = translate(503, None, Origin::Connect, "connect");
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert_eq!(err.message, "authentication failed");
    }

    #[test]
    fn test_401_on_public_call_is_request_failed() {
        let err = translate(401, None, Origin::Public, "ping");
        assert_eq!(err.kind, ErrorKind::RequestFailed);
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(""), None);
        assert_eq!(decode_payload("  \n"), None);
        assert_eq!(decode_payload(r#"{"message":"nope"}"#), Some(json!({"message": "nope"})));
        assert_eq!(decode_payload("<html>oops</html>"), Some(json!("<html>oops</html>")));
    }

    #[test]
    fn test_check_reported_errors_passes_clean_payloads() {
        let payload = json!({"result": 5, "errors": [], "error": null});
        assert_eq!(check_reported_errors(payload.clone(), "eval").unwrap(), payload);
        assert_eq!(check_reported_errors(json!([1, 2]), "eval").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_check_reported_errors_rejects_error_fields() {
        let err = check_reported_errors(json!({"errors": ["E_PERM"]}), "eval_expr").unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert_eq!(err.status_code, Some(400));
        assert_eq!(err.payload, Some(json!(["E_PERM"])));
        assert!(err.message.contains("eval_expr"));

        let err = check_reported_errors(json!({"error_msg": "Verb not found"}), "invoke_verb").unwrap_err();
        assert_eq!(err.payload, Some(json!("Verb not found")));
    }

    #[test]
    fn test_error_serializes_without_empty_fields() {
        let err = MoorError::invalid_reference("bad oid");
        let json = err.to_json();
        assert_eq!(json, json!({"kind": "InvalidReference", "message": "bad oid"}));
        assert_eq!(err.to_string(), "[InvalidReference] bad oid");
    }

    #[test]
    fn test_authentication_required_carries_hint() {
        let json = MoorError::authentication_required().to_json();
        assert_eq!(json["kind"], "AuthenticationRequired");
        assert_eq!(json["resolution"], CONNECT_HINT);
    }
}
