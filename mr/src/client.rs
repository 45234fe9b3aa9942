//! Request dispatcher
//!
//! [`MoorClient::call`] is the only place HTTP requests are issued. It makes
//! sure a session exists, attaches the token, and on a `401` refreshes the
//! session and retries the request exactly once. Every other failure is
//! translated and returned as-is.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{MoorError, Origin, check_reported_errors, decode_payload, translate};
use crate::session::{AuthSession, AuthToken, Authenticator, ConnectOutcome, Credentials};
use crate::transport::{Body, HttpRequest, ReqwestTransport, Transport};

/// Description of one REST call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Body,
    context: &'static str,
    requires_auth: bool,
    absent_statuses: Vec<u16>,
    allow_empty: bool,
}

impl ApiRequest {
    /// `context` names the operation in error messages
    pub fn new(method: Method, context: &'static str, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            body: Body::Empty,
            context,
            requires_auth: true,
            absent_statuses: Vec::new(),
            allow_empty: false,
        }
    }

    pub fn get(context: &'static str, segments: &[&str]) -> Self {
        Self::new(Method::GET, context, segments)
    }

    pub fn post(context: &'static str, segments: &[&str]) -> Self {
        Self::new(Method::POST, context, segments)
    }

    pub fn delete(context: &'static str, segments: &[&str]) -> Self {
        Self::new(Method::DELETE, context, segments)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Body::Text(body.into());
        self
    }

    /// Send without a token and skip the login/retry policy
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Treat `status` as "nothing there" and return JSON `null`
    pub fn absent_on(mut self, status: u16) -> Self {
        self.absent_statuses.push(status);
        self
    }

    /// Return `{}` instead of `null` for an empty body
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn context(&self) -> &'static str {
        self.context
    }

    fn to_http(&self, token: Option<AuthToken>) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            segments: self.segments.clone(),
            query: self.query.clone(),
            body: self.body.clone(),
            token,
        }
    }
}

/// Reply to a disconnect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisconnectOutcome {
    pub ok: bool,
}

/// Authenticated client for a mooR server's REST API
pub struct MoorClient {
    transport: Arc<dyn Transport>,
    session: AuthSession,
    config: ClientConfig,
}

impl MoorClient {
    /// Create a client speaking HTTP to `config.base_url`
    pub fn new(config: ClientConfig) -> Result<Self, MoorError> {
        debug!(?config, "MoorClient::new: called");
        let transport = ReqwestTransport::new(&config.base_url, config.timeout)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            session: AuthSession::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn authenticator(&self) -> LoginCall<'_> {
        LoginCall {
            transport: self.transport.as_ref(),
        }
    }

    /// Log in, filling each missing half from the remembered or configured credentials
    pub async fn connect(&self, player: Option<&str>, password: Option<&str>) -> Result<ConnectOutcome, MoorError> {
        debug!(?player, "MoorClient::connect: called");
        let remembered = self.session.remembered().await;
        let player = non_empty(player)
            .map(str::to_string)
            .or_else(|| remembered.as_ref().map(|c| c.player().to_string()))
            .or_else(|| self.config.default_player.clone().filter(|p| !p.is_empty()));
        let password = non_empty(password)
            .map(str::to_string)
            .or_else(|| remembered.as_ref().map(|c| c.password().to_string()))
            .or_else(|| self.config.default_password.clone().filter(|p| !p.is_empty()));

        let (Some(player), Some(password)) = (player, password) else {
            return Err(MoorError::authentication_required());
        };
        self.session
            .connect(&self.authenticator(), Credentials::new(player, password))
            .await
    }

    /// Drop the session token; never fails
    pub async fn disconnect(&self, forget_credentials: bool) -> DisconnectOutcome {
        self.session.disconnect(forget_credentials).await;
        info!(%forget_credentials, "MoorClient::disconnect: session cleared");
        DisconnectOutcome { ok: true }
    }

    /// Issue a request under the auth/retry policy and decode the JSON reply
    pub async fn call(&self, request: ApiRequest) -> Result<Value, MoorError> {
        debug!(context = request.context, method = %request.method, "call: called");
        let mut token = if request.requires_auth {
            Some(
                self.session
                    .ensure(&self.authenticator(), self.config.default_credentials())
                    .await?,
            )
        } else {
            None
        };

        let mut retried = false;
        loop {
            let http = request.to_http(token.clone());
            let response = self.transport.send(&http).await?;

            if response.status == 401 && request.requires_auth {
                let expired = translate(401, decode_payload(&response.body), Origin::Authenticated, request.context);
                if retried {
                    warn!(context = request.context, "call: token rejected again after refresh");
                    return Err(expired);
                }
                debug!(context = request.context, "call: token rejected, refreshing once");
                retried = true;
                token = Some(self.session.refresh(&self.authenticator(), token.as_ref()).await?);
                continue;
            }

            if request.absent_statuses.contains(&response.status) {
                debug!(status = response.status, "call: absent status");
                return Ok(Value::Null);
            }

            if !response.is_success() {
                let origin = if request.requires_auth {
                    Origin::Authenticated
                } else {
                    Origin::Public
                };
                return Err(translate(
                    response.status,
                    decode_payload(&response.body),
                    origin,
                    request.context,
                ));
            }

            return decode_success(&response.body, &request);
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn decode_success(body: &str, request: &ApiRequest) -> Result<Value, MoorError> {
    if body.is_empty() {
        return Ok(if request.allow_empty { json!({}) } else { Value::Null });
    }
    let payload = serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));
    check_reported_errors(payload, request.context)
}

/// `POST /auth/connect`
struct LoginCall<'a> {
    transport: &'a dyn Transport,
}

#[async_trait]
impl Authenticator for LoginCall<'_> {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, MoorError> {
        debug!(player = %credentials.player(), "LoginCall::authenticate: called");
        let request = HttpRequest {
            method: Method::POST,
            segments: vec!["auth".to_string(), "connect".to_string()],
            query: Vec::new(),
            body: Body::Json(json!({
                "player": credentials.player(),
                "password": credentials.password(),
            })),
            token: None,
        };
        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            return Err(translate(
                response.status,
                decode_payload(&response.body),
                Origin::Connect,
                "connect",
            ));
        }
        response.token.ok_or_else(|| {
            MoorError::request_failed("authentication succeeded but no X-Moor-Auth-Token header was returned")
                .with_status(response.status)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::mock::MockTransport;

    fn client(mock: &Arc<MockTransport>, config: ClientConfig) -> MoorClient {
        MoorClient::with_transport(Arc::clone(mock) as Arc<dyn Transport>, config)
    }

    fn with_defaults() -> ClientConfig {
        ClientConfig::default().with_credentials("wizard", "pw")
    }

    #[tokio::test]
    async fn test_no_credentials_fails_without_http() {
        let mock = Arc::new(MockTransport::new());
        let client = client(&mock, ClientConfig::default());

        let err = client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationRequired);
        assert_eq!(err.resolution.as_deref(), Some(crate::error::CONNECT_HINT));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_call_logs_in_with_defaults() {
        let mock = Arc::new(MockTransport::new().login("tok-1").respond_json(200, json!({"value": 3})));
        let client = client(&mock, with_defaults());

        let value = client.call(ApiRequest::get("get_property", &["properties", "oid:1", "x"])).await.unwrap();
        assert_eq!(value, json!({"value": 3}));
        assert_eq!(mock.paths(), vec!["/auth/connect", "/properties/oid:1/x"]);

        let login = &mock.requests()[0];
        assert_eq!(login.body, Body::Json(json!({"player": "wizard", "password": "pw"})));
        assert!(login.token.is_none());
        assert_eq!(mock.token_sent(1).as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .respond(401, "")
                .login("tok-2")
                .respond_json(200, json!([1, 2])),
        );
        let client = client(&mock, with_defaults());

        let value = client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap();
        assert_eq!(value, json!([1, 2]));
        assert_eq!(
            mock.paths(),
            vec!["/auth/connect", "/verbs/oid:1", "/auth/connect", "/verbs/oid:1"]
        );
        assert_eq!(mock.token_sent(1).as_deref(), Some("tok-1"));
        assert_eq!(mock.token_sent(3).as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn test_second_401_is_not_retried() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .respond(401, "")
                .login("tok-2")
                .respond_json(401, json!({"message": "nope"}))
                .respond_json(200, json!("never reached")),
        );
        let client = client(&mock, with_defaults());

        let err = client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExpired);
        assert_eq!(err.status_code, Some(401));
        assert_eq!(err.payload, Some(json!({"message": "nope"})));
        assert_eq!(mock.call_count(), 4);
        assert!(!err.to_json().to_string().contains("tok-"));
    }

    #[tokio::test]
    async fn test_failed_refresh_fails_the_call() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .respond(401, "")
                .fail(MoorError::request_failed("request timed out after 30s")),
        );
        let client = client(&mock, with_defaults());

        let err = client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert!(err.message.contains("timed out"));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_refresh_with_rejected_password() {
        let mock = Arc::new(MockTransport::new().login("tok-1").respond(401, "").respond(401, ""));
        let client = client(&mock, with_defaults());

        let err = client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .respond(500, "Internal Server Error")
                .respond_json(200, json!("never reached")),
        );
        let client = client(&mock, with_defaults());

        let err = client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert_eq!(err.status_code, Some(500));
        assert_eq!(err.payload, Some(json!("Internal Server Error")));
        assert_eq!(mock.call_count(), 2);

        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .fail(MoorError::request_failed("network error: connection refused")),
        );
        let client2 = MoorClient::with_transport(Arc::clone(&mock) as Arc<dyn Transport>, with_defaults());
        let err = client2.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap_err();
        assert!(err.message.contains("connection refused"));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_connect_returns_player_only() {
        let mock = Arc::new(MockTransport::new().login("secret-tok"));
        let client = client(&mock, ClientConfig::default());

        let outcome = client.connect(Some("wizard"), Some("pw")).await.unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, json!({"ok": true, "player": "wizard"}));
        assert!(!json.to_string().contains("secret-tok"));
        assert!(client.session().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_connect_bad_credentials() {
        let mock = Arc::new(MockTransport::new().respond_json(401, json!({"message": "bad password"})));
        let client = client(&mock, ClientConfig::default());

        let err = client.connect(Some("wizard"), Some("nope")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);
        assert_eq!(err.resolution.as_deref(), Some(crate::error::CREDENTIALS_HINT));
        assert!(!client.session().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_connect_without_token_header() {
        let mock = Arc::new(MockTransport::new().respond(200, ""));
        let client = client(&mock, ClientConfig::default());

        let err = client.connect(Some("wizard"), Some("pw")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert!(err.message.contains("X-Moor-Auth-Token"));
    }

    #[tokio::test]
    async fn test_connect_missing_credentials_makes_no_request() {
        let mock = Arc::new(MockTransport::new());
        let client = client(&mock, ClientConfig::default());

        let err = client.connect(Some("wizard"), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationRequired);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_falls_back_to_defaults_and_remembered() {
        let mock = Arc::new(MockTransport::new().login("tok-1").login("tok-2"));
        let client = client(&mock, with_defaults());

        let outcome = client.connect(None, None).await.unwrap();
        assert_eq!(outcome.player, "wizard");

        client.disconnect(false).await;
        let outcome = client.connect(Some("wizard"), None).await.unwrap();
        assert_eq!(outcome.player, "wizard");
        assert_eq!(
            mock.requests()[1].body,
            Body::Json(json!({"player": "wizard", "password": "pw"}))
        );
    }

    #[tokio::test]
    async fn test_explicit_connect_is_remembered_for_later_calls() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .respond(401, "")
                .login("tok-2")
                .respond_json(200, json!({})),
        );
        let client = client(&mock, ClientConfig::default());
        client.connect(Some("builder"), Some("pw2")).await.unwrap();

        client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap();
        assert_eq!(
            mock.requests()[2].body,
            Body::Json(json!({"player": "builder", "password": "pw2"}))
        );
    }

    #[tokio::test]
    async fn test_disconnect_then_call_reconnects() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .login("tok-2")
                .respond_json(200, json!([])),
        );
        let client = client(&mock, with_defaults());
        client.connect(None, None).await.unwrap();

        let outcome = client.disconnect(true).await;
        assert_eq!(outcome, DisconnectOutcome { ok: true });
        assert!(!client.session().is_authenticated().await);

        client.call(ApiRequest::get("list_verbs", &["verbs", "oid:1"])).await.unwrap();
        assert_eq!(mock.token_sent(2).as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn test_public_request_skips_auth() {
        let mock = Arc::new(MockTransport::new().respond(401, "denied"));
        let client = client(&mock, ClientConfig::default());

        let err = client
            .call(ApiRequest::get("version", &["version"]).public())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert_eq!(mock.call_count(), 1);
        assert!(mock.requests()[0].token.is_none());
    }

    #[tokio::test]
    async fn test_absent_status_and_empty_bodies() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .respond(404, "no such verb")
                .respond(204, "")
                .respond(200, "")
                .respond(200, "plain text"),
        );
        let client = client(&mock, with_defaults());

        let verb = ApiRequest::get("get_verb", &["verbs", "oid:1", "look"]).absent_on(404);
        assert_eq!(client.call(verb).await.unwrap(), Value::Null);

        let dismiss = ApiRequest::delete("dismiss_presentation", &["api", "presentations", "p1"]).allow_empty();
        assert_eq!(client.call(dismiss).await.unwrap(), json!({}));

        let history = ApiRequest::get("get_history", &["api", "history"]);
        assert_eq!(client.call(history.clone()).await.unwrap(), Value::Null);
        assert_eq!(client.call(history).await.unwrap(), json!("plain text"));
    }

    #[tokio::test]
    async fn test_reported_errors_in_success_body() {
        let mock = Arc::new(
            MockTransport::new()
                .login("tok-1")
                .respond_json(200, json!({"errors": ["Unknown built-in function: frob"]})),
        );
        let client = client(&mock, with_defaults());

        let err = client
            .call(ApiRequest::post("eval_expr", &["eval"]).text("return frob();"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequestFailed);
        assert_eq!(err.status_code, Some(400));
        assert!(err.message.contains("eval_expr"));
    }
}
