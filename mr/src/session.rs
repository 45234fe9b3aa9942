//! Authentication session
//!
//! Holds the cached token behind a single async lock. Every transition
//! (connect, refresh, disconnect) and every token read goes through that lock,
//! and the state is only written after a login round-trip has succeeded, so a
//! cancelled login leaves the previous state in place.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::MoorError;

/// Opaque credential issued by the server
///
/// Deliberately has no `Display`, `Serialize` or public accessor.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub(crate) fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// A player/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    player: String,
    password: String,
}

impl Credentials {
    pub fn new(player: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            password: password.into(),
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("player", &self.player)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated { token: AuthToken, player: String },
}

/// Result of a successful login, safe to hand back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectOutcome {
    pub ok: bool,
    pub player: String,
}

/// Performs the remote login round-trip
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, MoorError>;
}

struct SessionInner {
    state: SessionState,
    /// Credentials of the last successful login, reused by `refresh`
    credentials: Option<Credentials>,
}

/// The single shared, lock-guarded authentication cell
pub struct AuthSession {
    inner: Mutex<SessionInner>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                state: SessionState::Unauthenticated,
                credentials: None,
            }),
        }
    }

    /// Log in and cache the token
    ///
    /// On failure the previous state is kept and the translated error returned.
    pub async fn connect(
        &self,
        auth: &dyn Authenticator,
        credentials: Credentials,
    ) -> Result<ConnectOutcome, MoorError> {
        debug!(player = %credentials.player(), "AuthSession::connect: called");
        let mut inner = self.inner.lock().await;
        let token = auth.authenticate(&credentials).await?;
        let player = credentials.player().to_string();
        inner.state = SessionState::Authenticated {
            token,
            player: player.clone(),
        };
        inner.credentials = Some(credentials);
        info!(%player, "AuthSession::connect: authenticated");
        Ok(ConnectOutcome { ok: true, player })
    }

    /// Return the cached token, logging in with `fallback` when there is none
    ///
    /// Remembered credentials from an earlier login win over `fallback`.
    pub(crate) async fn ensure(
        &self,
        auth: &dyn Authenticator,
        fallback: Option<Credentials>,
    ) -> Result<AuthToken, MoorError> {
        let mut inner = self.inner.lock().await;
        if let SessionState::Authenticated { token, .. } = &inner.state {
            return Ok(token.clone());
        }
        debug!("AuthSession::ensure: no token cached, logging in");
        let credentials = inner
            .credentials
            .clone()
            .or(fallback)
            .ok_or_else(MoorError::authentication_required)?;
        let token = auth.authenticate(&credentials).await?;
        inner.state = SessionState::Authenticated {
            token: token.clone(),
            player: credentials.player().to_string(),
        };
        inner.credentials = Some(credentials);
        Ok(token)
    }

    /// Replace a rejected token by logging in again with the remembered credentials
    ///
    /// When another caller already replaced `rejected`, the newer token is
    /// returned without a second login.
    pub async fn refresh(
        &self,
        auth: &dyn Authenticator,
        rejected: Option<&AuthToken>,
    ) -> Result<AuthToken, MoorError> {
        debug!("AuthSession::refresh: called");
        let mut inner = self.inner.lock().await;
        if let (Some(rejected), SessionState::Authenticated { token, .. }) = (rejected, &inner.state)
            && token != rejected
        {
            debug!("AuthSession::refresh: token already replaced");
            return Ok(token.clone());
        }
        let credentials = inner
            .credentials
            .clone()
            .ok_or_else(MoorError::authentication_required)?;
        let token = auth.authenticate(&credentials).await?;
        inner.state = SessionState::Authenticated {
            token: token.clone(),
            player: credentials.player().to_string(),
        };
        info!(player = %credentials.player(), "AuthSession::refresh: token replaced");
        Ok(token)
    }

    /// Drop the token; optionally forget the remembered credentials too
    pub async fn disconnect(&self, forget_credentials: bool) {
        debug!(%forget_credentials, "AuthSession::disconnect: called");
        let mut inner = self.inner.lock().await;
        inner.state = SessionState::Unauthenticated;
        if forget_credentials {
            inner.credentials = None;
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(self.inner.lock().await.state, SessionState::Authenticated { .. })
    }

    /// Player of the current session, if any
    pub async fn player(&self) -> Option<String> {
        match &self.inner.lock().await.state {
            SessionState::Authenticated { player, .. } => Some(player.clone()),
            SessionState::Unauthenticated => None,
        }
    }

    /// Credentials of the last successful login
    pub(crate) async fn remembered(&self) -> Option<Credentials> {
        self.inner.lock().await.credentials.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}
