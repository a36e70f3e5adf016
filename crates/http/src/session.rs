//! Session state and token lifecycle
//!
//! Owns the current session, mirrors it into the credential store, and runs
//! the single-flight token refresh that the request path leans on.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use edusync_core::{AuthError, CredentialStore, Role, Session};

use crate::client::auth::AuthBackend;
use crate::client::error::ClientError;
use crate::types::{
    ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, ResetPasswordRequest,
};

/// Authentication lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

type RefreshWaiter = oneshot::Sender<Result<String, AuthError>>;
type ExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// Owner of the current session.
///
/// Every mutation writes the credential store and the in-memory copy
/// together; the store is written first so nothing downstream can observe a
/// token that was never persisted.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    backend: Arc<dyn AuthBackend>,
    session: RwLock<Option<Session>>,
    state: RwLock<SessionState>,
    // None: no refresh in flight. Some: in flight, with the queued waiters.
    // This flag is the only mutual-exclusion primitive the system needs.
    refresh_flight: Mutex<Option<Vec<RefreshWaiter>>>,
    expired_hook: RwLock<Option<ExpiredHook>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, backend: Arc<dyn AuthBackend>) -> Arc<Self> {
        let manager = Arc::new(Self {
            store,
            backend,
            session: RwLock::new(None),
            state: RwLock::new(SessionState::Unauthenticated),
            refresh_flight: Mutex::new(None),
            expired_hook: RwLock::new(None),
        });
        manager.watch_external_changes();
        manager
    }

    /// Restore a session persisted by a previous run.
    ///
    /// Only structurally valid records are accepted; anything else is
    /// cleared and the manager stays unauthenticated.
    pub fn bootstrap(&self) {
        let Some(session) = self.store.load() else {
            debug!("no stored session found");
            return;
        };
        if !session.is_structurally_valid() || !session.token_is_well_formed() {
            warn!("stored session is malformed, clearing it");
            self.store.clear();
            return;
        }
        debug!(user_id = %session.user_id, "restored session from storage");
        *self.session_write() = Some(session);
        self.set_state(SessionState::Authenticated);
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session_read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session_read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().expect("state lock poisoned")
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_read().is_some()
    }

    /// Register the hook fired when the session is terminally lost. The
    /// route layer uses this to navigate to the login page; the manager
    /// itself never touches navigation.
    pub fn on_session_expired(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .expired_hook
            .write()
            .expect("expired hook lock poisoned") = Some(Arc::new(hook));
    }

    /// Authenticate against the backend and establish a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.set_state(SessionState::Authenticating);
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = match self.backend.login(request).await {
            Ok(response) => response,
            Err(err) => {
                self.set_state(SessionState::Unauthenticated);
                warn!(%err, "login request failed");
                return Err(login_error(err));
            }
        };

        let token = response.token.filter(|t| !t.is_empty());
        let user_id = response.user_id.filter(|u| !u.is_empty());
        let (Some(access_token), Some(user_id)) = (token, user_id) else {
            self.set_state(SessionState::Unauthenticated);
            return Err(AuthError::authentication_failed(
                "login response missing token or user id",
            ));
        };

        let email = response
            .email
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| email.to_string());
        let name = response
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| Session::default_name(&email));
        let role = Role::normalize(response.role.as_deref().unwrap_or_default());

        let session = Session {
            access_token,
            refresh_token: response.refresh_token,
            user_id,
            email,
            role,
            name,
        };
        self.persist(&session);
        debug!(user_id = %session.user_id, role = %session.role, "login succeeded");
        Ok(session)
    }

    /// Create a student account. Never establishes a session; the caller
    /// logs in afterwards.
    pub async fn register(&self, mut profile: RegisterRequest) -> Result<(), AuthError> {
        // Self-registration only ever creates student accounts.
        profile.role = Role::Student.as_str().to_string();
        self.backend.register(profile).await.map_err(|err| {
            warn!(%err, "registration failed");
            match err {
                ClientError::Request(e) => AuthError::network(e.to_string()),
                other => AuthError::registration_failed(
                    other
                        .server_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| "Registration failed".to_string()),
                ),
            }
        })
    }

    /// Destroy the session. Local destruction is unconditional and happens
    /// before the best-effort server-side invalidation.
    pub async fn logout(&self) {
        let session = self.session_write().take();
        self.store.clear();
        self.set_state(SessionState::Unauthenticated);

        if let Some(session) = session {
            if let Err(err) = self.backend.logout(session.access_token).await {
                debug!(%err, "server-side logout failed, ignoring");
            }
        }
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let request = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.backend
            .forgot_password(request)
            .await
            .map_err(request_error)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let request = ResetPasswordRequest {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.backend
            .reset_password(request)
            .await
            .map_err(request_error)
    }

    /// Mint a new access token, coalescing concurrent callers.
    ///
    /// The first caller becomes the leader and performs the network call;
    /// everyone arriving while it is in flight enqueues a waiter and
    /// suspends. Waiters resolve in enqueue order, after the new token has
    /// been persisted, so no caller ever re-sends with a superseded token.
    pub async fn refresh_session(&self) -> Result<String, AuthError> {
        let waiter = {
            let mut flight = self
                .refresh_flight
                .lock()
                .expect("refresh flight lock poisoned");
            match flight.as_mut() {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                None => {
                    *flight = Some(Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            debug!("token refresh already in flight, waiting for it");
            // A dropped sender means the leader vanished; treat as expired.
            return rx.await.unwrap_or(Err(AuthError::SessionExpired));
        }

        let result = self.run_refresh().await;

        let waiters = self
            .refresh_flight
            .lock()
            .expect("refresh flight lock poisoned")
            .take()
            .unwrap_or_default();
        for tx in waiters {
            let _ = tx.send(result.clone());
        }

        result
    }

    /// The leader's half of the refresh: one network call, then persist or
    /// tear down. State is settled before any waiter observes the outcome.
    async fn run_refresh(&self) -> Result<String, AuthError> {
        let credentials = self.session_read().as_ref().map(|session| {
            (
                session.access_token.clone(),
                session.refresh_token.clone(),
            )
        });
        let Some((token, Some(refresh_token))) = credentials else {
            warn!("no refresh token available");
            self.expire_session();
            return Err(AuthError::SessionExpired);
        };

        let request = RefreshRequest {
            token,
            refresh_token,
        };
        match self.backend.refresh(request).await {
            Ok(response) => {
                let updated = self.session_read().as_ref().map(|session| {
                    let mut updated = session.clone();
                    updated.access_token = response.token.clone();
                    if let Some(refresh_token) = response.refresh_token {
                        updated.refresh_token = Some(refresh_token);
                    }
                    updated
                });
                let Some(session) = updated else {
                    // Logged out while the refresh was in flight.
                    return Err(AuthError::SessionExpired);
                };
                self.persist(&session);
                debug!("access token refreshed");
                Ok(session.access_token)
            }
            Err(err) => {
                warn!(%err, "token refresh failed");
                self.expire_session();
                Err(AuthError::SessionExpired)
            }
        }
    }

    /// Terminal session loss: clear everything, then signal the route layer.
    fn expire_session(&self) {
        self.store.clear();
        *self.session_write() = None;
        self.set_state(SessionState::Unauthenticated);

        let hook = self
            .expired_hook
            .read()
            .expect("expired hook lock poisoned")
            .clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn persist(&self, session: &Session) {
        self.store.save(session);
        *self.session_write() = Some(session.clone());
        self.set_state(SessionState::Authenticated);
    }

    fn watch_external_changes(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.store.on_external_change(Box::new(move |session| {
            if let Some(manager) = weak.upgrade() {
                manager.apply_external_change(session);
            }
        }));
    }

    /// Mirror a change made by another tab. The store already holds the new
    /// value, so this must not write back (that would ping-pong forever).
    fn apply_external_change(&self, session: Option<Session>) {
        match session {
            Some(session) => {
                debug!(user_id = %session.user_id, "session updated by another tab");
                *self.session_write() = Some(session);
                self.set_state(SessionState::Authenticated);
            }
            None => {
                debug!("session cleared by another tab");
                *self.session_write() = None;
                self.set_state(SessionState::Unauthenticated);
            }
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().expect("state lock poisoned") = state;
    }

    fn session_read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.session.read().expect("session lock poisoned")
    }

    fn session_write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().expect("session lock poisoned")
    }
}

fn login_error(err: ClientError) -> AuthError {
    match err {
        ClientError::Request(e) => AuthError::network(e.to_string()),
        other => AuthError::authentication_failed(
            other
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| "Login failed. Please try again.".to_string()),
        ),
    }
}

fn request_error(err: ClientError) -> AuthError {
    match err {
        ClientError::Request(e) => AuthError::network(e.to_string()),
        other => AuthError::authentication_failed(
            other
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| "Request failed. Please try again.".to_string()),
        ),
    }
}
