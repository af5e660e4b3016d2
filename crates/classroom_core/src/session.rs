//! crates/classroom_core/src/session.rs
//!
//! The Session Store: the single source of truth for "who is signed in".
//!
//! State is published through a `tokio::sync::watch` channel so the route
//! guard and any screen can observe status changes without polling. The
//! in-memory session is only replaced after the key-value store has accepted
//! the new record (sign-in) or after removal was attempted (sign-out).

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{Session, SignInResponse, UserProfile};
use crate::error::{AuthError, INCOMPLETE_PROFILE};
use crate::ports::{AuthTransport, KeyValueStore};
use crate::validation::validate_credentials;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key of the JSON-serialized profile.
pub const USER_KEY: &str = "user_data";

/// Derived authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStatus {
    /// The persisted session has not been loaded yet.
    Pending,
    Anonymous,
    Authenticated,
}

/// Everything observers can see about the session at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Option<Session>,
    pub loading: bool,
    /// Set once the first status became authoritative.
    pub initialized: bool,
}

impl SessionSnapshot {
    fn starting() -> Self {
        Self {
            session: None,
            loading: true,
            initialized: false,
        }
    }

    pub fn status(&self) -> AuthStatus {
        if !self.initialized {
            AuthStatus::Pending
        } else if self.session.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.user)
    }
}

//=========================================================================================
// SessionStore
//=========================================================================================

/// Owns the current session and its persisted form. Share it as
/// `Arc<SessionStore>`.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    transport: Arc<dyn AuthTransport>,
    state: watch::Sender<SessionSnapshot>,
    /// Serializes initialize/sign-in/sign-out so overlapping calls apply in order.
    op_lock: Mutex<()>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, transport: Arc<dyn AuthTransport>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::starting());
        Self {
            storage,
            transport,
            state,
            op_lock: Mutex::new(()),
        }
    }

    // --- Readers ---

    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user().cloned()
    }

    /// The bearer token for authenticated API calls.
    pub fn token(&self) -> Option<String> {
        self.state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// A receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    // --- Operations ---

    /// Restores the persisted session, if a complete and readable one exists.
    ///
    /// Never fails: read or parse errors are logged and leave the store
    /// anonymous.
    pub async fn initialize(&self) {
        let _guard = self.op_lock.lock().await;
        self.set_loading(true);

        let restored = self.load_persisted().await;
        let authenticated = restored.is_some();
        self.state.send_modify(|s| {
            s.session = restored;
            s.loading = false;
            s.initialized = true;
        });

        info!(authenticated, "Session store initialized");
    }

    /// Signs in and persists the session. Returns the signed-in profile.
    ///
    /// On any failure the in-memory session is left as it was.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        validate_credentials(email, password)?;

        let _guard = self.op_lock.lock().await;
        if self.state.borrow().session.is_some() {
            return Err(AuthError::AlreadyAuthenticated);
        }
        self.set_loading(true);

        let result = self.commit_sign_in(email.trim(), password).await;

        self.state.send_modify(|s| {
            if let Ok(session) = &result {
                s.session = Some(session.clone());
                s.initialized = true;
            }
            s.loading = false;
        });

        match result {
            Ok(session) => {
                info!(user_id = %session.user.id, "Signed in");
                Ok(session.user)
            }
            Err(e) => {
                warn!(error = %e, "Sign in failed");
                Err(e)
            }
        }
    }

    /// Clears the local session, then notifies the backend in the background.
    ///
    /// Local sign-out always completes. The returned handle resolves once the
    /// remote notification has settled; dropping it detaches the task.
    pub async fn sign_out(&self) -> JoinHandle<()> {
        let _guard = self.op_lock.lock().await;
        self.set_loading(true);

        let previous_token = self.token();
        self.discard_persisted().await;

        self.state.send_modify(|s| {
            s.session = None;
            s.loading = false;
            s.initialized = true;
        });
        info!("Signed out");

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let Some(token) = previous_token else {
                debug!("No token held; skipping remote sign-out");
                return;
            };
            if let Err(e) = transport.sign_out(&token).await {
                warn!(error = %e, "Remote sign-out failed");
            }
        })
    }

    // --- Internals ---

    fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.loading != loading;
            s.loading = loading;
            changed
        });
    }

    async fn load_persisted(&self) -> Option<Session> {
        let (token, user) = futures::join!(
            self.storage.get(TOKEN_KEY),
            self.storage.get(USER_KEY)
        );

        let token = match token {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                debug!("No persisted token");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                return None;
            }
        };
        let user = match user {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Persisted token has no profile; discarding partial session");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted profile");
                return None;
            }
        };

        match serde_json::from_str::<UserProfile>(&user) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                warn!(error = %e, "Persisted profile is corrupt; discarding session");
                None
            }
        }
    }

    async fn commit_sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let SignInResponse { token, profile } = self
            .transport
            .sign_in(email, password)
            .await
            .map_err(AuthError::from_transport)?;

        if token.trim().is_empty() || profile.id.trim().is_empty() {
            return Err(AuthError::AuthenticationFailed(INCOMPLETE_PROFILE.to_string()));
        }

        let serialized =
            serde_json::to_string(&profile).map_err(|e| AuthError::Persistence(e.to_string()))?;

        // Both writes are attempted even if one fails.
        let (token_write, user_write) = futures::join!(
            self.storage.set(TOKEN_KEY, &token),
            self.storage.set(USER_KEY, &serialized)
        );
        if let Err(e) = token_write.and(user_write) {
            self.discard_persisted().await;
            return Err(AuthError::from_storage(e));
        }

        Ok(Session {
            token,
            user: profile,
        })
    }

    async fn discard_persisted(&self) {
        let (token, user) = futures::join!(
            self.storage.remove(TOKEN_KEY),
            self.storage.remove(USER_KEY)
        );
        for (key, result) in [(TOKEN_KEY, token), (USER_KEY, user)] {
            if let Err(e) = result {
                error!(key, error = %e, "Failed to remove persisted session value");
            }
        }
    }
}
