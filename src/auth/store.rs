//! Token store: the single owner of the current session

use crate::auth::models::UserRole;
use crate::auth::storage::{
    Entries, MemoryStorage, SessionStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_TYPE_KEY,
};
use crate::error::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

/// Snapshot of the stored session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_type: Option<UserRole>,
}

impl Session {
    fn from_entries(entries: &Entries) -> Self {
        let non_empty = |key: &str| entries.get(key).filter(|v| !v.is_empty()).cloned();
        Self {
            access_token: non_empty(ACCESS_TOKEN_KEY),
            refresh_token: non_empty(REFRESH_TOKEN_KEY),
            user_type: entries.get(USER_TYPE_KEY).and_then(|v| v.parse().ok()),
        }
    }

    fn to_entries(&self) -> Entries {
        let mut entries = Entries::new();
        if let Some(access) = &self.access_token {
            entries.insert(ACCESS_TOKEN_KEY.to_string(), access.clone());
        }
        if let Some(refresh) = &self.refresh_token {
            entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh.clone());
        }
        if let Some(role) = self.user_type {
            entries.insert(USER_TYPE_KEY.to_string(), role.as_str().to_string());
        }
        entries
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Session lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { user_type: Option<UserRole> },
    Refreshed,
    SignedOut,
    /// Forced logout; the host should navigate to `redirect_to`
    Expired { redirect_to: String },
}

struct Inner {
    storage: Arc<dyn SessionStorage>,
    session: RwLock<Session>,
    events: broadcast::Sender<SessionEvent>,
}

/// Process-wide token store.
///
/// Cloning yields another handle to the same session. Writes go to storage
/// before the lock is released, so a read after a write always observes it.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

impl TokenStore {
    /// Load any persisted session from `storage`
    pub fn init(storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let session = Session::from_entries(&storage.load()?);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::debug!(
            authenticated = session.is_authenticated(),
            "Token store initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                storage,
                session: RwLock::new(session),
                events,
            }),
        })
    }

    /// Store backed by fresh in-memory storage
    pub fn in_memory() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                storage: Arc::new(MemoryStorage::new()),
                session: RwLock::new(Session::default()),
                events,
            }),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.session.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.session.read().refresh_token.clone()
    }

    pub fn user_type(&self) -> Option<UserRole> {
        self.inner.session.read().user_type
    }

    pub fn snapshot(&self) -> Session {
        self.inner.session.read().clone()
    }

    /// True iff a non-empty access token is stored. Expiry is left to the backend.
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.read().is_authenticated()
    }

    /// Store a new access token; the refresh token is only replaced when given
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) -> Result<()> {
        self.update(|session| {
            session.access_token = Some(access.to_string());
            if let Some(refresh) = refresh {
                session.refresh_token = Some(refresh.to_string());
            }
        })
    }

    /// Replace the whole session after login or registration
    pub fn set_session(&self, access: &str, refresh: &str, user_type: UserRole) -> Result<()> {
        self.update(|session| {
            *session = Session {
                access_token: Some(access.to_string()),
                refresh_token: Some(refresh.to_string()),
                user_type: Some(user_type),
            };
        })?;
        self.emit(SessionEvent::SignedIn {
            user_type: Some(user_type),
        });
        Ok(())
    }

    /// Remove tokens and role, then signal logout
    pub fn clear_tokens(&self) -> Result<()> {
        self.clear(SessionEvent::SignedOut)
    }

    /// Clear the session after an unrecoverable 401
    pub fn expire(&self, redirect_to: &str) -> Result<()> {
        self.clear(SessionEvent::Expired {
            redirect_to: redirect_to.to_string(),
        })
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Drop the in-memory session without touching storage.
    ///
    /// Storage already holds every write, so a later `init` over the same
    /// storage restores the session.
    pub fn teardown(&self) {
        *self.inner.session.write() = Session::default();
        tracing::debug!("Token store torn down");
    }

    pub(crate) fn notify_refreshed(&self) {
        self.emit(SessionEvent::Refreshed);
    }

    fn clear(&self, event: SessionEvent) -> Result<()> {
        let result = self.update(|session| *session = Session::default());
        // Memory is cleared even if persisting fails, so always signal
        self.emit(event);
        result
    }

    fn update(&self, mutate: impl FnOnce(&mut Session)) -> Result<()> {
        let mut session = self.inner.session.write();
        mutate(&mut session);
        self.inner.storage.save(&session.to_entries())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .field("user_type", &self.user_type())
            .finish()
    }
}
