//! Persistent session: the auth token and the signed-in user's profile.
//!
//! The session lives in a small key/value store under two keys, `token` and
//! `user`. It outlives the process until [`SessionStore::clear`] is called,
//! either by logout or by the gateway on an auth failure.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::UserProfile;

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";
const SIGNED_IN_AT_KEY: &str = "signed_in_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
    pub signed_in_at: Option<DateTime<Utc>>,
}

/// Session accessor shared by every component.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Session store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    /// Store a new session. On failure nothing is left behind: the store
    /// ends up signed out.
    pub fn set_session(&self, token: &str, user: &UserProfile) -> anyhow::Result<()> {
        let user_json = serde_json::to_string(user)?;
        let written = self
            .store
            .set(USER_KEY, &user_json)
            .and_then(|_| self.store.set(SIGNED_IN_AT_KEY, &Utc::now().to_rfc3339()))
            .and_then(|_| self.store.set(TOKEN_KEY, token));

        if let Err(e) = written {
            self.clear();
            return Err(e);
        }
        debug!(username = %user.username, "Session stored");
        Ok(())
    }

    /// Current session, `None` when signed out or the stored profile is unreadable.
    pub fn get_session(&self) -> Option<Session> {
        let token = self.token()?;
        let raw_user = self.store.get(USER_KEY)?;
        let user = match serde_json::from_str::<UserProfile>(&raw_user) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user profile is unreadable");
                return None;
            }
        };
        let signed_in_at = self
            .store
            .get(SIGNED_IN_AT_KEY)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc));

        Some(Session {
            token,
            user,
            signed_in_at,
        })
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Drop the token and profile. Errors from the backing store are logged,
    /// never surfaced: a failed clear must not stop a forced logout.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, USER_KEY, SIGNED_IN_AT_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }
        debug!("Session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn alice() -> UserProfile {
        UserProfile {
            id: "usr_1".to_string(),
            username: "alice".to_string(),
            role: Role::User,
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn test_set_and_get_session() {
        let sessions = SessionStore::in_memory();
        assert!(!sessions.is_authenticated());
        assert!(sessions.get_session().is_none());

        sessions.set_session("tok-123", &alice()).unwrap();

        let session = sessions.get_session().unwrap();
        assert_eq!(session.token, "tok-123");
        assert_eq!(session.user, alice());
        assert!(session.signed_in_at.is_some());
        assert!(sessions.is_authenticated());
    }

    #[test]
    fn test_clear() {
        let sessions = SessionStore::in_memory();
        sessions.set_session("tok-123", &alice()).unwrap();
        sessions.clear();
        assert!(!sessions.is_authenticated());
        assert!(sessions.get_session().is_none());
    }

    #[test]
    fn test_token_without_profile_still_counts_as_authenticated() {
        let store = Arc::new(MemoryStore::default());
        store.set(TOKEN_KEY, "tok").unwrap();
        store.set(USER_KEY, "{not json").unwrap();
        let sessions = SessionStore::new(store);

        assert!(sessions.is_authenticated());
        assert!(sessions.get_session().is_none());
    }

    #[test]
    fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let first = SessionStore::new(Arc::new(FileStore::open(&path)));
        first.set_session("tok-file", &alice()).unwrap();

        let second = SessionStore::new(Arc::new(FileStore::open(&path)));
        assert_eq!(second.token().as_deref(), Some("tok-file"));

        second.clear();
        let third = SessionStore::new(Arc::new(FileStore::open(&path)));
        assert!(!third.is_authenticated());
    }

    /// Stands in for a disk that accepts the first `budget` writes.
    struct FlakyStore {
        inner: MemoryStore,
        budget: parking_lot::Mutex<usize>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            let mut budget = self.budget.lock();
            if *budget == 0 {
                anyhow::bail!("disk full");
            }
            *budget -= 1;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> anyhow::Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_partial_write_rolls_back() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::default(),
            budget: parking_lot::Mutex::new(2),
        });
        let sessions = SessionStore::new(store.clone());

        assert!(sessions.set_session("tok-123", &alice()).is_err());
        assert!(!sessions.is_authenticated());
        assert_eq!(store.get(USER_KEY), None);
        assert_eq!(store.get(SIGNED_IN_AT_KEY), None);
    }

    #[test]
    fn test_unwritable_path_stays_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let sessions = SessionStore::new(Arc::new(FileStore::open(&blocker.join("session.json"))));

        assert!(sessions.set_session("tok-123", &alice()).is_err());
        assert!(!sessions.is_authenticated());
    }

    #[test]
    fn test_clear_holds_across_reopen_when_rewrite_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let first = SessionStore::new(Arc::new(FileStore::open(&path)));
        first.set_session("tok-file", &alice()).unwrap();

        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        first.clear();

        assert!(!first.is_authenticated());
        let reopened = SessionStore::new(Arc::new(FileStore::open(&path)));
        assert!(!reopened.is_authenticated());
    }
}
