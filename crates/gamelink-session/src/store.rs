//! The storage seam for credentials.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{Session, SessionError};

/// Persists [`Session`]s keyed by `(game_url, username)`.
///
/// Calls are synchronous: credentials are tiny and are only touched while
/// setting up or leaving a game.
pub trait SessionStore: Send + Sync + 'static {
    /// Loads the credentials for `username` on `game_url`.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if nothing is stored.
    fn load(&self, game_url: &str, username: &str) -> Result<Session, SessionError>;

    /// Stores `session`, replacing any previous record for the same key.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Forgets the credentials for `username` on `game_url`. Removing a
    /// record that does not exist is not an error.
    fn remove(&self, game_url: &str, username: &str) -> Result<(), SessionError>;
}

/// A [`SessionStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<(String, String), Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, game_url: &str, username: &str) -> Result<Session, SessionError> {
        self.lock()
            .get(&(game_url.to_owned(), username.to_owned()))
            .cloned()
            .ok_or_else(|| SessionError::NotFound {
                game_url: game_url.to_owned(),
                username: username.to_owned(),
            })
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if session.game_url.is_empty() {
            return Err(SessionError::MissingGameUrl);
        }
        self.lock().insert(
            (session.game_url.clone(), session.username.clone()),
            session.clone(),
        );
        Ok(())
    }

    fn remove(&self, game_url: &str, username: &str) -> Result<(), SessionError> {
        self.lock()
            .remove(&(game_url.to_owned(), username.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_save_then_load() {
        let store = MemorySessionStore::new();
        let session = Session::new("localhost:8080", "alice", "g1", "p1", "s1");
        store.save(&session).unwrap();

        let loaded = store.load("localhost:8080", "alice").unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_memory_store_load_missing_is_not_found() {
        let store = MemorySessionStore::new();
        let err = store.load("localhost:8080", "alice").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_memory_store_keys_by_url_and_username() {
        let store = MemorySessionStore::new();
        store
            .save(&Session::new("a:1", "alice", "g1", "p1", "s1"))
            .unwrap();
        store
            .save(&Session::new("b:1", "alice", "g2", "p2", "s2"))
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.load("b:1", "alice").unwrap().game_id, "g2");
        assert!(store.load("a:1", "bob").is_err());
    }

    #[test]
    fn test_memory_store_remove_is_idempotent() {
        let store = MemorySessionStore::new();
        store
            .save(&Session::new("a:1", "alice", "g1", "p1", "s1"))
            .unwrap();

        store.remove("a:1", "alice").unwrap();
        store.remove("a:1", "alice").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_rejects_empty_game_url() {
        let store = MemorySessionStore::new();
        let result = store.save(&Session::new("", "alice", "g1", "p1", "s1"));
        assert!(matches!(result, Err(SessionError::MissingGameUrl)));
    }
}
