//! Player id → username cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Display names of the players in the current game.
///
/// Filled from `new_player`, `game_info` and explicit lookups; entries are
/// dropped on `left_game` and everything is cleared when leaving the game.
#[derive(Debug, Default)]
pub struct UsernameCache {
    names: Mutex<HashMap<String, String>>,
}

impl UsernameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: &str) -> Option<String> {
        self.lock().get(player_id).cloned()
    }

    pub fn insert(&self, player_id: impl Into<String>, username: impl Into<String>) {
        self.lock().insert(player_id.into(), username.into());
    }

    pub fn remove(&self, player_id: &str) -> Option<String> {
        self.lock().remove(player_id)
    }

    /// Adds every entry of `roster`, replacing existing names.
    pub fn extend(&self, roster: impl IntoIterator<Item = (String, String)>) {
        self.lock().extend(roster);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.names.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
