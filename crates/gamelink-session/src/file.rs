//! File-backed credential storage.
//!
//! Layout: `<root>/<escaped game url>/<escaped username>.json`. Escaping
//! keeps every key a single, safe path component (`localhost:8080` becomes
//! `localhost%3A8080`).

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Session, SessionError, SessionStore};

/// Overrides the default storage root when set.
const DATA_DIR_ENV: &str = "GAMELINK_DATA_DIR";

/// A [`SessionStore`] that writes one JSON file per player.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    /// Stores sessions below `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stores sessions in the user's data directory
    /// (`<data dir>/gamelink/games`), or below `$GAMELINK_DATA_DIR/games`.
    ///
    /// # Errors
    /// Returns [`SessionError::NoDataDir`] if neither is available.
    pub fn default_location() -> Result<Self, SessionError> {
        let base = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir()
                .ok_or(SessionError::NoDataDir)?
                .join("gamelink"),
        };
        Ok(Self::new(base.join("games")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn game_dir(&self, game_url: &str) -> PathBuf {
        self.root.join(escape_component(game_url))
    }

    fn session_path(&self, game_url: &str, username: &str) -> PathBuf {
        self.game_dir(game_url)
            .join(format!("{}.json", escape_component(username)))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, game_url: &str, username: &str) -> Result<Session, SessionError> {
        let path = self.session_path(game_url, username);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound {
                    game_url: game_url.to_owned(),
                    username: username.to_owned(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut session: Session =
            serde_json::from_str(&contents).map_err(SessionError::Decode)?;
        session.game_url = game_url.to_owned();
        session.username = username.to_owned();
        Ok(session)
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if session.game_url.is_empty() {
            return Err(SessionError::MissingGameUrl);
        }

        std::fs::create_dir_all(self.game_dir(&session.game_url))?;
        let json = serde_json::to_vec_pretty(session).map_err(SessionError::Encode)?;
        let path = self.session_path(&session.game_url, &session.username);
        std::fs::write(&path, json)?;

        debug!(path = %path.display(), "session saved");
        Ok(())
    }

    fn remove(&self, game_url: &str, username: &str) -> Result<(), SessionError> {
        if game_url.is_empty() {
            return Ok(());
        }

        let path = self.session_path(game_url, username);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "session removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        // Drop the per-server directory once its last session is gone.
        let dir = self.game_dir(game_url);
        if std::fs::read_dir(&dir).is_ok_and(|mut entries| entries.next().is_none()) {
            let _ = std::fs::remove_dir(&dir);
        }
        Ok(())
    }
}

/// Percent-encodes everything but ASCII alphanumerics, `-` and `_`.
fn escape_component(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            let _ = write!(escaped, "%{byte:02X}");
        }
    }
    escaped
}
