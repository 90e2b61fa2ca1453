//! Persisted player credentials for gamelink.
//!
//! After joining a game the server hands the client a player id and a
//! secret. Saving them lets a later process reconnect as the same player
//! instead of joining again.
//!
//! - [`Session`]: the credentials themselves
//! - [`SessionStore`]: where they live, keyed by `(game_url, username)`
//! - [`FileSessionStore`]: one JSON file per player under the user's data
//!   directory
//! - [`MemorySessionStore`]: process-local, for tests and for callers that
//!   don't want anything written to disk

mod error;
mod file;
mod session;
mod store;

pub use error::SessionError;
pub use file::FileSessionStore;
pub use session::Session;
pub use store::{MemorySessionStore, SessionStore};
