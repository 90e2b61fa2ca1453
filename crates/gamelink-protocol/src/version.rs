//! Protocol version compatibility.
//!
//! Versions are `major.minor` strings; anything after the minor part is
//! ignored and a missing minor part counts as `0`.
//!
//! - Majors must match.
//! - With major `0` the minors must match exactly (pre-1.0 minors break).
//! - Otherwise the client's minor must be at least the server's.

/// The protocol version this client implements.
pub const PROTOCOL_VERSION: &str = "0.7";

/// Result of comparing a server's protocol version with the client's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// The client can talk to this server.
    Compatible,
    /// Major versions differ.
    MajorMismatch,
    /// Majors match but the minor rule is violated (or a minor is not a
    /// number).
    MinorMismatch,
}

impl VersionCheck {
    /// Returns `true` for [`VersionCheck::Compatible`].
    pub fn is_compatible(self) -> bool {
        self == VersionCheck::Compatible
    }
}

/// Compares `server` against `client`.
pub fn check_version(server: &str, client: &str) -> VersionCheck {
    let (server_major, server_minor) = split_version(server);
    let (client_major, client_minor) = split_version(client);

    if server_major != client_major {
        return VersionCheck::MajorMismatch;
    }

    if client_major == "0" {
        return if server_minor == client_minor {
            VersionCheck::Compatible
        } else {
            VersionCheck::MinorMismatch
        };
    }

    match (server_minor.parse::<u64>(), client_minor.parse::<u64>()) {
        (Ok(server_minor), Ok(client_minor)) if client_minor >= server_minor => {
            VersionCheck::Compatible
        }
        _ => VersionCheck::MinorMismatch,
    }
}

fn split_version(version: &str) -> (&str, &str) {
    let mut parts = version.trim().split('.');
    let major = parts.next().unwrap_or("");
    let minor = parts.next().unwrap_or("0");
    (major, minor)
}
