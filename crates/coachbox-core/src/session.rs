//! Application-level session state.

use std::fmt;

/// Whether the client currently holds a credential.
///
/// The transition to [`SessionState::Anonymous`] is one-way from the
/// dispatcher's point of view: only an explicit login brings the session back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A credential is stored.
    Authenticated,
    /// No credential is stored; a login is required.
    Anonymous,
}

impl SessionState {
    /// Returns true if a credential is stored.
    pub fn is_authenticated(self) -> bool {
        self == SessionState::Authenticated
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Authenticated => f.write_str("authenticated"),
            SessionState::Anonymous => f.write_str("anonymous"),
        }
    }
}
