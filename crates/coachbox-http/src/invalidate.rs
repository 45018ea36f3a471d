//! Session invalidation and session state notifications.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use coachbox_core::{Credential, CredentialStore, Result, SessionState};

/// Ends the session: clears the credential store and tells the rest of the
/// application the user is logged out.
///
/// Subscribers see exactly one [`SessionState::Anonymous`] notification per
/// invalidation event. Invalidating an already anonymous session clears the
/// (empty) store again and notifies nobody.
#[derive(Clone)]
pub struct SessionInvalidator {
    store: Arc<dyn CredentialStore>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionInvalidator {
    pub(crate) fn new(store: Arc<dyn CredentialStore>, initial: SessionState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            store,
            state: Arc::new(state),
        }
    }

    /// Clear the credential store and publish [`SessionState::Anonymous`].
    ///
    /// The notification is published even if clearing the store fails, so the
    /// application never keeps acting on a session it cannot renew.
    pub fn invalidate(&self) -> Result<()> {
        let cleared = self.store.clear();

        let notified = self.state.send_if_modified(|state| match state {
            SessionState::Anonymous => false,
            SessionState::Authenticated => {
                *state = SessionState::Anonymous;
                true
            }
        });

        if notified {
            info!("Session invalidated; login required");
        }

        cleared
    }

    /// Invalidate only if `attached` is still the stored credential.
    ///
    /// A rejection answering a token that has since been superseded (by a
    /// refresh or a login) leaves the newer credential alone. Returns whether
    /// the session was ended.
    pub fn invalidate_if_current(&self, attached: &Credential) -> Result<bool> {
        match self.store.get() {
            Ok(Some(stored)) if stored != *attached => {
                debug!("Rejected credential was already superseded");
                Ok(false)
            }
            _ => self.invalidate().map(|()| true),
        }
    }

    /// Publish [`SessionState::Authenticated`] after a login.
    pub(crate) fn mark_authenticated(&self) {
        self.state.send_if_modified(|state| match state {
            SessionState::Authenticated => false,
            SessionState::Anonymous => {
                *state = SessionState::Authenticated;
                true
            }
        });
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to session state changes (e.g. to redirect to a login view).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for SessionInvalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInvalidator")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachbox_core::{Credential, MemoryCredentialStore};

    fn authenticated() -> (Arc<MemoryCredentialStore>, SessionInvalidator) {
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "a", "r", "bearer",
        )));
        let invalidator = SessionInvalidator::new(store.clone(), SessionState::Authenticated);
        (store, invalidator)
    }

    #[test]
    fn invalidate_clears_store_and_notifies_once() {
        let (store, invalidator) = authenticated();
        let mut rx = invalidator.subscribe();

        invalidator.invalidate().unwrap();
        assert!(store.get().unwrap().is_none());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);

        invalidator.invalidate().unwrap();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(invalidator.state(), SessionState::Anonymous);
    }

    #[test]
    fn login_after_invalidation_notifies_again() {
        let (_store, invalidator) = authenticated();
        let mut rx = invalidator.subscribe();

        invalidator.invalidate().unwrap();
        rx.borrow_and_update();

        invalidator.mark_authenticated();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Authenticated);

        invalidator.invalidate().unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn superseded_credential_is_not_invalidated() {
        let (store, invalidator) = authenticated();
        let rx = invalidator.subscribe();
        let stale = Credential::new("old", "r0", "bearer");

        assert!(!invalidator.invalidate_if_current(&stale).unwrap());
        assert!(store.get().unwrap().is_some());
        assert_eq!(invalidator.state(), SessionState::Authenticated);
        assert!(!rx.has_changed().unwrap());

        let current = store.get().unwrap().unwrap();
        assert!(invalidator.invalidate_if_current(&current).unwrap());
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn anonymous_invalidation_is_a_no_op() {
        let store = Arc::new(MemoryCredentialStore::new());
        let invalidator = SessionInvalidator::new(store, SessionState::Anonymous);
        let rx = invalidator.subscribe();

        invalidator.invalidate().unwrap();
        assert!(!rx.has_changed().unwrap());
    }
}
