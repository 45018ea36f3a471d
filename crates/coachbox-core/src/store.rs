//! Credential storage trait and in-memory implementation.

use std::sync::{PoisonError, RwLock};

use crate::Result;
use crate::credential::Credential;

/// Storage for the current [`Credential`].
///
/// `set` always replaces the whole credential. Stores do not inspect token
/// contents.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, if any.
    fn get(&self) -> Result<Option<Credential>>;

    /// Replaces the stored credential.
    fn set(&self, credential: &Credential) -> Result<()>;

    /// Removes the stored credential. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;
}

/// A non-durable store, useful for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        let guard = self.credential.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        let mut guard = self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}
