//! Single-flight token refresh.
//!
//! The first caller that needs a new credential starts one refresh exchange
//! and parks its pending outcome in a shared slot. Every caller arriving while
//! the slot is occupied awaits that same outcome instead of calling the
//! refresh endpoint again. The slot is emptied when the exchange settles,
//! whether it succeeded or not, before any waiter sees the result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, info, instrument, warn};

use coachbox_core::error::AuthError;
use coachbox_core::{Credential, CredentialStore, Result, claims};

use crate::backend::BackendClient;
use crate::invalidate::SessionInvalidator;

type RefreshOutcome = std::result::Result<Credential, AuthError>;

struct InFlight {
    generation: u64,
    outcome: Shared<BoxFuture<'static, RefreshOutcome>>,
}

struct CoordinatorInner {
    backend: BackendClient,
    store: Arc<dyn CredentialStore>,
    invalidator: SessionInvalidator,
    expiry_margin: chrono::Duration,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

/// Renews the stored credential, at most one exchange at a time.
///
/// Cheap to clone; clones share the same in-flight slot.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        backend: BackendClient,
        store: Arc<dyn CredentialStore>,
        invalidator: SessionInvalidator,
        expiry_margin: chrono::Duration,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                backend,
                store,
                invalidator,
                expiry_margin,
                in_flight: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Return a usable credential, refreshing if needed.
    ///
    /// Joins the in-flight refresh if there is one. If none is running and the
    /// stored credential has become usable in the meantime (another caller's
    /// refresh finished), it is returned without a network call.
    ///
    /// # Errors
    ///
    /// [`AuthError::SessionExpired`] if no credential is stored or the refresh
    /// fails. The session has been invalidated by then.
    pub async fn ensure_fresh(&self) -> Result<Credential> {
        self.join_or_start(false).await
    }

    /// Refresh now, even if the stored access token is still usable. Joins an
    /// in-flight refresh rather than starting a second one.
    pub async fn refresh(&self) -> Result<Credential> {
        self.join_or_start(true).await
    }

    /// Returns true while a refresh exchange is outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.lock_slot().is_some()
    }

    async fn join_or_start(&self, force: bool) -> Result<Credential> {
        let outcome = {
            let mut slot = self.lock_slot();

            match slot.as_ref() {
                Some(in_flight) => {
                    debug!(
                        generation = in_flight.generation,
                        "Joining in-flight refresh"
                    );
                    in_flight.outcome.clone()
                }
                None => {
                    if !force && let Some(credential) = self.usable_stored_credential() {
                        return Ok(credential);
                    }

                    let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    let outcome = self.start(generation);
                    *slot = Some(InFlight {
                        generation,
                        outcome: outcome.clone(),
                    });
                    outcome
                }
            }
        };

        outcome.await.map_err(Into::into)
    }

    fn usable_stored_credential(&self) -> Option<Credential> {
        let credential = self.inner.store.get().ok().flatten()?;
        claims::is_usable_at(credential.access_token(), Utc::now(), self.inner.expiry_margin)
            .then_some(credential)
    }

    /// Spawn the exchange so that it completes, and releases the slot, even if
    /// every caller awaiting it is cancelled.
    fn start(&self, generation: u64) -> Shared<BoxFuture<'static, RefreshOutcome>> {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = inner.exchange(generation).await;
            inner.release(generation);
            outcome
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(generation, error = %err, "Refresh task did not complete");
                    inner.release(generation);
                    if let Err(err) = inner.invalidator.invalidate() {
                        warn!(error = %err, "Failed to clear credential store");
                    }
                    Err(AuthError::SessionExpired)
                }
            }
        }
        .boxed()
        .shared()
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<InFlight>> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CoordinatorInner {
    #[instrument(skip(self))]
    async fn exchange(&self, generation: u64) -> RefreshOutcome {
        let current = match self.store.get() {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                debug!("No stored credential; login required");
                self.end_session();
                return Err(AuthError::SessionExpired);
            }
            Err(err) => {
                warn!(error = %err, "Failed to read credential store");
                self.end_session();
                return Err(AuthError::SessionExpired);
            }
        };

        info!("Refreshing access token");

        let credential = match self.backend.refresh(current.refresh_token()).await {
            Ok(credential) => credential,
            Err(err) => {
                warn!(error = %err, "Token refresh failed");
                self.end_session();
                return Err(AuthError::SessionExpired);
            }
        };

        if let Err(err) = self.store.set(&credential) {
            warn!(error = %err, "Failed to store refreshed credential");
            self.end_session();
            return Err(AuthError::SessionExpired);
        }

        debug!("Access token refreshed");
        Ok(credential)
    }

    fn end_session(&self) {
        if let Err(err) = self.invalidator.invalidate() {
            warn!(error = %err, "Failed to clear credential store");
        }
    }

    /// Empty the slot if it still holds this attempt.
    fn release(&self, generation: u64) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|f| f.generation == generation) {
            *slot = None;
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refreshing", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}
