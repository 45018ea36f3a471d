//! The session manager and request dispatcher.

use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::multipart::Form;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use coachbox_core::error::{AuthError, StorageError};
use coachbox_core::{
    ApiUrl, Credential, CredentialStore, Error, LoginCredentials, Result, SessionState, claims,
};

use crate::backend::{BackendClient, parse_error_response, transport_error};
use crate::config::ClientConfig;
use crate::invalidate::SessionInvalidator;
use crate::refresh::RefreshCoordinator;
use crate::request::Request;
use crate::resources::{ResourceClient, UsersClient, VideosClient};

/// Owns the session lifecycle and is the single entry point for backend calls.
///
/// Construct one per application and hand clones to resource clients; clones
/// share the credential store, the in-flight refresh and the session state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use coachbox_core::{ApiUrl, MemoryCredentialStore};
/// use coachbox_http::{ClientConfig, SessionManager};
///
/// # async fn example() -> Result<(), coachbox_core::Error> {
/// let config = ClientConfig::new(ApiUrl::new("https://api.example.com")?);
/// let session = SessionManager::new(config, Arc::new(MemoryCredentialStore::new()))?;
///
/// let mut state = session.subscribe();
/// tokio::spawn(async move {
///     while state.changed().await.is_ok() {
///         println!("session is now {}", *state.borrow());
///     }
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: ClientConfig,
    backend: BackendClient,
    store: Arc<dyn CredentialStore>,
    coordinator: RefreshCoordinator,
    invalidator: SessionInvalidator,
}

impl SessionManager {
    /// Create a manager over `store`. A credential already in the store (from
    /// a previous run) makes the session start out authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the store cannot
    /// be read. A corrupt stored document is not an error: the session starts
    /// out anonymous.
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let backend = BackendClient::new(&config)?;

        let initial = match store.get() {
            Ok(Some(_)) => SessionState::Authenticated,
            Ok(None) => SessionState::Anonymous,
            // A fresh login overwrites the document.
            Err(Error::Storage(err @ StorageError::Corrupt { .. })) => {
                warn!(error = %err, "Ignoring unreadable stored credential");
                SessionState::Anonymous
            }
            Err(err) => return Err(err),
        };
        debug!(state = %initial, "Restored session state");

        let invalidator = SessionInvalidator::new(Arc::clone(&store), initial);
        let coordinator = RefreshCoordinator::new(
            backend.clone(),
            Arc::clone(&store),
            invalidator.clone(),
            config.expiry_margin(),
        );

        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                backend,
                store,
                coordinator,
                invalidator,
            }),
        })
    }

    /// Backend base URL.
    pub fn api(&self) -> &ApiUrl {
        self.inner.backend.api()
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.inner.invalidator.state()
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.invalidator.subscribe()
    }

    /// The stored credential, whether or not it is still usable.
    pub fn credential(&self) -> Result<Option<Credential>> {
        self.inner.store.get()
    }

    /// The refresh coordinator shared by this manager's clones.
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// The session invalidator shared by this manager's clones.
    pub fn invalidator(&self) -> &SessionInvalidator {
        &self.inner.invalidator
    }

    /// Log in and store the issued credential.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] if the backend rejects the username or
    /// password; transport and protocol errors otherwise. The store is left
    /// untouched on failure.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Credential> {
        info!("Logging in");

        let credential = self.inner.backend.login(credentials).await?;
        self.inner.store.set(&credential)?;
        self.inner.invalidator.mark_authenticated();

        debug!("Logged in");
        Ok(credential)
    }

    /// Log out: tell the backend (best effort) and end the local session.
    ///
    /// # Errors
    ///
    /// Only local failures (clearing the store) are returned.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        info!("Logging out");

        match self.inner.store.get() {
            Ok(Some(credential)) => {
                if let Err(err) = self.inner.backend.logout(&credential).await {
                    warn!(error = %err, "Server-side logout failed; clearing local session anyway");
                }
            }
            Ok(None) => debug!("No stored credential; skipping server-side logout"),
            Err(err) => warn!(error = %err, "Failed to read credential store"),
        }

        self.inner.invalidator.invalidate()
    }

    /// Re-read the store and publish the session state it implies.
    ///
    /// Useful after another process logged in or out through a shared durable
    /// store.
    pub fn restore(&self) -> Result<SessionState> {
        if self.inner.store.get()?.is_some() {
            self.inner.invalidator.mark_authenticated();
        } else {
            self.inner.invalidator.invalidate()?;
        }
        Ok(self.state())
    }

    /// Force a token refresh through the single-flight coordinator.
    pub async fn refresh(&self) -> Result<Credential> {
        self.inner.coordinator.refresh().await
    }

    /// Send `request` with a valid credential attached.
    ///
    /// The stored access token is used if it is usable; otherwise it is
    /// renewed first, joining any refresh already in flight. A `401` from the
    /// backend ends the session without another refresh attempt, since the
    /// token was presumed fresh when it was attached. If the rejected token
    /// has meanwhile been superseded in the store, the newer credential is
    /// kept and only this call fails.
    ///
    /// Any other response, success or not, is returned as-is.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionExpired`] when no credential can be obtained or
    ///   the backend rejects the session.
    /// - [`Error::Transport`](coachbox_core::Error::Transport) for network
    ///   failures. The session is left alone.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn dispatch(&self, request: Request) -> Result<reqwest::Response> {
        let credential = self.usable_credential().await?;

        debug!(multipart = request.is_multipart(), "Dispatching request");
        let response = self.inner.backend.send(request, &credential).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected the session");
            if let Err(err) = self.inner.invalidator.invalidate_if_current(&credential) {
                warn!(error = %err, "Failed to clear credential store");
            }
            return Err(AuthError::SessionExpired.into());
        }

        Ok(response)
    }

    /// Dispatch and decode a JSON response. Non-success statuses become
    /// [`ProtocolError`](coachbox_core::error::ProtocolError)s.
    pub async fn send_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let response = self.dispatch(request).await?;

        if response.status().is_success() {
            response.json::<T>().await.map_err(transport_error)
        } else {
            Err(parse_error_response(response).await.into())
        }
    }

    /// Dispatch and discard the response body. Non-success statuses become
    /// [`ProtocolError`](coachbox_core::error::ProtocolError)s.
    pub async fn send_no_content(&self, request: Request) -> Result<()> {
        let response = self.dispatch(request).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(parse_error_response(response).await.into())
        }
    }

    /// `GET path`, returning the raw response.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.dispatch(Request::get(path)).await
    }

    /// `GET path`, decoding the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(Request::get(path)).await
    }

    /// `POST path` with a JSON body, decoding the JSON response.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.send_json(Request::post(path).with_json(body)).await
    }

    /// `PUT path` with a JSON body, decoding the JSON response.
    pub async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.send_json(Request::put(path).with_json(body)).await
    }

    /// `PATCH path` with a JSON body, decoding the JSON response.
    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.send_json(Request::patch(path).with_json(body)).await
    }

    /// `DELETE path`, discarding the response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send_no_content(Request::delete(path)).await
    }

    /// `POST path` with a multipart form, decoding the JSON response.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        self.send_json(Request::post(path).with_multipart(form)).await
    }

    async fn usable_credential(&self) -> Result<Credential> {
        let stored = match self.inner.store.get() {
            Ok(stored) => stored,
            // Unreadable counts as unusable; the refresh path ends the session.
            Err(Error::Storage(err @ StorageError::Corrupt { .. })) => {
                warn!(error = %err, "Stored credential is unreadable");
                None
            }
            Err(err) => return Err(err),
        };

        match stored {
            Some(credential)
                if claims::is_usable_at(
                    credential.access_token(),
                    Utc::now(),
                    self.inner.config.expiry_margin(),
                ) =>
            {
                Ok(credential)
            }
            _ => {
                debug!("Access token missing or stale");
                self.inner.coordinator.ensure_fresh().await
            }
        }
    }

    // ========================================================================
    // Resource clients
    // ========================================================================

    pub fn athletes(&self) -> ResourceClient {
        ResourceClient::new(self.clone(), "athletes")
    }

    pub fn evaluations(&self) -> ResourceClient {
        ResourceClient::new(self.clone(), "evaluations")
    }

    pub fn comments(&self) -> ResourceClient {
        ResourceClient::new(self.clone(), "comments")
    }

    pub fn videos(&self) -> VideosClient {
        VideosClient::new(self.clone())
    }

    pub fn users(&self) -> UsersClient {
        UsersClient::new(self.clone())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("api", self.api())
            .field("state", &self.state())
            .field("credential", &"[REDACTED]")
            .finish()
    }
}
