//! coachbox-http - The authenticated request pipeline.
//!
//! Every data-access call goes through [`SessionManager::dispatch`], which
//! attaches the bearer credential, renews it through a single-flight
//! [`RefreshCoordinator`] when it is stale, and ends the session through the
//! [`SessionInvalidator`] when renewal is impossible or the backend rejects it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use coachbox_core::{ApiUrl, LoginCredentials, MemoryCredentialStore};
//! use coachbox_http::{ClientConfig, Request, SessionManager};
//!
//! # async fn example() -> Result<(), coachbox_core::Error> {
//! let config = ClientConfig::new(ApiUrl::new("https://api.example.com")?);
//! let session = SessionManager::new(config, Arc::new(MemoryCredentialStore::new()))?;
//! session
//!     .login(&LoginCredentials::new("coach@example.com", "secret"))
//!     .await?;
//!
//! let athletes: serde_json::Value = session.send_json(Request::get("/athletes")).await?;
//! println!("{athletes}");
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod invalidate;
mod manager;
mod refresh;
mod request;
mod resources;

pub use backend::{LOGIN, LOGOUT, REFRESH};
pub use config::ClientConfig;
pub use invalidate::SessionInvalidator;
pub use manager::SessionManager;
pub use refresh::RefreshCoordinator;
pub use request::{Body, Request};
pub use resources::{ResourceClient, UsersClient, VIDEO_UPLOAD, VideosClient};
