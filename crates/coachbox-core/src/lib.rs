//! coachbox-core - Credential types, expiry evaluation and storage traits.
//!
//! Everything the authenticated request pipeline shares between its backend
//! client, its durable store and the CLI lives here.
//!
//! # Example
//!
//! ```
//! use coachbox_core::{Credential, CredentialStore, MemoryCredentialStore};
//!
//! let store = MemoryCredentialStore::new();
//! store.set(&Credential::new("access", "refresh", "bearer")).unwrap();
//! assert_eq!(store.get().unwrap().unwrap().access_token().as_str(), "access");
//! ```

pub mod claims;
pub mod credential;
pub mod error;
pub mod session;
pub mod store;
pub mod types;

pub use claims::{DecodedClaims, MalformedCredential, decode_claims, is_usable, is_usable_at};
pub use credential::{AccessToken, Credential, LoginCredentials, RefreshToken};
pub use error::Error;
pub use session::SessionState;
pub use store::{CredentialStore, MemoryCredentialStore};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
