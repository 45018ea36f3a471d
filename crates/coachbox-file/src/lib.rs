//! coachbox-file - Durable, file-backed credential storage.

mod store;

pub use store::FileCredentialStore;
