//! Authentication: where the session credentials live and how they change.
//!
//! - `CredentialStore`: access/refresh tokens and user identity
//! - `FileCredentialStore`: JSON session file, survives restarts
//! - `KeyringCredentialStore`: refresh token kept in the OS keychain
//! - `AuthState`: login, registration and logout on top of a store

pub mod credentials;
pub mod keychain;
pub mod session;
pub mod state;

pub use credentials::{Credential, CredentialStore, MemoryCredentialStore};
pub use keychain::KeyringCredentialStore;
pub use session::{FileCredentialStore, SessionData};
pub use state::AuthState;
