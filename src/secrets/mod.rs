//! API-token storage.
//!
//! The control-plane token lives in the OS keyring, keyed by target host, so
//! one machine can hold tokens for several control planes. CI environments
//! bypass the keyring with `CERTBIND_TOKEN`.

use thiserror::Error;

mod keyring_store;
mod token;

pub use keyring_store::KeyringTokenStore;
pub use token::{TOKEN_ENV, TokenError, TokenManager};

/// Errors produced by secret storage backends.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("no stored token for {0}")]
    NotFound(String),
    #[error("secret store unavailable: {0}")]
    Unavailable(String),
    #[error("secret store error: {0}")]
    Store(String),
}

/// Abstraction over wherever tokens are kept.
pub trait SecretStore: Send + Sync {
    fn store(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError>;
    fn retrieve(&self, key: &str) -> Result<Vec<u8>, SecretStoreError>;
    fn delete(&self, key: &str) -> Result<(), SecretStoreError>;
}
