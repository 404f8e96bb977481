use log::debug;
use thiserror::Error;
use zeroize::Zeroizing;

use super::{KeyringTokenStore, SecretStore, SecretStoreError};

/// Environment override consulted before the keyring.
pub const TOKEN_ENV: &str = "CERTBIND_TOKEN";

const KEYRING_SERVICE: &str = "certbind";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(
        "no API token for {0}: pass --token, set {TOKEN_ENV}, or run `certbind auth login`"
    )]
    Missing(String),
    #[error("stored token is not utf-8: {0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] SecretStoreError),
}

/// Resolves and manages the API token for a target host.
///
/// Resolution order: explicit value (flag), `CERTBIND_TOKEN`, OS keyring
/// entry for the host. The first hit wins; a present-but-empty source is
/// skipped.
pub struct TokenManager {
    store: Box<dyn SecretStore>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self {
            store: Box::new(KeyringTokenStore::new(KEYRING_SERVICE)),
        }
    }

    pub fn with_store(store: Box<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn resolve(
        &self,
        explicit: Option<&str>,
        host: &str,
    ) -> Result<Zeroizing<String>, TokenError> {
        if let Some(token) = explicit.map(str::trim).filter(|token| !token.is_empty()) {
            debug!("[token] using token from flag");
            return Ok(Zeroizing::new(token.to_string()));
        }

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            let token = token.trim();
            if !token.is_empty() {
                debug!("[token] using token from {TOKEN_ENV}");
                return Ok(Zeroizing::new(token.to_string()));
            }
        }

        match self.store.retrieve(host) {
            Ok(bytes) => {
                debug!("[token] using stored token for {host}");
                let token = String::from_utf8(bytes)
                    .map_err(|err| TokenError::Invalid(err.to_string()))?;
                Ok(Zeroizing::new(token))
            }
            Err(SecretStoreError::NotFound(_)) => Err(TokenError::Missing(host.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    pub fn login(&self, host: &str, token: &str) -> Result<(), TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing(host.to_string()));
        }
        self.store.store(host, token.as_bytes())?;
        Ok(())
    }

    pub fn logout(&self, host: &str) -> Result<(), TokenError> {
        match self.store.delete(host) {
            Ok(()) | Err(SecretStoreError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn has_stored(&self, host: &str) -> Result<bool, TokenError> {
        match self.store.retrieve(host) {
            Ok(_) => Ok(true),
            Err(SecretStoreError::NotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::{TokenError, TokenManager};
    use crate::secrets::{SecretStore, SecretStoreError};

    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl SecretStore for MemoryStore {
        fn store(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn retrieve(&self, key: &str) -> Result<Vec<u8>, SecretStoreError> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| SecretStoreError::NotFound(key.to_string()))
        }

        fn delete(&self, key: &str) -> Result<(), SecretStoreError> {
            self.entries
                .lock()
                .unwrap()
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| SecretStoreError::NotFound(key.to_string()))
        }
    }

    fn manager() -> TokenManager {
        TokenManager::with_store(Box::new(MemoryStore::default()))
    }

    #[test]
    fn explicit_token_wins() {
        let manager = manager();
        manager.login("paas.example.com", "stored").unwrap();
        let token = manager
            .resolve(Some("from-flag"), "paas.example.com")
            .unwrap();
        assert_eq!(token.as_str(), "from-flag");
    }

    #[test]
    fn stored_token_used_when_no_override() {
        let manager = manager();
        manager.login("paas.example.com", "stored").unwrap();
        let token = manager.resolve(None, "paas.example.com").unwrap();
        assert_eq!(token.as_str(), "stored");
    }

    #[test]
    fn missing_token_names_the_host() {
        let manager = manager();
        let err = manager.resolve(None, "paas.example.com").unwrap_err();
        assert!(matches!(err, TokenError::Missing(_)));
        assert!(err.to_string().contains("paas.example.com"));
    }

    #[test]
    fn login_rejects_blank_token() {
        let manager = manager();
        assert!(manager.login("paas.example.com", "   ").is_err());
    }

    #[test]
    fn logout_is_idempotent() {
        let manager = manager();
        manager.login("paas.example.com", "stored").unwrap();
        manager.logout("paas.example.com").unwrap();
        manager.logout("paas.example.com").unwrap();
        assert!(!manager.has_stored("paas.example.com").unwrap());
    }
}
