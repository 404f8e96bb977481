use keyring::Entry;

use super::{SecretStore, SecretStoreError};

/// OS-backed token storage using the `keyring` crate (Keychain/Credential
/// Manager/Secret Service). Keys are target host names.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, SecretStoreError> {
        Entry::new(&self.service, key).map_err(|err| self.map_error(key, err))
    }

    fn map_error(&self, key: &str, err: keyring::Error) -> SecretStoreError {
        let msg = err.to_string();
        let lowered = msg.to_lowercase();
        if lowered.contains("no entry") || lowered.contains("no password") {
            SecretStoreError::NotFound(key.to_string())
        } else if lowered.contains("no backend") || lowered.contains("unsupported") {
            SecretStoreError::Unavailable(msg)
        } else {
            SecretStoreError::Store(msg)
        }
    }
}

impl SecretStore for KeyringTokenStore {
    fn store(&self, key: &str, value: &[u8]) -> Result<(), SecretStoreError> {
        let token = std::str::from_utf8(value)
            .map_err(|err| SecretStoreError::Store(format!("token is not utf-8: {err}")))?;
        self.entry(key)?
            .set_password(token)
            .map_err(|err| self.map_error(key, err))
    }

    fn retrieve(&self, key: &str) -> Result<Vec<u8>, SecretStoreError> {
        let token = self
            .entry(key)?
            .get_password()
            .map_err(|err| self.map_error(key, err))?;
        Ok(token.into_bytes())
    }

    fn delete(&self, key: &str) -> Result<(), SecretStoreError> {
        self.entry(key)?
            .delete_password()
            .map_err(|err| self.map_error(key, err))
    }
}
