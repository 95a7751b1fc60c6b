//! OS keyring credential store
//!
//! The password lives in the Secret Service under the `timeclock` service,
//! keyed by email. The email itself is kept in a small private TOML file so
//! it can be read without unlocking the keyring.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use timeclock_host_api::{CredentialStore, HostError, HostResult};
use tracing::{debug, info, warn};

use crate::credentials::write_private;
use crate::FileCredentialStore;

pub const KEYRING_SERVICE: &str = "timeclock";

/// Account looked up to find out whether the keyring answers at all
const AVAILABILITY_ACCOUNT: &str = "timeclockd-availability";

/// Password storage keyed by account name
pub trait SecretVault: Send + Sync {
    fn read(&self, account: &str) -> keyring::Result<String>;
    fn write(&self, account: &str, secret: &str) -> keyring::Result<()>;
    fn erase(&self, account: &str) -> keyring::Result<()>;
}

/// [`SecretVault`] backed by the platform keyring
#[derive(Debug, Clone)]
pub struct OsKeyring {
    service: String,
}

impl OsKeyring {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for OsKeyring {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl SecretVault for OsKeyring {
    fn read(&self, account: &str) -> keyring::Result<String> {
        keyring::Entry::new(&self.service, account)?.get_password()
    }

    fn write(&self, account: &str, secret: &str) -> keyring::Result<()> {
        keyring::Entry::new(&self.service, account)?.set_password(secret)
    }

    fn erase(&self, account: &str) -> keyring::Result<()> {
        keyring::Entry::new(&self.service, account)?.delete_credential()
    }
}

/// Whether a keyring lookup shows a working backend. A missing entry still
/// means the store itself answered.
pub fn keyring_answers(lookup: &keyring::Result<String>) -> bool {
    matches!(lookup, Ok(_) | Err(keyring::Error::NoEntry))
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAccount {
    email: String,
}

/// [`CredentialStore`] with the password in a [`SecretVault`]
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore<V = OsKeyring> {
    vault: V,
    account_path: PathBuf,
}

impl KeyringCredentialStore<OsKeyring> {
    /// Platform keyring, account file inside `data_dir`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::with_vault(OsKeyring::default(), timeclock_util::account_path(data_dir))
    }
}

impl<V: SecretVault> KeyringCredentialStore<V> {
    pub fn with_vault(vault: V, account_path: impl Into<PathBuf>) -> Self {
        Self {
            vault,
            account_path: account_path.into(),
        }
    }

    pub fn account_path(&self) -> &Path {
        &self.account_path
    }

    /// Move credentials out of a plaintext file store. Returns whether
    /// anything was moved.
    pub fn adopt(&self, legacy: &FileCredentialStore) -> HostResult<bool> {
        let Some(creds) = legacy.credentials() else {
            return Ok(false);
        };
        self.set_credentials(&creds.email, creds.password.expose())?;
        legacy.clear_credentials()?;
        info!(from = %legacy.path().display(), "Moved credentials into the keyring");
        Ok(true)
    }

    fn erase_secret(&self, account: &str) -> HostResult<()> {
        match self.vault.erase(account) {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(HostError::CredentialStore(e.to_string())),
        }
    }
}

impl<V: SecretVault> CredentialStore for KeyringCredentialStore<V> {
    fn get_email(&self) -> Option<String> {
        let content = match fs::read_to_string(&self.account_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.account_path.display(), error = %e, "Failed to read account file");
                return None;
            }
        };
        match toml::from_str::<StoredAccount>(&content) {
            Ok(account) => Some(account.email).filter(|email| !email.is_empty()),
            Err(e) => {
                warn!(path = %self.account_path.display(), error = %e, "Malformed account file");
                None
            }
        }
    }

    fn get_password(&self, email: &str) -> Option<String> {
        match self.vault.read(email) {
            Ok(password) => Some(password),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Keyring lookup failed");
                None
            }
        }
    }

    fn set_credentials(&self, email: &str, password: &str) -> HostResult<()> {
        self.vault
            .write(email, password)
            .map_err(|e| HostError::CredentialStore(e.to_string()))?;

        if let Some(previous) = self.get_email().filter(|previous| previous != email) {
            self.erase_secret(&previous)?;
        }

        let content = toml::to_string(&StoredAccount {
            email: email.to_string(),
        })
        .map_err(|e| HostError::CredentialStore(e.to_string()))?;
        write_private(&self.account_path, &content)?;

        info!(email = %email, "Credentials saved to keyring");
        Ok(())
    }

    fn clear_credentials(&self) -> HostResult<()> {
        if let Some(email) = self.get_email() {
            self.erase_secret(&email)?;
        }
        match fs::remove_file(&self.account_path) {
            Ok(()) => {
                info!("Credentials removed from keyring");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credentials to remove");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Keyring-backed store when the platform keyring answers, otherwise the
/// plaintext credential file in `data_dir`
pub fn default_credential_store(data_dir: &Path) -> Arc<dyn CredentialStore> {
    let vault = OsKeyring::default();
    let lookup = vault.read(AVAILABILITY_ACCOUNT);
    let file_store = FileCredentialStore::in_data_dir(data_dir);

    if !keyring_answers(&lookup) {
        if let Err(e) = lookup {
            warn!(error = %e, "OS keyring unavailable, storing credentials in {}", file_store.path().display());
        }
        return Arc::new(file_store);
    }

    let store = KeyringCredentialStore::with_vault(vault, timeclock_util::account_path(data_dir));
    if let Err(e) = store.adopt(&file_store) {
        warn!(error = %e, "Could not move credentials file into the keyring");
    }
    info!("Using OS keyring for credentials");
    Arc::new(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct MemoryVault {
        secrets: Mutex<HashMap<String, String>>,
    }

    impl SecretVault for MemoryVault {
        fn read(&self, account: &str) -> keyring::Result<String> {
            self.secrets
                .lock()
                .unwrap()
                .get(account)
                .cloned()
                .ok_or(keyring::Error::NoEntry)
        }

        fn write(&self, account: &str, secret: &str) -> keyring::Result<()> {
            self.secrets
                .lock()
                .unwrap()
                .insert(account.to_string(), secret.to_string());
            Ok(())
        }

        fn erase(&self, account: &str) -> keyring::Result<()> {
            self.secrets
                .lock()
                .unwrap()
                .remove(account)
                .map(|_| ())
                .ok_or(keyring::Error::NoEntry)
        }
    }

    struct LockedVault;

    fn locked() -> keyring::Error {
        keyring::Error::NoStorageAccess(Box::new(std::io::Error::other("collection is locked")))
    }

    impl SecretVault for LockedVault {
        fn read(&self, _: &str) -> keyring::Result<String> {
            Err(locked())
        }
        fn write(&self, _: &str, _: &str) -> keyring::Result<()> {
            Err(locked())
        }
        fn erase(&self, _: &str) -> keyring::Result<()> {
            Err(locked())
        }
    }

    fn store(dir: &Path) -> KeyringCredentialStore<MemoryVault> {
        KeyringCredentialStore::with_vault(MemoryVault::default(), timeclock_util::account_path(dir))
    }

    #[test]
    fn keyring_availability() {
        assert!(keyring_answers(&Ok("x".into())));
        assert!(keyring_answers(&Err(keyring::Error::NoEntry)));
        assert!(!keyring_answers(&Err(locked())));
        assert!(!keyring_answers(&Err(keyring::Error::PlatformFailure(Box::new(
            std::io::Error::other("no session bus")
        )))));
    }

    #[test]
    fn password_stays_out_of_the_account_file() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.set_credentials("me@example.com", "hunter2").unwrap();

        let creds = store.credentials().unwrap();
        assert_eq!(creds.email, "me@example.com");
        assert_eq!(creds.password.expose(), "hunter2");

        let on_disk = fs::read_to_string(store.account_path()).unwrap();
        assert!(on_disk.contains("me@example.com"));
        assert!(!on_disk.contains("hunter2"));
    }

    #[test]
    fn changing_email_erases_old_secret() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.set_credentials("old@example.com", "one").unwrap();
        store.set_credentials("new@example.com", "two").unwrap();

        assert_eq!(store.get_email().as_deref(), Some("new@example.com"));
        assert_eq!(store.get_password("old@example.com"), None);
        assert_eq!(store.get_password("new@example.com").as_deref(), Some("two"));
    }

    #[test]
    fn clear_removes_secret_and_account() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.set_credentials("me@example.com", "hunter2").unwrap();
        store.clear_credentials().unwrap();

        assert!(!store.has_credentials());
        assert_eq!(store.get_password("me@example.com"), None);
        assert!(!store.account_path().exists());
        store.clear_credentials().unwrap();
    }

    #[test]
    fn locked_keyring_write_is_an_error() {
        let dir = tempdir().unwrap();
        let store =
            KeyringCredentialStore::with_vault(LockedVault, timeclock_util::account_path(dir.path()));

        let err = store.set_credentials("me@example.com", "hunter2").unwrap_err();
        assert!(matches!(err, HostError::CredentialStore(_)));
        assert!(!store.account_path().exists());
        assert_eq!(store.get_password("me@example.com"), None);
    }

    #[test]
    fn adopt_moves_plaintext_credentials() {
        let dir = tempdir().unwrap();
        let legacy = FileCredentialStore::in_data_dir(dir.path());
        legacy.set_credentials("me@example.com", "hunter2").unwrap();

        let store = store(dir.path());
        assert!(store.adopt(&legacy).unwrap());

        assert!(!legacy.has_credentials());
        assert!(!legacy.path().exists());
        assert_eq!(store.get_password("me@example.com").as_deref(), Some("hunter2"));
        assert!(!store.adopt(&legacy).unwrap());
    }
}
