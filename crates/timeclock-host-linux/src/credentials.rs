//! File-backed credential store
//!
//! Credentials are kept as TOML in the data directory, readable only by the
//! owning user.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use timeclock_host_api::{CredentialStore, HostError, HostResult};
use tracing::{debug, info, warn};

const FILE_MODE: u32 = 0o600;

/// Atomically replace `path` with `content`, readable by the owner only
pub(crate) fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("toml.tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(FILE_MODE)
        .open(&tmp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::set_permissions(&tmp, fs::Permissions::from_mode(FILE_MODE))?;
    fs::rename(&tmp, path)
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    email: String,
    password: String,
}

/// [`CredentialStore`] persisted at a single TOML file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `credentials.toml` inside `data_dir`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(timeclock_util::credentials_path(data_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Option<StoredCredentials> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read credentials");
                return None;
            }
        };

        if let Ok(meta) = fs::metadata(&self.path)
            && meta.permissions().mode() & 0o077 != 0
        {
            warn!(path = %self.path.display(), "Credentials file is readable by other users");
        }

        match toml::from_str(&content) {
            Ok(creds) => Some(creds),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed credentials file");
                None
            }
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get_email(&self) -> Option<String> {
        self.load()
            .map(|c| c.email)
            .filter(|email| !email.is_empty())
    }

    fn get_password(&self, email: &str) -> Option<String> {
        self.load()
            .filter(|c| c.email == email)
            .map(|c| c.password)
    }

    fn set_credentials(&self, email: &str, password: &str) -> HostResult<()> {
        let content = toml::to_string(&StoredCredentials {
            email: email.to_string(),
            password: password.to_string(),
        })
        .map_err(|e| HostError::CredentialStore(e.to_string()))?;

        write_private(&self.path, &content)?;

        info!(path = %self.path.display(), email = %email, "Credentials saved");
        Ok(())
    }

    fn clear_credentials(&self) -> HostResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Credentials removed");
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
