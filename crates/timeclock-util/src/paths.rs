//! Default paths for timeclockd components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/timeclock/config.toml` or `~/.config/timeclock/config.toml`
//! - Socket: `$XDG_RUNTIME_DIR/timeclock/timeclockd.sock` or `/tmp/timeclock-$USER/timeclockd.sock`
//! - Data: `$XDG_DATA_HOME/timeclock` or `~/.local/share/timeclock`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const TIMECLOCK_SOCKET_ENV: &str = "TIMECLOCK_SOCKET";

/// Environment variable for overriding the data directory
pub const TIMECLOCK_DATA_DIR_ENV: &str = "TIMECLOCK_DATA_DIR";

const SOCKET_FILENAME: &str = "timeclockd.sock";
const CONFIG_FILENAME: &str = "config.toml";
const CREDENTIALS_FILENAME: &str = "credentials.toml";
const ACCOUNT_FILENAME: &str = "account.toml";

/// Application subdirectory name
const APP_DIR: &str = "timeclock";

fn home_subdir(parts: &[&str]) -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let mut path = PathBuf::from(home);
    for part in parts {
        path.push(part);
    }
    Some(path.join(APP_DIR))
}

/// Get the default configuration file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    home_subdir(&[".config"])
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR))
        .join(CONFIG_FILENAME)
}

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$TIMECLOCK_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/timeclock/timeclockd.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/timeclock-$USER/timeclockd.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(TIMECLOCK_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking TIMECLOCK_SOCKET env var.
/// Used for default values in configs where the env var is checked separately.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$TIMECLOCK_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/timeclock` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/timeclock` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(TIMECLOCK_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking TIMECLOCK_DATA_DIR env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    home_subdir(&[".local", "share"])
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_DIR).join("data"))
}

/// Credentials file inside a data directory
pub fn credentials_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(CREDENTIALS_FILENAME)
}

/// Account file (email only) used alongside the OS keyring
pub fn account_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(ACCOUNT_FILENAME)
}
