//! The single persisted credential: the RapidAPI key.
//!
//! Read once at startup; written or cleared only by an explicit `key`
//! subcommand. `FAREFINDER_API_KEY` overrides the key file for
//! non-interactive use.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

pub const KEY_ENV: &str = "FAREFINDER_API_KEY";
const CONFIG_DIR_ENV: &str = "FAREFINDER_CONFIG_DIR";
const KEY_FILE: &str = "api_key";

#[derive(Debug, Default)]
pub struct Settings {
    pub api_key: Option<String>,
}

impl Settings {
    pub fn load() -> Self {
        if let Ok(key) = env::var(KEY_ENV) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Settings { api_key: Some(key) };
            }
        }
        let api_key = match fs::read_to_string(key_path()) {
            Ok(contents) => {
                let key = contents.trim().to_string();
                (!key.is_empty()).then_some(key)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("failed to read key file: {e}");
                None
            }
        };
        Settings { api_key }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

pub fn store_key(key: &str) -> Result<PathBuf> {
    let path = key_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, key.trim()).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn clear_key() -> Result<()> {
    let path = key_path();
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context(format!("removing {}", path.display())),
    }
}

pub fn key_path() -> PathBuf {
    config_dir().join(KEY_FILE)
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(dir).join("farefinder");
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join("farefinder")
}

#[cfg(test)]
mod tests {
    use super::*;

    // One sequential test: the env vars are process-global.
    #[test]
    fn store_load_clear_round_trip() {
        let dir = env::temp_dir().join(format!("farefinder-test-{}", std::process::id()));
        unsafe {
            env::set_var(CONFIG_DIR_ENV, &dir);
            env::remove_var(KEY_ENV);
        }

        clear_key().unwrap();
        assert!(!Settings::load().has_key());

        let path = store_key("  secret-key \n").unwrap();
        assert_eq!(path, dir.join(KEY_FILE));
        assert_eq!(Settings::load().api_key.as_deref(), Some("secret-key"));

        // the environment override wins over the key file
        unsafe {
            env::set_var(KEY_ENV, "env-key");
        }
        assert_eq!(Settings::load().api_key.as_deref(), Some("env-key"));
        unsafe {
            env::remove_var(KEY_ENV);
        }

        clear_key().unwrap();
        assert!(!Settings::load().has_key());
        let _ = fs::remove_dir_all(&dir);
    }
}
