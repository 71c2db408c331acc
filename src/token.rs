use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

/// File-backed slot for the bearer token.
///
/// The token is treated as an opaque string; nothing here inspects or
/// validates it. An absent or empty file means "logged out". The store is
/// cloned into whoever needs it rather than living in a global, so request
/// construction stays testable.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store at the well-known location under the user's config directory.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(Self {
            path: config_dir.join("chatbot-cli").join("token"),
        })
    }

    /// Store at an explicit path.
    #[cfg(test)]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Overwrite the persisted token.
    pub fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    /// Current token, or `None` if never set or cleared.
    pub fn read(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    /// Remove the token. Clearing an absent token is a no-op.
    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, TokenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        (dir, store)
    }

    #[test]
    fn read_absent_token_is_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn save_then_read_round_trips() {
        let (_dir, store) = temp_store();
        store.save("T1").unwrap();
        assert_eq!(store.read(), Some("T1".to_string()));

        // save overwrites
        store.save("T2").unwrap();
        assert_eq!(store.read(), Some("T2".to_string()));
    }

    #[test]
    fn clear_removes_token_and_is_idempotent() {
        let (_dir, store) = temp_store();
        store.save("T1").unwrap();
        store.clear();
        assert_eq!(store.read(), None);
        store.clear();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn empty_file_reads_as_absent() {
        let (_dir, store) = temp_store();
        store.save("").unwrap();
        assert_eq!(store.read(), None);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("nested").join("token"));
        store.save("T1").unwrap();
        assert_eq!(store.read(), Some("T1".to_string()));
    }
}
