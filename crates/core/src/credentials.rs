//! Credential Storage
//!
//! The API key is held behind a narrow read/write interface and handed to
//! whatever builds the lesson generator, instead of being read from ambient
//! global state.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Name under which the API key is stored.
pub const API_KEY_ENTRY: &str = "ai_api_key";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("API key must not be empty")]
    EmptyKey,
    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Credential store is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable storage for the AI API key.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored key, if any.
    fn load(&self) -> Result<Option<String>, CredentialError>;

    /// Stores `api_key` after trimming it. Blank keys are rejected.
    fn store(&self, api_key: &str) -> Result<(), CredentialError>;

    /// Removes the stored key. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), CredentialError>;
}

fn clean_key(api_key: &str) -> Result<String, CredentialError> {
    let trimmed = api_key.trim();
    if trimmed.is_empty() {
        return Err(CredentialError::EmptyKey);
    }
    Ok(trimmed.to_string())
}

/// Keeps credentials in a small JSON object on disk, keyed by entry name.
///
/// Entries other than [`API_KEY_ENTRY`] are preserved on write.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten files that already existed.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(contents.as_bytes())?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        let mut entries = self.read_entries()?;
        Ok(entries
            .remove(API_KEY_ENTRY)
            .filter(|key| !key.trim().is_empty()))
    }

    fn store(&self, api_key: &str) -> Result<(), CredentialError> {
        let key = clean_key(api_key)?;
        let mut entries = self.read_entries()?;
        entries.insert(API_KEY_ENTRY.to_string(), key);
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "API key stored");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut entries = self.read_entries()?;
        if entries.remove(API_KEY_ENTRY).is_some() {
            self.write_entries(&entries)?;
            debug!(path = %self.path.display(), "API key cleared");
        }
        Ok(())
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    key: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(api_key: &str) -> Result<Self, CredentialError> {
        Ok(Self {
            key: RwLock::new(Some(clean_key(api_key)?)),
        })
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, CredentialError> {
        let key = self.key.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(key.clone())
    }

    fn store(&self, api_key: &str) -> Result<(), CredentialError> {
        let key = clean_key(api_key)?;
        *self.key.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.key.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// Masks a key for display, keeping only its last four characters.
pub fn mask_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
