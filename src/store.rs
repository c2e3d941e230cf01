//! # Credential Store
//!
//! Holds the session issued at login: the JWT plus the profile fields
//! returned alongside it. Persisted as JSON at `~/.readpick/auth.json`.
//!
//! The request pipeline only ever sees the [`CredentialSource`] side of a
//! store; login and logout flows own the writes.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::api::types::UserInfoDto;

/// Synchronous read access to the current bearer token.
pub trait CredentialSource: Send + Sync {
    fn get(&self) -> Option<String>;
}

impl<T: CredentialSource + ?Sized> CredentialSource for Arc<T> {
    fn get(&self) -> Option<String> {
        (**self).get()
    }
}

/// Everything saved on login.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StoredSession {
    pub token: Option<String>,
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub role: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    fn user_info(&self) -> Option<UserInfoDto> {
        match (&self.email, &self.name) {
            (Some(email), Some(name)) => Some(UserInfoDto {
                name: name.clone(),
                email: email.clone(),
                profile_image_url: self.picture.clone(),
            }),
            _ => None,
        }
    }
}

/// Profile fields written next to the token.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub role: String,
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serialize(serde_json::Error),
    Poisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "token store I/O error: {e}"),
            StoreError::Serialize(e) => write!(f, "token store encoding error: {e}"),
            StoreError::Poisoned => write!(f, "token store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Write-side operations shared by both store flavours.
pub trait TokenStore: CredentialSource {
    fn load(&self) -> StoredSession;
    fn store(&self, session: StoredSession) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;

    fn save_token(&self, token: &str) -> Result<(), StoreError> {
        let mut session = self.load();
        session.token = Some(token.to_string());
        session.saved_at = Some(Utc::now());
        self.store(session)
    }

    fn save_user_info(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let mut session = self.load();
        session.user_id = Some(profile.user_id);
        session.email = Some(profile.email.clone());
        session.name = Some(profile.name.clone());
        // Missing picture keeps whatever was stored before.
        if let Some(picture) = &profile.picture {
            session.picture = Some(picture.clone());
        }
        session.role = Some(profile.role.clone());
        self.store(session)
    }

    /// `None` unless both email and name are stored.
    fn user_info(&self) -> Option<UserInfoDto> {
        self.load().user_info()
    }

    fn is_logged_in(&self) -> bool {
        self.load().token.is_some()
    }
}

// ============================================================================
// File-backed store
// ============================================================================

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.readpick/auth.json`, if a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".readpick").join("auth.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data).map_err(StoreError::Serialize)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl CredentialSource for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.load().token
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> StoredSession {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return StoredSession::default(),
            Err(e) => {
                warn!("Failed to read token store {}: {}", self.path.display(), e);
                return StoredSession::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(session) => session,
            Err(e) => {
                warn!("Malformed token store {}: {}", self.path.display(), e);
                StoredSession::default()
            }
        }
    }

    fn store(&self, session: StoredSession) -> Result<(), StoreError> {
        atomic_write_json(&self.path, &session)?;
        debug!("Token store written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Token store cleared: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Default)]
pub struct MemoryTokenStore {
    session: RwLock<StoredSession>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            session: RwLock::new(StoredSession {
                token: Some(token.to_string()),
                ..Default::default()
            }),
        }
    }
}

impl CredentialSource for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.load().token
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> StoredSession {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(_) => StoredSession::default(),
        }
    }

    fn store(&self, session: StoredSession) -> Result<(), StoreError> {
        let mut guard = self.session.write().map_err(|_| StoreError::Poisoned)?;
        *guard = session;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.store(StoredSession::default())
    }
}
