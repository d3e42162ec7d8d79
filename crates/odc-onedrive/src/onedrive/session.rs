//! Session token storage and the authentication context.
//!
//! The token lives in two places: an [`AuthContext`] owned by the console
//! and passed to every authorized call, and a [`SessionStore`] that keeps
//! it for the rest of the session.  The store holds a single plain-text
//! value; it is not encrypted.

use crate::onedrive::error::{ConsoleError, ConsoleResult};
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Where the session token is kept between operations.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> ConsoleResult<Option<String>>;
    fn save(&self, token: &str) -> ConsoleResult<()>;
    fn clear(&self) -> ConsoleResult<()>;
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn load(&self) -> ConsoleResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, token: &str) -> ConsoleResult<()> {
        (**self).save(token)
    }

    fn clear(&self) -> ConsoleResult<()> {
        (**self).clear()
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn load(&self) -> ConsoleResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, token: &str) -> ConsoleResult<()> {
        (**self).save(token)
    }

    fn clear(&self) -> ConsoleResult<()> {
        (**self).clear()
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Stores
// ═══════════════════════════════════════════════════════════════════════

/// Process-lifetime store.  The token is gone when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> ConsoleResult<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| ConsoleError::internal("Session store lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ConsoleResult<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &str) -> ConsoleResult<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ConsoleResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}

/// Token kept in a single plain-text file, so separate CLI invocations
/// share one session.  Logging out deletes the file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ConsoleResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> ConsoleResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        debug!("Session token written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> ConsoleResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Auth context
// ═══════════════════════════════════════════════════════════════════════

/// The bearer token the console currently acts with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Context seeded from whatever the store holds.
    pub fn from_store(store: &dyn SessionStore) -> ConsoleResult<Self> {
        Ok(Self::new(store.load()?))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The token, or `NotLoggedIn`.
    pub fn require(&self) -> ConsoleResult<&str> {
        self.token().ok_or_else(ConsoleError::not_logged_in)
    }

    pub fn set(&mut self, token: impl Into<String>) {
        self.token = Some(token.into()).filter(|t| !t.is_empty());
    }

    pub fn clear(&mut self) {
        self.token = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
