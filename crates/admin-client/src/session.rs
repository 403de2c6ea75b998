//! Process-wide bearer credential storage.
//!
//! The store holds at most one credential, lazily read from a persistence
//! backend on first access. Clearing an already-empty store is a no-op with
//! no side effects, so the forced-logout path can fire unconditionally.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Authentication state, fully determined by credential presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// Persistence backend for the session credential.
///
/// Backends are best-effort: persistence failures are logged and swallowed
/// so a read-only config directory degrades to an in-memory session instead
/// of failing every request.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, token: &str);
    fn remove(&self);
}

/// Stores the credential as a single file under a well-known path.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_owned())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read session token");
                None
            }
        }
    }

    fn store(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&self.path, token) {
            warn!(path = %self.path.display(), error = %e, "failed to persist session token");
        }
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove session token");
            }
        }
    }
}

/// In-memory backend, used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn store(&self, token: &str) {
        *self.token.lock() = Some(token.to_owned());
    }

    fn remove(&self) {
        *self.token.lock() = None;
    }
}

struct SessionInner {
    token: Option<String>,
    loaded: bool,
}

/// Shared holder of the current bearer credential.
pub struct SessionStore {
    inner: RwLock<SessionInner>,
    storage: Option<Box<dyn TokenStorage>>,
    state_tx: watch::Sender<AuthState>,
}

impl SessionStore {
    pub fn new<S: TokenStorage + 'static>(storage: S) -> Arc<Self> {
        Self::build(Some(Box::new(storage)))
    }

    /// Store without a persistence backend; the credential lives only as
    /// long as the process.
    pub fn in_memory() -> Arc<Self> {
        Self::build(None)
    }

    fn build(storage: Option<Box<dyn TokenStorage>>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(AuthState::Unauthenticated);
        Arc::new(Self {
            inner: RwLock::new(SessionInner {
                token: None,
                loaded: false,
            }),
            storage,
            state_tx,
        })
    }

    fn load_if_needed(&self, inner: &mut SessionInner) {
        if inner.loaded {
            return;
        }
        inner.token = self.storage.as_ref().and_then(|s| s.load());
        inner.loaded = true;
        if inner.token.is_some() {
            self.state_tx.send_replace(AuthState::Authenticated);
            debug!("session credential restored from storage");
        }
    }

    /// Current credential, reading the backend on first access.
    pub fn get(&self) -> Option<String> {
        {
            let inner = self.inner.read();
            if inner.loaded {
                return inner.token.clone();
            }
        }
        let mut inner = self.inner.write();
        self.load_if_needed(&mut inner);
        inner.token.clone()
    }

    /// Replace the credential wholesale and persist it.
    pub fn set<S: Into<String>>(&self, token: S) {
        let token = token.into();
        {
            let mut inner = self.inner.write();
            inner.token = Some(token.clone());
            inner.loaded = true;
        }
        if let Some(storage) = &self.storage {
            storage.store(&token);
        }
        self.state_tx.send_replace(AuthState::Authenticated);
        debug!("session credential stored");
    }

    /// Drop the credential. Idempotent; a clear on an empty store touches
    /// neither the backend nor the state channel.
    pub fn clear(&self) {
        let had_token = {
            let mut inner = self.inner.write();
            self.load_if_needed(&mut inner);
            inner.token.take().is_some()
        };
        if !had_token {
            return;
        }
        if let Some(storage) = &self.storage {
            storage.remove();
        }
        self.state_tx.send_replace(AuthState::Unauthenticated);
        debug!("session credential cleared");
    }

    pub fn state(&self) -> AuthState {
        if self.get().is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Watch authentication transitions (login, logout, forced expiry).
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_then_clear() {
        let store = SessionStore::in_memory();
        assert_eq!(store.get(), None);
        assert_eq!(store.state(), AuthState::Unauthenticated);

        store.set("tok-123");
        assert_eq!(store.get().as_deref(), Some("tok-123"));
        assert_eq!(store.state(), AuthState::Authenticated);

        store.clear();
        assert_eq!(store.get(), None);
        assert_eq!(store.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::in_memory();
        store.clear();
        store.clear();
        assert_eq!(store.get(), None);

        store.set("tok");
        store.clear();
        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn lazy_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.token");
        std::fs::write(&path, "persisted-token\n").unwrap();

        let store = SessionStore::new(FileTokenStorage::new(&path));
        assert_eq!(store.get().as_deref(), Some("persisted-token"));
        assert_eq!(store.state(), AuthState::Authenticated);
    }

    #[test]
    fn clear_removes_persisted_token_even_before_first_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.token");
        std::fs::write(&path, "stale").unwrap();

        let store = SessionStore::new(FileTokenStorage::new(&path));
        store.clear();
        assert!(!path.exists());
        assert_eq!(store.get(), None);
    }

    #[test]
    fn set_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.token");

        let store = SessionStore::new(FileTokenStorage::new(&path));
        store.set("fresh");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");

        // A second store instance sees the persisted credential.
        let other = SessionStore::new(FileTokenStorage::new(&path));
        assert_eq!(other.get().as_deref(), Some("fresh"));
    }

    #[test]
    fn subscribe_observes_transitions() {
        let store = SessionStore::in_memory();
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), AuthState::Unauthenticated);

        store.set("tok");
        assert_eq!(*rx.borrow(), AuthState::Authenticated);

        store.clear();
        assert_eq!(*rx.borrow(), AuthState::Unauthenticated);
    }

    #[test]
    fn empty_token_file_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.token");
        std::fs::write(&path, "  \n").unwrap();

        let store = SessionStore::new(FileTokenStorage::new(&path));
        assert_eq!(store.get(), None);
    }
}
