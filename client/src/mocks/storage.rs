//! In-memory token storage.

use crate::credential::Credential;
use crate::error::{ClientError, Result};
use crate::providers::TokenStorage;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Token storage held in memory.
///
/// Clones share the same slot, so a test can inspect what the session
/// persisted. Writes can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStorage {
    token: Arc<Mutex<Option<Credential>>>,
    fail_writes: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
    clears: Arc<AtomicUsize>,
}

impl MemoryTokenStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage already holding `credential`, as after a previous run.
    #[must_use]
    pub fn with_token(credential: Credential) -> Self {
        let storage = Self::default();
        *storage.slot() = Some(credential);
        storage
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The persisted token.
    #[must_use]
    pub fn token(&self) -> Option<Credential> {
        self.slot().clone()
    }

    /// Make `save` and `clear` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `save` calls.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of `clear` calls.
    #[must_use]
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Storage("disk full".to_string()));
        }
        Ok(())
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> impl Future<Output = Result<Option<Credential>>> + Send {
        let token = self.token();
        async move { Ok(token) }
    }

    fn save(&self, credential: &Credential) -> impl Future<Output = Result<()>> + Send {
        self.saves.fetch_add(1, Ordering::SeqCst);
        let result = self.check_writable().map(|()| {
            *self.slot() = Some(credential.clone());
        });
        async move { result }
    }

    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        self.clears.fetch_add(1, Ordering::SeqCst);
        let result = self.check_writable().map(|()| {
            *self.slot() = None;
        });
        async move { result }
    }
}
