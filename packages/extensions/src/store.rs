//! Key-value stores backing the `env` namespace.
//!
//! The process environment is global mutable state shared by every
//! interpreter in the process; this crate adds no locking around it. Tests
//! and embedders that need isolation use [`MemoryStore`].

use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, PoisonError};

/// External string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Value for `key`, `None` if unset.
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`.
    ///
    /// # Errors
    /// The store rejects the key or value.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl KeyValueStore for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        // std::env::set_var panics on these instead of returning an error.
        if key.is_empty() || key.contains(['=', '\0']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid environment variable name: {key:?}"),
            ));
        }
        if value.contains('\0') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("environment variable {key} contains a NUL byte"),
            ));
        }
        std::env::set_var(key, value);
        Ok(())
    }
}

/// In-memory store for tests and sandboxed interpreters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
