use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Thread-safe set of keys that were already attempted during this run.
///
/// Engines use it to skip work another engine has done or is doing. It is
/// never pruned; its lifetime is the scraper's.
#[derive(Debug, Default)]
pub struct ProtectedSet {
    keys: Mutex<HashSet<String>>,
}

impl ProtectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` was seen before. A key seen for the first time is
    /// recorded, so exactly one caller ever gets `false` for it.
    pub fn exists(&self, key: &str) -> bool {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if keys.contains(key) {
            return true;
        }
        keys.insert(key.to_string());
        false
    }

    /// Forget `key`, so the next `exists` for it returns `false` again.
    pub fn remove(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
