//! Handled-key registry: the dedup checkpoint.
//!
//! A key enters this set exactly once, when it leaves `Pending`. Concurrent
//! duplicate deliveries serialize on the lock inside [`HandledKeys::mark_if_new`]
//! so at most one proceeds. The durable variant writes the set through to a
//! JSON file so dedup survives process restarts.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

#[derive(Debug)]
pub struct HandledKeys {
    keys: Mutex<HashSet<String>>,
    path: Option<PathBuf>,
}

impl HandledKeys {
    /// Process-lifetime registry.
    pub fn in_memory() -> Self {
        Self {
            keys: Mutex::new(HashSet::new()),
            path: None,
        }
    }

    /// Durable registry backed by a JSON array at `path`; loads existing
    /// contents if the file is present.
    pub fn durable(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let keys: HashSet<String> = if path.exists() {
            let s = fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s)
                .with_context(|| format!("parse {}", path.display()))?
        } else {
            HashSet::new()
        };
        Ok(Self {
            keys: Mutex::new(keys),
            path: Some(path),
        })
    }

    /// Atomic check-and-mark. Returns true when the key was new and is now
    /// marked handled; false when it had already been handled.
    pub fn mark_if_new(&self, key: &str) -> bool {
        let mut keys = self.keys.lock().expect("handled keys lock");
        if !keys.insert(key.to_string()) {
            return false;
        }
        if let Some(path) = &self.path {
            // Write-through while holding the lock, so the file never races
            // behind the set.
            match serde_json::to_string_pretty(&*keys) {
                Ok(json) => {
                    if let Err(e) = fs::write(path, json) {
                        warn!(path = %path.display(), error = %e, "persist handled keys failed");
                    }
                }
                Err(e) => warn!(error = %e, "serialize handled keys failed"),
            }
        }
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().expect("handled keys lock").contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().expect("handled keys lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_if_new_is_once_only() {
        let h = HandledKeys::in_memory();
        assert!(h.mark_if_new("k1"));
        assert!(!h.mark_if_new("k1"));
        assert!(h.mark_if_new("k2"));
        assert!(h.contains("k1"));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_durable_registry_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handled_keys.json");
        {
            let h = HandledKeys::durable(&path).unwrap();
            assert!(h.mark_if_new("abc"));
        }
        let h = HandledKeys::durable(&path).unwrap();
        assert!(!h.mark_if_new("abc"));
        assert!(h.mark_if_new("def"));
    }

    #[test]
    fn test_concurrent_marks_admit_exactly_one() {
        use std::sync::Arc;
        let h = Arc::new(HandledKeys::in_memory());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let h = Arc::clone(&h);
            handles.push(std::thread::spawn(move || h.mark_if_new("same-key")));
        }
        let wins: usize = handles
            .into_iter()
            .map(|t| t.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
    }
}
