//! Per-counterparty category memory.
//!
//! A key-value store from normalized title text to the category the user last
//! confirmed for it. Consulted before showing suggestions, overwritten on
//! every confirmation, never expires. Injected into the workflow as a trait
//! so tests run against the in-memory implementation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

const KEY_MAX_CHARS: usize = 80;

/// Normalize a title/receiver into a store key: trimmed, lowercased,
/// whitespace collapsed, length capped.
pub fn normalize_title(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(KEY_MAX_CHARS)
        .collect()
}

/// Key-value category store. Each call is a single atomic operation; no
/// multi-key transactions.
pub trait CategoryStore: Send + Sync {
    fn get(&self, title: &str) -> Option<String>;
    /// Create or overwrite the remembered category for a title. Failures are
    /// the store's to log; the confirmation transition never blocks on them.
    fn put(&self, title: &str, category: &str);
}

impl<T: CategoryStore> CategoryStore for &T {
    fn get(&self, title: &str) -> Option<String> {
        (**self).get(title)
    }

    fn put(&self, title: &str, category: &str) {
        (**self).put(title, category)
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCategoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CategoryStore for MemoryCategoryStore {
    fn get(&self, title: &str) -> Option<String> {
        let map = self.map.lock().expect("category map lock");
        map.get(&normalize_title(title)).cloned()
    }

    fn put(&self, title: &str, category: &str) {
        let mut map = self.map.lock().expect("category map lock");
        map.insert(normalize_title(title), category.to_string());
    }
}

/// Durable store: one JSON object on disk, written through on every put.
#[derive(Debug)]
pub struct FileCategoryStore {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileCategoryStore {
    /// Open (or start empty at) the given path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let map = if path.exists() {
            let s = fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s)
                .with_context(|| format!("parse {}", path.display()))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of all entries, for display.
    pub fn entries(&self) -> Vec<(String, String)> {
        let map = self.map.lock().expect("category map lock");
        let mut out: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        out.sort();
        out
    }

    fn persist(&self, map: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(map) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "serialize category memory failed");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            warn!(path = %self.path.display(), error = %e, "write category memory failed");
        }
    }
}

impl CategoryStore for FileCategoryStore {
    fn get(&self, title: &str) -> Option<String> {
        let map = self.map.lock().expect("category map lock");
        map.get(&normalize_title(title)).cloned()
    }

    fn put(&self, title: &str, category: &str) {
        let mut map = self.map.lock().expect("category map lock");
        map.insert(normalize_title(title), category.to_string());
        self.persist(&map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Acme   Store  "), "acme store");
        let long = "x".repeat(200);
        assert_eq!(normalize_title(&long).chars().count(), KEY_MAX_CHARS);
    }

    #[test]
    fn test_memory_store_roundtrip_and_overwrite() {
        let store = MemoryCategoryStore::new();
        assert_eq!(store.get("Acme Store"), None);
        store.put("Acme Store", "Shopping");
        // Lookup is normalization-insensitive.
        assert_eq!(store.get("  acme   store "), Some("Shopping".to_string()));
        store.put("ACME STORE", "Grocery");
        assert_eq!(store.get("Acme Store"), Some("Grocery".to_string()));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("category_memory.json");
        {
            let store = FileCategoryStore::open(&path).unwrap();
            store.put("Sharma Store", "Grocery");
        }
        let store = FileCategoryStore::open(&path).unwrap();
        assert_eq!(store.get("sharma store"), Some("Grocery".to_string()));
        assert_eq!(store.entries().len(), 1);
    }
}
