//! Key-value persistence for cross-run progress
//!
//! Features:
//! - Backend-agnostic `KeyValueStore` (memory, JSON file, LocalStorage)
//! - One JSON value per key, always written as a full overwrite
//! - Missing or malformed values fall back to safe defaults

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::progress::{CosmeticId, CumulativeState};

pub const KEY_CUMULATIVE_SCORE: &str = "sniffy.cumulative_score";
pub const KEY_RUN_MILESTONES: &str = "sniffy.reached_run_milestones";
pub const KEY_UNLOCKED: &str = "sniffy.unlocked";
pub const KEY_BEST_SCORE: &str = "sniffy.best_score";
pub const KEY_COLLECTION_COMPLETE: &str = "sniffy.collection_complete";
pub const KEY_SELECTED: &str = "sniffy.selected";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("write to '{key}' rejected: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// String key-value storage
pub trait KeyValueStore {
    /// Raw value for `key` (None when absent or unreadable)
    fn get(&self, key: &str) -> Option<String>;
    /// Overwrite `key` with `value`
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Decode the JSON value under `key`, defaulting when absent or malformed
pub fn read_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Ignoring malformed value for '{}': {}", key, err);
            T::default()
        }
    }
}

/// Encode `value` as JSON and overwrite `key`
pub fn write_value<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// Load cross-run progress
pub fn load_progress<S: KeyValueStore + ?Sized>(store: &S) -> CumulativeState {
    let unlocked: Vec<String> = read_or_default(store, KEY_UNLOCKED);
    let selected: String = read_or_default(store, KEY_SELECTED);
    let mut progress = CumulativeState {
        cumulative_score: read_or_default(store, KEY_CUMULATIVE_SCORE),
        reached_run_milestones: read_or_default(store, KEY_RUN_MILESTONES),
        // Unknown keys (retired cosmetics) are dropped rather than failing the whole set
        unlocked: unlocked
            .iter()
            .filter_map(|key| CosmeticId::from_key(key))
            .collect::<BTreeSet<_>>(),
        best_score: read_or_default(store, KEY_BEST_SCORE),
        collection_complete: read_or_default(store, KEY_COLLECTION_COMPLETE),
        selected: CosmeticId::from_key(&selected).unwrap_or_default(),
    };
    progress.normalize();
    log::info!(
        "Loaded progress: cumulative={} best={} unlocked={}",
        progress.cumulative_score,
        progress.best_score,
        progress.unlocked.len()
    );
    progress
}

/// Write every progress field
pub fn save_progress<S: KeyValueStore + ?Sized>(
    store: &mut S,
    progress: &CumulativeState,
) -> Result<(), StoreError> {
    let unlocked: Vec<&str> = progress.unlocked.iter().map(|id| id.key()).collect();
    write_value(store, KEY_CUMULATIVE_SCORE, &progress.cumulative_score)?;
    write_value(store, KEY_RUN_MILESTONES, &progress.reached_run_milestones)?;
    write_value(store, KEY_UNLOCKED, &unlocked)?;
    write_value(store, KEY_BEST_SCORE, &progress.best_score)?;
    write_value(store, KEY_COLLECTION_COMPLETE, &progress.collection_complete)?;
    write_value(store, KEY_SELECTED, progress.selected.key())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_progress(&store), CumulativeState::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut progress = CumulativeState {
            cumulative_score: 420,
            best_score: 77,
            collection_complete: true,
            ..Default::default()
        };
        progress.reached_run_milestones.extend([1, 100]);
        progress.unlock(CosmeticId::Karat24);
        progress.selected = CosmeticId::Karat24;
        save_progress(&mut store, &progress).unwrap();
        assert_eq!(store.get(KEY_SELECTED).as_deref(), Some("\"24k\""));
        assert_eq!(load_progress(&store), progress);
    }

    #[test]
    fn test_malformed_values_default_individually() {
        let mut store = MemoryStore::new();
        store.set(KEY_CUMULATIVE_SCORE, "lots").unwrap();
        store.set(KEY_BEST_SCORE, "12").unwrap();
        store.set(KEY_UNLOCKED, r#"["robo", "dragon"]"#).unwrap();
        store.set(KEY_SELECTED, r#""dragon""#).unwrap();
        store.set(KEY_RUN_MILESTONES, "{").unwrap();
        let progress = load_progress(&store);
        assert_eq!(progress.cumulative_score, 0);
        assert_eq!(progress.best_score, 12);
        assert!(progress.reached_run_milestones.is_empty());
        assert!(progress.is_unlocked(CosmeticId::Robo));
        assert!(progress.is_unlocked(CosmeticId::Classic));
        assert_eq!(progress.selected, CosmeticId::Classic);
    }

    #[test]
    fn test_writes_overwrite() {
        let mut store = MemoryStore::new();
        write_value(&mut store, KEY_BEST_SCORE, &10u64).unwrap();
        write_value(&mut store, KEY_BEST_SCORE, &3u64).unwrap();
        assert_eq!(read_or_default::<u64, _>(&store, KEY_BEST_SCORE), 3);
        assert_eq!(store.len(), 1);
    }
}
