//! Persistent Key-Value Storage
//!
//! Small storage seam used for per-station EQ settings and the custom
//! station list. The file-backed store keeps everything in one JSON
//! document per namespace.
//!
//! # Storage Locations
//! - Linux: `~/.config/rewind/<namespace>.json`
//! - Windows: `%APPDATA%\rewind\<namespace>.json`
//! - macOS: `~/Library/Application Support/rewind/<namespace>.json`

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde_json::Value;
use tracing::{error, info};

use crate::error::{PlayerError, PlayerResult};

/// Simple persistent key-value store
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> PlayerResult<()>;
    fn remove(&mut self, key: &str) -> PlayerResult<()>;
    fn keys(&self) -> Vec<String>;
}

/// In-memory store used by tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> PlayerResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PlayerResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// File-backed store, one JSON document per namespace
pub struct JsonFileStore {
    path: Option<PathBuf>,
    entries: HashMap<String, Value>,
}

impl JsonFileStore {
    /// Open (or create) the store for a namespace like "equalizer" or
    /// "stations". Missing or corrupt files load as empty.
    pub fn open(namespace: &str) -> Self {
        let path = Self::store_path(namespace);
        let entries = match &path {
            Some(p) if p.exists() => match fs::read_to_string(p) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(map) => {
                        info!("Loaded store {:?}", p);
                        map
                    }
                    Err(e) => {
                        error!("Failed to parse store file {:?}: {}", p, e);
                        HashMap::new()
                    }
                },
                Err(e) => {
                    error!("Failed to read store file {:?}: {}", p, e);
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        };

        Self { path, entries }
    }

    fn store_path(namespace: &str) -> Option<PathBuf> {
        ProjectDirs::from("com", "rewind", "rewind")
            .map(|proj| proj.config_dir().join(format!("{}.json", namespace)))
    }

    fn persist(&self) -> PlayerResult<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| PlayerError::StorageError("No config directory available".into()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PlayerError::StorageError(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| PlayerError::StorageError(e.to_string()))?;
        fs::write(path, contents).map_err(|e| PlayerError::StorageError(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> PlayerResult<()> {
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    fn remove(&mut self, key: &str) -> PlayerResult<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
