//! Station Registry
//!
//! The list of playable stations: a fixed set of built-in stations plus
//! user-added custom streams persisted across sessions. Two built-ins
//! are known to refuse external connections and carry a fixed error
//! message instead of being playable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::{PlayerError, PlayerResult};
use crate::store::KeyValueStore;

/// A playable (or known-broken) station
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Stable identifier, used in commands and as the EQ settings key
    pub id: String,

    /// Display name
    pub name: String,

    /// Stream URL
    pub url: String,

    /// Whether this is a user-added station
    pub custom: bool,

    /// Fixed error for stations that refuse external connections.
    /// Selecting such a station shows the message; playing it fails.
    pub known_error: Option<String>,

    /// When a custom station was added
    pub added_at: Option<DateTime<Utc>>,
}

/// Built-in station list
pub fn builtin_streams() -> Vec<StreamDescriptor> {
    let builtin = |id: &str, name: &str, url: &str, known_error: Option<&str>| StreamDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        custom: false,
        known_error: known_error.map(|e| e.to_string()),
        added_at: None,
    };

    vec![
        builtin(
            "cadena-3",
            "Cadena 3",
            "https://playerservices.streamtheworld.com/api/livestream-redirect/radio3.mp3",
            None,
        ),
        builtin(
            "sucesos",
            "Sucesos",
            "https://server1.dainusradio.com:2341/stream",
            None,
        ),
        builtin(
            "suquia",
            "Suquia",
            "https://streaming01.shockmedia.com.ar:10945/;",
            None,
        ),
        builtin(
            "continental-cordoba",
            "Continental Córdoba",
            "https://streaming.gostreaming.com.ar/8100/;",
            None,
        ),
        builtin(
            "gol-y-pop",
            "Gol & Pop",
            "https://streaming01.serverconnectinc.site:9515/golpop",
            Some("Gol & Pop does not allow external connections. Ask them to change it, or to write to us"),
        ),
        builtin(
            "lv2",
            "LV2",
            "https://ice3.edge-apps.net/ros3-lv2/live/playlist.m3u8",
            Some("LV2 does not allow external connections. Ask them to change it, or to write to us"),
        ),
    ]
}

/// Registry over built-in and custom stations
pub struct StreamRegistry {
    builtin: Vec<StreamDescriptor>,
    custom: Vec<StreamDescriptor>,
    store: Box<dyn KeyValueStore>,
}

impl StreamRegistry {
    /// Load the registry, restoring custom stations from the store
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        let mut custom = Vec::new();
        for key in store.keys() {
            match store.get(&key).map(serde_json::from_value::<StreamDescriptor>) {
                Some(Ok(descriptor)) => custom.push(descriptor),
                Some(Err(e)) => warn!("Skipping corrupt custom station '{}': {}", key, e),
                None => {}
            }
        }
        // Stable order regardless of store iteration order
        custom.sort_by(|a, b| a.added_at.cmp(&b.added_at));

        info!(custom = custom.len(), "station registry loaded");
        Self {
            builtin: builtin_streams(),
            custom,
            store,
        }
    }

    /// All stations, built-ins first
    pub fn all(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn get(&self, id: &str) -> Option<&StreamDescriptor> {
        self.all_indexed(id)
    }

    fn all_indexed(&self, id: &str) -> Option<&StreamDescriptor> {
        self.builtin
            .iter()
            .find(|s| s.id == id)
            .or_else(|| self.custom.iter().find(|s| s.id == id))
    }

    /// Add a custom station
    ///
    /// The URL must parse as http(s) and must not collide with an
    /// existing station. Returns the new descriptor.
    pub fn add_custom(&mut self, name: &str, url: &str) -> PlayerResult<StreamDescriptor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayerError::InvalidStreamUrl(
                "Station name must not be empty".to_string(),
            ));
        }

        let parsed =
            Url::parse(url).map_err(|e| PlayerError::InvalidStreamUrl(e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(PlayerError::InvalidStreamUrl(format!(
                "Unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        if self.all().any(|s| s.url == url) {
            return Err(PlayerError::DuplicateStream);
        }

        let descriptor = StreamDescriptor {
            id: self.unique_id(name),
            name: name.to_string(),
            url: url.to_string(),
            custom: true,
            known_error: None,
            added_at: Some(Utc::now()),
        };

        self.store.set(
            &descriptor.id,
            serde_json::to_value(&descriptor)
                .map_err(|e| PlayerError::StorageError(e.to_string()))?,
        )?;
        info!(id = %descriptor.id, url, "custom station added");
        self.custom.push(descriptor.clone());
        Ok(descriptor)
    }

    /// Remove a custom station. Built-ins cannot be removed.
    pub fn remove_custom(&mut self, id: &str) -> PlayerResult<()> {
        if self.builtin.iter().any(|s| s.id == id) {
            return Err(PlayerError::BuiltInStream);
        }
        let index = self
            .custom
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| PlayerError::StreamNotFound(id.to_string()))?;

        self.store.remove(id)?;
        self.custom.remove(index);
        info!(id, "custom station removed");
        Ok(())
    }

    /// Derive a unique slug id from the display name
    fn unique_id(&self, name: &str) -> String {
        let base: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let base = base.trim_matches('-').to_string();
        let base = if base.is_empty() {
            "station".to_string()
        } else {
            base
        };

        if self.get(&base).is_none() {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry() -> StreamRegistry {
        StreamRegistry::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_builtin_list() {
        let reg = registry();
        assert_eq!(reg.all().count(), 6);
        assert!(reg.get("cadena-3").is_some());

        let broken: Vec<_> = reg.all().filter(|s| s.known_error.is_some()).collect();
        assert_eq!(broken.len(), 2);
        assert!(broken.iter().all(|s| !s.custom));
    }

    #[test]
    fn test_add_custom_station() {
        let mut reg = registry();
        let descriptor = reg
            .add_custom("My Radio", "https://radio.example/stream")
            .unwrap();
        assert!(descriptor.custom);
        assert_eq!(descriptor.id, "my-radio");
        assert!(descriptor.added_at.is_some());
        assert_eq!(reg.all().count(), 7);
    }

    #[test]
    fn test_rejects_bad_urls() {
        let mut reg = registry();
        assert!(matches!(
            reg.add_custom("Bad", "not a url"),
            Err(PlayerError::InvalidStreamUrl(_))
        ));
        assert!(matches!(
            reg.add_custom("Bad", "ftp://radio.example/stream"),
            Err(PlayerError::InvalidStreamUrl(_))
        ));
        assert!(reg.add_custom("", "https://radio.example/stream").is_err());
    }

    #[test]
    fn test_rejects_duplicate_url() {
        let mut reg = registry();
        reg.add_custom("A", "https://radio.example/stream").unwrap();
        assert!(matches!(
            reg.add_custom("B", "https://radio.example/stream"),
            Err(PlayerError::DuplicateStream)
        ));

        // Duplicating a built-in URL is also rejected
        assert!(matches!(
            reg.add_custom("C", "https://server1.dainusradio.com:2341/stream"),
            Err(PlayerError::DuplicateStream)
        ));
    }

    #[test]
    fn test_id_collisions_get_suffixes() {
        let mut reg = registry();
        let a = reg.add_custom("Radio", "https://a.example/1").unwrap();
        let b = reg.add_custom("Radio", "https://a.example/2").unwrap();
        assert_eq!(a.id, "radio");
        assert_eq!(b.id, "radio-2");
    }

    #[test]
    fn test_remove_custom() {
        let mut reg = registry();
        let descriptor = reg.add_custom("A", "https://a.example/1").unwrap();
        reg.remove_custom(&descriptor.id).unwrap();
        assert_eq!(reg.all().count(), 6);

        assert!(matches!(
            reg.remove_custom("missing"),
            Err(PlayerError::StreamNotFound(_))
        ));
    }

    #[test]
    fn test_cannot_remove_builtin() {
        let mut reg = registry();
        assert!(matches!(
            reg.remove_custom("cadena-3"),
            Err(PlayerError::BuiltInStream)
        ));
    }

    #[test]
    fn test_custom_stations_survive_reload() {
        let mut store = MemoryStore::new();
        {
            let mut reg = StreamRegistry::new(Box::new(MemoryStore::new()));
            let descriptor = reg.add_custom("Kept", "https://kept.example/s").unwrap();
            // Mirror what the registry wrote into a fresh store
            store
                .set(&descriptor.id, serde_json::to_value(&descriptor).unwrap())
                .unwrap();
        }

        let reg = StreamRegistry::new(Box::new(store));
        assert_eq!(reg.all().count(), 7);
        assert!(reg.get("kept").is_some());
    }
}
