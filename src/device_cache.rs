//! Controller cache for quick re-selection
//!
//! Remembers the identity of previously connected controllers (product
//! ID, serial, name) in a small JSON file so a UI can offer the last
//! used controller without re-running device discovery prompts.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::backend::ConnectedDeviceInfo;

/// Cache file name
const CACHE_FILENAME: &str = "procon2_cache.json";

/// Cache file path: next to the executable when possible, otherwise the
/// working directory.
fn cache_path() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(CACHE_FILENAME);
        }
    }
    PathBuf::from(CACHE_FILENAME)
}

/// One remembered controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedDevice {
    /// USB/HID product ID
    pub product_id: u16,

    /// Serial number, when the platform exposed one
    #[serde(default)]
    pub serial: Option<String>,

    /// Product string, when the platform exposed one
    #[serde(default)]
    pub name: Option<String>,

    /// Unix timestamp of the last successful connection
    #[serde(default)]
    pub last_seen: u64,
}

/// JSON-backed cache of previously connected controllers, keyed by
/// serial (falling back to the product ID when no serial is exposed).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceCache {
    devices: HashMap<String, CachedDevice>,
}

impl DeviceCache {
    /// Load the cache from disk, returning an empty cache when the file
    /// is missing or unreadable.
    pub fn load() -> Self {
        let path = cache_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(cache) => {
                    debug!("Loaded device cache from {}", path.display());
                    cache
                }
                Err(e) => {
                    warn!("Device cache at {} is corrupt ({}), starting fresh", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No device cache at {}", path.display());
                Self::default()
            }
        }
    }

    /// Persist the cache. Best-effort; callers log the error and move on.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let path = cache_path();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&path, contents)?;
        debug!("Saved device cache to {}", path.display());
        Ok(())
    }

    /// Record a successful connection.
    pub fn record(&mut self, info: &ConnectedDeviceInfo) {
        let key = info
            .serial
            .clone()
            .unwrap_or_else(|| format!("pid-{:04X}", info.product_id));
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.devices.insert(
            key,
            CachedDevice {
                product_id: info.product_id,
                serial: info.serial.clone(),
                name: info.name.clone(),
                last_seen: now,
            },
        );
    }

    /// The most recently seen controller, if any.
    pub fn most_recent(&self) -> Option<&CachedDevice> {
        self.devices.values().max_by_key(|d| d.last_seen)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(serial: Option<&str>, pid: u16) -> ConnectedDeviceInfo {
        ConnectedDeviceInfo {
            product_id: pid,
            serial: serial.map(str::to_string),
            name: Some("Pro Controller 2".to_string()),
        }
    }

    #[test]
    fn record_keys_by_serial() {
        let mut cache = DeviceCache::default();
        cache.record(&info(Some("ABC123"), 0x2069));
        cache.record(&info(Some("ABC123"), 0x2069));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn record_without_serial_keys_by_product_id() {
        let mut cache = DeviceCache::default();
        cache.record(&info(None, 0x2069));
        cache.record(&info(None, 0x2067));
        assert_eq!(cache.len(), 2);
        assert!(cache.most_recent().is_some());
    }

    #[test]
    fn roundtrips_through_json() {
        let mut cache = DeviceCache::default();
        cache.record(&info(Some("ABC123"), 0x2069));
        let json = serde_json::to_string(&cache).unwrap();
        let restored: DeviceCache = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.most_recent().unwrap().product_id, 0x2069);
    }
}
