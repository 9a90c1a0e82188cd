//! Configuration store keys, defaults, and store implementations.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use attitude_traits::{AttitudeError, ConfigStore};

/// Keys read each tick and written back on calibration events.
pub mod keys {
    pub const CALIBRATION_TYPE: &str = "calibration_type";
    pub const CENTER_X: &str = "center_x";
    pub const CENTER_Y: &str = "center_y";
    pub const CENTER_Z: &str = "center_z";
    pub const SCALE_X: &str = "scale_x";
    pub const SCALE_Y: &str = "scale_y";
    pub const SCALE_Z: &str = "scale_z";
    pub const RADIUS: &str = "radius";
}

/// Factory calibration of the reference board, used whenever the store has
/// no operator-provided value.
pub mod defaults {
    pub const CALIBRATION_TYPE: &str = "constant";
    pub const CENTER: [i32; 3] = [20962, 34322, -23924];
    pub const SCALE: [i32; 3] = [1203, 1177, 1133];
    pub const RADIUS: i32 = 48098;
}

fn lookup_str(values: &BTreeMap<String, String>, key: &str, default: &str) -> String {
    values
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn lookup_i32(
    values: &BTreeMap<String, String>,
    key: &str,
    default: i32,
) -> Result<i32, AttitudeError> {
    match values.get(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| {
            AttitudeError::Config(format!("invalid integer for {}: {:?}", key, value))
        }),
    }
}

/// Plain in-memory store. The default for tests and for deployments that
/// do not care about persistence.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: BTreeMap<String, String>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfig {
    fn get_str(&self, key: &str, default: &str) -> Result<String, AttitudeError> {
        Ok(lookup_str(&self.values, key, default))
    }

    fn get_i32(&self, key: &str, default: i32) -> Result<i32, AttitudeError> {
        lookup_i32(&self.values, key, default)
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), AttitudeError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), AttitudeError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a flat JSON object. Every write saves the whole file
/// so calibration write-backs survive restarts.
#[derive(Debug)]
pub struct JsonConfigStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonConfigStore {
    /// Load the store, starting empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, AttitudeError> {
        let values = if path.exists() {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text)
                .map_err(|e| AttitudeError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            BTreeMap::new()
        };
        Ok(JsonConfigStore {
            path: path.to_path_buf(),
            values,
        })
    }

    fn save(&self) -> Result<(), AttitudeError> {
        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| AttitudeError::Config(e.to_string()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn get_str(&self, key: &str, default: &str) -> Result<String, AttitudeError> {
        Ok(lookup_str(&self.values, key, default))
    }

    fn get_i32(&self, key: &str, default: i32) -> Result<i32, AttitudeError> {
        lookup_i32(&self.values, key, default)
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), AttitudeError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), AttitudeError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_defaults() {
        let store = MemoryConfig::new();
        assert_eq!(
            store
                .get_str(keys::CALIBRATION_TYPE, defaults::CALIBRATION_TYPE)
                .unwrap(),
            "constant"
        );
        assert_eq!(
            store.get_i32(keys::CENTER_X, defaults::CENTER[0]).unwrap(),
            20962
        );
        assert_eq!(
            store.get_i32(keys::RADIUS, defaults::RADIUS).unwrap(),
            48098
        );
    }

    #[test]
    fn test_memory_config_round_trip() {
        let mut store = MemoryConfig::new();
        store.set_i32(keys::CENTER_Z, -42).unwrap();
        store.set_str(keys::CALIBRATION_TYPE, "device").unwrap();
        assert_eq!(store.get_i32(keys::CENTER_Z, 0).unwrap(), -42);
        assert_eq!(store.get_str(keys::CALIBRATION_TYPE, "").unwrap(), "device");
    }

    #[test]
    fn test_memory_config_rejects_garbage_integers() {
        let mut store = MemoryConfig::new();
        store.set_str(keys::RADIUS, "not-a-number").unwrap();
        assert!(store.get_i32(keys::RADIUS, 0).is_err());
    }

    #[test]
    fn test_json_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attitude-config.json");

        {
            let mut store = JsonConfigStore::open(&path).unwrap();
            store.set_i32(keys::CENTER_X, 123).unwrap();
            store.set_str(keys::CALIBRATION_TYPE, "constant").unwrap();
        }

        let store = JsonConfigStore::open(&path).unwrap();
        assert_eq!(store.get_i32(keys::CENTER_X, 0).unwrap(), 123);
        assert_eq!(store.get_str(keys::CALIBRATION_TYPE, "").unwrap(), "constant");
    }

    #[test]
    fn test_json_store_starts_empty_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::open(&dir.path().join("missing.json")).unwrap();
        assert_eq!(store.get_i32(keys::RADIUS, defaults::RADIUS).unwrap(), 48098);
    }
}
