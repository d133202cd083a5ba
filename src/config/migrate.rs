//! Configuration file upgrades.
//!
//! Older config files may lack keys introduced later. Migration reads the
//! file as a raw YAML mapping, inserts the missing keys with their default
//! values and writes it back. Existing values are never touched.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path)?;
    let yaml: Value = serde_yaml::from_str(&content)?;
    match yaml {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{} is not a YAML mapping",
            path.display()
        ))),
    }
}

fn default_mapping() -> AppResult<Mapping> {
    match serde_yaml::to_value(Config::default())? {
        Value::Mapping(map) => Ok(map),
        _ => Err(AppError::Config("default config is not a mapping".into())),
    }
}

/// Keys known to the current config schema that `path` does not define.
pub fn missing_keys(path: &Path) -> AppResult<Vec<String>> {
    let current = read_mapping(path)?;
    let defaults = default_mapping()?;

    Ok(defaults
        .keys()
        .filter(|k| !current.contains_key(*k))
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect())
}

/// Add missing keys to the config file. Returns the keys that were added.
pub fn migrate_config(path: &Path) -> AppResult<Vec<String>> {
    let mut current = read_mapping(path)?;
    let defaults = default_mapping()?;
    let mut added = Vec::new();

    for (key, value) in defaults {
        if current.contains_key(&key) {
            continue;
        }
        if let Some(name) = key.as_str() {
            added.push(name.to_string());
        }
        current.insert(key, value);
    }

    if added.is_empty() {
        info("Config file already up to date.");
        return Ok(added);
    }

    let yaml = serde_yaml::to_string(&Value::Mapping(current))?;
    fs::write(path, yaml)?;
    tracing::info!(keys = ?added, "config migrated");
    success(format!("Added {} key(s): {}", added.len(), added.join(", ")));

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_adds_keys_and_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeblocks.conf");
        fs::write(&path, "database: /data/mine.sqlite\nlanguage: it\n").unwrap();

        let missing = missing_keys(&path).unwrap();
        assert!(missing.contains(&"sync_on_write".to_string()));
        assert!(!missing.contains(&"language".to_string()));

        let added = migrate_config(&path).unwrap();
        assert_eq!(added, missing);
        assert!(missing_keys(&path).unwrap().is_empty());

        let cfg: Config = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cfg.database, "/data/mine.sqlite");
        assert_eq!(cfg.language, "it");

        assert!(migrate_config(&path).unwrap().is_empty());
    }

    #[test]
    fn non_mapping_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.conf");
        fs::write(&path, "- a\n- b\n").unwrap();
        assert!(matches!(missing_keys(&path), Err(AppError::Config(_))));
    }
}
