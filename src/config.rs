use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Collection;

pub const ENV_DATA_DIR: &str = "REQDRAFT_DATA_DIR";
pub const ENV_HISTORY_LIMIT: &str = "REQDRAFT_HISTORY_LIMIT";
pub const ENV_COLLECTIONS: &str = "REQDRAFT_COLLECTIONS";

const SETTINGS_FILE: &str = "settings.json";
const HISTORY_DB_FILE: &str = "history.db";
const DEFAULT_DATA_DIR_NAME: &str = ".reqdraft";
const DEFAULT_HISTORY_LIMIT: usize = 100;
const DEFAULT_PERSIST_HISTORY: bool = true;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_persist_history")]
    pub persist_history: bool,
    #[serde(default)]
    pub collections_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            persist_history: DEFAULT_PERSIST_HISTORY,
            collections_file: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DATA_DIR_NAME)
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_persist_history() -> bool {
    DEFAULT_PERSIST_HISTORY
}

impl AppConfig {
    /// Defaults, then `settings.json` in the data dir, then environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // the data dir override decides where settings.json is read from
        let data_dir = lookup(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut config = Self::from_settings_file(&data_dir.join(SETTINGS_FILE))?
            .unwrap_or_else(|| Self {
                data_dir: data_dir.clone(),
                ..Self::default()
            });
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    fn from_settings_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(limit) = lookup(ENV_HISTORY_LIMIT) {
            self.history_limit = limit
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be a non-negative integer, got {:?}", ENV_HISTORY_LIMIT, limit))?;
        }
        if let Some(path) = lookup(ENV_COLLECTIONS) {
            self.collections_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_DB_FILE)
    }
}

/// Read a collections snapshot (a JSON array of collections).
pub fn load_collections(path: &Path) -> Result<Vec<Collection>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading collections from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing collections from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();

        let config = AppConfig::load_with(env(&[(ENV_DATA_DIR, data_dir)])).unwrap();

        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.history_limit, 100);
        assert!(config.persist_history);
        assert_eq!(config.collections_file, None);
        assert_eq!(config.history_db_path(), dir.path().join("history.db"));
    }

    #[test]
    fn test_settings_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"history_limit": 5, "persist_history": false}"#,
        )
        .unwrap();

        let config =
            AppConfig::load_with(env(&[(ENV_DATA_DIR, dir.path().to_str().unwrap())])).unwrap();

        assert_eq!(config.history_limit, 5);
        assert!(!config.persist_history);
        // the env override still wins over the file's (absent) data_dir
        assert_eq!(config.data_dir, dir.path());
    }

    #[test]
    fn test_env_overrides_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), r#"{"history_limit": 5}"#).unwrap();

        let config = AppConfig::load_with(env(&[
            (ENV_DATA_DIR, dir.path().to_str().unwrap()),
            (ENV_HISTORY_LIMIT, " 7 "),
            (ENV_COLLECTIONS, "/tmp/collections.json"),
        ]))
        .unwrap();

        assert_eq!(config.history_limit, 7);
        assert_eq!(
            config.collections_file,
            Some(PathBuf::from("/tmp/collections.json"))
        );
    }

    #[test]
    fn test_bad_history_limit_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(env(&[(ENV_HISTORY_LIMIT, "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_HISTORY_LIMIT));
    }

    #[test]
    fn test_malformed_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();

        let result = AppConfig::load_with(env(&[(ENV_DATA_DIR, dir.path().to_str().unwrap())]));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collections.json");
        std::fs::write(
            &path,
            r#"[{"id":"c1","name":"API","endpoints":[
                {"id":"e1","name":"List","method":"GET","url":"/items"}
            ]}]"#,
        )
        .unwrap();

        let collections = load_collections(&path).unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].base_url, "");
        assert_eq!(collections[0].endpoints[0].url, "/items");
        assert!(load_collections(&dir.path().join("missing.json")).is_err());
    }
}
