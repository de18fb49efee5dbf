//! Persistence store: JSON documents under fixed keys.
//!
//! Each key maps to one file, `<store_dir>/<key>.json`. Reads of an absent
//! key return the type's default.

pub mod runs;
pub mod templates;

pub use runs::{JoinRunRecord, RunHistory};
pub use templates::{JoinTemplate, TemplateStore};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::StoreResult;
use crate::logs::log_warning;
use crate::models::{ColumnName, JoinSpec};

/// Last-used join parameters.
pub const SETTINGS_KEY: &str = "settings";
/// Saved join templates.
pub const TEMPLATES_KEY: &str = "join-templates";
/// Recent join runs.
pub const RUN_HISTORY_KEY: &str = "join-history";

#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.store_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read a key. `Ok(None)` when it was never written.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let content = match fs::read_to_string(self.path(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Read a key, falling back to the default when absent or unreadable.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                log_warning(format!("Ignoring stored '{}': {}", key, e));
                T::default()
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.path(key), content)?;
        Ok(())
    }

    /// Delete a key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn templates(&self, limit: usize) -> TemplateStore<'_> {
        TemplateStore::new(self, limit)
    }

    pub fn runs(&self, limit: usize) -> RunHistory<'_> {
        RunHistory::new(self, limit)
    }
}

/// Keep only the key pairs whose names exist in both headers.
///
/// Pairs are positional, so dropping one side of a pair drops both.
pub fn retain_key_pairs(
    keys_left: &[ColumnName],
    keys_right: &[ColumnName],
    header_left: &[ColumnName],
    header_right: &[ColumnName],
) -> (Vec<ColumnName>, Vec<ColumnName>) {
    keys_left
        .iter()
        .zip(keys_right)
        .filter(|(l, r)| header_left.contains(l) && header_right.contains(r))
        .map(|(l, r)| (l.clone(), r.clone()))
        .unzip()
}

/// Persisted session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Last-used join parameters.
    pub join: JoinSpec,
    pub has_header: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            join: JoinSpec::default(),
            has_header: true,
        }
    }
}

impl Settings {
    pub fn load(store: &Store) -> Self {
        store.load_or_default(SETTINGS_KEY)
    }

    pub fn save(&self, store: &Store) -> StoreResult<()> {
        store.save(SETTINGS_KEY, self)
    }

    /// Drop key names that no longer exist in the loaded tables.
    /// Returns true when anything was removed.
    pub fn retain_known_keys(&mut self, header_left: &[ColumnName], header_right: &[ColumnName]) -> bool {
        let before = self.join.keys_left.len().max(self.join.keys_right.len());
        let (left, right) = retain_key_pairs(
            &self.join.keys_left,
            &self.join.keys_right,
            header_left,
            header_right,
        );
        let changed = left.len() != before;
        self.join.keys_left = left;
        self.join.keys_right = right;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JoinType;
    use tempfile::tempdir;

    fn header(names: &[&str]) -> Vec<ColumnName> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_key_is_default() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().join("nested"));
        assert_eq!(store.load::<Settings>(SETTINGS_KEY).unwrap(), None);
        assert_eq!(Settings::load(&store), Settings::default());
        assert!(!store.remove(SETTINGS_KEY).unwrap());
    }

    #[test]
    fn test_save_load_remove() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        let settings = Settings {
            join: JoinSpec::on(&["id"], JoinType::Full).with_fill("-"),
            has_header: false,
        };
        settings.save(&store).unwrap();
        assert_eq!(Settings::load(&store), settings);

        assert!(store.remove(SETTINGS_KEY).unwrap());
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(dir.path().join("settings.json"), "{not json").unwrap();

        assert!(store.load::<Settings>(SETTINGS_KEY).is_err());
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(
            dir.path().join("settings.json"),
            r#"{"join": {"keysLeft": ["a"], "keysRight": ["b"], "type": "left"}}"#,
        )
        .unwrap();

        let settings = Settings::load(&store);
        assert!(settings.has_header);
        assert_eq!(settings.join.join_type, JoinType::Left);
    }

    #[test]
    fn test_retain_known_keys() {
        let mut settings = Settings {
            join: JoinSpec::new(
                header(&["id", "region", "gone"]),
                header(&["id", "area", "code"]),
                JoinType::Inner,
            ),
            has_header: true,
        };

        let changed = settings.retain_known_keys(
            &header(&["id", "region", "name"]),
            &header(&["id", "code", "area"]),
        );
        assert!(changed);
        assert_eq!(settings.join.keys_left, header(&["id", "region"]));
        assert_eq!(settings.join.keys_right, header(&["id", "area"]));

        assert!(!settings.retain_known_keys(
            &header(&["id", "region"]),
            &header(&["id", "area"]),
        ));
    }
}
