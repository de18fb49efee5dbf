//! Engine configuration.
//!
//! Defaults can be overridden from the environment (or a `.env` file):
//!
//! | Variable | Field |
//! |---|---|
//! | `SHEETJOIN_HISTORY_CAPACITY` | `history_capacity` |
//! | `SHEETJOIN_COLLISION_SUFFIX` | `collision_suffix` |
//! | `SHEETJOIN_STORE_DIR` | `store_dir` |
//! | `SHEETJOIN_TEMPLATE_LIMIT` | `template_limit` |
//! | `SHEETJOIN_RUN_HISTORY_LIMIT` | `run_history_limit` |
//! | `SHEETJOIN_ALLOW_EMPTY_KEYS` | `allow_empty_keys` |
//! | `SHEETJOIN_PROFILE_SAMPLE_ROWS` | `profile_sample_rows` |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::logs::log_warning;

/// Suffix appended to right-table columns whose name is already taken.
pub const DEFAULT_COLLISION_SUFFIX: &str = "_B";

/// Runtime settings shared by the session, store and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo snapshots kept.
    pub history_capacity: usize,

    /// Suffix for colliding right-table column names.
    pub collision_suffix: String,

    /// Directory of the persistence store.
    pub store_dir: PathBuf,

    /// Maximum number of saved join templates.
    pub template_limit: usize,

    /// Maximum number of join run records.
    pub run_history_limit: usize,

    /// Accept joins with no key columns (every row matches every row).
    pub allow_empty_keys: bool,

    /// Rows sampled when profiling column types.
    pub profile_sample_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            collision_suffix: DEFAULT_COLLISION_SUFFIX.to_string(),
            store_dir: PathBuf::from(".sheetjoin"),
            template_limit: 10,
            run_history_limit: 10,
            allow_empty_keys: false,
            profile_sample_rows: 100,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `SHEETJOIN_*` environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_parsed(&lookup, "SHEETJOIN_HISTORY_CAPACITY", &mut config.history_capacity);
        override_parsed(&lookup, "SHEETJOIN_TEMPLATE_LIMIT", &mut config.template_limit);
        override_parsed(&lookup, "SHEETJOIN_RUN_HISTORY_LIMIT", &mut config.run_history_limit);
        override_parsed(&lookup, "SHEETJOIN_ALLOW_EMPTY_KEYS", &mut config.allow_empty_keys);
        override_parsed(&lookup, "SHEETJOIN_PROFILE_SAMPLE_ROWS", &mut config.profile_sample_rows);

        if let Some(suffix) = lookup("SHEETJOIN_COLLISION_SUFFIX").filter(|s| !s.is_empty()) {
            config.collision_suffix = suffix;
        }
        if let Some(dir) = lookup("SHEETJOIN_STORE_DIR").filter(|s| !s.is_empty()) {
            config.store_dir = PathBuf::from(dir);
        }

        // A zero-capacity history could not even hold the baseline.
        config.history_capacity = config.history_capacity.max(1);
        config
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => log_warning(format!("Ignoring invalid {}='{}'", key, raw)),
        }
    }
}
