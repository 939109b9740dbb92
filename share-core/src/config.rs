//! # Configuration
//!
//! A string key/value store mirroring Feathers' `app.set()` / `app.get()`.
//!
//! ```rust
//! use share_core::ShareConfig;
//! let mut cfg = ShareConfig::new();
//!
//! cfg.set("submissions.collection", "data");
//! assert_eq!(cfg.get("submissions.collection"), Some("data"));
//! ```
//!
//! Environment overrides use a prefix and `__` as the key separator:
//! `CLOUDSHARE__UPLOAD__MAXFILEMB=50` becomes `upload.maxfilemb`.
//! Keys are lowercased, so camelCase keys are matched case-insensitively by
//! [`ShareConfig::load_env_from`].

use std::collections::HashMap;

use anyhow::{anyhow, Result};

#[derive(Debug, Default)]
pub struct ShareConfig {
    values: HashMap<String, String>,
}

impl ShareConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Load `PREFIX__A__B=value` variables from the process environment.
    ///
    /// Returns how many keys were set.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_env_from(prefix, std::env::vars())
    }

    /// Same as [`ShareConfig::load_env`] over an explicit list of variables.
    ///
    /// A variable overrides an existing key when they match ignoring case,
    /// so `CLOUDSHARE__UPLOAD__MAXFILEMB` replaces `upload.maxFileMb`.
    pub fn load_env_from<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        let mut loaded = 0;

        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(&marker) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }

            let normalized = stripped.to_lowercase().replace("__", ".");
            let existing = self
                .values
                .keys()
                .find(|k| k.to_lowercase() == normalized)
                .cloned();

            self.values.insert(existing.unwrap_or(normalized), value);
            loaded += 1;
        }

        loaded
    }

    pub fn snapshot(&self) -> ShareConfigSnapshot {
        ShareConfigSnapshot::new(self.values.clone())
    }
}

/// Immutable copy of the config handed to hooks and clients.
#[derive(Debug, Clone, Default)]
pub struct ShareConfigSnapshot {
    map: HashMap<String, String>,
}

impl ShareConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }

    /// A non-blank value, or an error naming the missing key.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Missing required config key '{key}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_match_existing_keys_ignoring_case() {
        let mut cfg = ShareConfig::new();
        cfg.set("upload.maxFileMb", "100");

        let loaded = cfg.load_env_from(
            "CLOUDSHARE",
            vec![
                ("CLOUDSHARE__UPLOAD__MAXFILEMB".to_string(), "25".to_string()),
                ("CLOUDSHARE__FEATURE__FLAG".to_string(), "true".to_string()),
                ("OTHER__IGNORED".to_string(), "x".to_string()),
            ],
        );

        assert_eq!(loaded, 2);
        let snap = cfg.snapshot();
        assert_eq!(snap.get_usize("upload.maxFileMb"), Some(25));
        assert_eq!(snap.get_bool("feature.flag"), Some(true));
        assert!(snap.get("other.ignored").is_none());
    }

    #[test]
    fn require_rejects_blank_values() {
        let mut cfg = ShareConfig::new();
        cfg.set("media.cloudName", "  ");
        let snap = cfg.snapshot();

        let err = snap.require("media.cloudName").unwrap_err();
        assert!(err.to_string().contains("media.cloudName"));
        assert!(snap.require("docs.projectId").is_err());
    }
}
