//! Merge configuration.
//!
//! Loads the canonical platform mapping, key column aliases and duplicate
//! policy from TOML. Nothing here is process-wide: every merge and
//! aggregation run receives its configuration explicitly.
//!
//! ```toml
//! duplicate_policy = "keep_first"
//! count_columns = ["number_proposal"]
//!
//! [platform_aliases]
//! "Ethereum_Go" = "Ethereum"
//! "Bitcoin_Cash" = "Bitcoin Cash"
//!
//! [key_columns]
//! year = ["year", "Year", "iso_year"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::utils::config::{DEFAULT_PLATFORM_ALIASES, DEFAULT_WEEK_ALIASES, DEFAULT_YEAR_ALIASES};
use crate::utils::error::ConfigError;

/// Alias → canonical platform name
///
/// Lookup happens after trimming surrounding whitespace, so `"Bitcoin "`
/// and `"Bitcoin"` meet without an explicit entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformAliases {
    map: BTreeMap<String, String>,
}

impl PlatformAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.insert(alias, canonical);
        self
    }

    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.map.insert(alias.into(), canonical.into());
    }

    /// Canonical name for a raw platform identifier
    pub fn canonicalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.map
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Reject chained mappings (`A -> B`, `B -> C`): lookup is single-step,
    /// so a chain would leave `A` and `C` as two different platforms.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (alias, canonical) in &self.map {
            if alias == canonical {
                continue;
            }
            if let Some(next) = self.map.get(canonical) {
                if next != canonical {
                    return Err(ConfigError::Invalid(format!(
                        "platform alias chain: '{}' -> '{}' -> '{}'",
                        alias, canonical, next
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for PlatformAliases {
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        let mut aliases = Self::new();
        for (alias, canonical) in iter {
            aliases.insert(alias, canonical);
        }
        aliases
    }
}

/// What to do with a key that appears more than once in one input panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the merge with `MergeError::KeyCollision`
    #[default]
    Reject,
    /// Keep the first occurrence in input order and report the rest
    KeepFirst,
}

/// Accepted names for each key column, tried in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyColumns {
    pub platform: Vec<String>,
    pub year: Vec<String>,
    pub week: Vec<String>,
}

impl Default for KeyColumns {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            platform: owned(DEFAULT_PLATFORM_ALIASES),
            year: owned(DEFAULT_YEAR_ALIASES),
            week: owned(DEFAULT_WEEK_ALIASES),
        }
    }
}

/// Complete merge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub duplicate_policy: DuplicatePolicy,

    pub platform_aliases: PlatformAliases,

    pub key_columns: KeyColumns,

    /// Extra count-like columns (by name after renaming) to zero-fill,
    /// on top of what each panel declares itself
    pub count_columns: Vec<String>,
}

impl MergeConfig {
    pub fn with_aliases(mut self, aliases: PlatformAliases) -> Self {
        self.platform_aliases = aliases;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.platform_aliases.validate()?;

        for (label, names) in [
            ("platform", &self.key_columns.platform),
            ("year", &self.key_columns.year),
            ("week", &self.key_columns.week),
        ] {
            if names.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "key_columns.{} must list at least one column name",
                    label
                )));
            }
        }

        Ok(())
    }
}

/// Parse and validate a merge configuration from TOML text
pub fn parse_merge_config(contents: &str) -> Result<MergeConfig, ConfigError> {
    let config: MergeConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Load a merge configuration from a TOML file
///
/// # Errors
/// * `ConfigError::ReadFailed` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
/// * `ConfigError::Invalid` - If aliases chain or key aliases are empty
///
/// # Example
/// ```ignore
/// let config = load_merge_config("merge.toml")?;
/// ```
pub fn load_merge_config(path: impl AsRef<Path>) -> Result<MergeConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_merge_config(&contents)
}
