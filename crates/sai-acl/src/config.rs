//! Translation layer configuration.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::qualifier::AclQualifier;

/// What to do with a rule that ends up with no key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMatchPolicy {
    /// Fail with `NoMatchFields`.
    Reject,
    /// Install the rule; it matches every packet on the bound objects.
    AllowWildcard,
}

pub const DEFAULT_EMPTY_MATCH_POLICY: EmptyMatchPolicy = EmptyMatchPolicy::Reject;

/// Upper bound on key fields per rule. Every qualifier slot at most once.
pub const DEFAULT_MAX_RULE_FIELDS: usize = AclQualifier::COUNT;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration of the ACL translation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    pub empty_match_policy: EmptyMatchPolicy,
    pub max_rule_fields: usize,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            empty_match_policy: DEFAULT_EMPTY_MATCH_POLICY,
            max_rule_fields: DEFAULT_MAX_RULE_FIELDS,
        }
    }
}

impl AclConfig {
    pub fn with_empty_match_policy(mut self, policy: EmptyMatchPolicy) -> Self {
        self.empty_match_policy = policy;
        self
    }

    /// Parses a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AclConfig = serde_json::from_str(json)?;
        config.validate()
    }

    /// Reads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AclConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_rule_fields == 0 {
            return Err(ConfigError::Invalid(
                "max_rule_fields must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}
