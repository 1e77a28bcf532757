// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapper configuration.
//!
//! [`MapperConfig`] holds engine-wide settings and can be loaded from a TOML
//! file. [`MapOptions`] is the per-call configuration of a single `map()`.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine-wide configuration.
///
/// Every field that changes the emitted plans is part of the plan cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Read and write private members without accessors.
    pub map_private_properties: bool,

    /// Prefix of generated plan names.
    pub class_prefix: String,

    /// Call constructors; when disabled targets are default-constructed and
    /// every writable member is set afterwards.
    pub use_constructor: bool,

    /// Allow writing read-only members of an existing target.
    pub allow_readonly_target_to_populate: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            map_private_properties: false,
            class_prefix: "Mapper_".to_string(),
            use_constructor: true,
            allow_readonly_target_to_populate: false,
        }
    }
}

impl MapperConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_prefix = self
            .class_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_prefix {
            return Err(ConfigError::Invalid(format!(
                "class_prefix '{}' must contain only ASCII letters, digits and '_'",
                self.class_prefix
            )));
        }
        Ok(())
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    /// Populate nested objects of an existing target in place.
    pub deep_target_to_populate: bool,
    /// Leave target members untouched when the source value is null.
    pub skip_null_values: bool,
    /// Active groups; `None` disables group filtering.
    pub groups: Option<BTreeSet<String>>,
    /// Collect unmatched source members into the target's extra bag.
    pub allow_extra_properties: bool,
    /// User data available to providers.
    pub extra: BTreeMap<String, Value>,
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deep_populate(mut self, enabled: bool) -> Self {
        self.deep_target_to_populate = enabled;
        self
    }

    pub fn skip_null_values(mut self, enabled: bool) -> Self {
        self.skip_null_values = enabled;
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn allow_extra_properties(mut self, enabled: bool) -> Self {
        self.allow_extra_properties = enabled;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
