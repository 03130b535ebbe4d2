//! # Runtime Configuration
//!
//! Knobs that change how strictly requests are validated. Every field has a
//! default, so an empty YAML file or an empty environment is a valid
//! configuration.
//!
//! ## Environment Variables
//!
//! ### `RAMLGUARD_SKIP_BODY_METHODS`
//!
//! Comma-separated HTTP methods whose body is never validated.
//! Default: `GET,DELETE`
//!
//! ### `RAMLGUARD_MAX_BODY_BYTES`
//!
//! Reject bodies larger than this many bytes before decoding them. Accepts
//! decimal (`65536`) or hexadecimal (`0x10000`). Unset means no limit.
//!
//! ### `RAMLGUARD_REJECT_UNKNOWN_PROPERTIES`
//!
//! `true`/`1` makes every object type behave as if it declared
//! `additionalProperties: false`. Default: `false`
//!
//! ## Usage
//!
//! ```rust
//! use ramlguard::runtime_config::ValidatorConfig;
//!
//! let config = ValidatorConfig::from_env();
//! println!("body limit: {:?}", config.max_body_bytes);
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::Path;

const ENV_SKIP_BODY_METHODS: &str = "RAMLGUARD_SKIP_BODY_METHODS";
const ENV_MAX_BODY_BYTES: &str = "RAMLGUARD_MAX_BODY_BYTES";
const ENV_REJECT_UNKNOWN: &str = "RAMLGUARD_REJECT_UNKNOWN_PROPERTIES";

/// Validation behaviour shared by every request a validator handles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Methods whose body stage is skipped (uppercase)
    pub skip_body_methods: Vec<String>,
    /// Maximum accepted body size in bytes
    pub max_body_bytes: Option<usize>,
    /// Treat undeclared object properties as violations
    pub reject_unknown_properties: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            skip_body_methods: vec!["GET".to_string(), "DELETE".to_string()],
            max_body_bytes: None,
            reject_unknown_properties: false,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from environment variables. Unparseable values
    /// fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(methods) = lookup(ENV_SKIP_BODY_METHODS) {
            config.skip_body_methods = methods
                .split(',')
                .map(|m| m.trim().to_ascii_uppercase())
                .filter(|m| !m.is_empty())
                .collect();
        }
        config.max_body_bytes = lookup(ENV_MAX_BODY_BYTES).and_then(|val| {
            let val = val.trim();
            match val.strip_prefix("0x") {
                Some(hex) => usize::from_str_radix(hex, 16).ok(),
                None => val.parse().ok(),
            }
        });
        if let Some(flag) = lookup(ENV_REJECT_UNKNOWN) {
            config.reject_unknown_properties =
                matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        config
    }

    /// Load configuration from a YAML file; absent keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        };
        for method in &mut config.skip_body_methods {
            *method = method.to_ascii_uppercase();
        }
        Ok(config)
    }

    /// Whether the body stage runs for `method`.
    pub fn validates_body(&self, method: &http::Method) -> bool {
        !self
            .skip_body_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    }
}
