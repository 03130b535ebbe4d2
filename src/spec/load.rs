use super::build::build_spec;
use super::lookup::ApiSpec;
use crate::error::SpecError;
use anyhow::Context;
use serde_json::Value;
use std::path::Path;

impl ApiSpec {
    /// Build from a document already parsed into generic values.
    pub fn from_value(document: &Value) -> Result<Self, SpecError> {
        build_spec(document)
    }
}

/// Parse a YAML (or JSON) document and build it.
pub fn load_spec_from_str(text: &str) -> Result<ApiSpec, SpecError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| SpecError::InvalidDocument {
        location: "$".to_string(),
        reason: e.to_string(),
    })?;
    build_spec(&value)
}

/// Read and build a contract file. `.json` files are parsed as JSON,
/// everything else as YAML.
pub fn load_spec(file_path: impl AsRef<Path>) -> anyhow::Result<ApiSpec> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read {}", file_path.display()))?;
    let spec = if file_path.extension().is_some_and(|ext| ext == "json") {
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", file_path.display()))?;
        build_spec(&value)
    } else {
        load_spec_from_str(&content)
    };
    spec.with_context(|| format!("Invalid contract {}", file_path.display()))
}
