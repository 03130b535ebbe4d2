use super::{NamedParameter, SchemaLookup};
use crate::error::ValidationError;
use crate::request::ValidationRequest;
use crate::types::ValidationOptions;
use serde_json::Value;
use tracing::debug;

/// Every declared required query parameter must be present. All missing
/// names are reported together, in declaration order.
pub(crate) fn check_required(
    lookup: &dyn SchemaLookup,
    req: &ValidationRequest,
) -> Result<(), ValidationError> {
    let present = req.query_params();
    let missing: Vec<String> = lookup
        .query_parameters(&req.method, &req.path, true)
        .into_iter()
        .filter(|p| !present.contains_key(&p.name))
        .map(|p| p.name)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ValidationError::MissingParameters {
        method: req.method.to_string(),
        path: req.path.clone(),
        missing,
    })
}

/// Validate each declared parameter that the request supplies. The first
/// violation aborts the stage.
pub(crate) fn check_values(
    lookup: &dyn SchemaLookup,
    req: &ValidationRequest,
    options: &ValidationOptions,
) -> Result<(), ValidationError> {
    let present = req.query_params();
    let registry = lookup.registry();
    let textual = ValidationOptions {
        mode: crate::types::ValueMode::Textual,
        ..*options
    };
    for NamedParameter { name, type_id, .. } in lookup.query_parameters(&req.method, &req.path, false) {
        let Some(values) = present.get(&name) else {
            continue;
        };
        let value = match values.as_slice() {
            [single] => Value::String(single.clone()),
            many => Value::Array(many.iter().cloned().map(Value::String).collect()),
        };
        if let Err(issues) = registry.validate_with(type_id, &value, &textual) {
            debug!(parameter = %name, issues = issues.len(), "Query parameter rejected");
            let Some(mut issue) = issues.into_iter().next() else {
                continue;
            };
            issue.location = issue.location.replacen('$', &name, 1);
            return Err(ValidationError::ParameterMismatch {
                method: req.method.to_string(),
                path: req.path.clone(),
                parameter: name,
                issue,
            });
        }
    }
    Ok(())
}
