use super::{SchemaLookup, ValidationIssue};
use crate::decoder::Decoders;
use crate::error::ValidationError;
use crate::request::ValidationRequest;
use crate::runtime_config::ValidatorConfig;
use crate::types::ValidationOptions;
use tracing::debug;

/// Decode the body per its content type and validate it against the declared
/// body type, collecting every violation.
pub(crate) fn check_body(
    lookup: &dyn SchemaLookup,
    decoders: &Decoders,
    config: &ValidatorConfig,
    req: &ValidationRequest,
) -> Result<(), ValidationError> {
    let declared = lookup.request_body_types(&req.method, &req.path);
    if declared.is_empty() {
        debug!(method = %req.method, path = %req.path, "No body declared");
        return Ok(());
    }
    let Some(content_type) = req.content_type() else {
        return Err(mismatch(
            req,
            "",
            vec![ValidationIssue::new(
                "$",
                "contentType",
                format!("missing Content-Type header, expected one of [{}]", declared.join(", ")),
            )],
        ));
    };
    let Some(body_type) = lookup.request_body(&req.method, &req.path, &content_type) else {
        return Err(mismatch(
            req,
            &content_type,
            vec![ValidationIssue::new(
                "$",
                "contentType",
                format!("'{content_type}' is not declared, expected one of [{}]", declared.join(", ")),
            )],
        ));
    };

    if let Some(limit) = config.max_body_bytes.filter(|limit| req.body.len() > *limit) {
        return Err(mismatch(
            req,
            &content_type,
            vec![ValidationIssue::new(
                "$",
                "size",
                format!("{} bytes exceeds the {limit} byte limit", req.body.len()),
            )],
        ));
    }

    let Some(decoder) = decoders.get(&content_type) else {
        return Err(mismatch(
            req,
            &content_type,
            vec![ValidationIssue::new("$", "decode", "no decoder for this content type")],
        ));
    };
    let value = decoder
        .decode(&req.body)
        .map_err(|e| mismatch(req, &content_type, vec![ValidationIssue::new("$", "decode", e.reason)]))?;

    let options = ValidationOptions {
        mode: decoder.mode(),
        reject_unknown_properties: config.reject_unknown_properties,
    };
    lookup
        .registry()
        .validate_with(body_type, &value, &options)
        .map_err(|issues| mismatch(req, &content_type, issues))
}

fn mismatch(req: &ValidationRequest, content_type: &str, issues: Vec<ValidationIssue>) -> ValidationError {
    ValidationError::BodyMismatch {
        method: req.method.to_string(),
        path: req.path.clone(),
        content_type: content_type.to_string(),
        issues,
    }
}
