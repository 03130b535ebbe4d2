//! # Trait Templates
//!
//! Reusable definition fragments (traits) are parameterised with
//! `<<name>>` placeholders. [`apply_variables`] substitutes them throughout a
//! definition tree, in both map keys and string leaves, optionally piping the
//! value through a chain of transforms: `<<resourcePathName | !singularize | !upperCamelCase>>`.
//!
//! The function is pure. It never mutates its input and holds no state.

mod inflect;

pub use inflect::{pluralize, singularize, Transform};

use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<<\s*([A-Za-z_][A-Za-z0-9_]*)\s*((?:\|\s*![^|>]*?\s*)*)>>")
        .expect("placeholder regex should be valid")
});

/// Substitute every placeholder in `tree` using `values`.
///
/// Returns `Ok(None)` when the whole tree collapses to nothing: an empty root
/// string is absent rather than substituted. Empty string leaves inside maps
/// and sequences are dropped from the output.
pub fn apply_variables(
    values: &HashMap<String, String>,
    tree: &Value,
) -> Result<Option<Value>, TemplateError> {
    match tree {
        Value::String(s) => {
            if s.is_empty() {
                return Ok(None);
            }
            let out = substitute(values, s)?;
            Ok((!out.is_empty()).then_some(Value::String(out)))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = apply_variables(values, item)? {
                    out.push(v);
                }
            }
            Ok(Some(Value::Array(out)))
        }
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                let key = substitute(values, key)?;
                if key.is_empty() {
                    continue;
                }
                if let Some(v) = apply_variables(values, value)? {
                    out.insert(key, v);
                }
            }
            Ok(Some(Value::Object(out)))
        }
        other => Ok(Some(other.clone())),
    }
}

/// Substitute the placeholders of a single string.
pub fn substitute(values: &HashMap<String, String>, input: &str) -> Result<String, TemplateError> {
    if !input.contains("<<") {
        return Ok(input.to_string());
    }
    let mut failure = None;
    let out = PLACEHOLDER.replace_all(input, |caps: &Captures<'_>| {
        match render(values, caps) {
            Ok(s) => s,
            Err(err) => {
                failure.get_or_insert(err);
                String::new()
            }
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(out.into_owned()),
    }
}

fn render(values: &HashMap<String, String>, caps: &Captures<'_>) -> Result<String, TemplateError> {
    let name = &caps[1];
    let mut value = values
        .get(name)
        .cloned()
        .ok_or_else(|| TemplateError::UnknownVariable {
            name: name.to_string(),
        })?;
    let pipeline = caps.get(2).map_or("", |m| m.as_str());
    for token in pipeline.split('|').map(str::trim).filter(|t| !t.is_empty()) {
        let transform_name = token.trim_start_matches('!').trim();
        let transform = Transform::parse(transform_name).ok_or_else(|| TemplateError::UnknownTransform {
            name: name.to_string(),
            transform: transform_name.to_string(),
        })?;
        value = transform.apply(&value);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_plain_and_transformed_placeholders() {
        let values = vars(&[("resourcePathName", "message")]);
        let out = apply_variables(&values, &json!({"description": "Get a <<resourcePathName>>"})).unwrap();
        assert_eq!(out, Some(json!({"description": "Get a message"})));

        let out = apply_variables(
            &values,
            &json!({"description": "<<resourcePathName | !pluralize>>"}),
        )
        .unwrap();
        assert_eq!(out, Some(json!({"description": "messages"})));
    }

    #[test]
    fn keys_and_nested_values_are_substituted() {
        let values = vars(&[("field", "userId"), ("kind", "integer")]);
        let tree = json!({
            "queryParameters": {
                "<<field | !lower_underscore_case>>": {"type": "<<kind>>"},
                "tags": ["<<field>>", "<<kind>>-<<field|!uppercase>>"]
            }
        });
        let out = apply_variables(&values, &tree).unwrap().unwrap();
        assert_eq!(
            out,
            json!({
                "queryParameters": {
                    "user_id": {"type": "integer"},
                    "tags": ["userId", "integer-USERID"]
                }
            })
        );
    }

    #[test]
    fn transforms_chain_left_to_right() {
        let values = vars(&[("name", "user_accounts")]);
        assert_eq!(
            substitute(&values, "<<name | !singularize | !upperCamelCase>>").unwrap(),
            "UserAccount"
        );
    }

    #[test]
    fn empty_strings_are_absent() {
        let values = vars(&[("blank", "")]);
        assert_eq!(apply_variables(&values, &json!("")).unwrap(), None);
        assert_eq!(apply_variables(&values, &json!("<<blank>>")).unwrap(), None);
        assert_eq!(
            apply_variables(&values, &json!({"a": "<<blank>>", "b": 1})).unwrap(),
            Some(json!({"b": 1}))
        );
    }

    #[test]
    fn unknown_variables_and_transforms_fail() {
        let values = vars(&[("x", "y")]);
        assert_eq!(
            substitute(&values, "<<missing>>").unwrap_err(),
            TemplateError::UnknownVariable {
                name: "missing".into()
            }
        );
        assert!(matches!(
            substitute(&values, "<<x | !shout>>").unwrap_err(),
            TemplateError::UnknownTransform { .. }
        ));
    }

    #[test]
    fn substitution_is_pure() {
        let values = vars(&[("v", "thing")]);
        let tree = json!({"a": "<<v>>"});
        let first = apply_variables(&values, &tree).unwrap();
        let second = apply_variables(&values, &tree).unwrap();
        assert_eq!(first, second);
        assert_eq!(tree, json!({"a": "<<v>>"}));
    }
}
