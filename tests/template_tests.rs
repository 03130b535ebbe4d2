#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use http::Method;
use ramlguard::error::TemplateError;
use ramlguard::{apply_variables, load_spec_from_str, SpecError};
use serde_json::json;
use std::collections::HashMap;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_plain_and_transformed_substitution() {
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
fn test_input_tree_is_left_untouched() {
    let values = vars(&[("name", "order")]);
    let tree = json!({"<<name>>Id": {"type": "string", "description": "<<name | !upperCamelCase>> key"}});
    let before = tree.clone();
    let out = apply_variables(&values, &tree).unwrap().unwrap();
    assert_eq!(tree, before);
    assert_eq!(out, json!({"orderId": {"type": "string", "description": "Order key"}}));
}

#[test]
fn test_missing_variable_and_unknown_transform_fail() {
    let err = apply_variables(&HashMap::new(), &json!("<<nope>>")).unwrap_err();
    assert_eq!(err, TemplateError::UnknownVariable { name: "nope".into() });

    let values = vars(&[("x", "y")]);
    let err = apply_variables(&values, &json!("<<x | !shout>>")).unwrap_err();
    assert!(matches!(err, TemplateError::UnknownTransform { .. }), "{err}");
}

#[test]
fn test_traits_are_applied_to_routes() {
    let api = common::messages_api();
    let route = api.route(&Method::GET, "/v2/messages").unwrap();
    assert_eq!(route.traits, vec!["paged"]);
    assert_eq!(route.description.as_deref(), Some("Page through message records"));

    let names: Vec<&str> = route.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "limit"]);
    assert!(route.parameter("id").unwrap().required);
    assert!(!route.parameter("limit").unwrap().required);
}

#[test]
fn test_method_keys_win_over_trait_keys() {
    let api = load_spec_from_str(
        r#"
traits:
  described:
    description: from the trait
    queryParameters:
      q: string
/items:
  get:
    is: [described]
    description: from the method
"#,
    )
    .unwrap();
    let route = api.route(&Method::GET, "/items").unwrap();
    assert_eq!(route.description.as_deref(), Some("from the method"));
    assert!(route.parameter("q").is_some());
}

#[test]
fn test_unknown_trait_is_rejected() {
    let err = load_spec_from_str("/items:\n  get:\n    is: [missing]\n").unwrap_err();
    let SpecError::InvalidDocument { reason, .. } = err else {
        panic!("expected an invalid document, got {err}");
    };
    assert!(reason.contains("missing"));
}
