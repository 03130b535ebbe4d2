use super::{describe_value, ArrayType, ObjectType, TypeId, TypeKind, TypeRegistry, UnionType};
use crate::error::TypeError;
use crate::validator::ValidationIssue;
use serde_json::Value;

/// How scalar values reach the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueMode {
    /// Values carry their own JSON type (JSON or YAML bodies).
    #[default]
    Typed,
    /// Every scalar arrives as text (query strings, form bodies) and is
    /// coerced to the declared kind before checking.
    Textual,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    pub mode: ValueMode,
    /// Treat every object as if it declared `additionalProperties: false`.
    pub reject_unknown_properties: bool,
}

impl ValidationOptions {
    #[must_use]
    pub fn textual() -> Self {
        Self {
            mode: ValueMode::Textual,
            ..Self::default()
        }
    }
}

impl TypeRegistry {
    /// Validate a typed value, collecting every violation.
    pub fn validate(&self, id: TypeId, value: &Value) -> Result<(), Vec<ValidationIssue>> {
        self.validate_with(id, value, &ValidationOptions::default())
    }

    pub fn validate_with(
        &self,
        id: TypeId,
        value: &Value,
        options: &ValidationOptions,
    ) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        self.check(id, value, "$", options, &mut issues, &mut Vec::new());
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// `entered` holds the unions and proxies already entered for this same
    /// value. Descending into a field or an element starts a fresh list.
    fn check(
        &self,
        id: TypeId,
        value: &Value,
        location: &str,
        options: &ValidationOptions,
        issues: &mut Vec<ValidationIssue>,
        entered: &mut Vec<TypeId>,
    ) {
        let Some(ty) = self.get(id) else {
            issues.push(ValidationIssue::new(location, "reference", format!("type {id} is not registered")));
            return;
        };
        if entered.contains(&id) {
            let mut chain: Vec<String> = entered
                .iter()
                .filter_map(|e| self.get(*e).map(|t| t.name().to_string()))
                .collect();
            chain.push(ty.name().to_string());
            let err = TypeError::CyclicReference { chain };
            issues.push(ValidationIssue::new(location, "reference", err.to_string()));
            return;
        }
        match ty.kind() {
            TypeKind::Generic => {}
            TypeKind::Primitive(primitive) => {
                if let Err(issue) = primitive.check(value, location, options.mode) {
                    issues.push(issue);
                }
            }
            TypeKind::Proxy(_) => match self.resolve_proxy(id) {
                Ok(target) => {
                    entered.push(id);
                    self.check(target, value, location, options, issues, entered);
                    entered.pop();
                }
                Err(err) => issues.push(ValidationIssue::new(location, "reference", err.to_string())),
            },
            TypeKind::Object(object) => self.check_object(object, value, location, options, issues),
            TypeKind::Union(union) => {
                entered.push(id);
                self.check_union(union, value, location, options, issues, entered);
                entered.pop();
            }
            TypeKind::Array(array) => self.check_array(array, value, location, options, issues),
        }
    }

    fn check_object(
        &self,
        object: &ObjectType,
        value: &Value,
        location: &str,
        options: &ValidationOptions,
        issues: &mut Vec<ValidationIssue>,
    ) {
        // Textual sources can only carry an object as embedded JSON.
        let parsed;
        let value = match value {
            Value::String(s) if options.mode == ValueMode::Textual => {
                match serde_json::from_str::<Value>(s) {
                    Ok(v) => {
                        parsed = v;
                        &parsed
                    }
                    Err(_) => value,
                }
            }
            _ => value,
        };
        let Value::Object(fields) = value else {
            issues.push(ValidationIssue::new(
                location,
                "type",
                format!("expected object, got {}", describe_value(value)),
            ));
            return;
        };

        for name in object.required() {
            if !fields.contains_key(name) {
                issues.push(ValidationIssue::new(
                    format!("{location}.{name}"),
                    "required",
                    "missing required property",
                ));
            }
        }
        let closed = !object.additional_properties || options.reject_unknown_properties;
        for (name, field) in fields {
            let field_location = format!("{location}.{name}");
            match object.properties().get(name) {
                Some(prop) => self.check(*prop, field, &field_location, options, issues, &mut Vec::new()),
                None if closed => issues.push(ValidationIssue::new(
                    field_location,
                    "additionalProperties",
                    "property is not declared",
                )),
                None => {}
            }
        }
    }

    fn check_union(
        &self,
        union: &UnionType,
        value: &Value,
        location: &str,
        options: &ValidationOptions,
        issues: &mut Vec<ValidationIssue>,
        entered: &mut Vec<TypeId>,
    ) {
        let mut reasons = Vec::with_capacity(union.members().len());
        for member in union.members() {
            let mut member_issues = Vec::new();
            self.check(*member, value, location, options, &mut member_issues, entered);
            if member_issues.is_empty() {
                return;
            }
            let detail = member_issues
                .iter()
                .map(|i| format!("{}: {}", i.location, i.message))
                .collect::<Vec<_>>()
                .join(", ");
            reasons.push(format!("{} ({detail})", self.describe(*member)));
        }
        issues.push(ValidationIssue::new(
            location,
            "union",
            format!("value matches no member: {}", reasons.join("; ")),
        ));
    }

    fn check_array(
        &self,
        array: &ArrayType,
        value: &Value,
        location: &str,
        options: &ValidationOptions,
        issues: &mut Vec<ValidationIssue>,
    ) {
        // Textual sources carry arrays comma-separated.
        let split;
        let items: &[Value] = match value {
            Value::Array(items) => items,
            Value::String(s) if options.mode == ValueMode::Textual => {
                split = s
                    .split(',')
                    .filter(|p| !p.is_empty())
                    .map(|p| Value::String(p.trim().to_string()))
                    .collect::<Vec<_>>();
                &split
            }
            _ => {
                issues.push(ValidationIssue::new(
                    location,
                    "type",
                    format!("expected array, got {}", describe_value(value)),
                ));
                return;
            }
        };

        for (i, item) in items.iter().enumerate() {
            self.check(array.items(), item, &format!("{location}[{i}]"), options, issues, &mut Vec::new());
        }

        if let Some(min) = array.min_items.filter(|min| items.len() < *min) {
            issues.push(ValidationIssue::new(
                location,
                "minItems",
                format!("{} item(s), at least {min} required", items.len()),
            ));
        }
        if let Some(max) = array.max_items.filter(|max| items.len() > *max) {
            issues.push(ValidationIssue::new(
                location,
                "maxItems",
                format!("{} item(s), at most {max} allowed", items.len()),
            ));
        }
        if array.unique_items {
            let duplicate = items
                .iter()
                .enumerate()
                .any(|(i, item)| items[..i].contains(item));
            if duplicate {
                issues.push(ValidationIssue::new(location, "uniqueItems", "items are not unique"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::determine_type;
    use serde_json::json;

    fn registry_with(types: &[(&str, Value)]) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for (name, def) in types {
            determine_type(&mut registry, name, def).unwrap();
        }
        registry.apply_inheritance().unwrap();
        registry
    }

    #[test]
    fn object_collects_every_property_violation() {
        let registry = registry_with(&[(
            "Message",
            json!({"properties": {"id": "integer", "text": {"type": "string", "maxLength": 5}, "sent": "boolean"}}),
        )]);
        let id = registry.lookup("Message").unwrap();
        let issues = registry
            .validate(id, &json!({"id": "x", "text": "far too long"}))
            .unwrap_err();
        let locations: Vec<&str> = issues.iter().map(|i| i.location.as_str()).collect();
        assert_eq!(locations, vec!["$.sent", "$.id", "$.text"]);
    }

    #[test]
    fn closed_objects_reject_unknown_properties() {
        let registry = registry_with(&[(
            "Point",
            json!({"properties": {"x": "number"}, "additionalProperties": false}),
        )]);
        let id = registry.lookup("Point").unwrap();
        let issues = registry.validate(id, &json!({"x": 1, "y": 2})).unwrap_err();
        assert_eq!(issues[0].kind, "additionalProperties");

        let open = registry_with(&[("Open", json!({"properties": {"x": "number"}}))]);
        let id = open.lookup("Open").unwrap();
        assert!(open.validate(id, &json!({"x": 1, "y": 2})).is_ok());
        let strict = ValidationOptions {
            reject_unknown_properties: true,
            ..ValidationOptions::default()
        };
        assert!(open.validate_with(id, &json!({"x": 1, "y": 2}), &strict).is_err());
    }

    #[test]
    fn union_accepts_any_member_and_aggregates_failures() {
        let registry = registry_with(&[("Id", json!("integer | date-only"))]);
        let id = registry.lookup("Id").unwrap();
        assert!(registry.validate(id, &json!(7)).is_ok());
        assert!(registry.validate(id, &json!("2020-01-01")).is_ok());

        let issues = registry.validate(id, &json!(true)).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "union");
        assert!(issues[0].message.contains("integer"));
        assert!(issues[0].message.contains("date-only"));
    }

    #[test]
    fn array_reports_every_bad_element_then_cardinality() {
        let registry = registry_with(&[(
            "Ids",
            json!({"type": "integer[]", "maxItems": 2, "uniqueItems": true}),
        )]);
        let id = registry.lookup("Ids").unwrap();
        let issues = registry.validate(id, &json!([1, "a", "b", 1])).unwrap_err();
        let kinds: Vec<&str> = issues.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["type", "type", "maxItems", "uniqueItems"]);
        assert_eq!(issues[0].location, "$[1]");
    }

    #[test]
    fn textual_mode_coerces_scalars_and_lists() {
        let registry = registry_with(&[("Ids", json!("integer[]"))]);
        let id = registry.lookup("Ids").unwrap();
        let textual = ValidationOptions::textual();
        assert!(registry.validate_with(id, &json!("1,2,3"), &textual).is_ok());
        assert!(registry.validate_with(id, &json!("1,x"), &textual).is_err());
    }

    #[test]
    fn inherited_properties_are_validated() {
        let registry = registry_with(&[
            ("Base", json!({"properties": {"id": "integer"}})),
            ("Child", json!({"type": "Base", "properties": {"name": "string"}})),
        ]);
        let id = registry.lookup("Child").unwrap();
        let issues = registry.validate(id, &json!({"name": "n"})).unwrap_err();
        assert_eq!(issues[0].location, "$.id");
        assert_eq!(issues[0].kind, "required");
    }

    #[test]
    fn self_containing_union_terminates() {
        let registry = registry_with(&[("A", json!("A | string"))]);
        let id = registry.lookup("A").unwrap();
        assert!(registry.validate(id, &json!("s")).is_ok());

        let issues = registry.validate(id, &json!(5)).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "union");
        assert!(issues[0].message.contains("cyclic"), "{}", issues[0].message);
    }

    #[test]
    fn recursive_arrays_still_validate_nested_values() {
        let registry = registry_with(&[("Nested", json!("integer | Nested[]"))]);
        let id = registry.lookup("Nested").unwrap();
        assert!(registry.validate(id, &json!([1, [2, [3]]])).is_ok());
        assert!(registry.validate(id, &json!([1, ["x"]])).is_err());
    }

    #[test]
    fn unresolved_reference_is_reported_at_its_location() {
        let registry = registry_with(&[("Box", json!({"properties": {"item": "Missing"}}))]);
        let id = registry.lookup("Box").unwrap();
        let issues = registry.validate(id, &json!({"item": 1})).unwrap_err();
        assert_eq!(issues[0].location, "$.item");
        assert_eq!(issues[0].kind, "reference");
    }
}
