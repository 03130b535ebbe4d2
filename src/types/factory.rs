use super::{
    ArrayType, LazyProxy, ObjectType, PrimitiveKind, PrimitiveType, Type, TypeId, TypeKind,
    TypeRegistry, UnionType,
};
use crate::error::TypeError;
use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

/// Classify a raw type declaration, register the resulting type (and every
/// type it is composed of) in `registry`, and return its handle.
///
/// `definition` is either a type expression (`"string"`, `"Foo[]"`,
/// `"A | B"`) or a mapping with an optional `type` key plus facets. A mapping
/// without `type` is an object when it declares `properties`, otherwise a
/// string. Dispatch on the type expression, in priority order:
///
/// 1. empty or `any`: generic
/// 2. a built-in name: primitive (or object / array for those two names)
/// 3. `|` at the top level: union of each alternative
/// 4. trailing `[]`: array of the remainder
/// 5. anything else: lazy reference to a custom type, or, when the mapping
///    declares `properties`, an object inheriting from it
pub fn determine_type(
    registry: &mut TypeRegistry,
    name: &str,
    definition: &Value,
) -> Result<TypeId, TypeError> {
    let (expr, facets) = normalize(name, definition)?;
    match expr {
        TypeExpr::Parents(parents) => {
            let parents: Vec<&str> = parents.iter().map(String::as_str).collect();
            build_object(registry, name, definition, &facets, &parents)
        }
        TypeExpr::Generic => Ok(registry.register(Type::new(name, definition.clone(), TypeKind::Generic))),
        TypeExpr::Expr(expr) => dispatch(registry, name, &expr, &facets, definition),
    }
}

enum TypeExpr {
    Generic,
    Expr(String),
    Parents(Vec<String>),
}

fn invalid(name: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidDefinition {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn normalize(name: &str, definition: &Value) -> Result<(TypeExpr, Map<String, Value>), TypeError> {
    let facets = match definition {
        Value::String(s) => return Ok((expr_or_null(s), Map::new())),
        Value::Object(map) => map.clone(),
        other => {
            return Err(invalid(
                name,
                format!(
                    "expected a type expression or a mapping, got {}",
                    super::describe_value(other)
                ),
            ))
        }
    };

    let expr = match facets.get("type") {
        None if facets.contains_key("properties") => TypeExpr::Expr("object".to_string()),
        None => TypeExpr::Expr("string".to_string()),
        Some(Value::Null) => TypeExpr::Generic,
        Some(Value::String(s)) => expr_or_null(s),
        Some(Value::Array(items)) => {
            let parents = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|s| s.trim().to_string())
                        .ok_or_else(|| invalid(name, "a list of parent types must contain only names"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            match parents.as_slice() {
                [] => return Err(invalid(name, "empty list of parent types")),
                [single] => expr_or_null(single),
                _ => TypeExpr::Parents(parents),
            }
        }
        Some(other) => {
            return Err(invalid(
                name,
                format!("'type' must be a name or a list of names, got {}", super::describe_value(other)),
            ))
        }
    };
    Ok((expr, facets))
}

fn expr_or_null(s: &str) -> TypeExpr {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        TypeExpr::Expr("null".to_string())
    } else {
        TypeExpr::Expr(trimmed.to_string())
    }
}

fn dispatch(
    registry: &mut TypeRegistry,
    name: &str,
    expr: &str,
    facets: &Map<String, Value>,
    definition: &Value,
) -> Result<TypeId, TypeError> {
    let expr = strip_parens(expr.trim());

    if expr.is_empty() || expr == "any" {
        return Ok(registry.register(Type::new(name, definition.clone(), TypeKind::Generic)));
    }

    if let Some(kind) = PrimitiveKind::parse(expr) {
        return match kind {
            PrimitiveKind::Object => build_object(registry, name, definition, facets, &[]),
            PrimitiveKind::Array => {
                let slot = reserve(registry, name, definition);
                let items = match facets.get("items") {
                    Some(items) => determine_type(registry, name, items)?,
                    None => registry.register(Type::new(name, Value::Null, TypeKind::Generic)),
                };
                finish_array(registry, slot, items, facets)
            }
            _ => {
                let primitive = PrimitiveType::from_facets(name, kind, facets)?
                    .ok_or_else(|| invalid(name, format!("'{kind}' is not a scalar type")))?;
                Ok(registry.register(Type::new(name, definition.clone(), TypeKind::Primitive(primitive))))
            }
        };
    }

    let alternatives = split_top_level(expr, '|');
    if alternatives.len() > 1 {
        let slot = reserve(registry, name, definition);
        let mut members = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            if alternative.trim().is_empty() {
                return Err(invalid(name, format!("empty alternative in '{expr}'")));
            }
            let member = Value::String(alternative.trim().to_string());
            members.push(dispatch(registry, name, alternative, &Map::new(), &member)?);
        }
        registry.replace_kind(slot, TypeKind::Union(UnionType::new(members)));
        return Ok(slot);
    }

    if let Some(item_expr) = expr.strip_suffix("[]") {
        let slot = reserve(registry, name, definition);
        let item_def = Value::String(item_expr.trim().to_string());
        let items = dispatch(registry, name, item_expr, &Map::new(), &item_def)?;
        return finish_array(registry, slot, items, facets);
    }

    if !is_type_name(expr) {
        return Err(invalid(name, format!("malformed type expression '{expr}'")));
    }

    if facets.contains_key("properties") {
        return build_object(registry, name, definition, facets, &[expr]);
    }
    Ok(registry.register(Type::new(name, definition.clone(), TypeKind::Proxy(LazyProxy::new(expr)))))
}

fn reserve(registry: &mut TypeRegistry, name: &str, definition: &Value) -> TypeId {
    registry.register(Type::new(name, definition.clone(), TypeKind::Generic))
}

fn finish_array(
    registry: &mut TypeRegistry,
    slot: TypeId,
    items: TypeId,
    facets: &Map<String, Value>,
) -> Result<TypeId, TypeError> {
    let name = registry.get(slot).map(|t| t.name().to_string()).unwrap_or_default();
    let count = |key: &str| -> Result<Option<usize>, TypeError> {
        facets
            .get(key)
            .map(|v| {
                v.as_u64()
                    .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                    .map(|n| n as usize)
                    .ok_or_else(|| invalid(&name, format!("facet '{key}' must be a non-negative integer")))
            })
            .transpose()
    };
    let mut array = ArrayType::new(items);
    array.min_items = count("minItems")?;
    array.max_items = count("maxItems")?;
    array.unique_items = match facets.get("uniqueItems") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(invalid(&name, "facet 'uniqueItems' must be a boolean")),
    };
    registry.replace_kind(slot, TypeKind::Array(array));
    Ok(slot)
}

fn build_object(
    registry: &mut TypeRegistry,
    name: &str,
    definition: &Value,
    facets: &Map<String, Value>,
    parents: &[&str],
) -> Result<TypeId, TypeError> {
    let slot = reserve(registry, name, definition);

    let parent_ids: Vec<TypeId> = parents
        .iter()
        .map(|parent| {
            registry.register(Type::new(
                name,
                Value::String(parent.to_string()),
                TypeKind::Proxy(LazyProxy::new(*parent)),
            ))
        })
        .collect();

    let mut properties = IndexMap::new();
    let mut required = IndexSet::new();
    match facets.get("properties") {
        None | Some(Value::Null) => {}
        Some(Value::Object(declared)) => {
            for (key, prop_def) in declared {
                let (prop_name, optional) = match key.strip_suffix('?') {
                    Some(stripped) => (stripped, true),
                    None => (key.as_str(), false),
                };
                let explicitly = prop_def.get("required").and_then(Value::as_bool);
                let prop_type = determine_type(registry, &format!("{name}.{prop_name}"), prop_def)?;
                properties.insert(prop_name.to_string(), prop_type);
                if explicitly.unwrap_or(!optional) {
                    required.insert(prop_name.to_string());
                }
            }
        }
        Some(_) => return Err(invalid(name, "'properties' must be a mapping")),
    }

    let additional_properties = match facets.get("additionalProperties") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(invalid(name, "'additionalProperties' must be a boolean")),
    };

    let has_parents = !parent_ids.is_empty();
    let object = ObjectType::new(properties, required, parent_ids, additional_properties);
    registry.replace_kind(slot, TypeKind::Object(object));
    if has_parents {
        registry.mark_pending_inheritance(slot);
    }
    Ok(slot)
}

/// Remove one pair of parentheses wrapping the whole expression, repeatedly.
fn strip_parens(mut expr: &str) -> &str {
    while expr.starts_with('(') && expr.ends_with(')') && closes_at_end(expr) {
        expr = expr[1..expr.len() - 1].trim();
    }
    expr
}

fn closes_at_end(expr: &str) -> bool {
    let mut depth = 0usize;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == expr.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn split_top_level(expr: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&expr[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&expr[start..]);
    parts
}

fn is_type_name(expr: &str) -> bool {
    !expr.is_empty()
        && expr
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
