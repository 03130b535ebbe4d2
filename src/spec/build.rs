use super::lookup::ApiSpec;
use super::types::{ParameterMeta, RouteMeta, METHODS};
use crate::error::SpecError;
use crate::template::apply_variables;
use crate::types::{determine_type, TypeId, TypeRegistry};
use crate::validator::DeclaredResponse;
use http::Method;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};

/// Media type assumed for bodies when the document declares no default.
pub const FALLBACK_MEDIA_TYPE: &str = "application/json";

fn invalid(location: impl Into<String>, reason: impl Into<String>) -> SpecError {
    SpecError::InvalidDocument {
        location: location.into(),
        reason: reason.into(),
    }
}

/// Build an [`ApiSpec`] from a document already parsed into generic values.
///
/// One fresh [`TypeRegistry`] is created per call: declared `types` are
/// registered first, then parameter and body types of every method.
/// Inheritance is applied once everything is registered, and every type
/// reference must resolve.
pub fn build_spec(document: &Value) -> Result<ApiSpec, SpecError> {
    let root = document
        .as_object()
        .ok_or_else(|| invalid("$", "document root must be a mapping"))?;

    let title = root
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let base_path = extract_base_path(root)?;
    let media_types = extract_media_types(root)?;
    let traits = extract_traits(root)?;

    let mut registry = TypeRegistry::new();
    register_types(&mut registry, root)?;

    let mut builder = RouteBuilder {
        registry: &mut registry,
        traits: &traits,
        media_types: &media_types,
        routes: Vec::new(),
    };
    for (key, resource) in root {
        if key.starts_with('/') {
            builder.resource("", key, resource)?;
        }
    }
    let routes = builder.routes;

    registry
        .apply_inheritance()
        .map_err(|source| SpecError::Type {
            location: "types".to_string(),
            source,
        })?;
    let unresolved = registry.check_references();
    if !unresolved.is_empty() {
        return Err(SpecError::UnresolvedReferences(unresolved));
    }

    info!(
        title = %title,
        base_path = %base_path,
        types = registry.len(),
        traits = traits.len(),
        routes = routes.len(),
        "API document loaded"
    );
    Ok(ApiSpec::new(title, base_path, media_types, registry, routes))
}

/// Path component of `baseUri`, with `{version}` filled in from `version`.
fn extract_base_path(root: &Map<String, Value>) -> Result<String, SpecError> {
    let Some(base_uri) = root.get("baseUri") else {
        return Ok(String::new());
    };
    let base_uri = base_uri
        .as_str()
        .ok_or_else(|| invalid("baseUri", "must be a string"))?;
    let base_uri = match root.get("version").map(scalar_text) {
        Some(Some(version)) => base_uri.replace("{version}", &version),
        _ => base_uri.to_string(),
    };
    let path = url::Url::parse(&base_uri)
        .or_else(|_| url::Url::parse(&format!("http://dummy{base_uri}")))
        .map(|u| {
            let p = u.path().trim_end_matches('/');
            if p == "/" || p.is_empty() {
                String::new()
            } else {
                p.to_string()
            }
        })
        .unwrap_or_default();
    Ok(path)
}

fn extract_media_types(root: &Map<String, Value>) -> Result<Vec<String>, SpecError> {
    match root.get("mediaType") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid("mediaType", "must list strings"))
            })
            .collect(),
        Some(_) => Err(invalid("mediaType", "must be a string or a list of strings")),
    }
}

/// Named entries of a section written either as a mapping or as a sequence
/// of single-entry mappings.
fn named_entries(root: &Map<String, Value>, section: &str) -> Result<Vec<(String, Value)>, SpecError> {
    match root.get(section) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Some(Value::Array(items)) => {
            let mut out = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let map = item
                    .as_object()
                    .ok_or_else(|| invalid(format!("{section}[{i}]"), "must be a mapping"))?;
                out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(out)
        }
        Some(_) => Err(invalid(section, "must be a mapping")),
    }
}

fn register_types(registry: &mut TypeRegistry, root: &Map<String, Value>) -> Result<(), SpecError> {
    for (name, definition) in named_entries(root, "types")? {
        let definition = if definition.is_null() { json!("string") } else { definition };
        determine_type(registry, &name, &definition).map_err(|source| SpecError::Type {
            location: format!("types.{name}"),
            source,
        })?;
    }
    Ok(())
}

fn extract_traits(root: &Map<String, Value>) -> Result<IndexMap<String, Value>, SpecError> {
    Ok(named_entries(root, "traits")?.into_iter().collect())
}

/// Text of a scalar value, as template variables carry it.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Rightmost path segment that is not a URI parameter.
pub fn resource_path_name(path: &str) -> &str {
    path.rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.contains('{'))
        .unwrap_or_default()
}

/// Merge `defaults` under `target`: keys already in `target` win, nested
/// mappings merge recursively.
pub fn merge_under(target: &mut Value, defaults: Value) {
    let (Value::Object(target), Value::Object(defaults)) = (target, defaults) else {
        return;
    };
    for (key, value) in defaults {
        match target.get_mut(&key) {
            Some(existing) => merge_under(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

struct RouteBuilder<'a> {
    registry: &'a mut TypeRegistry,
    traits: &'a IndexMap<String, Value>,
    media_types: &'a [String],
    routes: Vec<RouteMeta>,
}

impl RouteBuilder<'_> {
    fn resource(&mut self, parent: &str, key: &str, resource: &Value) -> Result<(), SpecError> {
        let path = format!("{parent}{key}");
        let empty = Map::new();
        let resource = match resource {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => return Err(invalid(&path, "resource must be a mapping")),
        };
        let resource_traits = trait_refs(&path, resource.get("is"))?;

        for method in METHODS {
            if let Some(definition) = resource.get(method) {
                self.method(&path, method, definition, &resource_traits)?;
            }
        }
        for (child_key, child) in resource {
            if child_key.starts_with('/') {
                self.resource(&path, child_key, child)?;
            }
        }
        Ok(())
    }

    fn method(
        &mut self,
        path: &str,
        method_name: &str,
        definition: &Value,
        resource_traits: &[Value],
    ) -> Result<(), SpecError> {
        let location = format!("{path} -> {method_name}");
        let mut merged = match definition {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => definition.clone(),
            _ => return Err(invalid(&location, "method must be a mapping")),
        };

        let mut applied = Vec::new();
        let mut refs = resource_traits.to_vec();
        refs.extend(trait_refs(&location, definition.get("is"))?);
        for reference in &refs {
            let (name, fragment) = self.apply_trait(&location, path, method_name, reference)?;
            if let Some(fragment) = fragment {
                merge_under(&mut merged, fragment);
            }
            applied.push(name);
        }

        let method = Method::from_str(&method_name.to_ascii_uppercase())
            .map_err(|e| invalid(&location, e.to_string()))?;
        let parameters = self.query_parameters(&location, &method, path, merged.get("queryParameters"))?;
        let bodies = self.bodies(&location, &method, path, merged.get("body"))?;
        let responses = self.responses(&location, merged.get("responses"))?;

        debug!(
            method = %method,
            path = %path,
            traits = ?applied,
            parameters = parameters.len(),
            bodies = bodies.len(),
            "Route built"
        );
        self.routes.push(RouteMeta {
            method,
            path_pattern: path.to_string(),
            description: merged.get("description").and_then(Value::as_str).map(str::to_string),
            traits: applied,
            parameters,
            bodies,
            responses,
        });
        Ok(())
    }

    /// Substitute one trait for one method. Reserved variables always win
    /// over caller-supplied ones.
    fn apply_trait(
        &self,
        location: &str,
        path: &str,
        method_name: &str,
        reference: &Value,
    ) -> Result<(String, Option<Value>), SpecError> {
        let (name, params) = match reference {
            Value::String(name) => (name.clone(), None),
            Value::Object(map) if map.len() == 1 => {
                let Some((name, params)) = map.iter().next() else {
                    return Err(invalid(location, "empty trait reference"));
                };
                (name.clone(), Some(params))
            }
            _ => return Err(invalid(location, "trait reference must be a name or a single-entry mapping")),
        };
        let definition = self
            .traits
            .get(&name)
            .ok_or_else(|| invalid(location, format!("unknown trait '{name}'")))?;

        let mut values: HashMap<String, String> = HashMap::new();
        if let Some(params) = params.and_then(Value::as_object) {
            for (key, value) in params {
                let text = scalar_text(value).ok_or_else(|| {
                    invalid(location, format!("trait parameter '{key}' of '{name}' must be a scalar"))
                })?;
                values.insert(key.clone(), text);
            }
        }
        values.insert("resourcePath".into(), path.to_string());
        values.insert("resourcePathName".into(), resource_path_name(path).to_string());
        values.insert("methodName".into(), method_name.to_string());

        let fragment = apply_variables(&values, definition).map_err(|source| SpecError::Template {
            location: format!("{location} is {name}"),
            source,
        })?;
        Ok((name, fragment))
    }

    fn query_parameters(
        &mut self,
        location: &str,
        method: &Method,
        path: &str,
        declared: Option<&Value>,
    ) -> Result<Vec<ParameterMeta>, SpecError> {
        let declared = match declared {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(invalid(location, "queryParameters must be a mapping")),
        };
        let mut out = Vec::with_capacity(declared.len());
        for (key, definition) in declared {
            let (name, optional) = match key.strip_suffix('?') {
                Some(stripped) => (stripped, true),
                None => (key.as_str(), false),
            };
            let definition = if definition.is_null() { json!("string") } else { definition.clone() };
            let required = definition
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(!optional);
            let type_id = determine_type(self.registry, &format!("{method} {path} ?{name}"), &definition)
                .map_err(|source| SpecError::Type {
                    location: format!("{location} queryParameters.{name}"),
                    source,
                })?;
            out.push(ParameterMeta {
                name: name.to_string(),
                required,
                type_id,
            });
        }
        Ok(out)
    }

    fn bodies(
        &mut self,
        location: &str,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<IndexMap<String, TypeId>, SpecError> {
        let mut out = IndexMap::new();
        let Some(body) = body.filter(|b| !b.is_null()) else {
            return Ok(out);
        };
        let register = |registry: &mut TypeRegistry, media_type: &str, definition: &Value| {
            let definition = if definition.is_null() { json!("any") } else { definition.clone() };
            determine_type(registry, &format!("{method} {path} body {media_type}"), &definition).map_err(
                |source| SpecError::Type {
                    location: format!("{location} body {media_type}"),
                    source,
                },
            )
        };

        match body {
            Value::Object(map) if map.keys().any(|k| k.contains('/')) => {
                for (media_type, definition) in map {
                    let id = register(self.registry, media_type, definition)?;
                    out.insert(media_type.to_ascii_lowercase(), id);
                }
            }
            _ => {
                let id = register(self.registry, "default", body)?;
                for media_type in self.default_media_types() {
                    out.insert(media_type.to_ascii_lowercase(), id);
                }
            }
        }
        Ok(out)
    }

    fn responses(&self, location: &str, declared: Option<&Value>) -> Result<Vec<DeclaredResponse>, SpecError> {
        let declared = match declared {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(invalid(location, "responses must be a mapping")),
        };
        let mut out = Vec::with_capacity(declared.len());
        for (status, response) in declared {
            let types = match response.get("body") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Object(map)) if map.keys().any(|k| k.contains('/')) => map.keys().cloned().collect(),
                Some(_) => self.default_media_types(),
            };
            out.push(DeclaredResponse {
                status: status.clone(),
                types,
            });
        }
        Ok(out)
    }

    fn default_media_types(&self) -> Vec<String> {
        if self.media_types.is_empty() {
            vec![FALLBACK_MEDIA_TYPE.to_string()]
        } else {
            self.media_types.to_vec()
        }
    }
}

/// The `is` facet as a list of trait references.
fn trait_refs(location: &str, is: Option<&Value>) -> Result<Vec<Value>, SpecError> {
    match is {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(single @ (Value::String(_) | Value::Object(_))) => Ok(vec![single.clone()]),
        Some(_) => Err(invalid(location, "'is' must list trait references")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_path_name_skips_parameters() {
        assert_eq!(resource_path_name("/users/{id}"), "users");
        assert_eq!(resource_path_name("/users/{id}/messages"), "messages");
        assert_eq!(resource_path_name("/{id}"), "");
    }

    #[test]
    fn merge_keeps_target_keys() {
        let mut target = json!({"description": "mine", "queryParameters": {"a": "string"}});
        merge_under(
            &mut target,
            json!({"description": "theirs", "queryParameters": {"a": "integer", "b": "integer"}}),
        );
        assert_eq!(
            target,
            json!({"description": "mine", "queryParameters": {"a": "string", "b": "integer"}})
        );
    }

    #[test]
    fn base_path_uses_version() {
        let root = json!({"baseUri": "https://api.example.com/{version}/", "version": "v2"});
        assert_eq!(extract_base_path(root.as_object().unwrap()).unwrap(), "/v2");
        let root = json!({"baseUri": "/api"});
        assert_eq!(extract_base_path(root.as_object().unwrap()).unwrap(), "/api");
    }
}
