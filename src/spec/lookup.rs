use super::types::RouteMeta;
use crate::types::{TypeId, TypeRegistry};
use crate::validator::{DeclaredResponse, NamedParameter, SchemaLookup};
use http::Method;
use regex::Regex;
use tracing::debug;

/// A loaded contract: resolved types plus the route table.
///
/// Immutable once built. Wrap it in an `Arc` to share it between validators
/// and threads.
#[derive(Debug)]
pub struct ApiSpec {
    title: String,
    base_path: String,
    media_types: Vec<String>,
    registry: TypeRegistry,
    routes: Vec<CompiledRoute>,
}

#[derive(Debug)]
struct CompiledRoute {
    regex: Regex,
    param_names: Vec<String>,
    meta: RouteMeta,
}

impl ApiSpec {
    pub(crate) fn new(
        title: String,
        base_path: String,
        media_types: Vec<String>,
        registry: TypeRegistry,
        routes: Vec<RouteMeta>,
    ) -> Self {
        let mut routes: Vec<CompiledRoute> = routes
            .into_iter()
            .map(|meta| {
                let full_path = format!("{base_path}{}", meta.path_pattern);
                let (regex, param_names) = path_to_regex(&full_path);
                CompiledRoute {
                    regex,
                    param_names,
                    meta,
                }
            })
            .collect();
        // Literal segments beat parameters: `/users/me` before `/users/{id}`.
        routes.sort_by_key(|r| r.param_names.len());
        Self {
            title,
            base_path,
            media_types,
            registry,
            routes,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Path component of `baseUri`, without a trailing slash.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// API-wide default media types (`mediaType`).
    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Handle of a declared type.
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.registry.lookup(name).ok()
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteMeta> + '_ {
        self.routes.iter().map(|r| &r.meta)
    }

    /// Match a request path (including the base path) against the route table.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<&RouteMeta> {
        let found = self
            .routes
            .iter()
            .find(|r| r.meta.method == *method && r.regex.is_match(path))
            .map(|r| &r.meta);
        debug!(method = %method, path = %path, matched = found.is_some(), "Route lookup");
        found
    }

    /// URI parameters captured from `path` by the matching route.
    pub fn path_params(&self, method: &Method, path: &str) -> Vec<(String, String)> {
        self.routes
            .iter()
            .filter(|r| r.meta.method == *method)
            .find_map(|r| {
                let caps = r.regex.captures(path)?;
                Some(
                    r.param_names
                        .iter()
                        .zip(caps.iter().skip(1))
                        .filter_map(|(name, m)| m.map(|m| (name.clone(), m.as_str().to_string())))
                        .collect(),
                )
            })
            .unwrap_or_default()
    }
}

impl SchemaLookup for ApiSpec {
    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn has_route(&self, method: &Method, path: &str) -> bool {
        self.route(method, path).is_some()
    }

    fn query_parameters(&self, method: &Method, path: &str, required_only: bool) -> Vec<NamedParameter> {
        self.route(method, path)
            .map(|route| {
                route
                    .parameters
                    .iter()
                    .filter(|p| !required_only || p.required)
                    .map(|p| NamedParameter {
                        name: p.name.clone(),
                        type_id: p.type_id,
                        required: p.required,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn request_body(&self, method: &Method, path: &str, content_type: &str) -> Option<TypeId> {
        let route = self.route(method, path)?;
        route.bodies.get(&content_type.to_ascii_lowercase()).copied()
    }

    fn request_body_types(&self, method: &Method, path: &str) -> Vec<String> {
        self.route(method, path)
            .map(|route| route.bodies.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn responses(&self, method: &Method, path: &str) -> Vec<DeclaredResponse> {
        self.route(method, path)
            .map(|route| route.responses.clone())
            .unwrap_or_default()
    }

    fn default_media_types(&self) -> Vec<String> {
        self.media_types.clone()
    }
}

/// Convert a path template to an anchored regex and its parameter names.
///
/// `/users/{id}/posts/{postId}` becomes `^/users/([^/]+)/posts/([^/]+)$`
/// with parameters `["id", "postId"]`. Literal segments are escaped.
pub fn path_to_regex(path: &str) -> (Regex, Vec<String>) {
    let mut pattern = String::with_capacity(path.len() + 5);
    pattern.push('^');
    let mut param_names = Vec::with_capacity(path.matches('{').count());

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        pattern.push('/');
        if segment.starts_with('{') && segment.ends_with('}') {
            param_names.push(segment.trim_start_matches('{').trim_end_matches('}').to_string());
            pattern.push_str("([^/]+)");
        } else {
            pattern.push_str(&regex::escape(segment));
        }
    }
    if param_names.is_empty() && pattern == "^" {
        pattern.push('/');
    }
    pattern.push_str("/?$");
    // Every literal is escaped, so the pattern is always valid.
    let regex = Regex::new(&pattern).expect("Failed to compile path regex");
    (regex, param_names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_segments_become_captures() {
        let (regex, params) = path_to_regex("/users/{id}/posts/{postId}");
        assert_eq!(params, vec!["id", "postId"]);
        assert!(regex.is_match("/users/1/posts/abc"));
        assert!(regex.is_match("/users/1/posts/abc/"));
        assert!(!regex.is_match("/users/1/posts"));
        assert!(!regex.is_match("/users/1/2/posts/abc"));
    }

    #[test]
    fn literals_are_escaped() {
        let (regex, _) = path_to_regex("/v1.0/items");
        assert!(regex.is_match("/v1.0/items"));
        assert!(!regex.is_match("/v1x0/items"));
    }

    #[test]
    fn root_path() {
        let (regex, params) = path_to_regex("/");
        assert!(params.is_empty());
        assert!(regex.is_match("/"));
        assert!(!regex.is_match("/x"));
    }
}
