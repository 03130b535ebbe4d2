use crate::types::TypeId;
use crate::validator::DeclaredResponse;
use http::Method;
use indexmap::IndexMap;

/// Method names a resource may declare, in the order they are reported.
pub const METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "head", "options"];

/// One declared method on one resource.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    pub method: Method,
    /// Resource path relative to the base URI, e.g. `/users/{id}`
    pub path_pattern: String,
    pub description: Option<String>,
    /// Traits applied to this method, resource-level first
    pub traits: Vec<String>,
    pub parameters: Vec<ParameterMeta>,
    /// Body type per media type, in declaration order
    pub bodies: IndexMap<String, TypeId>,
    pub responses: Vec<DeclaredResponse>,
}

impl RouteMeta {
    pub fn parameter(&self, name: &str) -> Option<&ParameterMeta> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMeta {
    pub name: String,
    pub required: bool,
    pub type_id: TypeId,
}
