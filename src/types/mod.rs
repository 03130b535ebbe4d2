//! # Type Model
//!
//! Declarative type definitions are classified into a small closed set of
//! variants and stored in a [`TypeRegistry`] arena. Variants refer to each
//! other by [`TypeId`] handle, never by pointer, so forward references and
//! cyclic graphs need no shared ownership.
//!
//! ## Lifecycle
//!
//! 1. A fresh registry is constructed for one build session.
//! 2. [`determine_type`] classifies each raw definition and registers the
//!    resulting types. Object types with parents are queued for inheritance.
//! 3. [`TypeRegistry::apply_inheritance`] resolves the queued objects once,
//!    after every definition is registered.
//! 4. The registry is then read-only and can be shared behind an `Arc`
//!    across any number of concurrent validations. Lazy proxies memoize their
//!    resolution through a `OnceCell`, which stays safe under shared access.
//!
//! ```rust
//! use ramlguard::types::{determine_type, TypeRegistry};
//! use serde_json::json;
//!
//! let mut registry = TypeRegistry::new();
//! let list = determine_type(&mut registry, "Tags", &json!("Tag[]")).unwrap();
//! determine_type(&mut registry, "Tag", &json!({"type": "string", "maxLength": 8})).unwrap();
//! registry.apply_inheritance().unwrap();
//!
//! assert!(registry.validate(list, &json!(["a", "b"])).is_ok());
//! assert!(registry.validate(list, &json!(["far too long"])).is_err());
//! ```

mod composite;
mod factory;
mod object;
mod primitive;
mod proxy;
mod registry;
mod validate;

pub use composite::{ArrayType, UnionType};
pub use factory::determine_type;
pub use object::ObjectType;
pub use primitive::{
    describe_value, DateTimeFormat, FileFacets, NumberFacets, NumberFormat, PrimitiveKind,
    PrimitiveType, StringFacets,
};
pub use proxy::LazyProxy;
pub use registry::TypeRegistry;
pub use validate::{ValidationOptions, ValueMode};

use serde_json::Value;
use std::fmt;

/// Handle of a type inside its [`TypeRegistry`].
///
/// Handles are the identity of a type: two types with the same name are still
/// distinct instances with distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the resolved schema model.
#[derive(Debug, Clone)]
pub struct Type {
    name: String,
    definition: Value,
    kind: TypeKind,
}

/// The closed set of type variants.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// No type keyword or `any`; accepts every value.
    Generic,
    Primitive(PrimitiveType),
    Object(ObjectType),
    Union(UnionType),
    Array(ArrayType),
    /// Forward reference to a type declared elsewhere, resolved on first use.
    Proxy(LazyProxy),
}

impl Type {
    pub fn new(name: impl Into<String>, definition: Value, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            definition,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaration this type was built from, as written.
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match &self.kind {
            TypeKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&LazyProxy> {
        match &self.kind {
            TypeKind::Proxy(p) => Some(p),
            _ => None,
        }
    }

    /// Name of the variant, for logs and diagnostics.
    pub fn variant(&self) -> &'static str {
        match &self.kind {
            TypeKind::Generic => "generic",
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Object(_) => "object",
            TypeKind::Union(_) => "union",
            TypeKind::Array(_) => "array",
            TypeKind::Proxy(_) => "proxy",
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut TypeKind {
        &mut self.kind
    }
}
