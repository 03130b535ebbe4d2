//! Error types for type resolution, trait templating, document loading and
//! request validation.
//!
//! Every error carries enough context (type names, method, path) to render a
//! human-readable diagnostic. The hosting service decides how to map them onto
//! its own failure representation (usually an HTTP status).

use crate::validator::ValidationIssue;
use thiserror::Error;

/// Failures raised while building or resolving the type model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The raw declaration has a shape the factory cannot classify.
    #[error("invalid definition for type '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Registry lookup by name found nothing.
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    /// A lazy proxy points at a name that was never declared.
    #[error("type '{name}' is referenced but never declared")]
    UnknownTypeReference { name: String },

    /// An object type inherits from something that is not an object.
    #[error("type '{child}' cannot inherit from '{parent}': parent is not an object type")]
    ExpectedObjectParent { child: String, parent: String },

    /// The parent graph loops back on itself.
    #[error("cyclic inheritance: {}", .chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    /// A chain of bare type references loops back on itself.
    #[error("cyclic type reference: {}", .chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    /// `remove` was handed an instance the registry does not hold.
    #[error("type '{name}' is not registered")]
    NotFound { name: String },
}

/// Failures raised by the trait template engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("placeholder '<<{name}>>' has no value")]
    UnknownVariable { name: String },

    #[error("unknown transform '!{transform}' in placeholder '<<{name}>>'")]
    UnknownTransform { name: String, transform: String },
}

/// Failures raised by the four-stage request validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{method} {path}: none of the declared media types [{}] is acceptable for Accept '{accept}'", .declared.join(", "))]
    InvalidMediaType {
        method: String,
        path: String,
        accept: String,
        declared: Vec<String>,
    },

    #[error("{method} {path}: missing required query parameters: {}", .missing.join(", "))]
    MissingParameters {
        method: String,
        path: String,
        missing: Vec<String>,
    },

    #[error("{method} {path}: query parameter '{parameter}' is invalid: {issue}")]
    ParameterMismatch {
        method: String,
        path: String,
        parameter: String,
        issue: ValidationIssue,
    },

    #[error("{method} {path}: body ({content_type}) is invalid: {}", render_issues(.issues))]
    BodyMismatch {
        method: String,
        path: String,
        content_type: String,
        issues: Vec<ValidationIssue>,
    },

    /// No declared resource and method match the request.
    #[error("{method} {path}: no matching route")]
    RouteNotFound { method: String, path: String },
}

impl ValidationError {
    /// Short, stable name of the failing stage's error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidMediaType { .. } => "InvalidMediaType",
            ValidationError::MissingParameters { .. } => "MissingParameters",
            ValidationError::ParameterMismatch { .. } => "ParameterMismatch",
            ValidationError::BodyMismatch { .. } => "BodyMismatch",
            ValidationError::RouteNotFound { .. } => "RouteNotFound",
        }
    }
}

/// Failures raised while turning a contract document into an [`crate::spec::ApiSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("invalid document at {location}: {reason}")]
    InvalidDocument { location: String, reason: String },

    #[error("at {location}: {source}")]
    Type {
        location: String,
        #[source]
        source: TypeError,
    },

    #[error("at {location}: {source}")]
    Template {
        location: String,
        #[source]
        source: TemplateError,
    },

    #[error("{} unresolved reference(s): {}", .0.len(), render_issues(.0))]
    UnresolvedReferences(Vec<ValidationIssue>),
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_inheritance_renders_chain() {
        let err = TypeError::CyclicInheritance {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic inheritance: A -> B -> A");
    }

    #[test]
    fn missing_parameters_lists_every_name() {
        let err = ValidationError::MissingParameters {
            method: "GET".into(),
            path: "/messages".into(),
            missing: vec!["id".into(), "page".into()],
        };
        assert_eq!(
            err.to_string(),
            "GET /messages: missing required query parameters: id, page"
        );
        assert_eq!(err.kind(), "MissingParameters");
    }
}
