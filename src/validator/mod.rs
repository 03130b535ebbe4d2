//! # Request Validation
//!
//! [`RequestValidator`] checks one request against a resolved contract in
//! four fixed stages. The first failing stage stops the pipeline and its
//! error is returned; later stages are not attempted.
//!
//! 1. **Media type**: the `Accept` header must negotiate one of the declared
//!    response media types (or the API-wide defaults).
//! 2. **Required parameters**: every required query parameter is present.
//! 3. **Parameter values**: every supplied declared parameter satisfies its type.
//! 4. **Body**: the decoded body satisfies the declared body type. All
//!    violations are collected. Skipped for `GET` and `DELETE` by default.
//!
//! The contract is reached through the [`SchemaLookup`] trait, which
//! [`crate::spec::ApiSpec`] implements. A validator holds no per-request
//! state and can be shared across threads.

mod body;
mod issue;
mod media;
mod params;

pub use issue::{print_issues, ValidationIssue};
pub use media::{negotiate, parse_accept, MediaRange};

use crate::decoder::Decoders;
use crate::error::ValidationError;
use crate::request::ValidationRequest;
use crate::runtime_config::ValidatorConfig;
use crate::types::{TypeId, TypeRegistry, ValidationOptions};
use http::Method;
use std::sync::Arc;
use tracing::{debug, warn};

/// A declared query parameter and the type its value must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedParameter {
    pub name: String,
    pub type_id: TypeId,
    pub required: bool,
}

/// Media types one declared response can be produced in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeclaredResponse {
    pub status: String,
    pub types: Vec<String>,
}

/// Read access to a resolved contract, keyed by request method and path.
pub trait SchemaLookup: Send + Sync {
    /// Registry every returned [`TypeId`] belongs to.
    fn registry(&self) -> &TypeRegistry;

    /// Whether any declared resource and method match.
    fn has_route(&self, method: &Method, path: &str) -> bool;

    /// Declared query parameters, in declaration order.
    fn query_parameters(&self, method: &Method, path: &str, required_only: bool) -> Vec<NamedParameter>;

    /// Declared body type for a content type (already stripped of parameters).
    fn request_body(&self, method: &Method, path: &str, content_type: &str) -> Option<TypeId>;

    /// Media types a body is declared for, in declaration order. Empty when
    /// the method takes no body.
    fn request_body_types(&self, method: &Method, path: &str) -> Vec<String>;

    fn responses(&self, method: &Method, path: &str) -> Vec<DeclaredResponse>;

    /// API-wide media types used when a method declares none.
    fn default_media_types(&self) -> Vec<String>;
}

/// Outcome of a request that passed every stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validated {
    /// Response media type chosen by negotiation, if any types were declared.
    pub media_type: Option<String>,
}

/// Four-stage request validator over a shared contract.
#[derive(Clone)]
pub struct RequestValidator {
    lookup: Arc<dyn SchemaLookup>,
    decoders: Decoders,
    config: ValidatorConfig,
}

impl std::fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestValidator")
            .field("decoders", &self.decoders)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RequestValidator {
    pub fn new(lookup: Arc<dyn SchemaLookup>) -> Self {
        Self {
            lookup,
            decoders: Decoders::default(),
            config: ValidatorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_decoders(mut self, decoders: Decoders) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run the pipeline.
    pub fn validate(&self, req: &ValidationRequest) -> Result<Validated, ValidationError> {
        let result = self.run(req);
        match &result {
            Ok(validated) => debug!(
                method = %req.method,
                path = %req.path,
                media_type = ?validated.media_type,
                "Request accepted"
            ),
            Err(err) => warn!(
                method = %req.method,
                path = %req.path,
                kind = err.kind(),
                error = %err,
                "Request rejected"
            ),
        }
        result
    }

    fn run(&self, req: &ValidationRequest) -> Result<Validated, ValidationError> {
        let lookup = self.lookup.as_ref();
        if !lookup.has_route(&req.method, &req.path) {
            return Err(ValidationError::RouteNotFound {
                method: req.method.to_string(),
                path: req.path.clone(),
            });
        }

        let media_type = self.check_media_type(req)?;
        params::check_required(lookup, req)?;
        let options = ValidationOptions {
            reject_unknown_properties: self.config.reject_unknown_properties,
            ..ValidationOptions::default()
        };
        params::check_values(lookup, req, &options)?;
        if self.config.validates_body(&req.method) {
            body::check_body(lookup, &self.decoders, &self.config, req)?;
        } else {
            debug!(method = %req.method, "Body stage skipped");
        }
        Ok(Validated { media_type })
    }

    fn check_media_type(&self, req: &ValidationRequest) -> Result<Option<String>, ValidationError> {
        let mut declared: Vec<String> = self
            .lookup
            .responses(&req.method, &req.path)
            .into_iter()
            .flat_map(|r| r.types)
            .collect();
        if declared.is_empty() {
            declared = self.lookup.default_media_types();
        }
        if declared.is_empty() {
            return Ok(None);
        }
        let mut seen = std::collections::HashSet::new();
        declared.retain(|t| seen.insert(t.to_ascii_lowercase()));

        let accept = req.header("accept").unwrap_or_default().trim();
        let chosen = if accept.is_empty() {
            None
        } else {
            negotiate(accept, &declared)
        };
        match chosen {
            Some(media_type) => {
                debug!(accept = %accept, chosen = %media_type, "Media type negotiated");
                Ok(Some(media_type.to_string()))
            }
            None => Err(ValidationError::InvalidMediaType {
                method: req.method.to_string(),
                path: req.path.clone(),
                accept: accept.to_string(),
                declared,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::determine_type;
    use serde_json::json;

    /// One route, `POST /things`, declared by hand.
    struct Fixed {
        registry: TypeRegistry,
        params: Vec<NamedParameter>,
        body: TypeId,
        produces: Vec<String>,
    }

    impl Fixed {
        fn new(produces: &[&str]) -> Self {
            let mut registry = TypeRegistry::new();
            let id = determine_type(&mut registry, "id", &json!("integer")).unwrap();
            let body = determine_type(
                &mut registry,
                "Thing",
                &json!({"properties": {"name": "string", "size": "integer"}}),
            )
            .unwrap();
            registry.apply_inheritance().unwrap();
            Self {
                registry,
                params: vec![NamedParameter {
                    name: "id".into(),
                    type_id: id,
                    required: true,
                }],
                body,
                produces: produces.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl SchemaLookup for Fixed {
        fn registry(&self) -> &TypeRegistry {
            &self.registry
        }
        fn has_route(&self, _: &Method, path: &str) -> bool {
            path == "/things"
        }
        fn query_parameters(&self, _: &Method, _: &str, required_only: bool) -> Vec<NamedParameter> {
            self.params
                .iter()
                .filter(|p| !required_only || p.required)
                .cloned()
                .collect()
        }
        fn request_body(&self, _: &Method, _: &str, content_type: &str) -> Option<TypeId> {
            (content_type == "application/json").then_some(self.body)
        }
        fn request_body_types(&self, _: &Method, _: &str) -> Vec<String> {
            vec!["application/json".into()]
        }
        fn responses(&self, _: &Method, _: &str) -> Vec<DeclaredResponse> {
            vec![DeclaredResponse {
                status: "200".into(),
                types: self.produces.clone(),
            }]
        }
        fn default_media_types(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn validator(produces: &[&str]) -> RequestValidator {
        RequestValidator::new(Arc::new(Fixed::new(produces)))
    }

    #[test]
    fn earlier_stage_failure_hides_later_ones() {
        // Bad Accept, missing parameter and bad body: only the media error surfaces.
        let req = ValidationRequest::new(Method::POST, "/things")
            .with_header("Accept", "text/csv")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"name": 1}"#);
        let err = validator(&["application/json"]).validate(&req).unwrap_err();
        assert_eq!(err.kind(), "InvalidMediaType");

        let req = req.with_header("Accept", "application/json");
        let err = validator(&["application/json"]).validate(&req).unwrap_err();
        assert_eq!(err.kind(), "MissingParameters");
    }

    #[test]
    fn accept_is_required_when_types_are_declared() {
        let req = ValidationRequest::new(Method::GET, "/things?id=1");
        let err = validator(&["application/json"]).validate(&req).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidMediaType { .. }));

        let ok = validator(&[]).validate(&req).unwrap();
        assert_eq!(ok.media_type, None);
    }

    #[test]
    fn body_collects_all_violations() {
        let req = ValidationRequest::new(Method::POST, "/things?id=3")
            .with_header("accept", "application/json")
            .with_header("content-type", "application/json; charset=utf-8")
            .with_body(r#"{"name": 1, "size": "big"}"#);
        let ValidationError::BodyMismatch { issues, content_type, .. } =
            validator(&["application/json"]).validate(&req).unwrap_err()
        else {
            panic!("expected a body mismatch");
        };
        assert_eq!(content_type, "application/json");
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn undeclared_or_missing_content_type_is_rejected() {
        let base = ValidationRequest::new(Method::POST, "/things?id=3").with_header("accept", "*/*");

        let plain = base
            .clone()
            .with_header("content-type", "text/plain")
            .with_body("not a thing");
        let ValidationError::BodyMismatch { issues, content_type, .. } =
            validator(&["application/json"]).validate(&plain).unwrap_err()
        else {
            panic!("expected a body mismatch");
        };
        assert_eq!(content_type, "text/plain");
        assert_eq!(issues[0].kind, "contentType");

        let ValidationError::BodyMismatch { issues, .. } =
            validator(&["application/json"]).validate(&base).unwrap_err()
        else {
            panic!("expected a body mismatch");
        };
        assert_eq!(issues[0].kind, "contentType");
    }

    #[test]
    fn get_skips_the_body_stage() {
        let req = ValidationRequest::new(Method::GET, "/things?id=3")
            .with_header("accept", "*/*")
            .with_header("content-type", "application/json")
            .with_body("not json");
        let ok = validator(&["application/json"]).validate(&req).unwrap();
        assert_eq!(ok.media_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn unknown_route_is_rejected() {
        let req = ValidationRequest::new(Method::GET, "/other");
        let err = validator(&[]).validate(&req).unwrap_err();
        assert_eq!(err.kind(), "RouteNotFound");
    }

    #[test]
    fn parameter_issue_is_located_at_the_parameter() {
        let req = ValidationRequest::new(Method::GET, "/things?id=abc");
        let ValidationError::ParameterMismatch { parameter, issue, .. } =
            validator(&[]).validate(&req).unwrap_err()
        else {
            panic!("expected a parameter mismatch");
        };
        assert_eq!(parameter, "id");
        assert_eq!(issue.location, "id");
    }

    #[test]
    fn validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RequestValidator>();
    }
}
