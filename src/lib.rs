//! # ramlguard
//!
//! **ramlguard** resolves the declarative types of a RAML-style API contract
//! and validates incoming HTTP requests against it.
//!
//! ## Overview
//!
//! A contract is a YAML (or JSON) document declaring named types, reusable
//! traits and a tree of resources. Loading it produces an [`ApiSpec`]: a
//! read-only type registry plus a route table. A [`RequestValidator`] then
//! checks individual requests against that contract.
//!
//! ## Architecture
//!
//! - **[`types`]** - Type classification, registry, inheritance and lazy references
//! - **[`template`]** - `<<placeholder | !transform>>` substitution for traits
//! - **[`spec`]** - Contract loading, trait expansion and route matching
//! - **[`validator`]** - The four-stage request validation pipeline
//! - **[`request`]** - Transport-neutral request representation
//! - **[`decoder`]** - Body decoders keyed by media type
//! - **[`runtime_config`]** - Validator settings from the environment or a file
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `ramlguard` command-line tool
//!
//! ## Quick Start
//!
//! ```rust
//! use ramlguard::{load_spec_from_str, RequestValidator, ValidationRequest};
//! use std::sync::Arc;
//!
//! let api = load_spec_from_str(r#"
//! mediaType: application/json
//! /users:
//!   get:
//!     queryParameters:
//!       id: integer
//! "#).unwrap();
//!
//! let validator = RequestValidator::new(Arc::new(api));
//!
//! let ok = ValidationRequest::new(http::Method::GET, "/users?id=42")
//!     .with_header("Accept", "application/json");
//! assert!(validator.validate(&ok).is_ok());
//!
//! let bad = ValidationRequest::new(http::Method::GET, "/users?id=abc")
//!     .with_header("Accept", "application/json");
//! assert_eq!(validator.validate(&bad).unwrap_err().kind(), "ParameterMismatch");
//! ```
//!
//! ## Concurrency
//!
//! Building a contract is single-threaded. Once built, an [`ApiSpec`] is
//! immutable and a [`RequestValidator`] is `Send + Sync`, so one instance can
//! serve any number of threads.

pub mod cli;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod request;
pub mod runtime_config;
pub mod spec;
pub mod template;
pub mod types;
pub mod validator;

pub use error::{SpecError, TemplateError, TypeError, ValidationError};
pub use request::ValidationRequest;
pub use spec::{load_spec, load_spec_from_str, ApiSpec};
pub use template::apply_variables;
pub use types::{determine_type, TypeId, TypeRegistry};
pub use validator::{RequestValidator, ValidationIssue};
