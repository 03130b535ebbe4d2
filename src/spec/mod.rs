//! # Contract Loading
//!
//! Turns a RAML-like contract document into an [`ApiSpec`]: a resolved
//! [`crate::types::TypeRegistry`] plus a route table. [`ApiSpec`] implements
//! [`crate::validator::SchemaLookup`], which is all the request validator
//! needs from it.
//!
//! ## Document shape
//!
//! ```yaml
//! title: Messages
//! baseUri: https://api.example.com/{version}
//! version: v1
//! mediaType: application/json
//! types:
//!   Message:
//!     properties:
//!       id: integer
//!       text: string
//! traits:
//!   paged:
//!     queryParameters:
//!       page?: integer
//! /messages:
//!   get:
//!     is: [paged]
//!     responses:
//!       200:
//!         body: Message[]
//!   post:
//!     body: Message
//! ```
//!
//! Resources are keys beginning with `/` and nest. Methods take `is`,
//! `queryParameters`, `body` and `responses`. Traits are substituted with
//! [`crate::template::apply_variables`] and merged under the method, whose
//! own keys win.

mod build;
mod load;
mod lookup;
mod types;

pub use build::{build_spec, merge_under, resource_path_name, FALLBACK_MEDIA_TYPE};
pub use load::{load_spec, load_spec_from_str};
pub use lookup::{path_to_regex, ApiSpec};
pub use types::{ParameterMeta, RouteMeta, METHODS};
