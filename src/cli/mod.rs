//! # CLI Module
//!
//! Command-line access to contract loading and request validation.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Load a contract, resolve every type and report the route table:
//!
//! ```bash
//! ramlguard check --spec api.raml
//! ```
//!
//! ### `validate`
//!
//! Run one request through the validator:
//!
//! ```bash
//! ramlguard validate --spec api.raml \
//!     --method POST --target '/messages?draft=true' \
//!     --header 'Accept: application/json' \
//!     --header 'Content-Type: application/json' \
//!     --body message.json
//! ```
//!
//! Options:
//! - `--header <K:V>` - Request header, repeatable
//! - `--body <FILE>` - Request body read from a file
//! - `--config <FILE>` - Validator configuration (YAML); defaults come from
//!   the `RAMLGUARD_*` environment variables
//!
//! Both commands exit non-zero on failure.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, run_command, Cli, Commands};
