use crate::error::SpecError;
use crate::request::ValidationRequest;
use crate::runtime_config::ValidatorConfig;
use crate::spec::{load_spec, ApiSpec};
use crate::validator::{print_issues, RequestValidator};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line interface for ramlguard
#[derive(Parser)]
#[command(name = "ramlguard")]
#[command(about = "Validate HTTP requests against a RAML-style contract", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a contract and report its types and routes
    Check {
        /// Path to the contract (YAML or JSON)
        #[arg(short, long, env = "RAMLGUARD_SPEC")]
        spec: PathBuf,
    },
    /// Validate a single request against a contract
    Validate {
        /// Path to the contract (YAML or JSON)
        #[arg(short, long, env = "RAMLGUARD_SPEC")]
        spec: PathBuf,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request target: path plus optional query string
        #[arg(short, long)]
        target: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// File holding the request body
        #[arg(short, long)]
        body: Option<PathBuf>,

        /// Validator configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Parse arguments and run. Returns whether the command succeeded.
pub fn run_cli() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run_command(&cli.command, &mut stdout.lock())
}

/// Run one command, writing its report to `out`.
pub fn run_command(command: &Commands, out: &mut dyn Write) -> anyhow::Result<bool> {
    match command {
        Commands::Check { spec } => check(spec, out),
        Commands::Validate {
            spec,
            method,
            target,
            headers,
            body,
            config,
        } => {
            let api = match load(spec, out)? {
                Some(api) => api,
                None => return Ok(false),
            };
            let config = match config {
                Some(path) => ValidatorConfig::from_yaml_file(path)?,
                None => ValidatorConfig::from_env(),
            };
            let mut req = ValidationRequest::parse(method, target)
                .map_err(|e| anyhow!("invalid method '{method}': {e}"))?;
            for header in headers {
                let (name, value) = header
                    .split_once(':')
                    .ok_or_else(|| anyhow!("header '{header}' is not in 'Name: value' form"))?;
                req = req.with_header(name.trim(), value.trim());
            }
            if let Some(path) = body {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read body file {}", path.display()))?;
                req = req.with_body(bytes);
            }

            let validator = RequestValidator::new(Arc::new(api)).with_config(config);
            match validator.validate(&req) {
                Ok(validated) => {
                    match validated.media_type {
                        Some(media_type) => writeln!(out, "ok ({media_type})")?,
                        None => writeln!(out, "ok")?,
                    }
                    Ok(true)
                }
                Err(err) => {
                    writeln!(out, "{}: {err}", err.kind())?;
                    Ok(false)
                }
            }
        }
    }
}

fn check(spec: &Path, out: &mut dyn Write) -> anyhow::Result<bool> {
    let Some(api) = load(spec, out)? else {
        return Ok(false);
    };
    let title = if api.title().is_empty() { "(untitled)" } else { api.title() };
    writeln!(out, "{title}")?;
    writeln!(out, "base path: {}", if api.base_path().is_empty() { "/" } else { api.base_path() })?;
    writeln!(out, "registered types: {}", api.registry().len())?;
    writeln!(out, "routes: {}", api.routes().count())?;
    for route in api.routes() {
        let traits = if route.traits.is_empty() {
            String::new()
        } else {
            format!(" is [{}]", route.traits.join(", "))
        };
        writeln!(out, "  {:<7} {}{}{traits}", route.method.as_str(), api.base_path(), route.path_pattern)?;
    }
    Ok(true)
}

/// Load a contract. Document errors are reported to `out` and yield `None`;
/// I/O errors propagate.
fn load(spec: &Path, out: &mut dyn Write) -> anyhow::Result<Option<ApiSpec>> {
    match load_spec(spec) {
        Ok(api) => Ok(Some(api)),
        Err(err) => {
            let Some(spec_err) = err.downcast_ref::<SpecError>() else {
                return Err(err);
            };
            writeln!(out, "{err:#}")?;
            if let SpecError::UnresolvedReferences(issues) = spec_err {
                print_issues(issues);
            }
            Ok(None)
        }
    }
}
