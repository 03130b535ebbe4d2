//! Unit tests for CLI commands

use crate::cli::{run_command, Cli, Commands};
use clap::Parser;
use std::io::Write;

const CONTRACT: &str = r#"
title: Notes
mediaType: application/json
types:
  Note:
    properties:
      text: string
/notes:
  get:
    queryParameters:
      limit: integer
  post:
    body: Note
"#;

fn contract_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".raml").tempfile().unwrap();
    file.write_all(CONTRACT.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> (bool, String) {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let ok = run_command(&cli.command, &mut out).unwrap();
    (ok, String::from_utf8(out).unwrap())
}

#[test]
fn test_validate_command_parses_repeated_headers() {
    let cli = Cli::try_parse_from([
        "ramlguard",
        "validate",
        "--spec",
        "api.yaml",
        "--method",
        "post",
        "--target",
        "/x?y=1",
        "-H",
        "Accept: application/json",
        "-H",
        "Content-Type: application/json",
    ])
    .unwrap();
    match cli.command {
        Commands::Validate {
            method, headers, body, ..
        } => {
            assert_eq!(method, "post");
            assert_eq!(headers.len(), 2);
            assert!(body.is_none());
        }
        _ => panic!("Expected Validate command"),
    }
}

#[test]
fn test_check_reports_routes() {
    let file = contract_file();
    let path = file.path().to_str().unwrap();
    let (ok, out) = run(&["ramlguard", "check", "--spec", path]);
    assert!(ok);
    assert!(out.starts_with("Notes\n"));
    assert!(out.contains("routes: 2"));
    assert!(out.contains("POST    /notes"));
}

#[test]
fn test_validate_reports_the_failing_stage() {
    let file = contract_file();
    let path = file.path().to_str().unwrap();
    let (ok, out) = run(&[
        "ramlguard", "validate", "--spec", path, "--target", "/notes", "-H", "Accept: */*",
    ]);
    assert!(!ok);
    assert!(out.starts_with("MissingParameters:"), "{out}");

    let (ok, out) = run(&[
        "ramlguard", "validate", "--spec", path, "--target", "/notes?limit=5", "-H", "Accept: */*",
    ]);
    assert!(ok);
    assert_eq!(out, "ok (application/json)\n");
}

#[test]
fn test_check_reports_unresolved_references() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(b"types:\n  A: Missing\n").unwrap();
    let (ok, out) = run(&["ramlguard", "check", "--spec", file.path().to_str().unwrap()]);
    assert!(!ok);
    assert!(out.contains("unresolved reference"), "{out}");
}
