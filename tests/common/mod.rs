#![allow(dead_code)]

use ramlguard::{load_spec_from_str, ApiSpec, RequestValidator, ValidationRequest};
use std::sync::Arc;

/// Contract shared by the integration tests.
pub const MESSAGES_API: &str = r#"
title: Messages
version: v2
baseUri: https://api.example.com/{version}
mediaType: application/json
types:
  Entity:
    properties:
      id: integer
  Message:
    type: Entity
    properties:
      text:
        type: string
        minLength: 1
      priority:
        type: integer
        minimum: 1
        maximum: 5
      tags?: string[]
traits:
  paged:
    queryParameters:
      limit?:
        type: integer
        maximum: <<maxLimit>>
    description: Page through <<resourcePathName | !singularize>> records
/messages:
  get:
    is: [ { paged: { maxLimit: 50 } } ]
    queryParameters:
      id: integer
  post:
    body: Message
    responses:
      "201":
        body:
          application/json: Message
          application/xml: Message
  /{messageId}:
    delete:
"#;

pub fn messages_api() -> ApiSpec {
    load_spec_from_str(MESSAGES_API).unwrap()
}

pub fn validator() -> RequestValidator {
    RequestValidator::new(Arc::new(messages_api()))
}

pub fn get(target: &str) -> ValidationRequest {
    ValidationRequest::new(http::Method::GET, target).with_header("Accept", "application/json")
}

pub fn post_json(target: &str, body: &str) -> ValidationRequest {
    ValidationRequest::new(http::Method::POST, target)
        .with_header("Accept", "application/json")
        .with_header("Content-Type", "application/json")
        .with_body(body.as_bytes().to_vec())
}

pub mod temp_files {
    use std::io::Write;

    /// Write `content` to a fresh temporary file with the given extension.
    /// The file is removed when the handle drops.
    pub fn create_temp_spec(content: &str, ext: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("ramlguard_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> tempfile::NamedTempFile {
        create_temp_spec(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> tempfile::NamedTempFile {
        create_temp_spec(content, "json")
    }
}
