//! End-to-end scenarios exercising the full `Validator` pipeline: path match
//! -> content-type resolution -> body decode -> schema evaluation -> mapped
//! errors. Mirrors this codebase's own top-level `tests/` integration
//! layer (e.g. `multi_response_tests.rs`, `parameters_tests.rs`), which
//! builds route fixtures directly from spec structs rather than parsing a
//! document off disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::Method;
use oas_validator_core::document::{Document, Operation, OpenApiVersion};
use oas_validator_core::error::ErrorKind;
use oas_validator_core::http::HttpRequest;
use oas_validator_core::validator::{Validator, ValidatorOptions};
use serde_json::json;
use std::collections::HashMap;

fn burger_operation() -> Operation {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "patties": {"type": "integer"},
            "vegetarian": {"type": "boolean"}
        },
        "required": ["name", "patties", "vegetarian"]
    });
    Operation {
        method: Method::POST,
        path_pattern: "/burgers/createBurger".to_string(),
        parameters: Vec::new(),
        request_schema: None,
        request_body_required: true,
        request_content: HashMap::from([("application/json".to_string(), schema)]),
        responses: HashMap::new(),
        response_ranges: HashMap::new(),
        default_response: None,
        security: Vec::new(),
    }
}

fn validator_for(op: Operation) -> Validator {
    let document = Document {
        openapi_version: OpenApiVersion::V30,
        operations: vec![op],
        component_schemas: HashMap::new(),
        security_schemes: HashMap::new(),
    };
    Validator::new(document, ValidatorOptions::new())
}

#[test]
fn s1_simple_json_valid() {
    let validator = validator_for(burger_operation());
    let request = HttpRequest::new(Method::POST, "/burgers/createBurger")
        .with_header("content-type", "application/json")
        .with_body(br#"{"name":"Big Mac","patties":2,"vegetarian":true}"#.to_vec());

    let (ok, errors) = validator.validate_http_request_sync(&request);
    assert!(ok, "expected a clean pass, got: {errors:?}");
    assert!(errors.is_empty());
}

#[test]
fn s2_type_violation() {
    let validator = validator_for(burger_operation());
    let request = HttpRequest::new(Method::POST, "/burgers/createBurger")
        .with_header("content-type", "application/json")
        .with_body(br#"{"name":"Big Mac","patties":false,"vegetarian":2}"#.to_vec());

    let (ok, errors) = validator.validate_http_request_sync(&request);
    assert!(!ok);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::RequestBodySchema);
    let reasons: Vec<&str> = errors[0].violations.iter().map(|v| v.reason.as_str()).collect();
    assert!(reasons.iter().any(|r| r.contains("expected integer")), "{reasons:?}");
    assert!(reasons.iter().any(|r| r.contains("expected boolean")), "{reasons:?}");
}

#[test]
fn s3_max_items() {
    let schema = json!({"type": "array", "maxItems": 2, "items": {"type": "integer"}});
    let op = Operation {
        method: Method::POST,
        path_pattern: "/baskets/fill".to_string(),
        parameters: Vec::new(),
        request_schema: None,
        request_body_required: true,
        request_content: HashMap::from([("application/json".to_string(), schema)]),
        responses: HashMap::new(),
        response_ranges: HashMap::new(),
        default_response: None,
        security: Vec::new(),
    };
    let validator = validator_for(op);
    let request = HttpRequest::new(Method::POST, "/baskets/fill")
        .with_header("content-type", "application/json")
        .with_body(b"[1,2,3,4]".to_vec());

    let (ok, errors) = validator.validate_http_request_sync(&request);
    assert!(!ok);
    assert_eq!(errors[0].kind, ErrorKind::RequestBodySchema);
    let violation = errors[0].violations.first().expect("one violation expected");
    assert!(violation.reason.contains("maximum 2 items required") && violation.reason.contains("found 4 items"), "{}", violation.reason);
    assert!(violation.line > 0, "expected a non-zero spec line pointing at maxItems");
    assert!(violation.column > 0, "expected a non-zero spec column pointing at maxItems");
}

#[test]
fn s4_content_type_media_range() {
    let validator = validator_for(burger_operation());
    let body = br#"{"name":"Big Mac","patties":2,"vegetarian":true}"#.to_vec();

    let accepted = HttpRequest::new(Method::POST, "/burgers/createBurger")
        .with_header("content-type", "application/json; charset=utf-8")
        .with_body(body.clone());
    let (ok, errors) = validator.validate_http_request_sync(&accepted);
    assert!(ok, "charset parameter must not affect media-range matching: {errors:?}");

    let rejected = HttpRequest::new(Method::POST, "/burgers/createBurger")
        .with_header("content-type", "thomas/tank-engine")
        .with_body(body);
    let (ok, errors) = validator.validate_http_request_sync(&rejected);
    assert!(!ok);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::ContentType);
    assert!(errors[0].message.contains("application/json"));
}

#[test]
fn s5_path_not_found() {
    let validator = validator_for(burger_operation());
    let request = HttpRequest::new(Method::POST, "/not-a-path");

    let (ok, errors) = validator.validate_http_request_sync(&request);
    assert!(!ok);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Path);
    assert_eq!(errors[0].request_path, "/not-a-path");
    assert_eq!(errors[0].spec_path, "");
}
