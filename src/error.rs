//! Domain error types emitted by the validator.
//!
//! No `thiserror` here by design — domain errors are hand-rolled enums with
//! manual `Display`/`std::error::Error` impls, matching the rest of this
//! codebase's error types (see `middleware::cors::error::CorsConfigError` in
//! the reference router this crate was built from).

use std::fmt;

/// Top-level classification of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Path,
    Method,
    ContentType,
    Parameter,
    RequestBodySchema,
    RequestBodyParse,
    ResponseBodySchema,
    ResponseBodyParse,
    Security,
    SchemaCompile,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Path => "path",
            ErrorKind::Method => "method",
            ErrorKind::ContentType => "content-type",
            ErrorKind::Parameter => "parameter",
            ErrorKind::RequestBodySchema => "requestBody.schema",
            ErrorKind::RequestBodyParse => "requestBody.parse",
            ErrorKind::ResponseBodySchema => "responseBody.schema",
            ErrorKind::ResponseBodyParse => "responseBody.parse",
            ErrorKind::Security => "security",
            ErrorKind::SchemaCompile => "schemaCompile",
        };
        write!(f, "{s}")
    }
}

/// A single low-level schema violation, already mapped back to a spec location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaViolation {
    /// Human-readable reason, e.g. "expected integer".
    pub reason: String,
    /// JSON-pointer-like location of the violated keyword in the schema.
    pub keyword_location: String,
    /// JSON pointer to the failing element in the decoded instance.
    pub instance_location: String,
    /// Dotted field path derived from `instance_location` (e.g. `items[2].patties`).
    pub field_path: String,
    /// 1-based line number of the keyword inside the rendered schema, 0 if unknown.
    pub line: usize,
    /// 1-based column number of the keyword inside the rendered schema, 0 if unknown.
    pub column: usize,
    /// The JSON value of the instance node that failed (or its containing element).
    pub reference_object: Option<serde_json::Value>,
}

/// A single validation error produced by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub sub_kind: String,
    pub message: String,
    /// The raw request path this error concerns, e.g. `/not-a-path`. Empty
    /// when an error is not path-scoped.
    pub request_path: String,
    /// The document's path template this error resolved against, e.g.
    /// `/users/{id}`. Empty when no template matched (spec S5: `specPath = ""`).
    pub spec_path: String,
    pub line: usize,
    pub column: usize,
    pub violations: Vec<SchemaViolation>,
    pub how_to_fix: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, sub_kind: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            kind,
            sub_kind: sub_kind.into(),
            message: message.into(),
            request_path: String::new(),
            spec_path: String::new(),
            line: 0,
            column: 0,
            violations: Vec::new(),
            how_to_fix: None,
        }
    }

    pub fn with_violations(mut self, violations: Vec<SchemaViolation>) -> Self {
        self.violations = violations;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.how_to_fix = Some(hint.into());
        self
    }

    pub fn with_paths(mut self, request_path: impl Into<String>, spec_path: impl Into<String>) -> Self {
        self.request_path = request_path.into();
        self.spec_path = spec_path.into();
        self
    }

    pub fn path_not_found(request_path: &str) -> Self {
        ValidationError::new(
            ErrorKind::Path,
            "not-found",
            format!("no operation matches path '{request_path}'"),
        )
        .with_paths(request_path, "")
    }

    pub fn method_not_allowed(method: &str, path_template: &str) -> Self {
        ValidationError::new(
            ErrorKind::Method,
            "not-found",
            format!("operation '{path_template}' has no handler for method '{method}'"),
        )
        .with_paths(path_template, path_template)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.sub_kind, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Print a batch of validation errors to stderr.
///
/// Mirrors the reference codebase's own `validator::print_issues` convention
/// for reporting a spec-validation failure report to a human at the terminal.
pub fn print_errors(errors: &[ValidationError]) {
    eprintln!(
        "\nvalidation failed: {} error(s) found\n",
        errors.len()
    );
    for err in errors {
        eprintln!("{err}");
        for v in &err.violations {
            eprintln!(
                "    at {}:{} ({}): {}",
                v.line, v.column, v.keyword_location, v.reason
            );
        }
    }
}
