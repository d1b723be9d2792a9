//! Top-level orchestrator (the crate's public entry point).
//!
//! Ties the six components together into the state machine this codebase's
//! spec prescribes: match path -> match method -> validate parameters ->
//! validate the body. Construction mirrors this codebase's general
//! preference for an explicit options struct built with a fluent builder
//! (see `runtime_config::RuntimeConfig` in the reference router, here
//! adapted from an env-var-driven config to a constructor-driven one since
//! a validator core has no process environment of its own to read).

use crate::body::{self, BodyTransformers};
use crate::cache::{CacheEntry, InMemorySchemaCache, RegexCache, SchemaCache};
use crate::document::{Document, Operation, OpenApiVersion, ParameterLocation};
use crate::error::{ErrorKind, ValidationError};
use crate::error_mapper::map_violations;
use crate::fingerprint::fingerprint_schema;
use crate::http::{HttpRequest, HttpResponse};
use crate::params::{self, ParamSources};
use crate::path::{PathMatcher, RadixPathMatcher};
use crate::render::render_inline;
use crate::schema_eval::{self, Dialect, EvalOptions, FormatPredicate};
use crate::security::{self, CredentialVec, SecurityProvider, SecurityRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation signal, checked between the independent phases
/// of one request/response validation (path resolution, each parameter
/// location, security, body decode). Cloning shares the same underlying
/// flag — an embedder typically holds one clone tied to a request's
/// deadline and passes another into the validator.
#[derive(Clone, Default)]
pub struct CancellationSignal(Arc<AtomicBool>);

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

const ALL_LOCATIONS: [ParameterLocation; 4] =
    [ParameterLocation::Path, ParameterLocation::Query, ParameterLocation::Header, ParameterLocation::Cookie];

/// Internal result of one validation pass: either it ran to completion
/// (with however many errors it collected, possibly zero) or it was
/// cancelled partway through. Kept distinct from `Vec<ValidationError>` so a
/// cancelled pass can never be mistaken for a clean pass at the public API
/// boundary, even though both report zero errors (spec section 7:
/// "Cancellation aborts the pass and returns no errors").
enum Outcome {
    Completed(Vec<ValidationError>),
    Cancelled,
}

impl Outcome {
    fn into_public(self) -> (bool, Vec<ValidationError>) {
        match self {
            Outcome::Completed(errors) => (errors.is_empty(), errors),
            Outcome::Cancelled => (false, Vec::new()),
        }
    }

    fn into_errors(self) -> Vec<ValidationError> {
        match self {
            Outcome::Completed(errors) => errors,
            Outcome::Cancelled => Vec::new(),
        }
    }
}

/// Outcome of matching a response status against an operation's response
/// object (spec 4.4).
enum ResponseLookup {
    /// A schema map was found (exact status, range, or default).
    Found(HashMap<String, Value>),
    /// The operation declares no response contract at all for any status —
    /// nothing to check against, not a failure.
    NoContract,
    /// The operation declares a response contract, but none of its entries
    /// (exact, range, or default) cover this status.
    NotDeclared,
}

/// Construction options recognized by the validator (spec section 6:
/// "Validator constructor inputs").
#[derive(Clone)]
pub struct ValidatorOptions {
    pub regex_cache: Option<Arc<dyn RegexCache>>,
    pub schema_cache: Arc<dyn SchemaCache>,
    /// Pre-built path matcher; `None` falls back to the regex matcher.
    pub path_tree: Option<Arc<dyn PathMatcher>>,
    pub format_assertions: bool,
    /// Accepted for interface completeness; see [`crate::schema_eval::EvalOptions::content_assertions`].
    pub content_assertions: bool,
    /// Passed through to [`crate::schema_eval::EvalOptions::open_api_mode`].
    /// Does *not* select the schema dialect — that is read from the
    /// document's own declared `openapi` version (3.0.x -> draft-4
    /// semantics, 3.1.x -> draft 2020-12) so a 3.1 document is never
    /// evaluated as 3.0 just because a caller built options with defaults.
    pub open_api_mode: bool,
    pub allow_scalar_coercion: bool,
    pub security_validation: bool,
    pub custom_formats: Vec<(String, FormatPredicate)>,
    pub security_providers: HashMap<String, Arc<dyn SecurityProvider>>,
    pub body_transformers: BodyTransformers,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions {
            regex_cache: None,
            schema_cache: Arc::new(InMemorySchemaCache::new()),
            path_tree: None,
            format_assertions: true,
            content_assertions: true,
            open_api_mode: true,
            allow_scalar_coercion: true,
            security_validation: true,
            custom_formats: Vec::new(),
            security_providers: HashMap::new(),
            body_transformers: BodyTransformers::new(),
        }
    }
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy another option bundle wholesale (spec: `existingOptions`), then
    /// continue customizing with the other builder methods.
    pub fn from_existing(existing: &ValidatorOptions) -> Self {
        existing.clone()
    }

    pub fn with_schema_cache(mut self, cache: Arc<dyn SchemaCache>) -> Self {
        self.schema_cache = cache;
        self
    }

    pub fn with_regex_cache(mut self, cache: Arc<dyn RegexCache>) -> Self {
        self.regex_cache = Some(cache);
        self
    }

    pub fn with_path_tree(mut self, tree: Arc<dyn PathMatcher>) -> Self {
        self.path_tree = Some(tree);
        self
    }

    pub fn with_format_assertions(mut self, enabled: bool) -> Self {
        self.format_assertions = enabled;
        self
    }

    pub fn with_content_assertions(mut self, enabled: bool) -> Self {
        self.content_assertions = enabled;
        self
    }

    pub fn with_open_api_mode(mut self, enabled: bool) -> Self {
        self.open_api_mode = enabled;
        self
    }

    pub fn with_allow_scalar_coercion(mut self, enabled: bool) -> Self {
        self.allow_scalar_coercion = enabled;
        self
    }

    pub fn with_security_validation(mut self, enabled: bool) -> Self {
        self.security_validation = enabled;
        self
    }

    pub fn with_custom_format(mut self, name: impl Into<String>, predicate: FormatPredicate) -> Self {
        self.custom_formats.push((name.into(), predicate));
        self
    }

    pub fn with_security_provider(mut self, scheme_name: impl Into<String>, provider: Arc<dyn SecurityProvider>) -> Self {
        self.security_providers.insert(scheme_name.into(), provider);
        self
    }

    pub fn with_body_transformer(mut self, media_type: impl Into<String>, transformer: Arc<dyn body::BodyTransformer>) -> Self {
        self.body_transformers.register(media_type, transformer);
        self
    }
}

/// The validator core. Constructed once per document and reused across
/// requests: the path tree and schema cache are built at construction and
/// shared read-only thereafter (spec section 5: "shared resources").
pub struct Validator {
    document: Arc<Document>,
    options: ValidatorOptions,
    path_matcher: Arc<dyn PathMatcher>,
    eval_options: EvalOptions,
}

impl Validator {
    pub fn new(document: Document, options: ValidatorOptions) -> Self {
        let document = Arc::new(document);
        let path_matcher = options
            .path_tree
            .clone()
            .unwrap_or_else(|| Arc::new(RadixPathMatcher::new(&document.operations)) as Arc<dyn PathMatcher>);

        let dialect = match document.openapi_version {
            OpenApiVersion::V30 => Dialect::OpenApi30,
            OpenApiVersion::V31 => Dialect::OpenApi31,
        };
        let eval_options = EvalOptions {
            dialect,
            format_assertions: options.format_assertions,
            content_assertions: options.content_assertions,
            open_api_mode: options.open_api_mode,
            custom_formats: options.custom_formats.clone(),
        };

        Validator { document, options, path_matcher, eval_options }
    }

    /// Render and compile every schema the document declares, populating the
    /// schema cache ahead of the first request (not required for
    /// correctness — request validation compiles lazily on first use — but
    /// avoids paying compilation cost on a cold first request in a
    /// latency-sensitive caller).
    pub fn warm_cache(&self) {
        self.validate_document();
    }

    fn render_and_compile(&self, schema: &Value) -> CacheEntry {
        let rendered_json = render_inline(&self.document, schema);
        let fingerprint = fingerprint_schema(&rendered_json);
        if let Some(entry) = self.options.schema_cache.load(&fingerprint) {
            return entry;
        }
        let rendered_yaml = serde_yaml::to_string(&rendered_json).unwrap_or_default();
        let compiled = schema_eval::compile(&rendered_json, &self.eval_options).ok().map(Arc::new);
        let entry = CacheEntry { rendered_yaml: Arc::from(rendered_yaml), rendered_json, compiled };
        self.options.schema_cache.store(fingerprint, entry.clone());
        entry
    }

    fn validate_instance(&self, schema: &Value, instance: &Value, kind: ErrorKind) -> Option<ValidationError> {
        let entry = self.render_and_compile(schema);
        let Some(validator) = &entry.compiled else {
            return Some(ValidationError::new(ErrorKind::SchemaCompile, "compile", "schema failed to compile"));
        };
        let violations = schema_eval::evaluate(validator, instance);
        if violations.is_empty() {
            return None;
        }
        let (mapped, hint) = map_violations(&violations, &entry.rendered_yaml, &entry.rendered_json, instance);
        let mut err = ValidationError::new(kind, "schema", format!("{} schema violation(s)", mapped.len())).with_violations(mapped);
        if let Some(hint) = hint {
            err = err.with_hint(hint);
        }
        Some(err)
    }

    /// Static check that every schema the document declares compiles (spec:
    /// `validateDocument`). Does not validate any HTTP message.
    pub fn validate_document(&self) -> (bool, Vec<ValidationError>) {
        let mut errors = Vec::new();
        for op in &self.document.operations {
            let mut check = |schema: &Value| {
                let entry = self.render_and_compile(schema);
                if entry.compiled.is_none() {
                    errors.push(ValidationError::new(
                        ErrorKind::SchemaCompile,
                        "compile",
                        format!("schema for {} {} failed to compile", op.method, op.path_pattern),
                    ));
                }
            };
            if let Some(schema) = &op.request_schema {
                check(schema);
            }
            for schema in op.request_content.values() {
                check(schema);
            }
            for media in op.responses.values() {
                for spec in media.values() {
                    if let Some(schema) = &spec.schema {
                        check(schema);
                    }
                }
            }
            if let Some(default) = &op.default_response {
                if let Some(schema) = &default.schema {
                    check(schema);
                }
            }
        }
        (errors.is_empty(), errors)
    }

    fn resolve(&self, request: &HttpRequest) -> Result<(Arc<Operation>, crate::path::PathParams), ValidationError> {
        let Some((matched, path_params)) = self.path_matcher.lookup_with_params(&request.path) else {
            return Err(ValidationError::path_not_found(&request.path));
        };
        let Some(op) = matched.operations.get(&request.method) else {
            return Err(ValidationError::method_not_allowed(request.method.as_str(), matched.template));
        };
        Ok((Arc::clone(op), path_params.unwrap_or_default()))
    }

    fn validate_parameters(&self, op: &Operation, sources: &ParamSources, locations: &[ParameterLocation]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for meta in op.parameters.iter().filter(|p| locations.contains(&p.location)) {
            match params::extract(meta, sources, self.options.allow_scalar_coercion) {
                params::Extracted::Missing => errors.push(ValidationError::new(
                    ErrorKind::Parameter,
                    "missing",
                    format!("required parameter '{}' ({}) is missing", meta.name, meta.location),
                )),
                params::Extracted::Absent => {}
                params::Extracted::Present(value) => {
                    if let Some(schema) = &meta.schema {
                        if let Some(err) = self.validate_instance(schema, &value, ErrorKind::Parameter) {
                            errors.push(err);
                        }
                    }
                }
                params::Extracted::PresentAsContent { media_type, schema, raw } => {
                    match body::decode_body(&raw, &media_type, &self.options.body_transformers) {
                        body::DecodeOutcome::Value(value) => {
                            if let Some(err) = self.validate_instance(&schema, &value, ErrorKind::Parameter) {
                                errors.push(err);
                            }
                        }
                        body::DecodeOutcome::Empty => {}
                        body::DecodeOutcome::ParseError(msg) => {
                            errors.push(ValidationError::new(ErrorKind::Parameter, "parse", msg));
                        }
                    }
                }
            }
        }
        errors
    }

    /// Fan out the four parameter locations across `std::thread::scope`
    /// threads (spec section 5: "independent parameter-location checks MAY
    /// be fanned out in parallel").
    fn validate_parameters_parallel(&self, op: &Operation, sources: &ParamSources) -> Vec<ValidationError> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = ALL_LOCATIONS
                .iter()
                .map(|location| {
                    let location = *location;
                    scope.spawn(move || self.validate_parameters(op, sources, std::slice::from_ref(&location)))
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap_or_default()).collect()
        })
    }

    fn build_security_request(request: &HttpRequest) -> (CredentialVec, CredentialVec, CredentialVec) {
        let headers: CredentialVec = request
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        let query: CredentialVec = url::form_urlencoded::parse(request.query.as_bytes()).into_owned().collect();
        let cookies: CredentialVec = request.cookie_header().map(params::parse_cookie_header).unwrap_or_default().into_iter().collect();
        (headers, query, cookies)
    }

    fn check_security(&self, op: &Operation, request: &HttpRequest) -> Option<ValidationError> {
        if op.security.is_empty() {
            return None;
        }
        let (headers, query, cookies) = Self::build_security_request(request);
        let sec_request = SecurityRequest { headers: &headers, query: &query, cookies: &cookies };
        let satisfied = security::validate_security(&op.security, &sec_request, |name| {
            let scheme = self.document.security_schemes.get(name)?;
            let provider = self.options.security_providers.get(name)?;
            Some((scheme, provider.as_ref()))
        });
        if satisfied {
            None
        } else {
            Some(ValidationError::new(ErrorKind::Security, "unauthorized", "no security requirement alternative was satisfied"))
        }
    }

    fn resolve_request_schema_map(op: &Operation) -> Option<HashMap<String, Value>> {
        if !op.request_content.is_empty() {
            return Some(op.request_content.clone());
        }
        op.request_schema.clone().map(|schema| HashMap::from([("*/*".to_string(), schema)]))
    }

    /// Resolution outcome for a response status against an operation's
    /// declared response contract (spec 4.4: exact status code, then a
    /// "2XX"-style range, then `default`, in that precedence order).
    fn resolve_response_schema_map(op: &Operation, status: u16) -> ResponseLookup {
        if let Some(content_map) = op.responses.get(&status) {
            return ResponseLookup::Found(
                content_map.iter().filter_map(|(mt, spec)| spec.schema.clone().map(|s| (mt.clone(), s))).collect(),
            );
        }
        let range_digit: Option<u8> = u8::try_from(status / 100).ok().filter(|d| (1..=5).contains(d));
        if let Some(digit) = range_digit {
            if let Some(content_map) = op.response_ranges.get(&digit) {
                return ResponseLookup::Found(
                    content_map.iter().filter_map(|(mt, spec)| spec.schema.clone().map(|s| (mt.clone(), s))).collect(),
                );
            }
        }
        if let Some(schema) = op.default_response.as_ref().and_then(|spec| spec.schema.clone()) {
            return ResponseLookup::Found(HashMap::from([("*/*".to_string(), schema)]));
        }
        if op.responses.is_empty() && op.response_ranges.is_empty() && op.default_response.is_none() {
            ResponseLookup::NoContract
        } else {
            ResponseLookup::NotDeclared
        }
    }

    fn validate_body_against(
        &self,
        schema_map: &HashMap<String, Value>,
        required: bool,
        content_type: Option<&str>,
        bytes: Arc<[u8]>,
        schema_kind: ErrorKind,
        parse_kind: ErrorKind,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if bytes.is_empty() {
            if required {
                errors.push(ValidationError::new(
                    schema_kind,
                    "schema",
                    "request body is empty but there is a schema defined",
                ));
            }
            return errors;
        }

        let Some(content_type) = content_type else {
            errors.push(ValidationError::new(ErrorKind::ContentType, "missing-header", "body present but no Content-Type header was supplied"));
            return errors;
        };
        let Some(media_type) = body::parse_media_type(content_type) else {
            errors.push(ValidationError::new(ErrorKind::ContentType, "missing-header", "Content-Type header is empty"));
            return errors;
        };
        let Some(matched_key) = body::match_content_type(schema_map.keys().map(String::as_str), media_type) else {
            let mut supported: Vec<&str> = schema_map.keys().map(String::as_str).collect();
            supported.sort_unstable();
            errors.push(ValidationError::new(
                ErrorKind::ContentType,
                "unsupported-media-type",
                format!(
                    "content-type '{media_type}' is not declared for this operation (supported: {})",
                    supported.join(", ")
                ),
            ));
            return errors;
        };
        let schema = schema_map[matched_key].clone();

        match body::decode_body(&bytes, media_type, &self.options.body_transformers) {
            body::DecodeOutcome::Value(instance) => {
                if let Some(err) = self.validate_instance(&schema, &instance, schema_kind) {
                    errors.push(err);
                }
            }
            body::DecodeOutcome::Empty => {
                if required {
                    errors.push(ValidationError::new(
                        schema_kind,
                        "schema",
                        "request body is empty but there is a schema defined",
                    ));
                }
            }
            body::DecodeOutcome::ParseError(msg) => errors.push(ValidationError::new(parse_kind, "parse", msg)),
        }

        errors
    }

    fn validate_request_body(&self, op: &Operation, content_type: Option<&str>, bytes: Arc<[u8]>) -> Vec<ValidationError> {
        match Self::resolve_request_schema_map(op) {
            Some(schema_map) => {
                self.validate_body_against(&schema_map, op.request_body_required, content_type, bytes, ErrorKind::RequestBodySchema, ErrorKind::RequestBodyParse)
            }
            None => Vec::new(),
        }
    }

    fn validate_response_body(&self, op: &Operation, status: u16, content_type: Option<&str>, bytes: Arc<[u8]>) -> Vec<ValidationError> {
        match Self::resolve_response_schema_map(op, status) {
            ResponseLookup::Found(schema_map) => {
                self.validate_body_against(&schema_map, false, content_type, bytes, ErrorKind::ResponseBodySchema, ErrorKind::ResponseBodyParse)
            }
            ResponseLookup::NoContract => Vec::new(),
            ResponseLookup::NotDeclared => vec![ValidationError::new(
                ErrorKind::ResponseBodySchema,
                "status-not-found",
                format!("no response is declared for status {status} and no default response is declared"),
            )],
        }
    }

    fn validate_request_internal(&self, request: &HttpRequest, parallel: bool, signal: Option<&CancellationSignal>) -> Outcome {
        if signal.is_some_and(CancellationSignal::is_cancelled) {
            return Outcome::Cancelled;
        }
        let (op, path_params) = match self.resolve(request) {
            Ok(v) => v,
            Err(e) => return Outcome::Completed(vec![e]),
        };

        let sources = ParamSources::new(&path_params, &request.query, &request.headers, request.cookie_header());
        let mut errors = if parallel {
            self.validate_parameters_parallel(&op, &sources)
        } else {
            self.validate_parameters(&op, &sources, &ALL_LOCATIONS)
        };

        if signal.is_some_and(CancellationSignal::is_cancelled) {
            return Outcome::Cancelled;
        }

        if self.options.security_validation {
            if let Some(err) = self.check_security(&op, request) {
                errors.push(err);
            }
        }

        if signal.is_some_and(CancellationSignal::is_cancelled) {
            return Outcome::Cancelled;
        }

        match body::read_body(&request.body) {
            Ok(bytes) => errors.extend(self.validate_request_body(&op, request.content_type(), bytes)),
            Err(e) => errors.push(ValidationError::new(ErrorKind::RequestBodyParse, "io", e.to_string())),
        }

        Outcome::Completed(errors)
    }

    fn validate_response_internal(&self, request: &HttpRequest, response: &HttpResponse, signal: Option<&CancellationSignal>) -> Outcome {
        if signal.is_some_and(CancellationSignal::is_cancelled) {
            return Outcome::Cancelled;
        }
        let (op, _) = match self.resolve(request) {
            Ok(v) => v,
            Err(e) => return Outcome::Completed(vec![e]),
        };
        let errors = match body::read_body(&response.body) {
            Ok(bytes) => self.validate_response_body(&op, response.status, response.content_type(), bytes),
            Err(e) => vec![ValidationError::new(ErrorKind::ResponseBodyParse, "io", e.to_string())],
        };
        Outcome::Completed(errors)
    }

    /// Full request validation, fanning parameter-location checks out across
    /// `std::thread::scope` threads.
    pub fn validate_http_request(&self, request: &HttpRequest) -> (bool, Vec<ValidationError>) {
        self.validate_request_internal(request, true, None).into_public()
    }

    /// Same as [`Validator::validate_http_request`], but checks `signal`
    /// between phases (path/method resolution, parameter checks, security,
    /// body decode) and aborts the pass — reporting `(false, [])`, never a
    /// partial error batch — once cancellation is observed (spec section 7:
    /// "Cancellation aborts the pass and returns no errors").
    pub fn validate_http_request_with(&self, request: &HttpRequest, signal: &CancellationSignal) -> (bool, Vec<ValidationError>) {
        self.validate_request_internal(request, true, Some(signal)).into_public()
    }

    /// Same contract as [`Validator::validate_http_request`], strictly
    /// sequential — for callers that would rather not pay thread spawn cost
    /// on every call (spec: `validateHttpRequestSync`).
    pub fn validate_http_request_sync(&self, request: &HttpRequest) -> (bool, Vec<ValidationError>) {
        self.validate_request_internal(request, false, None).into_public()
    }

    /// Cancellation-aware counterpart to [`Validator::validate_http_request_sync`].
    pub fn validate_http_request_sync_with(&self, request: &HttpRequest, signal: &CancellationSignal) -> (bool, Vec<ValidationError>) {
        self.validate_request_internal(request, false, Some(signal)).into_public()
    }

    pub fn validate_http_response(&self, request: &HttpRequest, response: &HttpResponse) -> (bool, Vec<ValidationError>) {
        self.validate_response_internal(request, response, None).into_public()
    }

    /// Cancellation-aware counterpart to [`Validator::validate_http_response`].
    pub fn validate_http_response_with(&self, request: &HttpRequest, response: &HttpResponse, signal: &CancellationSignal) -> (bool, Vec<ValidationError>) {
        self.validate_response_internal(request, response, Some(signal)).into_public()
    }

    /// Validate a request and its response together, running both passes
    /// concurrently (spec section 5: "Response and request validation of
    /// the same message MAY also run in parallel").
    pub fn validate_http_request_response(&self, request: &HttpRequest, response: &HttpResponse) -> (bool, Vec<ValidationError>, Vec<ValidationError>) {
        self.validate_http_request_response_with(request, response, None)
    }

    /// Cancellation-aware counterpart to [`Validator::validate_http_request_response`].
    pub fn validate_http_request_response_with(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
        signal: Option<&CancellationSignal>,
    ) -> (bool, Vec<ValidationError>, Vec<ValidationError>) {
        let (request_outcome, response_outcome) = std::thread::scope(|scope| {
            let response_handle = scope.spawn(|| self.validate_response_internal(request, response, signal));
            let request_outcome = self.validate_request_internal(request, true, signal);
            (request_outcome, response_handle.join().unwrap_or(Outcome::Completed(Vec::new())))
        });
        let cancelled = matches!(request_outcome, Outcome::Cancelled) || matches!(response_outcome, Outcome::Cancelled);
        let request_errors = request_outcome.into_errors();
        let response_errors = response_outcome.into_errors();
        let ok = !cancelled && request_errors.is_empty() && response_errors.is_empty();
        (ok, request_errors, response_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ParameterMeta, ResponseSpec};
    use http::Method;
    use serde_json::json;

    fn sample_document() -> Document {
        let op = Operation {
            method: Method::GET,
            path_pattern: "/items/{id}".to_string(),
            parameters: vec![
                ParameterMeta {
                    name: "id".to_string(),
                    location: ParameterLocation::Path,
                    required: true,
                    schema: Some(json!({"type": "integer"})),
                    style: None,
                    explode: None,
                    content: None,
                },
                ParameterMeta {
                    name: "verbose".to_string(),
                    location: ParameterLocation::Query,
                    required: true,
                    schema: Some(json!({"type": "boolean"})),
                    style: None,
                    explode: None,
                    content: None,
                },
            ],
            request_schema: None,
            request_body_required: false,
            request_content: HashMap::new(),
            responses: HashMap::from([(
                200u16,
                HashMap::from([(
                    "application/json".to_string(),
                    ResponseSpec {
                        schema: Some(json!({
                            "type": "object",
                            "properties": {"name": {"type": "string"}},
                            "required": ["name"]
                        })),
                        example: None,
                    },
                )]),
            )]),
            response_ranges: HashMap::new(),
            default_response: None,
            security: Vec::new(),
        };
        Document {
            openapi_version: crate::document::OpenApiVersion::V30,
            operations: vec![op],
            component_schemas: HashMap::new(),
            security_schemes: HashMap::new(),
        }
    }

    fn validator() -> Validator {
        Validator::new(sample_document(), ValidatorOptions::new())
    }

    #[test]
    fn unknown_path_is_reported() {
        let v = validator();
        let req = HttpRequest::new(Method::GET, "/nope");
        let (ok, errors) = v.validate_http_request_sync(&req);
        assert!(!ok);
        assert_eq!(errors[0].kind, ErrorKind::Path);
    }

    #[test]
    fn unsupported_method_is_reported() {
        let v = validator();
        let req = HttpRequest::new(Method::PUT, "/items/5").with_query("verbose=true");
        let (ok, errors) = v.validate_http_request_sync(&req);
        assert!(!ok);
        assert_eq!(errors[0].kind, ErrorKind::Method);
    }

    #[test]
    fn missing_required_query_parameter_is_reported() {
        let v = validator();
        let req = HttpRequest::new(Method::GET, "/items/5");
        let (ok, errors) = v.validate_http_request_sync(&req);
        assert!(!ok);
        assert!(errors.iter().any(|e| e.kind == ErrorKind::Parameter && e.sub_kind == "missing"));
    }

    #[test]
    fn valid_request_with_no_body_passes() {
        let v = validator();
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let (ok, errors) = v.validate_http_request_sync(&req);
        assert!(ok, "unexpected errors: {errors:?}");
    }

    #[test]
    fn parallel_and_sync_paths_agree() {
        let v = validator();
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let (sync_ok, _) = v.validate_http_request_sync(&req);
        let (parallel_ok, _) = v.validate_http_request(&req);
        assert_eq!(sync_ok, parallel_ok);
    }

    #[test]
    fn response_body_type_violation_is_reported() {
        let v = validator();
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let resp = HttpResponse::new(200).with_header("content-type", "application/json").with_body(br#"{"name": 123}"#.to_vec());
        let (ok, errors) = v.validate_http_response(&req, &resp);
        assert!(!ok);
        assert_eq!(errors[0].kind, ErrorKind::ResponseBodySchema);
    }

    #[test]
    fn response_for_undeclared_status_is_reported() {
        let v = validator();
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let resp = HttpResponse::new(404);
        let (ok, errors) = v.validate_http_response(&req, &resp);
        assert!(!ok);
        assert_eq!(errors[0].kind, ErrorKind::ResponseBodySchema);
        assert_eq!(errors[0].sub_kind, "status-not-found");
    }

    #[test]
    fn response_with_no_declared_contract_at_all_passes() {
        let mut doc = sample_document();
        doc.operations[0].responses.clear();
        let v = Validator::new(doc, ValidatorOptions::new());
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let resp = HttpResponse::new(404);
        let (ok, errors) = v.validate_http_response(&req, &resp);
        assert!(ok, "unexpected errors: {errors:?}");
    }

    #[test]
    fn response_status_range_is_matched_when_exact_status_is_absent() {
        let mut doc = sample_document();
        doc.operations[0].response_ranges.insert(
            2,
            HashMap::from([(
                "application/json".to_string(),
                ResponseSpec { schema: Some(json!({"type": "object", "required": ["name"]})), example: None },
            )]),
        );
        let v = Validator::new(doc, ValidatorOptions::new());
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let resp = HttpResponse::new(201).with_header("content-type", "application/json").with_body(br#"{}"#.to_vec());
        let (ok, errors) = v.validate_http_response(&req, &resp);
        assert!(!ok, "expected the 2XX range schema's required-field violation to apply");
        assert_eq!(errors[0].kind, ErrorKind::ResponseBodySchema);
        assert_eq!(errors[0].sub_kind, "schema");
    }

    #[test]
    fn cancelled_signal_short_circuits_request_validation() {
        let v = validator();
        let signal = CancellationSignal::new();
        signal.cancel();
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let (ok, errors) = v.validate_http_request_with(&req, &signal);
        assert!(!ok);
        assert!(errors.is_empty(), "cancellation must not surface a partial error list: {errors:?}");
    }

    #[test]
    fn uncancelled_signal_behaves_like_the_plain_call() {
        let v = validator();
        let signal = CancellationSignal::new();
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let (ok, errors) = v.validate_http_request_with(&req, &signal);
        assert!(ok, "unexpected errors: {errors:?}");
    }

    #[test]
    fn validate_document_compiles_every_declared_schema() {
        let v = validator();
        let (ok, errors) = v.validate_document();
        assert!(ok, "unexpected compile errors: {errors:?}");
    }

    #[test]
    fn request_and_response_validated_together() {
        let v = validator();
        let req = HttpRequest::new(Method::GET, "/items/5").with_query("verbose=true");
        let resp = HttpResponse::new(200).with_header("content-type", "application/json").with_body(br#"{"name": "widget"}"#.to_vec());
        let (ok, req_errors, resp_errors) = v.validate_http_request_response(&req, &resp);
        assert!(ok);
        assert!(req_errors.is_empty());
        assert!(resp_errors.is_empty());
    }
}
