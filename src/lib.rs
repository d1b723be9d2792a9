//! # oas-validator-core
//!
//! A fast, concurrent request/response validator core for services described
//! by OpenAPI 3.x documents. Given a parsed document model and a live HTTP
//! request (and, optionally, its response), the validator checks path
//! existence, method, path/query/header/cookie parameters, security, and
//! request/response bodies against the operation contract the document
//! declares, returning a structured batch of failures precise enough to name
//! the violated keyword's document location and the failing field's JSON
//! pointer in the payload.
//!
//! ## Architecture
//!
//! The crate is organized around six components, wired together by
//! [`validator::Validator`]:
//!
//! - **[`fingerprint`]** — stable 32-byte content hash of a resolved schema,
//!   used as the cache key below.
//! - **[`cache`]** — thread-safe schema compilation cache (`SchemaCache`) and
//!   an optional compiled-regex cache for the path matcher's fallback.
//! - **[`path`]** — maps a URL to its operation set: a radix tree
//!   ([`path::RadixPathMatcher`]) with literal-over-parameter precedence, or a
//!   per-template regex fallback ([`path::RegexPathMatcher`]).
//! - **[`params`]** — reconstructs a parameter's logical value from its raw
//!   wire representation per OpenAPI `style`/`explode` semantics.
//! - **[`body`]** — reads a request/response body exactly once, republishes
//!   it so downstream consumers still see it, resolves `Content-Type`, and
//!   decodes the bytes into the value tree the evaluator checks.
//! - **[`render`]** — walks a schema resolving `$ref` into a self-contained
//!   document, tolerating cycles.
//! - **[`schema_eval`]** — compiles JSON-Schema with configured options and
//!   evaluates a decoded value, producing flat low-level violations.
//! - **[`error_mapper`]** — translates those violations into the domain
//!   [`error::ValidationError`] model, attributing spec line/column by
//!   locating the violated keyword inside the rendered schema.
//! - **[`security`]** — evaluates an operation's declared security
//!   requirements against caller-registered [`security::SecurityProvider`]s.
//! - **[`document`]** — the document-model adapter: extracts the flat
//!   operation table the validator needs from an `oas3::OpenApiV3Spec`.
//!
//! ## Quick start
//!
//! ```no_run
//! use oas_validator_core::document::load_document;
//! use oas_validator_core::http::HttpRequest;
//! use oas_validator_core::validator::{Validator, ValidatorOptions};
//! use http::Method;
//!
//! # fn main() -> anyhow::Result<()> {
//! let document = load_document("openapi.yaml")?;
//! let validator = Validator::new(document, ValidatorOptions::new());
//!
//! let request = HttpRequest::new(Method::GET, "/pets/123");
//! let (ok, errors) = validator.validate_http_request(&request);
//! if !ok {
//!     for err in &errors {
//!         eprintln!("{err}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! A [`validator::Validator`] is built once per document and is safe to share
//! across threads: the path tree is read-only after construction and the
//! schema cache is concurrent-safe (unrelated keys never contend). Within one
//! request, the four parameter locations (path/query/header/cookie) are
//! validated in parallel over `std::thread::scope`; request and response
//! validation of the same message may also run concurrently via
//! [`validator::Validator::validate_http_request_response`].
//!
//! ## Out of scope
//!
//! This crate does not parse OpenAPI documents (that is the `oas3` crate's
//! job, wrapped by [`document`]), does not implement JSON-Schema evaluation
//! from scratch (that is the `jsonschema` crate's job, wrapped by
//! [`schema_eval`]), and owns no transport: [`http::HttpRequest`] and
//! [`http::HttpResponse`] are plain value types an embedder builds from
//! whatever server framework it uses. XML and URL-encoded body decoding are
//! pluggable collaborators ([`body::BodyTransformer`]); this crate ships none.

pub mod body;
pub mod cache;
pub mod document;
pub mod error;
pub mod error_mapper;
pub mod fingerprint;
pub mod http;
pub mod params;
pub mod path;
pub mod render;
pub mod schema_eval;
pub mod security;
pub mod validator;

pub use document::{load_document, Document};
pub use error::{ErrorKind, ValidationError};
pub use http::{HttpRequest, HttpResponse};
pub use validator::{CancellationSignal, Validator, ValidatorOptions};
