//! Schema evaluator (C5): compiles JSON-Schema with configured options and
//! evaluates a decoded value, producing a flat list of low-level
//! violations for C6 to translate.
//!
//! Out of scope per section 1 (the evaluator itself is an external
//! collaborator): this module is a thin, option-driven wrapper around the
//! `jsonschema` crate, the same crate this codebase already depends on for
//! its own `validator_cache`.

use serde_json::{json, Value};
use std::sync::Arc;

/// Which OpenAPI major version's schema dialect applies (spec 4.5:
/// "under OpenAPI 3.0 the schema dialect draft is fixed to draft-4
/// semantics, under 3.1 to draft 2020-12").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    OpenApi30,
    OpenApi31,
}

impl Dialect {
    fn draft(self) -> jsonschema::Draft {
        match self {
            Dialect::OpenApi30 => jsonschema::Draft::Draft4,
            Dialect::OpenApi31 => jsonschema::Draft::Draft202012,
        }
    }
}

/// A custom `format` predicate (section 6: `customFormats: name -> predicate`).
pub type FormatPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Compilation options recognised by C5 (spec 4.5).
#[derive(Clone)]
pub struct EvalOptions {
    pub dialect: Dialect,
    pub format_assertions: bool,
    /// `contentEncoding`/`contentMediaType` assertions. The `jsonschema`
    /// crate always evaluates these keywords per its draft; this flag is
    /// accepted for interface compatibility with section 6 but has no
    /// independent effect beyond `format_assertions` (documented as an Open
    /// Question resolution in DESIGN.md).
    pub content_assertions: bool,
    pub open_api_mode: bool,
    pub custom_formats: Vec<(String, FormatPredicate)>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            dialect: Dialect::OpenApi31,
            format_assertions: true,
            content_assertions: true,
            open_api_mode: true,
            custom_formats: Vec::new(),
        }
    }
}

/// Compile a rendered (fully `$ref`-resolved) schema into a reusable
/// evaluator. Errors are returned as a message, never a panic: callers
/// cache a `None` compiled handle on failure (C1) rather than retrying.
pub fn compile(rendered_json: &Value, options: &EvalOptions) -> Result<jsonschema::Validator, String> {
    let schema = if options.open_api_mode {
        apply_open_api_vocabulary(rendered_json)
    } else {
        rendered_json.clone()
    };
    let mut builder = jsonschema::options()
        .with_draft(options.dialect.draft())
        .should_validate_formats(options.format_assertions);
    for (name, predicate) in &options.custom_formats {
        let predicate = Arc::clone(predicate);
        builder = builder.with_format(name.clone(), move |s: &str| predicate(s));
    }
    builder.build(&schema).map_err(|e| e.to_string())
}

/// Rewrites the OpenAPI-specific keyword vocabulary into standard
/// JSON-Schema the underlying evaluator understands (spec 4.5: "openApiMode
/// enables the OpenAPI-specific keyword vocabulary (e.g., `nullable`,
/// `discriminator`) on top of standard JSON-Schema").
///
/// `nullable: true` widens the sibling `type` to also accept `null`; absent
/// a `type` to widen, the schema is wrapped so null passes alongside
/// whatever else it already constrains. `discriminator.propertyName` is
/// folded into `required`, since OpenAPI mandates the discriminator
/// property be present on every member of the polymorphic schema.
fn apply_open_api_vocabulary(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut out = serde_json::Map::with_capacity(obj.len());
            for (k, v) in obj {
                if k == "nullable" || k == "discriminator" {
                    continue;
                }
                out.insert(k.clone(), apply_open_api_vocabulary(v));
            }

            if matches!(obj.get("nullable"), Some(Value::Bool(true))) {
                match out.get("type").cloned() {
                    Some(Value::String(t)) => {
                        out.insert("type".to_string(), json!([t, "null"]));
                    }
                    Some(Value::Array(mut types)) => {
                        if !types.iter().any(|t| t == "null") {
                            types.push(Value::String("null".to_string()));
                        }
                        out.insert("type".to_string(), Value::Array(types));
                    }
                    None => {
                        let rest = Value::Object(out);
                        return json!({"anyOf": [rest, {"type": "null"}]});
                    }
                }
            }

            if let Some(Value::Object(discriminator)) = obj.get("discriminator") {
                if let Some(Value::String(property_name)) = discriminator.get("propertyName") {
                    let required = out
                        .entry("required".to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(items) = required {
                        if !items.iter().any(|v| v.as_str() == Some(property_name.as_str())) {
                            items.push(Value::String(property_name.clone()));
                        }
                    }
                }
            }

            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(apply_open_api_vocabulary).collect()),
        other => other.clone(),
    }
}

/// One low-level violation flattened out of the evaluator's error tree
/// (spec 4.5: `{keywordLocation, instanceLocation, kind, localizedMessage}`).
#[derive(Debug, Clone)]
pub struct Violation {
    pub keyword_location: String,
    pub instance_location: String,
    pub kind: String,
    pub message: String,
}

/// The last non-numeric path segment of a schema pointer is the violated
/// keyword itself, e.g. `/properties/patties/type` -> `type`.
fn keyword_from_schema_path(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|seg| !seg.is_empty())
        .unwrap_or("")
        .to_string()
}

/// The "internal" noise regex (spec 4.6): composite keywords like
/// `anyOf`/`oneOf`/`allOf`/`not`/`if` produce a redundant top-level trace in
/// addition to the specific sub-schema failure; skip the composite trace so
/// callers see only the leaf violation.
fn is_internal_keyword(keyword: &str) -> bool {
    matches!(keyword, "anyOf" | "oneOf" | "allOf" | "not" | "if")
}

/// Evaluate a decoded value against a compiled schema, flattening the
/// result into violations. Returns an empty vec for a valid instance.
/// Deterministic: same schema + same value always yields the same set
/// (spec invariant/testable property: evaluation determinism).
pub fn evaluate(validator: &jsonschema::Validator, instance: &Value) -> Vec<Violation> {
    let Err(errors) = validator.validate(instance) else {
        return Vec::new();
    };

    errors
        .filter_map(|err| {
            let keyword_location = err.schema_path.to_string();
            if keyword_location.is_empty() {
                return None;
            }
            let kind = keyword_from_schema_path(&keyword_location);
            if is_internal_keyword(&kind) {
                return None;
            }
            Some(Violation {
                instance_location: err.instance_path.to_string(),
                message: err.to_string(),
                keyword_location,
                kind,
            })
        })
        .collect()
}
