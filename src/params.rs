//! Parameter validator (C3): reconstructs a parameter's logical value from
//! its raw wire representation per `style`/`explode`, applies the scalar
//! coercion policy, and hands the reconstructed value to the schema
//! evaluator (C5) the same way the body pipeline does.
//!
//! Adapted from this codebase's own `router::core` path-parameter
//! extraction, generalized from "bind a named path segment" to the full
//! OpenAPI 3.x parameter model: four locations (path/query/header/cookie),
//! seven styles, explode, and `content`-typed parameters.

use crate::document::{ParameterLocation, ParameterMeta, ParameterStyle};
use http::HeaderMap;
use serde_json::Value;

/// Where to pull a parameter's raw value(s) from for one HTTP message.
pub struct ParamSources<'a> {
    /// `(name, raw segment value)` pairs bound by the path matcher.
    pub path: &'a [(std::sync::Arc<str>, String)],
    /// Parsed query pairs, duplicates preserved in wire order.
    pub query: Vec<(String, String)>,
    pub headers: &'a HeaderMap,
    /// Raw `Cookie` header value, if present.
    pub cookie_header: Option<&'a str>,
}

/// Split a raw `Cookie` header into `(name, value)` pairs. Shared with
/// [`crate::security`]'s credential extraction so both read the same format.
pub(crate) fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

impl<'a> ParamSources<'a> {
    pub fn new(path: &'a [(std::sync::Arc<str>, String)], raw_query: &str, headers: &'a HeaderMap, cookie_header: Option<&'a str>) -> Self {
        let query = url::form_urlencoded::parse(raw_query.as_bytes())
            .into_owned()
            .collect();
        ParamSources { path, query, headers, cookie_header }
    }

    fn cookies(&self) -> Vec<(String, String)> {
        match self.cookie_header {
            Some(header) => parse_cookie_header(header),
            None => Vec::new(),
        }
    }

    /// All raw occurrences of `name` at `location`, in wire order. A path
    /// or single-valued header/cookie yields at most one occurrence; query
    /// parameters and repeated headers may yield several (spec 4.3: "query
    /// parameters" — multiple occurrences combine per explode/style).
    fn occurrences(&self, location: ParameterLocation, name: &str) -> Vec<String> {
        match location {
            ParameterLocation::Path => self
                .path
                .iter()
                .filter(|(n, _)| n.as_ref() == name)
                .map(|(_, v)| v.clone())
                .collect(),
            ParameterLocation::Query => self
                .query
                .iter()
                .filter(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .collect(),
            ParameterLocation::Header => self
                .headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(|s| s.to_string())
                .collect(),
            ParameterLocation::Cookie => self
                .cookies()
                .into_iter()
                .filter(|(k, _)| k == name)
                .map(|(_, v)| v)
                .collect(),
        }
    }
}

fn schema_type(schema: &Value) -> &str {
    schema.get("type").and_then(Value::as_str).unwrap_or("string")
}

fn coerce_scalar(raw: &str, item_schema: Option<&Value>, allow_coercion: bool) -> Value {
    if !allow_coercion {
        return Value::String(raw.to_string());
    }
    match item_schema.map(schema_type) {
        Some("integer") => raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::String(raw.to_string())),
        Some("number") => raw.parse::<f64>().ok().and_then(Value::from_f64).unwrap_or_else(|| Value::String(raw.to_string())),
        Some("boolean") => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}

fn split_label_or_matrix(raw: &str, prefix_len: usize) -> &str {
    raw.get(prefix_len..).unwrap_or("")
}

/// Reconstruct an array from a single delimited raw string (used by
/// `simple`, `label` non-explode, `matrix` non-explode, `spaceDelimited`,
/// `pipeDelimited`, and `form` non-explode).
fn split_array(raw: &str, delimiter: char, item_schema: Option<&Value>, allow_coercion: bool) -> Value {
    let items_schema = item_schema.and_then(|s| s.get("items"));
    Value::Array(
        raw.split(delimiter)
            .filter(|s| !s.is_empty())
            .map(|s| coerce_scalar(s, items_schema, allow_coercion))
            .collect(),
    )
}

fn object_from_flat_pairs(pairs: impl Iterator<Item = (String, String)>, schema: &Value, allow_coercion: bool) -> Value {
    let properties = schema.get("properties");
    let mut map = serde_json::Map::new();
    for (k, v) in pairs {
        let prop_schema = properties.and_then(|p| p.get(&k));
        map.insert(k, coerce_scalar(&v, prop_schema, allow_coercion));
    }
    Value::Object(map)
}

/// Reconstruct a parameter's logical value from its raw occurrences.
///
/// Supports: `simple` and `form` fully (scalar/array/object, explode and
/// non-explode); `label`/`matrix` for scalars and arrays; `spaceDelimited`/
/// `pipeDelimited` arrays; `deepObject` and exploded-`form` objects via
/// `all_query_pairs` (the full query string, since both styles spread an
/// object's properties across sibling top-level query keys rather than
/// nesting them under the parameter's own name).
pub fn reconstruct(
    occurrences: &[String],
    style: ParameterStyle,
    explode: bool,
    schema: &Value,
    param_name: &str,
    all_query_pairs: Option<&[(String, String)]>,
    allow_coercion: bool,
) -> Option<Value> {
    let kind = schema_type(schema);

    if kind == "object" {
        return match style {
            ParameterStyle::DeepObject => {
                let pairs = all_query_pairs?.iter().filter_map(|(k, v)| {
                    let prefix = format!("{param_name}[");
                    let inner = k.strip_prefix(&prefix)?.strip_suffix(']')?;
                    Some((inner.to_string(), v.clone()))
                });
                Some(object_from_flat_pairs(pairs, schema, allow_coercion))
            }
            ParameterStyle::Form if explode => {
                let props = schema.get("properties")?.as_object()?;
                let pairs = all_query_pairs?.iter().filter(|(k, _)| props.contains_key(k)).cloned();
                Some(object_from_flat_pairs(pairs, schema, allow_coercion))
            }
            ParameterStyle::Simple if explode => {
                let raw = occurrences.first()?;
                let pairs = raw.split(',').filter_map(|kv| kv.split_once('=')).map(|(k, v)| (k.to_string(), v.to_string()));
                Some(object_from_flat_pairs(pairs, schema, allow_coercion))
            }
            ParameterStyle::Matrix if explode => {
                let raw = occurrences.first()?;
                let stripped = split_label_or_matrix(raw, 1 + param_name.len() + 1);
                let pairs = stripped.split(';').filter_map(|kv| kv.split_once('=')).map(|(k, v)| (k.to_string(), v.to_string()));
                Some(object_from_flat_pairs(pairs, schema, allow_coercion))
            }
            _ => {
                // Non-explode simple/label/matrix/form: alternating key,value list.
                let raw = match style {
                    ParameterStyle::Label => split_label_or_matrix(occurrences.first()?, 1),
                    ParameterStyle::Matrix => split_label_or_matrix(occurrences.first()?, 1 + param_name.len() + 1),
                    _ => occurrences.first()?.as_str(),
                };
                let tokens: Vec<&str> = raw.split(',').collect();
                let pairs = tokens.chunks(2).filter(|c| c.len() == 2).map(|c| (c[0].to_string(), c[1].to_string()));
                Some(object_from_flat_pairs(pairs, schema, allow_coercion))
            }
        };
    }

    if kind == "array" {
        return match style {
            ParameterStyle::Form if explode => Some(Value::Array(
                occurrences.iter().map(|s| coerce_scalar(s, schema.get("items"), allow_coercion)).collect(),
            )),
            ParameterStyle::SpaceDelimited => Some(split_array(occurrences.first()?, ' ', Some(schema), allow_coercion)),
            ParameterStyle::PipeDelimited => Some(split_array(occurrences.first()?, '|', Some(schema), allow_coercion)),
            ParameterStyle::Label => {
                let raw = split_label_or_matrix(occurrences.first()?, 1);
                let delim = if explode { '.' } else { ',' };
                Some(split_array(raw, delim, Some(schema), allow_coercion))
            }
            ParameterStyle::Matrix => {
                let raw = split_label_or_matrix(occurrences.first()?, 1 + param_name.len() + 1);
                Some(split_array(raw, ',', Some(schema), allow_coercion))
            }
            _ => Some(split_array(occurrences.first()?, ',', Some(schema), allow_coercion)),
        };
    }

    // Scalar.
    let raw = occurrences.first()?;
    let raw = match style {
        ParameterStyle::Label => split_label_or_matrix(raw, 1),
        ParameterStyle::Matrix => split_label_or_matrix(raw, 1 + param_name.len() + 1),
        _ => raw.as_str(),
    };
    Some(coerce_scalar(raw, Some(schema), allow_coercion))
}

/// Outcome of extracting one declared parameter from a request.
pub enum Extracted {
    /// Required and absent.
    Missing,
    /// Declared but not present; no error (optional parameters may be absent).
    Absent,
    /// Present; reconstructed logical value ready for C5.
    Present(Value),
    /// Present with a `content` mapping; raw bytes ready for C4+C5 as a body.
    PresentAsContent { media_type: String, schema: Value, raw: Vec<u8> },
}

/// Extract and reconstruct one declared parameter (spec 4.3).
pub fn extract(meta: &ParameterMeta, sources: &ParamSources, allow_coercion: bool) -> Extracted {
    let occurrences = sources.occurrences(meta.location, &meta.name);
    if occurrences.is_empty() {
        return if meta.required { Extracted::Missing } else { Extracted::Absent };
    }

    if let Some(content) = &meta.content {
        let Some((media_type, schema)) = content.iter().next() else {
            return Extracted::Absent;
        };
        return Extracted::PresentAsContent {
            media_type: media_type.clone(),
            schema: schema.clone(),
            raw: occurrences[0].clone().into_bytes(),
        };
    }

    let style = meta.style.unwrap_or_else(|| ParameterStyle::default_for(meta.location));
    let explode = meta.explode.unwrap_or(matches!(style, ParameterStyle::Form));
    let schema = meta.schema.clone().unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    match reconstruct(&occurrences, style, explode, &schema, &meta.name, Some(&sources.query), allow_coercion) {
        Some(value) => Extracted::Present(value),
        None => Extracted::Absent,
    }
}
