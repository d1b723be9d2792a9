//! Document model adapter (C1/C2/C3 external collaborator glue).
//!
//! The core does not parse OpenAPI documents itself — document loading and
//! parsing is an external collaborator's concern. That collaborator is the
//! `oas3` crate, the same document-model dependency this codebase has
//! always used for its OpenAPI document handling. This module extracts
//! exactly what the validator needs (method,
//! path template, parameter metadata, request/response schemas, security
//! requirements) into a flat [`Document`] / [`Operation`] table, deliberately
//! dropping everything this codebase's original `spec::build` module carried
//! for code generation (handler names, output directories, example slugs).

use http::Method;
use oas3::spec::{MediaTypeExamples, ObjectOrReference, Parameter};
pub use oas3::spec::{SecurityRequirement, SecurityScheme};
use oas3::OpenApiV3Spec;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        };
        write!(f, "{s}")
    }
}

impl From<oas3::spec::ParameterIn> for ParameterLocation {
    fn from(loc: oas3::spec::ParameterIn) -> Self {
        match loc {
            oas3::spec::ParameterIn::Path => ParameterLocation::Path,
            oas3::spec::ParameterIn::Query => ParameterLocation::Query,
            oas3::spec::ParameterIn::Header => ParameterLocation::Header,
            oas3::spec::ParameterIn::Cookie => ParameterLocation::Cookie,
        }
    }
}

/// Serialization style for a parameter, per OpenAPI 3.x `style` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

impl From<oas3::spec::ParameterStyle> for ParameterStyle {
    fn from(style: oas3::spec::ParameterStyle) -> Self {
        match style {
            oas3::spec::ParameterStyle::Matrix => ParameterStyle::Matrix,
            oas3::spec::ParameterStyle::Label => ParameterStyle::Label,
            oas3::spec::ParameterStyle::Form => ParameterStyle::Form,
            oas3::spec::ParameterStyle::Simple => ParameterStyle::Simple,
            oas3::spec::ParameterStyle::SpaceDelimited => ParameterStyle::SpaceDelimited,
            oas3::spec::ParameterStyle::PipeDelimited => ParameterStyle::PipeDelimited,
            oas3::spec::ParameterStyle::DeepObject => ParameterStyle::DeepObject,
        }
    }
}

impl ParameterStyle {
    /// Default style for a given parameter location, per the OpenAPI 3.x spec table.
    pub fn default_for(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Query | ParameterLocation::Cookie => ParameterStyle::Form,
            ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Value>,
    pub style: Option<ParameterStyle>,
    pub explode: Option<bool>,
    /// Media-type -> schema, for parameters declared with `content` instead of `schema`.
    pub content: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub schema: Option<Value>,
    pub example: Option<Value>,
}

/// status code -> media type -> spec.
pub type Responses = HashMap<u16, HashMap<String, ResponseSpec>>;

/// status-code range ("2XX", "4XX", ...), keyed by its leading digit -> media
/// type -> spec. Exact status codes always take precedence over a range;
/// ranges take precedence over `default` (OpenAPI 3.x responses object
/// precedence rules).
pub type ResponseRanges = HashMap<u8, HashMap<String, ResponseSpec>>;

#[derive(Debug, Clone)]
pub struct Operation {
    pub method: Method,
    pub path_pattern: String,
    pub parameters: Vec<ParameterMeta>,
    pub request_schema: Option<Value>,
    pub request_body_required: bool,
    /// media-type -> schema, for operations with more than one request content type.
    pub request_content: HashMap<String, Value>,
    pub responses: Responses,
    pub response_ranges: ResponseRanges,
    pub default_response: Option<ResponseSpec>,
    pub security: Vec<SecurityRequirement>,
}

/// Which OpenAPI major.minor dialect a document declares (spec section 4.5:
/// 3.0.x documents evaluate schemas as JSON-Schema-draft-4-flavored OpenAPI
/// Schema Objects; 3.1.x documents are full JSON-Schema-2020-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenApiVersion {
    #[default]
    V30,
    V31,
}

/// Flat operation table plus the component schemas/security schemes needed
/// to render `$ref`s and check security requirements. This is the "document
/// model" the validator is constructed from.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub openapi_version: OpenApiVersion,
    pub operations: Vec<Operation>,
    pub component_schemas: HashMap<String, Value>,
    pub security_schemes: HashMap<String, SecurityScheme>,
}

fn resolve_schema_ref_raw<'a>(
    spec: &'a OpenApiV3Spec,
    ref_path: &str,
) -> Option<&'a oas3::spec::ObjectSchema> {
    let name = ref_path.strip_prefix("#/components/schemas/")?;
    match spec.components.as_ref()?.schemas.get(name)? {
        ObjectOrReference::Object(schema) => Some(schema),
        _ => None,
    }
}

fn resolve_parameter_ref<'a>(
    spec: &'a OpenApiV3Spec,
    ref_path: &str,
) -> Option<&'a Parameter> {
    let name = ref_path.strip_prefix("#/components/parameters/")?;
    match spec.components.as_ref()?.parameters.get(name)? {
        ObjectOrReference::Object(param) => Some(param),
        _ => None,
    }
}

fn schema_value(
    spec: &OpenApiV3Spec,
    schema_ref: &ObjectOrReference<oas3::spec::ObjectSchema>,
) -> Option<Value> {
    match schema_ref {
        ObjectOrReference::Object(obj) => serde_json::to_value(obj).ok(),
        ObjectOrReference::Ref { ref_path } => {
            resolve_schema_ref_raw(spec, ref_path).and_then(|s| serde_json::to_value(s).ok())
        }
    }
}

fn extract_parameters(spec: &OpenApiV3Spec, params: &[ObjectOrReference<Parameter>]) -> Vec<ParameterMeta> {
    let mut out = Vec::with_capacity(params.len());
    for p in params {
        let param = match p {
            ObjectOrReference::Object(obj) => Some(obj),
            ObjectOrReference::Ref { ref_path } => resolve_parameter_ref(spec, ref_path),
        };
        let Some(param) = param else { continue };

        let schema = param.schema.as_ref().and_then(|s| schema_value(spec, s));
        let content: Option<HashMap<String, Value>> = if param.content.is_empty() {
            None
        } else {
            Some(
                param
                    .content
                    .iter()
                    .filter_map(|(mt, media)| {
                        media.schema.as_ref().and_then(|s| schema_value(spec, s)).map(|v| (mt.clone(), v))
                    })
                    .collect(),
            )
        };

        out.push(ParameterMeta {
            name: param.name.clone(),
            location: ParameterLocation::from(param.location),
            required: param.required.unwrap_or(false),
            schema,
            style: param.style.map(ParameterStyle::from),
            explode: param.explode,
            content,
        });
    }
    out
}

fn extract_request(spec: &OpenApiV3Spec, operation: &oas3::spec::Operation) -> (Option<Value>, bool, HashMap<String, Value>) {
    let mut required = false;
    let mut primary = None;
    let mut all = HashMap::new();

    if let Some(ObjectOrReference::Object(body)) = operation.request_body.as_ref() {
        required = body.required.unwrap_or(false);
        for (mt, media) in &body.content {
            if let Some(schema_ref) = media.schema.as_ref() {
                if let Some(v) = schema_value(spec, schema_ref) {
                    all.insert(mt.clone(), v.clone());
                    if mt == "application/json" {
                        primary = Some(v);
                    }
                }
            }
        }
        if primary.is_none() {
            primary = all.values().next().cloned();
        }
    }

    (primary, required, all)
}

/// A range pattern is exactly one leading digit in `1..=5` followed by two
/// wildcard characters (`XX` or `xx`), e.g. `"2XX"`.
fn status_range_digit(status_str: &str) -> Option<u8> {
    let bytes = status_str.as_bytes();
    if bytes.len() != 3 {
        return None;
    }
    let leading = (bytes[0] as char).to_digit(10)?;
    if !(1..=5).contains(&leading) {
        return None;
    }
    let tail_is_wildcard = bytes[1].eq_ignore_ascii_case(&b'X') && bytes[2].eq_ignore_ascii_case(&b'X');
    tail_is_wildcard.then_some(leading as u8)
}

fn extract_responses(
    spec: &OpenApiV3Spec,
    operation: &oas3::spec::Operation,
) -> (Responses, ResponseRanges, Option<ResponseSpec>) {
    let mut all: Responses = HashMap::new();
    let mut ranges: ResponseRanges = HashMap::new();
    let mut default_spec = None;

    let Some(responses_map) = operation.responses.as_ref() else {
        return (all, ranges, default_spec);
    };

    for (status_str, resp_ref) in responses_map {
        let ObjectOrReference::Object(resp_obj) = resp_ref else {
            continue;
        };
        let mut per_media = HashMap::new();
        for (mt, media) in &resp_obj.content {
            let example = match &media.examples {
                Some(MediaTypeExamples::Example { example }) => Some(example.clone()),
                Some(MediaTypeExamples::Examples { examples }) => {
                    examples.iter().find_map(|(_, v)| match v {
                        ObjectOrReference::Object(obj) => obj.value.clone(),
                        _ => None,
                    })
                }
                None => None,
            };
            let schema = media.schema.as_ref().and_then(|s| schema_value(spec, s));
            per_media.insert(mt.clone(), ResponseSpec { schema, example });
        }

        if status_str == "default" {
            default_spec = per_media.get("application/json").cloned().or_else(|| per_media.values().next().cloned());
            continue;
        }
        if let Ok(status) = status_str.parse::<u16>() {
            all.insert(status, per_media);
            continue;
        }
        if let Some(digit) = status_range_digit(status_str) {
            ranges.insert(digit, per_media);
        }
    }

    (all, ranges, default_spec)
}

/// Build the validator's [`Document`] from an already-parsed `oas3::OpenApiV3Spec`.
pub fn build_document(spec: &OpenApiV3Spec) -> anyhow::Result<Document> {
    let openapi_version = if spec.openapi.starts_with("3.1") {
        OpenApiVersion::V31
    } else {
        OpenApiVersion::V30
    };

    let mut operations = Vec::new();

    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            for (method, operation) in item.methods() {
                let (request_schema, request_body_required, request_content) =
                    extract_request(spec, operation);
                let (responses, response_ranges, default_response) = extract_responses(spec, operation);

                let security = if !operation.security.is_empty() {
                    operation.security.clone()
                } else {
                    spec.security.clone()
                };

                let mut parameters = extract_parameters(spec, &item.parameters);
                parameters.extend(extract_parameters(spec, &operation.parameters));

                operations.push(Operation {
                    method: method.clone(),
                    path_pattern: path.clone(),
                    parameters,
                    request_schema,
                    request_body_required,
                    request_content,
                    responses,
                    response_ranges,
                    default_response,
                    security,
                });
            }
        }
    }

    let component_schemas: HashMap<String, Value> = spec
        .components
        .as_ref()
        .map(|c| {
            c.schemas
                .iter()
                .filter_map(|(name, schema_ref)| match schema_ref {
                    ObjectOrReference::Object(obj) => {
                        serde_json::to_value(obj).ok().map(|v| (name.clone(), v))
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let security_schemes: HashMap<String, SecurityScheme> = spec
        .components
        .as_ref()
        .map(|c| {
            c.security_schemes
                .iter()
                .filter_map(|(name, scheme)| match scheme {
                    ObjectOrReference::Object(obj) => Some((name.clone(), obj.clone())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Document {
        openapi_version,
        operations,
        component_schemas,
        security_schemes,
    })
}

/// Load and parse an OpenAPI document from a YAML or JSON file, then build
/// the validator's [`Document`] from it. The parse itself is the external
/// collaborator's job in spirit (spec section 1); this helper exists only so
/// the thin CLI (section 6) has a one-call entry point, matching this
/// codebase's own `spec::load_spec` convenience wrapper.
pub fn load_document(file_path: &str) -> anyhow::Result<Document> {
    let content = std::fs::read_to_string(file_path)?;
    let spec: OpenApiV3Spec = if file_path.ends_with(".yaml") || file_path.ends_with(".yml") {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    build_document(&spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_styles_follow_openapi_table() {
        assert_eq!(
            ParameterStyle::default_for(ParameterLocation::Query),
            ParameterStyle::Form
        );
        assert_eq!(
            ParameterStyle::default_for(ParameterLocation::Path),
            ParameterStyle::Simple
        );
        assert_eq!(
            ParameterStyle::default_for(ParameterLocation::Header),
            ParameterStyle::Simple
        );
        assert_eq!(
            ParameterStyle::default_for(ParameterLocation::Cookie),
            ParameterStyle::Form
        );
    }

    #[test]
    fn status_range_digit_accepts_only_well_formed_ranges() {
        assert_eq!(status_range_digit("2XX"), Some(2));
        assert_eq!(status_range_digit("4xx"), Some(4));
        assert_eq!(status_range_digit("200"), None);
        assert_eq!(status_range_digit("default"), None);
        assert_eq!(status_range_digit("6XX"), None);
        assert_eq!(status_range_digit("2X"), None);
    }

    #[test]
    fn build_document_detects_openapi_31() {
        let yaml = r#"
openapi: 3.1.0
info:
  title: t
  version: "1"
paths: {}
"#;
        let spec: OpenApiV3Spec = serde_yaml::from_str(yaml).expect("valid minimal spec");
        let doc = build_document(&spec).expect("builds");
        assert_eq!(doc.openapi_version, OpenApiVersion::V31);
    }

    #[test]
    fn build_document_detects_openapi_30() {
        let yaml = r#"
openapi: 3.0.3
info:
  title: t
  version: "1"
paths: {}
"#;
        let spec: OpenApiV3Spec = serde_yaml::from_str(yaml).expect("valid minimal spec");
        let doc = build_document(&spec).expect("builds");
        assert_eq!(doc.openapi_version, OpenApiVersion::V30);
    }
}
