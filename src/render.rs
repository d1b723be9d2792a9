//! Render-inline: walk a schema resolving `$ref` to produce a self-contained
//! document for compilation (C1/C5 collaborator).
//!
//! Adapted from this codebase's own `spec::build::expand_schema_refs`, with
//! one correction: `$ref` cycles are legitimate in OpenAPI and must not be
//! expanded indefinitely. A cycle
//! is detected by tracking the set of reference paths currently being
//! expanded on the current recursion branch; re-entering one emits a
//! placeholder `{"$ref": "..."}` node instead of recursing forever.

use crate::document::Document;
use serde_json::Value;
use std::collections::HashSet;

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Resolve a `$ref` pointer of the form `#/components/schemas/Name` against
/// the document's component schemas.
pub fn resolve_schema_ref<'a>(document: &'a Document, ref_path: &str) -> Option<&'a Value> {
    let name = ref_path.strip_prefix(SCHEMA_REF_PREFIX)?;
    document.component_schemas.get(name)
}

/// Render a schema value inline: every `$ref` is replaced by its resolved
/// target, recursively, except where doing so would re-enter a reference
/// already being expanded on this branch (a cycle) — that occurrence is left
/// as a bare `$ref` placeholder so the compiled evaluator resolves it once
/// rather than the renderer looping forever.
pub fn render_inline(document: &Document, value: &Value) -> Value {
    let mut seen = HashSet::new();
    render_inline_rec(document, value, &mut seen)
}

fn render_inline_rec(document: &Document, value: &Value, seen: &mut HashSet<String>) -> Value {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(ref_path)) = obj.get("$ref") {
                if seen.contains(ref_path) {
                    // Cycle: stop expanding, leave a resolvable placeholder.
                    return Value::Object(serde_json::Map::from_iter([(
                        "$ref".to_string(),
                        Value::String(ref_path.clone()),
                    )]));
                }
                if let Some(resolved) = resolve_schema_ref(document, ref_path) {
                    seen.insert(ref_path.clone());
                    let expanded = render_inline_rec(document, resolved, seen);
                    seen.remove(ref_path);
                    return expanded;
                }
                // Unresolvable ref: leave as-is, C5 compilation will surface it.
                return value.clone();
            }
            let mut out = serde_json::Map::with_capacity(obj.len());
            for (k, v) in obj {
                out.insert(k.clone(), render_inline_rec(document, v, seen));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| render_inline_rec(document, v, seen))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn doc_with_schemas(schemas: HashMap<String, Value>) -> Document {
        Document {
            openapi_version: crate::document::OpenApiVersion::V30,
            operations: Vec::new(),
            component_schemas: schemas,
            security_schemes: HashMap::new(),
        }
    }

    #[test]
    fn resolves_simple_ref() {
        let mut schemas = HashMap::new();
        schemas.insert(
            "Pet".to_string(),
            json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        );
        let doc = doc_with_schemas(schemas);
        let input = json!({"$ref": "#/components/schemas/Pet"});
        let rendered = render_inline(&doc, &input);
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["properties"]["name"]["type"], "string");
    }

    #[test]
    fn ref_reached_and_inline_schema_fingerprint_identically() {
        let mut schemas = HashMap::new();
        schemas.insert(
            "Pet".to_string(),
            json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        );
        let doc = doc_with_schemas(schemas);
        let via_ref = render_inline(&doc, &json!({"$ref": "#/components/schemas/Pet"}));
        let inline = render_inline(
            &doc,
            &json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        );
        assert_eq!(
            crate::fingerprint::fingerprint_schema(&via_ref),
            crate::fingerprint::fingerprint_schema(&inline),
            "ref-reached and structurally-identical inline schemas must fingerprint identically"
        );
    }

    #[test]
    fn detects_cycle_without_looping() {
        let mut schemas = HashMap::new();
        schemas.insert(
            "Node".to_string(),
            json!({
                "type": "object",
                "properties": {
                    "child": {"$ref": "#/components/schemas/Node"}
                }
            }),
        );
        let doc = doc_with_schemas(schemas);
        let input = json!({"$ref": "#/components/schemas/Node"});
        let rendered = render_inline(&doc, &input);
        // The inner self-reference must be left as a placeholder, not expanded forever.
        assert_eq!(
            rendered["properties"]["child"]["$ref"],
            "#/components/schemas/Node"
        );
    }

    #[test]
    fn leaves_non_ref_values_untouched() {
        let doc = doc_with_schemas(HashMap::new());
        let input = json!({"type": "integer", "minimum": 0});
        assert_eq!(render_inline(&doc, &input), input);
    }
}
