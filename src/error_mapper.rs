//! Error mapper (C6): translates flattened evaluator violations into the
//! domain error model, including spec-line/column attribution obtained by
//! locating the violated keyword inside the rendered YAML document.
//!
//! `serde_yaml`'s public `Value` does not retain source positions (the
//! upstream `unsafe-libyaml` backend drops them), so locating a keyword's
//! line/column is done by a small indentation-aware text walk over the
//! rendered YAML instead of a second structural parse — the rendered bytes
//! are produced by this crate's own [`crate::render`] with a fixed 2-space
//! indent (`serde_yaml`'s default), so the walk's indent arithmetic is
//! exact for every schema this crate renders.

use crate::error::SchemaViolation;
use crate::schema_eval::Violation;
use serde_json::Value;

const INDENT_WIDTH: usize = 2;

/// Locate the 1-based (line, column) of the keyword named by the last
/// segment of `pointer` (a `/`-separated JSON-pointer-like path, e.g.
/// `/properties/patties/type`) inside rendered YAML text. Returns `(0, 0)`
/// when the path can't be resolved (e.g. the schema was rendered
/// differently than expected, or the pointer is empty).
pub fn locate_keyword(yaml_text: &str, pointer: &str) -> (usize, usize) {
    let segments: Vec<&str> = pointer.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return (0, 0);
    }
    let lines: Vec<&str> = yaml_text.lines().collect();

    let mut search_from = 0usize;
    let mut indent = 0usize;
    let mut found_line = None;

    for seg in &segments {
        let mut sibling_count = 0usize;
        let mut this_found = None;
        let mut i = search_from;
        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                i += 1;
                continue;
            }
            let cur_indent = line.len() - trimmed.len();
            if cur_indent < indent {
                break;
            }
            if cur_indent == indent {
                if let Ok(target_idx) = seg.parse::<usize>() {
                    if let Some(rest) = trimmed.strip_prefix("- ") {
                        let _ = rest;
                        if sibling_count == target_idx {
                            this_found = Some(i);
                            break;
                        }
                        sibling_count += 1;
                    }
                } else if let Some(key) = trimmed.split(':').next() {
                    if key == *seg {
                        this_found = Some(i);
                        break;
                    }
                }
            }
            i += 1;
        }
        let Some(f) = this_found else {
            return (0, 0);
        };
        found_line = Some(f);
        search_from = f + 1;
        indent += INDENT_WIDTH;
    }

    match found_line {
        Some(line_idx) => {
            let line = lines[line_idx];
            let col = line.len() - line.trim_start().len() + 1;
            (line_idx + 1, col)
        }
        None => (0, 0),
    }
}

/// Convert a JSON pointer (`/items/2/patties`) into the dotted/bracketed
/// field path error messages reference (`items[2].patties`).
pub fn pointer_to_field_path(pointer: &str) -> String {
    let mut out = String::new();
    for seg in pointer.split('/').filter(|s| !s.is_empty()) {
        if let Ok(_idx) = seg.parse::<usize>() {
            out.push('[');
            out.push_str(seg);
            out.push(']');
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(seg);
        }
    }
    out
}

fn navigate(value: &Value, pointer: &str) -> Option<Value> {
    if pointer.is_empty() {
        return Some(value.clone());
    }
    value.pointer(pointer).cloned()
}

/// The reference object attached to a violation (spec 4.6: instance
/// mapping). If the decoded root is a sequence, the specific failing
/// element is extracted by its leading index; otherwise the full body.
fn reference_object(root: &Value, instance_location: &str) -> Option<Value> {
    if let Value::Array(items) = root {
        let mut segments = instance_location.split('/').filter(|s| !s.is_empty());
        if let Some(idx_str) = segments.next() {
            if let Ok(idx) = idx_str.parse::<usize>() {
                return items.get(idx).cloned();
            }
        }
        return Some(root.clone());
    }
    Some(root.clone())
}

/// Produce a spec-flavored human reason for the common keywords the test
/// scenarios call out by name, falling back to the evaluator's own message
/// for everything else. `schema_node` is the rendered schema's JSON value
/// at `keyword_location`; `instance_node` is the decoded value at
/// `instance_location`.
fn humanize(keyword: &str, schema_node: Option<&Value>, instance_node: Option<&Value>, raw_message: &str) -> String {
    match keyword {
        "type" => match schema_node.and_then(Value::as_str) {
            Some(expected) => format!("expected {expected}"),
            None => raw_message.to_string(),
        },
        "maxItems" => match (schema_node.and_then(Value::as_u64), instance_node.and_then(Value::as_array)) {
            (Some(limit), Some(items)) => {
                format!("maximum {limit} items required, but found {} items", items.len())
            }
            _ => raw_message.to_string(),
        },
        "minItems" => match (schema_node.and_then(Value::as_u64), instance_node.and_then(Value::as_array)) {
            (Some(limit), Some(items)) => {
                format!("minimum {limit} items required, but found {} items", items.len())
            }
            _ => raw_message.to_string(),
        },
        _ => raw_message.to_string(),
    }
}

fn how_to_fix(keyword: &str) -> Option<String> {
    match keyword {
        "type" => Some("change the field's value to match the declared type".to_string()),
        "required" => Some("add the missing required field".to_string()),
        "maxItems" | "minItems" => Some("adjust the array length to satisfy the schema's item count bounds".to_string()),
        "enum" => Some("use one of the values permitted by the schema's enum".to_string()),
        _ => None,
    }
}

/// Translate one flattened evaluator violation into a domain
/// [`SchemaViolation`], attributing spec line/column by scanning
/// `rendered_yaml` and resolving schema/instance context from
/// `rendered_json`/`instance_root`.
pub fn map_violation(
    violation: &Violation,
    rendered_yaml: &str,
    rendered_json: &Value,
    instance_root: &Value,
) -> SchemaViolation {
    let (line, column) = locate_keyword(rendered_yaml, &violation.keyword_location);
    let schema_node = navigate(rendered_json, &violation.keyword_location);
    let instance_node = navigate(instance_root, &violation.instance_location);
    let reason = humanize(&violation.kind, schema_node.as_ref(), instance_node.as_ref(), &violation.message);

    SchemaViolation {
        reason,
        keyword_location: violation.keyword_location.clone(),
        instance_location: violation.instance_location.clone(),
        field_path: pointer_to_field_path(&violation.instance_location),
        line,
        column,
        reference_object: reference_object(instance_root, &violation.instance_location),
    }
}

/// Translate a batch of violations, also producing the best available
/// `how_to_fix` hint for the whole set (first non-`None` hint wins; most
/// violation batches share one dominant keyword).
pub fn map_violations(
    violations: &[Violation],
    rendered_yaml: &str,
    rendered_json: &Value,
    instance_root: &Value,
) -> (Vec<SchemaViolation>, Option<String>) {
    let mapped: Vec<SchemaViolation> = violations
        .iter()
        .map(|v| map_violation(v, rendered_yaml, rendered_json, instance_root))
        .collect();
    let hint = violations.iter().find_map(|v| how_to_fix(&v.kind));
    (mapped, hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_eval::{compile, evaluate, EvalOptions};
    use serde_json::json;

    #[test]
    fn s3_max_items_line_and_column() {
        let schema = json!({"type": "array", "maxItems": 2});
        let rendered_yaml = serde_yaml::to_string(&schema).unwrap();
        let compiled = compile(&schema, &EvalOptions::default()).unwrap();
        let instance = json!([1, 2, 3, 4]);
        let violations = evaluate(&compiled, &instance);
        assert_eq!(violations.len(), 1);

        let (mapped, _hint) = map_violations(&violations, &rendered_yaml, &schema, &instance);
        assert_eq!(mapped.len(), 1);
        assert!(mapped[0].line > 0);
        assert!(mapped[0].column > 0);
        assert_eq!(mapped[0].reason, "maximum 2 items required, but found 4 items");
    }

    #[test]
    fn s2_type_violations_humanized() {
        let schema = json!({
            "type": "object",
            "properties": {
                "patties": {"type": "integer"},
                "vegetarian": {"type": "boolean"}
            }
        });
        let rendered_yaml = serde_yaml::to_string(&schema).unwrap();
        let compiled = compile(&schema, &EvalOptions::default()).unwrap();
        let instance = json!({"patties": false, "vegetarian": 2});
        let violations = evaluate(&compiled, &instance);

        let (mapped, _hint) = map_violations(&violations, &rendered_yaml, &schema, &instance);
        assert!(mapped.iter().any(|v| v.reason == "expected integer"));
        assert!(mapped.iter().any(|v| v.reason == "expected boolean"));
    }

    #[test]
    fn pointer_to_field_path_handles_array_index() {
        assert_eq!(pointer_to_field_path("/items/2/patties"), "items[2].patties");
    }

    #[test]
    fn locate_keyword_finds_nested_key() {
        let yaml = "type: object\nproperties:\n  patties:\n    type: integer\n";
        let (line, _col) = locate_keyword(yaml, "/properties/patties/type");
        assert_eq!(line, 4);
    }

    #[test]
    fn locate_keyword_returns_zero_for_missing_path() {
        let yaml = "type: string\n";
        assert_eq!(locate_keyword(yaml, "/properties/missing/type"), (0, 0));
    }

    #[test]
    fn reference_object_extracts_array_element() {
        let root = json!([{"a": 1}, {"a": 2}]);
        let obj = reference_object(&root, "/1/a").unwrap();
        assert_eq!(obj, json!({"a": 2}));
    }
}
