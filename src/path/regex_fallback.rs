//! Regex-based path matcher fallback, used when no pre-built path tree is
//! supplied to the validator (section 4.2: "Fallback").
//!
//! Adapted from this codebase's own `router::core::Router::path_to_regex`:
//! each `{name}` segment becomes a capturing group, matched against the full
//! request path. An optional [`crate::cache::RegexCache`] avoids
//! recompiling the same template's pattern across validators.

use super::{group_by_template, Matched, OperationSet, PathMatcher, PathParams};
use crate::cache::RegexCache;
use regex::Regex;
use std::sync::Arc;

struct CompiledTemplate {
    template: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    operations: OperationSet,
}

/// Convert an OpenAPI path template into a regex pattern and its ordered
/// parameter names, e.g. `/users/{id}` -> (`^/users/([^/]+)$`, `["id"]`).
pub fn path_to_regex(path: &str) -> (String, Vec<Arc<str>>) {
    if path == "/" {
        return ("^/$".to_string(), Vec::new());
    }

    let mut pattern = String::with_capacity(path.len() + 5);
    pattern.push('^');
    let mut param_names = Vec::new();

    for segment in path.split('/') {
        if segment.starts_with('{') && segment.ends_with('}') {
            param_names.push(Arc::from(&segment[1..segment.len() - 1]));
            pattern.push_str("/([^/]+)");
        } else if !segment.is_empty() {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }
    pattern.push('$');
    (pattern, param_names)
}

pub struct RegexPathMatcher {
    templates: Vec<CompiledTemplate>,
}

impl RegexPathMatcher {
    pub fn new(operations: &[crate::document::Operation]) -> Self {
        Self::with_cache(operations, None)
    }

    pub fn with_cache(
        operations: &[crate::document::Operation],
        cache: Option<&dyn RegexCache>,
    ) -> Self {
        let mut templates = Vec::new();
        for (template, operation_set) in group_by_template(operations) {
            let (pattern, param_names) = path_to_regex(&template);
            let regex = if let Some(cache) = cache {
                if let Some(compiled) = cache.load(&pattern) {
                    (*compiled).clone()
                } else {
                    let compiled = Regex::new(&pattern).expect("path pattern regex must compile");
                    cache.store(pattern.clone(), Arc::new(compiled.clone()));
                    compiled
                }
            } else {
                Regex::new(&pattern).expect("path pattern regex must compile")
            };
            templates.push(CompiledTemplate {
                template,
                regex,
                param_names,
                operations: operation_set,
            });
        }
        RegexPathMatcher { templates }
    }

    fn find(&self, url_path: &str) -> Option<(&CompiledTemplate, Option<PathParams>)> {
        for tmpl in &self.templates {
            if let Some(captures) = tmpl.regex.captures(url_path) {
                let params: PathParams = tmpl
                    .param_names
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        captures
                            .get(i + 1)
                            .map(|m| (Arc::clone(name), m.as_str().to_string()))
                    })
                    .collect();
                let params = if params.is_empty() { None } else { Some(params) };
                return Some((tmpl, params));
            }
        }
        None
    }
}

impl PathMatcher for RegexPathMatcher {
    fn lookup(&self, url_path: &str) -> Option<Matched<'_>> {
        self.find(url_path).map(|(tmpl, _)| Matched {
            template: &tmpl.template,
            operations: &tmpl.operations,
        })
    }

    fn lookup_with_params(&self, url_path: &str) -> Option<(Matched<'_>, Option<PathParams>)> {
        self.find(url_path).map(|(tmpl, params)| {
            (
                Matched {
                    template: &tmpl.template,
                    operations: &tmpl.operations,
                },
                params,
            )
        })
    }

    fn walk(&self, visit: &mut dyn FnMut(&str, &OperationSet) -> bool) {
        for tmpl in &self.templates {
            if !visit(&tmpl.template, &tmpl.operations) {
                break;
            }
        }
    }
}
