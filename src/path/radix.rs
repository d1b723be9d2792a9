//! Radix tree path matcher.
//!
//! Adapted from this codebase's own `router::radix::RadixRouter`: each node
//! holds a literal-segment -> child map, at most one parameter child, and an
//! optional leaf. Lookup tries the literal child first and only falls back
//! to the parameter child if the literal branch dead-ends, so literal
//! matches take strict precedence over parameter matches at every depth
//! (spec invariant 3 / scenario S6).

use super::{split_segments, Matched, OperationSet, PathMatcher, PathParams};
use std::borrow::Cow;
use std::sync::Arc;

struct Leaf {
    template: String,
    operations: OperationSet,
}

struct RadixNode {
    segment: Cow<'static, str>,
    leaf: Option<Leaf>,
    param_name: Option<Arc<str>>,
    children: Vec<RadixNode>,
    /// At most one parameter child per node (section 3 invariant); modeled
    /// as `Option` rather than a `Vec` to make the invariant unrepresentable
    /// rather than merely documented.
    param_child: Option<Box<RadixNode>>,
}

impl RadixNode {
    fn new(segment: Cow<'static, str>) -> Self {
        RadixNode {
            segment,
            leaf: None,
            param_name: None,
            children: Vec::new(),
            param_child: None,
        }
    }

    fn new_param(name: Arc<str>) -> Self {
        RadixNode {
            segment: Cow::Borrowed(""),
            leaf: None,
            param_name: Some(name),
            children: Vec::new(),
            param_child: None,
        }
    }

    fn insert(&mut self, segments: &[&str], template: &str, operations: OperationSet) {
        if segments.is_empty() {
            self.leaf = Some(Leaf {
                template: template.to_string(),
                operations,
            });
            return;
        }

        let segment = segments[0];
        let remaining = &segments[1..];

        if segment.starts_with('{') && segment.ends_with('}') {
            let name: Arc<str> = Arc::from(segment[1..segment.len() - 1].to_string());
            let child = self
                .param_child
                .get_or_insert_with(|| Box::new(RadixNode::new_param(name)));
            child.insert(remaining, template, operations);
            return;
        }

        if let Some(child) = self.children.iter_mut().find(|c| c.segment == segment) {
            child.insert(remaining, template, operations);
            return;
        }

        let mut child = RadixNode::new(Cow::Owned(segment.to_string()));
        child.insert(remaining, template, operations);
        self.children.push(child);
    }

    fn search<'a>(
        &'a self,
        segments: &[&str],
        params: &mut PathParams,
    ) -> Option<&'a Leaf> {
        if segments.is_empty() {
            return self.leaf.as_ref();
        }

        let segment = segments[0];
        let remaining = &segments[1..];

        for child in &self.children {
            if child.segment == segment {
                if let Some(leaf) = child.search(remaining, params) {
                    return Some(leaf);
                }
            }
        }

        if let Some(param_child) = &self.param_child {
            if let Some(name) = &param_child.param_name {
                params.push((Arc::clone(name), segment.to_string()));
                if let Some(leaf) = param_child.search(remaining, params) {
                    return Some(leaf);
                }
                params.pop();
            }
        }

        None
    }

    fn walk(&self, visit: &mut dyn FnMut(&str, &OperationSet) -> bool) -> bool {
        if let Some(leaf) = &self.leaf {
            if !visit(&leaf.template, &leaf.operations) {
                return false;
            }
        }
        for child in &self.children {
            if !child.walk(visit) {
                return false;
            }
        }
        if let Some(param_child) = &self.param_child {
            if !param_child.walk(visit) {
                return false;
            }
        }
        true
    }
}

/// Radix-tree-backed [`PathMatcher`]. Built once at validator construction
/// and read-only thereafter (section 5: shared resources).
pub struct RadixPathMatcher {
    root: RadixNode,
}

impl RadixPathMatcher {
    pub fn new(operations: &[crate::document::Operation]) -> Self {
        let mut root = RadixNode::new(Cow::Borrowed(""));
        for (template, operation_set) in super::group_by_template(operations) {
            let segments = split_segments(&template);
            root.insert(&segments, &template, operation_set);
        }
        RadixPathMatcher { root }
    }
}

impl PathMatcher for RadixPathMatcher {
    fn lookup(&self, url_path: &str) -> Option<Matched<'_>> {
        let segments = split_segments(url_path);
        let mut scratch = PathParams::new();
        let leaf = self.root.search(&segments, &mut scratch)?;
        Some(Matched {
            template: &leaf.template,
            operations: &leaf.operations,
        })
    }

    fn lookup_with_params(&self, url_path: &str) -> Option<(Matched<'_>, Option<PathParams>)> {
        let segments = split_segments(url_path);
        let mut params = PathParams::new();
        let leaf = self.root.search(&segments, &mut params)?;
        let matched = Matched {
            template: &leaf.template,
            operations: &leaf.operations,
        };
        let params = if params.is_empty() { None } else { Some(params) };
        Some((matched, params))
    }

    fn walk(&self, visit: &mut dyn FnMut(&str, &OperationSet) -> bool) {
        self.root.walk(visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Operation;
    use http::Method;
    use std::collections::HashMap;

    fn op(method: Method, path: &str) -> Operation {
        Operation {
            method,
            path_pattern: path.to_string(),
            parameters: Vec::new(),
            request_schema: None,
            request_body_required: false,
            request_content: HashMap::new(),
            responses: HashMap::new(),
            response_ranges: HashMap::new(),
            default_response: None,
            security: Vec::new(),
        }
    }

    #[test]
    fn inserted_templates_are_always_findable() {
        let ops = vec![op(Method::GET, "/a/b"), op(Method::GET, "/a/{x}")];
        let matcher = RadixPathMatcher::new(&ops);
        assert_eq!(matcher.lookup("/a/b").unwrap().template, "/a/b");
        assert_eq!(matcher.lookup("/a/z").unwrap().template, "/a/{x}");
    }

    #[test]
    fn lookup_is_deterministic() {
        let ops = vec![op(Method::GET, "/users/{id}")];
        let matcher = RadixPathMatcher::new(&ops);
        let first = matcher.lookup("/users/7").unwrap().template.to_string();
        let second = matcher.lookup("/users/7").unwrap().template.to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn literal_over_parameter_precedence() {
        let ops = vec![op(Method::GET, "/a/b"), op(Method::GET, "/a/{x}")];
        let matcher = RadixPathMatcher::new(&ops);
        assert_eq!(matcher.lookup("/a/b").unwrap().template, "/a/b");
        let (matched, params) = matcher.lookup_with_params("/a/z").unwrap();
        assert_eq!(matched.template, "/a/{x}");
        let params = params.unwrap();
        assert_eq!(params[0].0.as_ref(), "x");
        assert_eq!(params[0].1, "z");
    }

    #[test]
    fn s6_literal_over_parameter_scenario() {
        let ops = vec![
            op(Method::GET, "/users/admin"),
            op(Method::GET, "/users/{id}"),
        ];
        let matcher = RadixPathMatcher::new(&ops);

        let (admin_match, admin_params) = matcher.lookup_with_params("/users/admin").unwrap();
        assert_eq!(admin_match.template, "/users/admin");
        assert!(admin_params.is_none());

        let (id_match, id_params) = matcher.lookup_with_params("/users/123").unwrap();
        assert_eq!(id_match.template, "/users/{id}");
        let id_params = id_params.unwrap();
        assert_eq!(id_params[0].0.as_ref(), "id");
        assert_eq!(id_params[0].1, "123");
    }

    #[test]
    fn empty_path_matches_root_leaf() {
        let ops = vec![op(Method::GET, "/")];
        let matcher = RadixPathMatcher::new(&ops);
        assert!(matcher.lookup("/").is_some());
    }

    #[test]
    fn unmatched_path_returns_none() {
        let ops = vec![op(Method::GET, "/users/{id}")];
        let matcher = RadixPathMatcher::new(&ops);
        assert!(matcher.lookup("/not-a-path").is_none());
    }

    #[test]
    fn walk_visits_every_template_and_can_short_circuit() {
        let ops = vec![
            op(Method::GET, "/a"),
            op(Method::GET, "/b"),
            op(Method::GET, "/c"),
        ];
        let matcher = RadixPathMatcher::new(&ops);

        let mut all = Vec::new();
        matcher.walk(&mut |template, _| {
            all.push(template.to_string());
            true
        });
        assert_eq!(all.len(), 3);

        let mut stopped_after_one = Vec::new();
        matcher.walk(&mut |template, _| {
            stopped_after_one.push(template.to_string());
            false
        });
        assert_eq!(stopped_after_one.len(), 1);
    }

    #[test]
    fn duplicate_insert_overwrites_leaf_without_growing_tree() {
        let ops = vec![op(Method::GET, "/a"), op(Method::POST, "/a")];
        let matcher = RadixPathMatcher::new(&ops);
        let matched = matcher.lookup("/a").unwrap();
        assert_eq!(matched.operations.len(), 2);
    }
}
