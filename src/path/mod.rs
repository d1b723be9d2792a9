//! Path matcher (C2): maps `(method, urlPath)` to `(pathTemplate, operation)`.
//!
//! Two implementations share the [`PathMatcher`] trait: [`radix::RadixPathMatcher`]
//! (the default, O(k) in path segment count) and [`regex_fallback::RegexPathMatcher`]
//! (used when no pre-built tree is supplied). Both are adapted from this
//! codebase's own `router::radix`/`router::core::path_to_regex`, generalized
//! from "route to a named handler" to "route to an operation set" since this
//! crate validates rather than dispatches.

mod radix;
mod regex_fallback;

pub use radix::RadixPathMatcher;
pub use regex_fallback::RegexPathMatcher;

use crate::document::Operation;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum path/query parameters kept stack-allocated before spilling to the heap.
/// Most REST APIs have <=4 path params (e.g. `/orgs/{org}/repos/{repo}`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter name -> raw segment value, extracted during a lookup.
/// `Arc<str>` for names (known at tree-build time, cheap to clone) paired
/// with owned `String` values (per-request data sliced from the URL).
pub type PathParams = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// All operations declared for one path template, keyed by method.
pub type OperationSet = HashMap<Method, Arc<Operation>>;

/// Result of a successful lookup: which template matched and its operation table.
pub struct Matched<'a> {
    pub template: &'a str,
    pub operations: &'a OperationSet,
}

/// Pluggable path-matching seam (section 9: five extension seams, one of which
/// is the path matcher itself).
pub trait PathMatcher: Send + Sync {
    /// Map a URL path to its operation set, without extracting parameters.
    fn lookup(&self, url_path: &str) -> Option<Matched<'_>>;

    /// Map a URL path to its operation set and the path parameters bound
    /// along the way. Returns `None` parameters when the matched template
    /// has none.
    fn lookup_with_params(&self, url_path: &str) -> Option<(Matched<'_>, Option<PathParams>)>;

    /// Visit every registered template in the tree; stop when `visit` returns `false`.
    fn walk(&self, visit: &mut dyn FnMut(&str, &OperationSet) -> bool);
}

/// Split a URL path into non-empty segments, trimming leading/trailing
/// slashes and collapsing adjacent slashes (section 4.2 lookup algorithm).
pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Build a `path_pattern -> OperationSet` table from a flat operation list,
/// grouping operations that share the same path template by method.
pub(crate) fn group_by_template(operations: &[Operation]) -> Vec<(String, OperationSet)> {
    let mut grouped: Vec<(String, OperationSet)> = Vec::new();
    for op in operations {
        if let Some((_, set)) = grouped.iter_mut().find(|(t, _)| t == &op.path_pattern) {
            set.insert(op.method.clone(), Arc::new(op.clone()));
        } else {
            let mut set = OperationSet::new();
            set.insert(op.method.clone(), Arc::new(op.clone()));
            grouped.push((op.path_pattern.clone(), set));
        }
    }
    grouped
}
