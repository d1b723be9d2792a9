//! Security validation (C3 collaborator, spec section 4 "Security
//! requirements"). Keeps this codebase's own provider seam — a
//! [`SecurityProvider`] trait invoked per scheme with a borrowed
//! [`SecurityRequest`] — generalized from the reference router's
//! `HeaderVec`/`ParamVec` request binding to this crate's document model
//! ([`crate::document::SecurityScheme`]/[`crate::document::SecurityRequirement`]).
//!
//! Concrete providers (bearer JWT, JWKS, OAuth2, remote API key, SPIFFE) are
//! out of scope here: they need `jsonwebtoken`/`reqwest`/a JWKS fetcher,
//! external collaborators this crate does not depend on. An embedder
//! registers its own [`SecurityProvider`] implementations per scheme name.

use crate::document::{SecurityRequirement, SecurityScheme};
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum header/query/cookie pairs kept stack-allocated on a security
/// request before spilling to the heap, mirroring [`crate::path::MAX_INLINE_PARAMS`].
pub const MAX_INLINE_CREDENTIALS: usize = 8;

pub type CredentialVec = SmallVec<[(String, String); MAX_INLINE_CREDENTIALS]>;

/// Request context for security validation: extracted credentials from
/// headers, query parameters, and cookies. Borrowed rather than owned so
/// validating several alternative security requirements for one request
/// never copies its credential data.
pub struct SecurityRequest<'a> {
    pub headers: &'a CredentialVec,
    pub query: &'a CredentialVec,
    pub cookies: &'a CredentialVec,
}

impl<'a> SecurityRequest<'a> {
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Custom authentication/authorization logic for one named security scheme.
pub trait SecurityProvider: Send + Sync {
    /// Validate a request against a security scheme. `scopes` are the
    /// requirement's declared scopes (OAuth2/OpenID Connect; empty for
    /// apiKey/http schemes).
    fn validate(&self, scheme: &SecurityScheme, scopes: &[String], req: &SecurityRequest) -> bool;

    /// Extract claims from an already-validated request (e.g. decoded JWT
    /// claims for a BFF forwarding user context downstream). `None` by
    /// default; providers that carry claims should override.
    fn extract_claims(&self, scheme: &SecurityScheme, req: &SecurityRequest) -> Option<Value> {
        let _ = (scheme, req);
        None
    }
}

/// `SecurityRequirement`'s wire shape is always a JSON object mapping scheme
/// name -> declared scopes, regardless of how `oas3` wraps it internally;
/// round-tripping through `serde_json` avoids depending on that internal
/// representation.
fn requirement_schemes(requirement: &SecurityRequirement) -> Vec<(String, Vec<String>)> {
    let Ok(Value::Object(map)) = serde_json::to_value(requirement) else {
        return Vec::new();
    };
    map.into_iter()
        .map(|(name, scopes)| {
            let scopes = scopes
                .as_array()
                .map(|a| a.iter().filter_map(|s| s.as_str().map(String::from)).collect())
                .unwrap_or_default();
            (name, scopes)
        })
        .collect()
}

/// Evaluate an operation's security requirements (spec section 4: a
/// requirement list is OR'd — any single requirement satisfying all of its
/// schemes authorizes the request; an empty list means no security is
/// required).
///
/// `lookup` resolves a scheme name to its declared [`SecurityScheme`] plus
/// the registered [`SecurityProvider`] for it; a scheme with no registered
/// provider is treated as unsatisfiable rather than silently passing.
pub fn validate_security<'a>(
    requirements: &[SecurityRequirement],
    req: &SecurityRequest,
    lookup: impl Fn(&str) -> Option<(&'a SecurityScheme, &'a dyn SecurityProvider)>,
) -> bool {
    if requirements.is_empty() {
        return true;
    }
    requirements.iter().any(|requirement| {
        requirement_schemes(requirement).iter().all(|(scheme_name, scopes)| match lookup(scheme_name) {
            Some((scheme, provider)) => provider.validate(scheme, scopes, req),
            None => false,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oas3::spec::SecurityScheme as Oas3Scheme;
    use serde_json::json;

    struct AlwaysTrue;
    impl SecurityProvider for AlwaysTrue {
        fn validate(&self, _scheme: &SecurityScheme, _scopes: &[String], _req: &SecurityRequest) -> bool {
            true
        }
    }

    struct AlwaysFalse;
    impl SecurityProvider for AlwaysFalse {
        fn validate(&self, _scheme: &SecurityScheme, _scopes: &[String], _req: &SecurityRequest) -> bool {
            false
        }
    }

    fn api_key_scheme() -> SecurityScheme {
        Oas3Scheme::ApiKey {
            name: "x-api-key".to_string(),
            location: "header".to_string(),
            description: None,
        }
    }

    fn requirement(names: &[&str]) -> SecurityRequirement {
        let obj: serde_json::Map<String, Value> = names.iter().map(|n| (n.to_string(), json!([]))).collect();
        serde_json::from_value(Value::Object(obj)).expect("security requirement deserializes from a scheme-name map")
    }

    fn empty_request() -> (CredentialVec, CredentialVec, CredentialVec) {
        (CredentialVec::new(), CredentialVec::new(), CredentialVec::new())
    }

    #[test]
    fn empty_requirements_always_pass() {
        let (h, q, c) = empty_request();
        let req = SecurityRequest { headers: &h, query: &q, cookies: &c };
        assert!(validate_security(&[], &req, |_| None));
    }

    #[test]
    fn single_satisfied_requirement_passes() {
        let (h, q, c) = empty_request();
        let req = SecurityRequest { headers: &h, query: &q, cookies: &c };
        let scheme = api_key_scheme();
        let provider: &dyn SecurityProvider = &AlwaysTrue;
        let requirements = vec![requirement(&["apiKeyAuth"])];
        assert!(validate_security(&requirements, &req, |name| {
            (name == "apiKeyAuth").then_some((&scheme, provider))
        }));
    }

    #[test]
    fn unregistered_scheme_fails_closed() {
        let (h, q, c) = empty_request();
        let req = SecurityRequest { headers: &h, query: &q, cookies: &c };
        let requirements = vec![requirement(&["unknownAuth"])];
        assert!(!validate_security(&requirements, &req, |_| None));
    }

    #[test]
    fn alternative_requirement_list_is_ored() {
        let (h, q, c) = empty_request();
        let req = SecurityRequest { headers: &h, query: &q, cookies: &c };
        let scheme = api_key_scheme();
        let fails: &dyn SecurityProvider = &AlwaysFalse;
        let passes: &dyn SecurityProvider = &AlwaysTrue;
        let requirements = vec![requirement(&["a"]), requirement(&["b"])];

        assert!(validate_security(&requirements, &req, |name| match name {
            "a" => Some((&scheme, fails)),
            "b" => Some((&scheme, passes)),
            _ => None,
        }));
    }

    #[test]
    fn get_header_is_case_insensitive() {
        let mut h = CredentialVec::new();
        h.push(("X-Api-Key".to_string(), "secret".to_string()));
        let q = CredentialVec::new();
        let c = CredentialVec::new();
        let req = SecurityRequest { headers: &h, query: &q, cookies: &c };
        assert_eq!(req.get_header("x-api-key"), Some("secret"));
    }
}
