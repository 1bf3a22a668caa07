//! The policy resolver: turns an inbound request's identity into an
//! `(identifier, PlanLimit)` pair the bucket store can act on.

use crate::config::{LimiterConfig, PlanLimit};

/// The identity signals the resolver needs from an inbound request.
/// Framework-agnostic so both the axum middleware and plain unit tests
/// can construct one without pulling in `http`.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity<'a> {
    /// The literal value of the configured API key header, if present.
    pub api_key: Option<&'a str>,
    /// The connecting peer's address, e.g. from `SocketAddr` or a
    /// trusted `X-Forwarded-For`. Used only when `api_key` is absent.
    pub client_addr: Option<&'a str>,
    /// The caller's plan name, typically resolved upstream from the API
    /// key or account lookup rather than supplied by the request itself.
    pub plan: Option<&'a str>,
}

/// `Request -> (identifier, PlanLimit)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPolicy {
    pub identifier: String,
    pub limit: PlanLimit,
}

/// Resolves identity and plan limits. Holds no request state of its
/// own; every call is independent given a `RequestIdentity`.
pub struct PolicyResolver<'c> {
    config: &'c LimiterConfig,
}

impl<'c> PolicyResolver<'c> {
    pub fn new(config: &'c LimiterConfig) -> Self {
        Self { config }
    }

    /// Resolve an identifier and plan limit for one request.
    ///
    /// Identifier precedence: the API key header's literal value wins
    /// over the client address. When falling back to the client
    /// address, an IPv4-mapped-IPv6 `::ffff:` prefix is stripped and
    /// the result is lowercased so `::ffff:10.0.0.1` and `10.0.0.1`
    /// collide with a plain IPv4 connection from the same peer.
    pub fn resolve(&self, identity: &RequestIdentity<'_>) -> Option<ResolvedPolicy> {
        let identifier = identity
            .api_key
            .map(|key| key.to_string())
            .or_else(|| identity.client_addr.map(normalize_client_addr))?;

        if identifier.is_empty() {
            return None;
        }

        let limit = self.config.resolve_plan(identity.plan);
        Some(ResolvedPolicy { identifier, limit })
    }
}

/// Strip an IPv4-mapped-IPv6 prefix and lowercase, so the same peer is
/// recognized under either address family.
fn normalize_client_addr(addr: &str) -> String {
    let stripped = addr
        .strip_prefix("::ffff:")
        .or_else(|| addr.strip_prefix("::FFFF:"))
        .unwrap_or(addr);
    stripped.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(config: &LimiterConfig) -> PolicyResolver<'_> {
        PolicyResolver::new(config)
    }

    #[test]
    fn api_key_wins_over_client_addr() {
        let config = LimiterConfig::default();
        let identity = RequestIdentity {
            api_key: Some("key-123"),
            client_addr: Some("10.0.0.5"),
            plan: Some("pro"),
        };
        let resolved = resolver(&config).resolve(&identity).unwrap();
        assert_eq!(resolved.identifier, "key-123");
        assert_eq!(resolved.limit.capacity, 30.0);
    }

    #[test]
    fn falls_back_to_client_addr_when_no_api_key() {
        let config = LimiterConfig::default();
        let identity = RequestIdentity {
            api_key: None,
            client_addr: Some("203.0.113.7"),
            plan: None,
        };
        let resolved = resolver(&config).resolve(&identity).unwrap();
        assert_eq!(resolved.identifier, "203.0.113.7");
        // No plan given: falls back to the default plan (free).
        assert_eq!(resolved.limit.capacity, 10.0);
    }

    #[test]
    fn ipv4_mapped_ipv6_collides_with_plain_ipv4() {
        let config = LimiterConfig::default();
        let mapped = RequestIdentity {
            api_key: None,
            client_addr: Some("::ffff:10.0.0.1"),
            plan: None,
        };
        let plain = RequestIdentity {
            api_key: None,
            client_addr: Some("10.0.0.1"),
            plan: None,
        };
        let r = resolver(&config);
        assert_eq!(
            r.resolve(&mapped).unwrap().identifier,
            r.resolve(&plain).unwrap().identifier
        );
    }

    #[test]
    fn no_identity_at_all_resolves_to_none() {
        let config = LimiterConfig::default();
        let identity = RequestIdentity::default();
        assert!(resolver(&config).resolve(&identity).is_none());
    }

    #[test]
    fn unknown_plan_falls_back_to_default() {
        let config = LimiterConfig::default();
        let identity = RequestIdentity {
            api_key: Some("k"),
            client_addr: None,
            plan: Some("nonexistent-plan"),
        };
        let resolved = resolver(&config).resolve(&identity).unwrap();
        assert_eq!(resolved.limit.capacity, 10.0);
    }
}
