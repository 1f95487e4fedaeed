//! In-process rule evaluation from configured gate conditions.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{ActorContext, AuthorizationService, RuleRef};
use crate::error::{DomainError, DomainResult};

/// Role granted to every authenticated actor.
pub const ROLE_LOGGED_IN: &str = "loggedin";
/// Role granted to every actor.
pub const ROLE_GUEST: &str = "guest";

/// How the gates of a rule combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequireMode {
    /// One matching gate grants the rule.
    #[default]
    Any,
    /// Every configured gate must match.
    All,
}

/// An address matcher: a single address, an inclusive `start-end` range,
/// or a dotted prefix such as `10.1.` (a bare `10.1` is read the same way).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IpRange {
    Single(IpAddr),
    Range(IpAddr, IpAddr),
    Prefix(String),
}

impl IpRange {
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match self {
            IpRange::Single(addr) => addr == ip,
            IpRange::Range(start, end) => {
                // Mixed address families never match.
                start.is_ipv4() == ip.is_ipv4() && start <= ip && ip <= end
            }
            IpRange::Prefix(prefix) => ip.is_ipv4() && ip.to_string().starts_with(prefix.as_str()),
        }
    }
}

impl FromStr for IpRange {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DomainError::InvalidConfiguration {
            message: format!("invalid ip_range entry: '{s}'"),
        };

        if let Ok(addr) = s.parse::<IpAddr>() {
            return Ok(IpRange::Single(addr));
        }

        if let Some((start, end)) = s.split_once('-') {
            let start: IpAddr = start.trim().parse().map_err(|_| invalid())?;
            let end: IpAddr = end.trim().parse().map_err(|_| invalid())?;
            if start.is_ipv4() != end.is_ipv4() || start > end {
                return Err(invalid());
            }
            return Ok(IpRange::Range(start, end));
        }

        let is_partial_v4 = !s.is_empty()
            && s.split('.').filter(|part| !part.is_empty()).count() < 4
            && s.split('.')
                .filter(|part| !part.is_empty())
                .all(|part| part.parse::<u8>().is_ok());
        if is_partial_v4 {
            let prefix = if s.ends_with('.') {
                s.to_string()
            } else {
                format!("{s}.")
            };
            return Ok(IpRange::Prefix(prefix));
        }

        Err(invalid())
    }
}

impl TryFrom<String> for IpRange {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpRange::Single(addr) => write!(f, "{addr}"),
            IpRange::Range(start, end) => write!(f, "{start}-{end}"),
            IpRange::Prefix(prefix) => f.write_str(prefix),
        }
    }
}

impl From<IpRange> for String {
    fn from(range: IpRange) -> Self {
        range.to_string()
    }
}

/// Gate conditions of one named rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    #[serde(default)]
    pub role: Vec<String>,
    #[serde(default)]
    pub username: Vec<String>,
    #[serde(default)]
    pub ip_range: Vec<IpRange>,
    #[serde(default)]
    pub require: RequireMode,
}

impl PermissionRule {
    /// Evaluates the configured gates against an actor.
    ///
    /// A rule without any gate grants nothing.
    pub fn grants(&self, actor: &ActorContext) -> bool {
        let mut gates = Vec::with_capacity(3);

        if !self.role.is_empty() {
            gates.push(self.role.iter().any(|role| match role.as_str() {
                ROLE_GUEST => true,
                ROLE_LOGGED_IN => actor.is_authenticated(),
                other => actor.has_role(other),
            }));
        }
        if !self.username.is_empty() {
            gates.push(
                actor
                    .username
                    .as_deref()
                    .is_some_and(|name| self.username.iter().any(|u| u == name)),
            );
        }
        if !self.ip_range.is_empty() {
            gates.push(
                actor
                    .ip
                    .is_some_and(|ip| self.ip_range.iter().any(|range| range.contains(&ip))),
            );
        }

        if gates.is_empty() {
            return false;
        }
        match self.require {
            RequireMode::Any => gates.iter().any(|g| *g),
            RequireMode::All => gates.iter().all(|g| *g),
        }
    }
}

/// [`AuthorizationService`] backed by statically configured rules.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedAuthorizer {
    rules: BTreeMap<RuleRef, PermissionRule>,
}

impl RuleBasedAuthorizer {
    pub fn new(rules: BTreeMap<RuleRef, PermissionRule>) -> Self {
        Self { rules }
    }

    pub fn with_rule(mut self, name: impl Into<RuleRef>, rule: PermissionRule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    pub fn contains(&self, rule: &RuleRef) -> bool {
        self.rules.contains_key(rule)
    }
}

#[async_trait]
impl AuthorizationService for RuleBasedAuthorizer {
    async fn is_granted(&self, rule: &RuleRef, actor: &ActorContext) -> DomainResult<bool> {
        let definition = self.rules.get(rule).ok_or_else(|| DomainError::UnknownRule {
            rule: rule.to_string(),
        })?;
        let granted = definition.grants(actor);
        trace!(rule = %rule, granted, "evaluated permission rule");
        Ok(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    // ============================================================
    // Section 1: Address matching
    // ============================================================

    #[test]
    fn test_ip_range_parsing() {
        assert_eq!("10.0.0.1".parse::<IpRange>().unwrap(), IpRange::Single(ip("10.0.0.1")));
        assert_eq!(
            "10.0.0.1 - 10.0.0.50".parse::<IpRange>().unwrap(),
            IpRange::Range(ip("10.0.0.1"), ip("10.0.0.50"))
        );
        assert_eq!("10.1".parse::<IpRange>().unwrap(), IpRange::Prefix("10.1.".to_string()));
        assert_eq!("10.1.".parse::<IpRange>().unwrap(), IpRange::Prefix("10.1.".to_string()));

        assert!("10.0.0.50-10.0.0.1".parse::<IpRange>().is_err());
        assert!("library".parse::<IpRange>().is_err());
        assert!("".parse::<IpRange>().is_err());
    }

    #[test]
    fn test_ip_range_contains() {
        let range: IpRange = "192.168.1.10-192.168.1.20".parse().unwrap();
        assert!(range.contains(&ip("192.168.1.10")));
        assert!(range.contains(&ip("192.168.1.20")));
        assert!(!range.contains(&ip("192.168.1.21")));
        assert!(!range.contains(&ip("::1")));

        let prefix: IpRange = "10.1".parse().unwrap();
        assert!(prefix.contains(&ip("10.1.200.3")));
        assert!(!prefix.contains(&ip("10.10.0.1")));
    }

    // ============================================================
    // Section 2: Gate evaluation
    // ============================================================

    #[test]
    fn test_role_gate() {
        let rule = PermissionRule {
            role: vec!["staff".to_string()],
            ..Default::default()
        };

        assert!(rule.grants(&ActorContext::anonymous().with_role("staff")));
        assert!(!rule.grants(&ActorContext::anonymous().with_role("patron")));
    }

    #[test]
    fn test_builtin_roles() {
        let logged_in = PermissionRule {
            role: vec![ROLE_LOGGED_IN.to_string()],
            ..Default::default()
        };
        let guest = PermissionRule {
            role: vec![ROLE_GUEST.to_string()],
            ..Default::default()
        };

        assert!(!logged_in.grants(&ActorContext::anonymous()));
        assert!(logged_in.grants(&ActorContext::anonymous().with_username("alice")));
        assert!(guest.grants(&ActorContext::anonymous()));
    }

    #[test]
    fn test_require_any_and_all() {
        let mut rule = PermissionRule {
            username: vec!["alice".to_string()],
            ip_range: vec!["10.0.0.0-10.0.0.255".parse().unwrap()],
            ..Default::default()
        };
        let alice_outside = ActorContext::anonymous()
            .with_username("alice")
            .with_ip(ip("8.8.8.8"));
        let alice_inside = alice_outside.clone().with_ip(ip("10.0.0.7"));

        assert!(rule.grants(&alice_outside));

        rule.require = RequireMode::All;
        assert!(!rule.grants(&alice_outside));
        assert!(rule.grants(&alice_inside));
    }

    #[test]
    fn test_rule_without_gates_grants_nothing() {
        let actor = ActorContext::anonymous().with_username("alice").with_role("staff");
        assert!(!PermissionRule::default().grants(&actor));
    }

    #[tokio::test]
    async fn test_unknown_rule_is_an_error() {
        let authorizer = RuleBasedAuthorizer::default();
        let result = authorizer
            .is_granted(&RuleRef::new("missing"), &ActorContext::anonymous())
            .await;

        assert!(matches!(result, Err(DomainError::UnknownRule { .. })));
    }

    #[test]
    fn test_rule_deserializes() {
        let json = r#"{"role": ["staff"], "ip_range": ["10.1"], "require": "all"}"#;
        let rule: PermissionRule = serde_json::from_str(json).unwrap();

        assert_eq!(rule.require, RequireMode::All);
        assert_eq!(rule.ip_range, vec![IpRange::Prefix("10.1.".to_string())]);
    }
}
