//! Facet value permissions.
//!
//! Restrictions are opt-in per field: [`PermissionConfig`] associates
//! individual values of a field with the rules that may reveal them, and
//! [`FacetPermissionEvaluator`] combines those rules for one actor.
//!
//! # Evaluation
//!
//! - No rules for a value: visible.
//! - Otherwise the rules are asked in configured order and the first grant
//!   wins; rules after it are never evaluated.
//! - Rule evaluation itself belongs to an [`AuthorizationService`]. The
//!   bundled [`RuleBasedAuthorizer`] evaluates role, username and address
//!   gates in process.

mod actor;
mod config;
mod rules;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::DomainResult;

pub use actor::ActorContext;
pub use config::{PermissionConfig, RuleRef, ValuePermission};
pub use rules::{IpRange, PermissionRule, RequireMode, RuleBasedAuthorizer, ROLE_GUEST, ROLE_LOGGED_IN};

/// Evaluates a single named rule for an actor.
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Returns whether `rule` grants access to `actor`.
    ///
    /// Errors mean the rule could not be evaluated (service unreachable,
    /// unknown rule), not that access is denied.
    async fn is_granted(&self, rule: &RuleRef, actor: &ActorContext) -> DomainResult<bool>;
}

/// What to do with a value whose rules could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationFailurePolicy {
    /// Hide the value.
    #[default]
    FailClosed,
    /// Show the value.
    FailOpen,
    /// Return the error to the caller.
    Propagate,
}

/// Memo of rule outcomes for one actor within one request.
///
/// The same rule usually guards several values; a scope makes sure each
/// rule reaches the authorization service at most once per pass.
#[derive(Debug, Default)]
pub struct EvaluationScope {
    outcomes: HashMap<RuleRef, bool>,
}

impl EvaluationScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct rules evaluated so far.
    pub fn evaluated(&self) -> usize {
        self.outcomes.len()
    }
}

/// Combines value rules with short-circuit OR semantics.
pub struct FacetPermissionEvaluator<A> {
    authorizer: Arc<A>,
}

impl<A> Clone for FacetPermissionEvaluator<A> {
    fn clone(&self) -> Self {
        Self {
            authorizer: Arc::clone(&self.authorizer),
        }
    }
}

impl<A> std::fmt::Debug for FacetPermissionEvaluator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetPermissionEvaluator").finish_non_exhaustive()
    }
}

impl<A> FacetPermissionEvaluator<A>
where
    A: AuthorizationService,
{
    pub fn new(authorizer: Arc<A>) -> Self {
        Self { authorizer }
    }

    /// Decides whether `value` may be shown to `actor`.
    ///
    /// Returns `true` for an empty rule list, otherwise `true` on the first
    /// granting rule and `false` if none grant.
    pub async fn is_permitted(
        &self,
        actor: &ActorContext,
        rules: &[RuleRef],
        value: &str,
    ) -> DomainResult<bool> {
        self.is_permitted_in(&mut EvaluationScope::new(), actor, rules, value)
            .await
    }

    /// Same as [`is_permitted`](Self::is_permitted), reusing rule outcomes
    /// already recorded in `scope`.
    pub async fn is_permitted_in(
        &self,
        scope: &mut EvaluationScope,
        actor: &ActorContext,
        rules: &[RuleRef],
        value: &str,
    ) -> DomainResult<bool> {
        if rules.is_empty() {
            return Ok(true);
        }

        for rule in rules {
            let granted = match scope.outcomes.get(rule) {
                Some(granted) => *granted,
                None => {
                    let granted = self.authorizer.is_granted(rule, actor).await?;
                    scope.outcomes.insert(rule.clone(), granted);
                    granted
                }
            };
            if granted {
                trace!(value, rule = %rule, "facet value permitted");
                return Ok(true);
            }
        }

        trace!(value, rules = rules.len(), "facet value not permitted");
        Ok(false)
    }
}
