//! # Decision Engine
//!
//! The single authorization decision point.
//!
//! ```text
//! super_admin?            → allow (nothing else is looked at)
//! scope grant    = scope role    ? rbac[scope resource][role]       : ∅
//! instance grant = instance role ? acl[instance resource][role]     : ∅
//! scope only     → key ∈ scope grant
//! instance only  → key ∈ instance grant
//! both           → mode == all ? (∈ scope ∧ ∈ instance) : (∈ scope ∨ ∈ instance)
//! granted?       → every condition required by the key must pass
//! ```
//!
//! Evaluation is pure: no I/O, no shared mutable state. Absent roles and keys
//! found in no grant set deny; nothing here returns an error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::conditions::{ConditionTag, Conditions};
use crate::context::{EvaluationContext, InstanceContext, ScopeContext, Subject};
use crate::permissions::PermissionKey;
use crate::policy::Policy;

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "condition", rename_all = "snake_case")]
pub enum DecisionReason {
    /// Super admin bypass.
    SuperAdmin,
    /// Granted by the scope role.
    ScopeGrant,
    /// Granted by the instance role.
    InstanceGrant,
    /// Granted by both roles.
    BothGrants,
    /// No role grants the key (or `all` mode lacked one side).
    NotGranted,
    /// Granted by role but a required condition failed.
    ConditionFailed(ConditionTag),
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Key that was checked.
    pub key: PermissionKey,
    /// Whether the action is allowed.
    pub allowed: bool,
    /// Explanation for audit logs.
    pub reason: DecisionReason,
}

impl Decision {
    /// Check if the action is allowed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

fn scope_granted(policy: &Policy, key: &PermissionKey, scope: &ScopeContext) -> bool {
    scope
        .role
        .and_then(|role| policy.scope_grants(scope.resource, role))
        .is_some_and(|set| set.has(key))
}

fn instance_granted(policy: &Policy, key: &PermissionKey, instance: &InstanceContext) -> bool {
    instance
        .role
        .and_then(|role| policy.instance_grants(instance.resource, role))
        .is_some_and(|set| set.has(key))
}

fn grant_decision(policy: &Policy, key: &PermissionKey, ctx: &EvaluationContext) -> Decision {
    let (allowed, reason) = if ctx.is_super_admin() {
        (true, DecisionReason::SuperAdmin)
    } else {
        match &ctx.subject {
            Subject::Scope(scope) => {
                let has_scope = scope_granted(policy, key, scope);
                let reason = if has_scope {
                    DecisionReason::ScopeGrant
                } else {
                    DecisionReason::NotGranted
                };
                (has_scope, reason)
            }
            Subject::Instance(instance) => {
                let has_instance = instance_granted(policy, key, instance);
                let reason = if has_instance {
                    DecisionReason::InstanceGrant
                } else {
                    DecisionReason::NotGranted
                };
                (has_instance, reason)
            }
            Subject::Both { scope, instance, mode } => {
                let has_scope = scope_granted(policy, key, scope);
                let has_instance = instance_granted(policy, key, instance);
                let allowed = mode.combine(has_scope, has_instance);
                let reason = match (allowed, has_scope, has_instance) {
                    (false, _, _) => DecisionReason::NotGranted,
                    (true, true, true) => DecisionReason::BothGrants,
                    (true, true, false) => DecisionReason::ScopeGrant,
                    (true, false, _) => DecisionReason::InstanceGrant,
                };
                (allowed, reason)
            }
        }
    };
    Decision {
        key: *key,
        allowed,
        reason,
    }
}

/// Evaluate a key against the grant tables alone, with an explanation.
pub fn evaluate(policy: &Policy, key: &PermissionKey, ctx: &EvaluationContext) -> Decision {
    let decision = grant_decision(policy, key, ctx);
    tracing::trace!(
        key = %key,
        allowed = decision.allowed,
        reason = ?decision.reason,
        "Evaluated permission"
    );
    decision
}

/// Decide whether the context grants the key.
///
/// # Example
///
/// ```
/// use hearth_rbac::actions::{InstanceAction, ScopeAction};
/// use hearth_rbac::engine::can;
/// use hearth_rbac::permissions::PermissionKey;
/// use hearth_rbac::resources::{InstanceResource, ScopeResource};
/// use hearth_rbac::{EvaluationContext, InstanceRole, Policy, ScopeRole};
///
/// let policy = Policy::builtin().unwrap();
///
/// let delete_project = PermissionKey::scope(ScopeResource::Project, ScopeAction::Delete);
/// let org_admin = EvaluationContext::scope(ScopeResource::Organization, Some(ScopeRole::Admin));
/// assert!(can(&policy, &delete_project, &org_admin));
///
/// let create_location =
///     PermissionKey::instance(InstanceResource::Location, InstanceAction::Create);
/// let owner = EvaluationContext::instance(InstanceResource::Location, Some(InstanceRole::Owner));
/// assert!(!can(&policy, &create_location, &owner));
/// ```
pub fn can(policy: &Policy, key: &PermissionKey, ctx: &EvaluationContext) -> bool {
    evaluate(policy, key, ctx).is_allowed()
}

/// A policy plus its condition phase, shareable across threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hearth_rbac::actions::ScopeAction;
/// use hearth_rbac::permissions::PermissionKey;
/// use hearth_rbac::resources::ScopeResource;
/// use hearth_rbac::{Authorizer, EvaluationContext, Policy, ScopeRole};
///
/// let authorizer = Authorizer::new(Arc::new(Policy::builtin().unwrap()));
/// let read = PermissionKey::scope(ScopeResource::Organization, ScopeAction::Read);
/// let member = EvaluationContext::scope(ScopeResource::Organization, Some(ScopeRole::Member));
/// assert!(authorizer.can(&read, &member));
/// ```
#[derive(Debug, Clone)]
pub struct Authorizer {
    policy: Arc<Policy>,
    conditions: Conditions,
}

impl Authorizer {
    /// Authorizer without conditions.
    pub fn new(policy: Arc<Policy>) -> Self {
        Self {
            policy,
            conditions: Conditions::new(),
        }
    }

    /// Attach a condition registry.
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// The grant tables.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The condition registry.
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// Evaluate grants, then conditions for granted keys.
    pub fn evaluate(&self, key: &PermissionKey, ctx: &EvaluationContext) -> Decision {
        let mut decision = grant_decision(&self.policy, key, ctx);
        if decision.allowed && decision.reason != DecisionReason::SuperAdmin {
            if let Err(tag) = self.conditions.check(key, ctx) {
                decision.allowed = false;
                decision.reason = DecisionReason::ConditionFailed(tag);
            }
        }
        tracing::trace!(
            key = %key,
            allowed = decision.allowed,
            reason = ?decision.reason,
            "Evaluated permission"
        );
        decision
    }

    /// Decide whether the context grants the key.
    pub fn can(&self, key: &PermissionKey, ctx: &EvaluationContext) -> bool {
        self.evaluate(key, ctx).is_allowed()
    }
}
