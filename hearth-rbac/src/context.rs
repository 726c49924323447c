//! Evaluation context
//!
//! The caller-supplied facts for one authorization check: which scope role
//! and/or instance role the principal holds, whether they are a super admin,
//! and how two grants combine when both are present.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::resources::{InstanceResource, ScopeResource};
use crate::roles::{InstanceRole, ScopeRole};

/// How scope and instance grants combine when both are supplied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// Either grant suffices (OR).
    #[default]
    Any,
    /// Both grants are required (AND).
    All,
}

impl CombineMode {
    /// Parse mode from its canonical name, `any` or `all`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "any" => Some(Self::Any),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Combine two grant results.
    pub fn combine(&self, scope: bool, instance: bool) -> bool {
        match self {
            CombineMode::Any => scope || instance,
            CombineMode::All => scope && instance,
        }
    }
}

/// A scope resource and the role held on it, if any.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScopeContext {
    /// Scope resource the role is held on.
    pub resource: ScopeResource,
    /// Role held, `None` when the principal is not a member.
    pub role: Option<ScopeRole>,
}

/// An instance resource and the role held on it, if any.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct InstanceContext {
    /// Instance resource the role is held on.
    pub resource: InstanceResource,
    /// Role held, `None` when the principal has no grant.
    pub role: Option<InstanceRole>,
}

/// Which role facts are present.
///
/// A combination mode only exists when both facts are present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    /// Scope role only.
    Scope(ScopeContext),
    /// Instance role only.
    Instance(InstanceContext),
    /// Both roles, combined with `mode`.
    Both {
        /// Scope side.
        scope: ScopeContext,
        /// Instance side.
        instance: InstanceContext,
        /// Combination semantics.
        mode: CombineMode,
    },
}

/// Facts for one authorization check.
///
/// # Examples
///
/// ```
/// use hearth_rbac::{CombineMode, EvaluationContext, InstanceRole, ScopeRole};
/// use hearth_rbac::resources::{InstanceResource, ScopeResource};
///
/// let ctx = EvaluationContext::scope(ScopeResource::Organization, Some(ScopeRole::Admin));
/// assert!(!ctx.is_super_admin());
///
/// let ctx = EvaluationContext::both(
///     ScopeResource::Project,
///     Some(ScopeRole::Member),
///     InstanceResource::Location,
///     None,
/// )
/// .with_mode(CombineMode::All);
/// assert_eq!(ctx.mode(), Some(CombineMode::All));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Role facts.
    pub subject: Subject,

    /// Platform-wide super admin; bypasses every check.
    #[serde(default)]
    pub super_admin: bool,

    /// Extra facts for condition predicates.
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl EvaluationContext {
    fn from_subject(subject: Subject) -> Self {
        Self {
            subject,
            super_admin: false,
            attributes: HashMap::new(),
        }
    }

    /// Context with only a scope role.
    pub fn scope(resource: ScopeResource, role: Option<ScopeRole>) -> Self {
        Self::from_subject(Subject::Scope(ScopeContext { resource, role }))
    }

    /// Context with only an instance role.
    pub fn instance(resource: InstanceResource, role: Option<InstanceRole>) -> Self {
        Self::from_subject(Subject::Instance(InstanceContext { resource, role }))
    }

    /// Context with both roles, combined with [`CombineMode::Any`].
    pub fn both(
        scope_resource: ScopeResource,
        scope_role: Option<ScopeRole>,
        instance_resource: InstanceResource,
        instance_role: Option<InstanceRole>,
    ) -> Self {
        Self::from_subject(Subject::Both {
            scope: ScopeContext {
                resource: scope_resource,
                role: scope_role,
            },
            instance: InstanceContext {
                resource: instance_resource,
                role: instance_role,
            },
            mode: CombineMode::Any,
        })
    }

    /// Set the combination mode. No effect unless both roles are present.
    pub fn with_mode(mut self, new_mode: CombineMode) -> Self {
        if let Subject::Both { mode, .. } = &mut self.subject {
            *mode = new_mode;
        }
        self
    }

    /// Set the super admin flag.
    pub fn with_super_admin(mut self, super_admin: bool) -> Self {
        self.super_admin = super_admin;
        self
    }

    /// Attach an attribute for condition predicates.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Check the super admin flag.
    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    /// Scope side, if present.
    pub fn scope_context(&self) -> Option<&ScopeContext> {
        match &self.subject {
            Subject::Scope(scope) | Subject::Both { scope, .. } => Some(scope),
            Subject::Instance(_) => None,
        }
    }

    /// Instance side, if present.
    pub fn instance_context(&self) -> Option<&InstanceContext> {
        match &self.subject {
            Subject::Instance(instance) | Subject::Both { instance, .. } => Some(instance),
            Subject::Scope(_) => None,
        }
    }

    /// Combination mode, present only when both roles are.
    pub fn mode(&self) -> Option<CombineMode> {
        match self.subject {
            Subject::Both { mode, .. } => Some(mode),
            _ => None,
        }
    }

    /// Look up an attribute.
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}
