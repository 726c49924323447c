//! # Hearth RBAC (Hybrid Role-Based Access Control)
//!
//! This crate holds the permission model and decision engine for Hearth.
//! Coarse access comes from scope roles held on organizations and projects
//! (RBAC); fine access comes from instance roles held on individual locations
//! and items (ACL).
//!
//! ## Overview
//!
//! - **Resources**: scope resources (`organization`, `project`) and instance
//!   resources (`location`, `item`)
//! - **Actions**: generic CRUD plus family-specific membership actions
//! - **Matrix**: which actions are declared on which resource
//! - **Permission keys**: validated `<action>:<resource>` values
//! - **Grant tables**: role → permission set, one table per role family
//! - **Engine**: [`can`] and [`Authorizer`], the single decision point
//!
//! ## Architecture
//!
//! ```text
//! PermissionKey = Action + Resource   (checked against the matrix)
//!
//! RbacTable: (ScopeResource, ScopeRole)       → PermissionSet
//! AclTable:  (InstanceResource, InstanceRole) → PermissionSet
//!
//! EvaluationContext { scope role?, instance role?, mode, super_admin }
//!        │
//!        ▼
//!   can(policy, key, ctx) → bool
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use hearth_rbac::actions::{InstanceAction, ScopeAction};
//! use hearth_rbac::permissions::PermissionKey;
//! use hearth_rbac::resources::{InstanceResource, ScopeResource};
//! use hearth_rbac::{Authorizer, CombineMode, EvaluationContext, InstanceRole, Policy, ScopeRole};
//!
//! let authorizer = Authorizer::new(Arc::new(Policy::builtin().unwrap()));
//!
//! // Organization admins cascade down to projects
//! let delete_project = PermissionKey::scope(ScopeResource::Project, ScopeAction::Delete);
//! let org_admin = EvaluationContext::scope(ScopeResource::Organization, Some(ScopeRole::Admin));
//! assert!(authorizer.can(&delete_project, &org_admin));
//!
//! // Either grant suffices by default
//! let update = PermissionKey::instance(InstanceResource::Location, InstanceAction::Update);
//! let ctx = EvaluationContext::both(
//!     ScopeResource::Project,
//!     Some(ScopeRole::Member),
//!     InstanceResource::Location,
//!     Some(InstanceRole::Editor),
//! );
//! assert!(authorizer.can(&update, &ctx));
//!
//! // Require both
//! assert!(!authorizer.can(&update, &ctx.with_mode(CombineMode::All)));
//! ```
//!
//! ## Integration with hearth-org
//!
//! This crate never performs I/O. `hearth-org` resolves the roles a user holds
//! from the membership store and builds the [`EvaluationContext`].

pub mod actions;
pub mod conditions;
pub mod context;
pub mod engine;
pub mod error;
pub mod grants;
pub mod matrix;
pub mod permissions;
pub mod policy;
pub mod resources;
pub mod roles;

// Re-export main types for convenience
pub use actions::{Action, InstanceAction, InstanceGrantAction, ScopeAction};
pub use conditions::{ConditionTag, Conditions};
pub use context::{CombineMode, EvaluationContext, Subject};
pub use engine::{can, evaluate, Authorizer, Decision, DecisionReason};
pub use error::{RbacError, RbacResult};
pub use grants::{AclTable, RbacTable};
pub use permissions::{PermissionKey, PermissionSet};
pub use policy::{Policy, PolicyDocument};
pub use resources::{InstanceResource, Resource, ResourceFamily, ScopeResource};
pub use roles::{InstanceRole, ScopeRole};
