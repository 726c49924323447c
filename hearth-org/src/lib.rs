//! # Hearth Membership Resolution
//!
//! This crate connects the permission model in `hearth-rbac` to stored
//! memberships: who holds which role on which organization, project,
//! location or item.
//!
//! ## Overview
//!
//! The hearth-org crate handles:
//! - **Memberships**: user-scope and user-instance role rows
//! - **Stores**: the [`MembershipStore`] abstraction and an in-memory store
//! - **Cache**: an opt-in role lookup cache invalidated on writes
//! - **Resolver**: building evaluation contexts for a request, including
//!   organization roles cascading into their projects
//! - **Access control**: resolve then decide, in one call
//!
//! ## Architecture
//!
//! ```text
//! AccessControl
//!   ├─ MembershipResolver ─→ MembershipStore (optionally cached)
//!   │                           ├─ ScopeMembership    (user, org/project)
//!   │                           └─ InstanceMembership (user, location/item)
//!   └─ Authorizer (hearth-rbac)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use uuid::Uuid;
//! use hearth_org::{
//!     AccessControl, AccessRequest, InstanceMembership, InstanceRef, MembershipResolver,
//!     MembershipStore, MemoryMembershipStore, Principal,
//! };
//! use hearth_rbac::{
//!     Authorizer, InstanceAction, InstanceResource, InstanceRole, PermissionKey, Policy,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(MemoryMembershipStore::new());
//! let user = Uuid::now_v7();
//! let location = InstanceRef::Location(Uuid::now_v7());
//! store
//!     .add_instance_member(InstanceMembership::new(user, location, InstanceRole::Owner))
//!     .await
//!     .unwrap();
//!
//! let access = AccessControl::new(
//!     MembershipResolver::new(store),
//!     Authorizer::new(Arc::new(Policy::builtin().unwrap())),
//! );
//! let delete = PermissionKey::instance(InstanceResource::Location, InstanceAction::Delete);
//! access
//!     .require(&Principal::user(user), &delete, &AccessRequest::instance(location))
//!     .await
//!     .unwrap();
//! # }
//! ```

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod membership;
pub mod resolver;
pub mod store;

// Re-export main types for convenience
pub use access::AccessControl;
pub use cache::{CacheStats, CachedMembershipStore};
pub use config::{ConfigError, ResolverConfig};
pub use error::{AccessError, AccessResult, ResolveError, ResolveResult, StoreError, StoreResult};
pub use membership::{
    InstanceMembership, InstanceRef, MembershipTarget, ScopeMembership, ScopeRef,
};
pub use resolver::{AccessRequest, AccessTarget, MembershipResolver, Principal, RoleCache};
pub use store::{MembershipStore, MemoryMembershipStore};
