//! Membership storage
//!
//! This module provides the membership store abstraction and an in-memory
//! implementation. A store holds at most one role per (user, target).

use async_trait::async_trait;
use hearth_rbac::{InstanceRole, ScopeRole};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::membership::{InstanceMembership, InstanceRef, ScopeMembership, ScopeRef};

/// Membership store trait for role lookups and membership changes.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Get the role a user holds on a scope, if any.
    async fn scope_role(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<Option<ScopeRole>>;

    /// Get the role a user holds on an instance, if any.
    async fn instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> StoreResult<Option<InstanceRole>>;

    /// Add a scope membership. Fails if the user already holds a role there.
    async fn add_scope_member(&self, membership: ScopeMembership) -> StoreResult<()>;

    /// Add an instance membership. Fails if the user already holds a role there.
    async fn add_instance_member(&self, membership: InstanceMembership) -> StoreResult<()>;

    /// Replace the role on an existing scope membership.
    async fn change_scope_role(
        &self,
        user_id: Uuid,
        scope: ScopeRef,
        role: ScopeRole,
    ) -> StoreResult<()>;

    /// Replace the role on an existing instance membership.
    async fn change_instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
        role: InstanceRole,
    ) -> StoreResult<()>;

    /// Remove a scope membership.
    async fn remove_scope_member(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<()>;

    /// Remove an instance membership.
    async fn remove_instance_member(&self, user_id: Uuid, instance: InstanceRef) -> StoreResult<()>;
}

#[async_trait]
impl<S: MembershipStore + ?Sized> MembershipStore for Arc<S> {
    async fn scope_role(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<Option<ScopeRole>> {
        (**self).scope_role(user_id, scope).await
    }

    async fn instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> StoreResult<Option<InstanceRole>> {
        (**self).instance_role(user_id, instance).await
    }

    async fn add_scope_member(&self, membership: ScopeMembership) -> StoreResult<()> {
        (**self).add_scope_member(membership).await
    }

    async fn add_instance_member(&self, membership: InstanceMembership) -> StoreResult<()> {
        (**self).add_instance_member(membership).await
    }

    async fn change_scope_role(
        &self,
        user_id: Uuid,
        scope: ScopeRef,
        role: ScopeRole,
    ) -> StoreResult<()> {
        (**self).change_scope_role(user_id, scope, role).await
    }

    async fn change_instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
        role: InstanceRole,
    ) -> StoreResult<()> {
        (**self).change_instance_role(user_id, instance, role).await
    }

    async fn remove_scope_member(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<()> {
        (**self).remove_scope_member(user_id, scope).await
    }

    async fn remove_instance_member(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> StoreResult<()> {
        (**self).remove_instance_member(user_id, instance).await
    }
}

/// In-memory membership store.
///
/// This is suitable for single-process applications and testing.
#[derive(Default)]
pub struct MemoryMembershipStore {
    /// Scope memberships keyed by (user, scope)
    scopes: RwLock<HashMap<(Uuid, ScopeRef), ScopeMembership>>,
    /// Instance memberships keyed by (user, instance)
    instances: RwLock<HashMap<(Uuid, InstanceRef), InstanceMembership>>,
}

impl std::fmt::Debug for MemoryMembershipStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMembershipStore").finish_non_exhaustive()
    }
}

impl MemoryMembershipStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All memberships on a scope.
    pub async fn scope_members(&self, scope: ScopeRef) -> Vec<ScopeMembership> {
        self.scopes
            .read()
            .await
            .values()
            .filter(|m| m.scope == scope)
            .cloned()
            .collect()
    }

    /// All memberships on an instance.
    pub async fn instance_members(&self, instance: InstanceRef) -> Vec<InstanceMembership> {
        self.instances
            .read()
            .await
            .values()
            .filter(|m| m.instance == instance)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn scope_role(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<Option<ScopeRole>> {
        Ok(self.scopes.read().await.get(&(user_id, scope)).map(|m| m.role))
    }

    async fn instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> StoreResult<Option<InstanceRole>> {
        Ok(self
            .instances
            .read()
            .await
            .get(&(user_id, instance))
            .map(|m| m.role))
    }

    async fn add_scope_member(&self, membership: ScopeMembership) -> StoreResult<()> {
        let mut scopes = self.scopes.write().await;
        let key = (membership.user_id, membership.scope);
        if scopes.contains_key(&key) {
            return Err(StoreError::AlreadyMember {
                user_id: membership.user_id,
                target: membership.scope.into(),
            });
        }
        scopes.insert(key, membership);
        Ok(())
    }

    async fn add_instance_member(&self, membership: InstanceMembership) -> StoreResult<()> {
        let mut instances = self.instances.write().await;
        let key = (membership.user_id, membership.instance);
        if instances.contains_key(&key) {
            return Err(StoreError::AlreadyMember {
                user_id: membership.user_id,
                target: membership.instance.into(),
            });
        }
        instances.insert(key, membership);
        Ok(())
    }

    async fn change_scope_role(
        &self,
        user_id: Uuid,
        scope: ScopeRef,
        role: ScopeRole,
    ) -> StoreResult<()> {
        let mut scopes = self.scopes.write().await;
        let membership = scopes
            .get_mut(&(user_id, scope))
            .ok_or_else(|| StoreError::NotFound {
                user_id,
                target: scope.into(),
            })?;
        membership.role = role;
        Ok(())
    }

    async fn change_instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
        role: InstanceRole,
    ) -> StoreResult<()> {
        let mut instances = self.instances.write().await;
        let membership = instances
            .get_mut(&(user_id, instance))
            .ok_or_else(|| StoreError::NotFound {
                user_id,
                target: instance.into(),
            })?;
        membership.role = role;
        Ok(())
    }

    async fn remove_scope_member(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<()> {
        self.scopes
            .write()
            .await
            .remove(&(user_id, scope))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                user_id,
                target: scope.into(),
            })
    }

    async fn remove_instance_member(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> StoreResult<()> {
        self.instances
            .write()
            .await
            .remove(&(user_id, instance))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                user_id,
                target: instance.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scope_membership_lifecycle() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let org = ScopeRef::Organization(Uuid::now_v7());

        assert_eq!(store.scope_role(user, org).await.unwrap(), None);

        store
            .add_scope_member(ScopeMembership::new(user, org, ScopeRole::Member))
            .await
            .unwrap();
        assert_eq!(store.scope_role(user, org).await.unwrap(), Some(ScopeRole::Member));

        store.change_scope_role(user, org, ScopeRole::Admin).await.unwrap();
        assert_eq!(store.scope_role(user, org).await.unwrap(), Some(ScopeRole::Admin));
        assert_eq!(store.scope_members(org).await.len(), 1);

        store.remove_scope_member(user, org).await.unwrap();
        assert_eq!(store.scope_role(user, org).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_one_role_per_target() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let location = InstanceRef::Location(Uuid::now_v7());

        store
            .add_instance_member(InstanceMembership::new(user, location, InstanceRole::Viewer))
            .await
            .unwrap();
        let err = store
            .add_instance_member(InstanceMembership::new(user, location, InstanceRole::Owner))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyMember { .. }));
        assert_eq!(
            store.instance_role(user, location).await.unwrap(),
            Some(InstanceRole::Viewer)
        );
    }

    #[tokio::test]
    async fn test_roles_are_per_target() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let item = InstanceRef::Item(Uuid::now_v7());
        let other_item = InstanceRef::Item(Uuid::now_v7());

        store
            .add_instance_member(InstanceMembership::new(user, item, InstanceRole::Owner))
            .await
            .unwrap();
        assert_eq!(store.instance_role(user, other_item).await.unwrap(), None);
        assert_eq!(store.instance_role(Uuid::now_v7(), item).await.unwrap(), None);
        assert_eq!(store.instance_members(item).await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let project = ScopeRef::Project(Uuid::now_v7());
        let item = InstanceRef::Item(Uuid::now_v7());

        assert!(matches!(
            store.change_scope_role(user, project, ScopeRole::Admin).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.remove_scope_member(user, project).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.change_instance_role(user, item, InstanceRole::Editor).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.remove_instance_member(user, item).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_shared_store_through_arc() {
        let store: Arc<dyn MembershipStore> = Arc::new(MemoryMembershipStore::new());
        let user = Uuid::now_v7();
        let org = ScopeRef::Organization(Uuid::now_v7());
        store
            .add_scope_member(ScopeMembership::new(user, org, ScopeRole::Admin))
            .await
            .unwrap();
        assert_eq!(store.scope_role(user, org).await.unwrap(), Some(ScopeRole::Admin));
    }
}
