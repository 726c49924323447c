//! Access control facade
//!
//! [`AccessControl`] resolves a principal's roles and runs the decision engine
//! in one call. Handlers use [`AccessControl::require`] to turn a denial into
//! an [`AccessError::Forbidden`].

use hearth_rbac::{Authorizer, Decision, DecisionReason, PermissionKey};

use crate::error::{AccessError, AccessResult, ResolveResult};
use crate::resolver::{AccessRequest, MembershipResolver, Principal};

/// Resolver plus authorizer.
#[derive(Debug, Clone)]
pub struct AccessControl {
    resolver: MembershipResolver,
    authorizer: Authorizer,
}

impl AccessControl {
    /// Combine a resolver and an authorizer.
    pub fn new(resolver: MembershipResolver, authorizer: Authorizer) -> Self {
        Self { resolver, authorizer }
    }

    /// The membership resolver.
    pub fn resolver(&self) -> &MembershipResolver {
        &self.resolver
    }

    /// The authorizer.
    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    /// Resolve roles and decide.
    ///
    /// For a project target the first allowing context wins; when none
    /// allows, the project-side denial is returned.
    ///
    /// # Errors
    ///
    /// A [`ResolveError`](crate::ResolveError) when a role could not be
    /// determined. A denial is an `Ok` decision.
    pub async fn check(
        &self,
        principal: &Principal,
        key: &PermissionKey,
        request: &AccessRequest,
    ) -> ResolveResult<Decision> {
        let contexts = self.resolver.contexts_for(principal, request).await?;
        let mut denial = None;
        for ctx in &contexts {
            let decision = self.authorizer.evaluate(key, ctx);
            if decision.is_allowed() {
                return Ok(decision);
            }
            if denial.is_none() {
                denial = Some(decision);
            }
        }
        Ok(denial.unwrap_or_else(|| Decision {
            key: *key,
            allowed: false,
            reason: DecisionReason::NotGranted,
        }))
    }

    /// Resolve roles and answer yes or no.
    pub async fn can(
        &self,
        principal: &Principal,
        key: &PermissionKey,
        request: &AccessRequest,
    ) -> ResolveResult<bool> {
        Ok(self.check(principal, key, request).await?.is_allowed())
    }

    /// Require a permission.
    ///
    /// # Errors
    ///
    /// [`AccessError::Forbidden`] when denied and [`AccessError::Resolution`]
    /// when roles could not be resolved.
    pub async fn require(
        &self,
        principal: &Principal,
        key: &PermissionKey,
        request: &AccessRequest,
    ) -> AccessResult<()> {
        let decision = self.check(principal, key, request).await?;
        if decision.is_allowed() {
            return Ok(());
        }
        tracing::debug!(
            user_id = %principal.user_id,
            key = %key,
            reason = ?decision.reason,
            "Access denied"
        );
        Err(AccessError::Forbidden {
            key: decision.key,
            reason: decision.reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{InstanceMembership, InstanceRef, ScopeMembership, ScopeRef};
    use crate::store::{MembershipStore, MemoryMembershipStore};
    use hearth_rbac::{
        InstanceAction, InstanceResource, InstanceRole, Policy, ScopeAction, ScopeResource,
        ScopeRole,
    };
    use std::sync::Arc;
    use uuid::Uuid;

    fn access_with(store: MemoryMembershipStore) -> AccessControl {
        let resolver = MembershipResolver::new(Arc::new(store));
        let authorizer = Authorizer::new(Arc::new(Policy::builtin().unwrap()));
        AccessControl::new(resolver, authorizer)
    }

    #[tokio::test]
    async fn test_require_maps_denial_to_forbidden() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let org = ScopeRef::Organization(Uuid::now_v7());
        store
            .add_scope_member(ScopeMembership::new(user, org, ScopeRole::Member))
            .await
            .unwrap();
        let access = access_with(store);

        let read = PermissionKey::scope(ScopeResource::Organization, ScopeAction::Read);
        let delete = PermissionKey::scope(ScopeResource::Organization, ScopeAction::Delete);
        let request = AccessRequest::scope(org);
        let principal = Principal::user(user);

        access.require(&principal, &read, &request).await.unwrap();
        match access.require(&principal, &delete, &request).await {
            Err(AccessError::Forbidden { key, reason }) => {
                assert_eq!(key, delete);
                assert_eq!(reason, DecisionReason::NotGranted);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_location_owner() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let location = InstanceRef::Location(Uuid::now_v7());
        store
            .add_instance_member(InstanceMembership::new(user, location, InstanceRole::Owner))
            .await
            .unwrap();
        let access = access_with(store);
        let principal = Principal::user(user);
        let request = AccessRequest::instance(location);

        let delete = PermissionKey::instance(InstanceResource::Location, InstanceAction::Delete);
        let create = PermissionKey::instance(InstanceResource::Location, InstanceAction::Create);
        assert!(access.can(&principal, &delete, &request).await.unwrap());
        assert!(!access.can(&principal, &create, &request).await.unwrap());
    }

    #[tokio::test]
    async fn test_super_admin_needs_no_membership() {
        let access = access_with(MemoryMembershipStore::new());
        let request = AccessRequest::scope(ScopeRef::Organization(Uuid::now_v7()));
        let delete = PermissionKey::scope(ScopeResource::Organization, ScopeAction::Delete);

        let decision = access
            .check(&Principal::super_admin(Uuid::now_v7()), &delete, &request)
            .await
            .unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.reason, DecisionReason::SuperAdmin);

        assert!(!access
            .can(&Principal::user(Uuid::now_v7()), &delete, &request)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_project_target_counts_organization_role() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let (org_id, project_id) = (Uuid::now_v7(), Uuid::now_v7());
        store
            .add_scope_member(ScopeMembership::new(
                user,
                ScopeRef::Organization(org_id),
                ScopeRole::Member,
            ))
            .await
            .unwrap();
        store
            .add_scope_member(ScopeMembership::new(
                user,
                ScopeRef::Project(project_id),
                ScopeRole::Admin,
            ))
            .await
            .unwrap();
        let access = access_with(store);
        let principal = Principal::user(user);
        let request = AccessRequest::project(org_id, project_id);

        // Project admin grants update; organization member does not
        let update = PermissionKey::scope(ScopeResource::Project, ScopeAction::Update);
        let decision = access.check(&principal, &update, &request).await.unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.reason, DecisionReason::ScopeGrant);

        // Neither role grants creating projects
        let create = PermissionKey::scope(ScopeResource::Project, ScopeAction::Create);
        let decision = access.check(&principal, &create, &request).await.unwrap();
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason, DecisionReason::NotGranted);
    }
}
