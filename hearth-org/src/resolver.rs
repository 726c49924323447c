//! Membership resolution
//!
//! Turns "user U wants to do K to target T" into the [`EvaluationContext`]
//! the decision engine consumes. All roles are resolved before the engine
//! runs; when both a scope and an instance role are needed they are looked
//! up concurrently.

use hearth_rbac::{CombineMode, EvaluationContext, InstanceRole, ScopeRole};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::CachedMembershipStore;
use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::membership::{InstanceRef, ScopeRef};
use crate::store::MembershipStore;

/// The user a check is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// User ID
    pub user_id: Uuid,

    /// Platform-wide super admin
    #[serde(default)]
    pub super_admin: bool,
}

impl Principal {
    /// A regular user.
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            super_admin: false,
        }
    }

    /// A platform super admin.
    pub fn super_admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            super_admin: true,
        }
    }
}

/// Which roles a check needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessTarget {
    /// Scope role only
    Scope {
        /// Organization or project
        scope: ScopeRef,
    },
    /// Instance role only
    Instance {
        /// Location or item
        instance: InstanceRef,
    },
    /// Both roles, combined with `mode`
    Both {
        /// Organization or project
        scope: ScopeRef,
        /// Location or item
        instance: InstanceRef,
        /// Combination semantics
        mode: CombineMode,
    },
    /// A project inside its organization.
    ///
    /// The organization role and the project role are both resolved and the
    /// key is allowed if either scope grants it. With an instance, each scope
    /// is combined with the instance role using `mode`.
    Project {
        /// Organization owning the project
        organization: Uuid,
        /// Project ID
        project: Uuid,
        /// Location or item inside the project
        #[serde(default)]
        instance: Option<InstanceRef>,
        /// Combination semantics when an instance is given
        mode: CombineMode,
    },
}

/// A request to check access to a target.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use hearth_org::{AccessRequest, InstanceRef, ScopeRef};
/// use hearth_rbac::CombineMode;
///
/// let request = AccessRequest::both(
///     ScopeRef::Project(Uuid::now_v7()),
///     InstanceRef::Location(Uuid::now_v7()),
/// )
/// .with_mode(CombineMode::All)
/// .with_attribute("plan", "pro");
///
/// // Organization roles count for the project too
/// let cascading = AccessRequest::project(Uuid::now_v7(), Uuid::now_v7());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Roles to resolve
    pub target: AccessTarget,

    /// Extra facts passed through to condition predicates
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl AccessRequest {
    fn from_target(target: AccessTarget) -> Self {
        Self {
            target,
            attributes: HashMap::new(),
        }
    }

    /// Check against a scope role.
    pub fn scope(scope: ScopeRef) -> Self {
        Self::from_target(AccessTarget::Scope { scope })
    }

    /// Check against an instance role.
    pub fn instance(instance: InstanceRef) -> Self {
        Self::from_target(AccessTarget::Instance { instance })
    }

    /// Check against both roles; either suffices unless the mode is changed.
    pub fn both(scope: ScopeRef, instance: InstanceRef) -> Self {
        Self::from_target(AccessTarget::Both {
            scope,
            instance,
            mode: CombineMode::Any,
        })
    }

    /// Check against a project, counting the organization role as well.
    pub fn project(organization: Uuid, project: Uuid) -> Self {
        Self::from_target(AccessTarget::Project {
            organization,
            project,
            instance: None,
            mode: CombineMode::Any,
        })
    }

    /// Check against an instance inside a project, counting the organization
    /// role, the project role and the instance role.
    pub fn project_instance(organization: Uuid, project: Uuid, instance: InstanceRef) -> Self {
        Self::from_target(AccessTarget::Project {
            organization,
            project,
            instance: Some(instance),
            mode: CombineMode::Any,
        })
    }

    /// Set the combination mode. No effect unless an instance role is
    /// requested alongside a scope role.
    pub fn with_mode(mut self, new_mode: CombineMode) -> Self {
        match &mut self.target {
            AccessTarget::Both { mode, .. } | AccessTarget::Project { mode, .. } => {
                *mode = new_mode;
            }
            AccessTarget::Scope { .. } | AccessTarget::Instance { .. } => {}
        }
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
}

/// Role cache shared by a resolver.
pub type RoleCache = CachedMembershipStore<Arc<dyn MembershipStore>>;

/// Resolves the roles a user holds from a membership store.
#[derive(Clone)]
pub struct MembershipResolver {
    store: Arc<dyn MembershipStore>,
    cache: Option<Arc<RoleCache>>,
}

impl std::fmt::Debug for MembershipResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipResolver")
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

fn scope_side(
    scope: ScopeRef,
    scope_role: Option<ScopeRole>,
    instance: Option<(InstanceRef, Option<InstanceRole>)>,
    mode: CombineMode,
) -> EvaluationContext {
    match instance {
        Some((instance, instance_role)) => EvaluationContext::both(
            scope.resource(),
            scope_role,
            instance.resource(),
            instance_role,
        )
        .with_mode(mode),
        None => EvaluationContext::scope(scope.resource(), scope_role),
    }
}

fn finish(
    ctx: EvaluationContext,
    principal: &Principal,
    request: &AccessRequest,
) -> EvaluationContext {
    let mut ctx = ctx.with_super_admin(principal.super_admin);
    ctx.attributes.extend(request.attributes.clone());
    ctx
}

impl MembershipResolver {
    /// Resolve directly against a store.
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store, cache: None }
    }

    /// Resolve against a store, wrapped in a role cache if configured.
    pub fn with_config(store: Arc<dyn MembershipStore>, config: &ResolverConfig) -> Self {
        if !config.cache_enabled {
            return Self::new(store);
        }
        let cache = Arc::new(CachedMembershipStore::with_capacity(store, config.cache_capacity));
        let store: Arc<dyn MembershipStore> = cache.clone();
        Self {
            store,
            cache: Some(cache),
        }
    }

    /// The store lookups go through, including the cache if there is one.
    pub fn store(&self) -> &Arc<dyn MembershipStore> {
        &self.store
    }

    /// The role cache, if enabled.
    pub fn cache(&self) -> Option<&Arc<RoleCache>> {
        self.cache.as_ref()
    }

    /// Forget cached roles for a user after a membership write that did not
    /// go through this resolver's store. No-op without a cache.
    pub async fn invalidate_user(&self, user_id: Uuid) {
        if let Some(cache) = &self.cache {
            cache.invalidate_user(user_id).await;
        }
    }

    /// Forget every cached role. No-op without a cache.
    pub async fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
    }

    /// Get the role a user holds on a scope.
    ///
    /// `Ok(None)` means no role. A store failure is an error, never `None`.
    pub async fn resolve_scope_role(
        &self,
        user_id: Uuid,
        scope: ScopeRef,
    ) -> ResolveResult<Option<ScopeRole>> {
        match self.store.scope_role(user_id, scope).await {
            Ok(role) => {
                tracing::debug!(
                    user_id = %user_id,
                    target = %scope,
                    role = ?role,
                    "Resolved scope role"
                );
                Ok(role)
            }
            Err(source) => {
                tracing::warn!(
                    user_id = %user_id,
                    target = %scope,
                    error = %source,
                    "Scope role lookup failed"
                );
                Err(ResolveError::Storage {
                    user_id,
                    target: scope.into(),
                    source,
                })
            }
        }
    }

    /// Get the role a user holds on an instance.
    ///
    /// `Ok(None)` means no role. A store failure is an error, never `None`.
    pub async fn resolve_instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> ResolveResult<Option<InstanceRole>> {
        match self.store.instance_role(user_id, instance).await {
            Ok(role) => {
                tracing::debug!(
                    user_id = %user_id,
                    target = %instance,
                    role = ?role,
                    "Resolved instance role"
                );
                Ok(role)
            }
            Err(source) => {
                tracing::warn!(
                    user_id = %user_id,
                    target = %instance,
                    error = %source,
                    "Instance role lookup failed"
                );
                Err(ResolveError::Storage {
                    user_id,
                    target: instance.into(),
                    source,
                })
            }
        }
    }

    async fn resolve_optional_instance_role(
        &self,
        user_id: Uuid,
        instance: Option<InstanceRef>,
    ) -> ResolveResult<Option<InstanceRole>> {
        match instance {
            Some(instance) => self.resolve_instance_role(user_id, instance).await,
            None => Ok(None),
        }
    }

    /// Build the evaluation context for a request.
    ///
    /// Super admins are decided without touching the store, so their roles are
    /// left unresolved.
    ///
    /// A [`AccessTarget::Project`] target yields the project-side context
    /// only. Use [`MembershipResolver::contexts_for`] to get the organization
    /// side as well.
    pub async fn context_for(
        &self,
        principal: &Principal,
        request: &AccessRequest,
    ) -> ResolveResult<EvaluationContext> {
        let user_id = principal.user_id;
        let skip = principal.super_admin;

        let ctx = match request.target {
            AccessTarget::Scope { scope } => {
                let role = if skip {
                    None
                } else {
                    self.resolve_scope_role(user_id, scope).await?
                };
                EvaluationContext::scope(scope.resource(), role)
            }
            AccessTarget::Instance { instance } => {
                let role = if skip {
                    None
                } else {
                    self.resolve_instance_role(user_id, instance).await?
                };
                EvaluationContext::instance(instance.resource(), role)
            }
            AccessTarget::Both { scope, instance, mode } => {
                let (scope_role, instance_role) = if skip {
                    (None, None)
                } else {
                    tokio::try_join!(
                        self.resolve_scope_role(user_id, scope),
                        self.resolve_instance_role(user_id, instance),
                    )?
                };
                scope_side(scope, scope_role, Some((instance, instance_role)), mode)
            }
            AccessTarget::Project {
                project,
                instance,
                mode,
                ..
            } => {
                let project = ScopeRef::Project(project);
                let (project_role, instance_role) = if skip {
                    (None, None)
                } else {
                    tokio::try_join!(
                        self.resolve_scope_role(user_id, project),
                        self.resolve_optional_instance_role(user_id, instance),
                    )?
                };
                let instance = instance.map(|instance| (instance, instance_role));
                scope_side(project, project_role, instance, mode)
            }
        };

        Ok(finish(ctx, principal, request))
    }

    /// Build every evaluation context a request is decided on.
    ///
    /// A project target gives two contexts, project side first, with all
    /// roles resolved concurrently. Access is allowed if any context allows
    /// it. Every other target gives the single context from
    /// [`MembershipResolver::context_for`].
    pub async fn contexts_for(
        &self,
        principal: &Principal,
        request: &AccessRequest,
    ) -> ResolveResult<Vec<EvaluationContext>> {
        let AccessTarget::Project {
            organization,
            project,
            instance,
            mode,
        } = request.target
        else {
            return Ok(vec![self.context_for(principal, request).await?]);
        };

        let user_id = principal.user_id;
        let organization = ScopeRef::Organization(organization);
        let project = ScopeRef::Project(project);
        let (organization_role, project_role, instance_role) = if principal.super_admin {
            (None, None, None)
        } else {
            tokio::try_join!(
                self.resolve_scope_role(user_id, organization),
                self.resolve_scope_role(user_id, project),
                self.resolve_optional_instance_role(user_id, instance),
            )?
        };
        let instance = instance.map(|instance| (instance, instance_role));

        Ok(vec![
            finish(scope_side(project, project_role, instance, mode), principal, request),
            finish(
                scope_side(organization, organization_role, instance, mode),
                principal,
                request,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{InstanceMembership, ScopeMembership};
    use crate::store::MemoryMembershipStore;
    use hearth_rbac::{InstanceResource, ScopeResource, Subject};

    async fn seeded() -> (MembershipResolver, Uuid, ScopeRef, InstanceRef) {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let project = ScopeRef::Project(Uuid::now_v7());
        let location = InstanceRef::Location(Uuid::now_v7());
        store
            .add_scope_member(ScopeMembership::new(user, project, ScopeRole::Member))
            .await
            .unwrap();
        store
            .add_instance_member(InstanceMembership::new(user, location, InstanceRole::Editor))
            .await
            .unwrap();
        (MembershipResolver::new(Arc::new(store)), user, project, location)
    }

    fn cached_config() -> ResolverConfig {
        ResolverConfig {
            cache_enabled: true,
            ..ResolverConfig::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_roles() {
        let (resolver, user, project, location) = seeded().await;
        assert_eq!(
            resolver.resolve_scope_role(user, project).await.unwrap(),
            Some(ScopeRole::Member)
        );
        assert_eq!(
            resolver.resolve_instance_role(user, location).await.unwrap(),
            Some(InstanceRole::Editor)
        );
        assert_eq!(
            resolver
                .resolve_scope_role(user, ScopeRef::Organization(Uuid::now_v7()))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_context_for_both() {
        let (resolver, user, project, location) = seeded().await;
        let request = AccessRequest::both(project, location)
            .with_mode(CombineMode::All)
            .with_attribute("plan", "pro");
        let ctx = resolver.context_for(&Principal::user(user), &request).await.unwrap();

        match ctx.subject {
            Subject::Both { scope, instance, mode } => {
                assert_eq!(scope.resource, ScopeResource::Project);
                assert_eq!(scope.role, Some(ScopeRole::Member));
                assert_eq!(instance.resource, InstanceResource::Location);
                assert_eq!(instance.role, Some(InstanceRole::Editor));
                assert_eq!(mode, CombineMode::All);
            }
            other => panic!("unexpected subject: {other:?}"),
        }
        assert!(!ctx.is_super_admin());
        assert_eq!(ctx.attribute("plan"), Some(&serde_json::json!("pro")));
    }

    #[tokio::test]
    async fn test_context_for_single_target() {
        let (resolver, user, project, _) = seeded().await;
        let request = AccessRequest::scope(project).with_mode(CombineMode::All);
        let ctx = resolver.context_for(&Principal::user(user), &request).await.unwrap();
        assert_eq!(ctx.mode(), None);
        assert_eq!(ctx.scope_context().unwrap().role, Some(ScopeRole::Member));

        let contexts = resolver.contexts_for(&Principal::user(user), &request).await.unwrap();
        assert_eq!(contexts, vec![ctx]);
    }

    #[tokio::test]
    async fn test_super_admin_flag_is_carried() {
        let (resolver, user, _, location) = seeded().await;
        let ctx = resolver
            .context_for(&Principal::super_admin(user), &AccessRequest::instance(location))
            .await
            .unwrap();
        assert!(ctx.is_super_admin());
        assert_eq!(ctx.instance_context().unwrap().role, None);
    }

    #[tokio::test]
    async fn test_contexts_for_project() {
        let store = MemoryMembershipStore::new();
        let user = Uuid::now_v7();
        let (org_id, project_id) = (Uuid::now_v7(), Uuid::now_v7());
        let item = InstanceRef::Item(Uuid::now_v7());
        store
            .add_scope_member(ScopeMembership::new(
                user,
                ScopeRef::Organization(org_id),
                ScopeRole::Admin,
            ))
            .await
            .unwrap();
        store
            .add_instance_member(InstanceMembership::new(user, item, InstanceRole::Viewer))
            .await
            .unwrap();
        let resolver = MembershipResolver::new(Arc::new(store));

        let request = AccessRequest::project(org_id, project_id);
        let contexts = resolver.contexts_for(&Principal::user(user), &request).await.unwrap();
        assert_eq!(
            contexts,
            vec![
                EvaluationContext::scope(ScopeResource::Project, None),
                EvaluationContext::scope(ScopeResource::Organization, Some(ScopeRole::Admin)),
            ]
        );

        // context_for only sees the project side
        let ctx = resolver.context_for(&Principal::user(user), &request).await.unwrap();
        assert_eq!(ctx, contexts[0]);

        let request =
            AccessRequest::project_instance(org_id, project_id, item).with_mode(CombineMode::All);
        let contexts = resolver.contexts_for(&Principal::user(user), &request).await.unwrap();
        assert_eq!(contexts.len(), 2);
        for ctx in &contexts {
            assert_eq!(ctx.mode(), Some(CombineMode::All));
            assert_eq!(ctx.instance_context().unwrap().role, Some(InstanceRole::Viewer));
        }
        assert_eq!(contexts[1].scope_context().unwrap().role, Some(ScopeRole::Admin));
    }

    #[tokio::test]
    async fn test_cache_is_off_by_default() {
        let store = Arc::new(MemoryMembershipStore::new());
        let resolver = MembershipResolver::with_config(store.clone(), &ResolverConfig::default());
        assert!(resolver.cache().is_none());
        let user = Uuid::now_v7();
        let org = ScopeRef::Organization(Uuid::now_v7());

        assert_eq!(resolver.resolve_scope_role(user, org).await.unwrap(), None);
        store
            .add_scope_member(ScopeMembership::new(user, org, ScopeRole::Admin))
            .await
            .unwrap();
        assert_eq!(
            resolver.resolve_scope_role(user, org).await.unwrap(),
            Some(ScopeRole::Admin)
        );

        // Nothing to invalidate
        resolver.invalidate_user(user).await;
        resolver.clear().await;
    }

    #[tokio::test]
    async fn test_cached_resolver_sees_revocation_after_invalidation() {
        let store = Arc::new(MemoryMembershipStore::new());
        let resolver = MembershipResolver::with_config(store.clone(), &cached_config());
        let user = Uuid::now_v7();
        let org = ScopeRef::Organization(Uuid::now_v7());
        store
            .add_scope_member(ScopeMembership::new(user, org, ScopeRole::Admin))
            .await
            .unwrap();
        assert_eq!(
            resolver.resolve_scope_role(user, org).await.unwrap(),
            Some(ScopeRole::Admin)
        );

        // Revoked behind the cache's back
        store.remove_scope_member(user, org).await.unwrap();
        assert_eq!(
            resolver.resolve_scope_role(user, org).await.unwrap(),
            Some(ScopeRole::Admin)
        );

        resolver.invalidate_user(user).await;
        assert_eq!(resolver.resolve_scope_role(user, org).await.unwrap(), None);

        store
            .add_scope_member(ScopeMembership::new(user, org, ScopeRole::Member))
            .await
            .unwrap();
        resolver.clear().await;
        assert_eq!(
            resolver.resolve_scope_role(user, org).await.unwrap(),
            Some(ScopeRole::Member)
        );
        assert_eq!(resolver.cache().unwrap().stats().await.scope_entries, 1);
    }

    #[tokio::test]
    async fn test_writes_through_cached_resolver_store() {
        let store: Arc<dyn MembershipStore> = Arc::new(MemoryMembershipStore::new());
        let resolver = MembershipResolver::with_config(store, &cached_config());
        let user = Uuid::now_v7();
        let location = InstanceRef::Location(Uuid::now_v7());

        assert_eq!(resolver.resolve_instance_role(user, location).await.unwrap(), None);
        resolver
            .store()
            .add_instance_member(InstanceMembership::new(user, location, InstanceRole::Owner))
            .await
            .unwrap();
        assert_eq!(
            resolver.resolve_instance_role(user, location).await.unwrap(),
            Some(InstanceRole::Owner)
        );
    }
}
