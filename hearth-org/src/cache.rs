//! Role lookup cache
//!
//! [`CachedMembershipStore`] wraps any [`MembershipStore`] and remembers the
//! answer to role lookups, including "no role". Writes made through the
//! wrapper drop the affected entry before returning, so the wrapper never
//! serves a role it has itself changed. There is no TTL: writes that bypass
//! the wrapper must call [`CachedMembershipStore::invalidate_user`] or
//! [`CachedMembershipStore::clear`].
//!
//! Every invalidation bumps a generation counter while holding the map lock.
//! A lookup only stores its answer if the generation is unchanged since it
//! started reading the inner store, so an answer read before a concurrent
//! write or invalidation is returned to its caller but never cached.
//!
//! Failed lookups are never cached.

use async_trait::async_trait;
use hearth_rbac::{InstanceRole, ScopeRole};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::membership::{InstanceMembership, InstanceRef, ScopeMembership, ScopeRef};
use crate::store::MembershipStore;

/// Default maximum number of cached lookups per role family.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups forwarded to the inner store
    pub misses: u64,
    /// Lookup answers dropped because an invalidation overlapped the read
    pub discarded: u64,
    /// Cached scope lookups
    pub scope_entries: usize,
    /// Cached instance lookups
    pub instance_entries: usize,
}

/// Membership store wrapper caching role lookups.
pub struct CachedMembershipStore<S> {
    inner: S,
    scope_roles: RwLock<HashMap<(Uuid, ScopeRef), Option<ScopeRole>>>,
    instance_roles: RwLock<HashMap<(Uuid, InstanceRef), Option<InstanceRole>>>,
    // Only bumped while holding one of the map write locks
    generation: AtomicU64,
    stats: RwLock<CacheStats>,
    capacity: usize,
}

impl<S> std::fmt::Debug for CachedMembershipStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedMembershipStore")
            .field("capacity", &self.capacity)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<S: MembershipStore> CachedMembershipStore<S> {
    /// Wrap a store with the default capacity.
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// Wrap a store with a custom capacity.
    ///
    /// Once a family's map is full, new lookups are answered but not stored.
    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            scope_roles: RwLock::new(HashMap::new()),
            instance_roles: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            stats: RwLock::new(CacheStats::default()),
            capacity,
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached lookup for a user.
    ///
    /// Lookups still in flight when this is called will not cache their
    /// answers.
    pub async fn invalidate_user(&self, user_id: Uuid) {
        {
            let mut scopes = self.scope_roles.write().await;
            self.bump();
            scopes.retain(|(user, _), _| *user != user_id);
        }
        {
            let mut instances = self.instance_roles.write().await;
            self.bump();
            instances.retain(|(user, _), _| *user != user_id);
        }
        tracing::debug!(user_id = %user_id, "Invalidated cached roles for user");
    }

    /// Drop every cached lookup.
    pub async fn clear(&self) {
        {
            let mut scopes = self.scope_roles.write().await;
            self.bump();
            scopes.clear();
        }
        let mut instances = self.instance_roles.write().await;
        self.bump();
        instances.clear();
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.read().await;
        stats.scope_entries = self.scope_roles.read().await.len();
        stats.instance_entries = self.instance_roles.read().await.len();
        stats
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    async fn record(&self, hit: bool) {
        let mut stats = self.stats.write().await;
        if hit {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
    }

    async fn record_discard(&self) {
        self.stats.write().await.discarded += 1;
    }

    async fn invalidate_scope(&self, user_id: Uuid, scope: ScopeRef) {
        let mut cache = self.scope_roles.write().await;
        self.bump();
        cache.remove(&(user_id, scope));
    }

    async fn invalidate_instance(&self, user_id: Uuid, instance: InstanceRef) {
        let mut cache = self.instance_roles.write().await;
        self.bump();
        cache.remove(&(user_id, instance));
    }
}

#[async_trait]
impl<S: MembershipStore> MembershipStore for CachedMembershipStore<S> {
    async fn scope_role(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<Option<ScopeRole>> {
        let key = (user_id, scope);
        let cached = self.scope_roles.read().await.get(&key).copied();
        if let Some(role) = cached {
            self.record(true).await;
            tracing::debug!(
                user_id = %user_id,
                target = %scope,
                "Scope role served from cache"
            );
            return Ok(role);
        }
        self.record(false).await;

        let started = self.generation();
        let role = self.inner.scope_role(user_id, scope).await?;
        let stored = {
            let mut cache = self.scope_roles.write().await;
            let current = self.generation() == started;
            if current && cache.len() < self.capacity {
                cache.insert(key, role);
            }
            current
        };
        if !stored {
            self.record_discard().await;
            tracing::debug!(
                user_id = %user_id,
                target = %scope,
                "Scope role invalidated during lookup"
            );
        }
        Ok(role)
    }

    async fn instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> StoreResult<Option<InstanceRole>> {
        let key = (user_id, instance);
        let cached = self.instance_roles.read().await.get(&key).copied();
        if let Some(role) = cached {
            self.record(true).await;
            tracing::debug!(
                user_id = %user_id,
                target = %instance,
                "Instance role served from cache"
            );
            return Ok(role);
        }
        self.record(false).await;

        let started = self.generation();
        let role = self.inner.instance_role(user_id, instance).await?;
        let stored = {
            let mut cache = self.instance_roles.write().await;
            let current = self.generation() == started;
            if current && cache.len() < self.capacity {
                cache.insert(key, role);
            }
            current
        };
        if !stored {
            self.record_discard().await;
            tracing::debug!(
                user_id = %user_id,
                target = %instance,
                "Instance role invalidated during lookup"
            );
        }
        Ok(role)
    }

    async fn add_scope_member(&self, membership: ScopeMembership) -> StoreResult<()> {
        let (user_id, scope) = (membership.user_id, membership.scope);
        let result = self.inner.add_scope_member(membership).await;
        self.invalidate_scope(user_id, scope).await;
        result
    }

    async fn add_instance_member(&self, membership: InstanceMembership) -> StoreResult<()> {
        let (user_id, instance) = (membership.user_id, membership.instance);
        let result = self.inner.add_instance_member(membership).await;
        self.invalidate_instance(user_id, instance).await;
        result
    }

    async fn change_scope_role(
        &self,
        user_id: Uuid,
        scope: ScopeRef,
        role: ScopeRole,
    ) -> StoreResult<()> {
        let result = self.inner.change_scope_role(user_id, scope, role).await;
        self.invalidate_scope(user_id, scope).await;
        result
    }

    async fn change_instance_role(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
        role: InstanceRole,
    ) -> StoreResult<()> {
        let result = self.inner.change_instance_role(user_id, instance, role).await;
        self.invalidate_instance(user_id, instance).await;
        result
    }

    async fn remove_scope_member(&self, user_id: Uuid, scope: ScopeRef) -> StoreResult<()> {
        let result = self.inner.remove_scope_member(user_id, scope).await;
        self.invalidate_scope(user_id, scope).await;
        result
    }

    async fn remove_instance_member(
        &self,
        user_id: Uuid,
        instance: InstanceRef,
    ) -> StoreResult<()> {
        let result = self.inner.remove_instance_member(user_id, instance).await;
        self.invalidate_instance(user_id, instance).await;
        result
    }
}
