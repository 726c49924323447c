//! # Role-Grant Tables
//!
//! Policy is encoded in two immutable tables, one per role family:
//!
//! ```text
//! RbacTable: ScopeResource    × ScopeRole    → PermissionSet (may span resources)
//! AclTable:  InstanceResource × InstanceRole → PermissionSet (own resource only)
//! ```
//!
//! Tables are assembled with builders. `build()` rejects a table with any
//! (resource, role) pair left out, so an omission can never fall through to a
//! default at decision time. An explicit empty grant is allowed.

use std::collections::HashMap;

use crate::actions::{InstanceGrantAction, ScopeAction};
use crate::error::{RbacError, RbacResult};
use crate::permissions::{PermissionKey, PermissionSet};
use crate::resources::{InstanceResource, ScopeResource};
use crate::roles::{InstanceRole, ScopeRole};

/// Grants for scope roles.
#[derive(Debug, Clone)]
pub struct RbacTable {
    grants: HashMap<(ScopeResource, ScopeRole), PermissionSet>,
}

impl RbacTable {
    /// Start building a table.
    pub fn builder() -> RbacTableBuilder {
        RbacTableBuilder::default()
    }

    /// Get the keys granted to `role` on `resource`.
    pub fn grants(&self, resource: ScopeResource, role: ScopeRole) -> Option<&PermissionSet> {
        self.grants.get(&(resource, role))
    }

    /// Iterate over every entry.
    pub fn entries(&self) -> impl Iterator<Item = (ScopeResource, ScopeRole, &PermissionSet)> {
        self.grants.iter().map(|(&(r, role), set)| (r, role, set))
    }
}

/// Builder for [`RbacTable`].
///
/// # Example
///
/// ```
/// use hearth_rbac::actions::ScopeAction;
/// use hearth_rbac::grants::RbacTable;
/// use hearth_rbac::permissions::PermissionKey;
/// use hearth_rbac::resources::ScopeResource;
/// use hearth_rbac::ScopeRole;
///
/// let table = RbacTable::builder()
///     .grant_actions(ScopeResource::Organization, ScopeRole::Admin, [ScopeAction::Read])
///     .grant(
///         ScopeResource::Organization,
///         ScopeRole::Admin,
///         [PermissionKey::scope(ScopeResource::Project, ScopeAction::Delete)],
///     )
///     .grant(ScopeResource::Organization, ScopeRole::Member, [])
///     .grant(ScopeResource::Project, ScopeRole::Admin, [])
///     .grant(ScopeResource::Project, ScopeRole::Member, [])
///     .build()
///     .unwrap();
///
/// let admin = table.grants(ScopeResource::Organization, ScopeRole::Admin).unwrap();
/// assert_eq!(admin.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RbacTableBuilder {
    grants: HashMap<(ScopeResource, ScopeRole), PermissionSet>,
}

impl RbacTableBuilder {
    /// Grant keys to a scope role. Keys may name any resource.
    pub fn grant<I>(mut self, resource: ScopeResource, role: ScopeRole, keys: I) -> Self
    where
        I: IntoIterator<Item = PermissionKey>,
    {
        self.grants.entry((resource, role)).or_default().add_all(keys);
        self
    }

    /// Grant actions on the scope resource itself.
    pub fn grant_actions<I>(self, resource: ScopeResource, role: ScopeRole, actions: I) -> Self
    where
        I: IntoIterator<Item = ScopeAction>,
    {
        let keys: Vec<PermissionKey> = actions
            .into_iter()
            .map(|action| PermissionKey::scope(resource, action))
            .collect();
        self.grant(resource, role, keys)
    }

    /// Finish the table.
    ///
    /// # Errors
    ///
    /// [`RbacError::MissingGrant`] if some (resource, role) pair has no entry.
    pub fn build(self) -> RbacResult<RbacTable> {
        for &resource in ScopeResource::all() {
            for &role in ScopeRole::all() {
                if !self.grants.contains_key(&(resource, role)) {
                    return Err(RbacError::MissingGrant {
                        resource: resource.into(),
                        role: role.as_str().to_string(),
                    });
                }
            }
        }
        Ok(RbacTable {
            grants: self.grants,
        })
    }
}

/// Grants for instance roles.
#[derive(Debug, Clone)]
pub struct AclTable {
    grants: HashMap<(InstanceResource, InstanceRole), PermissionSet>,
}

impl AclTable {
    /// Start building a table.
    pub fn builder() -> AclTableBuilder {
        AclTableBuilder::default()
    }

    /// Get the keys granted to `role` on one instance of `resource`.
    pub fn grants(&self, resource: InstanceResource, role: InstanceRole) -> Option<&PermissionSet> {
        self.grants.get(&(resource, role))
    }

    /// Iterate over every entry.
    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (InstanceResource, InstanceRole, &PermissionSet)> {
        self.grants.iter().map(|(&(r, role), set)| (r, role, set))
    }
}

/// Builder for [`AclTable`].
///
/// Grants are expressed as [`InstanceGrantAction`]s on the role's own resource,
/// so neither a collection action nor a key on another resource can be
/// granted through the typed API.
#[derive(Debug, Default)]
pub struct AclTableBuilder {
    grants: HashMap<(InstanceResource, InstanceRole), PermissionSet>,
}

impl AclTableBuilder {
    /// Grant actions to an instance role.
    pub fn grant<I>(mut self, resource: InstanceResource, role: InstanceRole, actions: I) -> Self
    where
        I: IntoIterator<Item = InstanceGrantAction>,
    {
        let set = self.grants.entry((resource, role)).or_default();
        set.add_all(
            actions
                .into_iter()
                .map(|action| PermissionKey::instance(resource, action.into())),
        );
        self
    }

    /// Grant already-built keys to an instance role, checking each one.
    ///
    /// # Errors
    ///
    /// [`RbacError::ForeignInstanceGrant`] if a key names another resource and
    /// [`RbacError::CollectionActionOnInstance`] for `create`/`list` keys.
    pub fn try_grant<I>(
        self,
        resource: InstanceResource,
        role: InstanceRole,
        keys: I,
    ) -> RbacResult<Self>
    where
        I: IntoIterator<Item = PermissionKey>,
    {
        let mut actions = Vec::new();
        for key in keys {
            if key.resource() != resource.into() {
                return Err(RbacError::ForeignInstanceGrant {
                    resource: resource.into(),
                    role: role.as_str().to_string(),
                    key: key.to_string(),
                });
            }
            let action = InstanceGrantAction::from_action(key.action()).ok_or_else(|| {
                RbacError::CollectionActionOnInstance {
                    resource: resource.into(),
                    role: role.as_str().to_string(),
                    action: key.action(),
                }
            })?;
            actions.push(action);
        }
        Ok(self.grant(resource, role, actions))
    }

    /// Finish the table.
    ///
    /// # Errors
    ///
    /// [`RbacError::MissingGrant`] if some (resource, role) pair has no entry.
    pub fn build(self) -> RbacResult<AclTable> {
        for &resource in InstanceResource::all() {
            for &role in InstanceRole::all() {
                if !self.grants.contains_key(&(resource, role)) {
                    return Err(RbacError::MissingGrant {
                        resource: resource.into(),
                        role: role.as_str().to_string(),
                    });
                }
            }
        }
        Ok(AclTable {
            grants: self.grants,
        })
    }
}
