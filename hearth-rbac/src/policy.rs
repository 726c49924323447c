//! # Policy
//!
//! A [`Policy`] bundles the RBAC and ACL grant tables. It is built once at
//! startup, either from the built-in tables or from a JSON policy document,
//! and then shared read-only (typically behind an `Arc`).
//!
//! ## Built-in policy
//!
//! ```text
//! organization admin   org: everything   project: everything   location/item: CRUD + list
//! organization member  org/project/location/item: read + list
//! project admin        project: everything except create   location/item: CRUD + list
//! project member       project: read + list   location: create/read/list
//!                      item: create/read/list/update
//!
//! location/item owner  read, update, delete, add/remove editor, add/remove viewer
//! location editor      read, update, add/remove viewer
//! item editor          read, update
//! location/item viewer read
//! ```
//!
//! ## Policy documents
//!
//! ```json
//! {
//!   "rbac": {
//!     "organization": { "admin": ["read:organization"], "member": [] },
//!     "project": { ... }
//!   },
//!   "acl": {
//!     "location": { "owner": ["delete:location"], "editor": [], "viewer": [] },
//!     "item": { ... }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::actions::{InstanceAction as I, InstanceGrantAction as G, ScopeAction as S};
use crate::error::{RbacError, RbacResult};
use crate::grants::{AclTable, RbacTable};
use crate::permissions::{PermissionKey, PermissionSet};
use crate::resources::{InstanceResource, Resource, ScopeResource};
use crate::roles::{InstanceRole, ScopeRole};

const CRUD: [S; 5] = [S::Create, S::Read, S::List, S::Update, S::Delete];
const READ_LIST: [S; 2] = [S::Read, S::List];
const MANAGE_MEMBERS: [S; 4] = [S::AddMember, S::RemoveMember, S::AddAdmin, S::RemoveAdmin];
const INSTANCE_CRUD: [I; 5] = [I::Create, I::Read, I::List, I::Update, I::Delete];
const INSTANCE_READ_LIST: [I; 2] = [I::Read, I::List];

/// The complete set of grant tables.
#[derive(Debug, Clone)]
pub struct Policy {
    rbac: RbacTable,
    acl: AclTable,
}

impl Policy {
    /// Assemble a policy from already-built tables.
    pub fn new(rbac: RbacTable, acl: AclTable) -> Self {
        Self { rbac, acl }
    }

    /// Scope role grant table.
    pub fn rbac(&self) -> &RbacTable {
        &self.rbac
    }

    /// Instance role grant table.
    pub fn acl(&self) -> &AclTable {
        &self.acl
    }

    /// Keys granted to a scope role, if the table has the entry.
    pub fn scope_grants(&self, resource: ScopeResource, role: ScopeRole) -> Option<&PermissionSet> {
        self.rbac.grants(resource, role)
    }

    /// Keys granted to an instance role, if the table has the entry.
    pub fn instance_grants(
        &self,
        resource: InstanceResource,
        role: InstanceRole,
    ) -> Option<&PermissionSet> {
        self.acl.grants(resource, role)
    }

    /// Build the built-in policy.
    ///
    /// # Errors
    ///
    /// Only if the tables below are incomplete, which the unit tests rule out.
    pub fn builtin() -> RbacResult<Self> {
        use ScopeResource::{Organization, Project};

        let on = |resource: InstanceResource, actions: &[I]| -> Vec<PermissionKey> {
            actions
                .iter()
                .map(|&a| PermissionKey::instance(resource, a))
                .collect()
        };
        let scope_on = |resource: ScopeResource, actions: &[S]| -> Vec<PermissionKey> {
            actions
                .iter()
                .map(|&a| PermissionKey::scope(resource, a))
                .collect()
        };

        let rbac = RbacTable::builder()
            // organization admin cascades into projects, locations and items
            .grant_actions(Organization, ScopeRole::Admin, [S::Read, S::List, S::Update, S::Delete])
            .grant_actions(Organization, ScopeRole::Admin, MANAGE_MEMBERS)
            .grant(Organization, ScopeRole::Admin, scope_on(Project, &CRUD))
            .grant(Organization, ScopeRole::Admin, scope_on(Project, &MANAGE_MEMBERS))
            .grant(Organization, ScopeRole::Admin, on(InstanceResource::Location, &INSTANCE_CRUD))
            .grant(Organization, ScopeRole::Admin, on(InstanceResource::Item, &INSTANCE_CRUD))
            .grant_actions(Organization, ScopeRole::Member, READ_LIST)
            .grant(Organization, ScopeRole::Member, scope_on(Project, &READ_LIST))
            .grant(
                Organization,
                ScopeRole::Member,
                on(InstanceResource::Location, &INSTANCE_READ_LIST),
            )
            .grant(Organization, ScopeRole::Member, on(InstanceResource::Item, &INSTANCE_READ_LIST))
            .grant_actions(Project, ScopeRole::Admin, [S::Read, S::List, S::Update, S::Delete])
            .grant_actions(Project, ScopeRole::Admin, MANAGE_MEMBERS)
            .grant(Project, ScopeRole::Admin, on(InstanceResource::Location, &INSTANCE_CRUD))
            .grant(Project, ScopeRole::Admin, on(InstanceResource::Item, &INSTANCE_CRUD))
            .grant_actions(Project, ScopeRole::Member, READ_LIST)
            .grant(
                Project,
                ScopeRole::Member,
                on(InstanceResource::Location, &[I::Create, I::Read, I::List]),
            )
            .grant(
                Project,
                ScopeRole::Member,
                on(InstanceResource::Item, &[I::Create, I::Read, I::List, I::Update]),
            )
            .build()?;

        let owner = [
            G::Read,
            G::Update,
            G::Delete,
            G::AddEditor,
            G::RemoveEditor,
            G::AddViewer,
            G::RemoveViewer,
        ];
        let acl = AclTable::builder()
            .grant(InstanceResource::Location, InstanceRole::Owner, owner)
            .grant(
                InstanceResource::Location,
                InstanceRole::Editor,
                [G::Read, G::Update, G::AddViewer, G::RemoveViewer],
            )
            .grant(InstanceResource::Location, InstanceRole::Viewer, [G::Read])
            .grant(InstanceResource::Item, InstanceRole::Owner, owner)
            .grant(InstanceResource::Item, InstanceRole::Editor, [G::Read, G::Update])
            .grant(InstanceResource::Item, InstanceRole::Viewer, [G::Read])
            .build()?;

        Ok(Self::new(rbac, acl))
    }

    /// Build a policy from a JSON policy document.
    ///
    /// # Errors
    ///
    /// Any [`RbacError`] describing the first defect found in the document.
    pub fn from_json(json: &str) -> RbacResult<Self> {
        let document: PolicyDocument = serde_json::from_str(json)?;
        document.into_policy()
    }

    /// Export this policy as a document.
    pub fn to_document(&self) -> PolicyDocument {
        let mut document = PolicyDocument::default();
        for (resource, role, set) in self.rbac.entries() {
            document
                .rbac
                .entry(resource.as_str().to_string())
                .or_default()
                .insert(role.as_str().to_string(), key_strings(set));
        }
        for (resource, role, set) in self.acl.entries() {
            document
                .acl
                .entry(resource.as_str().to_string())
                .or_default()
                .insert(role.as_str().to_string(), key_strings(set));
        }
        document
    }
}

/// Serialized form of a policy: resource name → role name → key strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Scope role grants.
    #[serde(default)]
    pub rbac: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    /// Instance role grants.
    #[serde(default)]
    pub acl: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl PolicyDocument {
    /// Validate the document and build the policy.
    ///
    /// # Errors
    ///
    /// - [`RbacError::UnknownResource`] for a resource of the wrong family
    /// - [`RbacError::UnknownRole`] for an unknown role name
    /// - key parse errors from [`PermissionKey::parse`]
    /// - [`RbacError::CollectionActionOnInstance`] / [`RbacError::ForeignInstanceGrant`]
    ///   for invalid ACL grants
    /// - [`RbacError::MissingGrant`] when an entry is left out
    pub fn into_policy(self) -> RbacResult<Policy> {
        let mut rbac = RbacTable::builder();
        for (resource_name, roles) in &self.rbac {
            let resource = Resource::parse(resource_name)
                .and_then(|r| r.as_scope())
                .ok_or_else(|| RbacError::UnknownResource(resource_name.clone()))?;
            for (role_name, keys) in roles {
                let role = ScopeRole::parse(role_name)
                    .ok_or_else(|| RbacError::UnknownRole(role_name.clone()))?;
                rbac = rbac.grant(resource, role, parse_keys(keys)?);
            }
        }

        let mut acl = AclTable::builder();
        for (resource_name, roles) in &self.acl {
            let resource = Resource::parse(resource_name)
                .and_then(|r| r.as_instance())
                .ok_or_else(|| RbacError::UnknownResource(resource_name.clone()))?;
            for (role_name, keys) in roles {
                let role = InstanceRole::parse(role_name)
                    .ok_or_else(|| RbacError::UnknownRole(role_name.clone()))?;
                acl = acl.try_grant(resource, role, parse_keys(keys)?)?;
            }
        }

        Ok(Policy::new(rbac.build()?, acl.build()?))
    }
}

fn key_strings(set: &PermissionSet) -> Vec<String> {
    set.sorted().iter().map(|k| k.to_string()).collect()
}

fn parse_keys(keys: &[String]) -> RbacResult<Vec<PermissionKey>> {
    keys.iter().map(|k| PermissionKey::parse(k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;

    #[test]
    fn test_builtin_policy_builds() {
        let policy = Policy::builtin().unwrap();
        for &resource in ScopeResource::all() {
            for &role in ScopeRole::all() {
                assert!(policy.scope_grants(resource, role).is_some());
            }
        }
        for &resource in InstanceResource::all() {
            for &role in InstanceRole::all() {
                assert!(policy.instance_grants(resource, role).is_some());
            }
        }
    }

    #[test]
    fn test_builtin_instance_roles_never_grant_collection_actions() {
        let policy = Policy::builtin().unwrap();
        for (resource, _role, set) in policy.acl().entries() {
            let create = PermissionKey::instance(resource, I::Create);
            let list = PermissionKey::instance(resource, I::List);
            assert!(!set.has(&create));
            assert!(!set.has(&list));
            assert!(set.iter().all(|k| !k.action().is_collection_action()));
        }
    }

    #[test]
    fn test_builtin_organization_admin_cascades() {
        let policy = Policy::builtin().unwrap();
        let admin = policy
            .scope_grants(ScopeResource::Organization, ScopeRole::Admin)
            .unwrap();
        for action in [
            S::Create,
            S::Read,
            S::Update,
            S::Delete,
            S::List,
            S::AddMember,
            S::RemoveMember,
            S::AddAdmin,
            S::RemoveAdmin,
        ] {
            assert!(admin.has(&PermissionKey::scope(ScopeResource::Project, action)));
        }
        let project_admin = policy.scope_grants(ScopeResource::Project, ScopeRole::Admin).unwrap();
        assert!(admin.contains_all(project_admin));
    }

    #[test]
    fn test_builtin_owner_outranks_editor_outranks_viewer() {
        let policy = Policy::builtin().unwrap();
        for &resource in InstanceResource::all() {
            let owner = policy.instance_grants(resource, InstanceRole::Owner).unwrap();
            let editor = policy.instance_grants(resource, InstanceRole::Editor).unwrap();
            let viewer = policy.instance_grants(resource, InstanceRole::Viewer).unwrap();
            assert!(owner.contains_all(editor));
            assert!(editor.contains_all(viewer));
        }
    }

    #[test]
    fn test_document_round_trip() {
        let policy = Policy::builtin().unwrap();
        let json = serde_json::to_string(&policy.to_document()).unwrap();
        let rebuilt = Policy::from_json(&json).unwrap();
        assert_eq!(rebuilt.to_document(), policy.to_document());
    }

    fn document_with_location_owner(keys: &[&str]) -> String {
        let mut document = Policy::builtin().unwrap().to_document();
        document
            .acl
            .get_mut("location")
            .unwrap()
            .insert("owner".into(), keys.iter().map(|k| k.to_string()).collect());
        serde_json::to_string(&document).unwrap()
    }

    #[test]
    fn test_document_rejects_collection_grant_on_instance() {
        let json = document_with_location_owner(&["read:location", "create:location"]);
        let err = Policy::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            RbacError::CollectionActionOnInstance {
                action: Action::Create,
                ..
            }
        ));
    }

    #[test]
    fn test_document_rejects_invalid_keys() {
        let json = document_with_location_owner(&["add_admin:location"]);
        assert!(matches!(
            Policy::from_json(&json).unwrap_err(),
            RbacError::InvalidAction { .. }
        ));

        let json = document_with_location_owner(&["read:item"]);
        assert!(matches!(
            Policy::from_json(&json).unwrap_err(),
            RbacError::ForeignInstanceGrant { .. }
        ));

        let json = document_with_location_owner(&["read-location"]);
        assert!(matches!(
            Policy::from_json(&json).unwrap_err(),
            RbacError::MalformedKey(_)
        ));
    }

    #[test]
    fn test_document_rejects_missing_entries() {
        let mut document = Policy::builtin().unwrap().to_document();
        document.rbac.get_mut("project").unwrap().remove("member");
        let err = document.into_policy().unwrap_err();
        assert!(matches!(err, RbacError::MissingGrant { .. }));
    }

    #[test]
    fn test_document_rejects_unknown_names() {
        let mut document = Policy::builtin().unwrap().to_document();
        let location = document.acl.remove("location").unwrap();
        document.rbac.insert("location".into(), location);
        assert!(matches!(
            document.into_policy().unwrap_err(),
            RbacError::UnknownResource(_)
        ));

        let mut document = Policy::builtin().unwrap().to_document();
        document
            .rbac
            .get_mut("organization")
            .unwrap()
            .insert("owner".into(), Vec::new());
        assert!(matches!(
            document.into_policy().unwrap_err(),
            RbacError::UnknownRole(_)
        ));

        assert!(matches!(
            Policy::from_json("{not json").unwrap_err(),
            RbacError::Document(_)
        ));
    }
}
