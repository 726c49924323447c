//! # Permissions
//!
//! The permission key registry. A [`PermissionKey`] is a validated
//! (resource, action) pair whose canonical form is `"<action>:<resource>"`,
//! e.g. `delete:location`.
//!
//! Keys can only be obtained from the registry: the typed constructors accept
//! only the action enum of the resource's family, and the untyped constructor
//! checks the permission matrix and fails fast.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::actions::{Action, InstanceAction, ScopeAction};
use crate::error::{RbacError, RbacResult};
use crate::matrix;
use crate::resources::{InstanceResource, Resource, ScopeResource};

/// A canonical permission key.
///
/// # Example
///
/// ```
/// use hearth_rbac::actions::{InstanceAction, ScopeAction};
/// use hearth_rbac::permissions::PermissionKey;
/// use hearth_rbac::resources::{InstanceResource, ScopeResource};
///
/// let key = PermissionKey::instance(InstanceResource::Location, InstanceAction::Delete);
/// assert_eq!(key.to_string(), "delete:location");
///
/// let key = PermissionKey::scope(ScopeResource::Project, ScopeAction::AddAdmin);
/// assert_eq!(key.to_string(), "add_admin:project");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionKey {
    resource: Resource,
    action: Action,
}

impl PermissionKey {
    /// Key for an action on a scope resource.
    pub fn scope(resource: ScopeResource, action: ScopeAction) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Key for an action on an instance resource.
    pub fn instance(resource: InstanceResource, action: InstanceAction) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Key for an arbitrary pair, validated against the permission matrix.
    ///
    /// # Errors
    ///
    /// [`RbacError::InvalidAction`] if the matrix does not declare `action`
    /// on `resource`. This is a programming defect, not a denial.
    ///
    /// # Example
    ///
    /// ```
    /// use hearth_rbac::actions::Action;
    /// use hearth_rbac::permissions::PermissionKey;
    /// use hearth_rbac::resources::Resource;
    ///
    /// assert!(PermissionKey::new(Resource::Location, Action::AddViewer).is_ok());
    /// assert!(PermissionKey::new(Resource::Location, Action::AddAdmin).is_err());
    /// ```
    pub fn new(resource: Resource, action: Action) -> RbacResult<Self> {
        if !matrix::allows(resource, action) {
            return Err(RbacError::InvalidAction { resource, action });
        }
        Ok(Self { resource, action })
    }

    /// Resource this key protects.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Action this key permits.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Parse a canonical key string.
    ///
    /// # Errors
    ///
    /// [`RbacError::MalformedKey`] when the string is not `<action>:<resource>`,
    /// [`RbacError::UnknownAction`] / [`RbacError::UnknownResource`] for
    /// unknown names, and [`RbacError::InvalidAction`] for pairs outside the
    /// matrix.
    pub fn parse(s: &str) -> RbacResult<Self> {
        let (action, resource) = s
            .split_once(':')
            .ok_or_else(|| RbacError::MalformedKey(s.to_string()))?;
        if resource.contains(':') {
            return Err(RbacError::MalformedKey(s.to_string()));
        }
        let action =
            Action::parse(action).ok_or_else(|| RbacError::UnknownAction(action.to_string()))?;
        let resource = Resource::parse(resource)
            .ok_or_else(|| RbacError::UnknownResource(resource.to_string()))?;
        Self::new(resource, action)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action.as_str(), self.resource.as_str())
    }
}

impl FromStr for PermissionKey {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PermissionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PermissionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Get the key for a resource and action.
///
/// Same as [`PermissionKey::new`].
pub fn key_for(resource: Resource, action: Action) -> RbacResult<PermissionKey> {
    PermissionKey::new(resource, action)
}

/// Get every key declared on a resource, keyed by action.
///
/// # Example
///
/// ```
/// use hearth_rbac::actions::Action;
/// use hearth_rbac::permissions::keys_for;
/// use hearth_rbac::resources::Resource;
///
/// let keys = keys_for(Resource::Organization);
/// assert_eq!(keys[&Action::AddMember].to_string(), "add_member:organization");
/// assert!(!keys.contains_key(&Action::AddViewer));
/// ```
pub fn keys_for(resource: Resource) -> BTreeMap<Action, PermissionKey> {
    matrix::actions_for(resource)
        .iter()
        .map(|&action| (action, PermissionKey { resource, action }))
        .collect()
}

/// Get every valid key across all resources.
pub fn all_keys() -> Vec<PermissionKey> {
    Resource::all()
        .iter()
        .flat_map(|&resource| keys_for(resource).into_values())
        .collect()
}

/// A deduplicated set of permission keys granted to one role.
///
/// # Example
///
/// ```
/// use hearth_rbac::actions::ScopeAction;
/// use hearth_rbac::permissions::{PermissionKey, PermissionSet};
/// use hearth_rbac::resources::ScopeResource;
///
/// let read = PermissionKey::scope(ScopeResource::Project, ScopeAction::Read);
/// let mut set = PermissionSet::new();
/// set.add(read);
/// set.add(read);
///
/// assert!(set.has(&read));
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: HashSet<PermissionKey>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// Add a key to the set.
    pub fn add(&mut self, key: PermissionKey) {
        self.permissions.insert(key);
    }

    /// Add multiple keys to the set.
    pub fn add_all<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = PermissionKey>,
    {
        self.permissions.extend(keys);
    }

    /// Check if the set contains a key. Exact match only.
    pub fn has(&self, key: &PermissionKey) -> bool {
        self.permissions.contains(key)
    }

    /// Iterate over the keys in the set.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionKey> {
        self.permissions.iter()
    }

    /// Get the keys sorted in canonical order.
    pub fn sorted(&self) -> Vec<PermissionKey> {
        let mut keys: Vec<PermissionKey> = self.permissions.iter().copied().collect();
        keys.sort();
        keys
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().copied());
    }

    /// Get the count of keys.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Check if this set contains every key of another set.
    pub fn contains_all(&self, other: &PermissionSet) -> bool {
        other.permissions.is_subset(&self.permissions)
    }
}

impl FromIterator<PermissionKey> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = PermissionKey>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_string_shape() {
        let key = PermissionKey::scope(ScopeResource::Organization, ScopeAction::RemoveMember);
        assert_eq!(key.to_string(), "remove_member:organization");
        assert_eq!(key.resource(), Resource::Organization);
        assert_eq!(key.action(), Action::RemoveMember);
    }

    #[test]
    fn test_untyped_key_fails_fast() {
        let err = PermissionKey::new(Resource::Item, Action::AddMember).unwrap_err();
        assert!(matches!(
            err,
            RbacError::InvalidAction {
                resource: Resource::Item,
                action: Action::AddMember
            }
        ));
        assert_eq!(err.error_code(), "INVALID_ACTION");
    }

    #[test]
    fn test_key_parsing() {
        let key: PermissionKey = "delete:location".parse().unwrap();
        assert_eq!(
            key,
            PermissionKey::instance(InstanceResource::Location, InstanceAction::Delete)
        );

        assert!(matches!(
            PermissionKey::parse("delete"),
            Err(RbacError::MalformedKey(_))
        ));
        assert!(matches!(
            PermissionKey::parse("delete:location:abc"),
            Err(RbacError::MalformedKey(_))
        ));
        assert!(matches!(
            PermissionKey::parse("destroy:location"),
            Err(RbacError::UnknownAction(_))
        ));
        assert!(matches!(
            PermissionKey::parse("delete:garage"),
            Err(RbacError::UnknownResource(_))
        ));
        assert!(matches!(
            PermissionKey::parse("add_admin:location"),
            Err(RbacError::InvalidAction { .. })
        ));
    }

    #[test]
    fn test_keys_are_unique_and_complete() {
        let keys = all_keys();
        assert_eq!(keys.len(), 36);
        let unique: HashSet<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(unique.len(), keys.len());
        for key in &keys {
            assert_eq!(PermissionKey::parse(&key.to_string()).unwrap(), *key);
        }
    }

    #[test]
    fn test_keys_for_follows_matrix() {
        for resource in Resource::all() {
            let keys = keys_for(*resource);
            assert_eq!(keys.len(), matrix::actions_for(*resource).len());
            for (action, key) in keys {
                assert_eq!(key, key_for(*resource, action).unwrap());
            }
        }
    }

    #[test]
    fn test_key_serde() {
        let key = PermissionKey::scope(ScopeResource::Project, ScopeAction::Update);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"update:project\"");
        let back: PermissionKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        let bad: Result<PermissionKey, _> = serde_json::from_str("\"add_member:item\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_permission_set_merge() {
        let read = PermissionKey::scope(ScopeResource::Project, ScopeAction::Read);
        let list = PermissionKey::scope(ScopeResource::Project, ScopeAction::List);

        let mut set1: PermissionSet = [read].into_iter().collect();
        let set2: PermissionSet = [read, list].into_iter().collect();

        assert!(!set1.contains_all(&set2));
        set1.merge(&set2);
        assert_eq!(set1.len(), 2);
        assert!(set1.contains_all(&set2));
        assert_eq!(set1.sorted(), vec![read, list]);
    }
}
