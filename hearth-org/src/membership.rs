//! Membership domain models
//!
//! A membership row links one user to one target with exactly one role.
//! Scope memberships target an organization or project; instance memberships
//! (ACL rows) target a single location or item.

use chrono::{DateTime, Utc};
use hearth_rbac::{InstanceResource, InstanceRole, ScopeResource, ScopeRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A specific organization or project.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use hearth_org::ScopeRef;
/// use hearth_rbac::ScopeResource;
///
/// let project = ScopeRef::Project(Uuid::now_v7());
/// assert_eq!(project.resource(), ScopeResource::Project);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ScopeRef {
    /// An organization by ID
    Organization(Uuid),
    /// A project by ID
    Project(Uuid),
}

impl ScopeRef {
    /// Build a reference from a resource type and ID.
    pub fn new(resource: ScopeResource, id: Uuid) -> Self {
        match resource {
            ScopeResource::Organization => Self::Organization(id),
            ScopeResource::Project => Self::Project(id),
        }
    }

    /// Resource type of the target.
    pub fn resource(&self) -> ScopeResource {
        match self {
            Self::Organization(_) => ScopeResource::Organization,
            Self::Project(_) => ScopeResource::Project,
        }
    }

    /// Target ID.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Organization(id) | Self::Project(id) => *id,
        }
    }
}

impl fmt::Display for ScopeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource().as_str(), self.id())
    }
}

/// A specific location or item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum InstanceRef {
    /// A location by ID
    Location(Uuid),
    /// An item by ID
    Item(Uuid),
}

impl InstanceRef {
    /// Build a reference from a resource type and ID.
    pub fn new(resource: InstanceResource, id: Uuid) -> Self {
        match resource {
            InstanceResource::Location => Self::Location(id),
            InstanceResource::Item => Self::Item(id),
        }
    }

    /// Resource type of the target.
    pub fn resource(&self) -> InstanceResource {
        match self {
            Self::Location(_) => InstanceResource::Location,
            Self::Item(_) => InstanceResource::Item,
        }
    }

    /// Target ID.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Location(id) | Self::Item(id) => *id,
        }
    }
}

impl fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource().as_str(), self.id())
    }
}

/// Either kind of membership target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum MembershipTarget {
    /// Scope target
    Scope(ScopeRef),
    /// Instance target
    Instance(InstanceRef),
}

impl From<ScopeRef> for MembershipTarget {
    fn from(value: ScopeRef) -> Self {
        Self::Scope(value)
    }
}

impl From<InstanceRef> for MembershipTarget {
    fn from(value: InstanceRef) -> Self {
        Self::Instance(value)
    }
}

impl fmt::Display for MembershipTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope(scope) => scope.fmt(f),
            Self::Instance(instance) => instance.fmt(f),
        }
    }
}

/// Scope membership linking a user to an organization or project.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use hearth_org::{ScopeMembership, ScopeRef};
/// use hearth_rbac::ScopeRole;
///
/// let org = ScopeRef::Organization(Uuid::now_v7());
/// let admin_id = Uuid::now_v7();
/// let membership = ScopeMembership::new(Uuid::now_v7(), org, ScopeRole::Member)
///     .with_granter(admin_id);
/// assert_eq!(membership.granted_by, Some(admin_id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScopeMembership {
    /// Unique membership ID
    pub id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Organization or project
    pub scope: ScopeRef,

    /// Role within the scope
    pub role: ScopeRole,

    /// When the role was granted
    pub granted_at: DateTime<Utc>,

    /// Who granted the role (if applicable)
    pub granted_by: Option<Uuid>,
}

impl ScopeMembership {
    /// Creates a new scope membership with a UUID v7 ID, granted now.
    pub fn new(user_id: Uuid, scope: ScopeRef, role: ScopeRole) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            scope,
            role,
            granted_at: Utc::now(),
            granted_by: None,
        }
    }

    /// Set who granted the role.
    pub fn with_granter(mut self, granter_id: Uuid) -> Self {
        self.granted_by = Some(granter_id);
        self
    }
}

/// Instance membership (an ACL row) linking a user to one location or item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceMembership {
    /// Unique membership ID
    pub id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Location or item
    pub instance: InstanceRef,

    /// Role on the instance
    pub role: InstanceRole,

    /// When the role was granted
    pub granted_at: DateTime<Utc>,

    /// Who granted the role (if applicable)
    pub granted_by: Option<Uuid>,
}

impl InstanceMembership {
    /// Creates a new instance membership with a UUID v7 ID, granted now.
    pub fn new(user_id: Uuid, instance: InstanceRef, role: InstanceRole) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            instance,
            role,
            granted_at: Utc::now(),
            granted_by: None,
        }
    }

    /// Set who granted the role.
    pub fn with_granter(mut self, granter_id: Uuid) -> Self {
        self.granted_by = Some(granter_id);
        self
    }
}
