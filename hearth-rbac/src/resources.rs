//! # Resource Types
//!
//! Defines the protected nouns of the Hearth inventory platform.
//! Every resource belongs to exactly one family:
//!
//! - **Scope resources** (organization, project): access comes from a role held
//!   over the whole scope.
//! - **Instance resources** (location, item): access can additionally come from
//!   a grant on one specific record.

use serde::{Deserialize, Serialize};

/// Family a resource belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFamily {
    /// Governed by scope-wide membership.
    Scope,
    /// Governed by per-instance ACL grants.
    Instance,
}

impl ResourceFamily {
    /// Get the string representation of the family.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceFamily::Scope => "scope",
            ResourceFamily::Instance => "instance",
        }
    }
}

/// Any resource that can appear in a permission key.
///
/// # Example
///
/// ```
/// use hearth_rbac::resources::{Resource, ResourceFamily};
///
/// assert_eq!(Resource::Project.family(), ResourceFamily::Scope);
/// assert_eq!(Resource::Location.family(), ResourceFamily::Instance);
/// assert_eq!(Resource::Item.as_str(), "item");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Organization (scope).
    Organization,
    /// Project within an organization (scope).
    Project,
    /// Storage location (instance).
    Location,
    /// Household item kept in a location (instance).
    Item,
}

impl Resource {
    /// Get the canonical string used in permission keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Organization => "organization",
            Resource::Project => "project",
            Resource::Location => "location",
            Resource::Item => "item",
        }
    }

    /// Get the family this resource belongs to.
    pub fn family(&self) -> ResourceFamily {
        match self {
            Resource::Organization | Resource::Project => ResourceFamily::Scope,
            Resource::Location | Resource::Item => ResourceFamily::Instance,
        }
    }

    /// Narrow to a scope resource, if this is one.
    pub fn as_scope(&self) -> Option<ScopeResource> {
        match self {
            Resource::Organization => Some(ScopeResource::Organization),
            Resource::Project => Some(ScopeResource::Project),
            _ => None,
        }
    }

    /// Narrow to an instance resource, if this is one.
    pub fn as_instance(&self) -> Option<InstanceResource> {
        match self {
            Resource::Location => Some(InstanceResource::Location),
            Resource::Item => Some(InstanceResource::Item),
            _ => None,
        }
    }

    /// Parse resource from its canonical string.
    ///
    /// Only the exact canonical spelling is accepted: keys are persisted and
    /// logged, so aliases would make two strings mean the same permission.
    ///
    /// # Example
    ///
    /// ```
    /// use hearth_rbac::resources::Resource;
    ///
    /// assert_eq!(Resource::parse("location"), Some(Resource::Location));
    /// assert_eq!(Resource::parse("locations"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "organization" => Some(Resource::Organization),
            "project" => Some(Resource::Project),
            "location" => Some(Resource::Location),
            "item" => Some(Resource::Item),
            _ => None,
        }
    }

    /// Get all resources.
    pub fn all() -> &'static [Resource] {
        &[
            Resource::Organization,
            Resource::Project,
            Resource::Location,
            Resource::Item,
        ]
    }

    /// Get all resources of one family.
    pub fn for_family(family: ResourceFamily) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|r| r.family() == family)
            .collect()
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource whose access is governed by scope-wide membership.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ScopeResource {
    /// Organization scope.
    Organization,
    /// Project scope.
    Project,
}

impl ScopeResource {
    /// Get all scope resources.
    pub fn all() -> &'static [ScopeResource] {
        &[ScopeResource::Organization, ScopeResource::Project]
    }

    /// Get the canonical string.
    pub fn as_str(&self) -> &'static str {
        Resource::from(*self).as_str()
    }
}

impl From<ScopeResource> for Resource {
    fn from(value: ScopeResource) -> Self {
        match value {
            ScopeResource::Organization => Resource::Organization,
            ScopeResource::Project => Resource::Project,
        }
    }
}

/// A resource whose access can be granted per instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InstanceResource {
    /// A single storage location.
    Location,
    /// A single household item.
    Item,
}

impl InstanceResource {
    /// Get all instance resources.
    pub fn all() -> &'static [InstanceResource] {
        &[InstanceResource::Location, InstanceResource::Item]
    }

    /// Get the canonical string.
    pub fn as_str(&self) -> &'static str {
        Resource::from(*self).as_str()
    }
}

impl From<InstanceResource> for Resource {
    fn from(value: InstanceResource) -> Self {
        match value {
            InstanceResource::Location => Resource::Location,
            InstanceResource::Item => Resource::Item,
        }
    }
}
