//! Role vocabularies
//!
//! Two independent vocabularies: scope roles are held over a whole
//! organization or project, instance roles on a single location or item.
//! Neither means anything outside its (user, resource type, resource id)
//! triple, and they are never unified into one role type because their grant
//! tables follow different rules.

use serde::{Deserialize, Serialize};

/// User role within a scope (organization or project).
///
/// The hierarchy is: Member < Admin
///
/// # Examples
///
/// ```
/// use hearth_rbac::ScopeRole;
///
/// assert!(ScopeRole::Admin > ScopeRole::Member);
/// assert_eq!(ScopeRole::parse("ADMIN"), Some(ScopeRole::Admin));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScopeRole {
    /// Regular member of the scope
    Member = 1,

    /// Manages the scope and its members
    Admin = 2,
}

impl ScopeRole {
    /// Check if this role has admin privileges.
    pub fn is_admin(&self) -> bool {
        *self >= ScopeRole::Admin
    }

    /// Parse role from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Get a human-readable display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Member => "Member",
            Self::Admin => "Admin",
        }
    }

    /// Get all scope roles.
    pub fn all() -> &'static [ScopeRole] {
        &[ScopeRole::Member, ScopeRole::Admin]
    }
}

/// User role on a single resource instance.
///
/// The hierarchy is: Viewer < Editor < Owner
///
/// # Examples
///
/// ```
/// use hearth_rbac::InstanceRole;
///
/// assert!(InstanceRole::Owner.can_share());
/// assert!(!InstanceRole::Viewer.can_edit());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InstanceRole {
    /// Read-only access to the instance
    Viewer = 1,

    /// Can modify the instance
    Editor = 2,

    /// Full control including deletion and sharing
    Owner = 3,
}

impl InstanceRole {
    /// Check if this role can edit the instance.
    pub fn can_edit(&self) -> bool {
        *self >= InstanceRole::Editor
    }

    /// Check if this role can hand out editor grants.
    pub fn can_share(&self) -> bool {
        *self >= InstanceRole::Owner
    }

    /// Parse role from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "editor" => Some(Self::Editor),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Owner => "owner",
        }
    }

    /// Get a human-readable display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Viewer => "Viewer",
            Self::Editor => "Editor",
            Self::Owner => "Owner",
        }
    }

    /// Get all instance roles.
    pub fn all() -> &'static [InstanceRole] {
        &[InstanceRole::Viewer, InstanceRole::Editor, InstanceRole::Owner]
    }
}
