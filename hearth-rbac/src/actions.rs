//! # Actions
//!
//! Defines the verbs that can be applied to resources.
//!
//! Generic actions apply to every resource. Membership actions belong to one
//! resource family: scope resources manage members and admins, instance
//! resources manage editors and viewers.
//!
//! Besides the unified [`Action`] enum, each family gets a narrowed enum
//! ([`ScopeAction`], [`InstanceAction`]) so that typed key construction can only
//! name actions the matrix allows. [`InstanceGrantAction`] narrows further to
//! the actions an instance role may be granted.

use serde::{Deserialize, Serialize};

/// Kind of an action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Valid on every resource.
    Generic,
    /// Only valid on scope resources.
    Scope,
    /// Only valid on instance resources.
    Instance,
}

/// Every action known to the permission matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// View one resource.
    Read,
    /// Browse the collection.
    List,
    /// Add a new resource to the collection.
    Create,
    /// Modify an existing resource.
    Update,
    /// Remove a resource.
    Delete,
    /// Add a member to a scope.
    AddMember,
    /// Remove a member from a scope.
    RemoveMember,
    /// Promote or add an admin to a scope.
    AddAdmin,
    /// Demote or remove an admin from a scope.
    RemoveAdmin,
    /// Grant editor on an instance.
    AddEditor,
    /// Revoke editor on an instance.
    RemoveEditor,
    /// Grant viewer on an instance.
    AddViewer,
    /// Revoke viewer on an instance.
    RemoveViewer,
}

/// Generic actions in matrix order.
pub const GENERIC_ACTIONS: [Action; 5] = [
    Action::Read,
    Action::List,
    Action::Create,
    Action::Update,
    Action::Delete,
];

/// Scope-family actions in matrix order.
pub const SCOPE_FAMILY_ACTIONS: [Action; 4] = [
    Action::AddMember,
    Action::RemoveMember,
    Action::AddAdmin,
    Action::RemoveAdmin,
];

/// Instance-family actions in matrix order.
pub const INSTANCE_FAMILY_ACTIONS: [Action; 4] = [
    Action::AddEditor,
    Action::RemoveEditor,
    Action::AddViewer,
    Action::RemoveViewer,
];

impl Action {
    /// Get the canonical string used in permission keys.
    ///
    /// # Example
    ///
    /// ```
    /// use hearth_rbac::actions::Action;
    ///
    /// assert_eq!(Action::Delete.as_str(), "delete");
    /// assert_eq!(Action::AddEditor.as_str(), "add_editor");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::AddMember => "add_member",
            Action::RemoveMember => "remove_member",
            Action::AddAdmin => "add_admin",
            Action::RemoveAdmin => "remove_admin",
            Action::AddEditor => "add_editor",
            Action::RemoveEditor => "remove_editor",
            Action::AddViewer => "add_viewer",
            Action::RemoveViewer => "remove_viewer",
        }
    }

    /// Parse action from its canonical string.
    ///
    /// Unlike free-text command parsing, no aliases are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Action::Read),
            "list" => Some(Action::List),
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            "add_member" => Some(Action::AddMember),
            "remove_member" => Some(Action::RemoveMember),
            "add_admin" => Some(Action::AddAdmin),
            "remove_admin" => Some(Action::RemoveAdmin),
            "add_editor" => Some(Action::AddEditor),
            "remove_editor" => Some(Action::RemoveEditor),
            "add_viewer" => Some(Action::AddViewer),
            "remove_viewer" => Some(Action::RemoveViewer),
            _ => None,
        }
    }

    /// Get the kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Read | Action::List | Action::Create | Action::Update | Action::Delete => {
                ActionKind::Generic
            }
            Action::AddMember | Action::RemoveMember | Action::AddAdmin | Action::RemoveAdmin => {
                ActionKind::Scope
            }
            Action::AddEditor
            | Action::RemoveEditor
            | Action::AddViewer
            | Action::RemoveViewer => ActionKind::Instance,
        }
    }

    /// Check if this action targets the collection rather than one instance.
    ///
    /// Instance roles can never be granted collection actions.
    pub fn is_collection_action(&self) -> bool {
        matches!(self, Action::Create | Action::List)
    }

    /// Check if this action changes who holds a role.
    pub fn is_membership_change(&self) -> bool {
        !matches!(self.kind(), ActionKind::Generic)
    }

    /// Check if this is a read-only action.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Action::Read | Action::List)
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        GENERIC_ACTIONS
            .iter()
            .chain(SCOPE_FAMILY_ACTIONS.iter())
            .chain(INSTANCE_FAMILY_ACTIONS.iter())
            .copied()
            .collect()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions valid on scope resources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScopeAction {
    /// See [`Action::Read`].
    Read,
    /// See [`Action::List`].
    List,
    /// See [`Action::Create`].
    Create,
    /// See [`Action::Update`].
    Update,
    /// See [`Action::Delete`].
    Delete,
    /// See [`Action::AddMember`].
    AddMember,
    /// See [`Action::RemoveMember`].
    RemoveMember,
    /// See [`Action::AddAdmin`].
    AddAdmin,
    /// See [`Action::RemoveAdmin`].
    RemoveAdmin,
}

impl From<ScopeAction> for Action {
    fn from(value: ScopeAction) -> Self {
        match value {
            ScopeAction::Read => Action::Read,
            ScopeAction::List => Action::List,
            ScopeAction::Create => Action::Create,
            ScopeAction::Update => Action::Update,
            ScopeAction::Delete => Action::Delete,
            ScopeAction::AddMember => Action::AddMember,
            ScopeAction::RemoveMember => Action::RemoveMember,
            ScopeAction::AddAdmin => Action::AddAdmin,
            ScopeAction::RemoveAdmin => Action::RemoveAdmin,
        }
    }
}

/// Actions valid on instance resources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InstanceAction {
    /// See [`Action::Read`].
    Read,
    /// See [`Action::List`].
    List,
    /// See [`Action::Create`].
    Create,
    /// See [`Action::Update`].
    Update,
    /// See [`Action::Delete`].
    Delete,
    /// See [`Action::AddEditor`].
    AddEditor,
    /// See [`Action::RemoveEditor`].
    RemoveEditor,
    /// See [`Action::AddViewer`].
    AddViewer,
    /// See [`Action::RemoveViewer`].
    RemoveViewer,
}

impl From<InstanceAction> for Action {
    fn from(value: InstanceAction) -> Self {
        match value {
            InstanceAction::Read => Action::Read,
            InstanceAction::List => Action::List,
            InstanceAction::Create => Action::Create,
            InstanceAction::Update => Action::Update,
            InstanceAction::Delete => Action::Delete,
            InstanceAction::AddEditor => Action::AddEditor,
            InstanceAction::RemoveEditor => Action::RemoveEditor,
            InstanceAction::AddViewer => Action::AddViewer,
            InstanceAction::RemoveViewer => Action::RemoveViewer,
        }
    }
}

/// Actions an instance role may be granted.
///
/// This is [`InstanceAction`] without `Create` and `List`: those act on the
/// collection, and an instance role only governs the record it is attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InstanceGrantAction {
    /// See [`Action::Read`].
    Read,
    /// See [`Action::Update`].
    Update,
    /// See [`Action::Delete`].
    Delete,
    /// See [`Action::AddEditor`].
    AddEditor,
    /// See [`Action::RemoveEditor`].
    RemoveEditor,
    /// See [`Action::AddViewer`].
    AddViewer,
    /// See [`Action::RemoveViewer`].
    RemoveViewer,
}

impl InstanceGrantAction {
    /// Narrow an action to one an instance role may hold.
    ///
    /// Returns `None` for collection actions and scope-family actions.
    pub fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::Read => Some(Self::Read),
            Action::Update => Some(Self::Update),
            Action::Delete => Some(Self::Delete),
            Action::AddEditor => Some(Self::AddEditor),
            Action::RemoveEditor => Some(Self::RemoveEditor),
            Action::AddViewer => Some(Self::AddViewer),
            Action::RemoveViewer => Some(Self::RemoveViewer),
            _ => None,
        }
    }
}

impl From<InstanceGrantAction> for InstanceAction {
    fn from(value: InstanceGrantAction) -> Self {
        match value {
            InstanceGrantAction::Read => InstanceAction::Read,
            InstanceGrantAction::Update => InstanceAction::Update,
            InstanceGrantAction::Delete => InstanceAction::Delete,
            InstanceGrantAction::AddEditor => InstanceAction::AddEditor,
            InstanceGrantAction::RemoveEditor => InstanceAction::RemoveEditor,
            InstanceGrantAction::AddViewer => InstanceAction::AddViewer,
            InstanceGrantAction::RemoveViewer => InstanceAction::RemoveViewer,
        }
    }
}

impl From<InstanceGrantAction> for Action {
    fn from(value: InstanceGrantAction) -> Self {
        Action::from(InstanceAction::from(value))
    }
}
