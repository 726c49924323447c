//! # Permission Matrix
//!
//! Single source of truth for which actions exist on which resource.
//! A resource's entry is the generic actions followed by its family's
//! membership actions, and never contains the other family's actions.

use crate::actions::Action;
use crate::resources::{Resource, ResourceFamily};

const SCOPE_MATRIX: [Action; 9] = [
    Action::Read,
    Action::List,
    Action::Create,
    Action::Update,
    Action::Delete,
    Action::AddMember,
    Action::RemoveMember,
    Action::AddAdmin,
    Action::RemoveAdmin,
];

const INSTANCE_MATRIX: [Action; 9] = [
    Action::Read,
    Action::List,
    Action::Create,
    Action::Update,
    Action::Delete,
    Action::AddEditor,
    Action::RemoveEditor,
    Action::AddViewer,
    Action::RemoveViewer,
];

/// Get every valid action for a resource, in matrix order.
///
/// # Example
///
/// ```
/// use hearth_rbac::actions::Action;
/// use hearth_rbac::matrix::actions_for;
/// use hearth_rbac::resources::Resource;
///
/// assert!(actions_for(Resource::Project).contains(&Action::AddAdmin));
/// assert!(!actions_for(Resource::Location).contains(&Action::AddAdmin));
/// ```
pub fn actions_for(resource: Resource) -> &'static [Action] {
    match resource.family() {
        ResourceFamily::Scope => &SCOPE_MATRIX,
        ResourceFamily::Instance => &INSTANCE_MATRIX,
    }
}

/// Check whether `action` is declared on `resource`.
pub fn allows(resource: Resource, action: Action) -> bool {
    actions_for(resource).contains(&action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{
        ActionKind, GENERIC_ACTIONS, INSTANCE_FAMILY_ACTIONS, SCOPE_FAMILY_ACTIONS,
    };

    #[test]
    fn test_generic_actions_everywhere() {
        for resource in Resource::all() {
            for action in GENERIC_ACTIONS {
                assert!(allows(*resource, action), "{resource} lacks {action}");
            }
        }
    }

    #[test]
    fn test_family_actions_never_cross() {
        for resource in Resource::all() {
            for action in actions_for(*resource) {
                match (resource.family(), action.kind()) {
                    (_, ActionKind::Generic) => {}
                    (ResourceFamily::Scope, kind) => assert_eq!(kind, ActionKind::Scope),
                    (ResourceFamily::Instance, kind) => assert_eq!(kind, ActionKind::Instance),
                }
            }
        }
    }

    #[test]
    fn test_matrix_is_generic_union_family() {
        let scope: Vec<Action> = GENERIC_ACTIONS
            .iter()
            .chain(SCOPE_FAMILY_ACTIONS.iter())
            .copied()
            .collect();
        assert_eq!(actions_for(Resource::Organization), scope.as_slice());
        assert_eq!(actions_for(Resource::Project), scope.as_slice());

        let instance: Vec<Action> = GENERIC_ACTIONS
            .iter()
            .chain(INSTANCE_FAMILY_ACTIONS.iter())
            .copied()
            .collect();
        assert_eq!(actions_for(Resource::Location), instance.as_slice());
        assert_eq!(actions_for(Resource::Item), instance.as_slice());
    }

    #[test]
    fn test_cross_family_rejected() {
        assert!(!allows(Resource::Organization, Action::AddViewer));
        assert!(!allows(Resource::Project, Action::RemoveEditor));
        assert!(!allows(Resource::Location, Action::AddMember));
        assert!(!allows(Resource::Item, Action::RemoveAdmin));
    }
}
