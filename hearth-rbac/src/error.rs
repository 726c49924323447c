//! Error types for permission model construction
//!
//! Denials are never errors: the decision engine answers `false`. The errors
//! here describe programming or configuration defects, such as a key naming an
//! action the matrix does not declare, and are raised eagerly while keys,
//! grant tables or policy documents are being built.

use thiserror::Error;

use crate::actions::Action;
use crate::resources::Resource;

/// Permission model error types.
#[derive(Debug, Error)]
pub enum RbacError {
    /// The action is not declared on the resource in the permission matrix
    #[error("Action '{action}' is not valid on resource '{resource}'")]
    InvalidAction {
        /// Resource named by the key
        resource: Resource,
        /// Action that is not in the resource's matrix entry
        action: Action,
    },

    /// Unknown resource name
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Unknown action name
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Key string is not of the form `<action>:<resource>`
    #[error("Malformed permission key: {0}")]
    MalformedKey(String),

    /// Unknown role name
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A (resource, role) pair has no explicit grant entry
    #[error("No grant entry for role '{role}' on resource '{resource}'")]
    MissingGrant {
        /// Resource of the missing entry
        resource: Resource,
        /// Role of the missing entry
        role: String,
    },

    /// An instance role was granted a collection action (create or list)
    #[error(
        "Instance role '{role}' cannot be granted collection action '{action}' on '{resource}'"
    )]
    CollectionActionOnInstance {
        /// Instance resource
        resource: Resource,
        /// Offending role
        role: String,
        /// Offending action
        action: Action,
    },

    /// An instance role was granted a key on a different resource
    #[error("Instance role '{role}' on '{resource}' cannot be granted '{key}'")]
    ForeignInstanceGrant {
        /// Instance resource the role is attached to
        resource: Resource,
        /// Offending role
        role: String,
        /// Key naming another resource
        key: String,
    },

    /// Policy document could not be decoded
    #[error("Invalid policy document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Result type for permission model operations.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Get error code for logs and API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RbacError::InvalidAction { .. } => "INVALID_ACTION",
            RbacError::UnknownResource(_) => "UNKNOWN_RESOURCE",
            RbacError::UnknownAction(_) => "UNKNOWN_ACTION",
            RbacError::MalformedKey(_) => "MALFORMED_KEY",
            RbacError::UnknownRole(_) => "UNKNOWN_ROLE",
            RbacError::MissingGrant { .. } => "MISSING_GRANT",
            RbacError::CollectionActionOnInstance { .. } => "COLLECTION_ACTION_ON_INSTANCE",
            RbacError::ForeignInstanceGrant { .. } => "FOREIGN_INSTANCE_GRANT",
            RbacError::Document(_) => "INVALID_DOCUMENT",
        }
    }
}
