//! Error types for membership storage and access checks
//!
//! Three layers, kept apart so callers can tell them apart:
//!
//! - [`StoreError`]: a membership store operation failed
//! - [`ResolveError`]: a role could not be determined (not the same as "no role")
//! - [`AccessError`]: a required permission was denied, or could not be decided

use hearth_rbac::{DecisionReason, PermissionKey};
use thiserror::Error;
use uuid::Uuid;

use crate::membership::MembershipTarget;

/// Membership store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing storage could not be reached
    #[error("Membership store unavailable: {0}")]
    Unavailable(String),

    /// The user already holds a role on the target
    #[error("User {user_id} already holds a role on {target}")]
    AlreadyMember {
        /// User ID
        user_id: Uuid,
        /// Target of the duplicate row
        target: MembershipTarget,
    },

    /// No membership row exists for the user on the target
    #[error("User {user_id} holds no role on {target}")]
    NotFound {
        /// User ID
        user_id: Uuid,
        /// Target that was looked up
        target: MembershipTarget,
    },

    /// Internal error
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Result type for membership store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Internal(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::AlreadyMember { .. } => 409,
            StoreError::NotFound { .. } => 404,
            StoreError::Unavailable(_) => 503,
            StoreError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "STORE_UNAVAILABLE",
            StoreError::AlreadyMember { .. } => "ALREADY_MEMBER",
            StoreError::NotFound { .. } => "MEMBERSHIP_NOT_FOUND",
            StoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// A role lookup failed.
///
/// Distinct from `Ok(None)`, which means the user holds no role.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The membership store returned an error
    #[error("Could not resolve role of user {user_id} on {target}: {source}")]
    Storage {
        /// User ID
        user_id: Uuid,
        /// Target whose role was being resolved
        target: MembershipTarget,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },
}

/// Result type for role resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Access check error types.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The permission was evaluated and denied
    #[error("Forbidden: {key} denied ({reason:?})")]
    Forbidden {
        /// Key that was required
        key: PermissionKey,
        /// Why it was denied
        reason: DecisionReason,
    },

    /// Roles could not be resolved, so nothing was decided
    #[error(transparent)]
    Resolution(#[from] ResolveError),
}

/// Result type for access checks.
pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    /// Check if this error should be logged at error level.
    ///
    /// Denials are expected and are not server errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AccessError::Resolution(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::Forbidden { .. } => 403,
            AccessError::Resolution(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::Forbidden { .. } => "FORBIDDEN",
            AccessError::Resolution(_) => "ACCESS_UNRESOLVED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::ScopeRef;
    use hearth_rbac::{ScopeAction, ScopeResource};

    #[test]
    fn test_access_error_codes() {
        let forbidden = AccessError::Forbidden {
            key: PermissionKey::scope(ScopeResource::Project, ScopeAction::Delete),
            reason: DecisionReason::NotGranted,
        };
        assert_eq!(forbidden.status_code(), 403);
        assert_eq!(forbidden.error_code(), "FORBIDDEN");
        assert!(!forbidden.is_server_error());
        assert!(forbidden.to_string().contains("delete:project"));

        let resolution = AccessError::from(ResolveError::Storage {
            user_id: Uuid::nil(),
            target: ScopeRef::Project(Uuid::nil()).into(),
            source: StoreError::Unavailable("connection refused".into()),
        });
        assert_eq!(resolution.status_code(), 500);
        assert_eq!(resolution.error_code(), "ACCESS_UNRESOLVED");
        assert!(resolution.is_server_error());
    }

    #[test]
    fn test_store_error_codes() {
        let err = StoreError::NotFound {
            user_id: Uuid::nil(),
            target: ScopeRef::Organization(Uuid::nil()).into(),
        };
        assert_eq!(err.status_code(), 404);
        assert!(!err.is_server_error());
        assert_eq!(StoreError::Unavailable("down".into()).status_code(), 503);
        assert_eq!(StoreError::Internal("bug".into()).error_code(), "INTERNAL_ERROR");
    }
}
