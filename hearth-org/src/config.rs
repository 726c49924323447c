//! Resolver configuration.
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development.

use hearth_rbac::{Policy, RbacError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_CAPACITY;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Policy document could not be read.
    #[error("Failed to read policy document {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Policy document is invalid.
    #[error("Invalid policy document: {0}")]
    Policy(#[from] RbacError),
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Whether role lookups go through a cache.
    ///
    /// Off by default. A cached resolver only sees writes made through it or
    /// reported with [`MembershipResolver::invalidate_user`].
    ///
    /// [`MembershipResolver::invalidate_user`]: crate::MembershipResolver::invalidate_user
    pub cache_enabled: bool,

    /// Maximum cached lookups per role family.
    pub cache_capacity: usize,

    /// JSON policy document replacing the built-in policy.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            policy_path: None,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HEARTH_ROLE_CACHE`: Whether to cache role lookups (default: false)
    /// - `HEARTH_ROLE_CACHE_CAPACITY`: Maximum cached lookups (default: 10000)
    /// - `HEARTH_POLICY_PATH`: JSON policy document (default: built-in policy)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            cache_enabled: var("HEARTH_ROLE_CACHE")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(default.cache_enabled),
            cache_capacity: var("HEARTH_ROLE_CACHE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.cache_capacity),
            policy_path: var("HEARTH_POLICY_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .or(default.policy_path),
        }
    }

    /// Load the configured policy, or the built-in one.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the document cannot be read and
    /// [`ConfigError::Policy`] if it does not describe a complete policy.
    pub fn load_policy(&self) -> Result<Policy, ConfigError> {
        let Some(path) = &self.policy_path else {
            return Ok(Policy::builtin()?);
        };
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let policy = Policy::from_json(&json)?;
        tracing::debug!(path = %path.display(), "Loaded policy document");
        Ok(policy)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
