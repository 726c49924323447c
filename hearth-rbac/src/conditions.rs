//! # Conditions
//!
//! An optional second evaluation phase. Some permission keys can require
//! contextual checks (a feature flag, a plan tier, ownership of the record)
//! on top of the role grant. Each check is a predicate registered under a
//! [`ConditionTag`]; it receives the full [`EvaluationContext`] and can only
//! narrow a decision that the grant tables already allowed.
//!
//! A key that requires a tag with no registered predicate is denied.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::EvaluationContext;
use crate::permissions::PermissionKey;

/// Name of a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionTag(Cow<'static, str>);

impl ConditionTag {
    /// Tag from a static name.
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Tag from an owned name, e.g. one read from configuration.
    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Tag name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for ConditionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConditionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(ConditionTag::owned(String::deserialize(deserializer)?))
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered predicate.
pub type Predicate = Arc<dyn Fn(&EvaluationContext) -> bool + Send + Sync>;

/// Registry of predicates and the keys that require them.
///
/// # Example
///
/// ```
/// use hearth_rbac::actions::InstanceAction;
/// use hearth_rbac::conditions::{ConditionTag, Conditions};
/// use hearth_rbac::permissions::PermissionKey;
/// use hearth_rbac::resources::InstanceResource;
/// use hearth_rbac::{EvaluationContext, InstanceRole};
///
/// const NOT_ARCHIVED: ConditionTag = ConditionTag::new("not_archived");
/// let delete = PermissionKey::instance(InstanceResource::Item, InstanceAction::Delete);
///
/// let conditions = Conditions::new()
///     .register(NOT_ARCHIVED, |ctx: &EvaluationContext| {
///         ctx.attribute("archived").and_then(|v| v.as_bool()) != Some(true)
///     })
///     .require(delete, NOT_ARCHIVED);
///
/// let ctx = EvaluationContext::instance(InstanceResource::Item, Some(InstanceRole::Owner))
///     .with_attribute("archived", true);
/// assert!(conditions.check(&delete, &ctx).is_err());
/// ```
#[derive(Clone, Default)]
pub struct Conditions {
    predicates: HashMap<ConditionTag, Predicate>,
    requirements: HashMap<PermissionKey, Vec<ConditionTag>>,
}

impl fmt::Debug for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&ConditionTag> = self.predicates.keys().collect();
        tags.sort();
        f.debug_struct("Conditions")
            .field("predicates", &tags)
            .field("requirements", &self.requirements)
            .finish()
    }
}

impl Conditions {
    /// Empty registry: no key requires anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the predicate for a tag.
    pub fn register<F>(mut self, tag: ConditionTag, predicate: F) -> Self
    where
        F: Fn(&EvaluationContext) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(tag, Arc::new(predicate));
        self
    }

    /// Make `key` require `tag`.
    pub fn require(mut self, key: PermissionKey, tag: ConditionTag) -> Self {
        let tags = self.requirements.entry(key).or_default();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
        self
    }

    /// Tags required by a key, in registration order.
    pub fn required_for(&self, key: &PermissionKey) -> &[ConditionTag] {
        self.requirements.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if a predicate is registered for a tag.
    pub fn is_registered(&self, tag: &ConditionTag) -> bool {
        self.predicates.contains_key(tag)
    }

    /// Check if no key requires any condition.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Run every predicate `key` requires.
    ///
    /// # Errors
    ///
    /// The first tag whose predicate fails or is not registered.
    pub fn check(&self, key: &PermissionKey, ctx: &EvaluationContext) -> Result<(), ConditionTag> {
        for tag in self.required_for(key) {
            let Some(predicate) = self.predicates.get(tag) else {
                tracing::warn!(
                    condition = %tag,
                    key = %key,
                    "No predicate registered for required condition"
                );
                return Err(tag.clone());
            };
            if !predicate(ctx) {
                return Err(tag.clone());
            }
        }
        Ok(())
    }
}

/// Predicate passing when a boolean attribute is present and `true`.
pub fn attribute_is_true(name: &'static str) -> impl Fn(&EvaluationContext) -> bool + Send + Sync {
    move |ctx| ctx.attribute(name).and_then(serde_json::Value::as_bool) == Some(true)
}

/// Predicate passing when an attribute equals `expected`.
pub fn attribute_equals(
    name: &'static str,
    expected: impl Into<serde_json::Value>,
) -> impl Fn(&EvaluationContext) -> bool + Send + Sync {
    let expected = expected.into();
    move |ctx| ctx.attribute(name) == Some(&expected)
}
