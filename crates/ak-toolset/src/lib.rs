// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]

//! The action toolset seen by model adapters.
//!
//! A toolset owns the catalog of callable actions, the filters that select
//! them, and the engine that executes them under an entity. Adapters only
//! translate formats; everything behind [`ActionToolset`] is opaque to them.
//!
//! Implementations are shared across threads by callers, so the trait
//! requires `Send + Sync`. Whether concurrent `execute_action` calls are safe
//! for the downstream services is the implementation's concern.

pub mod schema;

use ak_error::AkResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub use schema::{
    MAX_INLINED_NODES, NormalizedParameters, normalize_parameters, truncate_description,
};

/// Opaque mapping returned by the execution engine.
pub type ActionInvocationResult = Map<String, Value>;

// ---------------------------------------------------------------------------
// ToolSchema
// ---------------------------------------------------------------------------

/// The callable interface of one action, as published by a toolset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Action name (e.g. `GITHUB_STAR_A_REPOSITORY`).
    pub name: String,
    /// Human-readable description, if the toolset has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema describing the action's parameters.
    pub parameters: Value,
}

impl ToolSchema {
    /// Create a schema with a description.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters,
        }
    }

    /// The description to show a model: the description, or the name when
    /// the description is missing or empty.
    pub fn display_description(&self) -> &str {
        match self.description.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => &self.name,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionFilter
// ---------------------------------------------------------------------------

/// Selects actions by name, app, and tag.
///
/// An empty filter means "no filter"; what that selects is up to the
/// toolset (usually every registered action).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFilter {
    /// Explicit action names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    /// Apps whose actions are selected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<String>,
    /// Tags that narrow app selections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ActionFilter {
    /// An empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select these actions by name.
    #[must_use]
    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Select every action of these apps.
    #[must_use]
    pub fn apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apps.extend(apps.into_iter().map(Into::into));
        self
    }

    /// Narrow app selections to actions carrying any of these tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// `true` when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.apps.is_empty() && self.tags.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ActionToolset
// ---------------------------------------------------------------------------

/// A catalog of actions plus the engine that executes them.
pub trait ActionToolset: Send + Sync {
    /// Entity used when a caller does not name one.
    fn default_entity_id(&self) -> &str;

    /// Check that `filter` is acceptable before schemas are requested.
    fn validate_tools(&self, filter: &ActionFilter) -> AkResult<()>;

    /// Schemas of the actions selected by `filter`, in a stable order.
    fn get_action_schemas(&self, filter: &ActionFilter) -> AkResult<Vec<ToolSchema>>;

    /// Execute `action` with `params` on behalf of `entity_id`.
    fn execute_action(
        &self,
        action: &str,
        params: Map<String, Value>,
        entity_id: &str,
    ) -> AkResult<ActionInvocationResult>;
}

impl<T: ActionToolset + ?Sized> ActionToolset for &T {
    fn default_entity_id(&self) -> &str {
        (**self).default_entity_id()
    }

    fn validate_tools(&self, filter: &ActionFilter) -> AkResult<()> {
        (**self).validate_tools(filter)
    }

    fn get_action_schemas(&self, filter: &ActionFilter) -> AkResult<Vec<ToolSchema>> {
        (**self).get_action_schemas(filter)
    }

    fn execute_action(
        &self,
        action: &str,
        params: Map<String, Value>,
        entity_id: &str,
    ) -> AkResult<ActionInvocationResult> {
        (**self).execute_action(action, params, entity_id)
    }
}

impl<T: ActionToolset + ?Sized> ActionToolset for Box<T> {
    fn default_entity_id(&self) -> &str {
        (**self).default_entity_id()
    }

    fn validate_tools(&self, filter: &ActionFilter) -> AkResult<()> {
        (**self).validate_tools(filter)
    }

    fn get_action_schemas(&self, filter: &ActionFilter) -> AkResult<Vec<ToolSchema>> {
        (**self).get_action_schemas(filter)
    }

    fn execute_action(
        &self,
        action: &str,
        params: Map<String, Value>,
        entity_id: &str,
    ) -> AkResult<ActionInvocationResult> {
        (**self).execute_action(action, params, entity_id)
    }
}

impl<T: ActionToolset + ?Sized> ActionToolset for Arc<T> {
    fn default_entity_id(&self) -> &str {
        (**self).default_entity_id()
    }

    fn validate_tools(&self, filter: &ActionFilter) -> AkResult<()> {
        (**self).validate_tools(filter)
    }

    fn get_action_schemas(&self, filter: &ActionFilter) -> AkResult<Vec<ToolSchema>> {
        (**self).get_action_schemas(filter)
    }

    fn execute_action(
        &self,
        action: &str,
        params: Map<String, Value>,
        entity_id: &str,
    ) -> AkResult<ActionInvocationResult> {
        (**self).execute_action(action, params, entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_description_prefers_description() {
        let s = ToolSchema::new("A", "does a", json!({}));
        assert_eq!(s.display_description(), "does a");
    }

    #[test]
    fn display_description_falls_back_to_name() {
        let mut s = ToolSchema::new("A", "", json!({}));
        assert_eq!(s.display_description(), "A");
        s.description = None;
        assert_eq!(s.display_description(), "A");
    }

    #[test]
    fn tool_schema_omits_missing_description() {
        let s = ToolSchema {
            name: "A".into(),
            description: None,
            parameters: json!({"type": "object"}),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert!(v.get("description").is_none());
        let back: ToolSchema = serde_json::from_value(v).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn filter_builder_collects_values() {
        let f = ActionFilter::new()
            .actions(["GITHUB_STAR_A_REPOSITORY"])
            .apps(vec!["slack".to_string()])
            .tags(["important"]);
        assert_eq!(f.actions, vec!["GITHUB_STAR_A_REPOSITORY"]);
        assert_eq!(f.apps, vec!["slack"]);
        assert_eq!(f.tags, vec!["important"]);
        assert!(!f.is_empty());
        assert!(ActionFilter::new().is_empty());
    }

    #[test]
    fn empty_filter_serializes_to_empty_object() {
        assert_eq!(serde_json::to_value(ActionFilter::new()).unwrap(), json!({}));
    }
}
