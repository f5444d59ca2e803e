// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory action toolset used for local testing.
//!
//! Actions are registered with a handler closure instead of a remote API.
//! Every execution is recorded so tests can check dispatch order and
//! short-circuiting.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use ak_config::AdapterConfig;
use ak_error::{AkError, AkResult, ErrorCode};
use ak_toolset::{
    ActionFilter, ActionInvocationResult, ActionToolset, ToolSchema, truncate_description,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Handler invoked for an action: `(params, entity_id) -> result`.
pub type ActionHandler =
    Arc<dyn Fn(&Map<String, Value>, &str) -> AkResult<ActionInvocationResult> + Send + Sync>;

/// Static description of a registered action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Action name.
    pub name: String,
    /// App the action belongs to.
    pub app: String,
    /// Free-form tags used by filters.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Description published with the schema.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema of the parameters.
    pub parameters: Value,
}

impl ActionSpec {
    /// An action with an empty object schema.
    pub fn new(name: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app: app.into(),
            tags: Vec::new(),
            description: None,
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the parameter schema.
    #[must_use]
    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

/// One recorded `execute_action` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCall {
    /// Action name as requested.
    pub action: String,
    /// Parameters passed to the engine.
    pub params: Map<String, Value>,
    /// Entity the call ran under.
    pub entity_id: String,
}

struct RegisteredAction {
    spec: ActionSpec,
    handler: ActionHandler,
}

/// An [`ActionToolset`] backed by closures.
pub struct InMemoryToolset {
    entity_id: String,
    description_char_limit: Option<usize>,
    allowed_entities: Option<BTreeSet<String>>,
    actions: Vec<RegisteredAction>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl std::fmt::Debug for InMemoryToolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryToolset")
            .field("entity_id", &self.entity_id)
            .field("description_char_limit", &self.description_char_limit)
            .field("allowed_entities", &self.allowed_entities)
            .field(
                "actions",
                &self.actions.iter().map(|a| &a.spec.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for InMemoryToolset {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryToolset {
    /// An empty toolset with the default entity and no description cap.
    pub fn new() -> Self {
        Self {
            entity_id: ak_config::DEFAULT_ENTITY_ID.to_string(),
            description_char_limit: None,
            allowed_entities: None,
            actions: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An empty toolset using the entity and description cap from `config`.
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            entity_id: config.entity_id.clone(),
            description_char_limit: config.description_char_limit,
            ..Self::new()
        }
    }

    /// Set the default entity.
    #[must_use]
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }

    /// Cap published descriptions at `limit` characters.
    #[must_use]
    pub fn with_description_char_limit(mut self, limit: usize) -> Self {
        self.description_char_limit = Some(limit);
        self
    }

    /// Only these entities may execute actions.
    #[must_use]
    pub fn allow_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_entities = Some(entities.into_iter().map(Into::into).collect());
        self
    }

    /// Register an action and return `self` for chaining.
    #[must_use]
    pub fn with_action<F>(mut self, spec: ActionSpec, handler: F) -> Self
    where
        F: Fn(&Map<String, Value>, &str) -> AkResult<ActionInvocationResult> + Send + Sync + 'static,
    {
        self.register(spec, handler);
        self
    }

    /// Register an action. A later registration with the same name replaces
    /// the earlier one in place.
    pub fn register<F>(&mut self, spec: ActionSpec, handler: F)
    where
        F: Fn(&Map<String, Value>, &str) -> AkResult<ActionInvocationResult> + Send + Sync + 'static,
    {
        let entry = RegisteredAction {
            spec,
            handler: Arc::new(handler),
        };
        match self.actions.iter_mut().find(|a| a.spec.name == entry.spec.name) {
            Some(existing) => *existing = entry,
            None => self.actions.push(entry),
        }
    }

    /// Register an action whose handler echoes its input back.
    #[must_use]
    pub fn with_echo_action(self, spec: ActionSpec) -> Self {
        let name = spec.name.clone();
        self.with_action(spec, move |params, entity_id| {
            let mut out = Map::new();
            out.insert("successful".into(), Value::Bool(true));
            out.insert("action".into(), Value::String(name.clone()));
            out.insert("entity_id".into(), Value::String(entity_id.to_string()));
            out.insert("data".into(), Value::Object(params.clone()));
            Ok(out)
        })
    }

    /// Every execution so far, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn find(&self, name: &str) -> Option<&RegisteredAction> {
        self.actions.iter().find(|a| a.spec.name == name)
    }

    /// Actions selected by `filter`: explicit names first (filter order),
    /// then app/tag matches (registration order), without duplicates.
    fn select(&self, filter: &ActionFilter) -> AkResult<Vec<&RegisteredAction>> {
        if filter.is_empty() {
            return Ok(self.actions.iter().collect());
        }

        let unknown_actions: Vec<&String> = filter
            .actions
            .iter()
            .filter(|name| self.find(name).is_none())
            .collect();
        let unknown_apps: Vec<&String> = filter
            .apps
            .iter()
            .filter(|app| !self.actions.iter().any(|a| &a.spec.app == *app))
            .collect();
        if !unknown_actions.is_empty() || !unknown_apps.is_empty() {
            return Err(AkError::new(ErrorCode::FilterInvalid, "filter names unknown actions or apps")
                .with_context("unknown_actions", unknown_actions)
                .with_context("unknown_apps", unknown_apps));
        }

        let mut selected: Vec<&RegisteredAction> = Vec::new();
        for name in &filter.actions {
            if let Some(action) = self.find(name) {
                if !selected.iter().any(|s| s.spec.name == action.spec.name) {
                    selected.push(action);
                }
            }
        }

        let tag_match = |a: &RegisteredAction| {
            filter.tags.is_empty() || a.spec.tags.iter().any(|t| filter.tags.contains(t))
        };
        let by_category = !filter.apps.is_empty() || !filter.tags.is_empty();
        for action in &self.actions {
            let app_match = filter.apps.is_empty() || filter.apps.contains(&action.spec.app);
            if by_category
                && app_match
                && tag_match(action)
                && !selected.iter().any(|s| s.spec.name == action.spec.name)
            {
                selected.push(action);
            }
        }
        Ok(selected)
    }
}

impl ActionToolset for InMemoryToolset {
    fn default_entity_id(&self) -> &str {
        &self.entity_id
    }

    fn validate_tools(&self, filter: &ActionFilter) -> AkResult<()> {
        let selected = self.select(filter)?;
        if !filter.is_empty() && selected.is_empty() {
            return Err(AkError::new(ErrorCode::FilterNoMatch, "no actions match filter")
                .with_context("filter", filter));
        }
        Ok(())
    }

    fn get_action_schemas(&self, filter: &ActionFilter) -> AkResult<Vec<ToolSchema>> {
        Ok(self
            .select(filter)?
            .into_iter()
            .map(|a| ToolSchema {
                name: a.spec.name.clone(),
                description: match (&a.spec.description, self.description_char_limit) {
                    (Some(d), Some(limit)) => Some(truncate_description(d, limit)),
                    (d, _) => d.clone(),
                },
                parameters: a.spec.parameters.clone(),
            })
            .collect())
    }

    fn execute_action(
        &self,
        action: &str,
        params: Map<String, Value>,
        entity_id: &str,
    ) -> AkResult<ActionInvocationResult> {
        let registered = self.find(action).ok_or_else(|| {
            AkError::new(ErrorCode::ActionNotFound, format!("unknown action '{action}'"))
                .with_context("action", action)
        })?;

        if let Some(allowed) = &self.allowed_entities {
            if !allowed.contains(entity_id) {
                return Err(AkError::new(
                    ErrorCode::ActionPermissionDenied,
                    format!("entity '{entity_id}' may not run '{action}'"),
                )
                .with_context("action", action)
                .with_context("entity_id", entity_id));
            }
        }

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                action: action.to_string(),
                params: params.clone(),
                entity_id: entity_id.to_string(),
            });

        (registered.handler)(&params, entity_id)
    }
}
