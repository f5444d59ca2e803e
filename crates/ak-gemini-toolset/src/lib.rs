// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gemini function-calling adapter over an actionkit toolset.
//!
//! [`GeminiToolSet`] sits between an orchestration loop and an
//! [`ActionToolset`]. Before a generation call it publishes the selected
//! actions as a [`GeminiTool`]; after the call it dispatches every function
//! call in the [`GenerationResponse`] to the toolset and collects the results.
//!
//! ```
//! use ak_gemini_toolset::GeminiToolSet;
//! use ak_gemini_sdk::{Candidate, Content, GenerationResponse, Part, ProtoStruct};
//! use ak_toolset::ActionFilter;
//! use ak_toolset_mock::{ActionSpec, InMemoryToolset};
//!
//! let toolset = InMemoryToolset::new()
//!     .with_echo_action(ActionSpec::new("GITHUB_STAR_A_REPOSITORY", "github"));
//! let gemini = GeminiToolSet::new(toolset);
//!
//! let tool = gemini.get_tool(&ActionFilter::new(), None).unwrap();
//! assert_eq!(tool.len(), 1);
//!
//! let args = ProtoStruct::new().with("owner", "composiohq");
//! let response = GenerationResponse::new(vec![Candidate::new(Content::model(vec![
//!     Part::function_call("GITHUB_STAR_A_REPOSITORY", Some(args)),
//! ]))]);
//! let results = gemini.handle_response(&response, None).unwrap();
//! assert_eq!(results.len(), 1);
//! ```
//!
//! Every entry point is synchronous and holds no state besides the wrapped
//! toolset, so a `GeminiToolSet` can be shared across threads whenever the
//! toolset can.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use ak_config::AdapterConfig;
use ak_error::{AkError, AkResult, ErrorCode};
use ak_gemini_sdk::{
    Content, FunctionCall, GeminiFunctionDeclaration, GeminiTool, GenerationResponse, Part,
    RUNTIME, walker,
};
use ak_toolset::{ActionFilter, ActionInvocationResult, ActionToolset, ToolSchema};
use tracing::{debug, info, trace, warn};

/// Adapts an [`ActionToolset`] to Gemini function calling.
#[derive(Debug, Clone)]
pub struct GeminiToolSet<T> {
    toolset: T,
    max_args_depth: usize,
}

impl<T: ActionToolset> GeminiToolSet<T> {
    /// Wrap `toolset` with the default argument depth cap.
    pub fn new(toolset: T) -> Self {
        Self {
            toolset,
            max_args_depth: walker::DEFAULT_MAX_DEPTH,
        }
    }

    /// Wrap `toolset` using the settings in `config`.
    pub fn with_config(toolset: T, config: &AdapterConfig) -> Self {
        Self::new(toolset).with_max_args_depth(config.max_args_depth)
    }

    /// Override the nesting cap applied to function-call arguments.
    ///
    /// The argument mapping itself is the first level, so `0` is raised to `1`.
    #[must_use]
    pub fn with_max_args_depth(mut self, depth: usize) -> Self {
        self.max_args_depth = depth.max(1);
        self
    }

    /// The wrapped toolset.
    pub fn toolset(&self) -> &T {
        &self.toolset
    }

    /// Runtime identifier of this adapter.
    pub fn runtime(&self) -> &'static str {
        RUNTIME
    }

    fn resolve_entity<'a>(&'a self, entity_id: Option<&'a str>) -> &'a str {
        entity_id.unwrap_or_else(|| self.toolset.default_entity_id())
    }

    /// Convert one schema into a function declaration.
    ///
    /// `entity_id` is accepted for per-entity scoping and does not affect the
    /// result yet.
    pub fn wrap_tool(
        &self,
        schema: &ToolSchema,
        entity_id: Option<&str>,
    ) -> AkResult<GeminiFunctionDeclaration> {
        debug!(target: "ak.gemini", action = %schema.name, "wrapping tool schema");
        ak_gemini_sdk::wrap_tool(schema, entity_id)
    }

    /// Publish the actions selected by `filter` as one [`GeminiTool`].
    ///
    /// The filter is validated by the toolset first. Declarations keep the
    /// order in which the toolset returns its schemas.
    pub fn get_tool(&self, filter: &ActionFilter, entity_id: Option<&str>) -> AkResult<GeminiTool> {
        let entity_id = self.resolve_entity(entity_id);
        self.toolset.validate_tools(filter)?;
        let schemas = self.toolset.get_action_schemas(filter)?;
        let function_declarations = schemas
            .iter()
            .map(|schema| self.wrap_tool(schema, Some(entity_id)))
            .collect::<AkResult<Vec<_>>>()?;
        info!(
            target: "ak.gemini",
            entity_id,
            declarations = function_declarations.len(),
            "built gemini tool"
        );
        Ok(GeminiTool {
            function_declarations,
        })
    }

    /// Publish the named actions. Forwards to [`GeminiToolSet::get_tool`].
    #[deprecated(note = "use `get_tool` instead")]
    pub fn get_actions<I, S>(&self, actions: I, entity_id: Option<&str>) -> AkResult<GeminiTool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        warn!(target: "ak.gemini", "`get_actions` is deprecated; use `get_tool` instead");
        self.get_tool(&ActionFilter::new().actions(actions), entity_id)
    }

    /// Execute a single function call.
    ///
    /// Missing arguments are sent as an empty parameter map. Errors from the
    /// toolset are returned as they are.
    pub fn execute_function_call(
        &self,
        call: &FunctionCall,
        entity_id: Option<&str>,
    ) -> AkResult<ActionInvocationResult> {
        let entity_id = self.resolve_entity(entity_id);
        let params = walker::args_to_params(call.args.as_ref(), self.max_args_depth)
            .map_err(|e| e.with_context("action", &call.name))?;
        debug!(target: "ak.gemini", action = %call.name, entity_id, "dispatching function call");
        self.toolset.execute_action(&call.name, params, entity_id)
    }

    /// Execute every function call in `response`, in candidate then part order.
    ///
    /// Parts without a function call and candidates without parts are
    /// skipped. The first failing call stops processing and its error is
    /// returned; calls after it are not executed.
    pub fn handle_response(
        &self,
        response: &GenerationResponse,
        entity_id: Option<&str>,
    ) -> AkResult<Vec<ActionInvocationResult>> {
        let entity_id = self.resolve_entity(entity_id);
        let mut results = Vec::new();
        for (candidate_index, candidate) in response.candidates.iter().enumerate() {
            let Some(parts) = candidate.parts() else {
                trace!(target: "ak.gemini", candidate_index, "candidate has no parts, skipping");
                continue;
            };
            for (part_index, part) in parts.iter().enumerate() {
                match &part.function_call {
                    Some(call) => results.push(self.execute_function_call(call, Some(entity_id))?),
                    None => trace!(
                        target: "ak.gemini",
                        candidate_index,
                        part_index,
                        "part has no function call, skipping"
                    ),
                }
            }
        }
        info!(target: "ak.gemini", entity_id, results = results.len(), "handled response");
        Ok(results)
    }

    /// Pair the function calls in `response` with their `results` as a
    /// `user` content block of function-response parts.
    ///
    /// `results` must come from [`GeminiToolSet::handle_response`] on the
    /// same response.
    pub fn function_responses(
        &self,
        response: &GenerationResponse,
        results: Vec<ActionInvocationResult>,
    ) -> AkResult<Content> {
        let calls: Vec<&FunctionCall> = response.function_calls().collect();
        if calls.len() != results.len() {
            return Err(AkError::new(
                ErrorCode::Internal,
                "result count does not match function calls",
            )
            .with_context("calls", calls.len())
            .with_context("results", results.len()));
        }
        let parts = calls
            .into_iter()
            .zip(results)
            .map(|(call, result)| Part::function_response(call.name.clone(), result))
            .collect();
        Ok(Content::user(parts))
    }

    /// Dispatch every call in `response` and return the content block to
    /// send back to the model.
    pub fn respond(&self, response: &GenerationResponse, entity_id: Option<&str>) -> AkResult<Content> {
        let results = self.handle_response(response, entity_id)?;
        self.function_responses(response, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ak_gemini_sdk::{Candidate, ProtoStruct};
    use ak_toolset_mock::{ActionSpec, InMemoryToolset};
    use serde_json::{Map, json};

    fn toolset() -> InMemoryToolset {
        InMemoryToolset::new()
            .with_echo_action(ActionSpec::new("GITHUB_STAR_A_REPOSITORY", "github").description("Star a repo"))
            .with_echo_action(ActionSpec::new("SLACK_SEND_MESSAGE", "slack"))
    }

    fn call_response(names: &[&str]) -> GenerationResponse {
        GenerationResponse::new(vec![Candidate::new(Content::model(
            names.iter().map(|n| Part::function_call(*n, None)).collect(),
        ))])
    }

    #[test]
    fn get_tool_with_empty_filter_lists_everything() {
        let gemini = GeminiToolSet::new(toolset());
        let tool = gemini.get_tool(&ActionFilter::new(), None).unwrap();
        assert_eq!(
            tool.names().collect::<Vec<_>>(),
            vec!["GITHUB_STAR_A_REPOSITORY", "SLACK_SEND_MESSAGE"]
        );
        assert_eq!(tool.function_declarations[1].description, "SLACK_SEND_MESSAGE");
    }

    #[test]
    fn get_tool_propagates_filter_errors() {
        let gemini = GeminiToolSet::new(toolset());
        let err = gemini
            .get_tool(&ActionFilter::new().actions(["NOPE"]), None)
            .unwrap_err();
        assert!(err.is_filter_error());
    }

    #[test]
    fn execute_uses_default_entity() {
        let gemini = GeminiToolSet::new(toolset().with_entity_id("acme"));
        let call = FunctionCall {
            name: "SLACK_SEND_MESSAGE".into(),
            args: None,
        };
        let result = gemini.execute_function_call(&call, None).unwrap();
        assert_eq!(result["entity_id"], json!("acme"));
        let result = gemini.execute_function_call(&call, Some("bob")).unwrap();
        assert_eq!(result["entity_id"], json!("bob"));
    }

    #[test]
    fn absent_args_match_empty_args() {
        let gemini = GeminiToolSet::new(toolset());
        let none = FunctionCall {
            name: "SLACK_SEND_MESSAGE".into(),
            args: None,
        };
        let empty = FunctionCall {
            name: "SLACK_SEND_MESSAGE".into(),
            args: Some(ProtoStruct::new()),
        };
        assert_eq!(
            gemini.execute_function_call(&none, None).unwrap(),
            gemini.execute_function_call(&empty, None).unwrap()
        );
        let calls = gemini.toolset().calls();
        assert_eq!(calls[0].params, Map::new());
        assert_eq!(calls[0].params, calls[1].params);
    }

    #[test]
    fn zero_depth_cap_is_raised_to_one() {
        let gemini = GeminiToolSet::new(toolset()).with_max_args_depth(0);
        let empty = FunctionCall {
            name: "SLACK_SEND_MESSAGE".into(),
            args: Some(ProtoStruct::new()),
        };
        let flat = FunctionCall {
            name: "SLACK_SEND_MESSAGE".into(),
            args: Some(ProtoStruct::new().with("channel", "general")),
        };
        gemini.execute_function_call(&empty, None).unwrap();
        gemini.execute_function_call(&flat, None).unwrap();
        let calls = gemini.toolset().calls();
        assert_eq!(calls[0].params, Map::new());
        assert_eq!(calls[1].params["channel"], json!("general"));
    }

    #[test]
    fn too_deep_args_never_reach_the_toolset() {
        let gemini = GeminiToolSet::new(toolset()).with_max_args_depth(1);
        let args = ProtoStruct::new().with("a", ProtoStruct::new().with("b", 1i64));
        let call = FunctionCall {
            name: "SLACK_SEND_MESSAGE".into(),
            args: Some(args),
        };
        let err = gemini.execute_function_call(&call, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ResponseTooDeep);
        assert_eq!(err.context["action"], json!("SLACK_SEND_MESSAGE"));
        assert!(gemini.toolset().calls().is_empty());
    }

    #[test]
    fn empty_response_yields_no_results() {
        let gemini = GeminiToolSet::new(toolset());
        let results = gemini
            .handle_response(&GenerationResponse::default(), None)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn function_responses_pair_calls_with_results() {
        let gemini = GeminiToolSet::new(toolset());
        let response = call_response(&["GITHUB_STAR_A_REPOSITORY", "SLACK_SEND_MESSAGE"]);
        let content = gemini.respond(&response, None).unwrap();
        assert_eq!(content.role, "user");
        let parts = content.parts.unwrap();
        let names: Vec<_> = parts
            .iter()
            .map(|p| p.function_response.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["GITHUB_STAR_A_REPOSITORY", "SLACK_SEND_MESSAGE"]);
    }

    #[test]
    fn function_responses_reject_mismatched_results() {
        let gemini = GeminiToolSet::new(toolset());
        let response = call_response(&["SLACK_SEND_MESSAGE"]);
        let err = gemini.function_responses(&response, Vec::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
    }

    #[test]
    fn config_sets_depth_cap() {
        let config = AdapterConfig {
            max_args_depth: 1,
            ..AdapterConfig::default()
        };
        let gemini = GeminiToolSet::with_config(toolset(), &config);
        assert_eq!(gemini.max_args_depth, 1);
        assert_eq!(gemini.runtime(), "google_ai");
    }
}
