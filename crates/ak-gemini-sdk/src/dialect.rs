// SPDX-License-Identifier: MIT OR Apache-2.0
//! Google Gemini dialect: function declarations, tool groups, and
//! generation-response types.
//!
//! Field names follow the Gemini wire JSON (camelCase), so a raw
//! `generateContent` response body deserialises directly into
//! [`GenerationResponse`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::proto::ProtoStruct;

/// Runtime identifier for the Google AI function-calling dialect.
pub const RUNTIME: &str = "google_ai";

/// Longest description Google AI accepts on a function declaration.
pub const DESCRIPTION_CHAR_LIMIT: usize = 1024;

// ---------------------------------------------------------------------------
// Function declarations
// ---------------------------------------------------------------------------

/// Parameter schema of a function declaration.
///
/// Always an object schema; `required` is always present, possibly empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionParameters {
    /// JSON-Schema type; always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property schemas in declaration order.
    pub properties: Map<String, Value>,
    /// Required property names.
    #[serde(default)]
    pub required: Vec<String>,
}

impl FunctionParameters {
    /// An object schema with the given properties and required names.
    #[must_use]
    pub fn object(properties: Map<String, Value>, required: Vec<String>) -> Self {
        Self {
            schema_type: "object".into(),
            properties,
            required,
        }
    }
}

/// Gemini-style function declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiFunctionDeclaration {
    /// Function name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Parameter schema.
    pub parameters: FunctionParameters,
}

/// Wraps function declarations for the Gemini `tools` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    /// Function declarations available to the model.
    pub function_declarations: Vec<GeminiFunctionDeclaration>,
}

impl GeminiTool {
    /// Names of the declared functions, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.function_declarations.iter().map(|d| d.name.as_str())
    }

    /// Look up a declaration by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GeminiFunctionDeclaration> {
        self.function_declarations.iter().find(|d| d.name == name)
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.function_declarations.len()
    }

    /// `true` when no functions are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.function_declarations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// Name of the function to invoke.
    pub name: String,
    /// Arguments as the vendor's nested struct; absent when the model sent none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<ProtoStruct>,
}

/// A function result returned to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    /// Name of the function that was called.
    pub name: String,
    /// The function's response payload.
    pub response: Map<String, Value>,
}

/// Inline binary data (e.g. images) embedded in a content block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the data (e.g. `image/png`).
    pub mime_type: String,
    /// Base64-encoded binary data.
    pub data: String,
}

/// One part of a content block. At most one field is normally set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Plain text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline binary data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// A function call requested by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    /// A function response returned to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    /// Create a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Create a function call part.
    #[must_use]
    pub fn function_call(name: impl Into<String>, args: Option<ProtoStruct>) -> Self {
        Self {
            function_call: Some(FunctionCall {
                name: name.into(),
                args,
            }),
            ..Self::default()
        }
    }

    /// Create a function response part.
    #[must_use]
    pub fn function_response(name: impl Into<String>, response: Map<String, Value>) -> Self {
        Self {
            function_response: Some(FunctionResponse {
                name: name.into(),
                response,
            }),
            ..Self::default()
        }
    }
}

/// A content block in the Gemini API format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Role of the content author (`user` or `model`).
    #[serde(default)]
    pub role: String,
    /// Content parts; absent on some safety-blocked candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
}

impl Content {
    /// Create a user-role content block.
    #[must_use]
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".into(),
            parts: Some(parts),
        }
    }

    /// Create a model-role content block.
    #[must_use]
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: "model".into(),
            parts: Some(parts),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A candidate completion in a Gemini response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Reason the model stopped generating (e.g. `STOP`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Position of this candidate in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl Candidate {
    /// A candidate carrying `content`.
    #[must_use]
    pub fn new(content: Content) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    /// The parts of this candidate's content, if it has any.
    #[must_use]
    pub fn parts(&self) -> Option<&[Part]> {
        self.content.as_ref()?.parts.as_deref()
    }
}

/// Token usage reported by the Gemini API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens consumed by the prompt.
    #[serde(default)]
    pub prompt_token_count: u64,
    /// Tokens generated across all candidates.
    #[serde(default)]
    pub candidates_token_count: u64,
    /// Total tokens (prompt + candidates).
    #[serde(default)]
    pub total_token_count: u64,
}

/// A Gemini `generateContent` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Response candidates, in the order the model returned them.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Token usage metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerationResponse {
    /// A response with the given candidates.
    #[must_use]
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            usage_metadata: None,
        }
    }

    /// Every function call, in (candidate, part) order.
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.candidates
            .iter()
            .filter_map(Candidate::parts)
            .flatten()
            .filter_map(|p| p.function_call.as_ref())
    }

    /// Text of the first text part of the first candidate.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .parts()?
            .iter()
            .find_map(|p| p.text.as_deref())
    }
}
