// SPDX-License-Identifier: MIT OR Apache-2.0
//! Google Gemini function-calling dialect for actionkit.
//!
//! - [`dialect`]: wire types for tool declarations and generation responses.
//! - [`proto`]: the vendor's nested struct type carried in function-call args.
//! - [`declaration`]: turns a toolset [`ak_toolset::ToolSchema`] into a
//!   [`dialect::GeminiFunctionDeclaration`].
//! - [`walker`]: turns vendor trees back into plain JSON.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod declaration;
pub mod dialect;
pub mod proto;
pub mod walker;

pub use declaration::wrap_tool;
pub use dialect::{
    Candidate, Content, DESCRIPTION_CHAR_LIMIT, FunctionCall, FunctionParameters,
    FunctionResponse, GeminiFunctionDeclaration, GeminiTool, GenerationResponse, InlineData, Part,
    RUNTIME, UsageMetadata,
};
pub use proto::{ProtoList, ProtoStruct, ProtoValue};
pub use walker::{DEFAULT_MAX_DEPTH, Shape, TreeNode, args_to_params, normalize};
