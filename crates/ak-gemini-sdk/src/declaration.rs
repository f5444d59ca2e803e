// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion of toolset schemas into Gemini function declarations.

use ak_error::AkResult;
use ak_toolset::{ToolSchema, normalize_parameters};
use serde_json::{Map, Value};

use crate::dialect::{FunctionParameters, GeminiFunctionDeclaration};

/// Property key Gemini rejects inside parameter schemas.
const EXAMPLES_KEY: &str = "examples";

/// Convert a [`ToolSchema`] into a [`GeminiFunctionDeclaration`].
///
/// The description falls back to the action name. Parameters are normalized
/// with [`normalize_parameters`]; each property loses its top-level
/// `examples` key and keeps everything else verbatim. A missing `required`
/// list becomes an empty one.
///
/// `entity_id` is accepted for callers that scope tools per entity. The
/// declaration does not depend on it yet.
///
/// # Errors
///
/// Returns a `SCHEMA_INVALID` error when the parameters are not a usable
/// object schema.
pub fn wrap_tool(
    schema: &ToolSchema,
    entity_id: Option<&str>,
) -> AkResult<GeminiFunctionDeclaration> {
    let _ = entity_id;
    let normalized = normalize_parameters(&schema.parameters)?;
    let properties = normalized
        .properties
        .into_iter()
        .map(|(name, prop)| (name, strip_examples(prop)))
        .collect::<Map<String, Value>>();
    Ok(GeminiFunctionDeclaration {
        name: schema.name.clone(),
        description: schema.display_description().to_string(),
        parameters: FunctionParameters::object(
            properties,
            normalized.required.unwrap_or_default(),
        ),
    })
}

fn strip_examples(prop: Value) -> Value {
    match prop {
        Value::Object(mut map) => {
            map.shift_remove(EXAMPLES_KEY);
            Value::Object(map)
        }
        other => other,
    }
}
