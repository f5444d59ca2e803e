// SPDX-License-Identifier: MIT OR Apache-2.0
//! Normalization of raw JSON-Schema parameter objects.
//!
//! [`normalize_parameters`] checks that a tool's parameters form a usable
//! object schema and returns its properties and required list in a
//! self-contained form: local `$ref`s into `$defs`/`definitions` are inlined
//! so consumers never have to resolve pointers.

use ak_error::{AkError, AkResult, ErrorCode};
use serde_json::{Map, Value};

/// Maximum number of nested `$ref` expansions along one path.
const MAX_REF_DEPTH: usize = 32;

/// Maximum number of JSON nodes the inlined properties may hold in total.
pub const MAX_INLINED_NODES: usize = 100_000;

/// The object schema of a tool's parameters after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedParameters {
    /// Property schemas in declaration order, with local `$ref`s inlined.
    pub properties: Map<String, Value>,
    /// Required property names, `None` when the schema omits `required`.
    pub required: Option<Vec<String>>,
}

/// Validate `raw` as an object JSON Schema and normalize it.
///
/// Fails with [`ErrorCode::SchemaInvalid`] when `raw` is not an object, its
/// root `type` is not `"object"`, `properties` or `required` are malformed,
/// a local reference cannot be resolved or is cyclic, inlining would exceed
/// [`MAX_INLINED_NODES`], or the schema does not compile.
pub fn normalize_parameters(raw: &Value) -> AkResult<NormalizedParameters> {
    let root = raw
        .as_object()
        .ok_or_else(|| invalid("parameters must be a JSON object"))?;

    if let Some(ty) = root.get("type") {
        if ty != "object" {
            return Err(invalid("parameters must describe an object").with_context("type", ty));
        }
    }

    let defs = definitions(root);

    let properties = match root.get("properties") {
        None => Map::new(),
        Some(Value::Object(props)) => {
            let mut inliner = Inliner::new(&defs);
            let mut out = Map::with_capacity(props.len());
            for (name, prop) in props {
                if !prop.is_object() {
                    return Err(invalid("property schema must be an object")
                        .with_context("property", name));
                }
                let resolved = inliner
                    .schema(prop)
                    .map_err(|e| e.with_context("property", name))?;
                out.insert(name.clone(), resolved);
            }
            out
        }
        Some(_) => return Err(invalid("`properties` must be an object")),
    };

    let required = match root.get("required") {
        None => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("`required` entries must be strings"))
                })
                .collect::<AkResult<Vec<_>>>()?,
        ),
        Some(_) => return Err(invalid("`required` must be an array")),
    };

    jsonschema::validator_for(raw).map_err(|e| {
        invalid("parameters are not a valid JSON Schema").with_context("reason", e.to_string())
    })?;

    Ok(NormalizedParameters {
        properties,
        required,
    })
}

/// Truncate `text` to at most `limit` characters, on a char boundary.
pub fn truncate_description(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn invalid(message: &str) -> AkError {
    AkError::new(ErrorCode::SchemaInvalid, message)
}

/// Collect `$defs` (2019-09+) and `definitions` (draft-07) into one lookup.
fn definitions(root: &Map<String, Value>) -> Map<String, Value> {
    let mut defs = Map::new();
    for key in ["definitions", "$defs"] {
        if let Some(Value::Object(map)) = root.get(key) {
            for (name, schema) in map {
                defs.insert(format!("#/{key}/{name}"), schema.clone());
            }
        }
    }
    defs
}

/// Schema keywords whose value maps names to subschemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "dependentSchemas",
    "dependencies",
];

/// Schema keywords whose value is a list of subschemas.
const SCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Schema keywords whose value is a single subschema.
const SCHEMA_KEYWORDS: &[&str] = &[
    "additionalItems",
    "additionalProperties",
    "unevaluatedItems",
    "unevaluatedProperties",
    "propertyNames",
    "contains",
    "not",
    "if",
    "then",
    "else",
];

/// Rewrites subschemas with local `$ref`s replaced by their targets.
///
/// Only schema positions are visited. Values of data keywords such as
/// `default`, `const`, `enum` and `examples` are copied as they are, so a
/// `$ref` key inside them is not a reference. The node budget is shared by
/// every property of one parameters object.
struct Inliner<'a> {
    defs: &'a Map<String, Value>,
    stack: Vec<String>,
    remaining: usize,
}

impl<'a> Inliner<'a> {
    fn new(defs: &'a Map<String, Value>) -> Self {
        Self {
            defs,
            stack: Vec::new(),
            remaining: MAX_INLINED_NODES,
        }
    }

    fn charge(&mut self, nodes: usize) -> AkResult<()> {
        self.remaining = self.remaining.checked_sub(nodes).ok_or_else(|| {
            invalid("inlined schema exceeds the size limit")
                .with_context("max_nodes", MAX_INLINED_NODES)
        })?;
        Ok(())
    }

    fn data(&mut self, value: &Value) -> AkResult<Value> {
        self.charge(node_count(value))?;
        Ok(value.clone())
    }

    fn schema(&mut self, value: &Value) -> AkResult<Value> {
        let Value::Object(map) = value else {
            // Boolean schemas, and anything a compile step will reject.
            return self.data(value);
        };
        self.charge(1)?;
        if let Some(reference) = map.get("$ref") {
            let pointer = reference
                .as_str()
                .ok_or_else(|| invalid("`$ref` must be a string"))?;
            return self.expand(pointer, map);
        }
        let mut out = Map::with_capacity(map.len());
        for (k, v) in map {
            out.insert(k.clone(), self.keyword(k, v)?);
        }
        Ok(Value::Object(out))
    }

    fn keyword(&mut self, key: &str, value: &Value) -> AkResult<Value> {
        match value {
            Value::Object(map) if SCHEMA_MAP_KEYWORDS.contains(&key) => {
                self.charge(1)?;
                let mut out = Map::with_capacity(map.len());
                for (name, sub) in map {
                    out.insert(name.clone(), self.schema(sub)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) if key == "items" || SCHEMA_LIST_KEYWORDS.contains(&key) => {
                self.charge(1)?;
                items
                    .iter()
                    .map(|sub| self.schema(sub))
                    .collect::<AkResult<Vec<_>>>()
                    .map(Value::Array)
            }
            _ if key == "items" || SCHEMA_KEYWORDS.contains(&key) => self.schema(value),
            _ => self.data(value),
        }
    }

    /// Replace a `$ref` object by its target; sibling keywords win over the target's.
    fn expand(&mut self, pointer: &str, map: &Map<String, Value>) -> AkResult<Value> {
        if self.stack.iter().any(|p| p == pointer) {
            return Err(invalid("cyclic `$ref`").with_context("ref", pointer));
        }
        if self.stack.len() >= MAX_REF_DEPTH {
            return Err(invalid("`$ref` nesting too deep").with_context("ref", pointer));
        }
        let defs = self.defs;
        let target = defs
            .get(pointer)
            .ok_or_else(|| invalid("unresolvable `$ref`").with_context("ref", pointer))?;

        self.stack.push(pointer.to_string());
        let resolved = self.schema(target);
        self.stack.pop();

        let mut merged = match resolved? {
            Value::Object(obj) => obj,
            _ => return Err(invalid("`$ref` target must be an object").with_context("ref", pointer)),
        };
        for (k, v) in map {
            if k != "$ref" {
                merged.insert(k.clone(), self.keyword(k, v)?);
            }
        }
        Ok(Value::Object(merged))
    }
}

fn node_count(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(node_count).sum::<usize>(),
        Value::Array(items) => 1 + items.iter().map(node_count).sum::<usize>(),
        _ => 1,
    }
}
