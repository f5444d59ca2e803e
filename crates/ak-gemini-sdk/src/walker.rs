// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversion of vendor tree structures into plain JSON data.
//!
//! The walker does not know about any particular SDK type. A node type only
//! has to say which of three shapes it has ([`Shape::Map`], [`Shape::Seq`],
//! or [`Shape::Scalar`]) through [`TreeNode`], and [`normalize`] rebuilds the
//! tree as a [`serde_json::Value`] with keys and element order preserved.
//!
//! Input trees are assumed acyclic. Nesting is capped so a hostile or broken
//! response fails with [`ErrorCode::ResponseTooDeep`] instead of exhausting
//! the stack.

use ak_error::{AkError, AkResult, ErrorCode};
use serde_json::{Map, Value};

use crate::proto::{ProtoStruct, ProtoValue, number_to_json};

/// Default nesting cap for [`normalize`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The shape of one node in a tree.
#[derive(Debug)]
pub enum Shape<'a, N> {
    /// Key-value pairs in their original order.
    Map(Vec<(&'a str, &'a N)>),
    /// Elements in order.
    Seq(Vec<&'a N>),
    /// A leaf, already in plain form.
    Scalar(Value),
}

/// A node of a tree-shaped structure the walker can traverse.
pub trait TreeNode: Sized {
    /// Classify this node. Fails with [`ErrorCode::ResponseMalformed`] when
    /// the node has no plain-data equivalent.
    fn shape(&self) -> AkResult<Shape<'_, Self>>;
}

impl TreeNode for Value {
    fn shape(&self) -> AkResult<Shape<'_, Self>> {
        Ok(match self {
            Value::Object(map) => Shape::Map(map.iter().map(|(k, v)| (k.as_str(), v)).collect()),
            Value::Array(items) => Shape::Seq(items.iter().collect()),
            scalar => Shape::Scalar(scalar.clone()),
        })
    }
}

impl TreeNode for ProtoValue {
    fn shape(&self) -> AkResult<Shape<'_, Self>> {
        Ok(match self {
            ProtoValue::Struct(s) => Shape::Map(s.iter().collect()),
            ProtoValue::List(l) => Shape::Seq(l.as_slice().iter().collect()),
            ProtoValue::Null => Shape::Scalar(Value::Null),
            ProtoValue::Bool(b) => Shape::Scalar(Value::Bool(*b)),
            ProtoValue::String(s) => Shape::Scalar(Value::String(s.clone())),
            ProtoValue::Number(n) => Shape::Scalar(number_to_json(*n).ok_or_else(|| {
                AkError::new(ErrorCode::ResponseMalformed, "non-finite number in arguments")
                    .with_context("value", n.to_string())
            })?),
        })
    }
}

/// Rebuild `node` as plain JSON, failing past `max_depth` nested containers.
///
/// Already-plain input comes back unchanged, so the conversion is idempotent.
pub fn normalize<N: TreeNode>(node: &N, max_depth: usize) -> AkResult<Value> {
    walk(node, 0, max_depth)
}

/// Convert function-call arguments into action parameters.
///
/// Absent and empty arguments both become an empty mapping, whatever the cap;
/// the walker never sees them.
pub fn args_to_params(args: Option<&ProtoStruct>, max_depth: usize) -> AkResult<Map<String, Value>> {
    let Some(args) = args.filter(|a| !a.is_empty()) else {
        return Ok(Map::new());
    };
    if max_depth == 0 {
        return Err(too_deep(max_depth));
    }
    let mut params = Map::with_capacity(args.len());
    for (key, value) in args.iter() {
        params.insert(key.to_string(), walk(value, 1, max_depth)?);
    }
    Ok(params)
}

fn walk<N: TreeNode>(node: &N, depth: usize, max_depth: usize) -> AkResult<Value> {
    match node.shape()? {
        Shape::Scalar(v) => Ok(v),
        Shape::Map(entries) => {
            if depth >= max_depth {
                return Err(too_deep(max_depth));
            }
            let mut out = Map::with_capacity(entries.len());
            for (key, child) in entries {
                out.insert(key.to_string(), walk(child, depth + 1, max_depth)?);
            }
            Ok(Value::Object(out))
        }
        Shape::Seq(items) => {
            if depth >= max_depth {
                return Err(too_deep(max_depth));
            }
            items
                .into_iter()
                .map(|child| walk(child, depth + 1, max_depth))
                .collect::<AkResult<Vec<_>>>()
                .map(Value::Array)
        }
    }
}

fn too_deep(max_depth: usize) -> AkError {
    AkError::new(
        ErrorCode::ResponseTooDeep,
        "function-call arguments nest too deeply",
    )
    .with_context("max_depth", max_depth)
}
