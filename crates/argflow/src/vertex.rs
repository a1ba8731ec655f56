//! Vertex taxonomy for the resolution graph.
//!
//! Five vertex kinds encode the resolution problem:
//!
//! - `Root` -- single sentinel; anything reachable from it is retained.
//! - `Value` -- a named value (name, type, subtype). May carry a payload
//!   once supplied.
//! - `TypedArg` -- a function's request for any value of a type
//!   (+subtype).
//! - `TypedOutput` -- a value produced by a converter that advertises
//!   only type (+subtype).
//! - `Func` -- a function; its out-edges are its requirements, its
//!   in-edges its products.
//!
//! Identity is the derived [`VertexKey`]: vertices with equal keys are
//! fused by the graph. Payloads set here at construction time (direct
//! inputs) are the authoritative starting values; resolver-time
//! mutations live in a side table keyed by [`VertexKey`], never on the
//! vertices themselves.

use argflow_graph::GraphVertex;

use crate::func::{Func, FuncId};
use crate::payload::Payload;
use crate::types::TypeId;
use crate::value::{Value, ValueKind};

/// A named value (name, type, subtype), optionally carrying a payload.
#[derive(Debug, Clone)]
pub(crate) struct ValueVertex {
    pub name: String,
    pub ty: TypeId,
    pub subtype: String,
    pub payload: Option<Payload>,
}

/// A type-only vertex: either a function's typed request (`TypedArg`) or
/// a typed product (`TypedOutput`).
#[derive(Debug, Clone)]
pub(crate) struct TypedVertex {
    pub ty: TypeId,
    pub subtype: String,
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone)]
pub(crate) struct FuncVertex {
    pub func: Func,
}

#[derive(Debug, Clone)]
pub(crate) enum Vertex {
    Root,
    Value(ValueVertex),
    TypedArg(TypedVertex),
    TypedOutput(TypedVertex),
    Func(FuncVertex),
}

/// Stable identity of a [`Vertex`], derived from its kind-specific
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum VertexKey {
    Root,
    Value {
        name: String,
        ty: TypeId,
        subtype: String,
    },
    TypedArg {
        ty: TypeId,
        subtype: String,
    },
    TypedOutput {
        ty: TypeId,
        subtype: String,
    },
    Func(FuncId),
}

impl Vertex {
    pub(crate) fn value(name: impl Into<String>, ty: TypeId, subtype: impl Into<String>) -> Vertex {
        Vertex::Value(ValueVertex {
            name: name.into(),
            ty,
            subtype: subtype.into(),
            payload: None,
        })
    }

    pub(crate) fn typed_arg(ty: TypeId, subtype: impl Into<String>) -> Vertex {
        Vertex::TypedArg(TypedVertex {
            ty,
            subtype: subtype.into(),
            payload: None,
        })
    }

    pub(crate) fn typed_output(ty: TypeId, subtype: impl Into<String>) -> Vertex {
        Vertex::TypedOutput(TypedVertex {
            ty,
            subtype: subtype.into(),
            payload: None,
        })
    }

    /// The construction-time payload, if this vertex carries one.
    pub(crate) fn payload(&self) -> Option<&Payload> {
        match self {
            Vertex::Value(v) => v.payload.as_ref(),
            Vertex::TypedArg(v) | Vertex::TypedOutput(v) => v.payload.as_ref(),
            _ => None,
        }
    }

    /// The value specification this vertex represents, for vertices that
    /// can be shown to converter generators (named values and typed
    /// products).
    pub(crate) fn as_value(&self) -> Option<Value> {
        match self {
            Vertex::Value(v) => Some(Value {
                name: v.name.clone(),
                ty: v.ty,
                subtype: v.subtype.clone(),
                payload: v.payload.clone(),
            }),
            Vertex::TypedOutput(v) => Some(Value {
                name: String::new(),
                ty: v.ty,
                subtype: v.subtype.clone(),
                payload: v.payload.clone(),
            }),
            _ => None,
        }
    }

    /// The value specification this vertex represents when treated as a
    /// function input (named values and typed requests).
    pub(crate) fn input_value(&self) -> Option<Value> {
        match self {
            Vertex::Value(v) => Some(Value {
                name: v.name.clone(),
                ty: v.ty,
                subtype: v.subtype.clone(),
                payload: v.payload.clone(),
            }),
            Vertex::TypedArg(v) => Some(Value {
                name: String::new(),
                ty: v.ty,
                subtype: v.subtype.clone(),
                payload: v.payload.clone(),
            }),
            _ => None,
        }
    }
}

impl GraphVertex for Vertex {
    type Key = VertexKey;

    fn key(&self) -> VertexKey {
        match self {
            Vertex::Root => VertexKey::Root,
            Vertex::Value(v) => VertexKey::Value {
                name: v.name.clone(),
                ty: v.ty,
                subtype: v.subtype.clone(),
            },
            Vertex::TypedArg(v) => VertexKey::TypedArg {
                ty: v.ty,
                subtype: v.subtype.clone(),
            },
            Vertex::TypedOutput(v) => VertexKey::TypedOutput {
                ty: v.ty,
                subtype: v.subtype.clone(),
            },
            Vertex::Func(v) => VertexKey::Func(v.func.id()),
        }
    }

    fn label(&self) -> String {
        match self {
            Vertex::Root => "root".to_string(),
            Vertex::Value(v) => format!("{}/t{}/{}", v.name, v.ty.0, v.subtype),
            Vertex::TypedArg(v) => format!("arg: t{}/{}", v.ty.0, v.subtype),
            Vertex::TypedOutput(v) => format!("out: t{}/{}", v.ty.0, v.subtype),
            Vertex::Func(v) => format!("func: {}", v.func.name()),
        }
    }
}

impl Value {
    /// The key of the graph vertex that represents this value as a
    /// function requirement.
    pub(crate) fn vertex_key(&self) -> VertexKey {
        match self.kind() {
            ValueKind::Named => VertexKey::Value {
                name: self.name.clone(),
                ty: self.ty,
                subtype: self.subtype.clone(),
            },
            ValueKind::Typed => VertexKey::TypedArg {
                ty: self.ty,
                subtype: self.subtype.clone(),
            },
        }
    }
}
