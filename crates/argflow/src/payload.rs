//! Runtime payloads moved by the engine.
//!
//! [`Payload`] is the dynamic runtime counterpart to the static
//! [`TypeId`](crate::TypeId) model. Direct inputs carry payloads in,
//! converters produce new ones, and the target function receives the
//! final set. Arbitrary host values travel in the `Opaque` variant.
//!
//! Cloning a payload is shallow: scalars copy, strings clone their
//! buffer, and opaque values bump an `Arc`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::TypeId;

/// A runtime value produced or consumed during resolution.
#[derive(Clone)]
pub enum Payload {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Zero value of a non-primitive type.
    Null(TypeId),
    /// An arbitrary host value tagged with its registered type.
    Opaque {
        ty: TypeId,
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl Payload {
    /// Wraps a host value as an opaque payload of the given type.
    pub fn opaque<T: Any + Send + Sync>(ty: TypeId, value: T) -> Payload {
        Payload::Opaque {
            ty,
            value: Arc::new(value),
        }
    }

    /// Returns the [`TypeId`] of this payload.
    pub fn type_id(&self) -> TypeId {
        match self {
            Payload::Unit => TypeId::UNIT,
            Payload::Bool(_) => TypeId::BOOL,
            Payload::Int(_) => TypeId::INT,
            Payload::Float(_) => TypeId::FLOAT,
            Payload::Str(_) => TypeId::STR,
            Payload::Null(ty) => *ty,
            Payload::Opaque { ty, .. } => *ty,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Payload::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Payload::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the host value inside an `Opaque` payload, if the stored
    /// type is `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Opaque { value, .. } => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Unit => write!(f, "Unit"),
            Payload::Bool(b) => write!(f, "Bool({})", b),
            Payload::Int(n) => write!(f, "Int({})", n),
            Payload::Float(x) => write!(f, "Float({})", x),
            Payload::Str(s) => write!(f, "Str({:?})", s),
            Payload::Null(ty) => write!(f, "Null({})", ty),
            Payload::Opaque { ty, .. } => write!(f, "Opaque({})", ty),
        }
    }
}

impl PartialEq for Payload {
    /// Structural equality for scalars; pointer identity for opaque
    /// values.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::Unit, Payload::Unit) => true,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::Str(a), Payload::Str(b)) => a == b,
            (Payload::Null(a), Payload::Null(b)) => a == b,
            (
                Payload::Opaque { ty: t1, value: v1 },
                Payload::Opaque { ty: t2, value: v2 },
            ) => t1 == t2 && Arc::ptr_eq(v1, v2),
            _ => false,
        }
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Payload {
        Payload::Bool(b)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Payload {
        Payload::Int(n)
    }
}

impl From<f64> for Payload {
    fn from(x: f64) -> Payload {
        Payload::Float(x)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Payload {
        Payload::Str(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Payload {
        Payload::Str(s)
    }
}
