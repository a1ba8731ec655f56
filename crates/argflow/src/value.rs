//! Input and output value specifications.
//!
//! A [`Value`] describes one input or output of a function: an optional
//! case-insensitive name, a type, an optional subtype label, and -- once
//! produced or supplied -- a concrete payload. Two kinds exist, derived
//! from the name: a Named value matches by name, assignable type, and
//! equal subtype; a Typed value (empty name) matches by assignable type
//! and equal subtype alone.

use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::types::{TypeId, TypeRegistry};

/// What kind of matching a [`Value`] participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Named,
    Typed,
}

/// An input or output specification, optionally carrying a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    /// Lowercased name; empty for type-only values.
    pub name: String,
    pub ty: TypeId,
    /// Free-form label distinguishing otherwise identically-typed values.
    /// Empty means "no subtype".
    pub subtype: String,
    /// The concrete value, present only once produced or supplied.
    pub payload: Option<Payload>,
}

impl Value {
    /// A named value specification. Names are lowercased at ingress; an
    /// empty name yields a typed value.
    pub fn named(name: impl Into<String>, ty: TypeId) -> Value {
        Value {
            name: name.into().to_lowercase(),
            ty,
            subtype: String::new(),
            payload: None,
        }
    }

    /// A type-only value specification.
    pub fn typed(ty: TypeId) -> Value {
        Value {
            name: String::new(),
            ty,
            subtype: String::new(),
            payload: None,
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Value {
        self.subtype = subtype.into();
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Value {
        self.payload = Some(payload);
        self
    }

    pub fn kind(&self) -> ValueKind {
        if self.name.is_empty() {
            ValueKind::Typed
        } else {
            ValueKind::Named
        }
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Diagnostic description, e.g. `"a" of type int (subtype: "foo")`
    /// or `type string`.
    pub fn describe(&self, types: &TypeRegistry) -> String {
        let mut out = match self.kind() {
            ValueKind::Named => {
                format!("{:?} of type {}", self.name, types.display_name(self.ty))
            }
            ValueKind::Typed => format!("type {}", types.display_name(self.ty)),
        };
        if !self.subtype.is_empty() {
            out.push_str(&format!(" (subtype: {:?})", self.subtype));
        }
        out
    }
}
