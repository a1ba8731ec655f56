//! Type handles and the type registry.
//!
//! Every type the engine can route has a unique [`TypeId`] providing O(1)
//! identity comparison. The [`TypeRegistry`] manages registration and
//! lookup, pre-registering the 5 built-in types on construction, and
//! answers the three questions resolution needs: is this an interface,
//! does one type implement another, and is a value of one type assignable
//! where another is required.
//!
//! The registry is frozen into an `Arc` before functions are built;
//! every [`Func`](crate::Func) holds a clone of that `Arc`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::payload::Payload;

/// Unique identifier for a type in the type registry.
///
/// The inner value is an index into the [`TypeRegistry`]'s type vector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Pre-registered TypeId constants for built-in types.
impl TypeId {
    pub const BOOL: TypeId = TypeId(0);
    pub const INT: TypeId = TypeId(1);
    pub const FLOAT: TypeId = TypeId(2);
    pub const STR: TypeId = TypeId(3);
    pub const UNIT: TypeId = TypeId(4);
}

/// Built-in primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Bool,
    Int,
    Float,
    Str,
    Unit,
}

impl Primitive {
    fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "string",
            Primitive::Unit => "unit",
        }
    }
}

/// Definition of a registered type.
///
/// `Opaque` covers host types the engine moves around without looking
/// inside; its method set drives interface satisfaction. `Interface`
/// types are satisfied by any type whose method set is a superset of the
/// interface's declared methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeDef {
    Primitive(Primitive),
    Opaque {
        name: String,
        methods: BTreeSet<String>,
    },
    Interface {
        name: String,
        methods: BTreeSet<String>,
    },
}

/// Registry of all types known to the engine.
///
/// On construction, the registry pre-registers the 5 built-in types:
/// - `TypeId(0)` = bool
/// - `TypeId(1)` = int
/// - `TypeId(2)` = float
/// - `TypeId(3)` = string
/// - `TypeId(4)` = unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRegistry {
    /// Types indexed by TypeId.0
    types: Vec<TypeDef>,
    /// Named type lookup
    names: HashMap<String, TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let types = vec![
            TypeDef::Primitive(Primitive::Bool),
            TypeDef::Primitive(Primitive::Int),
            TypeDef::Primitive(Primitive::Float),
            TypeDef::Primitive(Primitive::Str),
            TypeDef::Primitive(Primitive::Unit),
        ];
        let mut names = HashMap::new();
        for (i, def) in types.iter().enumerate() {
            if let TypeDef::Primitive(p) = def {
                names.insert(p.name().to_string(), TypeId(i as u32));
            }
        }
        TypeRegistry { types, names }
    }

    fn register(&mut self, name: &str, def: TypeDef) -> Result<TypeId, Error> {
        if self.names.contains_key(name) {
            return Err(Error::DuplicateType {
                name: name.to_string(),
            });
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(def);
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Registers an opaque host type with no methods.
    pub fn register_opaque(&mut self, name: &str) -> Result<TypeId, Error> {
        self.register(
            name,
            TypeDef::Opaque {
                name: name.to_string(),
                methods: BTreeSet::new(),
            },
        )
    }

    /// Registers an opaque host type carrying a method set, making it a
    /// candidate for interface satisfaction.
    pub fn register_concrete<I, S>(&mut self, name: &str, methods: I) -> Result<TypeId, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(
            name,
            TypeDef::Opaque {
                name: name.to_string(),
                methods: methods.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Registers an interface type declared by its method set.
    pub fn register_interface<I, S>(&mut self, name: &str, methods: I) -> Result<TypeId, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(
            name,
            TypeDef::Interface {
                name: name.to_string(),
                methods: methods.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Looks up a type by its [`TypeId`].
    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0 as usize)
    }

    /// Looks up a type's [`TypeId`] by name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Human-readable name for a type, used in diagnostics.
    pub fn display_name(&self, id: TypeId) -> String {
        match self.get(id) {
            Some(TypeDef::Primitive(p)) => p.name().to_string(),
            Some(TypeDef::Opaque { name, .. }) | Some(TypeDef::Interface { name, .. }) => {
                name.clone()
            }
            None => format!("type#{}", id.0),
        }
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        matches!(self.get(id), Some(TypeDef::Interface { .. }))
    }

    fn methods(&self, id: TypeId) -> Option<&BTreeSet<String>> {
        match self.get(id) {
            Some(TypeDef::Opaque { methods, .. }) | Some(TypeDef::Interface { methods, .. }) => {
                Some(methods)
            }
            _ => None,
        }
    }

    /// Returns `true` if `src`'s method set covers every method `iface`
    /// declares. `iface` must be an interface type.
    pub fn implements(&self, src: TypeId, iface: TypeId) -> bool {
        let Some(TypeDef::Interface { methods: want, .. }) = self.get(iface) else {
            return false;
        };
        if want.is_empty() {
            // The empty interface is satisfied by every registered type.
            return self.get(src).is_some();
        }
        match self.methods(src) {
            Some(have) => want.is_subset(have),
            None => false,
        }
    }

    /// Returns `true` if a value of type `src` can stand where `dst` is
    /// required: equal types, or `dst` is an interface `src` implements.
    pub fn assignable(&self, src: TypeId, dst: TypeId) -> bool {
        src == dst || self.implements(src, dst)
    }

    /// Canonical zero payload for a type.
    pub fn zero(&self, id: TypeId) -> Payload {
        match self.get(id) {
            Some(TypeDef::Primitive(Primitive::Bool)) => Payload::Bool(false),
            Some(TypeDef::Primitive(Primitive::Int)) => Payload::Int(0),
            Some(TypeDef::Primitive(Primitive::Float)) => Payload::Float(0.0),
            Some(TypeDef::Primitive(Primitive::Str)) => Payload::Str(String::new()),
            Some(TypeDef::Primitive(Primitive::Unit)) => Payload::Unit,
            _ => Payload::Null(id),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
