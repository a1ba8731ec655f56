//! Ordered tuples of values forming function inputs and outputs.
//!
//! A [`ValueSet`] preserves the original positional order of its values
//! and maintains lookup maps by lowercased name and by type. Named
//! entries are deduplicated by name and Typed entries by type plus
//! subtype, first writer wins.
//!
//! A set built with [`ValueSet::lifted`] represents a flat positional
//! tuple (the host shape had no named aggregate); every element is
//! forced to be type-only and the set behaves positionally on
//! invocation. Semantically a lifted set is identical to a plain one.

use indexmap::IndexMap;

use crate::error::Error;
use crate::payload::Payload;
use crate::types::TypeId;
use crate::value::{Value, ValueKind};

/// Ordered tuple of [`Value`]s representing the inputs or the outputs of
/// a function.
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    values: Vec<Value>,
    named: IndexMap<String, usize>,
    typed: IndexMap<TypeId, usize>,
    lifted: bool,
}

impl ValueSet {
    /// Builds a value set from a list of values, deduplicating Named
    /// entries by name and Typed entries by type and subtype.
    pub fn new(values: Vec<Value>) -> ValueSet {
        let mut set = ValueSet::default();
        for value in values {
            set.push(value);
        }
        set
    }

    /// Builds a lifted value set: a flat positional tuple whose elements
    /// are all type-only.
    pub fn lifted(values: Vec<Value>) -> ValueSet {
        let mut set = ValueSet::new(
            values
                .into_iter()
                .map(|mut v| {
                    v.name = String::new();
                    v
                })
                .collect(),
        );
        set.lifted = true;
        set
    }

    pub fn empty() -> ValueSet {
        ValueSet::default()
    }

    fn push(&mut self, value: Value) {
        match value.kind() {
            ValueKind::Named => {
                if self.named.contains_key(&value.name) {
                    return;
                }
                self.named.insert(value.name.clone(), self.values.len());
            }
            ValueKind::Typed => {
                let duplicate = self
                    .values
                    .iter()
                    .any(|v| v.kind() == ValueKind::Typed && v.ty == value.ty && v.subtype == value.subtype);
                if duplicate {
                    return;
                }
                if !self.typed.contains_key(&value.ty) {
                    self.typed.insert(value.ty, self.values.len());
                }
            }
        }
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_lifted(&self) -> bool {
        self.lifted
    }

    /// Values in declared positional order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Looks up a named value (case-insensitive).
    pub fn named(&self, name: &str) -> Option<&Value> {
        let index = *self.named.get(&name.to_lowercase())?;
        self.values.get(index)
    }

    /// Looks up a typed value by type. When several subtypes of the type
    /// exist, the first declared one is returned; use
    /// [`ValueSet::typed_subtype`] for an exact match.
    pub fn typed(&self, ty: TypeId) -> Option<&Value> {
        let index = *self.typed.get(&ty)?;
        self.values.get(index)
    }

    /// Looks up the value matching both type and subtype exactly.
    pub fn typed_subtype(&self, ty: TypeId, subtype: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|v| v.kind() == ValueKind::Typed && v.ty == ty && v.subtype == subtype)
    }

    pub(crate) fn index_of_named(&self, name: &str) -> Option<usize> {
        self.named.get(&name.to_lowercase()).copied()
    }

    pub(crate) fn index_of_typed(&self, ty: TypeId) -> Option<usize> {
        self.typed.get(&ty).copied()
    }

    /// Payload of the value at a position.
    pub fn payload(&self, index: usize) -> Option<&Payload> {
        self.values.get(index).and_then(|v| v.payload.as_ref())
    }

    /// Payload of a named value.
    pub fn payload_named(&self, name: &str) -> Option<&Payload> {
        self.named(name).and_then(|v| v.payload.as_ref())
    }

    /// Payload of a typed value.
    pub fn payload_typed(&self, ty: TypeId) -> Option<&Payload> {
        self.typed(ty).and_then(|v| v.payload.as_ref())
    }

    /// Sets the payload of the value at a position.
    ///
    /// Panics if `index` is out of range.
    pub fn set_index(&mut self, index: usize, payload: Payload) {
        self.values[index].payload = Some(payload);
    }

    /// Sets the payload of a named value.
    pub fn set_named(&mut self, name: &str, payload: Payload) -> Result<(), Error> {
        match self.index_of_named(name) {
            Some(index) => {
                self.values[index].payload = Some(payload);
                Ok(())
            }
            None => Err(Error::Builder {
                reason: format!("no value named {:?} in set", name),
            }),
        }
    }

    /// Sets the payload of a typed value.
    pub fn set_typed(&mut self, ty: TypeId, payload: Payload) -> Result<(), Error> {
        match self.index_of_typed(ty) {
            Some(index) => {
                self.values[index].payload = Some(payload);
                Ok(())
            }
            None => Err(Error::Builder {
                reason: format!("no value of type {} in set", ty),
            }),
        }
    }

    pub(crate) fn clear_payloads(&mut self) {
        for value in &mut self.values {
            value.payload = None;
        }
    }

    /// Fills every unset payload with the type's zero value.
    pub(crate) fn zero_fill(&mut self, types: &crate::types::TypeRegistry) {
        for value in &mut self.values {
            if value.payload.is_none() {
                value.payload = Some(types.zero(value.ty));
            }
        }
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.values
    }
}
