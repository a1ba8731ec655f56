//! The `argmapper` field tag grammar.
//!
//! Field specifications use a single tag with comma-separated
//! components: position 0 optionally renames the field, and subsequent
//! `key` or `key=value` pairs set options. Recognized keys are
//! `typeOnly` (marks the field as type-only) and `subtype=<string>`.
//! Unrecognized keys are ignored.
//!
//! ```text
//! ""                      keep the field name
//! "b"                     rename to "b"
//! ",typeOnly"             type-only field
//! "b,subtype=foo"         rename and set subtype
//! ```

use crate::types::TypeId;
use crate::value::Value;
use crate::value_set::ValueSet;

/// Parsed contents of an `argmapper` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    /// Replacement name from position 0, if non-empty.
    pub rename: Option<String>,
    /// Whether the field is matched by type only.
    pub type_only: bool,
    /// Subtype label, if set.
    pub subtype: Option<String>,
}

impl FieldTag {
    pub fn parse(tag: &str) -> FieldTag {
        let mut parsed = FieldTag::default();
        let mut parts = tag.split(',');

        if let Some(first) = parts.next() {
            if !first.is_empty() {
                parsed.rename = Some(first.to_string());
            }
        }

        for part in parts {
            match part.split_once('=') {
                Some(("subtype", value)) => parsed.subtype = Some(value.to_string()),
                Some(_) => {}
                None => {
                    if part == "typeOnly" {
                        parsed.type_only = true;
                    }
                }
            }
        }

        parsed
    }
}

/// One field of an aggregate input or output record.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a> {
    /// Field name; the tag's rename takes precedence.
    pub name: &'a str,
    pub ty: TypeId,
    /// `argmapper` tag contents, without the surrounding quotes.
    pub tag: &'a str,
}

/// Builds a [`ValueSet`] from field specifications, applying the tag
/// grammar: renames, `typeOnly` degradation to type-only values, and
/// subtypes. Names are lowercased.
pub fn value_set_from_fields(fields: &[FieldSpec<'_>]) -> ValueSet {
    let values = fields
        .iter()
        .map(|field| {
            let tag = FieldTag::parse(field.tag);
            let name = if tag.type_only {
                String::new()
            } else {
                tag.rename.unwrap_or_else(|| field.name.to_string())
            };
            let mut value = Value::named(name, field.ty);
            if let Some(subtype) = tag.subtype {
                value = value.with_subtype(subtype);
            }
            value
        })
        .collect();
    ValueSet::new(values)
}
