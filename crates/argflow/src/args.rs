//! Call arguments: direct inputs, converters, and redefine controls.
//!
//! An [`Arg`] is an opaque token passed to [`Func::call`](crate::Func::call)
//! or [`Func::redefine`](crate::Func::redefine). The free constructors in
//! this module mirror the surface of the engine: named and typed inputs
//! (with optional subtypes), converter registration, converter
//! generators, and input/output filters.
//!
//! Empty names and subtypes degrade: `named("", v)` is `typed(v)`,
//! `named_subtype(n, v, "")` is `named(n, v)`, and so on. Supplying the
//! same named or typed input twice replaces the earlier one.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Error;
use crate::filter::Filter;
use crate::func::Func;
use crate::payload::Payload;
use crate::types::{TypeId, TypeRegistry};
use crate::value::Value;

/// A user-supplied factory: given one value already present in the
/// resolution graph, it may (or may not) synthesize a new converter.
#[derive(Clone)]
pub struct ConverterGen(pub(crate) Arc<dyn Fn(&Value) -> Result<Option<Func>, Error> + Send + Sync>);

/// An option to [`Func::call`](crate::Func::call) that sets state for the
/// call: a direct input, a converter, or a redefine control.
#[derive(Clone)]
pub struct Arg {
    pub(crate) kind: ArgKind,
}

#[derive(Clone)]
pub(crate) enum ArgKind {
    Named { name: String, payload: Payload },
    NamedSubtype { name: String, payload: Payload, subtype: String },
    Typed { payload: Payload },
    TypedSubtype { payload: Payload, subtype: String },
    Converter(Func),
    Converters(Vec<Func>),
    ConverterGen(ConverterGen),
    FilterInput(Filter),
    FilterOutput(Filter),
    FuncName(String),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.kind {
            ArgKind::Named { .. } => "Named",
            ArgKind::NamedSubtype { .. } => "NamedSubtype",
            ArgKind::Typed { .. } => "Typed",
            ArgKind::TypedSubtype { .. } => "TypedSubtype",
            ArgKind::Converter(_) => "Converter",
            ArgKind::Converters(_) => "Converters",
            ArgKind::ConverterGen(_) => "ConverterGen",
            ArgKind::FilterInput(_) => "FilterInput",
            ArgKind::FilterOutput(_) => "FilterOutput",
            ArgKind::FuncName(_) => "FuncName",
        };
        f.write_str(name)
    }
}

fn arg(kind: ArgKind) -> Arg {
    Arg { kind }
}

/// A named input. Satisfies any requirement where the name matches
/// case-insensitively and the payload's type is assignable.
///
/// An empty name is equivalent to [`typed`].
pub fn named(name: impl Into<String>, payload: Payload) -> Arg {
    let name = name.into();
    if name.is_empty() {
        return typed(payload);
    }
    arg(ArgKind::Named {
        name: name.to_lowercase(),
        payload,
    })
}

/// Same as [`named`] but with a subtype key. An empty subtype is
/// equivalent to [`named`]; an empty name to [`typed_subtype`].
pub fn named_subtype(
    name: impl Into<String>,
    payload: Payload,
    subtype: impl Into<String>,
) -> Arg {
    let name = name.into();
    let subtype = subtype.into();
    if name.is_empty() {
        return typed_subtype(payload, subtype);
    }
    if subtype.is_empty() {
        return named(name, payload);
    }
    arg(ArgKind::NamedSubtype {
        name: name.to_lowercase(),
        payload,
        subtype,
    })
}

/// A typed input, keyed by the payload's type. Satisfies any requirement
/// of an assignable type, regardless of name.
pub fn typed(payload: Payload) -> Arg {
    arg(ArgKind::Typed { payload })
}

/// Same as [`typed`] but with a subtype key. An empty subtype is
/// equivalent to [`typed`].
pub fn typed_subtype(payload: Payload, subtype: impl Into<String>) -> Arg {
    let subtype = subtype.into();
    if subtype.is_empty() {
        return typed(payload);
    }
    arg(ArgKind::TypedSubtype { payload, subtype })
}

/// Registers a converter to be invoked only if reaching a required input
/// demands it.
pub fn converter(func: Func) -> Arg {
    arg(ArgKind::Converter(func))
}

/// Registers several converters at once; `None` entries are dropped.
pub fn converters(funcs: impl IntoIterator<Item = Option<Func>>) -> Arg {
    arg(ArgKind::Converters(funcs.into_iter().flatten().collect()))
}

/// Registers a converter generator. Generators run once per value in the
/// resolution graph, in registration order; returning `Ok(None)`
/// produces nothing.
pub fn converter_gen(
    gen: impl Fn(&Value) -> Result<Option<Func>, Error> + Send + Sync + 'static,
) -> Arg {
    arg(ArgKind::ConverterGen(ConverterGen(Arc::new(gen))))
}

/// Restricts which values count as inputs during redefinition. Has no
/// effect on a plain call.
pub fn filter_input(filter: Filter) -> Arg {
    arg(ArgKind::FilterInput(filter))
}

/// Validates the target's outputs during redefinition. Has no effect on
/// a plain call.
pub fn filter_output(filter: Filter) -> Arg {
    arg(ArgKind::FilterOutput(filter))
}

/// Names the target function for diagnostics.
pub fn func_name(name: impl Into<String>) -> Arg {
    arg(ArgKind::FuncName(name.into()))
}

/// Accumulated call state decoded from a list of [`Arg`]s.
pub(crate) struct ArgBuilder {
    pub(crate) named: IndexMap<String, Payload>,
    pub(crate) named_sub: IndexMap<String, IndexMap<String, Payload>>,
    pub(crate) typed: IndexMap<TypeId, Payload>,
    pub(crate) typed_sub: IndexMap<TypeId, IndexMap<String, Payload>>,
    pub(crate) convs: Vec<Func>,
    pub(crate) conv_gens: Vec<ConverterGen>,
    pub(crate) redefining: bool,
    pub(crate) filter_input: Option<Filter>,
    pub(crate) filter_output: Option<Filter>,
    pub(crate) func_name: Option<String>,
}

impl ArgBuilder {
    pub(crate) fn build(args: impl IntoIterator<Item = Arg>) -> Result<ArgBuilder, Error> {
        let mut builder = ArgBuilder {
            named: IndexMap::new(),
            named_sub: IndexMap::new(),
            typed: IndexMap::new(),
            typed_sub: IndexMap::new(),
            convs: Vec::new(),
            conv_gens: Vec::new(),
            redefining: false,
            filter_input: None,
            filter_output: None,
            func_name: None,
        };

        for arg in args {
            match arg.kind {
                ArgKind::Named { name, payload } => {
                    builder.named.insert(name, payload);
                }
                ArgKind::NamedSubtype { name, payload, subtype } => {
                    builder
                        .named_sub
                        .entry(name)
                        .or_default()
                        .insert(subtype, payload);
                }
                ArgKind::Typed { payload } => {
                    builder.typed.insert(payload.type_id(), payload);
                }
                ArgKind::TypedSubtype { payload, subtype } => {
                    builder
                        .typed_sub
                        .entry(payload.type_id())
                        .or_default()
                        .insert(subtype, payload);
                }
                ArgKind::Converter(func) => builder.convs.push(func),
                ArgKind::Converters(funcs) => builder.convs.extend(funcs),
                ArgKind::ConverterGen(gen) => builder.conv_gens.push(gen),
                ArgKind::FilterInput(filter) => builder.filter_input = Some(filter),
                ArgKind::FilterOutput(filter) => builder.filter_output = Some(filter),
                ArgKind::FuncName(name) => builder.func_name = Some(name),
            }
        }

        Ok(builder)
    }

    /// Descriptions of every direct input, for diagnostics.
    pub(crate) fn describe_inputs(&self, types: &TypeRegistry) -> Vec<String> {
        let mut out = Vec::new();
        for (name, payload) in &self.named {
            out.push(Value::named(name, payload.type_id()).describe(types));
        }
        for (name, subs) in &self.named_sub {
            for (subtype, payload) in subs {
                out.push(
                    Value::named(name, payload.type_id())
                        .with_subtype(subtype)
                        .describe(types),
                );
            }
        }
        for (ty, _) in &self.typed {
            out.push(Value::typed(*ty).describe(types));
        }
        for (ty, subs) in &self.typed_sub {
            for (subtype, _) in subs {
                out.push(Value::typed(*ty).with_subtype(subtype).describe(types));
            }
        }
        out
    }

    /// Descriptions of every converter with its inputs (`>`) and outputs
    /// (`<`), for diagnostics.
    pub(crate) fn describe_converters(&self, types: &TypeRegistry) -> Vec<String> {
        self.convs
            .iter()
            .map(|conv| {
                let mut lines = vec![format!("    - {}", conv.name())];
                for value in conv.input().values() {
                    lines.push(format!("        > {}", value.describe(types)));
                }
                for value in conv.output().values() {
                    lines.push(format!("        < {}", value.describe(types)));
                }
                lines.join("\n")
            })
            .collect()
    }
}
