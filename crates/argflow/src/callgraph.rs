//! Resolution graph construction.
//!
//! Builds the weighted graph relating the target function, the direct
//! inputs, and the converter pool, then prunes it to the part reachable
//! from the input root. Edge direction means "depends on": out-edges
//! point at requirements, in-edges at products. The weight scheme below
//! is the only place domain knowledge leaks into the graph.

use std::collections::HashSet;

use argflow_graph::{Direction, GraphVertex};
use tracing::trace;

use crate::args::ArgBuilder;
use crate::error::{Error, UnsatisfiedError};
use crate::func::Func;
use crate::value::ValueKind;
use crate::vertex::{FuncVertex, TypedVertex, ValueVertex, Vertex, VertexKey};

/// The typical edge weight.
pub(crate) const WEIGHT_NORMAL: i32 = 1;

/// Weight for edges connected to any type-only vertex. Heavier, since
/// valued (named) vertices are preferred.
pub(crate) const WEIGHT_TYPED: i32 = 5;

/// Weight for edges connecting matching types whose subtypes differ, so
/// exact-subtype matches are strictly preferred.
pub(crate) const WEIGHT_TYPED_OTHER_SUBTYPE: i32 = 20;

/// Weight set on edges into any named vertex that shares the current
/// requirement's name. Applied on a graph copy per requirement; makes
/// shortest paths prefer routing through same-named values.
pub(crate) const WEIGHT_MATCHING_NAME: i32 = -1;

pub(crate) type ResolveGraph = argflow_graph::Graph<Vertex>;

/// The constructed graph plus the keys the resolver needs.
#[derive(Debug)]
pub(crate) struct CallGraph {
    pub graph: ResolveGraph,
    pub root: VertexKey,
    pub target: VertexKey,
    /// Vertices holding the caller's direct inputs.
    pub inputs: Vec<VertexKey>,
}

impl Func {
    /// Adds this function to the graph: a `Func` vertex with its
    /// requirements as out-edges. A function with zero requirements is
    /// edged directly to the root so it survives pruning.
    ///
    /// `include_output` adds the products as in-edges; true for
    /// converters, false for the target.
    pub(crate) fn add_to_graph(
        &self,
        g: &mut ResolveGraph,
        root: &VertexKey,
        include_output: bool,
    ) -> VertexKey {
        let key = g.add(Vertex::Func(FuncVertex { func: self.clone() }));

        if self.input().is_empty() {
            g.add_edge(&key, root, WEIGHT_NORMAL);
        }

        for value in self.input().values() {
            match value.kind() {
                ValueKind::Named => {
                    let dep = g.add(Vertex::value(&value.name, value.ty, &value.subtype));
                    g.add_edge(&key, &dep, WEIGHT_NORMAL);
                }
                ValueKind::Typed => {
                    let dep = g.add(Vertex::typed_arg(value.ty, &value.subtype));
                    g.add_edge(&key, &dep, WEIGHT_TYPED);
                }
            }
        }

        if include_output {
            for value in self.output().values() {
                match value.kind() {
                    ValueKind::Named => {
                        let out = g.add(Vertex::value(&value.name, value.ty, &value.subtype));
                        g.add_edge(&out, &key, WEIGHT_NORMAL);
                    }
                    ValueKind::Typed => {
                        let out = g.add(Vertex::typed_output(value.ty, &value.subtype));
                        g.add_edge(&out, &key, WEIGHT_TYPED);
                    }
                }
            }
        }

        key
    }
}

/// Adds the direct inputs: named inputs become `Value` vertices, typed
/// inputs become `TypedOutput` vertices, all with their payload set and
/// an edge to the root. Returns the input vertex keys.
fn add_inputs(builder: &ArgBuilder, g: &mut ResolveGraph, root: &VertexKey) -> Vec<VertexKey> {
    let mut inputs = Vec::new();

    for (name, payload) in &builder.named {
        trace!(name = %name, "named input");
        let key = g.add_overwrite(Vertex::Value(ValueVertex {
            name: name.clone(),
            ty: payload.type_id(),
            subtype: String::new(),
            payload: Some(payload.clone()),
        }));
        g.add_edge(&key, root, WEIGHT_NORMAL);
        inputs.push(key);
    }

    for (name, subs) in &builder.named_sub {
        for (subtype, payload) in subs {
            trace!(name = %name, subtype = %subtype, "named input");
            let key = g.add_overwrite(Vertex::Value(ValueVertex {
                name: name.clone(),
                ty: payload.type_id(),
                subtype: subtype.clone(),
                payload: Some(payload.clone()),
            }));
            g.add_edge(&key, root, WEIGHT_NORMAL);
            inputs.push(key);
        }
    }

    for (ty, payload) in &builder.typed {
        trace!(ty = %ty, "typed input");
        let key = g.add_overwrite(Vertex::TypedOutput(TypedVertex {
            ty: *ty,
            subtype: String::new(),
            payload: Some(payload.clone()),
        }));
        g.add_edge(&key, root, WEIGHT_NORMAL);
        inputs.push(key);
    }

    for (ty, subs) in &builder.typed_sub {
        for (subtype, payload) in subs {
            trace!(ty = %ty, subtype = %subtype, "typed input");
            let key = g.add_overwrite(Vertex::TypedOutput(TypedVertex {
                ty: *ty,
                subtype: subtype.clone(),
                payload: Some(payload.clone()),
            }));
            g.add_edge(&key, root, WEIGHT_NORMAL);
            inputs.push(key);
        }
    }

    inputs
}

/// Builds the resolution graph shared by call and redefine.
pub(crate) fn build(target: &Func, builder: &ArgBuilder) -> Result<CallGraph, Error> {
    let types = target.types().clone();
    let mut g = ResolveGraph::new();

    // Shared root. Anything reachable from the root is not pruned.
    let root = g.add(Vertex::Root);

    // The target function and its requirements.
    let target_key = target.add_to_graph(&mut g, &root, false);
    let requirements = g.neighbor_keys(&target_key, Direction::Outgoing);

    // Direct inputs.
    let inputs = add_inputs(builder, &mut g, &root);

    // Converters.
    for conv in &builder.convs {
        conv.add_to_graph(&mut g, &root, true);
    }

    // Converter generators: every vertex that maps to a value is offered
    // to each generator, in registration order. Produced converters are
    // spliced in like ordinary ones.
    if !builder.conv_gens.is_empty() {
        let candidates: Vec<crate::value::Value> =
            g.vertices().filter_map(Vertex::as_value).collect();
        for value in &candidates {
            for gen in &builder.conv_gens {
                if let Some(conv) = (gen.0)(value)? {
                    trace!(conv = %conv.name(), "generated converter");
                    conv.add_to_graph(&mut g, &root, true);
                }
            }
        }
    }

    // A named value can satisfy a typed request: for every named vertex,
    // connect it to the bare typed product of its type, and let typed
    // requests (exact and subtyped) draw from it.
    let named: Vec<(VertexKey, String, crate::types::TypeId, String)> = g
        .vertices()
        .filter_map(|v| match v {
            Vertex::Value(vv) => Some((v.key(), vv.name.clone(), vv.ty, vv.subtype.clone())),
            _ => None,
        })
        .collect();
    for (key, _, ty, subtype) in &named {
        let out = g.add(Vertex::typed_output(*ty, ""));
        g.add_edge(key, &out, WEIGHT_TYPED);

        let arg = g.add(Vertex::typed_arg(*ty, ""));
        g.add_edge(&arg, key, WEIGHT_TYPED);

        if !subtype.is_empty() {
            let arg = g.add(Vertex::typed_arg(*ty, subtype.as_str()));
            g.add_edge(&arg, key, WEIGHT_TYPED);
        }
    }

    // Typed requests depend on typed products of the same type and
    // subtype, letting two converters chain through bare types.
    let typed_args: Vec<(VertexKey, crate::types::TypeId, String)> = g
        .vertices()
        .filter_map(|v| match v {
            Vertex::TypedArg(tv) => Some((v.key(), tv.ty, tv.subtype.clone())),
            _ => None,
        })
        .collect();
    for (key, ty, subtype) in &typed_args {
        let out = g.add(Vertex::typed_output(*ty, subtype.as_str()));
        g.add_edge(key, &out, WEIGHT_TYPED);
    }

    // Interface satisfaction: a typed product of interface kind can take
    // its value from any typed product whose type implements it.
    let typed_outs: Vec<(VertexKey, crate::types::TypeId)> = g
        .vertices()
        .filter_map(|v| match v {
            Vertex::TypedOutput(tv) => Some((v.key(), tv.ty)),
            _ => None,
        })
        .collect();
    for (iface_key, iface_ty) in &typed_outs {
        if !types.is_interface(*iface_ty) {
            continue;
        }
        for (impl_key, impl_ty) in &typed_outs {
            if impl_key == iface_key || !types.implements(*impl_ty, *iface_ty) {
                continue;
            }
            g.add_edge(iface_key, impl_key, WEIGHT_TYPED);
        }
    }

    // Subtype relaxation, named: a named value with no subtype and no
    // payload can draw from a same-named, same-typed value that has a
    // subtype.
    for (key, name, ty, subtype) in &named {
        if !subtype.is_empty() || g.vertex(key).and_then(Vertex::payload).is_some() {
            continue;
        }
        for (other_key, other_name, other_ty, other_subtype) in &named {
            if other_name != name || other_ty != ty || other_subtype.is_empty() {
                continue;
            }
            g.add_edge(key, other_key, WEIGHT_TYPED);
        }
    }

    // Subtype relaxation, typed: requests without a subtype can draw
    // from subtyped products and vice versa, at a weight that keeps
    // exact matches strictly preferred.
    let typed_outs: Vec<(VertexKey, crate::types::TypeId, String)> = g
        .vertices()
        .filter_map(|v| match v {
            Vertex::TypedOutput(tv) => Some((v.key(), tv.ty, tv.subtype.clone())),
            _ => None,
        })
        .collect();
    for (arg_key, arg_ty, arg_subtype) in &typed_args {
        for (out_key, out_ty, out_subtype) in &typed_outs {
            if out_ty != arg_ty {
                continue;
            }
            let crosses = (arg_subtype.is_empty() && !out_subtype.is_empty())
                || (!arg_subtype.is_empty() && out_subtype.is_empty());
            if crosses {
                g.add_edge(arg_key, out_key, WEIGHT_TYPED_OTHER_SUBTYPE);
            }
        }
    }

    // When a typed request can be satisfied by an already-valued named
    // value, drop its edges to every other provider so the direct input
    // wins over converter chains.
    for (arg_key, _, _) in &typed_args {
        let dests = g.neighbor_keys(arg_key, Direction::Outgoing);
        let valued: Vec<&VertexKey> = dests
            .iter()
            .filter(|d| {
                matches!(d, VertexKey::Value { .. })
                    && g.vertex(d).and_then(Vertex::payload).is_some()
            })
            .collect();
        if valued.is_empty() {
            continue;
        }
        let keep: HashSet<VertexKey> = valued.into_iter().cloned().collect();
        for dest in &dests {
            if !keep.contains(dest) {
                g.remove_edge(arg_key, dest);
            }
        }
    }

    // Under redefinition, every named value and typed request the input
    // filter accepts becomes a candidate input and is anchored to the
    // root; rejected ones are left unanchored so they surface as
    // unsatisfied.
    if builder.redefining {
        let candidates: Vec<(VertexKey, crate::value::Value)> = g
            .vertices()
            .filter_map(|v| v.input_value().map(|val| (v.key(), val)))
            .collect();
        for (key, value) in candidates {
            if let Some(filter) = &builder.filter_input {
                if !filter.matches(&value) {
                    trace!(value = %value.describe(&types), "input excluded by filter");
                    continue;
                }
            }
            g.add_edge(&key, &root, WEIGHT_NORMAL);
        }
    }

    trace!(graph = %g, "resolution graph before pruning");

    // Prune: DFS over the reverse graph from the root; anything not
    // visited is unreachable from the inputs. Descent stops at the
    // target so only paths leading up to it are kept.
    let mut visited: HashSet<VertexKey> = HashSet::new();
    g.dfs(&root, Direction::Incoming, &mut |v| {
        let key = v.key();
        let descend = key != target_key;
        visited.insert(key);
        descend
    });
    let unreachable: Vec<VertexKey> = g
        .keys()
        .filter(|k| !visited.contains(*k))
        .cloned()
        .collect();
    for key in &unreachable {
        g.remove(key);
    }

    trace!(graph = %g, "resolution graph after pruning");

    // Satisfiability: every requirement of the target must have survived
    // pruning. All failures are reported together.
    let missing: HashSet<&VertexKey> = requirements.iter().filter(|k| !g.contains(k)).collect();
    if !missing.is_empty() {
        let report = UnsatisfiedError {
            func: builder
                .func_name
                .clone()
                .unwrap_or_else(|| target.name()),
            missing: target
                .input()
                .values()
                .iter()
                .filter(|v| missing.contains(&v.vertex_key()))
                .map(|v| v.describe(&types))
                .collect(),
            declared: target
                .input()
                .values()
                .iter()
                .map(|v| v.describe(&types))
                .collect(),
            inputs: builder.describe_inputs(&types),
            converters: builder.describe_converters(&types),
        };
        return Err(Error::Unsatisfied(Box::new(report)));
    }

    Ok(CallGraph {
        graph: g,
        root,
        target: target_key,
        inputs,
    })
}
