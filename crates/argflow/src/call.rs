//! Call execution: reaching the target and invoking it.
//!
//! Given the pruned resolution graph, the resolver selects a
//! minimum-weight path from the root to each requirement of the target,
//! replays each path forward executing converters exactly as needed, and
//! assembles the target's argument map. Path selection recomputes
//! shortest paths per requirement on a graph copy so that edges into
//! same-named vertices can be discounted.
//!
//! Values produced during replay never mutate graph vertices; they live
//! in the call state's side table keyed by vertex identity. The
//! effective value of a vertex is the side table's entry first, then the
//! construction-time payload.

use std::collections::HashMap;

use argflow_graph::{Direction, GraphVertex};
use indexmap::IndexMap;
use tracing::trace;

use crate::args::{Arg, ArgBuilder};
use crate::callgraph::{self, ResolveGraph, WEIGHT_MATCHING_NAME};
use crate::error::{Error, UnsatisfiedError};
use crate::func::Func;
use crate::payload::Payload;
use crate::result::FuncResult;
use crate::types::{TypeId, TypeRegistry};
use crate::vertex::{Vertex, VertexKey};

/// Shared state for the execution of a single call.
pub(crate) struct CallState {
    /// Known named values.
    pub named: HashMap<String, Payload>,
    /// Known typed values.
    pub typed: HashMap<TypeId, Payload>,
    /// The last value seen while replaying the current path.
    pub last: Option<Payload>,
    /// Side table of vertex values produced during resolution.
    pub values: HashMap<VertexKey, Payload>,
    /// The input vertices whose paths were consumed, in use order.
    pub input_set: IndexMap<VertexKey, Vertex>,
}

impl CallState {
    pub(crate) fn new() -> CallState {
        CallState {
            named: HashMap::new(),
            typed: HashMap::new(),
            last: None,
            values: HashMap::new(),
            input_set: IndexMap::new(),
        }
    }

    /// The effective value of a vertex: resolver-produced first, then
    /// the construction-time payload.
    fn value_of(&self, g: &ResolveGraph, key: &VertexKey) -> Option<Payload> {
        if let Some(p) = self.values.get(key) {
            return Some(p.clone());
        }
        g.vertex(key).and_then(Vertex::payload).cloned()
    }
}

impl Func {
    /// Calls the function, deciding whether it can be invoked from the
    /// given args, synthesizing any missing inputs by chaining
    /// converters, and invoking it with the resulting argument set.
    pub fn call(&self, args: impl IntoIterator<Item = Arg>) -> FuncResult {
        let merged: Vec<Arg> = self.call_opts.iter().cloned().chain(args).collect();
        let builder = match ArgBuilder::build(merged) {
            Ok(builder) => builder,
            Err(err) => return FuncResult::from_error(err),
        };
        trace!(func = %self.name(), "call");

        let cg = match callgraph::build(self, &builder) {
            Ok(cg) => cg,
            Err(err) => return FuncResult::from_error(err),
        };

        let mut state = CallState::new();
        let arg_map = match reach_target(
            &cg.graph,
            &cg.root,
            &cg.target,
            &mut state,
            false,
            self.types(),
        ) {
            Ok(map) => map,
            Err(err) => return FuncResult::from_error(err),
        };

        self.call_direct(&arg_map)
    }

    /// Invokes the function directly with resolved argument values,
    /// skipping graph construction. Every requirement must be present in
    /// `arg_map`.
    pub(crate) fn call_direct(&self, arg_map: &HashMap<VertexKey, Payload>) -> FuncResult {
        let mut assignments: Vec<(usize, Payload)> = Vec::new();
        let mut missing: Vec<String> = Vec::new();

        for (index, value) in self.input().values().iter().enumerate() {
            match arg_map.get(&value.vertex_key()) {
                Some(payload) => {
                    trace!(index, payload = ?payload, "argument");
                    assignments.push((index, payload.clone()));
                }
                None => missing.push(value.describe(self.types())),
            }
        }

        if !missing.is_empty() {
            let report = UnsatisfiedError {
                func: self.name(),
                missing,
                declared: self
                    .input()
                    .values()
                    .iter()
                    .map(|v| v.describe(self.types()))
                    .collect(),
                inputs: Vec::new(),
                converters: Vec::new(),
            };
            return FuncResult::from_error(Error::Unsatisfied(Box::new(report)));
        }

        let mut input = self.input().clone();
        for (index, payload) in assignments {
            input.set_index(index, payload);
        }

        self.invoke(&input)
    }

    /// Pushes the outputs of a finished call onto the product vertices
    /// feeding this function's vertex.
    fn push_outputs(
        &self,
        outs: &[crate::value::Value],
        product_keys: &[VertexKey],
        state: &mut CallState,
    ) {
        for key in product_keys {
            let index = match key {
                VertexKey::Value { name, .. } => self.output().index_of_named(name),
                VertexKey::TypedOutput { ty, .. } => self.output().index_of_typed(*ty),
                _ => None,
            };
            let Some(index) = index else { continue };
            if let Some(payload) = outs.get(index).and_then(|v| v.payload.clone()) {
                trace!(?key, payload = ?payload, "converter output");
                state.values.insert(key.clone(), payload);
            }
        }
    }
}

/// Ensures every requirement of `target` has a concrete value, walking
/// ancestors and executing converters as needed, and returns the
/// per-requirement argument map.
pub(crate) fn reach_target(
    g: &ResolveGraph,
    root: &VertexKey,
    target: &VertexKey,
    state: &mut CallState,
    redefine: bool,
    types: &TypeRegistry,
) -> Result<HashMap<VertexKey, Payload>, Error> {
    trace!(?target, "reach target");

    let mut arg_map: HashMap<VertexKey, Payload> = HashMap::new();

    // Decide which requirements still need values. Root edges and typed
    // requests that already hold a value are reused directly.
    let mut pending: Vec<VertexKey> = Vec::new();
    for requirement in g.neighbors(target, Direction::Outgoing) {
        let key = requirement.key();
        let mut skip = false;
        match requirement {
            Vertex::Root => skip = true,
            Vertex::TypedArg(_) => {
                if let Some(payload) = state.value_of(g, &key) {
                    arg_map.insert(key.clone(), payload);
                    skip = true;
                }
            }
            _ => {}
        }
        if skip {
            state.input_set.insert(key, requirement.clone());
            continue;
        }
        trace!(?key, "requirement is missing");
        pending.push(key);
    }

    if pending.is_empty() {
        trace!(?target, "target satisfied");
        return Ok(arg_map);
    }

    // Select a minimum-weight path from the root to each pending
    // requirement. For named requirements, the search runs on a copy
    // where edges into same-named vertices are discounted.
    let mut paths: Vec<Vec<VertexKey>> = Vec::new();
    for requirement in &pending {
        let path = match requirement {
            VertexKey::Value { name, .. } => {
                let mut copy = g.clone();
                let same_named: Vec<VertexKey> = copy
                    .vertices()
                    .filter_map(|v| match v {
                        Vertex::Value(vv) if vv.name == *name => Some(v.key()),
                        _ => None,
                    })
                    .collect();
                for key in &same_named {
                    for src in copy.neighbor_keys(key, Direction::Incoming) {
                        copy.set_edge_weight(&src, key, WEIGHT_MATCHING_NAME);
                    }
                }
                let pm = copy.shortest_path(root, Direction::Incoming);
                copy.path_to(&pm, requirement)
            }
            _ => {
                let pm = g.shortest_path(root, Direction::Incoming);
                g.path_to(&pm, requirement)
            }
        };

        let Some(path) = path else {
            let func = match g.vertex(target) {
                Some(Vertex::Func(fv)) => fv.func.name(),
                _ => format!("{:?}", target),
            };
            let report = UnsatisfiedError {
                func,
                missing: g
                    .vertex(requirement)
                    .and_then(Vertex::input_value)
                    .map(|v| v.describe(types))
                    .into_iter()
                    .collect(),
                declared: Vec::new(),
                inputs: Vec::new(),
                converters: Vec::new(),
            };
            return Err(Error::Unsatisfied(Box::new(report)));
        };
        trace!(?requirement, ?path, "selected path");

        // Record which input anchors this path.
        let input_key = if path.len() > 1 {
            path[1].clone()
        } else {
            path[0].clone()
        };
        if let Some(input_vertex) = g.vertex(&input_key) {
            state.input_set.insert(input_key.clone(), input_vertex.clone());
        }

        // Under redefinition the initial input is assumed to be
        // available: give it the type's zero value so downstream steps
        // can proceed symbolically.
        if redefine {
            match g.vertex(&input_key) {
                Some(Vertex::Value(v)) => {
                    if state.value_of(g, &input_key).is_none() {
                        state.values.insert(input_key.clone(), types.zero(v.ty));
                    }
                }
                Some(Vertex::TypedArg(v)) => {
                    state.values.insert(input_key.clone(), types.zero(v.ty));
                }
                _ => {}
            }
        }

        paths.push(path);
    }

    // Replay each path forward, updating the call state and executing
    // function vertices as they are crossed.
    for path in &paths {
        let mut final_value: Option<Payload> = None;

        for (idx, key) in path.iter().enumerate() {
            let vertex = g
                .vertex(key)
                .unwrap_or_else(|| panic!("path vertex missing from graph: {:?}", key))
                .clone();
            trace!(?key, "replaying vertex");

            let prev_is_output = idx > 0 && matches!(path[idx - 1], VertexKey::TypedOutput { .. });

            match vertex {
                Vertex::Root => {}

                Vertex::Value(v) => {
                    // A named value inherits from a typed product
                    // directly upstream of it on the path.
                    if prev_is_output {
                        if let Some(payload) = state.value_of(g, &path[idx - 1]) {
                            state.values.insert(key.clone(), payload);
                        }
                    }
                    let current = state.value_of(g, key);
                    if let Some(payload) = &current {
                        state.named.insert(v.name.clone(), payload.clone());
                        final_value = Some(payload.clone());
                    }
                    state.last = current;
                }

                Vertex::TypedArg(v) => {
                    // Take the last seen value if it fits this request.
                    if let Some(last) = &state.last {
                        if types.assignable(last.type_id(), v.ty) {
                            state.values.insert(key.clone(), last.clone());
                        }
                    }
                    let current = state.value_of(g, key);
                    if let Some(payload) = &current {
                        state.typed.insert(v.ty, payload.clone());
                    }
                    final_value = current;
                }

                Vertex::TypedOutput(v) => {
                    // Chained typed products inherit along the path;
                    // this is how interface vertices take an
                    // implementation's value.
                    if prev_is_output {
                        if let Some(payload) = state.value_of(g, &path[idx - 1]) {
                            state.values.insert(key.clone(), payload);
                        }
                    }
                    let current = state.value_of(g, key);
                    if let Some(payload) = &current {
                        state.typed.insert(v.ty, payload.clone());
                    }
                    state.last = current;
                }

                Vertex::Func(fv) => {
                    // Satisfy the function's own requirements, then run
                    // it and publish its products.
                    let func_args = reach_target(g, root, key, state, redefine, types)?;
                    let result = fv.func.call_direct(&func_args);
                    let outs = result.into_result().map_err(|err| Error::Converter {
                        name: fv.func.name(),
                        source: Box::new(err),
                    })?;
                    let product_keys = g.neighbor_keys(key, Direction::Incoming);
                    fv.func.push_outputs(&outs, &product_keys, state);
                }
            }
        }

        let last_key = path.last().expect("paths are never empty");
        let Some(payload) = final_value else {
            return Err(Error::Message(format!(
                "resolution path produced no value for {:?}",
                last_key
            )));
        };
        trace!(?last_key, payload = ?payload, "requirement value");
        arg_map.insert(last_key.clone(), payload);
    }

    Ok(arg_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::TypedVertex;

    #[test]
    fn side_table_shadows_vertex_payload() {
        let mut g = ResolveGraph::new();
        let key = g.add(Vertex::TypedOutput(TypedVertex {
            ty: TypeId::INT,
            subtype: String::new(),
            payload: Some(Payload::Int(1)),
        }));

        let mut state = CallState::new();
        assert_eq!(state.value_of(&g, &key), Some(Payload::Int(1)));

        state.values.insert(key.clone(), Payload::Int(2));
        assert_eq!(state.value_of(&g, &key), Some(Payload::Int(2)));
    }

    #[test]
    fn value_of_unknown_vertex_is_none() {
        let g = ResolveGraph::new();
        let state = CallState::new();
        assert_eq!(state.value_of(&g, &VertexKey::Root), None);
    }
}
