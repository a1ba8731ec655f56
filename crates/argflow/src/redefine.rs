//! Function redefinition.
//!
//! [`Func::redefine`] constructs a new function whose declared
//! parameters are exactly the unsatisfied inputs of the original, after
//! accounting for the given inputs, converters, and filters. The
//! resolution graph is built in redefinition mode (candidate inputs
//! anchored to the root), every function body is replaced by a
//! zero-producing stub, and a dry run of the resolver records which
//! input vertices its paths consume.

use std::collections::HashSet;

use tracing::trace;

use crate::args::{self, Arg, ArgBuilder};
use crate::call::{reach_target, CallState};
use crate::callgraph;
use crate::error::Error;
use crate::func::Func;
use crate::value::{Value, ValueKind};
use crate::value_set::ValueSet;
use crate::vertex::{Vertex, VertexKey};

impl Func {
    /// Returns a new function that depends only on the arguments missing
    /// from `args`. Calling the redefined function with those missing
    /// arguments forwards them, together with the original args, into a
    /// fresh call of the original function.
    ///
    /// With an input filter, only accepted values count as providable
    /// inputs; with an output filter, every declared output must pass or
    /// redefinition fails.
    pub fn redefine(&self, args: impl IntoIterator<Item = Arg>) -> Result<Func, Error> {
        let base_args: Vec<Arg> = self.call_opts.iter().cloned().chain(args).collect();
        let mut builder = ArgBuilder::build(base_args.clone())?;
        trace!(func = %self.name(), "redefine");

        // Outputs are validated only; conversion of outputs through the
        // filter is not attempted.
        if let Some(filter) = &builder.filter_output {
            let mut errors = Vec::new();
            for value in self.output().values() {
                if !filter.matches(value) {
                    errors.push(Error::Filter {
                        value: value.describe(self.types()),
                    });
                }
            }
            if !errors.is_empty() {
                return Err(Error::aggregate(errors));
            }
        }

        builder.redefining = true;
        let mut cg = callgraph::build(self, &builder)?;

        // Swap every function body for a zero-producing stub so the dry
        // run can "call" each converter without side effects.
        let func_keys: Vec<VertexKey> = cg
            .graph
            .keys()
            .filter(|k| matches!(k, VertexKey::Func(_)))
            .cloned()
            .collect();
        for key in func_keys {
            if let Some(Vertex::Func(fv)) = cg.graph.vertex_mut(&key) {
                fv.func = fv.func.zero_stub();
            }
        }

        let mut state = CallState::new();
        reach_target(
            &cg.graph,
            &cg.root,
            &cg.target,
            &mut state,
            true,
            self.types(),
        )?;

        // The new function's inputs are the consumed input vertices,
        // minus the direct inputs that were already supplied.
        let provided: HashSet<VertexKey> = cg.inputs.iter().cloned().collect();
        let mut inputs: Vec<Value> = Vec::new();
        for (key, vertex) in &state.input_set {
            if provided.contains(key) {
                continue;
            }
            match vertex {
                Vertex::Value(v) => {
                    inputs.push(Value::named(&v.name, v.ty).with_subtype(&v.subtype));
                }
                Vertex::TypedArg(v) => {
                    inputs.push(Value::typed(v.ty).with_subtype(&v.subtype));
                }
                _ => {}
            }
        }
        trace!(inputs = ?inputs, "redefined inputs");

        let input_set = ValueSet::new(inputs);
        let mut output_set = self.output().clone();
        output_set.clear_payloads();

        let original = self.clone();
        Func::new(
            self.types().clone(),
            input_set,
            output_set,
            move |inp, out| {
                // Forward the received values plus the original args
                // into a fresh call of the original target.
                let mut call_args = base_args.clone();
                for value in inp.values() {
                    let payload = value
                        .payload
                        .clone()
                        .unwrap_or_else(|| original.types().zero(value.ty));
                    match value.kind() {
                        ValueKind::Named => call_args.push(args::named_subtype(
                            value.name.clone(),
                            payload,
                            value.subtype.clone(),
                        )),
                        ValueKind::Typed => call_args.push(args::typed_subtype(
                            payload,
                            value.subtype.clone(),
                        )),
                    }
                }

                let outs = original.call(call_args).into_result()?;
                for (index, value) in outs.into_iter().enumerate() {
                    if let Some(payload) = value.payload {
                        out.set_index(index, payload);
                    }
                }
                Ok(())
            },
        )
    }
}
