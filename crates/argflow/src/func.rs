//! Callable functions with declared inputs and outputs.
//!
//! A [`Func`] is both a target you want to execute and a building block
//! (converter) for reaching another target. It pairs an input
//! [`ValueSet`] and an output [`ValueSet`] with the underlying callable:
//! a closure that reads the input set's payloads and publishes into the
//! output set. The closure's `Result` is the function's error slot; the
//! output tuple never carries an error value.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::args::Arg;
use crate::error::Error;
use crate::result::FuncResult;
use crate::types::TypeRegistry;
use crate::value_set::ValueSet;

/// Process-unique identity for a function.
///
/// Clones of a [`Func`] share the id: a clone is the same underlying
/// function, which keeps its resolution-graph vertex identity stable
/// when the redefiner swaps bodies out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncId(u64);

static NEXT_FUNC_ID: AtomicU64 = AtomicU64::new(0);

impl FuncId {
    fn next() -> FuncId {
        FuncId(NEXT_FUNC_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The callable underneath a [`Func`]: reads input payloads, publishes
/// output payloads, and reports failure through the error slot.
pub type Callback = dyn Fn(&ValueSet, &mut ValueSet) -> Result<(), Error> + Send + Sync;

/// A callable with declared, typed and/or named inputs and outputs.
#[derive(Clone)]
pub struct Func {
    id: FuncId,
    name: Option<String>,
    types: Arc<TypeRegistry>,
    input: ValueSet,
    output: ValueSet,
    pub(crate) call_opts: Vec<Arg>,
    callback: Arc<Callback>,
}

impl Func {
    /// Builds a function from explicit input and output value sets and a
    /// callback.
    ///
    /// Every declared value's type must be registered in `types`;
    /// otherwise the function's shape is unrepresentable and
    /// [`Error::InvalidFunction`] is returned.
    pub fn new(
        types: Arc<TypeRegistry>,
        input: ValueSet,
        output: ValueSet,
        callback: impl Fn(&ValueSet, &mut ValueSet) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Result<Func, Error> {
        for value in input.values().iter().chain(output.values()) {
            if types.get(value.ty).is_none() {
                return Err(Error::InvalidFunction {
                    reason: format!("unregistered type {} in signature", value.ty),
                });
            }
        }

        Ok(Func {
            id: FuncId::next(),
            name: None,
            types,
            input,
            output,
            call_opts: Vec::new(),
            callback: Arc::new(callback),
        })
    }

    /// Names the function for diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Func {
        self.name = Some(name.into());
        self
    }

    /// Attaches default args applied on every call. Args given to
    /// [`Func::call`](Func::call) come after these, so they win on
    /// conflict.
    pub fn with_opts(mut self, opts: Vec<Arg>) -> Func {
        self.call_opts = opts;
        self
    }

    pub fn id(&self) -> FuncId {
        self.id
    }

    /// The configured name, falling back to a synthesized one.
    pub fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("func#{}", self.id),
        }
    }

    /// The values this function requires as input.
    pub fn input(&self) -> &ValueSet {
        &self.input
    }

    /// The values this function produces as output.
    pub fn output(&self) -> &ValueSet {
        &self.output
    }

    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Invokes the callback against a populated input instance. Outputs
    /// the body left unset are zero-filled so results are always
    /// positionally complete.
    pub(crate) fn invoke(&self, input: &ValueSet) -> FuncResult {
        let mut output = self.output.clone();
        output.clear_payloads();
        match (self.callback)(input, &mut output) {
            Err(err) => FuncResult::from_error(err),
            Ok(()) => {
                output.zero_fill(&self.types);
                FuncResult::from_values(output.into_values())
            }
        }
    }

    /// A copy of this function whose body produces the zero value of
    /// every declared output. Shares the original's identity so graph
    /// vertices built from it fuse with the original's.
    pub(crate) fn zero_stub(&self) -> Func {
        Func {
            id: self.id,
            name: self.name.clone(),
            types: self.types.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            call_opts: Vec::new(),
            callback: Arc::new(|_, _| Ok(())),
        }
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
