//! Call results.

use crate::error::Error;
use crate::payload::Payload;
use crate::value::Value;

/// Ordered outputs of a call, plus an optional error.
///
/// The error slot is separate from the output tuple: a function that
/// declares two outputs always has `len() == 2`, whether or not the call
/// failed. Errors are accessed through [`FuncResult::err`].
#[derive(Debug)]
pub struct FuncResult {
    out: Vec<Value>,
    err: Option<Error>,
}

impl FuncResult {
    pub(crate) fn from_error(err: Error) -> FuncResult {
        FuncResult {
            out: Vec::new(),
            err: Some(err),
        }
    }

    pub(crate) fn from_values(out: Vec<Value>) -> FuncResult {
        FuncResult { out, err: None }
    }

    /// Any error that occurred as part of the call, whether raised by the
    /// engine or returned from a function body.
    pub fn err(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    pub fn is_err(&self) -> bool {
        self.err.is_some()
    }

    /// The number of outputs. The error slot is never counted.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// The i'th output payload (zero-indexed).
    ///
    /// Panics if `i >= len()`; use [`FuncResult::get`] for a checked
    /// lookup.
    pub fn out(&self, i: usize) -> &Payload {
        self.out[i]
            .payload
            .as_ref()
            .expect("call outputs are zero-filled on invocation")
    }

    /// The i'th output payload, or `None` when out of range or the call
    /// failed before producing outputs.
    pub fn get(&self, i: usize) -> Option<&Payload> {
        self.out.get(i).and_then(|v| v.payload.as_ref())
    }

    /// The full output values in declared order.
    pub fn values(&self) -> &[Value] {
        &self.out
    }

    /// Converts into a `Result`, surfacing the error slot.
    pub fn into_result(self) -> Result<Vec<Value>, Error> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }
}
