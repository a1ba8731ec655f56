//! Type conversion as a one-shot call.

use std::sync::Arc;

use crate::args::Arg;
use crate::error::Error;
use crate::func::Func;
use crate::payload::Payload;
use crate::types::{TypeId, TypeRegistry};
use crate::value::Value;
use crate::value_set::ValueSet;

/// Converts the given args to the target type, using any of the
/// available inputs and converters to reach it.
///
/// Builds an identity function of the target type and runs it through
/// the engine, so the full resolution machinery (chaining, weights,
/// subtypes) applies.
pub fn convert(
    types: &Arc<TypeRegistry>,
    target: TypeId,
    args: impl IntoIterator<Item = Arg>,
) -> Result<Payload, Error> {
    let identity = Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(target)]),
        ValueSet::lifted(vec![Value::typed(target)]),
        |inp, out| {
            if let Some(payload) = inp.payload(0) {
                out.set_index(0, payload.clone());
            }
            Ok(())
        },
    )?
    .with_name("convert");

    let outs = identity.call(args).into_result()?;
    let payload = outs
        .into_iter()
        .next()
        .and_then(|v| v.payload)
        .expect("identity call outputs are zero-filled");
    Ok(payload)
}
