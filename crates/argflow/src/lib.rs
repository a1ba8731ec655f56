//! Runtime dependency injection and value conversion.
//!
//! argflow decides whether a target function can be invoked given a pool
//! of direct inputs and a set of converter functions, synthesizes any
//! missing inputs by chaining converters, and invokes the target with
//! the resulting argument set. It supports named values, typed values,
//! subtype labels, interface satisfaction, and redefinition:
//! constructing a new function whose parameters are exactly the inputs
//! still missing from the original.
//!
//! The primary surface is [`Func`]: build one from explicit input and
//! output [`ValueSet`]s plus a callback, then drive it with the free
//! constructors in [`args`]:
//!
//! ```
//! use std::sync::Arc;
//! use argflow::{args, Func, Payload, TypeId, TypeRegistry, Value, ValueSet};
//!
//! let types = Arc::new(TypeRegistry::new());
//! let target = Func::new(
//!     types,
//!     ValueSet::new(vec![
//!         Value::named("a", TypeId::INT),
//!         Value::named("b", TypeId::INT),
//!     ]),
//!     ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
//!     |inp, out| {
//!         let a = inp.payload_named("a").and_then(|p| p.as_int()).unwrap_or(0);
//!         let b = inp.payload_named("b").and_then(|p| p.as_int()).unwrap_or(0);
//!         out.set_index(0, Payload::Int(a + b));
//!         Ok(())
//!     },
//! )
//! .unwrap();
//!
//! let result = target.call(vec![
//!     args::named("a", Payload::Int(12)),
//!     args::named("b", Payload::Int(24)),
//! ]);
//! assert_eq!(result.out(0).as_int(), Some(36));
//! ```
//!
//! Internally each call builds a weighted graph relating values,
//! converters, and the target; prunes it to the part reachable from the
//! inputs; and selects a minimum-weight path per required input. The
//! graph lives only for the duration of the call.

pub mod args;
pub mod convert;
pub mod error;
pub mod filter;
pub mod func;
pub mod payload;
pub mod result;
pub mod tag;
pub mod types;
pub mod value;
pub mod value_set;

mod call;
mod callgraph;
mod redefine;
mod vertex;

pub use convert::convert;
pub use error::{Error, UnsatisfiedError};
pub use filter::{filter_and, filter_or, filter_type, Filter};
pub use func::{Func, FuncId};
pub use payload::Payload;
pub use result::FuncResult;
pub use types::{Primitive, TypeDef, TypeId, TypeRegistry};
pub use value::{Value, ValueKind};
pub use value_set::ValueSet;
