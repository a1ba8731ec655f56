//! Value filters used by redefinition.
//!
//! A [`Filter`] is a predicate over [`Value`] specifications. During
//! [`Func::redefine`](crate::Func::redefine), an input filter decides
//! which graph vertices count as inputs the caller can provide, and an
//! output filter validates the target's declared outputs.

use std::sync::Arc;

use crate::types::{TypeId, TypeRegistry};
use crate::value::Value;

/// Predicate over value specifications.
#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Filter {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Filter {
        Filter(Arc::new(f))
    }

    pub fn matches(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Filter")
    }
}

/// Matches values of exactly the given type, or -- when `ty` is an
/// interface -- values whose type implements it.
pub fn filter_type(types: Arc<TypeRegistry>, ty: TypeId) -> Filter {
    Filter::new(move |v| v.ty == ty || (types.is_interface(ty) && types.implements(v.ty, ty)))
}

/// Pointwise OR of the given filters.
pub fn filter_or(filters: impl IntoIterator<Item = Filter>) -> Filter {
    let filters: Vec<Filter> = filters.into_iter().collect();
    Filter::new(move |v| filters.iter().any(|f| f.matches(v)))
}

/// Pointwise AND of the given filters.
pub fn filter_and(filters: impl IntoIterator<Item = Filter>) -> Filter {
    let filters: Vec<Filter> = filters.into_iter().collect();
    Filter::new(move |v| filters.iter().all(|f| f.matches(v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_type_matches_exact_and_interface() {
        let mut reg = TypeRegistry::new();
        let reader = reg.register_interface("Reader", ["read"]).unwrap();
        let file = reg.register_concrete("File", ["read"]).unwrap();
        let types = Arc::new(reg);

        let exact = filter_type(types.clone(), TypeId::INT);
        assert!(exact.matches(&Value::typed(TypeId::INT)));
        assert!(!exact.matches(&Value::typed(TypeId::STR)));

        let iface = filter_type(types, reader);
        assert!(iface.matches(&Value::typed(reader)));
        assert!(iface.matches(&Value::typed(file)));
        assert!(!iface.matches(&Value::typed(TypeId::INT)));
    }

    #[test]
    fn combinators() {
        let types = Arc::new(TypeRegistry::new());
        let int = filter_type(types.clone(), TypeId::INT);
        let str_ = filter_type(types.clone(), TypeId::STR);

        let either = filter_or([int.clone(), str_.clone()]);
        assert!(either.matches(&Value::typed(TypeId::INT)));
        assert!(either.matches(&Value::typed(TypeId::STR)));
        assert!(!either.matches(&Value::typed(TypeId::BOOL)));

        let named_int = filter_and([int, Filter::new(|v| !v.name.is_empty())]);
        assert!(named_int.matches(&Value::named("a", TypeId::INT)));
        assert!(!named_int.matches(&Value::typed(TypeId::INT)));
    }
}
