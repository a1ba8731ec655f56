//! Redefinition tests: declaring exactly the missing inputs, input
//! filters, and output filter validation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use argflow::{
    args, filter_or, filter_type, Error, Func, Payload, TypeId, TypeRegistry, Value, ValueKind,
    ValueSet,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn registry() -> Arc<TypeRegistry> {
    Arc::new(TypeRegistry::new())
}

fn adder(types: &Arc<TypeRegistry>) -> Func {
    Func::new(
        types.clone(),
        ValueSet::new(vec![
            Value::named("a", TypeId::INT),
            Value::named("b", TypeId::INT),
        ]),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |inp, out| {
            let a = inp
                .payload_named("a")
                .and_then(|p| p.as_int())
                .ok_or_else(|| Error::msg("missing a"))?;
            let b = inp
                .payload_named("b")
                .and_then(|p| p.as_int())
                .ok_or_else(|| Error::msg("missing b"))?;
            out.set_index(0, Payload::Int(a + b));
            Ok(())
        },
    )
    .unwrap()
    .with_name("adder")
}

fn atoi(types: &Arc<TypeRegistry>) -> Func {
    Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(TypeId::STR)]),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |inp, out| {
            let s = inp
                .payload(0)
                .and_then(|p| p.as_str())
                .ok_or_else(|| Error::msg("no input"))?;
            out.set_index(
                0,
                Payload::Int(s.parse().map_err(|_| Error::msg("bad int"))?),
            );
            Ok(())
        },
    )
    .unwrap()
    .with_name("atoi")
}

// ---------------------------------------------------------------------------
// Input redefinition
// ---------------------------------------------------------------------------

#[test]
fn all_arguments_satisfied() {
    let types = registry();
    let redefined = adder(&types)
        .redefine(vec![
            args::named("a", Payload::Int(12)),
            args::named("b", Payload::Int(24)),
        ])
        .unwrap();

    assert!(redefined.input().is_empty());

    let result = redefined.call(Vec::new());
    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn missing_named_argument_is_declared() {
    let types = registry();
    let target = adder(&types);
    let redefined = target.redefine(vec![args::named("a", Payload::Int(12))]).unwrap();

    // Exactly the missing input is declared.
    assert_eq!(redefined.input().len(), 1);
    let missing = &redefined.input().values()[0];
    assert_eq!(missing.name, "b");
    assert_eq!(missing.ty, TypeId::INT);
    assert_eq!(missing.kind(), ValueKind::Named);

    // Calling the redefinition with the missing input equals calling the
    // original with the full set.
    let redefined_result = redefined.call(vec![args::named("b", Payload::Int(24))]);
    assert!(redefined_result.err().is_none());

    let direct_result = target.call(vec![
        args::named("a", Payload::Int(12)),
        args::named("b", Payload::Int(24)),
    ]);

    assert_eq!(redefined_result.out(0), direct_result.out(0));
    assert_eq!(redefined_result.out(0).as_int(), Some(36));
}

#[test]
fn input_filter_redefines_through_converters() {
    let types = registry();
    let redefined = adder(&types)
        .redefine(vec![
            args::named("a", Payload::Int(12)),
            args::converter(atoi(&types)),
            args::filter_input(filter_type(types.clone(), TypeId::STR)),
        ])
        .unwrap();

    // The remaining input is only providable as a string.
    assert!(redefined
        .input()
        .values()
        .iter()
        .all(|v| v.ty == TypeId::STR));

    let result = redefined.call(vec![args::typed(Payload::Str("24".into()))]);
    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn filter_combinators_compose() {
    let types = registry();
    let either = filter_or([
        filter_type(types.clone(), TypeId::STR),
        filter_type(types.clone(), TypeId::INT),
    ]);

    let redefined = adder(&types)
        .redefine(vec![
            args::named("a", Payload::Int(12)),
            args::converter(atoi(&types)),
            args::filter_input(either),
        ])
        .unwrap();

    // Int inputs are acceptable under the OR filter, so the missing "b"
    // stays an int.
    let result = redefined.call(vec![args::named("b", Payload::Int(24))]);
    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn redefine_dry_run_invokes_no_converters() {
    let types = registry();
    let calls = Arc::new(AtomicUsize::new(0));

    let counting_atoi = {
        let calls = calls.clone();
        Func::new(
            types.clone(),
            ValueSet::lifted(vec![Value::typed(TypeId::STR)]),
            ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
            move |inp, out| {
                calls.fetch_add(1, Ordering::SeqCst);
                let s = inp.payload(0).and_then(|p| p.as_str()).unwrap_or("0");
                out.set_index(
                    0,
                    Payload::Int(s.parse().map_err(|_| Error::msg("bad int"))?),
                );
                Ok(())
            },
        )
        .unwrap()
    };

    let redefined = adder(&types)
        .redefine(vec![
            args::named("a", Payload::Int(12)),
            args::converter(counting_atoi),
            args::filter_input(filter_type(types.clone(), TypeId::STR)),
        ])
        .unwrap();

    // Redefinition runs against zero stubs.
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let result = redefined.call(vec![args::typed(Payload::Str("24".into()))]);
    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_int(), Some(36));
    assert!(calls.load(Ordering::SeqCst) >= 1);
}

// ---------------------------------------------------------------------------
// Output filters
// ---------------------------------------------------------------------------

#[test]
fn output_filter_rejects_mismatched_outputs() {
    let types = registry();
    let err = adder(&types)
        .redefine(vec![
            args::named("a", Payload::Int(12)),
            args::named("b", Payload::Int(24)),
            args::filter_output(filter_type(types.clone(), TypeId::STR)),
        ])
        .unwrap_err();

    assert!(matches!(err, Error::Filter { .. }));
    assert!(
        err.to_string().contains("does not satisfy output filter"),
        "{}",
        err
    );
}

#[test]
fn output_filter_accepts_matching_outputs() {
    let types = registry();
    let redefined = adder(&types)
        .redefine(vec![
            args::named("a", Payload::Int(12)),
            args::named("b", Payload::Int(24)),
            args::filter_output(filter_type(types.clone(), TypeId::INT)),
        ])
        .unwrap();

    let result = redefined.call(Vec::new());
    assert_eq!(result.out(0).as_int(), Some(36));
}
