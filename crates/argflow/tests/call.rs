//! End-to-end call tests: named and typed matching, converter chaining,
//! cycles, subtypes, interfaces, and failure reporting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use argflow::{args, Error, Func, Payload, TypeId, TypeRegistry, Value, ValueSet};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn registry() -> Arc<TypeRegistry> {
    Arc::new(TypeRegistry::new())
}

/// `fn (a: int, b: int) -> int { a + b }` with named parameters.
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

/// `fn (s: string) -> string { s }` with a typed parameter.
fn string_identity(types: &Arc<TypeRegistry>) -> Func {
    Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(TypeId::STR)]),
        ValueSet::lifted(vec![Value::typed(TypeId::STR)]),
        |inp, out| {
            out.set_index(0, inp.payload(0).cloned().unwrap_or(Payload::Unit));
            Ok(())
        },
    )
    .unwrap()
    .with_name("string-identity")
}

/// A single-input single-output typed converter.
fn conv(
    types: &Arc<TypeRegistry>,
    name: &str,
    from: TypeId,
    to: TypeId,
    f: impl Fn(&Payload) -> Result<Payload, Error> + Send + Sync + 'static,
) -> Func {
    Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(from)]),
        ValueSet::lifted(vec![Value::typed(to)]),
        move |inp, out| {
            let input = inp.payload(0).ok_or_else(|| Error::msg("no input"))?;
            out.set_index(0, f(input)?);
            Ok(())
        },
    )
    .unwrap()
    .with_name(name)
}

fn atoi(types: &Arc<TypeRegistry>) -> Func {
    conv(types, "atoi", TypeId::STR, TypeId::INT, |p| {
        let s = p.as_str().ok_or_else(|| Error::msg("not a string"))?;
        s.parse::<i64>()
            .map(Payload::Int)
            .map_err(|e| Error::msg(e.to_string()))
    })
}

fn itoa(types: &Arc<TypeRegistry>) -> Func {
    conv(types, "itoa", TypeId::INT, TypeId::STR, |p| {
        let n = p.as_int().ok_or_else(|| Error::msg("not an int"))?;
        Ok(Payload::Str(n.to_string()))
    })
}

// ---------------------------------------------------------------------------
// Named and typed matching
// ---------------------------------------------------------------------------

#[test]
fn basic_named_inputs() {
    let types = registry();
    let result = adder(&types).call(vec![
        args::named("a", Payload::Int(12)),
        args::named("b", Payload::Int(24)),
    ]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.len(), 1);
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn named_matching_is_case_insensitive() {
    let types = registry();
    let result = adder(&types).call(vec![
        args::named("A", Payload::Int(12)),
        args::named("B", Payload::Int(24)),
    ]);

    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn supplying_an_input_twice_is_idempotent() {
    let types = registry();
    let result = adder(&types).call(vec![
        args::named("a", Payload::Int(1)),
        args::named("a", Payload::Int(12)),
        args::named("b", Payload::Int(24)),
        args::named("b", Payload::Int(24)),
    ]);

    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn lifted_inputs_map_positionally() {
    let types = registry();
    let join = Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(TypeId::INT), Value::typed(TypeId::STR)]),
        ValueSet::lifted(vec![Value::typed(TypeId::STR)]),
        |inp, out| {
            let n = inp.payload(0).and_then(|p| p.as_int()).unwrap_or(0);
            let s = inp.payload(1).and_then(|p| p.as_str()).unwrap_or("");
            out.set_index(0, Payload::Str(format!("{}-{}", s, n)));
            Ok(())
        },
    )
    .unwrap();

    let result = join.call(vec![
        args::typed(Payload::Int(7)),
        args::typed(Payload::Str("x".into())),
    ]);

    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_str(), Some("x-7"));
}

#[test]
fn function_with_no_inputs_is_callable() {
    let types = registry();
    let constant = Func::new(
        types,
        ValueSet::empty(),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |_, out| {
            out.set_index(0, Payload::Int(42));
            Ok(())
        },
    )
    .unwrap();

    let result = constant.call(Vec::new());
    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_int(), Some(42));
}

// ---------------------------------------------------------------------------
// Converter chaining
// ---------------------------------------------------------------------------

#[test]
fn typed_conversion_chain() {
    let types = registry();
    let target = string_identity(&types);

    let result = target.call(vec![
        args::typed(Payload::Bool(false)),
        args::converter(conv(&types, "btoi", TypeId::BOOL, TypeId::INT, |p| {
            Ok(Payload::Int(if p.as_bool().unwrap_or(false) { 1 } else { 0 }))
        })),
        args::converter(itoa(&types)),
    ]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_str(), Some("0"));
}

#[test]
fn bidirectional_converter_cycle() {
    let types = registry();
    let target = string_identity(&types);

    let result = target.call(vec![
        args::typed(Payload::Int(12)),
        args::converter(itoa(&types)),
        args::converter(atoi(&types)),
    ]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_str(), Some("12"));
}

#[test]
fn supplied_value_wins_over_cycle_round_trip() {
    // With both directions registered and the target type supplied
    // directly, no converter may rewrite the original value.
    let types = registry();
    let target = string_identity(&types);

    let result = target.call(vec![
        args::typed(Payload::Str("42".into())),
        args::converter(itoa(&types)),
        args::converter(atoi(&types)),
    ]);

    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_str(), Some("42"));
}

#[test]
fn converter_error_aborts_call() {
    let types = registry();
    let target = string_identity(&types);

    let result = target.call(vec![
        args::named("a", Payload::Int(12)),
        args::converter(conv(&types, "bad", TypeId::INT, TypeId::STR, |_| {
            Err(Error::msg("failed"))
        })),
    ]);

    let err = result.err().expect("call must fail");
    assert!(err.to_string().contains("failed"), "{}", err);
    assert!(matches!(err, Error::Converter { .. }));
}

#[test]
fn unused_converters_are_not_invoked() {
    let types = registry();
    let target = string_identity(&types);

    let itoa_calls = Arc::new(AtomicUsize::new(0));
    let atoi_calls = Arc::new(AtomicUsize::new(0));

    let counting_itoa = {
        let calls = itoa_calls.clone();
        conv(&types, "itoa", TypeId::INT, TypeId::STR, move |p| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Payload::Str(p.as_int().unwrap_or(0).to_string()))
        })
    };
    let counting_atoi = {
        let calls = atoi_calls.clone();
        conv(&types, "atoi", TypeId::STR, TypeId::INT, move |p| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Payload::Int(p.as_str().unwrap_or("0").parse().unwrap_or(0)))
        })
    };

    let result = target.call(vec![
        args::typed(Payload::Int(12)),
        args::converter(counting_itoa),
        args::converter(counting_atoi),
    ]);

    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_str(), Some("12"));
    assert!(itoa_calls.load(Ordering::SeqCst) >= 1);
    assert_eq!(atoi_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn converter_with_named_output_satisfies_named_requirement() {
    let types = registry();
    let target = adder(&types);

    // Produces the named value "b" from any string.
    let make_b = Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(TypeId::STR)]),
        ValueSet::new(vec![Value::named("b", TypeId::INT)]),
        |inp, out| {
            let s = inp.payload(0).and_then(|p| p.as_str()).unwrap_or("0");
            out.set_named("b", Payload::Int(s.parse().map_err(|_| Error::msg("bad int"))?))?;
            Ok(())
        },
    )
    .unwrap()
    .with_name("make-b");

    let result = target.call(vec![
        args::named("a", Payload::Int(12)),
        args::typed(Payload::Str("24".into())),
        args::converter(make_b),
    ]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn converter_generators_run_per_graph_value() {
    let types = registry();
    let target = Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |inp, out| {
            out.set_index(0, inp.payload(0).cloned().unwrap_or(Payload::Int(0)));
            Ok(())
        },
    )
    .unwrap();

    let gen_types = types.clone();
    let result = target.call(vec![
        args::typed(Payload::Str("7".into())),
        args::converter_gen(move |value| {
            if value.ty == TypeId::STR {
                Ok(Some(atoi(&gen_types)))
            } else {
                Ok(None)
            }
        }),
    ]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(7));
}

// ---------------------------------------------------------------------------
// Preference rules
// ---------------------------------------------------------------------------

#[test]
fn requirement_prefers_same_named_input() {
    let types = registry();
    // Requires the named value "count" as an int; both available values
    // are strings, so a converter is needed either way. The one named
    // "count" must be chosen.
    let target = Func::new(
        types.clone(),
        ValueSet::new(vec![Value::named("count", TypeId::INT)]),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |inp, out| {
            let n = inp.payload_named("count").and_then(|p| p.as_int()).unwrap_or(-1);
            out.set_index(0, Payload::Int(n));
            Ok(())
        },
    )
    .unwrap();

    let result = target.call(vec![
        args::named("count", Payload::Str("7".into())),
        args::named("limit", Payload::Str("99".into())),
        args::converter(atoi(&types)),
    ]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(7));
}

#[test]
fn valued_named_input_wins_over_bare_typed_input() {
    let types = registry();
    let target = Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |inp, out| {
            out.set_index(0, inp.payload(0).cloned().unwrap_or(Payload::Int(-1)));
            Ok(())
        },
    )
    .unwrap();

    let result = target.call(vec![
        args::named("a", Payload::Int(12)),
        args::typed(Payload::Int(99)),
    ]);

    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_int(), Some(12));
}

// ---------------------------------------------------------------------------
// Subtypes
// ---------------------------------------------------------------------------

#[test]
fn exact_subtype_match_is_preferred() {
    let types = registry();
    let target = Func::new(
        types.clone(),
        ValueSet::new(vec![Value::named("a", TypeId::INT).with_subtype("foo")]),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |inp, out| {
            let a = inp.named("a").and_then(|v| v.payload.clone());
            out.set_index(0, a.unwrap_or(Payload::Int(-1)));
            Ok(())
        },
    )
    .unwrap();

    let result = target.call(vec![
        args::named_subtype("a", Payload::Int(24), "bar"),
        args::named_subtype("a", Payload::Int(36), "foo"),
    ]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(36));
}

#[test]
fn bare_typed_request_relaxes_to_subtyped_input() {
    let types = registry();
    let target = Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        ValueSet::lifted(vec![Value::typed(TypeId::INT)]),
        |inp, out| {
            out.set_index(0, inp.payload(0).cloned().unwrap_or(Payload::Int(-1)));
            Ok(())
        },
    )
    .unwrap();

    let result = target.call(vec![args::typed_subtype(Payload::Int(42), "foo")]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).as_int(), Some(42));
}

// ---------------------------------------------------------------------------
// Interfaces
// ---------------------------------------------------------------------------

#[test]
fn concrete_input_satisfies_interface_requirement() {
    let mut reg = TypeRegistry::new();
    let reader = reg.register_interface("Reader", ["read"]).unwrap();
    let file = reg.register_concrete("File", ["read", "close"]).unwrap();
    let types = Arc::new(reg);

    let target = Func::new(
        types.clone(),
        ValueSet::lifted(vec![Value::typed(reader)]),
        ValueSet::lifted(vec![Value::typed(reader)]),
        |inp, out| {
            out.set_index(0, inp.payload(0).cloned().unwrap_or(Payload::Unit));
            Ok(())
        },
    )
    .unwrap();

    #[derive(Debug, PartialEq)]
    struct File {
        fd: i32,
    }

    let input = Payload::opaque(file, File { fd: 3 });
    let result = target.call(vec![args::typed(input)]);

    assert!(result.err().is_none(), "{}", result.err().unwrap());
    assert_eq!(result.out(0).downcast_ref::<File>(), Some(&File { fd: 3 }));
}

// ---------------------------------------------------------------------------
// Failure reporting
// ---------------------------------------------------------------------------

#[test]
fn unsatisfied_argument_names_the_missing_input() {
    let types = registry();
    let result = adder(&types).call(vec![args::named("a", Payload::Int(12))]);

    let err = result.err().expect("call must fail");
    assert!(matches!(err, Error::Unsatisfied(_)));

    let text = err.to_string();
    assert!(text.contains("argument cannot be satisfied"), "{}", text);
    assert!(text.contains("\"b\" of type int"), "{}", text);
    assert!(!text.contains("argument cannot be satisfied: \"a\""), "{}", text);
}

#[test]
fn unsatisfied_report_lists_inputs_and_converters() {
    let types = registry();
    let result = adder(&types).call(vec![
        args::named("a", Payload::Int(12)),
        args::converter(itoa(&types)),
    ]);

    let text = result.err().expect("call must fail").to_string();
    assert!(text.contains("function \"adder\" declares:"), "{}", text);
    assert!(text.contains("direct inputs:"), "{}", text);
    assert!(text.contains("\"a\" of type int"), "{}", text);
    assert!(text.contains("itoa"), "{}", text);
}

// ---------------------------------------------------------------------------
// Default opts
// ---------------------------------------------------------------------------

#[test]
fn default_opts_apply_on_every_call() {
    let types = registry();
    let target = adder(&types).with_opts(vec![args::named("a", Payload::Int(12))]);

    let result = target.call(vec![args::named("b", Payload::Int(24))]);
    assert!(result.err().is_none());
    assert_eq!(result.out(0).as_int(), Some(36));

    // Call-time args override the defaults.
    let result = target.call(vec![
        args::named("a", Payload::Int(2)),
        args::named("b", Payload::Int(3)),
    ]);
    assert_eq!(result.out(0).as_int(), Some(5));
}
