//! Conformance tests for inspection, function calls, runtime sensitivity and
//! lifecycle preconditions.

use cell_common::Time;
use cell_conformance::{adder_pair, counter, mux};
use cell_ir::{ProcessId, Value};
use cell_sim::{SimError, SimKernel};

fn element(kernel: &SimKernel, name: &str) -> usize {
    kernel
        .inspect("")
        .unwrap()
        .element_names()
        .iter()
        .position(|n| n == name)
        .unwrap()
}

#[test]
fn sensitivity_follows_the_latest_reads() {
    let (f, runs) = mux().unwrap();
    let mut kernel = f.kernel("test::mux").unwrap();
    kernel.simulate(Time::ns(1)).unwrap();
    assert_eq!(runs.get(), 1);
    assert_eq!(kernel.inspect("").unwrap().get("out").unwrap(), Value::Int(20));

    let (sel, a, b) = (element(&kernel, "sel"), element(&kernel, "a"), element(&kernel, "b"));
    let select = ProcessId::from_raw(0);
    let root = kernel.runset().root().unwrap();
    let table = kernel.runset().instance(root).sensitivity();
    assert_eq!(table.elements_of(select), vec![sel, b]);
    assert!(!table.sensitive_to(a).contains(&select));

    // `a` is not in the read set, so changing it does not rerun the mux.
    kernel.call("", "set_a", &[Value::Int(11)]).unwrap();
    kernel.simulate(Time::ns(1)).unwrap();
    assert_eq!(runs.get(), 1);

    kernel.call("", "set_sel", &[Value::Bool(true)]).unwrap();
    kernel.simulate(Time::ns(1)).unwrap();
    assert_eq!(runs.get(), 2);
    assert_eq!(kernel.inspect("").unwrap().get("out").unwrap(), Value::Int(11));
    let table = kernel.runset().instance(root).sensitivity();
    assert_eq!(table.elements_of(select), vec![sel, a]);
    assert!(table.sensitive_to(b).is_empty());

    // Now `b` is out of the read set.
    kernel.call("", "set_b", &[Value::Int(99)]).unwrap();
    kernel.simulate(Time::ns(1)).unwrap();
    assert_eq!(runs.get(), 2);
}

#[test]
fn calls_return_values_and_check_arguments() {
    let (f, _) = adder_pair().unwrap();
    let mut kernel = f.kernel("test::top").unwrap();
    kernel.call("l", "set_a", &[Value::Int(2)]).unwrap();
    kernel.call("l", "set_b", &[Value::Int(5)]).unwrap();
    kernel.simulate(Time::ns(1)).unwrap();
    assert_eq!(
        kernel.call("l", "get_sum", &[]).unwrap(),
        Some(Value::Int(7))
    );
    assert_eq!(kernel.call("l", "set_a", &[Value::Int(1)]).unwrap(), None);

    assert!(matches!(
        kernel.call("l", "set_a", &[]),
        Err(SimError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        kernel.call("l", "set_a", &[Value::Float(1.0)]),
        Err(SimError::ArgumentMismatch { .. })
    ));
    let err = kernel.call("l", "reset", &[]).unwrap_err();
    assert!(matches!(err, SimError::UnknownFunction { .. }));
    assert!(err.to_string().contains("test::adder"));
}

#[test]
fn inspector_reads_raw_bits() {
    let (f, _) = adder_pair().unwrap();
    let mut kernel = f.kernel("test::top").unwrap();
    kernel.call("r", "set_a", &[Value::Int(5)]).unwrap();
    kernel.simulate(Time::ns(1)).unwrap();

    let view = kernel.inspect("r").unwrap();
    assert_eq!(view.element_count(), 3);
    assert_eq!(view.function_names(), ["set_a", "set_b", "get_sum"]);
    assert_eq!(view.raw("a").unwrap(), 5i64.to_le_bytes());
    let bits = view.bits("port").unwrap();
    assert_eq!(bits.len(), 64);
    assert_eq!(&bits[..4], [true, false, true, false]);
    assert_eq!(view.raw_all().len(), 24);
    assert_eq!(view.bits_all().len(), 24 * 8);
}

#[test]
fn inspector_errors_name_the_module() {
    let f = counter().unwrap();
    let kernel = f.kernel("test::counter").unwrap();
    let view = kernel.inspect("").unwrap();
    let err = view.get("nope").unwrap_err();
    assert!(matches!(err, SimError::UnknownElement { .. }));
    assert!(err.to_string().contains("test::counter"));
    assert!(matches!(view.get("port"), Err(SimError::NotScalar { .. })));
}

#[test]
fn operations_before_setup_fail() {
    let f = counter().unwrap();
    let mut kernel = SimKernel::new(&f.design, "test::counter", &f.interner).unwrap();
    assert!(matches!(kernel.simulate(Time::ns(1)), Err(SimError::NotSetUp)));
    assert!(matches!(
        kernel.simulate_step(Time::zero(), Time::ns(1)),
        Err(SimError::NotSetUp)
    ));
    assert!(matches!(kernel.inspect(""), Err(SimError::NotSetUp)));
    assert!(matches!(kernel.call("", "f", &[]), Err(SimError::NotSetUp)));

    kernel.setup().unwrap();
    assert!(matches!(kernel.setup(), Err(SimError::AlreadySetUp)));
    kernel.teardown();
    assert!(matches!(kernel.simulate(Time::ns(1)), Err(SimError::NotSetUp)));
}

#[test]
fn unknown_top_module_lists_available_modules() {
    let (f, _) = adder_pair().unwrap();
    let err = SimKernel::new(&f.design, "test::missing", &f.interner)
        .err()
        .unwrap();
    let message = err.to_string();
    assert!(message.contains("test::missing"));
    assert!(message.contains("test::adder"));
    assert!(message.contains("test::top"));
}

#[test]
fn simulate_step_returns_next_activation() {
    let f = counter().unwrap();
    let mut kernel = f.kernel("test::counter").unwrap();
    let next = kernel.simulate_step(Time::zero(), Time::ns(10)).unwrap();
    assert_eq!(next, Time::ns(2));
    let next = kernel.simulate_step(next, Time::ps(500)).unwrap();
    assert_eq!(next, Time::ps(2500));
    assert_eq!(
        kernel.inspect("").unwrap().get("count").unwrap(),
        Value::Int(2)
    );
}
