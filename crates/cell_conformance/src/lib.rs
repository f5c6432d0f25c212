//! Conformance fixtures for the Cell simulation kernel.
//!
//! Each fixture builds a small [`Design`] the way the code generator would:
//! layouts through [`ModuleBuilder`], process bodies as closures over element
//! indices. Some fixtures also hand back shared counters that their process
//! bodies bump, so tests can observe how often and when the kernel invoked
//! them.

#![warn(missing_docs)]

use cell_common::{CellResult, Interner, Time};
use cell_ir::{Design, ModuleBuilder, ProcessDef, Value, ValueType};
use cell_sim::{SimError, SimKernel};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A design plus the interner its names live in.
pub struct Fixture {
    /// The compiled design.
    pub design: Design,
    /// Interner holding every module, element and function name.
    pub interner: Interner,
}

impl Fixture {
    fn new() -> Self {
        Self {
            design: Design::new(),
            interner: Interner::new(),
        }
    }

    /// Creates a kernel for `top` and runs `setup()`.
    pub fn kernel(&self, top: &str) -> Result<SimKernel, SimError> {
        let mut kernel = SimKernel::new(&self.design, top, &self.interner)?;
        kernel.setup()?;
        Ok(kernel)
    }
}

/// A shared invocation counter.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicU64>);

impl Counter {
    /// Increments the counter.
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// The current count.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// `test::counter`: a periodic process with a 2 ns period increments `count`.
pub fn counter() -> CellResult<Fixture> {
    let mut f = Fixture::new();
    let mut m = ModuleBuilder::new("test::counter", &f.interner);
    let count = m.element_with_init("count", Value::Int(0));
    m.named_process(
        "tick",
        ProcessDef::periodic(Time::ns(2), move |ctx| {
            let v = ctx.read_int(count);
            ctx.write(count, v + 1);
        }),
    );
    f.design.add_module(m.build()?);
    Ok(f)
}

/// Invocation counters of [`clocks`].
#[derive(Debug, Clone, Default)]
pub struct ClockCounters {
    /// Process with a 2 ns period.
    pub fast: Counter,
    /// Process with a 3 ns period.
    pub slow: Counter,
    /// One-shot process at 5 ns.
    pub once: Counter,
}

/// `test::clocks`: periodic processes at 2 ns and 3 ns and a one-shot at 5 ns.
pub fn clocks() -> CellResult<(Fixture, ClockCounters)> {
    let mut f = Fixture::new();
    let counters = ClockCounters::default();
    let mut m = ModuleBuilder::new("test::clocks", &f.interner);
    let fast = counters.fast.clone();
    m.process(ProcessDef::periodic(Time::ns(2), move |_| fast.bump()));
    let slow = counters.slow.clone();
    m.process(ProcessDef::periodic(Time::ns(3), move |_| slow.bump()));
    let once = counters.once.clone();
    m.process(ProcessDef::once(Time::ns(5), move |_| once.bump()));
    f.design.add_module(m.build()?);
    Ok((f, counters))
}

/// `test::ticker`: a recurrent process that logs the times (in ps) it ran at
/// into the returned vector, stores the latest one in `last` and asks to run
/// again `interval_ps` later.
pub fn ticker(interval_ps: i64) -> CellResult<(Fixture, Arc<Mutex<Vec<i64>>>)> {
    let mut f = Fixture::new();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&calls);
    let mut m = ModuleBuilder::new("test::ticker", &f.interner);
    let last = m.element("last", ValueType::Int);
    m.process(ProcessDef::recurrent(move |ctx, t| {
        if let Ok(mut log) = log.lock() {
            log.push(t);
        }
        ctx.write(last, t);
        t + interval_ps
    }));
    f.design.add_module(m.build()?);
    Ok((f, calls))
}

/// `test::mux`: `out = sel ? a : b`, with setters for each input.
///
/// The returned counter counts runs of the mux process.
pub fn mux() -> CellResult<(Fixture, Counter)> {
    let mut f = Fixture::new();
    let runs = Counter::default();
    let mut m = ModuleBuilder::new("test::mux", &f.interner);
    let sel = m.element_with_init("sel", Value::Bool(false));
    let a = m.element_with_init("a", Value::Int(10));
    let b = m.element_with_init("b", Value::Int(20));
    let out = m.element("out", ValueType::Int);
    let counter = runs.clone();
    m.named_process(
        "select",
        ProcessDef::sensitive(move |ctx| {
            counter.bump();
            let v = if ctx.read_bool(sel) {
                ctx.read_int(a)
            } else {
                ctx.read_int(b)
            };
            ctx.write(out, v);
        }),
    );
    for (name, element, ty) in [
        ("set_sel", sel, ValueType::Bool),
        ("set_a", a, ValueType::Int),
        ("set_b", b, ValueType::Int),
    ] {
        m.function(name, vec![ty], None, move |ctx, args| {
            if let Some(v) = args.first() {
                ctx.write(element, *v);
            }
            None
        });
    }
    f.design.add_module(m.build()?);
    Ok((f, runs))
}

/// Invocation counters of [`adder_pair`].
#[derive(Debug, Clone, Default)]
pub struct PairCounters {
    /// Runs of the top process watching `l`.
    pub left: Counter,
    /// Runs of the top process watching `r`.
    pub right: Counter,
}

/// `test::top` with two `test::adder` instances `l` and `r`.
///
/// Each adder drives its `sum` port from its `a` and `b` elements, settable
/// through `set_a`/`set_b`, and exposes `get_sum`. The top mirrors the two
/// ports into `left` and `right` and adds them into `total`.
pub fn adder_pair() -> CellResult<(Fixture, PairCounters)> {
    let mut f = Fixture::new();
    let counters = PairCounters::default();

    let mut adder = ModuleBuilder::new("test::adder", &f.interner);
    let sum = adder.port("sum", ValueType::Int);
    let a = adder.element("a", ValueType::Int);
    let b = adder.element("b", ValueType::Int);
    adder.process(ProcessDef::sensitive(move |ctx| {
        let v = ctx.read_int(a) + ctx.read_int(b);
        ctx.write_port(sum, v);
    }));
    adder.function("set_a", vec![ValueType::Int], None, move |ctx, args| {
        ctx.write(a, args[0]);
        None
    });
    adder.function("set_b", vec![ValueType::Int], None, move |ctx, args| {
        ctx.write(b, args[0]);
        None
    });
    adder.function("get_sum", vec![], Some(ValueType::Int), move |ctx, _| {
        ctx.read_port(sum)
    });
    let adder_id = f.design.add_module(adder.build()?);

    let mut top = ModuleBuilder::new("test::top", &f.interner);
    top.instance("l", adder_id);
    top.instance("r", adder_id);
    let left = top.element("left", ValueType::Int);
    let right = top.element("right", ValueType::Int);
    let total = top.element("total", ValueType::Int);
    let runs = counters.left.clone();
    top.process(ProcessDef::sensitive(move |ctx| {
        runs.bump();
        let v = ctx.child_port_int(0, 0);
        ctx.write(left, v);
    }));
    let runs = counters.right.clone();
    top.process(ProcessDef::sensitive(move |ctx| {
        runs.bump();
        let v = ctx.child_port_int(1, 0);
        ctx.write(right, v);
    }));
    top.process(ProcessDef::sensitive(move |ctx| {
        let v = ctx.read_int(left) + ctx.read_int(right);
        ctx.write(total, v);
    }));
    f.design.add_module(top.build()?);
    Ok((f, counters))
}

/// `test::osc`: two processes that keep incrementing each other's input,
/// next to a periodic 1 ns process that counts `ticks`.
pub fn oscillator() -> CellResult<Fixture> {
    let mut f = Fixture::new();
    let mut m = ModuleBuilder::new("test::osc", &f.interner);
    let a = m.element("a", ValueType::Int);
    let b = m.element("b", ValueType::Int);
    let ticks = m.element("ticks", ValueType::Int);
    m.process(ProcessDef::sensitive(move |ctx| {
        let v = ctx.read_int(a);
        ctx.write(b, v + 1);
    }));
    m.process(ProcessDef::sensitive(move |ctx| {
        let v = ctx.read_int(b);
        ctx.write(a, v + 1);
    }));
    m.process(ProcessDef::periodic(Time::ns(1), move |ctx| {
        let v = ctx.read_int(ticks);
        ctx.write(ticks, v + 1);
    }));
    f.design.add_module(m.build()?);
    Ok(f)
}

/// `test::edge`: `clk` toggles every 1 ns, `delayed` follows `clk` one delta
/// cycle later, and `rose` is set two delta cycles after the toggle when
/// `delayed` is high while `clk` was low before the time step.
pub fn edge_detector() -> CellResult<Fixture> {
    let mut f = Fixture::new();
    let mut m = ModuleBuilder::new("test::edge", &f.interner);
    let clk = m.element_with_init("clk", Value::Bool(false));
    let delayed = m.element_with_init("delayed", Value::Bool(false));
    let rose = m.element_with_init("rose", Value::Bool(false));
    m.process(ProcessDef::periodic(Time::ns(1), move |ctx| {
        let v = ctx.read_bool(clk);
        ctx.write(clk, !v);
    }));
    m.process(ProcessDef::sensitive(move |ctx| {
        let v = ctx.read_bool(clk);
        ctx.write(delayed, v);
    }));
    m.process(ProcessDef::sensitive(move |ctx| {
        let now = ctx.read_bool(delayed);
        let before = ctx
            .read_prev(clk)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        ctx.write(rose, now && !before);
    }));
    f.design.add_module(m.build()?);
    Ok(f)
}

/// `test::top { c0: test::mid { leaf: test::leaf }, c1: test::leaf }`.
pub fn nested() -> CellResult<Fixture> {
    let mut f = Fixture::new();
    let mut leaf = ModuleBuilder::new("test::leaf", &f.interner);
    leaf.port("q", ValueType::Bool);
    leaf.element_with_init("level", Value::Int(2));
    let leaf_id = f.design.add_module(leaf.build()?);

    let mut mid = ModuleBuilder::new("test::mid", &f.interner);
    mid.element_with_init("level", Value::Int(1));
    mid.instance("leaf", leaf_id);
    let mid_id = f.design.add_module(mid.build()?);

    let mut top = ModuleBuilder::new("test::top", &f.interner);
    top.element_with_init("level", Value::Int(0));
    top.instance("c0", mid_id);
    top.instance("c1", leaf_id);
    f.design.add_module(top.build()?);
    Ok(f)
}
