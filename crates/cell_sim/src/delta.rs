//! The delta-cycle engine.
//!
//! One delta cycle runs the drivers and pending processes of every
//! instance, diffs `next` against `current`, commits the changes and
//! collects the processes woken by them. Instances are visited in pre-order
//! and processes in ID order, so a run is reproducible.

use crate::instance::InstanceId;
use crate::runset::Runset;
use cell_common::Time;
use cell_ir::PORT_ELEMENT;
use tracing::{debug, trace};

impl Runset {
    /// Runs one delta cycle at time `t` and returns whether another one is
    /// needed.
    ///
    /// With `capture_previous`, every instance's pre-commit `current` is
    /// copied into `previous`; the time advancement step requests this for
    /// the first cycle of each time step only.
    pub fn simulate_cycle(&mut self, t: Time, capture_previous: bool) -> bool {
        let ids: Vec<InstanceId> = self.instances.ids().collect();
        for &id in &ids {
            self.execute_instance(id, t);
        }
        for &id in &ids {
            self.diff_instance(id, capture_previous);
        }
        self.propagate_port_events();
        self.instances.values().any(|inst| !inst.run_list.is_empty())
    }

    fn execute_instance(&mut self, id: InstanceId, t: Time) {
        let inst = &mut self.instances[id];
        debug!(
            instance = %inst.display_name(),
            processes = inst.run_list.len(),
            "delta cycle"
        );

        let frame = &mut inst.frame;
        for driver in inst.drivers.iter_mut() {
            driver(t, &frame.current[..], &mut frame.next[..], &frame.previous[..]);
        }

        let pending = inst.run_list.take();
        for pid in pending {
            // Only recurrent processes return a wake time, and they never
            // enter a run list.
            let _ = self.run_process(id, pid, t);
        }
    }

    fn diff_instance(&mut self, id: InstanceId, capture_previous: bool) {
        let inst = &mut self.instances[id];
        let changed = inst.frame.changed_elements();
        if capture_previous {
            inst.frame.snapshot_previous();
        }
        inst.port_event = changed.contains(&PORT_ELEMENT);
        if changed.is_empty() {
            return;
        }

        inst.frame.commit();
        for element in &changed {
            inst.run_list.extend(inst.sensitivity.sensitive_to(*element));
        }
        trace!(
            instance = %inst.display_name(),
            changed = ?changed,
            woken = inst.run_list.len(),
            "elements changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::runset::Runset;
    use cell_common::{Interner, Time};
    use cell_ir::{Design, ModuleBuilder, ProcessDef, ProcessId, Value, ValueType};

    /// a = 1 (init); b = a + 1; c = b + 1, with c's process declared first
    /// so it needs a second cycle to see b.
    fn chain(interner: &Interner) -> Runset {
        let mut design = Design::new();
        let mut m = ModuleBuilder::new("chain", interner);
        let a = m.element_with_init("a", Value::Int(1));
        let b = m.element("b", ValueType::Int);
        let c = m.element("c", ValueType::Int);
        m.process(ProcessDef::sensitive(move |ctx| {
            let v = ctx.read_int(b);
            ctx.write(c, v + 1);
        }));
        m.process(ProcessDef::sensitive(move |ctx| {
            let v = ctx.read_int(a);
            ctx.write(b, v + 1);
        }));
        let id = design.add_module(m.build().unwrap());
        let mut rs = Runset::new(&design, interner);
        rs.add_module(id, String::new(), None);
        rs.setup_hierarchy();
        rs.call_init();
        rs
    }

    #[test]
    fn stabilizes_over_cycles() {
        let interner = Interner::new();
        let mut rs = chain(&interner);
        let root = rs.root().unwrap();

        // Cycle 1: both run; c sees b = 0, b becomes 2.
        assert!(rs.simulate_cycle(Time::zero(), true));
        assert_eq!(rs.instance(root).frame().value(2), Some(Value::Int(2)));
        assert_eq!(rs.instance(root).frame().value(3), Some(Value::Int(1)));
        assert!(rs.instance(root).run_list().contains(ProcessId::from_raw(0)));

        // Cycle 2: c recomputes from b = 2 and nothing depends on c.
        assert!(!rs.simulate_cycle(Time::zero(), false));
        assert_eq!(rs.instance(root).frame().value(3), Some(Value::Int(3)));
    }

    #[test]
    fn stable_cycle_is_idempotent() {
        let interner = Interner::new();
        let mut rs = chain(&interner);
        while rs.simulate_cycle(Time::zero(), false) {}
        let root = rs.root().unwrap();
        let before = rs.instance(root).frame().current().to_vec();
        assert!(!rs.simulate_cycle(Time::zero(), false));
        assert_eq!(rs.instance(root).frame().current(), &before[..]);
    }

    #[test]
    fn previous_holds_pre_step_state() {
        let interner = Interner::new();
        let mut rs = chain(&interner);
        let root = rs.root().unwrap();
        rs.simulate_cycle(Time::zero(), true);
        rs.simulate_cycle(Time::zero(), false);
        let prev = rs.instance(root).frame().previous();
        // Captured before the first commit: b and c were still 0.
        assert_eq!(Value::decode(&ValueType::Int, &prev[8..]), Some(Value::Int(0)));
        assert_eq!(Value::decode(&ValueType::Int, &prev[16..]), Some(Value::Int(0)));
    }

    #[test]
    fn drivers_inject_stimulus() {
        let interner = Interner::new();
        let mut rs = chain(&interner);
        while rs.simulate_cycle(Time::zero(), false) {}
        let root = rs.root().unwrap();
        rs.add_driver(root, |_, _, next, _| Value::Int(10).encode(&mut next[0..8]));
        while rs.simulate_cycle(Time::ns(1), false) {}
        let frame = rs.instance(root).frame();
        assert_eq!(frame.value(1), Some(Value::Int(10)));
        assert_eq!(frame.value(2), Some(Value::Int(11)));
        assert_eq!(frame.value(3), Some(Value::Int(12)));
    }
}
