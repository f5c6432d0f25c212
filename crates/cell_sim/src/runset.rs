//! The module runset: owner of every module instance.
//!
//! The instance tree is flattened in pre-order into one arena. Parent-child
//! edges are IDs into that arena, so a child never holds a reference to its
//! parent and a process can read its children's frames while its own frame
//! is borrowed mutably.

use crate::instance::{ChildEdge, InstanceId, ModuleEntry, ModuleInstance};
use cell_common::{Interner, Time, TimeUnit};
use cell_ir::{
    Arena, ChildPort, Design, FunctionDef, ModuleId, ProcessContext, ProcessId, ProcessKind,
    Value, PORT_ELEMENT,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

/// All module instances of a simulation.
#[derive(Debug)]
pub struct Runset {
    modules: Arena<ModuleId, Arc<ModuleEntry>>,
    pub(crate) instances: Arena<InstanceId, ModuleInstance>,
}

impl Runset {
    /// Resolves every module of `design`. No instances are created yet.
    pub fn new(design: &Design, interner: &Interner) -> Self {
        let mut modules = Arena::new();
        for (id, def) in design.modules.iter() {
            modules.alloc(Arc::new(ModuleEntry::new(id, def, interner)));
        }
        Self {
            modules,
            instances: Arena::new(),
        }
    }

    /// Instantiates `module` and, recursively, everything it instantiates.
    ///
    /// The design must be free of recursive instantiation.
    pub fn add_module(
        &mut self,
        module: ModuleId,
        path: String,
        parent: Option<InstanceId>,
    ) -> InstanceId {
        let entry = Arc::clone(&self.modules[module]);
        let id = self
            .instances
            .alloc(ModuleInstance::new(Arc::clone(&entry), path.clone(), parent));

        let mut children = Vec::with_capacity(entry.def.instantiations.len());
        for (inst, name) in entry.def.instantiations.iter().zip(&entry.instance_names) {
            let child_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}.{name}")
            };
            let child = self.add_module(inst.module, child_path, Some(id));
            children.push(ChildEdge {
                instance: child,
                element: inst.element,
            });
        }
        self.instances[id].children = children;
        id
    }

    /// Registers every time-driven process in its instance's schedule and
    /// seeds sensitive processes into the run lists.
    pub fn setup_hierarchy(&mut self) {
        for (_, inst) in self.instances.iter_mut() {
            for (pid, process) in inst.module.def.processes.iter() {
                match process.kind() {
                    ProcessKind::Sensitive => {
                        inst.run_list.insert(pid);
                    }
                    ProcessKind::Periodic { period } => {
                        inst.schedule.schedule(Time::zero(), period, pid);
                    }
                    ProcessKind::Once { at } => {
                        inst.schedule.schedule(at, Time::zero(), pid);
                    }
                    ProcessKind::Recurrent => {
                        inst.schedule.schedule_recurrent(Time::zero(), pid);
                    }
                }
            }
        }
    }

    /// Writes initial element values and runs constructors, then makes
    /// `current`, `next` and `previous` identical.
    pub fn call_init(&mut self) {
        let ids: Vec<InstanceId> = self.instances.ids().collect();
        for id in ids {
            let module = Arc::clone(&self.instances[id].module);
            let inst = &mut self.instances[id];
            for (element, value) in &module.def.inits {
                inst.frame.initialize(*element, *value);
            }
            if let Some(constructor) = &module.def.constructor {
                self.with_context(id, false, |ctx| constructor(ctx));
            }
            self.instances[id].frame.settle();
        }
    }

    /// Drops every instance.
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if no instance exists.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The top instance, if instantiated.
    pub fn root(&self) -> Option<InstanceId> {
        self.instances.ids().next()
    }

    /// The instance with the given ID.
    pub fn instance(&self, id: InstanceId) -> &ModuleInstance {
        &self.instances[id]
    }

    /// All instances in pre-order.
    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &ModuleInstance)> {
        self.instances.iter()
    }

    /// Looks up an instance by dotted path; `""` is the top instance.
    pub fn find(&self, path: &str) -> Option<InstanceId> {
        let path = path.trim();
        self.instances
            .iter()
            .find(|(_, inst)| inst.path == path)
            .map(|(id, _)| id)
    }

    /// Paths of all instances, for diagnostics.
    pub fn paths(&self) -> Vec<String> {
        self.instances.values().map(|i| i.path.clone()).collect()
    }

    /// Attaches a driver callback to an instance.
    pub fn add_driver<F>(&mut self, id: InstanceId, driver: F)
    where
        F: FnMut(Time, &[u8], &mut [u8], &[u8]) + 'static,
    {
        self.instances[id].drivers.push(Box::new(driver));
    }

    /// Runs `f` with a process context over the instance's buffers.
    ///
    /// With `track_reads` the instance's read mask is cleared and handed to
    /// the context; otherwise reads land in a scratch mask.
    fn with_context<R>(
        &mut self,
        id: InstanceId,
        track_reads: bool,
        f: impl FnOnce(&mut ProcessContext<'_>) -> R,
    ) -> R {
        let base = id.as_raw() as usize + 1;
        let (inst, rest) = self.instances.split_after_mut(id);
        let children: Vec<ChildPort<'_>> = inst
            .children
            .iter()
            .map(|edge| {
                let child = &rest[edge.instance.as_raw() as usize - base];
                ChildPort {
                    element: edge.element,
                    layout: child.frame.layout(),
                    current: child.frame.current(),
                }
            })
            .collect();

        let layout = inst.frame.layout_arc();
        let mut scratch = Vec::new();
        let mask: &mut [u8] = if track_reads {
            inst.read_mask.fill(0);
            &mut inst.read_mask
        } else {
            scratch.resize(layout.element_count(), 0);
            &mut scratch
        };
        let frame = &mut inst.frame;
        let mut ctx = ProcessContext::new(
            &mut frame.next,
            &frame.current,
            &frame.previous,
            mask,
            &layout,
            &children,
        );
        f(&mut ctx)
    }

    /// Invokes one process of an instance at time `t`.
    ///
    /// Sensitive processes get their read mask cleared beforehand and their
    /// sensitivity reconciled afterwards. Returns the next wake time in
    /// picoseconds for recurrent processes.
    pub(crate) fn run_process(&mut self, id: InstanceId, pid: ProcessId, t: Time) -> Option<i64> {
        let module = Arc::clone(&self.instances[id].module);
        let process = &module.def.processes[pid];
        let sensitive = process.is_sensitive();
        let now = t.value_in(TimeUnit::Ps);
        trace!(
            instance = %self.instances[id].display_name(),
            process = pid.as_raw(),
            kind = ?process.kind(),
            "calling process"
        );

        let next = self.with_context(id, sensitive, |ctx| process.invoke(ctx, now));

        if sensitive {
            let inst = &mut self.instances[id];
            trace!(process = pid.as_raw(), read_mask = ?inst.read_mask, "read mask");
            inst.sensitivity.reconcile(pid, &inst.read_mask);
        }
        next
    }

    /// Invokes a module function against the instance's buffers.
    pub(crate) fn call_function(
        &mut self,
        id: InstanceId,
        function: &FunctionDef,
        args: &[Value],
    ) -> Option<Value> {
        self.with_context(id, false, |ctx| (function.body)(ctx, args))
    }

    /// Commits writes made outside a delta cycle and wakes the processes
    /// that depend on the changed elements, including enclosing-instance
    /// processes when the port changed.
    pub(crate) fn commit_external(&mut self, id: InstanceId) -> BTreeSet<usize> {
        let inst = &mut self.instances[id];
        let changed = inst.frame.changed_elements();
        if changed.is_empty() {
            return changed;
        }
        inst.frame.commit();
        for element in &changed {
            inst.run_list.extend(inst.sensitivity.sensitive_to(*element));
        }

        if changed.contains(&PORT_ELEMENT) {
            if let Some(parent) = inst.parent {
                let parent = &mut self.instances[parent];
                if let Some(edge) = parent.children.iter().find(|c| c.instance == id) {
                    let woken = parent.sensitivity.sensitive_to(edge.element).clone();
                    parent.run_list.extend(&woken);
                }
            }
        }
        changed
    }
}
