//! Instrumentation hooks called by the kernel.
//!
//! An [`Instrumenter`] is told about every instance once during setup, in
//! hierarchical pre-order, and then gets a snapshot callback before
//! simulation and after every time step. Recorders live outside the kernel.

use crate::error::SimError;
use crate::instance::{InstanceId, ModuleInstance};
use crate::runset::Runset;
use cell_common::Time;
use cell_ir::{Value, ValueType};

/// Receiver of simulation events.
///
/// During `setup()` the kernel calls `push_hierarchy`, `register_module`,
/// the same sequence for every nested instance, then `pop_hierarchy`, and
/// finally `initial(0ps)`. `step(t)` follows every completed time step.
pub trait Instrumenter {
    /// Called once after registration, before any time step.
    fn initial(&mut self, t: Time, runset: &Runset) -> Result<(), SimError>;

    /// Called after the time step at `t` has stabilized.
    fn step(&mut self, t: Time, runset: &Runset) -> Result<(), SimError>;

    /// Registers the instance whose hierarchy level was just pushed.
    fn register_module(&mut self, handle: ModuleHandle) -> Result<(), SimError>;

    /// Enters a hierarchy level named after an instance.
    fn push_hierarchy(&mut self, name: &str) -> Result<(), SimError>;

    /// Leaves the innermost hierarchy level.
    fn pop_hierarchy(&mut self) -> Result<(), SimError>;

    /// Flushes buffered output. Called at the end of every `simulate`.
    fn flush(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

/// A scalar element an instrumenter can sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleElement {
    /// Element index in the instance's layout.
    pub index: usize,
    /// Element name.
    pub name: String,
    /// Element type.
    pub ty: ValueType,
}

/// Description of one instance, handed to [`Instrumenter::register_module`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleHandle {
    /// Instance ID, used to read its frame from the runset later.
    pub id: InstanceId,
    /// Dotted instance path.
    pub path: String,
    /// Module name.
    pub module: String,
    /// Scalar elements in layout order.
    pub elements: Vec<HandleElement>,
}

impl ModuleHandle {
    pub(crate) fn new(id: InstanceId, inst: &ModuleInstance) -> Self {
        let layout = inst.frame().layout();
        let elements = layout
            .elements()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.ty.is_scalar())
            .map(|(index, e)| HandleElement {
                index,
                name: inst.module().element_names[index].clone(),
                ty: e.ty.clone(),
            })
            .collect();
        Self {
            id,
            path: inst.path().to_string(),
            module: inst.module().name.clone(),
            elements,
        }
    }

    /// Samples every registered element from the instance's `current`.
    pub fn sample(&self, runset: &Runset) -> Vec<Option<Value>> {
        let frame = runset.instance(self.id).frame();
        self.elements.iter().map(|e| frame.value(e.index)).collect()
    }
}
