//! Runtime module instances.

use crate::frame::SignalFrame;
use crate::run_list::RunList;
use crate::schedule::TimeSchedule;
use crate::sensitivity::SensitivityTable;
use cell_common::{Interner, Time};
use cell_ir::{ModuleDef, ModuleId};
use std::fmt;
use std::sync::Arc;

cell_ir::define_id!(
    /// Opaque ID of a module instance in the runset.
    ///
    /// Instances are allocated in hierarchical pre-order, so every instance
    /// has a larger ID than its parent.
    InstanceId
);

/// External stimulus or observer attached to an instance.
///
/// Called at the start of every delta cycle with
/// `(time, current, next, previous)` and may write into `next`.
pub type DriverFn = Box<dyn FnMut(Time, &[u8], &mut [u8], &[u8])>;

/// A module definition with its names resolved, shared by all its instances.
#[derive(Debug)]
pub struct ModuleEntry {
    /// The definition.
    pub def: ModuleDef,
    /// Fully qualified module name.
    pub name: String,
    /// Element names by index; element 0 is `"port"`.
    pub element_names: Vec<String>,
    /// Port field names by field index.
    pub port_names: Vec<String>,
    /// Function names by function index.
    pub function_names: Vec<String>,
    /// Instantiation names in declaration order.
    pub instance_names: Vec<String>,
}

impl ModuleEntry {
    /// Resolves every name of `def`.
    pub fn new(id: ModuleId, def: &ModuleDef, interner: &Interner) -> Self {
        let resolve = |ident| interner.resolve(ident).to_string();
        let element_names = def
            .layout
            .elements()
            .iter()
            .map(|e| e.name.map_or_else(|| "port".to_string(), resolve))
            .collect();
        tracing::trace!(module = id.as_raw(), name = interner.resolve(def.name), "resolved module");
        Self {
            def: def.clone(),
            name: resolve(def.name),
            element_names,
            port_names: def.layout.port_fields().iter().map(|f| resolve(f.name)).collect(),
            function_names: def.functions.iter().map(|f| resolve(f.name)).collect(),
            instance_names: def.instantiations.iter().map(|i| resolve(i.name)).collect(),
        }
    }

    /// Index of a named element.
    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.element_names.iter().position(|n| n == name)
    }

    /// Index of a named port field.
    pub fn port_index(&self, name: &str) -> Option<usize> {
        self.port_names.iter().position(|n| n == name)
    }

    /// Index of a named function.
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.function_names.iter().position(|n| n == name)
    }
}

/// Edge from a parent instance to a nested instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEdge {
    /// The nested instance.
    pub instance: InstanceId,
    /// Parent element holding the instantiation object.
    pub element: usize,
}

/// The runtime state of one module instance.
pub struct ModuleInstance {
    pub(crate) module: Arc<ModuleEntry>,
    pub(crate) path: String,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) children: Vec<ChildEdge>,
    pub(crate) frame: SignalFrame,
    pub(crate) sensitivity: SensitivityTable,
    pub(crate) run_list: RunList,
    pub(crate) schedule: TimeSchedule,
    pub(crate) read_mask: Vec<u8>,
    pub(crate) port_event: bool,
    pub(crate) drivers: Vec<DriverFn>,
}

impl ModuleInstance {
    pub(crate) fn new(module: Arc<ModuleEntry>, path: String, parent: Option<InstanceId>) -> Self {
        let layout = Arc::clone(&module.def.layout);
        let elements = layout.element_count();
        Self {
            module,
            path,
            parent,
            children: Vec::new(),
            frame: SignalFrame::new(layout),
            sensitivity: SensitivityTable::new(elements),
            run_list: RunList::new(),
            schedule: TimeSchedule::new(),
            read_mask: vec![0; elements],
            port_event: false,
            drivers: Vec::new(),
        }
    }

    /// The resolved module definition.
    pub fn module(&self) -> &ModuleEntry {
        &self.module
    }

    /// Dotted instance path; empty for the top instance.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment; the module name for the top instance.
    pub fn name(&self) -> &str {
        match self.path.rsplit_once('.') {
            Some((_, last)) => last,
            None if self.path.is_empty() => &self.module.name,
            None => &self.path,
        }
    }

    /// Enclosing instance, `None` for the top.
    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    /// Nested instances in declaration order.
    pub fn children(&self) -> &[ChildEdge] {
        &self.children
    }

    /// The signal frame.
    pub fn frame(&self) -> &SignalFrame {
        &self.frame
    }

    /// The sensitivity table.
    pub fn sensitivity(&self) -> &SensitivityTable {
        &self.sensitivity
    }

    /// Processes pending for the next delta cycle.
    pub fn run_list(&self) -> &RunList {
        &self.run_list
    }

    /// Pending time-driven activations.
    pub fn schedule(&self) -> &TimeSchedule {
        &self.schedule
    }

    /// Whether the port element changed in the last diff.
    pub fn port_event(&self) -> bool {
        self.port_event
    }

    /// Human-readable name for logs.
    pub fn display_name(&self) -> String {
        if self.path.is_empty() {
            self.module.name.clone()
        } else {
            format!("{} ({})", self.module.name, self.path)
        }
    }
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("module", &self.module.name)
            .field("path", &self.path)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("run_list", &self.run_list)
            .field("drivers", &self.drivers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_ir::{ModuleBuilder, ValueType};

    fn entry(interner: &Interner) -> Arc<ModuleEntry> {
        let mut b = ModuleBuilder::new("test::leaf", interner);
        b.port("y", ValueType::Int);
        b.element("x", ValueType::Bool);
        b.function("get", vec![], Some(ValueType::Int), |_, _| None);
        let def = b.build().unwrap();
        Arc::new(ModuleEntry::new(ModuleId::from_raw(0), &def, interner))
    }

    #[test]
    fn names_are_resolved() {
        let interner = Interner::new();
        let e = entry(&interner);
        assert_eq!(e.name, "test::leaf");
        assert_eq!(e.element_names, vec!["port", "x"]);
        assert_eq!(e.port_index("y"), Some(0));
        assert_eq!(e.function_index("get"), Some(0));
        assert_eq!(e.element_index("z"), None);
    }

    #[test]
    fn instance_naming() {
        let interner = Interner::new();
        let top = ModuleInstance::new(entry(&interner), String::new(), None);
        assert_eq!(top.name(), "test::leaf");
        assert_eq!(top.display_name(), "test::leaf");
        let nested = ModuleInstance::new(
            entry(&interner),
            "a.b".to_string(),
            Some(InstanceId::from_raw(0)),
        );
        assert_eq!(nested.name(), "b");
        assert_eq!(nested.display_name(), "test::leaf (a.b)");
        assert_eq!(nested.read_mask.len(), 2);
        assert_eq!(nested.sensitivity().len(), 2);
    }

    #[test]
    fn instance_id_serde_roundtrip() {
        let id = InstanceId::from_raw(12);
        let json = serde_json::to_string(&id).unwrap();
        let back: InstanceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
