//! Module definitions and the builder the code generator uses to emit them.

use crate::arena::Arena;
use crate::context::ProcessContext;
use crate::ids::{ModuleId, ProcessId};
use crate::layout::{Layout, LayoutBuilder};
use crate::process::ProcessDef;
use crate::value::{Value, ValueType};
use cell_common::{CellResult, Ident, InternalError, Interner};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Body of an introspectable function. Returns `None` for unit functions.
pub type FunctionFn = Arc<dyn Fn(&mut ProcessContext<'_>, &[Value]) -> Option<Value> + Send + Sync>;

/// Constructor run once per instance at setup, before any process.
pub type ConstructorFn = Arc<dyn Fn(&mut ProcessContext<'_>) + Send + Sync>;

/// A nested instance declared by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instantiation {
    /// Instance name, unique within the parent.
    pub name: Ident,
    /// The instantiated module.
    pub module: ModuleId,
    /// The parent element holding the instance slot.
    pub element: usize,
}

/// A function callable from outside the simulation.
#[derive(Clone)]
pub struct FunctionDef {
    /// Function name.
    pub name: Ident,
    /// Parameter types in order.
    pub params: Vec<ValueType>,
    /// Return type, `None` for unit.
    pub ret: Option<ValueType>,
    /// Compiled body.
    pub body: FunctionFn,
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .finish_non_exhaustive()
    }
}

/// A module definition: layout, processes, nested instances and functions.
#[derive(Clone)]
pub struct ModuleDef {
    /// Fully qualified module name.
    pub name: Ident,
    /// Frame layout shared by every instance.
    pub layout: Arc<Layout>,
    /// Processes in declaration order.
    pub processes: Arena<ProcessId, ProcessDef>,
    /// Nested instances in declaration order.
    pub instantiations: Vec<Instantiation>,
    /// Introspectable functions.
    pub functions: Vec<FunctionDef>,
    /// Optional constructor.
    pub constructor: Option<ConstructorFn>,
    /// Initial values written to fresh frames.
    pub inits: Vec<(usize, Value)>,
}

impl ModuleDef {
    /// Looks up a function by name.
    pub fn find_function(&self, name: Ident) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Looks up an instantiation by name.
    pub fn find_instantiation(&self, name: Ident) -> Option<&Instantiation> {
        self.instantiations.iter().find(|i| i.name == name)
    }
}

impl fmt::Debug for ModuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDef")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("processes", &self.processes.len())
            .field("instantiations", &self.instantiations)
            .field("functions", &self.functions)
            .finish_non_exhaustive()
    }
}

/// Builds a [`ModuleDef`], resolving names through an interner.
pub struct ModuleBuilder<'i> {
    interner: &'i Interner,
    name: Ident,
    layout: LayoutBuilder,
    processes: Arena<ProcessId, ProcessDef>,
    instantiations: Vec<Instantiation>,
    functions: Vec<FunctionDef>,
    constructor: Option<ConstructorFn>,
    inits: Vec<(usize, Value)>,
}

impl<'i> ModuleBuilder<'i> {
    /// Starts a module with the given fully qualified name.
    pub fn new(name: &str, interner: &'i Interner) -> Self {
        Self {
            interner,
            name: interner.get_or_intern(name),
            layout: LayoutBuilder::new(),
            processes: Arena::new(),
            instantiations: Vec::new(),
            functions: Vec::new(),
            constructor: None,
            inits: Vec::new(),
        }
    }

    /// Declares a port field, returning its field index.
    pub fn port(&mut self, name: &str, ty: ValueType) -> usize {
        self.layout.port(self.interner.get_or_intern(name), ty)
    }

    /// Declares an element, returning its element index.
    pub fn element(&mut self, name: &str, ty: ValueType) -> usize {
        self.layout.element(self.interner.get_or_intern(name), ty)
    }

    /// Declares an element with an initial value.
    pub fn element_with_init(&mut self, name: &str, init: Value) -> usize {
        let index = self.element(name, init.value_type());
        self.inits.push((index, init));
        index
    }

    /// Declares a nested instance of `module`, returning its element index.
    pub fn instance(&mut self, name: &str, module: ModuleId) -> usize {
        let ident = self.interner.get_or_intern(name);
        let element = self.layout.instance(ident);
        self.instantiations.push(Instantiation {
            name: ident,
            module,
            element,
        });
        element
    }

    /// Adds a process.
    pub fn process(&mut self, process: ProcessDef) -> ProcessId {
        self.processes.alloc(process)
    }

    /// Adds a named process.
    pub fn named_process(&mut self, name: &str, process: ProcessDef) -> ProcessId {
        let ident = self.interner.get_or_intern(name);
        self.processes.alloc(process.named(ident))
    }

    /// Adds an introspectable function.
    pub fn function<F>(&mut self, name: &str, params: Vec<ValueType>, ret: Option<ValueType>, body: F)
    where
        F: Fn(&mut ProcessContext<'_>, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.functions.push(FunctionDef {
            name: self.interner.get_or_intern(name),
            params,
            ret,
            body: Arc::new(body),
        });
    }

    /// Sets the constructor.
    pub fn constructor<F>(&mut self, f: F)
    where
        F: Fn(&mut ProcessContext<'_>) + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
    }

    /// Validates names and produces the definition.
    pub fn build(self) -> CellResult<ModuleDef> {
        let layout = self.layout.build();
        let module = self.interner.resolve(self.name);

        let mut seen = HashSet::new();
        for e in layout.elements().iter().skip(1) {
            if let Some(name) = e.name {
                if !seen.insert(name) {
                    return Err(InternalError::new(format!(
                        "duplicate element '{}' in module '{module}'",
                        self.interner.resolve(name)
                    )));
                }
            }
        }
        let mut seen = HashSet::new();
        for f in layout.port_fields() {
            if !seen.insert(f.name) {
                return Err(InternalError::new(format!(
                    "duplicate port '{}' in module '{module}'",
                    self.interner.resolve(f.name)
                )));
            }
        }
        let mut seen = HashSet::new();
        for f in &self.functions {
            if !seen.insert(f.name) {
                return Err(InternalError::new(format!(
                    "duplicate function '{}' in module '{module}'",
                    self.interner.resolve(f.name)
                )));
            }
        }
        Ok(ModuleDef {
            name: self.name,
            layout: Arc::new(layout),
            processes: self.processes,
            instantiations: self.instantiations,
            functions: self.functions,
            constructor: self.constructor,
            inits: self.inits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_layout_and_processes() {
        let interner = Interner::new();
        let mut b = ModuleBuilder::new("top::counter", &interner);
        let q = b.port("q", ValueType::Int);
        let count = b.element_with_init("count", Value::Int(0));
        let pid = b.named_process(
            "tick",
            ProcessDef::sensitive(move |ctx| {
                let v = ctx.read_int(count);
                ctx.write_port(q, v);
            }),
        );
        let m = b.build().unwrap();
        assert_eq!(interner.resolve(m.name), "top::counter");
        assert_eq!(pid.as_raw(), 0);
        assert_eq!(m.processes.len(), 1);
        assert_eq!(m.inits, vec![(count, Value::Int(0))]);
        assert_eq!(m.layout.size(), 16);
    }

    #[test]
    fn instance_records_slot() {
        let interner = Interner::new();
        let mut b = ModuleBuilder::new("top", &interner);
        b.element("x", ValueType::Bool);
        let slot = b.instance("leaf", ModuleId::from_raw(3));
        let m = b.build().unwrap();
        let inst = m.find_instantiation(interner.get_or_intern("leaf")).unwrap();
        assert_eq!(inst.element, slot);
        assert_eq!(inst.module, ModuleId::from_raw(3));
        assert_eq!(m.layout.element(slot).size, 0);
    }

    #[test]
    fn duplicate_element_rejected() {
        let interner = Interner::new();
        let mut b = ModuleBuilder::new("m", &interner);
        b.element("x", ValueType::Int);
        b.element("x", ValueType::Bool);
        let err = b.build().unwrap_err();
        assert!(err.message.contains("duplicate element 'x'"));
    }

    #[test]
    fn duplicate_function_rejected() {
        let interner = Interner::new();
        let mut b = ModuleBuilder::new("m", &interner);
        b.function("f", vec![], None, |_, _| None);
        b.function("f", vec![], None, |_, _| None);
        assert!(b.build().is_err());
    }

    #[test]
    fn find_function() {
        let interner = Interner::new();
        let mut b = ModuleBuilder::new("m", &interner);
        b.function("get", vec![], Some(ValueType::Int), |_, _| Some(Value::Int(1)));
        let m = b.build().unwrap();
        let f = m.find_function(interner.get_or_intern("get")).unwrap();
        assert_eq!(f.ret, Some(ValueType::Int));
        assert!(m.find_function(interner.get_or_intern("set")).is_none());
    }
}
