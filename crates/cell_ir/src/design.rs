//! Top-level design container.
//!
//! A [`Design`] holds every module definition produced by the resolver and
//! code generator. It is the input to the simulator.

use crate::arena::Arena;
use crate::ids::ModuleId;
use crate::module::ModuleDef;
use cell_common::Interner;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

/// A complete, resolved design.
#[derive(Debug, Clone, Default)]
pub struct Design {
    /// All module definitions, keyed by [`ModuleId`].
    pub modules: Arena<ModuleId, ModuleDef>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module definition and returns its ID.
    pub fn add_module(&mut self, module: ModuleDef) -> ModuleId {
        self.modules.alloc(module)
    }

    /// Returns the module with the given ID.
    pub fn module(&self, id: ModuleId) -> &ModuleDef {
        &self.modules[id]
    }

    /// Returns the number of modules in the design.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Finds a module by its fully qualified path, e.g. `"test::counter"`.
    pub fn find_module(&self, path: &str, interner: &Interner) -> Option<ModuleId> {
        let name = interner.get(path.trim())?;
        self.modules
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
    }

    /// Names of all modules in definition order.
    pub fn module_names(&self, interner: &Interner) -> Vec<String> {
        self.modules
            .values()
            .map(|m| interner.resolve(m.name).to_string())
            .collect()
    }

    /// Returns a module that instantiates itself, directly or through other
    /// modules, if any.
    pub fn instantiation_cycle(&self) -> Option<ModuleId> {
        let mut graph: DiGraph<ModuleId, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = self.modules.ids().map(|id| graph.add_node(id)).collect();
        for (id, module) in self.modules.iter() {
            for inst in &module.instantiations {
                let from = nodes[id.as_raw() as usize];
                let to = nodes[inst.module.as_raw() as usize];
                graph.add_edge(from, to, ());
            }
        }
        toposort(&graph, None)
            .err()
            .map(|cycle| graph[cycle.node_id()])
    }
}
