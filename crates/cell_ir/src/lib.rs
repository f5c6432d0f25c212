//! CellIR: the static module graph handed to the simulator.
//!
//! The resolver and code generator (external to this workspace) produce a
//! [`Design`]: one [`ModuleDef`] per module with its structural [`Layout`],
//! its processes as compiled entry points, its nested instantiations and the
//! functions reachable through introspection. The simulator never looks
//! inside a process; it only decides when to call it.

#![warn(missing_docs)]

pub mod arena;
pub mod context;
pub mod design;
pub mod ids;
pub mod layout;
pub mod module;
pub mod process;
pub mod value;

pub use arena::{Arena, ArenaId};
pub use context::{ChildPort, ProcessContext};
pub use design::Design;
pub use ids::{ModuleId, ProcessId};
pub use layout::{ElementLayout, Layout, LayoutBuilder, PortField, PORT_ELEMENT};
pub use module::{ConstructorFn, FunctionDef, FunctionFn, Instantiation, ModuleBuilder, ModuleDef};
pub use process::{EntryPoint, ProcessDef, ProcessFn, ProcessKind, RecurrentFn};
pub use value::{Value, ValueType};
