//! Discrete-event simulation kernel for Cell hardware designs.
//!
//! The kernel takes a [`Design`] of compiled modules, instantiates the
//! module tree below a chosen top module and advances simulated time.
//! Within every time step it runs delta cycles: drivers and pending
//! processes write into `next`, the changes are diffed against `current`,
//! committed, and the processes that read a changed element are queued
//! again. Sensitivity is discovered at runtime from what each process
//! actually read.
//!
//! # Usage
//!
//! ```ignore
//! use cell_sim::{SimKernel, SimConfig};
//!
//! let mut kernel = SimKernel::new(&design, "test::counter", &interner)?;
//! kernel.setup()?;
//! let report = kernel.simulate(Time::ns(10))?;
//! let count = kernel.inspect("")?.get("count")?;
//! ```
//!
//! # Modules
//!
//! - `frame`, `sensitivity`, `run_list`, `schedule`: per-instance state
//! - `runset`: the flattened instance tree
//! - `delta`, `hierarchy`: one delta cycle and port-event propagation
//! - `kernel`: lifecycle and time advancement
//! - `inspect`, `instrument`: outside views of the running design

#![warn(missing_docs)]

pub mod config;
pub mod delta;
pub mod error;
pub mod frame;
pub mod hierarchy;
pub mod inspect;
pub mod instance;
pub mod instrument;
pub mod kernel;
pub mod logging;
pub mod run_list;
pub mod runset;
pub mod schedule;
pub mod sensitivity;

use cell_common::Interner;
use cell_ir::Design;

pub use config::SimConfig;
pub use error::SimError;
pub use frame::SignalFrame;
pub use inspect::ModuleInspector;
pub use instance::{ChildEdge, DriverFn, InstanceId, ModuleEntry, ModuleInstance};
pub use instrument::{HandleElement, Instrumenter, ModuleHandle};
pub use kernel::{SimKernel, SimReport};
pub use logging::init_logging;
pub use run_list::RunList;
pub use runset::Runset;
pub use schedule::TimeSchedule;
pub use sensitivity::SensitivityTable;

/// Runs `top` for `config.duration` and returns the report.
///
/// Sets the kernel up, simulates and tears down again.
pub fn simulate(
    design: &Design,
    config: &SimConfig,
    top: &str,
    interner: &Interner,
) -> Result<SimReport, SimError> {
    let mut kernel = SimKernel::with_config(design, top, config, interner)?;
    kernel.setup()?;
    let report = kernel.simulate(config.duration)?;
    kernel.teardown();
    Ok(report)
}
