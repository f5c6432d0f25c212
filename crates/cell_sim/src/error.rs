//! Simulation error types.
//!
//! Every precondition failure raised by the kernel is a variant of
//! [`SimError`]. Non-convergence of a time step is not an error: it is logged
//! and recorded in the run report.

use std::io;

/// Errors that can occur during simulation setup, execution or inspection.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A simulation or inspection call was made before `setup()` or after
    /// `teardown()`.
    #[error("simulation is not set up; call setup() first")]
    NotSetUp,

    /// `setup()` was called twice without an intervening `teardown()`.
    #[error("simulation is already set up")]
    AlreadySetUp,

    /// A module or instance path did not resolve.
    #[error("unknown module '{path}' (available: {})", available.join(", "))]
    UnknownModule {
        /// The path that was looked up.
        path: String,
        /// The names that would have resolved.
        available: Vec<String>,
    },

    /// An element or port name does not exist in the module.
    #[error("module '{module}' has no element '{element}'")]
    UnknownElement {
        /// The module that was inspected.
        module: String,
        /// The requested element.
        element: String,
    },

    /// An element exists but holds no scalar value.
    #[error("element '{element}' of module '{module}' is not a scalar")]
    NotScalar {
        /// The module that was inspected.
        module: String,
        /// The requested element.
        element: String,
    },

    /// A function name does not exist in the module.
    #[error("module '{module}' has no function '{function}'")]
    UnknownFunction {
        /// The module that was inspected.
        module: String,
        /// The requested function.
        function: String,
    },

    /// A function was called with the wrong number or types of arguments.
    #[error("bad arguments for '{function}': {reason}")]
    ArgumentMismatch {
        /// The called function.
        function: String,
        /// What did not match.
        reason: String,
    },

    /// A module instantiates itself, directly or through other modules.
    #[error("module '{module}' instantiates itself")]
    RecursiveInstantiation {
        /// The module on the cycle.
        module: String,
    },

    /// An instrumenter failed to write its output.
    #[error("instrumentation I/O error: {0}")]
    Instrumentation(#[from] io::Error),
}
