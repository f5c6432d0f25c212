//! Compiled processes and their scheduling kinds.

use crate::context::ProcessContext;
use cell_common::{Ident, Time};
use std::fmt;
use std::sync::Arc;

/// Entry point of an ordinary process.
pub type ProcessFn = Arc<dyn Fn(&mut ProcessContext<'_>) + Send + Sync>;

/// Entry point of a recurrent process.
///
/// Receives the current time in picoseconds and returns the absolute time,
/// in picoseconds, at which it wants to run next.
pub type RecurrentFn = Arc<dyn Fn(&mut ProcessContext<'_>, i64) -> i64 + Send + Sync>;

/// How the simulator decides when to run a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    /// Runs whenever an element it read last time changes.
    Sensitive,
    /// Runs at time 0 and every `period` thereafter.
    Periodic {
        /// Interval between activations.
        period: Time,
    },
    /// Runs once, at the given absolute time.
    Once {
        /// Activation time.
        at: Time,
    },
    /// Runs at time 0 and then whenever it asks to.
    Recurrent,
}

/// The callable behind a process.
#[derive(Clone)]
pub enum EntryPoint {
    /// Called with a context only.
    Ordinary(ProcessFn),
    /// Called with a context and the time, returns its next wake time.
    Recurrent(RecurrentFn),
}

/// A process belonging to a module definition.
#[derive(Clone)]
pub struct ProcessDef {
    /// Optional name, used in logs.
    pub name: Option<Ident>,
    kind: ProcessKind,
    entry: EntryPoint,
}

impl ProcessDef {
    /// A combinational process driven by its read set.
    pub fn sensitive<F>(f: F) -> Self
    where
        F: Fn(&mut ProcessContext<'_>) + Send + Sync + 'static,
    {
        Self::ordinary(ProcessKind::Sensitive, f)
    }

    /// A process that runs at time 0 and every `period` thereafter.
    pub fn periodic<F>(period: Time, f: F) -> Self
    where
        F: Fn(&mut ProcessContext<'_>) + Send + Sync + 'static,
    {
        Self::ordinary(ProcessKind::Periodic { period }, f)
    }

    /// A process that runs once at `at`.
    pub fn once<F>(at: Time, f: F) -> Self
    where
        F: Fn(&mut ProcessContext<'_>) + Send + Sync + 'static,
    {
        Self::ordinary(ProcessKind::Once { at }, f)
    }

    /// A self-scheduling process.
    pub fn recurrent<F>(f: F) -> Self
    where
        F: Fn(&mut ProcessContext<'_>, i64) -> i64 + Send + Sync + 'static,
    {
        Self {
            name: None,
            kind: ProcessKind::Recurrent,
            entry: EntryPoint::Recurrent(Arc::new(f)),
        }
    }

    fn ordinary<F>(kind: ProcessKind, f: F) -> Self
    where
        F: Fn(&mut ProcessContext<'_>) + Send + Sync + 'static,
    {
        Self {
            name: None,
            kind,
            entry: EntryPoint::Ordinary(Arc::new(f)),
        }
    }

    /// Attaches a name.
    pub fn named(mut self, name: Ident) -> Self {
        self.name = Some(name);
        self
    }

    /// The scheduling kind.
    pub fn kind(&self) -> ProcessKind {
        self.kind
    }

    /// The entry point.
    pub fn entry(&self) -> &EntryPoint {
        &self.entry
    }

    /// Whether the process participates in sensitivity tracking.
    pub fn is_sensitive(&self) -> bool {
        self.kind == ProcessKind::Sensitive
    }

    /// Invokes the process.
    ///
    /// Ordinary processes return `None`. Recurrent ones return the next
    /// requested time in picoseconds.
    pub fn invoke(&self, ctx: &mut ProcessContext<'_>, now_ps: i64) -> Option<i64> {
        match &self.entry {
            EntryPoint::Ordinary(f) => {
                f(ctx);
                None
            }
            EntryPoint::Recurrent(f) => Some(f(ctx, now_ps)),
        }
    }
}

impl fmt::Debug for ProcessDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
