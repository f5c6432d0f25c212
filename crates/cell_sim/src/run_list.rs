//! Processes pending execution in the next delta cycle.

use cell_ir::ProcessId;
use std::collections::BTreeSet;

/// A deduplicated set of processes, iterated in process-ID order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunList {
    pending: BTreeSet<ProcessId>,
}

impl RunList {
    /// Creates an empty run list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one process.
    pub fn insert(&mut self, process: ProcessId) -> bool {
        self.pending.insert(process)
    }

    /// Adds every process in `processes`.
    pub fn extend<'a>(&mut self, processes: impl IntoIterator<Item = &'a ProcessId>) {
        self.pending.extend(processes.into_iter().copied());
    }

    /// Removes and returns all pending processes.
    pub fn take(&mut self) -> BTreeSet<ProcessId> {
        std::mem::take(&mut self.pending)
    }

    /// Returns `true` if `process` is pending.
    pub fn contains(&self, process: ProcessId) -> bool {
        self.pending.contains(&process)
    }

    /// Number of pending processes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending processes in execution order.
    pub fn iter(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.pending.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_and_orders() {
        let mut rl = RunList::new();
        rl.insert(ProcessId::from_raw(2));
        rl.insert(ProcessId::from_raw(0));
        assert!(!rl.insert(ProcessId::from_raw(2)));
        let order: Vec<u32> = rl.iter().map(ProcessId::as_raw).collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn take_empties() {
        let mut rl = RunList::new();
        rl.extend(&[ProcessId::from_raw(1), ProcessId::from_raw(3)]);
        let taken = rl.take();
        assert_eq!(taken.len(), 2);
        assert!(rl.is_empty());
        assert!(!rl.contains(ProcessId::from_raw(1)));
    }
}
