//! Per-instance sensitivity table.

use cell_ir::ProcessId;
use std::collections::BTreeSet;

/// Maps each element index to the processes that must rerun when it changes.
///
/// Entries reflect the most recent execution of each sensitive process: an
/// element a process stopped reading no longer wakes it.
#[derive(Debug, Clone, Default)]
pub struct SensitivityTable {
    sets: Vec<BTreeSet<ProcessId>>,
}

impl SensitivityTable {
    /// An empty table for `element_count` elements.
    pub fn new(element_count: usize) -> Self {
        Self {
            sets: vec![BTreeSet::new(); element_count],
        }
    }

    /// Replaces the registrations of `process` with the elements marked in
    /// `read_mask`.
    pub fn reconcile(&mut self, process: ProcessId, read_mask: &[u8]) {
        for (set, read) in self.sets.iter_mut().zip(read_mask) {
            if *read != 0 {
                set.insert(process);
            } else {
                set.remove(&process);
            }
        }
    }

    /// Processes sensitive to `element`.
    pub fn sensitive_to(&self, element: usize) -> &BTreeSet<ProcessId> {
        &self.sets[element]
    }

    /// Elements `process` is currently registered for.
    pub fn elements_of(&self, process: ProcessId) -> Vec<usize> {
        self.sets
            .iter()
            .enumerate()
            .filter(|(_, s)| s.contains(&process))
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of elements covered.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` if the table covers no elements.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u32) -> ProcessId {
        ProcessId::from_raw(n)
    }

    #[test]
    fn reconcile_adds_and_removes() {
        let mut t = SensitivityTable::new(3);
        t.reconcile(pid(0), &[0, 1, 1]);
        assert_eq!(t.elements_of(pid(0)), vec![1, 2]);
        t.reconcile(pid(0), &[1, 0, 1]);
        assert_eq!(t.elements_of(pid(0)), vec![0, 2]);
        assert!(t.sensitive_to(1).is_empty());
    }

    #[test]
    fn processes_are_independent() {
        let mut t = SensitivityTable::new(2);
        t.reconcile(pid(0), &[1, 0]);
        t.reconcile(pid(1), &[1, 1]);
        t.reconcile(pid(0), &[0, 0]);
        assert_eq!(t.sensitive_to(0).iter().copied().collect::<Vec<_>>(), vec![pid(1)]);
        assert_eq!(t.elements_of(pid(1)), vec![0, 1]);
        assert_eq!(t.len(), 2);
    }
}
