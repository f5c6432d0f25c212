//! Per-instance time schedule for time-driven processes.
//!
//! Two ordered multimaps keyed by absolute time: one for periodic and
//! one-shot processes, carrying the recurrence period, and one for recurrent
//! processes that report their own next wake time. Keys are normalized to
//! picoseconds on insertion.

use cell_common::Time;
use cell_ir::ProcessId;
use std::collections::BTreeMap;

/// Pending activations of time-driven processes.
#[derive(Debug, Clone, Default)]
pub struct TimeSchedule {
    periodic: BTreeMap<Time, Vec<(Time, ProcessId)>>,
    recurrent: BTreeMap<Time, Vec<ProcessId>>,
}

impl TimeSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `process` at `at`, to be rescheduled every `period` if the
    /// period is non-zero.
    pub fn schedule(&mut self, at: Time, period: Time, process: ProcessId) {
        self.periodic
            .entry(at.to_ps())
            .or_default()
            .push((period.to_ps(), process));
    }

    /// Schedules a recurrent process invocation at `at`.
    pub fn schedule_recurrent(&mut self, at: Time, process: ProcessId) {
        self.recurrent.entry(at.to_ps()).or_default().push(process);
    }

    /// Removes and returns every periodic entry due at or before `t`.
    pub fn pop_periodic(&mut self, t: Time) -> Vec<(Time, ProcessId)> {
        let later = self.periodic.split_off(&next_ps(t));
        let due = std::mem::replace(&mut self.periodic, later);
        due.into_values().flatten().collect()
    }

    /// Removes and returns every recurrent entry due at or before `t`.
    pub fn pop_recurrent(&mut self, t: Time) -> Vec<ProcessId> {
        let later = self.recurrent.split_off(&next_ps(t));
        let due = std::mem::replace(&mut self.recurrent, later);
        due.into_values().flatten().collect()
    }

    /// Earliest time with a pending entry in either map.
    pub fn next_time(&self) -> Option<Time> {
        let p = self.periodic.keys().next().copied();
        let r = self.recurrent.keys().next().copied();
        match (p, r) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Number of pending periodic and recurrent entries.
    pub fn len(&self) -> usize {
        self.periodic.values().map(Vec::len).sum::<usize>()
            + self.recurrent.values().map(Vec::len).sum::<usize>()
    }

    /// Returns `true` if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.periodic.is_empty() && self.recurrent.is_empty()
    }

    /// Times at which `process` is scheduled, in order.
    pub fn times_of(&self, process: ProcessId) -> Vec<Time> {
        let periodic = self
            .periodic
            .iter()
            .filter(|(_, v)| v.iter().any(|(_, p)| *p == process))
            .map(|(t, _)| *t);
        let recurrent = self
            .recurrent
            .iter()
            .filter(|(_, v)| v.contains(&process))
            .map(|(t, _)| *t);
        let mut times: Vec<Time> = periodic.chain(recurrent).collect();
        times.sort();
        times
    }
}

/// The smallest picosecond time strictly after `t`.
fn next_ps(t: Time) -> Time {
    let ps = t.to_ps();
    Time::ps(ps.value.saturating_add(1))
}
