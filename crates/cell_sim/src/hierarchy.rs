//! Port-event propagation across the instance hierarchy.

use crate::instance::InstanceId;
use crate::runset::Runset;
use cell_ir::ProcessId;
use std::collections::BTreeSet;
use tracing::trace;

impl Runset {
    /// Wakes enclosing-instance processes sensitive to an instantiation
    /// whose child had a port event in the last diff.
    ///
    /// Only the parent of the changed instance is affected; siblings and
    /// other instances of the same module are not.
    pub fn propagate_port_events(&mut self) {
        let ids: Vec<InstanceId> = self.instances.ids().collect();
        for id in ids {
            let inst = &self.instances[id];
            let mut woken: BTreeSet<ProcessId> = BTreeSet::new();
            for edge in &inst.children {
                if self.instances[edge.instance].port_event {
                    let sensitive = inst.sensitivity.sensitive_to(edge.element);
                    trace!(
                        parent = %inst.display_name(),
                        child = %self.instances[edge.instance].path,
                        processes = sensitive.len(),
                        "port event"
                    );
                    woken.extend(sensitive.iter().copied());
                }
            }
            if !woken.is_empty() {
                self.instances[id].run_list.extend(&woken);
            }
        }
    }
}
