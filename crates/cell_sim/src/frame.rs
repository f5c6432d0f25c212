//! Signal frames: the three byte buffers of a module instance.

use cell_ir::{Layout, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// The `current`, `next` and `previous` buffers of one module instance.
///
/// All three share the instance's [`Layout`]. `current` is what processes
/// read, `next` is what they write, and `previous` holds the state as of the
/// start of the present time step.
#[derive(Debug, Clone)]
pub struct SignalFrame {
    layout: Arc<Layout>,
    pub(crate) current: Vec<u8>,
    pub(crate) next: Vec<u8>,
    pub(crate) previous: Vec<u8>,
}

impl SignalFrame {
    /// Allocates zeroed buffers for `layout`.
    pub fn new(layout: Arc<Layout>) -> Self {
        let size = layout.size();
        Self {
            layout,
            current: vec![0; size],
            next: vec![0; size],
            previous: vec![0; size],
        }
    }

    /// The frame layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Shared handle to the frame layout.
    pub fn layout_arc(&self) -> Arc<Layout> {
        Arc::clone(&self.layout)
    }

    /// Values visible to processes.
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    /// Pending values written by processes.
    pub fn next(&self) -> &[u8] {
        &self.next
    }

    /// Values as of the start of the present time step.
    pub fn previous(&self) -> &[u8] {
        &self.previous
    }

    /// Writes `value` into element `element` of all three buffers.
    pub fn initialize(&mut self, element: usize, value: Value) {
        let range = self.layout.element(element).range();
        value.encode(&mut self.current[range.clone()]);
        value.encode(&mut self.next[range.clone()]);
        value.encode(&mut self.previous[range]);
    }

    /// Makes `current` and `previous` equal to `next`.
    pub fn settle(&mut self) {
        self.current.copy_from_slice(&self.next);
        self.previous.copy_from_slice(&self.next);
    }

    /// Indices of the elements whose bytes differ between `next` and `current`.
    pub fn changed_elements(&self) -> BTreeSet<usize> {
        let mut changed = BTreeSet::new();
        let mut i = 0;
        while i < self.next.len() {
            if self.next[i] != self.current[i] {
                let element = self.layout.element_containing_offset(i);
                tracing::trace!(byte = i, element, "mismatch");
                changed.insert(element);
                // Skip the rest of this element.
                i = self.layout.element(element).range().end.max(i + 1);
            } else {
                i += 1;
            }
        }
        changed
    }

    /// Copies `next` into `current`.
    pub fn commit(&mut self) {
        self.current.copy_from_slice(&self.next);
    }

    /// Copies `current` into `previous`.
    pub fn snapshot_previous(&mut self) {
        self.previous.copy_from_slice(&self.current);
    }

    /// Returns `true` if `next` and `current` are byte-identical.
    pub fn is_stable(&self) -> bool {
        self.next == self.current
    }

    /// Bytes of one element in `current`.
    pub fn element_bytes(&self, element: usize) -> &[u8] {
        &self.current[self.layout.element(element).range()]
    }

    /// Decodes one element of `current`.
    pub fn value(&self, element: usize) -> Option<Value> {
        let e = self.layout.element(element);
        Value::decode(&e.ty, &self.current[e.range()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_common::Interner;
    use cell_ir::{LayoutBuilder, ValueType};

    fn frame() -> SignalFrame {
        let interner = Interner::new();
        let mut b = LayoutBuilder::new();
        b.port(interner.get_or_intern("p"), ValueType::Bool);
        b.element(interner.get_or_intern("a"), ValueType::Int);
        b.element(interner.get_or_intern("b"), ValueType::Int);
        SignalFrame::new(Arc::new(b.build()))
    }

    #[test]
    fn fresh_frame_is_stable() {
        let f = frame();
        assert!(f.is_stable());
        assert!(f.changed_elements().is_empty());
        assert_eq!(f.current().len(), 17);
    }

    #[test]
    fn diff_maps_bytes_to_elements() {
        let mut f = frame();
        f.next[0] = 1;
        f.next[3] = 7;
        f.next[4] = 7;
        let changed: Vec<usize> = f.changed_elements().into_iter().collect();
        assert_eq!(changed, vec![0, 1]);
    }

    #[test]
    fn commit_restores_stability() {
        let mut f = frame();
        Value::Int(5).encode(&mut f.next[9..]);
        assert!(!f.is_stable());
        f.commit();
        assert!(f.is_stable());
        assert_eq!(f.value(2), Some(Value::Int(5)));
        assert_eq!(f.previous()[9], 0);
        f.snapshot_previous();
        assert_eq!(f.previous()[9], 5);
    }

    #[test]
    fn initialize_writes_all_buffers() {
        let mut f = frame();
        f.initialize(1, Value::Int(-1));
        assert_eq!(f.element_bytes(1), &[0xff; 8]);
        assert_eq!(&f.next()[1..9], &[0xff; 8]);
        assert_eq!(&f.previous()[1..9], &[0xff; 8]);
    }
}
