//! The calling convention between the simulator and compiled processes.
//!
//! A process sees three views of its own frame: `input` (current values),
//! `prev` (values at the end of the last time step) and `out` (the pending
//! next values it may write). Every element read through [`ProcessContext`]
//! marks the read mask, which the simulator turns into sensitivity. Ports of
//! nested instances are reachable read-only through [`ChildPort`] views.

use crate::layout::{Layout, PORT_ELEMENT};
use crate::value::Value;

/// Read-only view of a nested instance's port socket.
#[derive(Debug, Clone, Copy)]
pub struct ChildPort<'a> {
    /// Element index of the instantiation slot in the parent's layout.
    pub element: usize,
    /// Layout of the child module.
    pub layout: &'a Layout,
    /// The child's current frame.
    pub current: &'a [u8],
}

/// Buffers and metadata handed to a process invocation.
pub struct ProcessContext<'a> {
    out: &'a mut [u8],
    input: &'a [u8],
    prev: &'a [u8],
    read_mask: &'a mut [u8],
    layout: &'a Layout,
    children: &'a [ChildPort<'a>],
}

impl<'a> ProcessContext<'a> {
    /// Assembles a context. `read_mask` holds one byte per element.
    pub fn new(
        out: &'a mut [u8],
        input: &'a [u8],
        prev: &'a [u8],
        read_mask: &'a mut [u8],
        layout: &'a Layout,
        children: &'a [ChildPort<'a>],
    ) -> Self {
        debug_assert_eq!(read_mask.len(), layout.element_count());
        Self {
            out,
            input,
            prev,
            read_mask,
            layout,
            children,
        }
    }

    /// The module's layout.
    pub fn layout(&self) -> &Layout {
        self.layout
    }

    /// Marks an element as read without decoding it.
    pub fn mark_read(&mut self, element: usize) {
        self.read_mask[element] = 1;
    }

    /// Reads the current value of a scalar element and marks it read.
    pub fn read(&mut self, element: usize) -> Option<Value> {
        self.mark_read(element);
        let e = self.layout.element(element);
        Value::decode(&e.ty, &self.input[e.range()])
    }

    /// Integer shorthand for [`read`](Self::read); non-integers read as 0.
    pub fn read_int(&mut self, element: usize) -> i64 {
        self.read(element).and_then(|v| v.as_i64()).unwrap_or(0)
    }

    /// Boolean shorthand for [`read`](Self::read).
    pub fn read_bool(&mut self, element: usize) -> bool {
        self.read(element).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Reads an element's value from the previous time step. Not tracked.
    pub fn read_prev(&self, element: usize) -> Option<Value> {
        let e = self.layout.element(element);
        Value::decode(&e.ty, &self.prev[e.range()])
    }

    /// Reads the pending next value of an element. Not tracked.
    pub fn read_next(&self, element: usize) -> Option<Value> {
        let e = self.layout.element(element);
        Value::decode(&e.ty, &self.out[e.range()])
    }

    /// Writes the next value of a scalar element.
    pub fn write(&mut self, element: usize, value: impl Into<Value>) {
        let range = self.layout.element(element).range();
        value.into().encode(&mut self.out[range]);
    }

    /// Reads a port field and marks the socket read.
    pub fn read_port(&mut self, field: usize) -> Option<Value> {
        self.mark_read(PORT_ELEMENT);
        let f = self.layout.port_field(field);
        Value::decode(&f.ty, &self.input[f.offset..f.offset + f.ty.size()])
    }

    /// Integer shorthand for [`read_port`](Self::read_port).
    pub fn read_port_int(&mut self, field: usize) -> i64 {
        self.read_port(field).and_then(|v| v.as_i64()).unwrap_or(0)
    }

    /// Writes a port field.
    pub fn write_port(&mut self, field: usize, value: impl Into<Value>) {
        let f = self.layout.port_field(field);
        let range = f.offset..f.offset + f.ty.size();
        value.into().encode(&mut self.out[range]);
    }

    /// Number of nested instances visible to this process.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Reads a port field of the `slot`-th nested instance.
    ///
    /// Marks the instantiation's element read, so the process is rerun when
    /// the child's ports change.
    pub fn child_port(&mut self, slot: usize, field: usize) -> Option<Value> {
        let child = self.children[slot];
        self.mark_read(child.element);
        let f = child.layout.port_field(field);
        Value::decode(&f.ty, &child.current[f.offset..f.offset + f.ty.size()])
    }

    /// Integer shorthand for [`child_port`](Self::child_port).
    pub fn child_port_int(&mut self, slot: usize, field: usize) -> i64 {
        self.child_port(slot, field)
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    /// Raw current frame, for generated code that tracks reads itself.
    pub fn input(&self) -> &[u8] {
        self.input
    }

    /// Raw next frame.
    pub fn out(&mut self) -> &mut [u8] {
        self.out
    }

    /// Raw read mask, one byte per element.
    pub fn read_mask(&mut self) -> &mut [u8] {
        self.read_mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutBuilder;
    use crate::value::ValueType;
    use cell_common::Interner;

    struct Frames {
        layout: Layout,
        current: Vec<u8>,
        next: Vec<u8>,
        prev: Vec<u8>,
        mask: Vec<u8>,
    }

    fn frames() -> Frames {
        let interner = Interner::new();
        let mut b = LayoutBuilder::new();
        b.port(interner.get_or_intern("o"), ValueType::Int);
        b.element(interner.get_or_intern("a"), ValueType::Int);
        b.element(interner.get_or_intern("b"), ValueType::Bool);
        let layout = b.build();
        let size = layout.size();
        let count = layout.element_count();
        Frames {
            layout,
            current: vec![0; size],
            next: vec![0; size],
            prev: vec![0; size],
            mask: vec![0; count],
        }
    }

    #[test]
    fn reads_mark_mask() {
        let mut f = frames();
        Value::Int(9).encode(&mut f.current[8..]);
        let mut ctx = ProcessContext::new(
            &mut f.next,
            &f.current,
            &f.prev,
            &mut f.mask,
            &f.layout,
            &[],
        );
        assert_eq!(ctx.read_int(1), 9);
        assert_eq!(ctx.read_next(2), Some(Value::Bool(false)));
        assert_eq!(f.mask, vec![0, 1, 0]);
    }

    #[test]
    fn writes_go_to_next() {
        let mut f = frames();
        let mut ctx = ProcessContext::new(
            &mut f.next,
            &f.current,
            &f.prev,
            &mut f.mask,
            &f.layout,
            &[],
        );
        ctx.write_port(0, 4i64);
        ctx.write(2, true);
        assert_eq!(f.next[0], 4);
        assert_eq!(f.next[16], 1);
        assert!(f.current.iter().all(|b| *b == 0));
        assert!(f.mask.iter().all(|b| *b == 0));
    }

    #[test]
    fn port_read_marks_socket() {
        let mut f = frames();
        let mut ctx = ProcessContext::new(
            &mut f.next,
            &f.current,
            &f.prev,
            &mut f.mask,
            &f.layout,
            &[],
        );
        assert_eq!(ctx.read_port_int(0), 0);
        assert_eq!(f.mask[PORT_ELEMENT], 1);
    }

    #[test]
    fn child_port_marks_instantiation() {
        let interner = Interner::new();
        let mut cb = LayoutBuilder::new();
        cb.port(interner.get_or_intern("y"), ValueType::Int);
        let child_layout = cb.build();
        let mut child_frame = vec![0u8; child_layout.size()];
        Value::Int(21).encode(&mut child_frame);

        let mut pb = LayoutBuilder::new();
        let slot = pb.instance(interner.get_or_intern("c"));
        let parent = pb.build();
        let mut next = vec![0u8; parent.size()];
        let current = next.clone();
        let prev = next.clone();
        let mut mask = vec![0u8; parent.element_count()];
        let children = [ChildPort {
            element: slot,
            layout: &child_layout,
            current: &child_frame,
        }];
        let mut ctx =
            ProcessContext::new(&mut next, &current, &prev, &mut mask, &parent, &children);
        assert_eq!(ctx.child_count(), 1);
        assert_eq!(ctx.child_port_int(0, 0), 21);
        assert_eq!(mask[slot], 1);
    }
}
