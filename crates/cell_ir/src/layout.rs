//! Structural layout of a module's signal frame.
//!
//! Elements are packed in declaration order with no padding. Element 0 is
//! always the port socket, so a change to any of its bytes is a port event.
//! Instance slots are zero-sized markers that never contain a byte.

use crate::value::ValueType;
use cell_common::Ident;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Index of the port socket element in every layout.
pub const PORT_ELEMENT: usize = 0;

/// A structural element: a byte range inside the frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementLayout {
    /// Element name, `None` for the port socket.
    pub name: Option<Ident>,
    /// Element type.
    pub ty: ValueType,
    /// Byte offset from the start of the frame.
    pub offset: usize,
    /// Byte size.
    pub size: usize,
}

impl ElementLayout {
    /// Byte range covered by this element.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }
}

/// A field of the port socket. Offsets are relative to the frame start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortField {
    /// Field name.
    pub name: Ident,
    /// Field type.
    pub ty: ValueType,
    /// Byte offset from the start of the frame.
    pub offset: usize,
}

/// The frame layout of one module definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    elements: Vec<ElementLayout>,
    port_fields: Vec<PortField>,
    size: usize,
}

impl Layout {
    /// Total frame size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of structural elements, including the port socket.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// The element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn element(&self, index: usize) -> &ElementLayout {
        &self.elements[index]
    }

    /// All elements in index order.
    pub fn elements(&self) -> &[ElementLayout] {
        &self.elements
    }

    /// The port socket's fields.
    pub fn port_fields(&self) -> &[PortField] {
        &self.port_fields
    }

    /// The port field at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn port_field(&self, index: usize) -> &PortField {
        &self.port_fields[index]
    }

    /// Looks up a named element.
    pub fn find_element(&self, name: Ident) -> Option<usize> {
        self.elements.iter().position(|e| e.name == Some(name))
    }

    /// Looks up a named port field.
    pub fn find_port_field(&self, name: Ident) -> Option<usize> {
        self.port_fields.iter().position(|f| f.name == name)
    }

    /// Maps a byte offset to the index of the element containing it.
    ///
    /// Offsets past the end map to `element_count()`.
    pub fn element_containing_offset(&self, offset: usize) -> usize {
        self.elements
            .partition_point(|e| e.offset + e.size <= offset)
    }
}

/// Incrementally builds a packed [`Layout`].
///
/// Port fields must all be declared before the first element, since the
/// socket is laid out first.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    port_fields: Vec<(Ident, ValueType)>,
    elements: Vec<(Ident, ValueType)>,
}

impl LayoutBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a port field and returns its field index.
    pub fn port(&mut self, name: Ident, ty: ValueType) -> usize {
        self.port_fields.push((name, ty));
        self.port_fields.len() - 1
    }

    /// Declares a structural element and returns its element index.
    pub fn element(&mut self, name: Ident, ty: ValueType) -> usize {
        self.elements.push((name, ty));
        self.elements.len()
    }

    /// Declares a slot for a nested instance and returns its element index.
    pub fn instance(&mut self, name: Ident) -> usize {
        self.element(name, ValueType::Instance)
    }

    /// Returns `true` if an element with this name was declared.
    pub fn has_element(&self, name: Ident) -> bool {
        self.elements.iter().any(|(n, _)| *n == name)
    }

    /// Lays out the socket followed by the elements.
    pub fn build(&self) -> Layout {
        let mut port_fields = Vec::with_capacity(self.port_fields.len());
        let mut offset = 0;
        for (name, ty) in &self.port_fields {
            port_fields.push(PortField {
                name: *name,
                ty: ty.clone(),
                offset,
            });
            offset += ty.size();
        }
        let socket_size = offset;

        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.push(ElementLayout {
            name: None,
            ty: ValueType::Socket { size: socket_size },
            offset: 0,
            size: socket_size,
        });
        for (name, ty) in &self.elements {
            let size = ty.size();
            elements.push(ElementLayout {
                name: Some(*name),
                ty: ty.clone(),
                offset,
                size,
            });
            offset += size;
        }

        Layout {
            elements,
            port_fields,
            size: offset,
        }
    }
}
