//! Element types and their byte encodings inside a signal frame.
//!
//! Scalars are stored little-endian at their element offset. A `Socket` is
//! the module's port record; an `Instance` slot marks where a nested module
//! instance lives and occupies no bytes of the parent's frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a structural element or port field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// A single byte, zero is false.
    Bool,
    /// A signed 64-bit integer.
    Int,
    /// An IEEE 754 double.
    Float,
    /// A port record of the given byte size.
    Socket {
        /// Total size of the port fields.
        size: usize,
    },
    /// A nested module instance.
    Instance,
}

impl ValueType {
    /// Number of bytes this type occupies in a frame.
    pub fn size(&self) -> usize {
        match self {
            ValueType::Bool => 1,
            ValueType::Int | ValueType::Float => 8,
            ValueType::Socket { size } => *size,
            ValueType::Instance => 0,
        }
    }

    /// Returns `true` for types a [`Value`] can hold.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ValueType::Bool | ValueType::Int | ValueType::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Socket { size } => write!(f, "socket[{size}]"),
            ValueType::Instance => write!(f, "instance"),
        }
    }
}

/// A scalar value read from or written to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
}

impl Value {
    /// The element type matching this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
        }
    }

    /// Writes the encoding into the front of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than the value's size.
    pub fn encode(&self, out: &mut [u8]) {
        match self {
            Value::Bool(b) => out[0] = u8::from(*b),
            Value::Int(v) => out[..8].copy_from_slice(&v.to_le_bytes()),
            Value::Float(v) => out[..8].copy_from_slice(&v.to_le_bytes()),
        }
    }

    /// Decodes a value of type `ty` from the front of `bytes`.
    ///
    /// Returns `None` for non-scalar types or short buffers.
    pub fn decode(ty: &ValueType, bytes: &[u8]) -> Option<Value> {
        match ty {
            ValueType::Bool => bytes.first().map(|b| Value::Bool(*b != 0)),
            ValueType::Int => word(bytes).map(|w| Value::Int(i64::from_le_bytes(w))),
            ValueType::Float => word(bytes).map(|w| Value::Float(f64::from_le_bytes(w))),
            ValueType::Socket { .. } | ValueType::Instance => None,
        }
    }

    /// Integer view. Booleans widen to 0/1; floats are rejected.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(_) => None,
        }
    }

    /// Boolean view. Integers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(v) => Some(*v != 0),
            Value::Float(_) => None,
        }
    }

    /// Float view. Integers convert.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Bool(_) => None,
        }
    }
}

fn word(bytes: &[u8]) -> Option<[u8; 8]> {
    bytes.get(..8).and_then(|s| s.try_into().ok())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
