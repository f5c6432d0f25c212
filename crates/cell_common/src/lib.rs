//! Shared foundational types used across the Cell simulator.
//!
//! This crate provides interned identifiers, the scaled fixed-point [`Time`]
//! type used for all simulated timestamps, and the internal-error result type.

#![warn(missing_docs)]

pub mod ident;
pub mod result;
pub mod time;

pub use ident::{Ident, Interner};
pub use result::{CellResult, InternalError};
pub use time::{ParseTimeError, Time, TimeUnit};
