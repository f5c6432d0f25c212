//! Opaque ID newtypes for IR entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Ord`, `Hash` and
//! `Serialize`/`Deserialize`. The derived ordering is the deterministic total
//! order the simulator uses when iterating run lists.

/// Declares a `u32` ID newtype usable as an [`Arena`](crate::arena::Arena) key.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl $crate::arena::ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a module definition in the design.
    ModuleId
);

define_id!(
    /// Opaque, copyable ID for a process within its module definition.
    ///
    /// This is the process identity: stable for the lifetime of the design
    /// and usable as a set/map key.
    ProcessId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn id_roundtrip() {
        let id = ProcessId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn ordering_follows_raw_index() {
        let set: BTreeSet<ProcessId> = [3, 1, 2].into_iter().map(ProcessId::from_raw).collect();
        let order: Vec<u32> = set.into_iter().map(ProcessId::as_raw).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn serde_roundtrip() {
        let id = ModuleId::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
