use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier handed out by entity stores.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Handle types that wrap an [`Id`] so traces and graphs cannot be mixed up.
pub trait EntityId: Copy + Eq + core::hash::Hash + fmt::Debug {
    fn from_id(id: Id) -> Self;
    fn id(self) -> Id;
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(Id);

        impl $name {
            pub fn from_index(index: u32) -> Self {
                Self(Id::from_index(index))
            }

            pub fn index(self) -> u32 {
                self.0.index()
            }
        }

        impl EntityId for $name {
            fn from_id(id: Id) -> Self {
                Self(id)
            }

            fn id(self) -> Id {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.index())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }
    };
}

typed_id!(
    /// Handle of a trace in the trace store.
    TraceId
);
typed_id!(
    /// Handle of a graph in the graph store.
    GraphId
);
typed_id!(
    /// Handle of a live change-bus subscription.
    SubscriptionId
);

/// Monotonic handle allocator. Handles are never reused, so a stale handle
/// can only ever resolve to "not found".
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: u32,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next<I: EntityId>(&mut self) -> I {
        let id = Id::from_index(self.next);
        self.next = self.next.saturating_add(1);
        I::from_id(id)
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<TraceId>(),
            core::mem::size_of::<Option<TraceId>>()
        );
    }

    #[test]
    fn sequence_never_reuses() {
        let mut seq = IdSequence::new();
        let a: TraceId = seq.next();
        let b: TraceId = seq.next();
        let c: GraphId = seq.next();
        assert_ne!(a, b);
        assert_eq!(c.index(), 2);
        assert_eq!(seq.issued(), 3);
    }

    #[test]
    fn typed_debug_names_the_kind() {
        assert_eq!(format!("{:?}", GraphId::from_index(4)), "GraphId(4)");
        assert_eq!(format!("{}", TraceId::from_index(4)), "4");
    }
}
