//! Entity trait: identity that survives re-reads.

/// Entity marker + minimal interface.
///
/// Two snapshots of the same backend row compare equal by id even when their
/// quantities differ, which is how views match a fresh read to a rendered row.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// True when both values refer to the same backend row.
    fn same_entity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
