//! Things tracked by identity rather than by value.

/// Something whose identity outlives changes to its state.
///
/// A product stays the same product while its price or stock moves; lookups
/// and cart lines key on [`Entity::id`], never on field equality.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
