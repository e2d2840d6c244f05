//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two instances holding the same values are
/// interchangeable. `Money` and cart snapshots are value objects; a product in
/// the stock snapshot is an entity (it is tracked by its `ProductId` while its
/// quantity changes).
///
/// To "modify" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
