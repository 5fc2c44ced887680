//! The entity contract consumed by datasources.

use std::collections::BTreeMap;
use std::fmt::Debug;

/// A record with a stable identity and mutable fields.
///
/// Identity comparison uses `PartialEq` on `Id`, so composite identities
/// (tuples, small structs) compare by value.
pub trait Entity: Clone + 'static {
    type Id: Clone + PartialEq + Debug + 'static;

    fn id(&self) -> Self::Id;

    /// Copy every mutable field of `other` into `self`.
    ///
    /// Identity and internal bookkeeping (validation state) are left alone,
    /// so `self` stays the same logical object.
    fn apply_update(&mut self, other: &Self);

    /// Record validation errors returned by the server for this entity.
    fn apply_server_validation_errors(&mut self, _errors: &BTreeMap<String, String>) {}
}

/// Index of the entity with the given identity, if present.
pub fn position_of<T: Entity>(items: &[T], id: &T::Id) -> Option<usize> {
    items.iter().position(|e| e.id() == *id)
}
