//! Sorted, duplicate-free entity window.

use std::cmp::Ordering;

use crate::datasource::{passes, FilterPredicate, SortComparator};
use crate::entity::{position_of, Entity};
use crate::error::{AppyError, AppyResult};

/// Entities kept in comparator order with unique identities.
pub struct SortedWindow<T: Entity> {
    items: Vec<T>,
    sort: SortComparator<T>,
    filter: Option<FilterPredicate<T>>,
}

impl<T: Entity> SortedWindow<T> {
    pub fn new(sort: SortComparator<T>, filter: Option<FilterPredicate<T>>) -> Self {
        SortedWindow {
            items: Vec::new(),
            sort,
            filter,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_sorted(&self, entities: &[T]) -> bool {
        entities
            .windows(2)
            .all(|pair| (self.sort)(&pair[0], &pair[1]) != Ordering::Greater)
    }

    /// Merge a page into the window.
    ///
    /// The page must itself be sorted; otherwise nothing is touched and
    /// `UnsortedPage` is returned. Returns whether the window changed.
    pub fn merge(&mut self, entities: Vec<T>) -> AppyResult<bool> {
        if !self.is_sorted(&entities) {
            return Err(AppyError::UnsortedPage);
        }

        let mut changed = false;
        for entity in entities {
            changed |= self.upsert(entity);
        }
        Ok(changed)
    }

    /// Add or update a single entity. Returns whether the window changed.
    pub fn upsert(&mut self, entity: T) -> bool {
        match position_of(&self.items, &entity.id()) {
            Some(index) => self.update_at(index, &entity),
            None => self.insert_sorted(entity),
        }
    }

    /// Remove by identity. Returns whether anything was removed.
    pub fn remove(&mut self, id: &T::Id) -> bool {
        match position_of(&self.items, id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn update_at(&mut self, index: usize, entity: &T) -> bool {
        // The merged entity may sort differently, so take it out and re-insert.
        let mut existing = self.items.remove(index);
        existing.apply_update(entity);
        self.insert_sorted(existing);
        true
    }

    fn insert_sorted(&mut self, entity: T) -> bool {
        if !passes(self.filter.as_ref(), &entity) {
            return false;
        }

        let index = self
            .items
            .partition_point(|e| (self.sort)(e, &entity) == Ordering::Less);
        self.items.insert(index, entity);
        true
    }
}
