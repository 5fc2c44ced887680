//! Datasource tracking one entity by identity.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::error;

use crate::datasource::list::{Publish, WorkingSet};
use crate::datasource::{Datasource, FilterPredicate};
use crate::entity::Entity;
use crate::error::{AppyError, AppyResult};
use crate::notify::{Subscribers, Subscription};

struct SinglePublisher<T>(Subscribers<Option<T>>);

impl<T: Entity> Publish<T> for SinglePublisher<T> {
    fn publish(&mut self, data: &[T]) -> AppyResult<()> {
        match data {
            [] => self.0.next(None),
            [entity] => self.0.next(Some(entity.clone())),
            [first, ..] => {
                error!(id = ?first.id(), count = data.len(), "single datasource holds more than one entity");
                return Err(AppyError::DuplicateIdentity);
            }
        }
        Ok(())
    }

    fn fail(&mut self, error: AppyError) {
        self.0.error(error);
    }

    fn is_unsubscribed(&self) -> bool {
        self.0.is_unsubscribed()
    }
}

/// Mirror of a single remote entity, `None` while it is absent.
pub struct SingleDatasource<T: Entity> {
    set: RefCell<WorkingSet<T, SinglePublisher<T>>>,
}

impl<T: Entity> SingleDatasource<T> {
    /// Track the entity with identity `id`.
    pub fn new(id: T::Id) -> (Self, Subscription<Option<T>>) {
        let filter: FilterPredicate<T> = Rc::new(move |e: &T| e.id() == id);
        Self::with_filter(filter)
    }

    /// Track whichever entity satisfies `filter`. More than one match is a
    /// `DuplicateIdentity` error.
    pub fn with_filter(filter: FilterPredicate<T>) -> (Self, Subscription<Option<T>>) {
        let mut subscribers = Subscribers::new();
        let subscription = subscribers.subscribe();
        let datasource = SingleDatasource {
            set: RefCell::new(WorkingSet::new(Some(filter), SinglePublisher(subscribers))),
        };
        (datasource, subscription)
    }

    /// Mark the entity as absent (e.g. the remote answered "not found").
    pub fn empty(&self) -> AppyResult<()> {
        self.set.borrow_mut().empty()
    }

    pub fn fail(&self, error: AppyError) {
        self.set.borrow_mut().fail(error);
    }
}

impl<T: Entity> Datasource<T> for SingleDatasource<T> {
    fn add(&self, entities: Vec<T>) -> AppyResult<()> {
        self.set.borrow_mut().add(entities)
    }

    fn update(&self, entity: T) -> AppyResult<()> {
        self.set.borrow_mut().update(entity)
    }

    fn delete(&self, id: &T::Id) -> AppyResult<()> {
        self.set.borrow_mut().delete(id)
    }

    fn is_unsubscribed(&self) -> bool {
        self.set.borrow().is_unsubscribed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notification;

    #[derive(Debug, Clone, PartialEq)]
    struct Facility {
        id: i32,
        slot: i32,
        name: String,
    }

    impl Entity for Facility {
        type Id = i32;

        fn id(&self) -> i32 {
            self.id
        }

        fn apply_update(&mut self, other: &Self) {
            self.slot = other.slot;
            self.name = other.name.clone();
        }
    }

    fn facility(id: i32, name: &str) -> Facility {
        Facility {
            id,
            slot: 0,
            name: name.to_string(),
        }
    }

    #[test]
    fn publishes_the_tracked_entity() {
        let (ds, mut sub) = SingleDatasource::new(3);
        ds.add(vec![facility(3, "Salon")]).unwrap();

        assert_eq!(
            sub.try_next(),
            Some(Notification::Next(Some(facility(3, "Salon"))))
        );
    }

    #[test]
    fn other_identities_are_filtered_out() {
        let (ds, mut sub) = SingleDatasource::new(3);
        ds.add(vec![facility(3, "Salon")]).unwrap();
        sub.latest();

        ds.add(vec![facility(4, "Barber")]).unwrap();

        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn not_found_publishes_none() {
        let (ds, mut sub) = SingleDatasource::<Facility>::new(3);
        ds.empty().unwrap();

        assert_eq!(sub.try_next(), Some(Notification::Next(None)));
    }

    #[test]
    fn delete_publishes_none() {
        let (ds, mut sub) = SingleDatasource::new(3);
        ds.add(vec![facility(3, "Salon")]).unwrap();
        sub.latest();

        ds.delete(&3).unwrap();

        assert_eq!(sub.try_next(), Some(Notification::Next(None)));
    }

    #[test]
    fn two_matches_is_a_fatal_error() {
        let filter: FilterPredicate<Facility> = Rc::new(|f: &Facility| f.slot == 0);
        let (ds, _sub) = SingleDatasource::with_filter(filter);

        let result = ds.add(vec![facility(1, "Salon"), facility(2, "Barber")]);

        assert_eq!(result, Err(AppyError::DuplicateIdentity));
    }
}
