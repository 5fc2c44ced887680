//! Unordered working-set datasources.

use std::cell::RefCell;

use tracing::debug;

use crate::datasource::{passes, Datasource, FilterPredicate};
use crate::entity::{position_of, Entity};
use crate::error::{AppyError, AppyResult};
use crate::notify::{Subscribers, Subscription};

/// Where a working set publishes its contents after a change.
pub(crate) trait Publish<T> {
    fn publish(&mut self, data: &[T]) -> AppyResult<()>;

    fn fail(&mut self, error: AppyError);

    fn is_unsubscribed(&self) -> bool;
}

impl<T: Clone> Publish<T> for Subscribers<Vec<T>> {
    fn publish(&mut self, data: &[T]) -> AppyResult<()> {
        // Always a copy, never the backing vector.
        self.next(data.to_vec());
        Ok(())
    }

    fn fail(&mut self, error: AppyError) {
        self.error(error);
    }

    fn is_unsubscribed(&self) -> bool {
        Subscribers::is_unsubscribed(self)
    }
}

/// Shared add/update/delete bookkeeping of list and single datasources.
pub(crate) struct WorkingSet<T: Entity, P: Publish<T>> {
    data: Vec<T>,
    filter: Option<FilterPredicate<T>>,
    is_loaded: bool,
    publisher: P,
}

impl<T: Entity, P: Publish<T>> WorkingSet<T, P> {
    pub(crate) fn new(filter: Option<FilterPredicate<T>>, publisher: P) -> Self {
        WorkingSet {
            data: Vec::new(),
            filter,
            is_loaded: false,
            publisher,
        }
    }

    pub(crate) fn add(&mut self, entities: Vec<T>) -> AppyResult<()> {
        if !self.is_loaded && entities.is_empty() {
            self.is_loaded = true;
            return self.publisher.publish(&self.data);
        }

        self.is_loaded = true;

        let mut new_entities = Vec::new();
        for entity in entities {
            let known = position_of(&self.data, &entity.id()).is_some()
                || position_of(&new_entities, &entity.id()).is_some();
            if known {
                self.flush(&mut new_entities);
                self.update(entity)?;
            } else if passes(self.filter.as_ref(), &entity) {
                new_entities.push(entity);
            }
        }

        if new_entities.is_empty() {
            return Ok(());
        }

        self.flush(&mut new_entities);
        self.publisher.publish(&self.data)
    }

    /// Prepend pending new entities as one block.
    fn flush(&mut self, new_entities: &mut Vec<T>) {
        if !new_entities.is_empty() {
            self.data.splice(0..0, new_entities.drain(..));
        }
    }

    pub(crate) fn update(&mut self, entity: T) -> AppyResult<()> {
        if !self.is_loaded {
            return Ok(());
        }

        let Some(index) = position_of(&self.data, &entity.id()) else {
            return self.add(vec![entity]);
        };

        self.data[index].apply_update(&entity);

        if !passes(self.filter.as_ref(), &self.data[index]) {
            debug!(id = ?entity.id(), "updated entity no longer matches datasource filter");
            self.data.remove(index);
        }

        self.publisher.publish(&self.data)
    }

    pub(crate) fn delete(&mut self, id: &T::Id) -> AppyResult<()> {
        if !self.is_loaded {
            return Ok(());
        }

        let Some(index) = position_of(&self.data, id) else {
            return Ok(());
        };

        self.data.remove(index);
        self.publisher.publish(&self.data)
    }

    pub(crate) fn empty(&mut self) -> AppyResult<()> {
        self.is_loaded = true;
        self.data.clear();
        self.publisher.publish(&self.data)
    }

    pub(crate) fn fail(&mut self, error: AppyError) {
        self.publisher.fail(error);
    }

    pub(crate) fn is_unsubscribed(&self) -> bool {
        self.publisher.is_unsubscribed()
    }
}

/// Unordered mirror of a remote collection with a single subscriber.
pub struct ListDatasource<T: Entity> {
    set: RefCell<WorkingSet<T, Subscribers<Vec<T>>>>,
}

impl<T: Entity> ListDatasource<T> {
    /// Create the datasource together with the subscription it feeds.
    pub fn new(filter: Option<FilterPredicate<T>>) -> (Self, Subscription<Vec<T>>) {
        let mut subscribers = Subscribers::new();
        let subscription = subscribers.subscribe();
        let datasource = ListDatasource {
            set: RefCell::new(WorkingSet::new(filter, subscribers)),
        };
        (datasource, subscription)
    }

    pub fn empty(&self) -> AppyResult<()> {
        self.set.borrow_mut().empty()
    }

    /// Terminate the subscription with an error.
    pub fn fail(&self, error: AppyError) {
        self.set.borrow_mut().fail(error);
    }
}

impl<T: Entity> Datasource<T> for ListDatasource<T> {
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
    use std::rc::Rc;

    use super::*;
    use crate::notify::Notification;

    #[derive(Debug, Clone, PartialEq)]
    struct Client {
        id: i32,
        name: String,
        active: bool,
    }

    impl Entity for Client {
        type Id = i32;

        fn id(&self) -> i32 {
            self.id
        }

        fn apply_update(&mut self, other: &Self) {
            self.name = other.name.clone();
            self.active = other.active;
        }
    }

    fn client(id: i32, name: &str) -> Client {
        Client {
            id,
            name: name.to_string(),
            active: true,
        }
    }

    fn names(notification: Option<Notification<Vec<Client>>>) -> Vec<String> {
        match notification {
            Some(Notification::Next(clients)) => clients.into_iter().map(|c| c.name).collect(),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn empty_first_load_still_notifies() {
        let (ds, mut sub) = ListDatasource::<Client>::new(None);
        ds.add(vec![]).unwrap();

        assert_eq!(sub.try_next(), Some(Notification::Next(vec![])));
    }

    #[test]
    fn updates_before_first_load_are_ignored() {
        let (ds, mut sub) = ListDatasource::new(None);
        ds.update(client(1, "Ana")).unwrap();
        ds.delete(&1).unwrap();

        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn new_entities_are_prepended() {
        let (ds, mut sub) = ListDatasource::new(None);
        ds.add(vec![client(1, "Ana")]).unwrap();
        ds.add(vec![client(2, "Bo"), client(3, "Cy")]).unwrap();

        assert_eq!(names(sub.try_next()), vec!["Ana"]);
        assert_eq!(names(sub.try_next()), vec!["Bo", "Cy", "Ana"]);
    }

    #[test]
    fn add_of_known_identity_updates_in_place() {
        let (ds, mut sub) = ListDatasource::new(None);
        ds.add(vec![client(1, "Ana"), client(2, "Bo")]).unwrap();
        sub.latest();

        ds.add(vec![client(1, "Anna")]).unwrap();

        assert_eq!(names(sub.latest()), vec!["Anna", "Bo"]);
    }

    #[test]
    fn update_rejected_by_filter_removes_entity() {
        let filter: FilterPredicate<Client> = Rc::new(|c: &Client| c.active);
        let (ds, mut sub) = ListDatasource::new(Some(filter));
        ds.add(vec![client(1, "Ana"), client(2, "Bo")]).unwrap();
        sub.latest();

        let mut inactive = client(2, "Bo");
        inactive.active = false;
        ds.update(inactive).unwrap();

        assert_eq!(names(sub.latest()), vec!["Ana"]);
    }

    #[test]
    fn delete_of_unknown_id_is_silent() {
        let (ds, mut sub) = ListDatasource::new(None);
        ds.add(vec![client(1, "Ana")]).unwrap();
        sub.latest();

        ds.delete(&42).unwrap();

        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn dropping_subscription_marks_unsubscribed() {
        let (ds, sub) = ListDatasource::<Client>::new(None);
        assert!(!ds.is_unsubscribed());

        drop(sub);

        assert!(ds.is_unsubscribed());
    }
}
