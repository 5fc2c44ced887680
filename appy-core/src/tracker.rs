//! Fan-out of entity changes to every live datasource of one entity type.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::datasource::Datasource;
use crate::entity::Entity;
use crate::error::AppyResult;

/// Registry of datasources observing entities of type `T`.
///
/// Datasources whose subscribers have all gone away are pruned on the next
/// notification.
pub struct EntityTracker<T: Entity> {
    datasources: RefCell<Vec<Rc<dyn Datasource<T>>>>,
}

impl<T: Entity> Default for EntityTracker<T> {
    fn default() -> Self {
        EntityTracker {
            datasources: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Entity> EntityTracker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, datasource: Rc<dyn Datasource<T>>) {
        self.datasources.borrow_mut().push(datasource);
    }

    pub fn notify_added(&self, entities: &[T]) -> AppyResult<()> {
        debug!(count = entities.len(), "tracker: entities added");
        self.for_each_live(|ds| ds.add(entities.to_vec()))
    }

    pub fn notify_updated(&self, entity: &T) -> AppyResult<()> {
        debug!(id = ?entity.id(), "tracker: entity updated");
        self.for_each_live(|ds| ds.update(entity.clone()))
    }

    pub fn notify_deleted(&self, id: &T::Id) -> AppyResult<()> {
        debug!(?id, "tracker: entity deleted");
        self.for_each_live(|ds| ds.delete(id))
    }

    /// Number of registered datasources, including ones not yet pruned.
    pub fn len(&self) -> usize {
        self.datasources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prune unsubscribed datasources, then deliver to the rest.
    ///
    /// Every live datasource is notified even if an earlier one fails; the
    /// first failure is returned.
    fn for_each_live<F>(&self, mut deliver: F) -> AppyResult<()>
    where
        F: FnMut(&dyn Datasource<T>) -> AppyResult<()>,
    {
        // Snapshot first so a datasource may register another while notified.
        let live: Vec<Rc<dyn Datasource<T>>> = {
            let mut datasources = self.datasources.borrow_mut();
            let before = datasources.len();
            datasources.retain(|ds| !ds.is_unsubscribed());
            if datasources.len() < before {
                debug!(pruned = before - datasources.len(), "tracker: dropped unsubscribed datasources");
            }
            datasources.clone()
        };

        let mut first_error = None;
        for ds in live {
            if let Err(e) = deliver(ds.as_ref()) {
                warn!("tracker: datasource rejected notification: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
