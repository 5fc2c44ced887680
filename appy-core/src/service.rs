//! Per-entity model service.
//!
//! Wires an [`EntityApi`] to an [`EntityTracker`]: reads hand out
//! datasources registered with the tracker, writes go to the API and are
//! then broadcast to every live datasource of the same entity type.

use std::rc::Rc;

use tracing::{debug, error};

use crate::api::{EntityApi, Params};
use crate::datasource::pageable::DEFAULT_PAGE_SIZE;
use crate::datasource::{
    Datasource, Direction, FilterPredicate, ListDatasource, PageLoader, PageableListDatasource,
    SingleDatasource, SortComparator,
};
use crate::entity::Entity;
use crate::error::{AppyError, AppyResult};
use crate::notify::Subscription;
use crate::tracker::EntityTracker;

pub struct ModelService<T: Entity, A: EntityApi<T>> {
    api: Rc<A>,
    tracker: EntityTracker<T>,
    page_size: usize,
}

impl<T: Entity, A: EntityApi<T> + 'static> ModelService<T, A> {
    pub fn new(api: A) -> Self {
        ModelService {
            api: Rc::new(api),
            tracker: EntityTracker::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used by datasources from `get_list_advanced`.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tracker(&self) -> &EntityTracker<T> {
        &self.tracker
    }

    /// A tracked list seeded with `initial` instead of a fetch.
    pub fn create_datasource(
        &self,
        initial: Vec<T>,
        filter: Option<FilterPredicate<T>>,
    ) -> AppyResult<Subscription<Vec<T>>> {
        let (datasource, subscription) = ListDatasource::new(filter);
        let datasource = Rc::new(datasource);
        self.tracker.register(datasource.clone());

        datasource.add(initial)?;
        Ok(subscription)
    }

    pub fn get_all(&self) -> Subscription<Vec<T>> {
        self.get_all_advanced(Params::new(), None)
    }

    /// A tracked list seeded by one `get_all` call.
    ///
    /// A failed fetch ends the subscription with the error. Must run inside
    /// a `LocalSet`.
    pub fn get_all_advanced(
        &self,
        params: Params,
        filter: Option<FilterPredicate<T>>,
    ) -> Subscription<Vec<T>> {
        let (datasource, subscription) = ListDatasource::new(filter);
        let datasource = Rc::new(datasource);
        self.tracker.register(datasource.clone());

        let fetch = self.api.get_all(&params);
        tokio::task::spawn_local(async move {
            let outcome = match fetch.await {
                Ok(entities) => datasource.add(entities),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                error!("get_all failed: {e}");
                datasource.fail(e);
            }
        });

        subscription
    }

    /// A tracked, already loading pageable list.
    ///
    /// Every page request carries `params` plus direction, skip and take.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`, since the first
    /// page is fetched right away.
    pub fn get_list_advanced(
        &self,
        params: Params,
        sort: SortComparator<T>,
        filter: Option<FilterPredicate<T>>,
    ) -> Rc<PageableListDatasource<T>> {
        let api = self.api.clone();
        let loader: Rc<dyn PageLoader<T>> =
            Rc::new(move |direction: Direction, skip: usize, take: usize| {
                api.get_list(&params, direction, skip, take)
            });

        let datasource = PageableListDatasource::with_page_size(loader, sort, filter, self.page_size);
        self.tracker.register(datasource.clone());
        datasource.load();

        datasource
    }

    /// Save changes to an existing entity and broadcast the stored version.
    ///
    /// Server validation errors are recorded on `entity` before the error is
    /// returned.
    pub async fn save(&self, entity: &mut T) -> AppyResult<T> {
        match self.api.edit(entity).await {
            Ok(saved) => {
                debug!(id = ?saved.id(), "entity saved");
                self.tracker.notify_updated(&saved)?;
                Ok(saved)
            }
            Err(AppyError::Validation(errors)) => {
                entity.apply_server_validation_errors(&errors);
                Err(AppyError::Validation(errors))
            }
            Err(e) => Err(e),
        }
    }

    /// Create an entity and broadcast the stored version.
    pub async fn add_new(&self, entity: &mut T) -> AppyResult<T> {
        match self.api.add_new(entity).await {
            Ok(created) => {
                debug!(id = ?created.id(), "entity created");
                self.tracker.notify_added(std::slice::from_ref(&created))?;
                Ok(created)
            }
            Err(AppyError::Validation(errors)) => {
                entity.apply_server_validation_errors(&errors);
                Err(AppyError::Validation(errors))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, id: &T::Id) -> AppyResult<()> {
        self.api.delete(id).await?;
        debug!(?id, "entity deleted");
        self.tracker.notify_deleted(id)
    }

    /// One-shot fetch, not tracked.
    pub async fn get(&self, id: &T::Id) -> AppyResult<T> {
        self.api.get(id).await
    }

    /// A tracked single-entity view. A missing entity publishes `None`.
    ///
    /// Must run inside a `LocalSet`.
    pub fn get_with_datasource(&self, id: T::Id) -> Subscription<Option<T>> {
        let fetch = self.api.get(&id);
        let (datasource, subscription) = SingleDatasource::new(id);
        let datasource = Rc::new(datasource);
        self.tracker.register(datasource.clone());

        tokio::task::spawn_local(async move {
            let outcome = match fetch.await {
                Ok(entity) => datasource.add(vec![entity]),
                Err(AppyError::NotFound(_)) => datasource.empty(),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                error!("get failed: {e}");
                datasource.fail(e);
            }
        });

        subscription
    }
}
