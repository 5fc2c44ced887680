//! Remote entity API contract.
//!
//! One `EntityApi` per entity type (one controller on the backend). The
//! model service calls it and feeds the results into datasources and the
//! entity tracker.

use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::datasource::Direction;
use crate::entity::Entity;
use crate::error::AppyResult;

/// Query parameters forwarded to the backend as-is.
pub type Params = serde_json::Map<String, Value>;

/// CRUD calls against one backend collection.
///
/// Paged results are ordered outward from the cursor: ascending for
/// `Direction::Forwards`, descending for `Direction::Backwards`.
/// A missing entity is reported as `AppyError::NotFound`; rejected input as
/// `AppyError::Validation`.
pub trait EntityApi<T: Entity> {
    fn get_all(&self, params: &Params) -> LocalBoxFuture<'static, AppyResult<Vec<T>>>;

    fn get_list(
        &self,
        params: &Params,
        direction: Direction,
        skip: usize,
        take: usize,
    ) -> LocalBoxFuture<'static, AppyResult<Vec<T>>>;

    fn get(&self, id: &T::Id) -> LocalBoxFuture<'static, AppyResult<T>>;

    fn add_new(&self, entity: &T) -> LocalBoxFuture<'static, AppyResult<T>>;

    fn edit(&self, entity: &T) -> LocalBoxFuture<'static, AppyResult<T>>;

    fn delete(&self, id: &T::Id) -> LocalBoxFuture<'static, AppyResult<()>>;
}
