//! Client-side mirrors of remote entity collections.
//!
//! Three flavours share the same notification contract:
//! - `ListDatasource`: unordered working set seeded by one fetch
//! - `SingleDatasource`: at most one entity, selected by identity
//! - `PageableListDatasource`: sorted window grown page by page in both
//!   directions

pub mod list;
pub mod pageable;
pub mod single;
pub mod sorted;

use std::cmp::Ordering;
use std::rc::Rc;

use crate::entity::Entity;
use crate::error::AppyResult;

pub use list::ListDatasource;
pub use pageable::{Direction, PageLoader, PageableListDatasource};
pub use single::SingleDatasource;
pub use sorted::SortedWindow;

/// Decides whether an entity belongs in a datasource.
pub type FilterPredicate<T> = Rc<dyn Fn(&T) -> bool>;

/// Total order used to keep a pageable window sorted.
pub type SortComparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// Receiver of entity change notifications from an `EntityTracker`.
pub trait Datasource<T: Entity> {
    fn add(&self, entities: Vec<T>) -> AppyResult<()>;

    fn update(&self, entity: T) -> AppyResult<()>;

    fn delete(&self, id: &T::Id) -> AppyResult<()>;

    /// True once nobody observes this datasource any more.
    fn is_unsubscribed(&self) -> bool;
}

pub(crate) fn passes<T>(filter: Option<&FilterPredicate<T>>, entity: &T) -> bool {
    filter.is_none_or(|f| f(entity))
}
