//! Sorted datasource that grows page by page in both directions.
//!
//! The window starts with one forward page and can then be extended with
//! `load_next_page` / `load_previous_page`. Each direction has its own skip
//! cursor, its own end marker and at most one fetch in flight; requests made
//! while that fetch is outstanding are dropped, not queued. Live add/update/
//! delete notifications merge into the same window by identity and sort
//! order, so they can interleave freely with page completions.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::datasource::{Datasource, FilterPredicate, SortComparator, SortedWindow};
use crate::entity::Entity;
use crate::error::{AppyError, AppyResult};
use crate::notify::{Subscribers, Subscription};
use crate::task::InFlight;

/// Number of entities requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forwards,
    Backwards,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forwards => write!(f, "forwards"),
            Direction::Backwards => write!(f, "backwards"),
        }
    }
}

/// Remote page source.
///
/// Both directions return entities ordered from the cursor outward: forward
/// pages ascending, backward pages descending (nearest first).
pub trait PageLoader<T> {
    fn load_page(
        &self,
        direction: Direction,
        skip: usize,
        take: usize,
    ) -> LocalBoxFuture<'static, AppyResult<Vec<T>>>;
}

impl<T, F> PageLoader<T> for F
where
    F: Fn(Direction, usize, usize) -> LocalBoxFuture<'static, AppyResult<Vec<T>>>,
{
    fn load_page(
        &self,
        direction: Direction,
        skip: usize,
        take: usize,
    ) -> LocalBoxFuture<'static, AppyResult<Vec<T>>> {
        self(direction, skip, take)
    }
}

#[derive(Default)]
struct Cursor {
    skip: usize,
    reached_end: bool,
    in_flight: Option<InFlight>,
}

impl Cursor {
    fn cancel(&mut self) {
        if let Some(fetch) = self.in_flight.take() {
            fetch.cancel();
        }
    }
}

struct PageState<T: Entity> {
    window: SortedWindow<T>,
    forwards: Cursor,
    backwards: Cursor,
    is_first_loading: bool,
    disposed: bool,
    /// Bumped on every `load()` so completions of an older load are ignored.
    generation: u64,
}

impl<T: Entity> PageState<T> {
    fn cursor(&mut self, direction: Direction) -> &mut Cursor {
        match direction {
            Direction::Forwards => &mut self.forwards,
            Direction::Backwards => &mut self.backwards,
        }
    }

    fn cancel_all(&mut self) {
        self.forwards.cancel();
        self.backwards.cancel();
    }
}

pub struct PageableListDatasource<T: Entity> {
    loader: Rc<dyn PageLoader<T>>,
    page_size: usize,
    state: RefCell<PageState<T>>,
    subscribers: RefCell<Subscribers<Vec<T>>>,
    /// Woken whenever a fetch slot is released.
    settled: Notify,
    this: Weak<Self>,
}

impl<T: Entity> PageableListDatasource<T> {
    pub fn new(
        loader: Rc<dyn PageLoader<T>>,
        sort: SortComparator<T>,
        filter: Option<FilterPredicate<T>>,
    ) -> Rc<Self> {
        Self::with_page_size(loader, sort, filter, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        loader: Rc<dyn PageLoader<T>>,
        sort: SortComparator<T>,
        filter: Option<FilterPredicate<T>>,
        page_size: usize,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| PageableListDatasource {
            loader,
            page_size: page_size.max(1),
            state: RefCell::new(PageState {
                window: SortedWindow::new(sort, filter),
                forwards: Cursor::default(),
                backwards: Cursor::default(),
                is_first_loading: false,
                disposed: false,
                generation: 0,
            }),
            subscribers: RefCell::new(Subscribers::new()),
            settled: Notify::new(),
            this: this.clone(),
        })
    }

    /// Reset the window and fetch the first forward page.
    ///
    /// Until that page arrives, page navigation is ignored and new
    /// subscribers receive nothing. Must run inside a `LocalSet`.
    pub fn load(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                warn!("load() called on a disposed datasource");
                return;
            }

            state.cancel_all();
            state.window.clear();
            state.forwards = Cursor::default();
            state.backwards = Cursor::default();
            state.generation += 1;
            state.is_first_loading = true;
        }

        self.request_page(Direction::Forwards, true);
    }

    pub fn load_next_page(&self) {
        self.load_page(Direction::Forwards);
    }

    pub fn load_previous_page(&self) {
        self.load_page(Direction::Backwards);
    }

    fn load_page(&self, direction: Direction) {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed || state.is_first_loading {
                debug!(%direction, "page request ignored while datasource is not ready");
                return;
            }

            let cursor = state.cursor(direction);
            if cursor.reached_end {
                return;
            }
            if cursor.in_flight.is_some() {
                debug!(%direction, "page request ignored, fetch already in flight");
                return;
            }
        }

        self.request_page(direction, false);
    }

    fn request_page(&self, direction: Direction, force_notify: bool) {
        let (generation, skip) = {
            let mut state = self.state.borrow_mut();
            (state.generation, state.cursor(direction).skip)
        };

        debug!(%direction, skip, take = self.page_size, "requesting page");

        // No borrow is held here: the loader may query this datasource.
        let fetch = self.loader.load_page(direction, skip, self.page_size);
        let this = self.this.clone();
        let in_flight = InFlight::spawn(fetch, move |result| {
            if let Some(this) = this.upgrade() {
                this.complete_page(direction, generation, result, force_notify);
            }
        });

        let mut state = self.state.borrow_mut();
        if let Some(previous) = state.cursor(direction).in_flight.replace(in_flight) {
            previous.cancel();
        }
    }

    fn complete_page(
        &self,
        direction: Direction,
        generation: u64,
        result: AppyResult<Vec<T>>,
        force_notify: bool,
    ) {
        let outcome = {
            let mut state = self.state.borrow_mut();
            if state.disposed || state.generation != generation {
                return;
            }

            // The task is finishing on its own; just release the slot.
            state.cursor(direction).in_flight = None;

            result.and_then(|mut items| {
                if direction == Direction::Backwards {
                    items.reverse();
                }
                if !state.window.is_sorted(&items) {
                    return Err(AppyError::UnsortedPage);
                }

                if direction == Direction::Forwards {
                    state.is_first_loading = false;
                }

                let page_size = self.page_size;
                let cursor = state.cursor(direction);
                cursor.skip += items.len();
                if items.len() < page_size {
                    cursor.reached_end = true;
                }

                debug!(%direction, count = items.len(), reached_end = cursor.reached_end, "page received");
                Ok(items)
            })
        };

        match outcome.and_then(|items| self.add_with(items, force_notify)) {
            Ok(()) => {}
            Err(e) => {
                error!(%direction, "page load failed: {e}");
                self.subscribers.borrow_mut().error(e);
            }
        }
        self.settled.notify_waiters();
    }

    /// Resolves once neither direction has a fetch in flight.
    ///
    /// Pages that add nothing publish no snapshot, so this is the way to wait
    /// for a requested page rather than the subscription.
    pub async fn wait_idle(&self) {
        loop {
            let settled = self.settled.notified();
            if !self.is_loading_next() && !self.is_loading_previous() {
                return;
            }
            settled.await;
        }
    }

    /// Merge entities into the window, notifying when it changed or when
    /// `force_notify` is set.
    pub fn add_with(&self, entities: Vec<T>, force_notify: bool) -> AppyResult<()> {
        let changed = self.state.borrow_mut().window.merge(entities)?;
        if changed || force_notify {
            self.notify();
        }
        Ok(())
    }

    fn notify(&self) {
        let snapshot = {
            let state = self.state.borrow();
            if state.disposed {
                return;
            }
            state.window.items().to_vec()
        };
        self.subscribers.borrow_mut().next(snapshot);
    }

    /// Observe the window.
    ///
    /// Once the first page has arrived, the current snapshot is replayed
    /// immediately.
    pub fn subscribe(&self) -> Subscription<Vec<T>> {
        let state = self.state.borrow();
        if state.disposed {
            return Subscribers::closed_subscription();
        }

        let initial = (!state.is_first_loading).then(|| state.window.items().to_vec());
        self.subscribers.borrow_mut().subscribe_with(initial)
    }

    /// Cancel outstanding fetches and end every subscription.
    pub fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }

        debug!("disposing pageable datasource");
        state.disposed = true;
        state.cancel_all();
        self.subscribers.borrow_mut().clear();
        self.settled.notify_waiters();
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.state.borrow().window.items().to_vec()
    }

    pub fn is_loading_next(&self) -> bool {
        self.state.borrow().forwards.in_flight.is_some()
    }

    pub fn is_loading_previous(&self) -> bool {
        self.state.borrow().backwards.in_flight.is_some()
    }

    pub fn is_first_loading(&self) -> bool {
        self.state.borrow().is_first_loading
    }

    pub fn is_reached_end_forwards(&self) -> bool {
        self.state.borrow().forwards.reached_end
    }

    pub fn is_reached_end_backwards(&self) -> bool {
        self.state.borrow().backwards.reached_end
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }
}

impl<T: Entity> Datasource<T> for PageableListDatasource<T> {
    fn add(&self, entities: Vec<T>) -> AppyResult<()> {
        self.add_with(entities, false)
    }

    fn update(&self, entity: T) -> AppyResult<()> {
        let changed = self.state.borrow_mut().window.upsert(entity);
        if changed {
            self.notify();
        }
        Ok(())
    }

    fn delete(&self, id: &T::Id) -> AppyResult<()> {
        let removed = self.state.borrow_mut().window.remove(id);
        if removed {
            self.notify();
        }
        Ok(())
    }

    fn is_unsubscribed(&self) -> bool {
        self.is_disposed() || self.subscribers.borrow().is_unsubscribed()
    }
}

impl<T: Entity> Drop for PageableListDatasource<T> {
    fn drop(&mut self) {
        self.state.get_mut().cancel_all();
    }
}
