//! Sliding per-date data cache.
//!
//! The calendar shows `show_count` consecutive days starting at the current
//! date. Around them the cache keeps one extra screen before and after, so
//! that paging a day back or forth is instant. Moving the date only loads
//! dates that have no entry yet and drops entries that fall out of range.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use chrono::{Days, NaiveDate};
use futures::future::LocalBoxFuture;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::AppyResult;
use crate::notify::{Subscribers, Subscription};
use crate::task::InFlight;

/// Loads the data of one date.
pub trait DateLoader<T> {
    fn load(&self, date: NaiveDate) -> LocalBoxFuture<'static, AppyResult<T>>;
}

impl<T, F> DateLoader<T> for F
where
    F: Fn(NaiveDate) -> LocalBoxFuture<'static, AppyResult<T>>,
{
    fn load(&self, date: NaiveDate) -> LocalBoxFuture<'static, AppyResult<T>> {
        self(date)
    }
}

/// Cached data of one date. `data` is `None` until the load completes.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub date: NaiveDate,
    pub data: Option<T>,
    /// Whether the date is in the visible range.
    pub show: bool,
}

struct Slot<T> {
    entry: CacheEntry<T>,
    in_flight: Option<InFlight>,
}

impl<T> Slot<T> {
    fn cancel(&mut self) {
        if let Some(fetch) = self.in_flight.take() {
            fetch.cancel();
        }
    }
}

struct CacheState<T> {
    slots: BTreeMap<NaiveDate, Slot<T>>,
    show_count: u32,
    current: Option<NaiveDate>,
    disposed: bool,
}

pub struct DateSmartCaching<T: Clone + 'static> {
    loader: Rc<dyn DateLoader<T>>,
    state: RefCell<CacheState<T>>,
    loaded: RefCell<Subscribers<CacheEntry<T>>>,
    /// Woken whenever a load finishes, failed or not.
    settled: Notify,
    this: Weak<Self>,
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

impl<T: Clone + 'static> DateSmartCaching<T> {
    pub fn new(loader: Rc<dyn DateLoader<T>>, show_count: u32) -> Rc<Self> {
        Rc::new_cyclic(|this| DateSmartCaching {
            loader,
            state: RefCell::new(CacheState {
                slots: BTreeMap::new(),
                show_count: show_count.max(1),
                current: None,
                disposed: false,
            }),
            loaded: RefCell::new(Subscribers::new()),
            settled: Notify::new(),
            this: this.clone(),
        })
    }

    /// Move the cache to `date`.
    ///
    /// Keeps `[date - n, date + 2n)` where `n` is the show count, marks
    /// `[date, date + n)` as shown and starts loads for dates with no entry.
    /// Must run inside a `LocalSet`.
    pub fn load(&self, date: NaiveDate) {
        let missing = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }

            let n = i64::from(state.show_count);
            let keep_from = shift(date, -n);
            let keep_to = shift(date, 2 * n);
            let show_to = shift(date, n);
            state.current = Some(date);

            let before = state.slots.len();
            state.slots.retain(|d, slot| {
                let keep = *d >= keep_from && *d < keep_to;
                if !keep {
                    slot.cancel();
                }
                keep
            });
            let dropped = before - state.slots.len();

            let mut missing = Vec::new();
            let mut day = keep_from;
            while day < keep_to {
                let show = day >= date && day < show_to;
                match state.slots.get_mut(&day) {
                    Some(slot) => slot.entry.show = show,
                    None => missing.push((day, show)),
                }
                day = shift(day, 1);
            }

            debug!(%date, dropped, loading = missing.len(), "cache window moved");
            missing
        };

        for (day, show) in missing {
            self.start_load(day, show);
        }
        self.settled.notify_waiters();
    }

    fn start_load(&self, date: NaiveDate, show: bool) {
        let fetch = self.loader.load(date);
        let this = self.this.clone();
        let in_flight = InFlight::spawn(fetch, move |result| {
            if let Some(this) = this.upgrade() {
                this.complete(date, result);
            }
        });

        self.state.borrow_mut().slots.insert(
            date,
            Slot {
                entry: CacheEntry {
                    date,
                    data: None,
                    show,
                },
                in_flight: Some(in_flight),
            },
        );
    }

    fn complete(&self, date: NaiveDate, result: AppyResult<T>) {
        self.publish(date, result);
        self.settled.notify_waiters();
    }

    fn publish(&self, date: NaiveDate, result: AppyResult<T>) {
        let entry = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            let Some(slot) = state.slots.get_mut(&date) else {
                return;
            };
            slot.in_flight = None;

            match result {
                Ok(data) => {
                    slot.entry.data = Some(data);
                    slot.entry.clone()
                }
                Err(e) => {
                    warn!(%date, "failed to load date: {e}");
                    return;
                }
            }
        };

        self.loaded.borrow_mut().next(entry);
    }

    pub fn show_count(&self) -> u32 {
        self.state.borrow().show_count
    }

    /// Change how many days are shown, re-running `load` for the current
    /// date if it changed.
    pub fn set_show_count(&self, show_count: u32) {
        let current = {
            let mut state = self.state.borrow_mut();
            let show_count = show_count.max(1);
            if state.show_count == show_count {
                return;
            }
            state.show_count = show_count;
            state.current
        };

        if let Some(date) = current {
            self.load(date);
        }
    }

    /// Every cached entry, ordered by date.
    pub fn data(&self) -> Vec<CacheEntry<T>> {
        self.state
            .borrow()
            .slots
            .values()
            .map(|slot| slot.entry.clone())
            .collect()
    }

    /// Entries in the visible range, ordered by date.
    pub fn visible(&self) -> Vec<CacheEntry<T>> {
        self.data().into_iter().filter(|e| e.show).collect()
    }

    /// Entries published as their loads complete.
    pub fn on_data_loaded(&self) -> Subscription<CacheEntry<T>> {
        if self.state.borrow().disposed {
            return Subscribers::closed_subscription();
        }
        self.loaded.borrow_mut().subscribe()
    }

    /// Resolves once no visible date is loading.
    ///
    /// Failed loads publish nothing on `on_data_loaded` but still count as
    /// finished here.
    pub async fn wait_for_visible(&self) {
        loop {
            let settled = self.settled.notified();
            let loading = self
                .state
                .borrow()
                .slots
                .values()
                .any(|slot| slot.entry.show && slot.in_flight.is_some());
            if !loading {
                return;
            }
            settled.await;
        }
    }

    pub fn is_loading(&self, date: NaiveDate) -> bool {
        self.state
            .borrow()
            .slots
            .get(&date)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    /// Cancel outstanding loads and end every subscription.
    pub fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        state.disposed = true;
        for slot in state.slots.values_mut() {
            slot.cancel();
        }
        self.loaded.borrow_mut().clear();
        self.settled.notify_waiters();
    }
}

impl<T: Clone + 'static> Drop for DateSmartCaching<T> {
    fn drop(&mut self) {
        for slot in self.state.get_mut().slots.values_mut() {
            slot.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use futures::FutureExt;
    use tokio::sync::oneshot;
    use tokio::task::LocalSet;

    use super::*;
    use crate::error::AppyError;
    use crate::notify::Notification;

    type Reply = oneshot::Sender<AppyResult<String>>;

    #[derive(Default)]
    struct ManualLoader {
        requested: RefCell<Vec<NaiveDate>>,
        pending: RefCell<HashMap<NaiveDate, Reply>>,
    }

    impl ManualLoader {
        fn resolve(&self, date: NaiveDate, result: AppyResult<String>) {
            let reply = self.pending.borrow_mut().remove(&date).expect("date was not requested");
            let _ = reply.send(result);
        }

        fn requested(&self) -> Vec<NaiveDate> {
            let mut dates = self.requested.borrow().clone();
            dates.sort();
            dates
        }
    }

    impl DateLoader<String> for ManualLoader {
        fn load(&self, date: NaiveDate) -> LocalBoxFuture<'static, AppyResult<String>> {
            self.requested.borrow_mut().push(date);
            let (tx, rx) = oneshot::channel();
            self.pending.borrow_mut().insert(date, tx);
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(AppyError::Transport("request dropped".into())))
            }
            .boxed_local()
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn cache(show_count: u32) -> (Rc<ManualLoader>, Rc<DateSmartCaching<String>>) {
        let loader = Rc::new(ManualLoader::default());
        let cache = DateSmartCaching::<String>::new(loader.clone(), show_count);
        (loader, cache)
    }

    #[tokio::test]
    async fn load_fills_window_around_date() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(2);
                cache.load(day(10));

                assert_eq!(loader.requested(), (8..14).map(day).collect::<Vec<_>>());
                let shown: Vec<NaiveDate> = cache.visible().iter().map(|e| e.date).collect();
                assert_eq!(shown, vec![day(10), day(11)]);
            })
            .await;
    }

    #[tokio::test]
    async fn moving_one_day_only_loads_new_dates() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(1);
                cache.load(day(10));
                assert_eq!(loader.requested(), vec![day(9), day(10), day(11)]);

                cache.load(day(11));

                assert_eq!(loader.requested(), vec![day(9), day(10), day(11), day(12)]);
                let dates: Vec<NaiveDate> = cache.data().iter().map(|e| e.date).collect();
                assert_eq!(dates, vec![day(10), day(11), day(12)]);
                assert_eq!(cache.visible()[0].date, day(11));
            })
            .await;
    }

    #[tokio::test]
    async fn completed_loads_are_published() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(1);
                let mut loaded = cache.on_data_loaded();
                cache.load(day(10));

                loader.resolve(day(10), Ok("ten".into()));
                settle().await;

                match loaded.try_next() {
                    Some(Notification::Next(entry)) => {
                        assert_eq!(entry.date, day(10));
                        assert_eq!(entry.data.as_deref(), Some("ten"));
                        assert!(entry.show);
                    }
                    other => panic!("expected loaded entry, got {other:?}"),
                }
                assert!(!cache.is_loading(day(10)));
                assert!(cache.is_loading(day(11)));
            })
            .await;
    }

    #[tokio::test]
    async fn dropped_dates_ignore_late_results() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(1);
                cache.load(day(10));
                cache.load(day(20));

                loader.resolve(day(10), Ok("stale".into()));
                settle().await;

                assert!(cache.data().iter().all(|e| e.data.is_none()));
                assert_eq!(cache.data().len(), 3);
            })
            .await;
    }

    #[tokio::test]
    async fn waiting_for_visible_dates_outlasts_failures() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(1);
                cache.load(day(10));
                let waiting = tokio::task::spawn_local({
                    let cache = cache.clone();
                    async move { cache.wait_for_visible().await }
                });

                loader.resolve(day(9), Ok("nine".into()));
                settle().await;
                assert!(!waiting.is_finished());

                loader.resolve(day(10), Err(AppyError::Transport("offline".into())));
                settle().await;

                assert!(waiting.is_finished());
                assert!(cache.is_loading(day(11)));
            })
            .await;
    }

    #[tokio::test]
    async fn failed_load_leaves_entry_empty() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(1);
                let mut loaded = cache.on_data_loaded();
                cache.load(day(10));

                loader.resolve(day(10), Err(AppyError::Transport("offline".into())));
                settle().await;

                assert_eq!(loaded.try_next(), None);
                assert!(!cache.is_loading(day(10)));
                assert_eq!(cache.visible()[0].data, None);
            })
            .await;
    }

    #[tokio::test]
    async fn wider_show_count_reloads_current_date() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(1);
                cache.load(day(10));

                cache.set_show_count(3);

                assert_eq!(cache.show_count(), 3);
                assert_eq!(loader.requested().len(), 3 + 6);
                assert_eq!(cache.visible().len(), 3);
            })
            .await;
    }

    #[tokio::test]
    async fn dispose_ends_subscriptions() {
        LocalSet::new()
            .run_until(async {
                let (loader, cache) = cache(1);
                let mut loaded = cache.on_data_loaded();
                cache.load(day(10));

                cache.dispose();
                let _ = loader.pending.borrow_mut().remove(&day(10)).map(|tx| tx.send(Ok("late".into())));
                settle().await;

                assert!(loaded.next().await.is_none());
            })
            .await;
    }
}
