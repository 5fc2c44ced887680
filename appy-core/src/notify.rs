//! Subscriber registry and subscription handles.
//!
//! A `Subscribers<V>` is the push side: it fans a value out to every live
//! subscription. A `Subscription<V>` is the pull side: the view layer reads
//! `Notification`s from it and drops (or `unsubscribe`s) it when done.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::AppyError;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification<V> {
    /// A fresh snapshot of the observed value.
    Next(V),
    /// Terminal failure. Nothing follows it.
    Error(AppyError),
}

impl<V> Notification<V> {
    pub fn into_value(self) -> Option<V> {
        match self {
            Notification::Next(value) => Some(value),
            Notification::Error(_) => None,
        }
    }
}

/// Receiving end of a datasource or cache.
///
/// The stream ends (`next` returns `None`) when the source is disposed or
/// after a terminal error.
#[derive(Debug)]
pub struct Subscription<V> {
    rx: UnboundedReceiver<Notification<V>>,
}

impl<V> Subscription<V> {
    /// Wait for the next notification.
    pub async fn next(&mut self) -> Option<Notification<V>> {
        self.rx.recv().await
    }

    /// Take the next notification if one is already queued.
    pub fn try_next(&mut self) -> Option<Notification<V>> {
        self.rx.try_recv().ok()
    }

    /// Drain everything queued and return the most recent notification.
    pub fn latest(&mut self) -> Option<Notification<V>> {
        let mut latest = None;
        while let Ok(notification) = self.rx.try_recv() {
            latest = Some(notification);
        }
        latest
    }

    /// Stop receiving. The source prunes this subscription on its next push.
    pub fn unsubscribe(&mut self) {
        self.rx.close();
    }

    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }
}

/// Push side: an explicit registry of subscriber channels.
#[derive(Debug)]
pub struct Subscribers<V> {
    senders: Vec<UnboundedSender<Notification<V>>>,
}

impl<V> Default for Subscribers<V> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<V: Clone> Subscribers<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription<V> {
        self.subscribe_with(None)
    }

    /// Register a subscriber, replaying `initial` to it straight away.
    pub fn subscribe_with(&mut self, initial: Option<V>) -> Subscription<V> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(value) = initial {
            let _ = tx.send(Notification::Next(value));
        }
        self.senders.push(tx);
        Subscription { rx }
    }

    /// A subscription whose stream has already ended.
    pub fn closed_subscription() -> Subscription<V> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Subscription { rx }
    }

    /// Send `value` to every live subscriber, pruning closed ones.
    pub fn next(&mut self, value: V) {
        self.senders.retain(|tx| !tx.is_closed());
        for tx in &self.senders {
            let _ = tx.send(Notification::Next(value.clone()));
        }
    }

    /// Send a terminal error to every live subscriber and end their streams.
    pub fn error(&mut self, error: AppyError) {
        for tx in self.senders.drain(..) {
            if !tx.is_closed() {
                let _ = tx.send(Notification::Error(error.clone()));
            }
        }
    }

    /// End every subscriber stream.
    pub fn clear(&mut self) {
        self.senders.clear();
    }

    /// True when nobody is listening (no subscribers, or all closed).
    pub fn is_unsubscribed(&self) -> bool {
        self.senders.iter().all(|tx| tx.is_closed())
    }

    pub fn len(&self) -> usize {
        self.senders.iter().filter(|tx| !tx.is_closed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
