//! Subscriber-side notification list.
//!
//! The bus keeps no history; a UI (or the CLI) subscribes an `Inbox` to hold
//! what it has received and track read state. The inbox is bounded and drops
//! the oldest entries once full.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::alerts::bus::{AlertBus, Subscription};
use super::alerts::model::{Notification, NotificationId};

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct Inbox {
    /// Newest first
    entries: VecDeque<Notification>,
    capacity: usize,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Subscribes a shared inbox to `bus`.
    pub fn attach(inbox: &Arc<Mutex<Inbox>>, bus: &AlertBus) -> Subscription {
        let sink = Arc::clone(inbox);
        bus.subscribe(move |notification| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification.clone());
        })
    }

    pub fn push(&mut self, notification: Notification) {
        self.entries.push_front(notification);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.entries.front()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.is_read()).count()
    }

    /// Returns false if no notification has that id.
    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        match self.entries.iter_mut().find(|n| n.id() == id) {
            Some(notification) => {
                notification.mark_read();
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for notification in &mut self.entries {
            notification.mark_read();
        }
    }
}
