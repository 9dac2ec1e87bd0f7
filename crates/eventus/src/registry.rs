//! Type registry: event type to priority-ordered subscriber bucket.
//!
//! Buckets are copy-on-write. A publish takes a cheap snapshot of the bucket
//! (one `Arc` clone) and invokes subscribers from it, so handlers may
//! subscribe or unsubscribe reentrantly without invalidating the iteration.
//! Sorting happens on insertion so that publishing never has to.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::key::EventKey;
use crate::status::Status;
use crate::subscriber::{Subscriber, SubscriberId};

/// Immutable view of one bucket, in dispatch order.
pub(crate) type Bucket = Arc<Vec<Subscriber>>;

#[derive(Debug, Default)]
pub(crate) struct Registry {
    buckets: HashMap<EventKey, Bucket>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber and restore priority order.
    ///
    /// The sort is stable, so equal priorities keep their insertion order.
    pub(crate) fn insert(&mut self, key: EventKey, subscriber: Subscriber) {
        let bucket = Arc::make_mut(self.buckets.entry(key).or_default());
        bucket.push(subscriber);
        bucket.sort_by_key(|s| Reverse(s.priority));
    }

    /// Remove one subscriber from one type's bucket.
    ///
    /// The removed subscriber is handed back so the caller can drop it once
    /// no registry borrow is held; its callback may own values whose
    /// destructors call back into the bus.
    pub(crate) fn remove(&mut self, key: EventKey, id: SubscriberId) -> Result<Subscriber, Status> {
        let Some(bucket) = self.buckets.get_mut(&key) else {
            return Err(Status::EventTypeNotRegistered);
        };
        let Some(pos) = bucket.iter().position(|s| s.id == id) else {
            return Err(Status::NoSubscriberWithId);
        };
        Ok(Arc::make_mut(bucket).remove(pos))
    }

    /// Remove a subscriber by id alone, scanning every bucket.
    pub(crate) fn remove_id(&mut self, id: SubscriberId) -> Option<(EventKey, Subscriber)> {
        self.buckets.iter_mut().find_map(|(key, bucket)| {
            let pos = bucket.iter().position(|s| s.id == id)?;
            Some((*key, Arc::make_mut(bucket).remove(pos)))
        })
    }

    /// Drop a whole bucket, handing it back.
    pub(crate) fn remove_event(&mut self, key: EventKey) -> Option<Bucket> {
        self.buckets.remove(&key)
    }

    /// Empty the registry, handing back everything it held.
    pub(crate) fn take_all(&mut self) -> HashMap<EventKey, Bucket> {
        std::mem::take(&mut self.buckets)
    }

    /// Snapshot of a bucket in dispatch order.
    pub(crate) fn bucket(&self, key: EventKey) -> Option<Bucket> {
        self.buckets.get(&key).map(Arc::clone)
    }

    /// Drop every empty bucket, returning the keys that were removed.
    pub(crate) fn collect_garbage(&mut self) -> Vec<EventKey> {
        let empty: Vec<EventKey> = self
            .buckets
            .iter()
            .filter(|(_, bucket)| bucket.is_empty())
            .map(|(key, _)| *key)
            .collect();
        for key in &empty {
            self.buckets.remove(key);
        }
        empty
    }

    pub(crate) fn contains(&self, key: EventKey) -> bool {
        self.buckets.contains_key(&key)
    }

    /// Whether `id` is still subscribed to `key`.
    #[cfg(feature = "threading")]
    pub(crate) fn has_subscriber(&self, key: EventKey, id: SubscriberId) -> bool {
        self.buckets
            .get(&key)
            .is_some_and(|b| b.iter().any(|s| s.id == id))
    }

    /// Number of subscribers for one event type.
    pub(crate) fn count(&self, key: EventKey) -> usize {
        self.buckets.get(&key).map_or(0, |b| b.len())
    }

    /// Number of registered event types, empty buckets included.
    pub(crate) fn event_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of subscribers across all event types.
    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(|b| b.len()).sum()
    }
}
