//! The event bus: subscription management and dispatch.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use crate::config::BusConfig;
use crate::key::EventKey;
use crate::log::{LogLevel, LogRecord, LogSink, TracingSink};
use crate::multi::{EventSet, EventTypes};
use crate::owned::OwnedSubscription;
#[cfg(feature = "threading")]
use crate::pool::WorkerPool;
use crate::registry::Registry;
use crate::status::Status;
use crate::subscriber::{EventHandler, SharedHandler, Subscriber, SubscriberId, erase};
use crate::sync::{BusLock, ThreadBound};

struct State {
    registry: Registry,
    logger: Option<Arc<dyn LogSink>>,
}

struct BusInner {
    // Declared first so workers are stopped before subscriber state is torn down.
    #[cfg(feature = "threading")]
    pool: WorkerPool,
    state: BusLock<State>,
    next_id: AtomicU64,
    gc: bool,
}

/// In-process publish/subscribe bus keyed by event type.
///
/// Subscribers register a callback for one event type with a priority.
/// [`Bus::publish`] invokes them on the calling thread in descending priority
/// order (ties in subscription order) and stops at the first callback that
/// returns `false`. [`Bus::publish_threaded`] and [`Bus::publish_async`] hand
/// the work to the bus's worker pool instead.
///
/// `Bus` is a handle: clones share the same registry and worker pool, and the
/// pool shuts down when the last handle is dropped.
///
/// **WARNING:** a callback that captures a `Bus` clone (or an
/// [`OwnedSubscription`]) keeps the bus alive through an `Arc` cycle. Publish
/// from inside a callback through the handle you already hold, or use a
/// separate channel.
///
/// # Example
///
/// ```rust
/// use eventus::{Bus, Status};
///
/// struct Deposit {
///     amount: u64,
/// }
///
/// let bus = Bus::new();
/// bus.subscribe(|d: &mut Deposit| {
///     d.amount *= 2;
///     true
/// });
///
/// assert_eq!(bus.publish(Deposit { amount: 21 }), Status::Ok);
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

/// Non-owning handle used by callbacks and queued tasks that refer back to
/// their bus.
#[derive(Clone)]
pub(crate) struct WeakBus(Weak<BusInner>);

impl WeakBus {
    pub(crate) fn upgrade(&self) -> Option<Bus> {
        self.0.upgrade().map(|inner| Bus { inner })
    }
}

/// Unsubscribes a fired `once` subscriber when dropped, including when its
/// callback unwinds.
struct OnceRemoval<'a> {
    bus: &'a WeakBus,
    key: EventKey,
    id: Option<SubscriberId>,
}

impl Drop for OnceRemoval<'_> {
    fn drop(&mut self) {
        if let (Some(bus), Some(id)) = (self.bus.upgrade(), self.id) {
            let _ = bus.unsubscribe_key(self.key, id);
        }
    }
}

impl Bus {
    /// Create a bus with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a bus with an explicit worker pool size.
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self::with_config(BusConfig::default().with_workers(workers))
    }

    /// Create a bus from a configuration.
    ///
    /// A `workers` value of zero is treated as one.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        let logger: Option<Arc<dyn LogSink>> = if config.debug_log {
            Some(Arc::new(TracingSink))
        } else {
            None
        };

        #[cfg(feature = "threading")]
        let pool = WorkerPool::new(config.resolved_workers().max(1));

        Self {
            inner: Arc::new(BusInner {
                #[cfg(feature = "threading")]
                pool,
                state: BusLock::new(State {
                    registry: Registry::new(),
                    logger,
                }),
                next_id: AtomicU64::new(0),
                gc: config.gc,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakBus {
        WeakBus(Arc::downgrade(&self.inner))
    }

    // ---------------------------------------------------------------------
    // Logging
    // ---------------------------------------------------------------------

    /// Install a sink for the bus's debug records, replacing any previous one.
    pub fn set_logger<S: LogSink + 'static>(&self, sink: S) {
        let guard = self.inner.state.lock();
        guard.borrow_mut().logger = Some(Arc::new(sink));
    }

    /// Remove the debug sink.
    pub fn clear_logger(&self) {
        let guard = self.inner.state.lock();
        let previous = guard.borrow_mut().logger.take();
        drop(previous);
    }

    fn log(&self, record: LogRecord) {
        let guard = self.inner.state.lock();
        let sink = guard.borrow().logger.clone();
        if let Some(sink) = sink {
            sink.log(&record);
        }
    }

    // ---------------------------------------------------------------------
    // Subscription
    // ---------------------------------------------------------------------

    /// Subscribe a callback to events of type `E` with priority 0.
    pub fn subscribe<E, F>(&self, callback: F) -> SubscriberId
    where
        E: 'static,
        F: Fn(&mut E) -> bool + ThreadBound + 'static,
    {
        self.subscribe_with_priority(callback, 0)
    }

    /// Subscribe a callback to events of type `E`.
    ///
    /// Higher priorities are invoked first; equal priorities keep
    /// subscription order.
    pub fn subscribe_with_priority<E, F>(&self, callback: F, priority: i32) -> SubscriberId
    where
        E: 'static,
        F: Fn(&mut E) -> bool + ThreadBound + 'static,
    {
        self.subscribe_handler::<E, F>(callback, priority)
    }

    /// Subscribe an [`EventHandler`] implementation to events of type `E`.
    pub fn subscribe_handler<E, H>(&self, handler: H, priority: i32) -> SubscriberId
    where
        E: 'static,
        H: EventHandler<E>,
    {
        self.insert(
            EventKey::of::<E>(),
            priority,
            erase::<E, H>(handler),
            "subscribed {id} to {event}",
        )
    }

    /// Subscribe one handler to every event type in the tuple `T`.
    ///
    /// Returns one id per event type, in tuple order.
    ///
    /// ```rust
    /// use eventus::{Bus, EventHandler};
    ///
    /// struct Opened;
    /// struct Closed;
    ///
    /// #[derive(Clone)]
    /// struct Audit;
    ///
    /// impl EventHandler<Opened> for Audit {
    ///     fn handle(&self, _: &mut Opened) -> bool { true }
    /// }
    /// impl EventHandler<Closed> for Audit {
    ///     fn handle(&self, _: &mut Closed) -> bool { true }
    /// }
    ///
    /// let bus = Bus::new();
    /// let ids = bus.subscribe_multi::<(Opened, Closed), _>(Audit);
    /// assert_eq!(ids.len(), 2);
    /// ```
    pub fn subscribe_multi<T, H>(&self, handler: H) -> Vec<SubscriberId>
    where
        T: EventTypes<H>,
    {
        T::subscribe_each(self, handler, 0)
    }

    /// [`Bus::subscribe_multi`] with an explicit priority.
    pub fn subscribe_multi_with_priority<T, H>(&self, handler: H, priority: i32) -> Vec<SubscriberId>
    where
        T: EventTypes<H>,
    {
        T::subscribe_each(self, handler, priority)
    }

    /// Subscribe a callback that is invoked at most once.
    ///
    /// After its first invocation the subscriber removes itself, whatever the
    /// callback returned; the returned value still steers propagation.
    pub fn once<E, F>(&self, callback: F) -> SubscriberId
    where
        E: 'static,
        F: Fn(&mut E) -> bool + ThreadBound + 'static,
    {
        self.once_with_priority(callback, 0)
    }

    /// [`Bus::once`] with an explicit priority.
    pub fn once_with_priority<E, F>(&self, callback: F, priority: i32) -> SubscriberId
    where
        E: 'static,
        F: Fn(&mut E) -> bool + ThreadBound + 'static,
    {
        let slot: Arc<OnceLock<SubscriberId>> = Arc::new(OnceLock::new());
        let bound = Arc::clone(&slot);
        let fired = AtomicBool::new(false);
        let bus = self.downgrade();

        let wrapper = move |event: &mut E| -> bool {
            if fired.swap(true, Ordering::AcqRel) {
                return true;
            }
            let _removal = OnceRemoval {
                bus: &bus,
                key: EventKey::of::<E>(),
                id: bound.get().copied(),
            };
            callback(event)
        };

        // Register, then bind the id, inside one critical section so no
        // publish can observe the wrapper before it knows its own id.
        let _guard = self.inner.state.lock();
        let id = self.insert(
            EventKey::of::<E>(),
            priority,
            erase::<E, _>(wrapper),
            "subscribed {id} to {event} (once)",
        );
        let _ = slot.set(id);
        id
    }

    fn insert(
        &self,
        key: EventKey,
        priority: i32,
        handler: SharedHandler,
        message: &'static str,
    ) -> SubscriberId {
        let guard = self.inner.state.lock();
        let id = SubscriberId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        guard
            .borrow_mut()
            .registry
            .insert(key, Subscriber::new(id, priority, handler));

        self.log(
            LogRecord::new(LogLevel::Debug, message)
                .with_event(key)
                .with_id(id),
        );
        self.collect_garbage();
        id
    }

    // ---------------------------------------------------------------------
    // Unsubscription
    // ---------------------------------------------------------------------

    /// Remove the subscriber `id` from event type `E`.
    pub fn unsubscribe<E: 'static>(&self, id: SubscriberId) -> Status {
        self.unsubscribe_key(EventKey::of::<E>(), id)
    }

    pub(crate) fn unsubscribe_key(&self, key: EventKey, id: SubscriberId) -> Status {
        let guard = self.inner.state.lock();
        let removed = guard.borrow_mut().registry.remove(key, id);

        match removed {
            Ok(subscriber) => {
                drop(subscriber);
                self.log(
                    LogRecord::new(LogLevel::Debug, "unsubscribed {id} from {event}")
                        .with_event(key)
                        .with_id(id),
                );
                self.collect_garbage();
                Status::Ok
            },
            Err(status) => {
                let message = if status == Status::EventTypeNotRegistered {
                    "unsubscribe: {event} is not registered"
                } else {
                    "unsubscribe: no subscriber {id} for {event}"
                };
                self.log(
                    LogRecord::new(LogLevel::Warning, message)
                        .with_event(key)
                        .with_id(id),
                );
                status
            },
        }
    }

    /// Remove the subscriber `id` from whichever event type it belongs to.
    ///
    /// This scans every bucket; prefer [`Bus::unsubscribe`] on hot paths.
    pub fn unsubscribe_id(&self, id: SubscriberId) -> Status {
        let guard = self.inner.state.lock();
        let removed = guard.borrow_mut().registry.remove_id(id);

        let Some((key, subscriber)) = removed else {
            self.log(
                LogRecord::new(LogLevel::Warning, "unsubscribe: no subscriber with id {id}")
                    .with_id(id),
            );
            return Status::NoSubscriberWithId;
        };

        drop(subscriber);
        self.log(
            LogRecord::new(LogLevel::Debug, "unsubscribed {id} from {event}")
                .with_event(key)
                .with_id(id),
        );
        self.collect_garbage();
        Status::Ok
    }

    /// Remove every subscriber of event type `E`.
    pub fn unsubscribe_event<E: 'static>(&self) -> Status {
        let key = EventKey::of::<E>();
        let guard = self.inner.state.lock();
        let removed = guard.borrow_mut().registry.remove_event(key);

        if let Some(bucket) = removed {
            drop(bucket);
            self.log(
                LogRecord::new(LogLevel::Debug, "unsubscribed all subscribers from {event}")
                    .with_event(key),
            );
            Status::Ok
        } else {
            self.log(
                LogRecord::new(LogLevel::Warning, "unsubscribe_event: {event} is not registered")
                    .with_event(key),
            );
            Status::EventTypeNotRegistered
        }
    }

    /// Remove every subscriber of every event type.
    pub fn unsubscribe_all(&self) -> Status {
        let guard = self.inner.state.lock();
        let removed = guard.borrow_mut().registry.take_all();
        drop(removed);
        self.log(LogRecord::new(LogLevel::Debug, "cleared all subscribers"));
        Status::Ok
    }

    /// Convert a raw id into a handle that unsubscribes it on drop.
    pub fn scoped<E: 'static>(&self, id: SubscriberId) -> OwnedSubscription {
        OwnedSubscription::new::<E>(self, id)
    }

    fn collect_garbage(&self) {
        if !self.inner.gc {
            return;
        }
        let guard = self.inner.state.lock();
        let removed = guard.borrow_mut().registry.collect_garbage();
        for key in removed {
            self.log(
                LogRecord::new(LogLevel::Debug, "gc removed empty bucket for {event}")
                    .with_event(key),
            );
        }
    }

    // ---------------------------------------------------------------------
    // Synchronous dispatch
    // ---------------------------------------------------------------------

    /// Deliver `event` to the subscribers of `E` on the calling thread.
    ///
    /// Subscribers run in priority order and share one event instance, so
    /// changes made by one are seen by the next. Delivery stops at the first
    /// subscriber returning `false`.
    pub fn publish<E: 'static>(&self, mut event: E) -> Status {
        self.dispatch(EventKey::of::<E>(), &mut event)
    }

    fn dispatch(&self, key: EventKey, event: &mut dyn Any) -> Status {
        let guard = self.inner.state.lock();
        let bucket = guard.borrow().registry.bucket(key);

        let Some(bucket) = bucket else {
            self.log(
                LogRecord::new(LogLevel::Warning, "publish: {event} is not registered")
                    .with_event(key),
            );
            return Status::EventTypeNotRegistered;
        };
        if bucket.is_empty() {
            self.log(
                LogRecord::new(LogLevel::Warning, "publish: {event} has no subscribers")
                    .with_event(key),
            );
            return Status::NoSubscribersForEventType;
        }

        for subscriber in bucket.iter() {
            if !subscriber.invoke(event) {
                self.log(
                    LogRecord::new(LogLevel::Debug, "propagation of {event} stopped by {id}")
                        .with_event(key)
                        .with_id(subscriber.id),
                );
                break;
            }
        }
        Status::Ok
    }

    /// Publish several events in order, returning the status of the last.
    ///
    /// Earlier failures are discarded; use [`Bus::publish_multi_statuses`]
    /// to see every status.
    pub fn publish_multi<T: EventSet>(&self, events: T) -> Status {
        events
            .publish_each(self)
            .last()
            .copied()
            .unwrap_or(Status::Ok)
    }

    /// Publish several events in order, returning every status.
    pub fn publish_multi_statuses<T: EventSet>(&self, events: T) -> Vec<Status> {
        events.publish_each(self)
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    /// Number of subscribers for event type `E`.
    #[must_use]
    pub fn subscriber_count<E: 'static>(&self) -> usize {
        let guard = self.inner.state.lock();
        guard.borrow().registry.count(EventKey::of::<E>())
    }

    /// Whether event type `E` has a bucket.
    #[must_use]
    pub fn is_registered<E: 'static>(&self) -> bool {
        let guard = self.inner.state.lock();
        guard.borrow().registry.contains(EventKey::of::<E>())
    }

    /// Number of event types with a bucket.
    #[must_use]
    pub fn event_count(&self) -> usize {
        let guard = self.inner.state.lock();
        guard.borrow().registry.event_count()
    }

    /// Total number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        let guard = self.inner.state.lock();
        guard.borrow().registry.len()
    }

    /// Whether the bus has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether empty buckets are garbage collected.
    #[must_use]
    pub fn gc_enabled(&self) -> bool {
        self.inner.gc
    }

    /// Number of worker threads (zero without the `threading` feature).
    #[must_use]
    pub fn worker_count(&self) -> usize {
        #[cfg(feature = "threading")]
        {
            self.inner.pool.size()
        }
        #[cfg(not(feature = "threading"))]
        {
            0
        }
    }
}

// -------------------------------------------------------------------------
// Worker-pool dispatch
// -------------------------------------------------------------------------

#[cfg(feature = "threading")]
impl Bus {
    /// Run a full synchronous [`Bus::publish`] of `event` on a pool worker.
    ///
    /// Subscribers keep their priority order and short-circuiting; the
    /// caller returns as soon as the task is queued. The status of the
    /// deferred publish is not reported.
    pub fn publish_threaded<E: Send + 'static>(&self, event: E) -> Status {
        let bus = self.downgrade();
        self.inner.pool.enqueue(Box::new(move || {
            if let Some(bus) = bus.upgrade() {
                let _ = bus.publish(event);
            }
        }));
        Status::Ok
    }

    /// Invoke every subscriber of `E` as its own pool task.
    ///
    /// Tasks are picked up by whichever worker is free, so there is no
    /// ordering between subscribers and a `false` return stops nothing. Each
    /// task holds the bus lock for its callback and skips subscribers
    /// removed since the publish. With one subscriber the event is moved into
    /// its task; with several it is shared behind an `Arc` and each task also
    /// locks the event for the duration of its callback.
    pub fn publish_async<E: Send + 'static>(&self, event: E) -> Status {
        let key = EventKey::of::<E>();
        let bucket = {
            let guard = self.inner.state.lock();
            guard.borrow().registry.bucket(key)
        };

        let Some(bucket) = bucket else {
            self.log(
                LogRecord::new(LogLevel::Warning, "publish: {event} is not registered")
                    .with_event(key),
            );
            return Status::EventTypeNotRegistered;
        };

        match bucket.as_slice() {
            [] => {
                self.log(
                    LogRecord::new(LogLevel::Warning, "publish: {event} has no subscribers")
                        .with_event(key),
                );
                Status::NoSubscribersForEventType
            },
            [only] => {
                let subscriber = only.clone();
                let bus = self.downgrade();
                let mut event = event;
                self.inner.pool.enqueue(Box::new(move || {
                    if let Some(bus) = bus.upgrade() {
                        bus.deliver_async(key, &subscriber, |s| {
                            s.invoke(&mut event);
                        });
                    }
                }));
                Status::Ok
            },
            subscribers => {
                let shared = Arc::new(parking_lot::Mutex::new(event));
                for subscriber in subscribers {
                    let subscriber = subscriber.clone();
                    let shared = Arc::clone(&shared);
                    let bus = self.downgrade();
                    self.inner.pool.enqueue(Box::new(move || {
                        if let Some(bus) = bus.upgrade() {
                            bus.deliver_async(key, &subscriber, |s| {
                                let mut event = shared.lock();
                                s.invoke(&mut *event);
                            });
                        }
                    }));
                }
                Status::Ok
            },
        }
    }

    /// Invoke `subscriber` from a pool task, under the bus lock, unless it
    /// was removed after the publish was submitted.
    fn deliver_async(
        &self,
        key: EventKey,
        subscriber: &Subscriber,
        invoke: impl FnOnce(&Subscriber),
    ) {
        let guard = self.inner.state.lock();
        let live = guard.borrow().registry.has_subscriber(key, subscriber.id);
        if live {
            invoke(subscriber);
        } else {
            self.log(
                LogRecord::new(LogLevel::Debug, "skipped async delivery of {event} to removed {id}")
                    .with_event(key)
                    .with_id(subscriber.id),
            );
        }
    }

    /// [`Bus::publish_threaded`] once per event.
    pub fn publish_threaded_multi<T: crate::multi::SendEventSet>(&self, events: T) -> Status {
        events.publish_threaded_each(self);
        Status::Ok
    }

    /// [`Bus::publish_async`] once per event, returning the last status.
    pub fn publish_async_multi<T: crate::multi::SendEventSet>(&self, events: T) -> Status {
        events
            .publish_async_each(self)
            .last()
            .copied()
            .unwrap_or(Status::Ok)
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("event_count", &self.event_count())
            .field("subscriber_count", &self.len())
            .field("gc", &self.inner.gc)
            .field("workers", &self.worker_count())
            .finish()
    }
}
