//! Subscriber model: ids, handler traits and type-erased callback storage.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::sync::ThreadBound;

/// Identifier of a registered subscriber.
///
/// Ids are allocated from a per-bus monotonically increasing counter and are
/// never reused for the lifetime of that bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<SubscriberId> for u64 {
    fn from(id: SubscriberId) -> Self {
        id.0
    }
}

/// A handler for events of type `E`.
///
/// Returning `false` stops propagation to lower-priority subscribers during a
/// synchronous publish.
///
/// Closures `Fn(&mut E) -> bool` implement this trait. Implement it by hand on
/// a type that should handle several event types, then register it with
/// [`Bus::subscribe_multi`](crate::Bus::subscribe_multi).
pub trait EventHandler<E>: ThreadBound + 'static {
    /// Handle one event.
    fn handle(&self, event: &mut E) -> bool;
}

impl<E, F> EventHandler<E> for F
where
    F: Fn(&mut E) -> bool + ThreadBound + 'static,
{
    fn handle(&self, event: &mut E) -> bool {
        self(event)
    }
}

/// Callback with its event type erased.
///
/// Each implementation knows the concrete event type it was built for and
/// recovers it from the `dyn Any` it is handed. Disposal is the trait
/// object's `Drop`.
pub(crate) trait ErasedHandler: ThreadBound {
    /// Invoke the callback. A payload of the wrong type is skipped and
    /// reported as "continue".
    fn invoke(&self, event: &mut dyn Any) -> bool;
}

/// Monomorphized adapter from a typed handler to [`ErasedHandler`].
struct Typed<E, H> {
    handler: H,
    _event: PhantomData<fn(&mut E)>,
}

impl<E, H> ErasedHandler for Typed<E, H>
where
    E: 'static,
    H: EventHandler<E>,
{
    fn invoke(&self, event: &mut dyn Any) -> bool {
        match event.downcast_mut::<E>() {
            Some(event) => self.handler.handle(event),
            None => true,
        }
    }
}

pub(crate) type SharedHandler = Arc<dyn ErasedHandler>;

pub(crate) fn erase<E, H>(handler: H) -> SharedHandler
where
    E: 'static,
    H: EventHandler<E>,
{
    Arc::new(Typed {
        handler,
        _event: PhantomData,
    })
}

/// One registered callback with its identity and priority.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub(crate) id: SubscriberId,
    pub(crate) priority: i32,
    pub(crate) handler: SharedHandler,
}

impl Subscriber {
    pub(crate) fn new(id: SubscriberId, priority: i32, handler: SharedHandler) -> Self {
        Self {
            id,
            priority,
            handler,
        }
    }

    pub(crate) fn invoke(&self, event: &mut dyn Any) -> bool {
        self.handler.invoke(event)
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
