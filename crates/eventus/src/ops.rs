//! Free-function form of the bus API.
//!
//! Each function takes the bus explicitly and forwards to the matching
//! [`Bus`] method. There is no global bus.

use crate::bus::Bus;
use crate::multi::{EventSet, EventTypes};
use crate::status::Status;
use crate::subscriber::SubscriberId;
use crate::sync::ThreadBound;

/// See [`Bus::subscribe_with_priority`].
pub fn subscribe<E, F>(bus: &Bus, callback: F, priority: i32) -> SubscriberId
where
    E: 'static,
    F: Fn(&mut E) -> bool + ThreadBound + 'static,
{
    bus.subscribe_with_priority(callback, priority)
}

/// See [`Bus::subscribe_multi_with_priority`].
pub fn subscribe_multi<T, H>(bus: &Bus, handler: H, priority: i32) -> Vec<SubscriberId>
where
    T: EventTypes<H>,
{
    bus.subscribe_multi_with_priority::<T, H>(handler, priority)
}

/// See [`Bus::once`].
pub fn once<E, F>(bus: &Bus, callback: F) -> SubscriberId
where
    E: 'static,
    F: Fn(&mut E) -> bool + ThreadBound + 'static,
{
    bus.once(callback)
}

/// See [`Bus::unsubscribe`].
pub fn unsubscribe<E: 'static>(bus: &Bus, id: SubscriberId) -> Status {
    bus.unsubscribe::<E>(id)
}

/// See [`Bus::unsubscribe_id`].
pub fn unsubscribe_id(bus: &Bus, id: SubscriberId) -> Status {
    bus.unsubscribe_id(id)
}

/// See [`Bus::unsubscribe_event`].
pub fn unsubscribe_event<E: 'static>(bus: &Bus) -> Status {
    bus.unsubscribe_event::<E>()
}

/// See [`Bus::unsubscribe_all`].
pub fn unsubscribe_all(bus: &Bus) -> Status {
    bus.unsubscribe_all()
}

/// See [`Bus::publish`].
pub fn publish<E: 'static>(bus: &Bus, event: E) -> Status {
    bus.publish(event)
}

/// See [`Bus::publish_multi`].
pub fn publish_multi<T: EventSet>(bus: &Bus, events: T) -> Status {
    bus.publish_multi(events)
}

/// See [`Bus::publish_threaded`].
#[cfg(feature = "threading")]
pub fn publish_threaded<E: Send + 'static>(bus: &Bus, event: E) -> Status {
    bus.publish_threaded(event)
}

/// See [`Bus::publish_threaded_multi`].
#[cfg(feature = "threading")]
pub fn publish_threaded_multi<T: crate::multi::SendEventSet>(bus: &Bus, events: T) -> Status {
    bus.publish_threaded_multi(events)
}

/// See [`Bus::publish_async`].
#[cfg(feature = "threading")]
pub fn publish_async<E: Send + 'static>(bus: &Bus, event: E) -> Status {
    bus.publish_async(event)
}

/// See [`Bus::publish_async_multi`].
#[cfg(feature = "threading")]
pub fn publish_async_multi<T: crate::multi::SendEventSet>(bus: &Bus, events: T) -> Status {
    bus.publish_async_multi(events)
}
