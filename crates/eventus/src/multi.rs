//! Tuple adapters for the `*_multi` operations.
//!
//! A tuple of event values is an [`EventSet`]; a tuple of event *types* is an
//! [`EventTypes`] for any handler implementing [`EventHandler`] for each of
//! them. Implemented for tuples of one to eight elements.

use crate::bus::Bus;
use crate::status::Status;
use crate::subscriber::{EventHandler, SubscriberId};

/// A tuple of events that can be published in sequence.
pub trait EventSet {
    /// Publish each element in order, collecting every status.
    fn publish_each(self, bus: &Bus) -> Vec<Status>;
}

/// A tuple of `Send` events that can be handed to the worker pool.
#[cfg(feature = "threading")]
pub trait SendEventSet {
    /// [`Bus::publish_threaded`] each element in order.
    fn publish_threaded_each(self, bus: &Bus) -> Vec<Status>;

    /// [`Bus::publish_async`] each element in order.
    fn publish_async_each(self, bus: &Bus) -> Vec<Status>;
}

/// A tuple of event types a handler `H` can be subscribed to at once.
pub trait EventTypes<H> {
    /// Subscribe a clone of `handler` to each event type, in tuple order.
    fn subscribe_each(bus: &Bus, handler: H, priority: i32) -> Vec<SubscriberId>;
}

macro_rules! impl_event_tuples {
    ($($name:ident),+) => {
        impl<$($name: 'static),+> EventSet for ($($name,)+) {
            #[allow(non_snake_case)]
            fn publish_each(self, bus: &Bus) -> Vec<Status> {
                let ($($name,)+) = self;
                vec![$(bus.publish($name)),+]
            }
        }

        #[cfg(feature = "threading")]
        impl<$($name: Send + 'static),+> SendEventSet for ($($name,)+) {
            #[allow(non_snake_case)]
            fn publish_threaded_each(self, bus: &Bus) -> Vec<Status> {
                let ($($name,)+) = self;
                vec![$(bus.publish_threaded($name)),+]
            }

            #[allow(non_snake_case)]
            fn publish_async_each(self, bus: &Bus) -> Vec<Status> {
                let ($($name,)+) = self;
                vec![$(bus.publish_async($name)),+]
            }
        }

        impl<Handler, $($name: 'static),+> EventTypes<Handler> for ($($name,)+)
        where
            Handler: Clone $(+ EventHandler<$name>)+,
        {
            fn subscribe_each(bus: &Bus, handler: Handler, priority: i32) -> Vec<SubscriberId> {
                vec![$(bus.subscribe_handler::<$name, Handler>(handler.clone(), priority)),+]
            }
        }
    };
}

impl_event_tuples!(A);
impl_event_tuples!(A, B);
impl_event_tuples!(A, B, C);
impl_event_tuples!(A, B, C, D);
impl_event_tuples!(A, B, C, D, E);
impl_event_tuples!(A, B, C, D, E, F);
impl_event_tuples!(A, B, C, D, E, F, G);
impl_event_tuples!(A, B, C, D, E, F, G, I);
