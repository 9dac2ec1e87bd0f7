//! Scope-bound subscription ownership.

use std::fmt;

use crate::bus::Bus;
use crate::key::EventKey;
use crate::status::Status;
use crate::subscriber::SubscriberId;

/// Owns a subscription and removes it from the bus when dropped.
///
/// The handle fires at most one unsubscribe over its lifetime: an explicit
/// [`unsubscribe`](Self::unsubscribe) disarms it, and so does
/// [`release`](Self::release), which hands the raw id back for manual
/// management. It is deliberately not `Clone`.
///
/// The handle keeps its bus alive. Do not store it inside a callback
/// registered on the same bus.
///
/// ```rust
/// use eventus::{Bus, Status};
///
/// struct Tick;
///
/// let bus = Bus::new();
/// {
///     let id = bus.subscribe(|_: &mut Tick| true);
///     let _sub = bus.scoped::<Tick>(id);
///     assert_eq!(bus.publish(Tick), Status::Ok);
/// }
/// assert_eq!(bus.publish(Tick), Status::EventTypeNotRegistered);
/// ```
#[must_use = "dropping the handle unsubscribes immediately"]
pub struct OwnedSubscription {
    bus: Bus,
    id: SubscriberId,
    event: EventKey,
    armed: bool,
}

impl OwnedSubscription {
    /// Take ownership of subscriber `id` registered for event type `E`.
    pub fn new<E: 'static>(bus: &Bus, id: SubscriberId) -> Self {
        Self {
            bus: bus.clone(),
            id,
            event: EventKey::of::<E>(),
            armed: true,
        }
    }

    /// The owned subscriber id.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// The event type the subscriber is registered for.
    #[must_use]
    pub fn event(&self) -> EventKey {
        self.event
    }

    /// Whether dropping the handle will still unsubscribe.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Unsubscribe now.
    ///
    /// Later calls, and the eventual drop, do nothing and report
    /// [`Status::Ok`].
    pub fn unsubscribe(&mut self) -> Status {
        if !self.armed {
            return Status::Ok;
        }
        self.armed = false;
        self.bus.unsubscribe_key(self.event, self.id)
    }

    /// Give up ownership without unsubscribing, returning the raw id.
    #[must_use]
    pub fn release(mut self) -> SubscriberId {
        self.armed = false;
        self.id
    }
}

impl Drop for OwnedSubscription {
    fn drop(&mut self) {
        let _ = self.unsubscribe();
    }
}

impl fmt::Debug for OwnedSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedSubscription")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}
