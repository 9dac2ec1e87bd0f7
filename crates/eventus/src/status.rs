//! Operation status codes.

use std::fmt;

use thiserror::Error;

/// Outcome of a bus operation.
///
/// Every failure the bus can report is a lookup miss. None of them are
/// faults: callers decide whether to ignore, retry or surface them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum Status {
    /// The operation succeeded.
    Ok,
    /// No bucket exists for the event type.
    EventTypeNotRegistered,
    /// The event type has a bucket but it is empty (only with GC disabled).
    NoSubscribersForEventType,
    /// No subscriber carries the requested id.
    NoSubscriberWithId,
}

impl Status {
    /// Stable, human-readable name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::EventTypeNotRegistered => "EVENT_TYPE_NOT_REGISTERED",
            Self::NoSubscribersForEventType => "NO_SUBSCRIBERS_FOR_EVENT_TYPE",
            Self::NoSubscriberWithId => "NO_SUBSCRIBER_WITH_ID",
        }
    }

    /// Whether the status is [`Status::Ok`].
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Convert into a `Result` so the miss can be propagated with `?`.
    ///
    /// # Errors
    ///
    /// Returns the matching [`BusError`] for every status except `Ok`.
    pub fn into_result(self) -> BusResult<()> {
        match self {
            Self::Ok => Ok(()),
            Self::EventTypeNotRegistered => Err(BusError::EventTypeNotRegistered),
            Self::NoSubscribersForEventType => Err(BusError::NoSubscribersForEventType),
            Self::NoSubscriberWithId => Err(BusError::NoSubscriberWithId),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable name of a status.
#[must_use]
pub const fn status_string(status: Status) -> &'static str {
    status.as_str()
}

/// A non-`Ok` status in `Result` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// No bucket exists for the event type.
    #[error("event type is not registered")]
    EventTypeNotRegistered,
    /// The event type has no subscribers.
    #[error("no subscribers for event type")]
    NoSubscribersForEventType,
    /// No subscriber carries the requested id.
    #[error("no subscriber with the given id")]
    NoSubscriberWithId,
}

impl From<BusError> for Status {
    fn from(err: BusError) -> Self {
        match err {
            BusError::EventTypeNotRegistered => Self::EventTypeNotRegistered,
            BusError::NoSubscribersForEventType => Self::NoSubscribersForEventType,
            BusError::NoSubscriberWithId => Self::NoSubscriberWithId,
        }
    }
}

/// Result type for bus operations converted with [`Status::into_result`].
pub type BusResult<T> = Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names_are_stable() {
        assert_eq!(Status::Ok.as_str(), "OK");
        assert_eq!(
            status_string(Status::EventTypeNotRegistered),
            "EVENT_TYPE_NOT_REGISTERED"
        );
        assert_eq!(
            Status::NoSubscribersForEventType.to_string(),
            "NO_SUBSCRIBERS_FOR_EVENT_TYPE"
        );
        assert_eq!(Status::NoSubscriberWithId.as_str(), "NO_SUBSCRIBER_WITH_ID");
    }

    #[test]
    fn test_into_result() {
        assert!(Status::Ok.into_result().is_ok());
        assert_eq!(
            Status::NoSubscriberWithId.into_result(),
            Err(BusError::NoSubscriberWithId)
        );
        assert_eq!(
            Status::from(BusError::EventTypeNotRegistered),
            Status::EventTypeNotRegistered
        );
    }
}
