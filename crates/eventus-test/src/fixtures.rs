//! Event types shared across tests.

/// An event carrying a mutable value and a status string.
///
/// Subscribers rewrite `value` and `status` to show that later subscribers
/// observe earlier modifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiableEvent {
    /// Current value.
    pub value: i32,
    /// Free-form status, overwritten by subscribers.
    pub status: String,
}

impl ModifiableEvent {
    /// Create an event with the given starting value.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self {
            value,
            status: "initial".to_string(),
        }
    }
}

/// A user interface action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAction {
    /// Name of the action.
    pub name: String,
}

impl UserAction {
    /// Create an action with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A plain notification with no payload beyond its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub &'static str);

/// An event used only for counting deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter;
