//! Registry locking, selected at build time by the `thread-safe` feature.
//!
//! With the feature on, the registry sits behind a reentrant mutex so that a
//! subscriber may call back into the bus (`once` unsubscribing itself, a
//! handler publishing a follow-up event) from inside a dispatch. With it off,
//! the lock compiles down to a bare [`RefCell`] and the bus is `!Sync`.

use std::cell::RefCell;

/// Bound applied to every callback and sink stored in the bus.
///
/// `Send + Sync` when the `thread-safe` feature is enabled, no bound otherwise.
#[cfg(feature = "thread-safe")]
pub trait ThreadBound: Send + Sync {}

#[cfg(feature = "thread-safe")]
impl<T: Send + Sync + ?Sized> ThreadBound for T {}

/// Bound applied to every callback and sink stored in the bus.
///
/// `Send + Sync` when the `thread-safe` feature is enabled, no bound otherwise.
#[cfg(not(feature = "thread-safe"))]
pub trait ThreadBound {}

#[cfg(not(feature = "thread-safe"))]
impl<T: ?Sized> ThreadBound for T {}

/// Reentrant lock around a value with interior mutability.
pub(crate) struct BusLock<T> {
    #[cfg(feature = "thread-safe")]
    inner: parking_lot::ReentrantMutex<RefCell<T>>,
    #[cfg(not(feature = "thread-safe"))]
    inner: RefCell<T>,
}

#[cfg(feature = "thread-safe")]
pub(crate) type BusGuard<'a, T> = parking_lot::ReentrantMutexGuard<'a, RefCell<T>>;

#[cfg(not(feature = "thread-safe"))]
pub(crate) type BusGuard<'a, T> = &'a RefCell<T>;

impl<T> BusLock<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            #[cfg(feature = "thread-safe")]
            inner: parking_lot::ReentrantMutex::new(RefCell::new(value)),
            #[cfg(not(feature = "thread-safe"))]
            inner: RefCell::new(value),
        }
    }

    /// Enter the critical section. The same thread may enter again while a
    /// guard is alive; `RefCell` borrows must not be held across callbacks.
    pub(crate) fn lock(&self) -> BusGuard<'_, T> {
        #[cfg(feature = "thread-safe")]
        {
            self.inner.lock()
        }
        #[cfg(not(feature = "thread-safe"))]
        {
            &self.inner
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_reentrant() {
        let lock = BusLock::new(1_u32);
        let outer = lock.lock();
        {
            let inner = lock.lock();
            *inner.borrow_mut() = 2;
        }
        assert_eq!(*outer.borrow(), 2);
    }

    #[cfg(feature = "thread-safe")]
    #[test]
    fn test_lock_serializes_threads() {
        use std::sync::Arc;

        let lock = Arc::new(BusLock::new(0_u64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let guard = lock.lock();
                        let mut value = guard.borrow_mut();
                        *value = value.wrapping_add(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*lock.lock().borrow(), 4000);
    }
}
