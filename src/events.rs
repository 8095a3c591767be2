//! Typed publish/subscribe channels for the UI layer.
//!
//! Each logical signal (resize, run, save, console-message) gets its own
//! [`EventBus`] instance so producers and consumers stay decoupled without a
//! global dispatcher. The bus is a live signal, not a queue: an `emit` before
//! any `subscribe` is lost by design.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Handler<T>)>,
}

/// A single pub/sub channel carrying payloads of type `T`.
///
/// Cloning is cheap and clones share the listener set.
pub struct EventBus<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> EventBus<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `handler` and returns a token that removes exactly this
    /// handler when invoked.
    #[must_use = "dropping the subscription token makes the handler permanent"]
    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut registry = self
                .registry
                .lock()
                .expect("event bus registry must not be poisoned");
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::new(handler)));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription {
            remove: Mutex::new(Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    let mut registry = registry
                        .lock()
                        .expect("event bus registry must not be poisoned");
                    registry.entries.retain(|(entry_id, _)| *entry_id != id);
                }
            }))),
        }
    }

    /// Synchronously invokes every handler registered at call time.
    ///
    /// Handlers added or removed during emission do not change delivery for
    /// this emission. A panicking handler is logged and does not suppress
    /// delivery to the others.
    pub fn emit(&self, payload: &T) {
        let snapshot: Vec<Handler<T>> = {
            let registry = self
                .registry
                .lock()
                .expect("event bus registry must not be poisoned");
            registry
                .entries
                .iter()
                .map(|(_, handler)| Arc::clone(handler))
                .collect()
        };

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                log::warn!("event bus handler panicked; continuing delivery");
            }
        }
    }
}

/// Unsubscribe token returned by [`EventBus::subscribe`].
///
/// Calling [`Subscription::unsubscribe`] more than once is a safe no-op.
/// Dropping the token does not unsubscribe.
pub struct Subscription {
    remove: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        let remove = self
            .remove
            .lock()
            .expect("subscription must not be poisoned")
            .take();
        if let Some(remove) = remove {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_every_handler_once() {
        let bus = EventBus::<u32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let subs: Vec<_> = (0..5)
            .map(|_| {
                let count = Arc::clone(&count);
                bus.subscribe(move |payload: &u32| {
                    assert_eq!(*payload, 7);
                    count.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        bus.emit(&7);
        assert_eq!(count.load(Ordering::SeqCst), 5);
        drop(subs);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = {
            let count = Arc::clone(&count);
            bus.subscribe(move |()| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        sub.unsubscribe();
        sub.unsubscribe();
        bus.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_during_emission_preserves_delivery() {
        let bus = EventBus::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let victim = Arc::new(Mutex::new(None::<Subscription>));
        let remover = {
            let victim = Arc::clone(&victim);
            let count = Arc::clone(&count);
            bus.subscribe(move |()| {
                count.fetch_add(1, Ordering::SeqCst);
                if let Some(sub) = victim.lock().expect("victim").take() {
                    sub.unsubscribe();
                }
            })
        };
        let other = {
            let count = Arc::clone(&count);
            bus.subscribe(move |()| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        *victim.lock().expect("victim") = Some(other);

        // Both handlers were subscribed at call time, so both fire even
        // though the first removes the second mid-emission.
        bus.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 2);

        bus.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 3);
        drop(remover);
    }

    #[test]
    fn test_panicking_handler_does_not_suppress_others() {
        let bus = EventBus::<()>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _panicky = bus.subscribe(|()| panic!("boom"));
        let _counter = {
            let count = Arc::clone(&count);
            bus.subscribe(move |()| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        bus.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_emit_without_subscribers_is_lost() {
        let bus = EventBus::<String>::new();
        bus.emit(&"nobody home".to_string());

        let count = Arc::new(AtomicUsize::new(0));
        let _sub = {
            let count = Arc::clone(&count);
            bus.subscribe(move |_: &String| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        // The earlier emit was not buffered.
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
