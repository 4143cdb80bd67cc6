//! Observer registry for alert-list changes

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::warn;

use super::model::Alert;
use super::notify::panic_message;

/// Callback receiving the full current alert list
pub type AlertListener = Arc<dyn Fn(&[Alert]) + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    listeners: BTreeMap<u64, AlertListener>,
}

/// Registered alert listeners
///
/// Clones share the same registry. Listeners are invoked outside the
/// registry lock, so a listener may subscribe or unsubscribe while being
/// notified; the change applies to the next publication.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; the returned handle removes it again
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[Alert]) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.insert(id, Arc::new(listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `alerts` to every registered listener
    ///
    /// A panicking listener is logged and skipped; the others still run.
    pub fn publish(&self, alerts: &[Alert]) {
        let listeners: Vec<(u64, AlertListener)> = self
            .inner
            .lock()
            .listeners
            .iter()
            .map(|(id, listener)| (*id, listener.clone()))
            .collect();
        for (id, listener) in listeners {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(alerts))) {
                warn!(
                    subscription = id,
                    panic = %panic_message(payload.as_ref()),
                    "Alert listener panicked"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle returned by [`SubscriberRegistry::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<RegistryInner>>,
}

impl Subscription {
    /// Remove the listener. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.lock().listeners.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_all_listeners() {
        let registry = SubscriberRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = calls.clone();
        let _s1 = registry.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = calls.clone();
        let _s2 = registry.subscribe(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        registry.publish(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let registry = SubscriberRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let _bad = registry.subscribe(|_| panic!("listener bug"));
        let c = calls.clone();
        let _good = registry.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.publish(&[]);
        registry.publish(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let subscription = registry.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        subscription.unsubscribe();
        registry.publish(&[]);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = SubscriberRegistry::new();
        let subscription = registry.subscribe(|_| {});
        drop(registry);
        subscription.unsubscribe();
    }
}
