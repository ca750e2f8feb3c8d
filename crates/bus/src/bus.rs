use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, warn};

use crate::traits::SignalPublisher;

/// The refresh signal. Carries nothing: receivers re-derive their own view
/// from the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSignal;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

type Handler = Arc<dyn Fn(ChangeSignal) -> HandlerResult + Send + Sync>;

#[derive(Clone)]
struct Entry {
    id: u64,
    handler: Handler,
    /// Cleared on unsubscribe, so an in-flight publish skips the entry.
    live: Arc<AtomicBool>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<Entry>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // A handler never runs under the lock, so a poisoned registry is still consistent.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A handler that returned an error or panicked during one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub subscription: u64,
    pub reason: String,
}

/// Outcome of one [`LocalBroadcastBus::publish`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Handlers that ran to completion without error.
    pub delivered: usize,
    pub failures: Vec<HandlerFailure>,
}

impl PublishReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// In-process publish/subscribe channel for [`ChangeSignal`]s.
///
/// Cloning yields another handle to the same subscriber list. `publish`
/// invokes every handler registered at the moment of the call, synchronously
/// and in subscription order. A failing handler is recorded in the
/// [`PublishReport`] and logged; the remaining handlers still run.
#[derive(Clone, Default)]
pub struct LocalBroadcastBus {
    registry: Arc<Mutex<Registry>>,
}

impl LocalBroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It stays registered until the returned
    /// [`Subscription`] is dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(ChangeSignal) -> HandlerResult + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.push(Entry {
            id,
            handler: Arc::new(handler),
            live: Arc::new(AtomicBool::new(true)),
        });
        debug!(subscription = id, total = registry.handlers.len(), "bus subscriber added");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }

    /// Deliver one signal to every current subscriber.
    pub fn publish(&self) -> PublishReport {
        // Snapshot so handlers may subscribe or unsubscribe while being invoked.
        // Handlers added mid-publish wait for the next signal; handlers removed
        // mid-publish are skipped.
        let handlers: Vec<Entry> = lock(&self.registry).handlers.clone();

        let mut report = PublishReport::default();
        for Entry { id, handler, live } in handlers {
            if !live.load(Ordering::Acquire) {
                debug!(subscription = id, "skipping handler removed during publish");
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| handler(ChangeSignal))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!(subscription = id, error = %e, "bus handler failed");
                    report.failures.push(HandlerFailure {
                        subscription: id,
                        reason: e.to_string(),
                    });
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    warn!(subscription = id, reason = %reason, "bus handler panicked");
                    report.failures.push(HandlerFailure {
                        subscription: id,
                        reason,
                    });
                }
            }
        }
        debug!(delivered = report.delivered, failed = report.failures.len(), "signal published");
        report
    }
}

impl SignalPublisher for LocalBroadcastBus {
    fn publish(&self) -> PublishReport {
        LocalBroadcastBus::publish(self)
    }
}

impl std::fmt::Debug for LocalBroadcastBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBroadcastBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Registration guard returned by [`LocalBroadcastBus::subscribe`].
///
/// Dropping it removes the handler. The guard only holds a weak reference,
/// so it never keeps a bus alive.
#[must_use = "dropping a Subscription unsubscribes its handler immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the handler now. Returns false if the bus is already gone.
    pub fn unsubscribe(self) -> bool {
        self.remove()
        // Drop runs afterwards and finds nothing left to remove.
    }

    fn remove(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = lock(&registry);
        let before = registry.handlers.len();
        registry.handlers.retain(|entry| {
            if entry.id != self.id {
                return true;
            }
            entry.live.store(false, Ordering::Release);
            false
        });
        let removed = registry.handlers.len() != before;
        if removed {
            debug!(subscription = self.id, "bus subscriber removed");
        }
        removed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
