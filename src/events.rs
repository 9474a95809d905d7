//! Observer lists and the screen transition broadcast
//!
//! Listeners are registered through a [`ListenerSet`] and get back a
//! [`ListenerHandle`]. Dropping the handle (or calling `unsubscribe`) removes
//! the listener, so a controller that owns its handle cannot leak callbacks
//! past its own lifetime. `keep()` opts out for listeners meant to live as long
//! as the set.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

use crate::sync::lock;

struct Slots<F: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<F>)>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<F: ?Sized + Send + Sync> Detach for Mutex<Slots<F>> {
    fn detach(&self, id: u64) {
        lock(self).entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Ordered list of listeners of type `F` (usually a `dyn Fn(..)`)
pub struct ListenerSet<F: ?Sized> {
    slots: Arc<Mutex<Slots<F>>>,
}

impl<F: ?Sized> Clone for ListenerSet<F> {
    fn clone(&self) -> Self {
        Self { slots: Arc::clone(&self.slots) }
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for ListenerSet<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized + Send + Sync + 'static> ListenerSet<F> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots { next_id: 0, entries: Vec::new() })),
        }
    }

    /// Register a listener; it stays registered while the handle lives
    pub fn add(&self, listener: Arc<F>) -> ListenerHandle {
        let id = {
            let mut slots = lock(&self.slots);
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, listener));
            id
        };
        let owner: Weak<dyn Detach> = Arc::downgrade(&self.slots) as Weak<dyn Detach>;
        ListenerHandle { id, owner: Some(owner) }
    }

    /// Current listeners in registration order.
    ///
    /// Callers invoke the snapshot outside the lock, so listeners may subscribe
    /// or unsubscribe from inside their own callback.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        lock(&self.slots).entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cancellation handle for a registered listener
#[must_use = "dropping the handle unsubscribes the listener"]
pub struct ListenerHandle {
    id: u64,
    owner: Option<Weak<dyn Detach>>,
}

impl ListenerHandle {
    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Leave the listener registered for the lifetime of its set
    pub fn keep(mut self) {
        self.owner = None;
    }

    /// Whether the listener is still registered through this handle
    pub fn is_active(&self) -> bool {
        self.owner.as_ref().is_some_and(|w| w.strong_count() > 0)
    }

    fn release(&mut self) {
        if let Some(owner) = self.owner.take().and_then(|w| w.upgrade()) {
            owner.detach(self.id);
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Broadcast after a navigation has fully settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenTransition {
    /// Screen that is now active
    pub screen_id: String,
    /// Screen that was active before this navigation began
    pub previous: Option<String>,
}

pub type TransitionListener = dyn Fn(&ScreenTransition) + Send + Sync;

/// Observer list for [`ScreenTransition`]s
#[derive(Clone, Default)]
pub struct TransitionBus {
    listeners: ListenerSet<TransitionListener>,
}

impl TransitionBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&ScreenTransition) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    /// Receive transitions on a channel instead of a callback
    pub fn subscribe_channel(&self) -> (ListenerHandle, mpsc::UnboundedReceiver<ScreenTransition>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.subscribe(move |transition| {
            // Receiver gone means the consumer shut down; nothing to deliver to
            let _ = tx.send(transition.clone());
        });
        (handle, rx)
    }

    /// Deliver `transition` to every listener. A panicking listener is logged
    /// and skipped; the rest still run. Returns how many listeners ran cleanly.
    pub fn emit(&self, transition: &ScreenTransition) -> usize {
        let listeners = self.listeners.snapshot();
        log::debug!("Broadcasting transition to '{}' to {} listeners", transition.screen_id, listeners.len());

        let mut delivered = 0;
        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(transition))) {
                Ok(()) => delivered += 1,
                Err(_) => log::error!("Transition listener panicked on '{}'", transition.screen_id),
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
