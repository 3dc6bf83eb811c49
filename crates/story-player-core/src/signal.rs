//! Single-resolution signals.
//!
//! A [`Deferred`] resolves at most once. Waiters hold a [`Listener`]; when the
//! deferred is dropped unresolved (because its owner replaced it with a fresh
//! one) every outstanding listener wakes with `None`.

use std::fmt;

use tokio::sync::watch;

/// A value that is resolved at most once and can be awaited by many listeners.
pub struct Deferred<T: Clone> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> Deferred<T> {
    /// Creates an unresolved deferred.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Resolves the deferred. Returns false if it was already resolved, in
    /// which case the first value is kept.
    pub fn resolve(&self, value: T) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        })
    }

    /// Returns true once [`resolve`](Self::resolve) has been called.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Returns the resolved value, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Returns a listener that completes when this deferred resolves.
    #[must_use]
    pub fn listener(&self) -> Listener<T> {
        Listener {
            rx: self.tx.subscribe(),
        }
    }
}

impl<T: Clone> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Awaitable handle on a [`Deferred`].
pub struct Listener<T: Clone> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> Listener<T> {
    /// Waits for the resolution. Returns `None` if the deferred was dropped
    /// without ever resolving.
    pub async fn wait(mut self) -> Option<T> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        }
    }
}

impl<T: Clone> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").finish_non_exhaustive()
    }
}
