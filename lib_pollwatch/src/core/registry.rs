//! # Listener Registry
//!
//! The set of callbacks interested in the live incident stream. Identity is
//! the allocation behind the `Arc`: registering the same listener twice is a
//! no-op, so every distinct listener sees each incident exactly once.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::models::Incident;

/// A live-stream callback.
pub type Listener = Arc<dyn Fn(&Incident) + Send + Sync>;

/// Wraps a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Incident) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Insertion-ordered set of listeners.
#[derive(Default)]
pub struct Registry {
    listeners: Vec<Listener>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` unless it is already registered. Returns `true` when added.
    pub fn insert(&mut self, listener: Listener) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Removes `listener`. Returns `true` when it was registered.
    pub fn remove(&mut self, listener: &Listener) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !same_listener(l, listener));
        self.listeners.len() != before
    }

    /// Whether `listener` is registered.
    pub fn contains(&self, listener: &Listener) -> bool {
        self.listeners.iter().any(|l| same_listener(l, listener))
    }

    /// Number of distinct listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// `true` when nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Cheap copy of the current listeners, so delivery can happen without
    /// holding the owner's lock.
    pub fn snapshot(&self) -> Vec<Listener> {
        self.listeners.clone()
    }
}

/// Calls every listener with `incident`. A panicking listener is logged and
/// skipped; it never takes the stream down or starves the others. This relies
/// on unwinding, so the workspace profiles must not set `panic = "abort"`.
pub fn deliver(listeners: &[Listener], incident: &Incident) -> usize {
    let mut delivered = 0;
    for listener in listeners {
        match catch_unwind(AssertUnwindSafe(|| listener(incident))) {
            Ok(()) => delivered += 1,
            Err(_) => log::error!("Listener panicked while handling incident '{}'", incident.id),
        }
    }
    delivered
}
