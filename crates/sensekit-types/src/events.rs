//! Ordered observer registration.
//!
//! [`Listeners`] replaces inline multicast-event fields: subscribers are
//! invoked in registration order, and unsubscription is by the id returned
//! at registration.  All dispatch is synchronous on the caller's thread.

use crate::ids::SensorId;
use crate::signal::Signal;

/// Handle returned by [`Listeners::subscribe`]; pass to
/// [`Listeners::unsubscribe`] to remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An insertion-ordered list of callbacks for one event kind.
pub struct Listeners<E> {
    next: u64,
    entries: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it will fire after all earlier registrations.
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback.  Unknown ids are a no-op.
    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    /// Invoke every callback, in registration order.
    pub fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<E> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

/// Payload for every sensor lifecycle event.
///
/// `signal` is absent for events about the sensor as a whole (e.g. a pulse
/// completing) rather than one tracked object.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub sensor: SensorId,
    pub signal: Option<Signal>,
}

impl SensorEvent {
    pub fn new(sensor: SensorId, signal: Signal) -> Self {
        Self {
            sensor,
            signal: Some(signal),
        }
    }

    /// Event about the sensor itself, carrying no signal.
    pub fn bare(sensor: SensorId) -> Self {
        Self {
            sensor,
            signal: None,
        }
    }
}
