//! # Broadcast bus for supervisor events.
//!
//! Everything that changes the supervisor's picture of the process reports it
//! here: registration and start failures from workers, alarm deliveries from
//! the event loop, the shutdown sequence, and signal handling from the control
//! plane.
//!
//! ```text
//!   register / workers ──┐
//!   EventLoop::dispatch ──┼──► Bus ──► subscriber_listener ──► SubscriberSet
//!   shutdown / control  ──┘     └────► bus().subscribe()  (tests, embedders)
//! ```
//!
//! ## Rules
//! - Publishing never waits; an event nobody is subscribed to is dropped.
//! - Receivers only see events sent after they subscribed.
//! - The ring buffer is shared: a receiver more than `capacity` events behind
//!   gets `RecvError::Lagged(n)` and resumes at the oldest kept event.

use tokio::sync::broadcast;

use super::event::{Event, EventKind};

/// Cloneable handle to the process-wide event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus keeping the last `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Publishes a payload-free event of `kind`.
    pub fn emit(&self, kind: EventKind) {
        self.publish(Event::new(kind));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers, including the subscriber listener.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
