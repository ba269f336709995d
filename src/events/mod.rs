//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor, workers,
//! the event loop, the shutdown coordinator and the control plane.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] process-wide broadcast channel (`publish`, `emit`, `subscribe`)
//!
//! ## Quick reference
//! - **Publishers**: `ProcessState` (start/shutdown/control), workers,
//!   `EventLoop` (alarm dispatch), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`) and
//!   any direct `Bus::subscribe()` receiver.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
