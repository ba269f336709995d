//! # Timers and the event loop.
//!
//! - [`TimerSpec`], [`Timer`] periodic alarm sources with interval/tolerance
//! - [`Observe`], [`ObserverFn`] alarm callbacks
//! - [`EventLoop`] the dispatcher that schedules monitored timers

mod event_loop;
mod observer;
mod timer;

pub use event_loop::EventLoop;
pub use observer::{Alarm, ObserverFn, ObserverRef, Observe};
pub use timer::{Timer, TimerId, TimerSpec};
