//! # Event subscribers.
//!
//! ```text
//! ProcessState ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                     ┌────────┼────────┐
//!                                                     ▼        ▼        ▼
//!                                                   sub1     sub2     subN
//! ```
//!
//! Subscribers are passed to [`ProcessStateBuilder::with_subscribers`](crate::ProcessStateBuilder::with_subscribers).

mod subscribe;
mod subscriber_set;

pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
