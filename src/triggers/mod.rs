//! Trigger dispatch.
//!
//! Routes simulation events to the active effects bound to them.
//!
//! ## Key Components
//!
//! - [`TriggerKind`]: the closed set of events effects can bind to
//! - [`Payload`]: what happened (target, amount, values, tags)
//! - [`TriggerEvent`]: an event in flight, with its follow-up depth
//! - [`Dispatcher`]: ordered subscriber lists rebuilt on loadout changes
//! - [`FollowUpQueue`]: same-tick FIFO for chained events, depth-capped
//!
//! ## Ordering
//!
//! Within one event, effects run by ascending priority, then acquisition
//! order (earliest first), then effect id. Follow-ups run after the event
//! that emitted them, in emission order.

mod dispatcher;
mod event;
mod queue;

pub use dispatcher::{Binding, Dispatcher};
pub use event::{Payload, TriggerEvent, TriggerKind};
pub use queue::FollowUpQueue;
