#![forbid(unsafe_code)]

//! Change-notification primitives.
//!
//! - [`ListenerList`]: ordered listener registrations, strong or weak.
//! - [`WeakCallback`]: a method bound to a weakly held owner.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Watchable`] / [`EventScope`]: scoped event emission.
//! - [`WatchableSequence`]: an observable list built on the above.
//!
//! # Architecture
//!
//! Everything here is single-threaded: shared state lives in
//! `Rc<RefCell<..>>` and listeners are reached through `Rc`/`Weak`. Dead
//! registrations are pruned lazily during notification.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order.
//! 2. No `RefCell` borrow is held while a listener runs.
//! 3. A registration whose owner is gone never fires again and is removed
//!    without error.

pub mod listener;
pub mod sequence;
pub mod watchable;

pub use listener::{ListenerList, ListenerToken, Subscription, WeakCallback};
pub use sequence::{EventKind, Position, SequenceEvent, WatchableSequence};
pub use watchable::{EventScope, Watchable};
