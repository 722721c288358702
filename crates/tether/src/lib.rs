#![forbid(unsafe_code)]

//! Observable collections that keep each other in step.
//!
//! This crate provides:
//! - [`WatchableSequence`] for a list that publishes structured change events
//! - [`ManyToMany`] for a bidirectional relation whose two halves update
//!   each other on every mutation
//! - [`WeakCallback`] and [`ListenerList`] for listeners that do not keep
//!   their owner alive
//! - [`Slice`] for start/stop/step addressing with negative indices
//!
//! Everything is single-threaded (`Rc`/`RefCell`).

/// Error type shared by every collection.
pub mod error;
/// Listener lists, weak callbacks, and the observable sequence.
pub mod reactive;
/// Bidirectional many-to-many relations.
pub mod relation;
/// Start/stop/step slice addressing.
pub mod slice;

pub use error::{CollectionError, CollectionResult};
pub use reactive::{
    EventKind, ListenerList, ListenerToken, Position, SequenceEvent, Subscription,
    WatchableSequence, WeakCallback,
};
pub use relation::{Items, ManyToMany, ManyToManyConfig, RelationSide, SideIndex, SideKind};
pub use slice::Slice;
