#![forbid(unsafe_code)]

//! Bidirectional many-to-many relations.
//!
//! A [`ManyToMany<L, R>`] pairs two [`SideIndex`]es. Each key on a side owns
//! a [`RelationSide`] listing the opposite side's keys related to it; every
//! mutation of one side is mirrored on the other.
//!
//! # Architecture
//!
//! ```text
//! ManyToMany ──Rc──▶ SideIndex<L, R> ──Rc──▶ RelationSide<L, R> ─┐
//!            ──Rc──▶ SideIndex<R, L> ──Rc──▶ RelationSide<R, L> ─┤
//!                         ▲                                      │
//!                         └────────────── Weak ──────────────────┘
//! ```
//!
//! The `ManyToMany` is the only strong owner. Each side reaches the opposite
//! index through `Weak`, so the pair never forms a cycle.
//!
//! # Invariants
//!
//! 1. **Symmetry**: `r ∈ left[l]` ⇔ `l ∈ right[r]` after every public call.
//! 2. **Two-phase notification**: all structural updates of one call,
//!    on both sides, land before any listener runs.
//! 3. **Notification order**: the mutated side's listeners first, then
//!    each touched opposite side once, in the order they were touched.
//! 4. A call that changes nothing notifies nobody.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Absent item | `remove` of an item not held | `NotFound`, nothing changes |
//! | Positional op on unordered side | `get`/`set`/`delete` on set or counter | `Unsupported`, nothing changes |
//! | Duplicate in checked list | any mutation leaving a repeat | `DuplicateKeys` after the change and its notifications |
//! | Relation dropped | side outlives its `ManyToMany` | `Detached`, nothing changes |

pub mod index;
pub mod items;
pub mod kind;
pub mod many_to_many;
pub mod side;

use std::fmt;
use std::hash::Hash;

pub use index::SideIndex;
pub use items::Items;
pub use kind::{ManyToManyConfig, SideKind};
pub use many_to_many::ManyToMany;
pub use side::RelationSide;

/// Bounds for a key stored on either side of a relation.
pub trait RelationKey: Clone + Eq + Hash + fmt::Debug + 'static {}

impl<T: Clone + Eq + Hash + fmt::Debug + 'static> RelationKey for T {}
