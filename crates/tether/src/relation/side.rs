//! One key's related items, kept in step with the opposite index.
//!
//! # Design
//!
//! Every mutator of [`RelationSide`] runs in phases:
//!
//! 1. apply the local change and compute what was removed and added;
//! 2. mirror it structurally on each affected opposite side (unlink, then
//!    link), creating missing opposite sides on demand;
//! 3. notify this side's listeners, then each touched opposite side once;
//! 4. for checked lists, report repeated keys on this side and the touched
//!    sides.
//!
//! No listener runs before phase 3, so listeners always observe a
//! symmetric relation.
//!
//! Unlink keeps membership consistent when the two sides count
//! differently: if this side still holds the item after a removal, the
//! opposite side loses as many occurrences of this key as were removed
//! (nothing, if it is a set); if the item is gone, every occurrence of this
//! key is purged from the opposite side.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::RelationKey;
use super::index::IndexInner;
use super::items::{Items, tally};
use super::kind::SideKind;
use crate::error::{CollectionError, CollectionResult};
use crate::reactive::{ListenerList, ListenerToken, Subscription, WeakCallback};
use crate::slice::{self, Slice};

struct SideInner<K: RelationKey, T: RelationKey> {
    key: K,
    kind: SideKind,
    other: RefCell<Weak<IndexInner<T, K>>>,
    items: RefCell<Items<T>>,
    listeners: ListenerList<RelationSide<K, T>>,
}

/// Opposite sides touched by one call, in first-touched order.
type Touched<K, T> = Vec<RelationSide<T, K>>;

/// The items related to one key of a [`SideIndex`](super::SideIndex).
///
/// Cloning the handle shares the underlying side.
pub struct RelationSide<K: RelationKey, T: RelationKey> {
    inner: Rc<SideInner<K, T>>,
}

impl<K: RelationKey, T: RelationKey> Clone for RelationSide<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: RelationKey, T: RelationKey> fmt::Debug for RelationSide<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationSide")
            .field("key", &self.inner.key)
            .field("kind", &self.inner.kind)
            .field("items", &*self.inner.items.borrow())
            .finish()
    }
}

impl<K: RelationKey, T: RelationKey> RelationSide<K, T> {
    pub(crate) fn new(key: K, kind: SideKind, other: Weak<IndexInner<T, K>>) -> Self {
        Self {
            inner: Rc::new(SideInner {
                key,
                kind,
                other: RefCell::new(other),
                items: RefCell::new(Items::empty(kind)),
                listeners: ListenerList::new(),
            }),
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// The key this side belongs to.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.inner.key
    }

    #[must_use]
    pub fn kind(&self) -> SideKind {
        self.inner.kind
    }

    /// Number of held elements, counting repeats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.inner.items.borrow().contains(item)
    }

    /// Occurrences of `item`; zero when absent.
    #[must_use]
    pub fn count(&self, item: &T) -> usize {
        self.inner.items.borrow().count(item)
    }

    /// Held elements with repeats. Ordered kinds keep their order.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.inner.items.borrow().elements()
    }

    /// An owned copy of the container.
    #[must_use]
    pub fn snapshot(&self) -> Items<T> {
        self.inner.items.borrow().clone()
    }

    /// Borrow the container for the duration of `f`.
    ///
    /// `f` must not mutate this side.
    pub fn with<R>(&self, f: impl FnOnce(&Items<T>) -> R) -> R {
        let items: Ref<'_, Items<T>> = self.inner.items.borrow();
        f(&items)
    }

    /// Whether the owning relation is gone or this side was removed from
    /// its index.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.inner.other.borrow().strong_count() == 0
    }

    /// Whether both handles name the same side.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Element at `index` of an ordered side.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] on sets and counters,
    /// [`CollectionError::IndexOutOfRange`] past the end.
    pub fn get(&self, index: usize) -> CollectionResult<T> {
        self.read_list("get", |list| {
            slice::check_index(index, list.len())?;
            Ok(list[index].clone())
        })
    }

    /// Elements addressed by `slice` on an ordered side.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] on sets and counters,
    /// [`CollectionError::InvalidSlice`] for a zero step.
    pub fn slice(&self, slice: Slice) -> CollectionResult<Vec<T>> {
        self.read_list("slice", |list| {
            let bounds = slice.indices(list.len())?;
            Ok(slice::read(list, bounds))
        })
    }

    // ── Mutators ────────────────────────────────────────────────────────

    /// Add one occurrence of `item` and relate it back to this key.
    ///
    /// On a set that already holds `item` this does nothing.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Detached`] if the relation is gone,
    /// [`CollectionError::DuplicateKeys`] if a checked list now repeats a key
    /// (the change stays applied).
    pub fn append(&self, item: T) -> CollectionResult {
        let other = self.opposite()?;
        if !self.inner.items.borrow_mut().insert(item.clone()) {
            return Ok(());
        }
        let mut touched = Vec::new();
        self.link(&other, vec![item], &mut touched);
        self.commit("append", touched)
    }

    /// Add every element of `items` as one change.
    ///
    /// # Errors
    ///
    /// As for [`append`](Self::append).
    pub fn extend(&self, items: impl IntoIterator<Item = T>) -> CollectionResult {
        let other = self.opposite()?;
        let added: Vec<T> = {
            let mut mine = self.inner.items.borrow_mut();
            items
                .into_iter()
                .filter(|item| mine.insert(item.clone()))
                .collect()
        };
        if added.is_empty() {
            return Ok(());
        }
        let mut touched = Vec::new();
        self.link(&other, added, &mut touched);
        self.commit("extend", touched)
    }

    /// Remove one occurrence of `item`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if `item` is not held.
    pub fn remove(&self, item: &T) -> CollectionResult {
        let other = self.opposite()?;
        let removed = self.inner.items.borrow_mut().remove_one(item);
        if !removed {
            return Err(CollectionError::not_found(item, self.describe()));
        }
        let mut touched = Vec::new();
        self.unlink(&other, vec![item.clone()], &mut touched);
        self.commit("remove", touched)
    }

    /// Replace the element at `index` of an ordered side.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] on sets and counters,
    /// [`CollectionError::IndexOutOfRange`] past the end.
    pub fn set(&self, index: usize, item: T) -> CollectionResult {
        let other = self.opposite()?;
        let old = self.write_list("set", |list| {
            slice::check_index(index, list.len())?;
            Ok(std::mem::replace(&mut list[index], item.clone()))
        })?;
        if old == item {
            return Ok(());
        }
        let mut touched = Vec::new();
        self.unlink(&other, vec![old], &mut touched);
        self.link(&other, vec![item], &mut touched);
        self.commit("set", touched)
    }

    /// Assign `items` to the positions addressed by `slice`.
    ///
    /// Step-1 slices may change the length; other steps must address
    /// exactly as many positions as `items` holds.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] on sets and counters or for a
    /// resizing extended slice, [`CollectionError::InvalidSlice`] for a
    /// zero step.
    pub fn set_slice(&self, slice: Slice, items: impl IntoIterator<Item = T>) -> CollectionResult {
        let other = self.opposite()?;
        let new: Vec<T> = items.into_iter().collect();
        let old = self.write_list("set_slice", |list| {
            let bounds = slice.indices(list.len())?;
            slice::assign(list, bounds, new.clone())
        })?;
        if old == new {
            return Ok(());
        }
        let (removed, added) = Items::List(old).diff(&Items::List(new));
        let mut touched = Vec::new();
        self.unlink(&other, removed, &mut touched);
        self.link(&other, added, &mut touched);
        self.commit("set_slice", touched)
    }

    /// Remove and return the element at `index` of an ordered side.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] on sets and counters,
    /// [`CollectionError::IndexOutOfRange`] past the end.
    pub fn delete(&self, index: usize) -> CollectionResult<T> {
        let other = self.opposite()?;
        let removed = self.write_list("delete", |list| {
            slice::check_index(index, list.len())?;
            Ok(list.remove(index))
        })?;
        let mut touched = Vec::new();
        self.unlink(&other, vec![removed.clone()], &mut touched);
        self.commit("delete", touched)?;
        Ok(removed)
    }

    /// Remove and return the elements addressed by `slice`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] on sets and counters,
    /// [`CollectionError::InvalidSlice`] for a zero step.
    pub fn delete_slice(&self, slice: Slice) -> CollectionResult<Vec<T>> {
        let other = self.opposite()?;
        let removed = self.write_list("delete_slice", |list| {
            let bounds = slice.indices(list.len())?;
            Ok(slice::delete(list, bounds))
        })?;
        if removed.is_empty() {
            return Ok(removed);
        }
        let mut touched = Vec::new();
        self.unlink(&other, removed.clone(), &mut touched);
        self.commit("delete_slice", touched)?;
        Ok(removed)
    }

    /// Remove every element.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Detached`] if the relation is gone.
    pub fn clear(&self) -> CollectionResult {
        let other = self.opposite()?;
        let old = std::mem::replace(
            &mut *self.inner.items.borrow_mut(),
            Items::empty(self.inner.kind),
        );
        if old.is_empty() {
            return Ok(());
        }
        let mut touched = Vec::new();
        self.unlink(&other, old.elements(), &mut touched);
        self.commit("clear", touched)
    }

    /// Replace the whole container, converting `items` to this side's kind.
    ///
    /// Only the multiset difference between old and new contents is
    /// mirrored on the opposite side.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Detached`] if the relation is gone,
    /// [`CollectionError::DuplicateKeys`] if a checked list now repeats a key.
    pub fn replace(&self, items: Items<T>) -> CollectionResult {
        self.replace_as("replace", items)
    }

    // ── Algebra ─────────────────────────────────────────────────────────

    /// Contents followed by `other` (lists) or summed (counters).
    ///
    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] where the operation is undefined.
    pub fn concat(&self, other: &Items<T>) -> CollectionResult<Items<T>> {
        self.inner.items.borrow().concat(other)
    }

    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] where the operation is undefined.
    pub fn union(&self, other: &Items<T>) -> CollectionResult<Items<T>> {
        self.inner.items.borrow().union(other)
    }

    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] where the operation is undefined.
    pub fn intersection(&self, other: &Items<T>) -> CollectionResult<Items<T>> {
        self.inner.items.borrow().intersection(other)
    }

    /// # Errors
    ///
    /// [`CollectionError::Unsupported`] where the operation is undefined.
    pub fn symmetric_difference(&self, other: &Items<T>) -> CollectionResult<Items<T>> {
        self.inner.items.borrow().symmetric_difference(other)
    }

    /// [`concat`](Self::concat) assigned back through [`replace`](Self::replace).
    ///
    /// # Errors
    ///
    /// As for [`concat`](Self::concat) and [`replace`](Self::replace).
    pub fn concat_in_place(&self, other: &Items<T>) -> CollectionResult {
        let new = self.concat(other)?;
        self.replace_as("concat_in_place", new)
    }

    /// # Errors
    ///
    /// As for [`union`](Self::union) and [`replace`](Self::replace).
    pub fn union_in_place(&self, other: &Items<T>) -> CollectionResult {
        let new = self.union(other)?;
        self.replace_as("union_in_place", new)
    }

    /// # Errors
    ///
    /// As for [`intersection`](Self::intersection) and [`replace`](Self::replace).
    pub fn intersection_in_place(&self, other: &Items<T>) -> CollectionResult {
        let new = self.intersection(other)?;
        self.replace_as("intersection_in_place", new)
    }

    /// # Errors
    ///
    /// As for [`symmetric_difference`](Self::symmetric_difference) and
    /// [`replace`](Self::replace).
    pub fn symmetric_difference_in_place(&self, other: &Items<T>) -> CollectionResult {
        let new = self.symmetric_difference(other)?;
        self.replace_as("symmetric_difference_in_place", new)
    }

    // ── Listeners ───────────────────────────────────────────────────────

    /// Register a listener called with this side after each change.
    pub fn add_listener(&self, listener: impl Fn(&Self) + 'static) -> ListenerToken {
        self.inner.listeners.add(listener)
    }

    /// Register a method on a weakly held owner.
    pub fn add_weak_listener<O: ?Sized + 'static>(
        &self,
        callback: WeakCallback<O, Self>,
    ) -> ListenerToken {
        self.inner.listeners.add_weak(callback)
    }

    /// Register a listener removed when the returned guard drops.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn subscribe(&self, listener: impl Fn(&Self) + 'static) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    /// # Errors
    ///
    /// [`CollectionError::ListenerNotFound`] if `token` is not registered.
    pub fn remove_listener(&self, token: ListenerToken) -> CollectionResult {
        self.inner.listeners.remove(token)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn describe(&self) -> String {
        format!("RelationSide({:?})", self.inner.key)
    }

    /// Cut the link to the opposite index; later mutators fail with
    /// `Detached`.
    pub(crate) fn detach(&self) {
        *self.inner.other.borrow_mut() = Weak::new();
    }

    fn opposite(&self) -> CollectionResult<Rc<IndexInner<T, K>>> {
        self.inner
            .other
            .borrow()
            .upgrade()
            .ok_or_else(|| CollectionError::Detached {
                collection: self.describe(),
            })
    }

    fn unordered(&self, op: &str) -> CollectionError {
        CollectionError::unsupported(format!(
            "{op} requires an ordered side, {} is {}",
            self.describe(),
            self.inner.kind
        ))
    }

    fn read_list<R>(
        &self,
        op: &str,
        f: impl FnOnce(&[T]) -> CollectionResult<R>,
    ) -> CollectionResult<R> {
        let items = self.inner.items.borrow();
        match items.as_list() {
            Some(list) => f(list),
            None => Err(self.unordered(op)),
        }
    }

    fn write_list<R>(
        &self,
        op: &str,
        f: impl FnOnce(&mut Vec<T>) -> CollectionResult<R>,
    ) -> CollectionResult<R> {
        let mut items = self.inner.items.borrow_mut();
        match items.as_list_mut() {
            Some(list) => f(list),
            None => Err(self.unordered(op)),
        }
    }

    fn replace_as(&self, op: &'static str, items: Items<T>) -> CollectionResult {
        let other = self.opposite()?;
        let new = items.into_kind(self.inner.kind);
        let (removed, added) = {
            let mut mine = self.inner.items.borrow_mut();
            if *mine == new {
                return Ok(());
            }
            let diff = mine.diff(&new);
            *mine = new;
            diff
        };
        let mut touched = Vec::new();
        self.unlink(&other, removed, &mut touched);
        self.link(&other, added, &mut touched);
        self.commit(op, touched)
    }

    /// Insert this key once per added element on the opposite sides.
    fn link(&self, other: &IndexInner<T, K>, added: Vec<T>, touched: &mut Touched<K, T>) {
        if added.is_empty() {
            return;
        }
        tracing::trace!(key = ?self.inner.key, count = added.len(), "link");
        for (item, n) in tally(added) {
            let peer = other.get_or_create(&item);
            let mut changed = false;
            {
                let mut theirs = peer.inner.items.borrow_mut();
                for _ in 0..n {
                    changed |= theirs.insert(self.inner.key.clone());
                }
            }
            if changed {
                touch(touched, peer);
            }
        }
    }

    /// Withdraw this key from the opposite sides of removed elements.
    fn unlink(&self, other: &IndexInner<T, K>, removed: Vec<T>, touched: &mut Touched<K, T>) {
        if removed.is_empty() {
            return;
        }
        tracing::trace!(key = ?self.inner.key, count = removed.len(), "unlink");
        for (item, n) in tally(removed) {
            let still_held = self.inner.items.borrow().contains(&item);
            let peer = other.get_or_create(&item);
            let changed = {
                let mut theirs = peer.inner.items.borrow_mut();
                if !still_held {
                    theirs.purge(&self.inner.key) > 0
                } else if peer.inner.kind == SideKind::Set {
                    false
                } else {
                    let mut changed = false;
                    for _ in 0..n {
                        changed |= theirs.remove_one(&self.inner.key);
                    }
                    changed
                }
            };
            if changed {
                touch(touched, peer);
            }
        }
    }

    /// Notify, then check for repeats.
    fn commit(&self, op: &'static str, touched: Touched<K, T>) -> CollectionResult {
        tracing::trace!(key = ?self.inner.key, op, peers = touched.len(), "notify");
        self.notify();
        for peer in &touched {
            peer.notify();
        }
        self.check(op)?;
        for peer in &touched {
            peer.check("link")?;
        }
        Ok(())
    }

    fn notify(&self) {
        self.inner.listeners.notify(self);
    }

    fn check(&self, op: &str) -> CollectionResult {
        if self.inner.kind != SideKind::CheckedList {
            return Ok(());
        }
        let repeats = self.inner.items.borrow().duplicates();
        if repeats.is_empty() {
            return Ok(());
        }
        tracing::warn!(key = ?self.inner.key, op, ?repeats, "repeated keys in checked list");
        Err(CollectionError::DuplicateKeys {
            operation: op.to_string(),
            values: repeats.iter().map(|v| format!("{v:?}")).collect(),
        })
    }
}

fn touch<K: RelationKey, T: RelationKey>(touched: &mut Touched<K, T>, peer: RelationSide<T, K>) {
    if !touched.iter().any(|seen| seen.ptr_eq(&peer)) {
        touched.push(peer);
    }
}
