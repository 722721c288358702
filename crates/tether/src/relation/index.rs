//! Key → side mapping for one half of a relation.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use super::RelationKey;
use super::items::Items;
use super::kind::SideKind;
use super::side::RelationSide;
use crate::error::{CollectionError, CollectionResult};

pub(crate) struct IndexInner<K: RelationKey, T: RelationKey> {
    kind: SideKind,
    sides: RefCell<FxHashMap<K, RelationSide<K, T>>>,
    other: RefCell<Weak<IndexInner<T, K>>>,
}

impl<K: RelationKey, T: RelationKey> IndexInner<K, T> {
    /// The side for `key`, created empty on first use.
    pub(crate) fn get_or_create(&self, key: &K) -> RelationSide<K, T> {
        if let Some(side) = self.sides.borrow().get(key) {
            return side.clone();
        }
        tracing::debug!(?key, kind = %self.kind, "creating relation side");
        let side = RelationSide::new(key.clone(), self.kind, self.other.borrow().clone());
        self.sides.borrow_mut().insert(key.clone(), side.clone());
        side
    }
}

/// One half of a [`ManyToMany`](super::ManyToMany): every key of this half
/// mapped to its [`RelationSide`].
///
/// Sides are created lazily by [`get_or_create`](Self::get_or_create), both
/// by callers and by the opposite half when it links a new key.
pub struct SideIndex<K: RelationKey, T: RelationKey> {
    inner: Rc<IndexInner<K, T>>,
}

impl<K: RelationKey, T: RelationKey> fmt::Debug for SideIndex<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideIndex")
            .field("kind", &self.inner.kind)
            .field("len", &self.len())
            .finish()
    }
}

impl<K: RelationKey, T: RelationKey> SideIndex<K, T> {
    pub(crate) fn new(kind: SideKind) -> Self {
        Self {
            inner: Rc::new(IndexInner {
                kind,
                sides: RefCell::new(FxHashMap::default()),
                other: RefCell::new(Weak::new()),
            }),
        }
    }

    /// Point each index at the other. Called once, before any side exists.
    pub(crate) fn link_to(&self, other: &SideIndex<T, K>) {
        *self.inner.other.borrow_mut() = Rc::downgrade(&other.inner);
        *other.inner.other.borrow_mut() = Rc::downgrade(&self.inner);
    }

    /// Container kind of every side in this index.
    #[must_use]
    pub fn kind(&self) -> SideKind {
        self.inner.kind
    }

    /// The side for `key`, created empty if absent.
    pub fn get_or_create(&self, key: K) -> RelationSide<K, T> {
        self.inner.get_or_create(&key)
    }

    /// The side for `key`, without creating it.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if no side exists for `key`.
    pub fn get(&self, key: &K) -> CollectionResult<RelationSide<K, T>> {
        self.inner
            .sides
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| CollectionError::not_found(key, "SideIndex"))
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.sides.borrow().contains_key(key)
    }

    /// Replace everything related to `key` with `items`.
    ///
    /// Equal contents leave the side untouched and notify nobody.
    ///
    /// # Errors
    ///
    /// As for [`RelationSide::replace`].
    pub fn assign(&self, key: K, items: impl IntoIterator<Item = T>) -> CollectionResult {
        let side = self.get_or_create(key);
        side.replace(Items::collect(self.inner.kind, items))
    }

    /// Drop the side for `key` and unlink everything related to it.
    ///
    /// The key leaves the index even when unlinking reports an error. The
    /// returned handle is empty and detached: its mutators fail with
    /// [`CollectionError::Detached`].
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] if no side exists for `key`, or any
    /// error from [`RelationSide::clear`].
    pub fn remove(&self, key: &K) -> CollectionResult<RelationSide<K, T>> {
        let side = self
            .inner
            .sides
            .borrow_mut()
            .remove(key)
            .ok_or_else(|| CollectionError::not_found(key, "SideIndex"))?;
        let cleared = side.clear();
        side.detach();
        tracing::debug!(?key, "removed relation side");
        cleared.map(|()| side)
    }

    /// Number of sides, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sides.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.sides.borrow().is_empty()
    }

    /// Keys with a side, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.sides.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn sides(&self) -> Vec<RelationSide<K, T>> {
        self.inner.sides.borrow().values().cloned().collect()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<(K, RelationSide<K, T>)> {
        self.inner
            .sides
            .borrow()
            .iter()
            .map(|(k, side)| (k.clone(), side.clone()))
            .collect()
    }

    /// The opposite index.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Detached`] once the owning relation is dropped.
    pub fn other(&self) -> CollectionResult<SideIndex<T, K>> {
        self.inner
            .other
            .borrow()
            .upgrade()
            .map(|inner| SideIndex { inner })
            .ok_or_else(|| CollectionError::Detached {
                collection: "SideIndex".into(),
            })
    }
}
