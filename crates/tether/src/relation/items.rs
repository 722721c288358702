//! The container representations behind a relation side.
//!
//! [`Items`] is a plain value: it knows nothing about links or listeners. A
//! `RelationSide` owns one and keeps the opposite side in step with it.
//!
//! | Representation | Kinds | Elements |
//! |----------------|-------|----------|
//! | `List` | list, checked_list | in order, repeats kept |
//! | `Set` | set | each at most once, no order |
//! | `Counter` | counter | each with a positive count, no order |
//!
//! A counter never stores a zero count: absence and count zero coincide.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use super::kind::SideKind;
use crate::error::{CollectionError, CollectionResult};

/// A snapshot-able container of related keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Items<T: Hash + Eq> {
    List(Vec<T>),
    Set(FxHashSet<T>),
    Counter(FxHashMap<T, usize>),
}

impl<T: Clone + Hash + Eq> Items<T> {
    /// An empty container of the representation `kind` uses.
    #[must_use]
    pub fn empty(kind: SideKind) -> Self {
        match kind {
            SideKind::List | SideKind::CheckedList => Self::List(Vec::new()),
            SideKind::Set => Self::Set(FxHashSet::default()),
            SideKind::Counter => Self::Counter(FxHashMap::default()),
        }
    }

    /// Collect `items` into the representation `kind` uses.
    pub fn collect(kind: SideKind, items: impl IntoIterator<Item = T>) -> Self {
        let mut out = Self::empty(kind);
        for item in items {
            out.insert(item);
        }
        out
    }

    /// The same elements in the representation `kind` uses.
    #[must_use]
    pub fn to_kind(&self, kind: SideKind) -> Self {
        Self::collect(kind, self.elements())
    }

    /// `self` if it already uses `kind`'s representation, else converted.
    #[must_use]
    pub fn into_kind(self, kind: SideKind) -> Self {
        let target = Self::empty(kind);
        if std::mem::discriminant(&self) == std::mem::discriminant(&target) {
            self
        } else {
            self.to_kind(kind)
        }
    }

    /// Name of the representation, for messages.
    #[must_use]
    pub fn repr_name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Counter(_) => "counter",
        }
    }

    /// Number of elements (a counter counts repeats).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(v) => v.len(),
            Self::Set(s) => s.len(),
            Self::Counter(c) => c.values().sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(v) => v.is_empty(),
            Self::Set(s) => s.is_empty(),
            Self::Counter(c) => c.is_empty(),
        }
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        match self {
            Self::List(v) => v.contains(item),
            Self::Set(s) => s.contains(item),
            Self::Counter(c) => c.contains_key(item),
        }
    }

    /// Occurrences of `item`.
    #[must_use]
    pub fn count(&self, item: &T) -> usize {
        match self {
            Self::List(v) => v.iter().filter(|x| *x == item).count(),
            Self::Set(s) => usize::from(s.contains(item)),
            Self::Counter(c) => c.get(item).copied().unwrap_or(0),
        }
    }

    /// Every element; a counter repeats each key by its count.
    #[must_use]
    pub fn elements(&self) -> Vec<T> {
        match self {
            Self::List(v) => v.clone(),
            Self::Set(s) => s.iter().cloned().collect(),
            Self::Counter(c) => c
                .iter()
                .flat_map(|(k, n)| std::iter::repeat_n(k.clone(), *n))
                .collect(),
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[T]> {
        match self {
            Self::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn as_list_mut(&mut self) -> Option<&mut Vec<T>> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Add one occurrence. Returns `false` if a set already held it.
    pub fn insert(&mut self, item: T) -> bool {
        match self {
            Self::List(v) => {
                v.push(item);
                true
            }
            Self::Set(s) => s.insert(item),
            Self::Counter(c) => {
                *c.entry(item).or_insert(0) += 1;
                true
            }
        }
    }

    /// Remove one occurrence (the first, for a list). Returns whether one
    /// was present.
    pub fn remove_one(&mut self, item: &T) -> bool {
        match self {
            Self::List(v) => match v.iter().position(|x| x == item) {
                Some(i) => {
                    v.remove(i);
                    true
                }
                None => false,
            },
            Self::Set(s) => s.remove(item),
            Self::Counter(c) => match c.get_mut(item) {
                Some(n) if *n > 1 => {
                    *n -= 1;
                    true
                }
                Some(_) => {
                    c.remove(item);
                    true
                }
                None => false,
            },
        }
    }

    /// Remove every occurrence. Returns how many there were.
    pub fn purge(&mut self, item: &T) -> usize {
        match self {
            Self::List(v) => {
                let before = v.len();
                v.retain(|x| x != item);
                before - v.len()
            }
            Self::Set(s) => usize::from(s.remove(item)),
            Self::Counter(c) => c.remove(item).unwrap_or(0),
        }
    }

    /// Repeated elements of a list: a value held `n` times appears `n - 1`
    /// times, in first-seen order. Always empty for sets and counters.
    #[must_use]
    pub fn duplicates(&self) -> Vec<T> {
        let Self::List(v) = self else {
            return Vec::new();
        };
        tally(v.iter().cloned())
            .into_iter()
            .flat_map(|(item, n)| std::iter::repeat_n(item, n - 1))
            .collect()
    }

    /// Multiset difference against `new`: elements only `self` has
    /// (in `self` order) and elements only `new` has (in `new` order).
    #[must_use]
    pub fn diff(&self, new: &Self) -> (Vec<T>, Vec<T>) {
        fn surplus<T: Clone + Hash + Eq>(from: &[T], against: &[T]) -> Vec<T> {
            let mut budget: FxHashMap<&T, isize> = FxHashMap::default();
            for item in from {
                *budget.entry(item).or_insert(0) += 1;
            }
            for item in against {
                if let Some(n) = budget.get_mut(item) {
                    *n -= 1;
                }
            }
            from.iter()
                .filter(|item| match budget.get_mut(*item) {
                    Some(n) if *n > 0 => {
                        *n -= 1;
                        true
                    }
                    _ => false,
                })
                .cloned()
                .collect()
        }
        let old = self.elements();
        let new = new.elements();
        (surplus(&old, &new), surplus(&new, &old))
    }

    /// `self + other`: a list appends, a counter adds counts.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] for a set.
    pub fn concat(&self, other: &Self) -> CollectionResult<Self> {
        match self {
            Self::List(v) => {
                let mut out = v.clone();
                out.extend(other.elements());
                Ok(Self::List(out))
            }
            Self::Counter(_) => {
                let mut out = self.clone();
                for item in other.elements() {
                    out.insert(item);
                }
                Ok(out)
            }
            Self::Set(_) => Err(self.undefined("concat")),
        }
    }

    /// `self | other`: set union, or per-key maximum for a counter.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] for a list.
    pub fn union(&self, other: &Self) -> CollectionResult<Self> {
        match self {
            Self::Set(s) => Ok(Self::Set(s.union(&other.key_set()).cloned().collect())),
            Self::Counter(c) => {
                let mut out = c.clone();
                for (item, n) in other.key_counts() {
                    let slot = out.entry(item).or_insert(0);
                    *slot = (*slot).max(n);
                }
                Ok(Self::Counter(out))
            }
            Self::List(_) => Err(self.undefined("union")),
        }
    }

    /// `self & other`: set intersection, or per-key minimum for a counter.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] for a list.
    pub fn intersection(&self, other: &Self) -> CollectionResult<Self> {
        match self {
            Self::Set(s) => Ok(Self::Set(
                s.intersection(&other.key_set()).cloned().collect(),
            )),
            Self::Counter(c) => {
                let theirs = other.key_counts();
                Ok(Self::Counter(
                    c.iter()
                        .filter_map(|(item, n)| {
                            let m = theirs.get(item).copied().unwrap_or(0).min(*n);
                            (m > 0).then(|| (item.clone(), m))
                        })
                        .collect(),
                ))
            }
            Self::List(_) => Err(self.undefined("intersection")),
        }
    }

    /// `self ^ other`: set symmetric difference.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] for a list or counter.
    pub fn symmetric_difference(&self, other: &Self) -> CollectionResult<Self> {
        match self {
            Self::Set(s) => Ok(Self::Set(
                s.symmetric_difference(&other.key_set()).cloned().collect(),
            )),
            _ => Err(self.undefined("symmetric_difference")),
        }
    }

    fn key_set(&self) -> FxHashSet<T> {
        match self {
            Self::Set(s) => s.clone(),
            _ => self.elements().into_iter().collect(),
        }
    }

    fn key_counts(&self) -> FxHashMap<T, usize> {
        match self {
            Self::Counter(c) => c.clone(),
            _ => {
                let mut out = FxHashMap::default();
                for item in self.elements() {
                    *out.entry(item).or_insert(0) += 1;
                }
                out
            }
        }
    }

    fn undefined(&self, op: &str) -> CollectionError {
        CollectionError::unsupported(format!("{op} is not defined for {}", self.repr_name()))
    }
}

/// Group `items` by value, preserving first-seen order.
pub(crate) fn tally<T: Clone + Hash + Eq>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut slots: FxHashMap<T, usize> = FxHashMap::default();
    let mut out: Vec<(T, usize)> = Vec::new();
    for item in items {
        match slots.get(&item) {
            Some(&i) => out[i].1 += 1,
            None => {
                slots.insert(item.clone(), out.len());
                out.push((item, 1));
            }
        }
    }
    out
}
