#![forbid(unsafe_code)]

//! Observable list with structured change events.
//!
//! # Design
//!
//! [`WatchableSequence<T>`] keeps its elements in shared storage
//! (`Rc<..>`); cloning the handle shares contents and observers. Every
//! mutator validates its arguments, opens an [`EventScope`] describing the
//! change, applies it, and closes the scope, which publishes a
//! [`SequenceEvent`] to observers.
//!
//! Slice assignment with unequal lengths is split into simpler events: an
//! `Update` of the overlapping prefix, then a `Delete` (shrink) or an
//! `Insert` (grow) of the remainder. Only step-1 slices may be resized.
//!
//! # Invariants
//!
//! 1. Observers run after the mutation is applied, with no borrow held.
//! 2. A call that fails validation publishes nothing.
//! 3. A call that changes nothing (empty range, empty extend) publishes
//!    nothing.
//! 4. `version()` counts published events.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::listener::{ListenerToken, Subscription, WeakCallback};
use super::watchable::{EventScope, Watchable};
use crate::error::{CollectionError, CollectionResult};
use crate::slice::{self, Slice};

/// Where an event applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Index(usize),
    Slice(Slice),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Slice(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Update,
    Insert,
    Delete,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Insert => "insert",
            Self::Delete => "del",
        }
    }
}

/// A change published by a [`WatchableSequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceEvent<T> {
    /// Elements at `position` were overwritten with `values`.
    Update { position: Position, values: Vec<T> },
    /// `values` were inserted starting at `index`.
    Insert { index: usize, values: Vec<T> },
    /// Elements at `position` were removed.
    Delete { position: Position },
}

impl<T> SequenceEvent<T> {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Update { .. } => EventKind::Update,
            Self::Insert { .. } => EventKind::Insert,
            Self::Delete { .. } => EventKind::Delete,
        }
    }
}

struct SequenceInner<T> {
    contents: RefCell<Vec<T>>,
    watch: Watchable<SequenceEvent<T>>,
}

/// A shared, observable list.
pub struct WatchableSequence<T> {
    inner: Rc<SequenceInner<T>>,
}

impl<T> Clone for WatchableSequence<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for WatchableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchableSequence")
            .field("contents", &self.inner.contents.borrow())
            .field("version", &self.inner.watch.version())
            .finish()
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> Default for WatchableSequence<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> From<Vec<T>> for WatchableSequence<T> {
    fn from(contents: Vec<T>) -> Self {
        Self::new(contents)
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> FromIterator<T> for WatchableSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> WatchableSequence<T> {
    #[must_use]
    pub fn new(contents: Vec<T>) -> Self {
        Self {
            inner: Rc::new(SequenceInner {
                contents: RefCell::new(contents),
                watch: Watchable::new(),
            }),
        }
    }

    fn scope(&self, event: SequenceEvent<T>) -> EventScope<'_, SequenceEvent<T>> {
        self.inner.watch.scope(event)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.contents.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.contents.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.contents.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.contents.borrow().clone()
    }

    /// Access the elements by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.contents.borrow())
    }

    /// Elements addressed by `slice`, in slice order.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidSlice`] for a zero step.
    pub fn slice(&self, slice: Slice) -> CollectionResult<Vec<T>> {
        let contents = self.inner.contents.borrow();
        let bounds = slice.indices(contents.len())?;
        Ok(slice::read(&contents, bounds))
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.contents.borrow().contains(value)
    }

    /// Overwrite the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfRange`] past the end.
    pub fn set(&self, index: usize, value: T) -> CollectionResult {
        slice::check_index(index, self.len())?;
        let _scope = self.scope(SequenceEvent::Update {
            position: Position::Index(index),
            values: vec![value.clone()],
        });
        self.inner.contents.borrow_mut()[index] = value;
        Ok(())
    }

    /// Assign `values` to the positions addressed by `slice`.
    ///
    /// Equal lengths publish one `Update`. A step-1 slice longer than
    /// `values` publishes an `Update` of the prefix then a `Delete` of the
    /// rest; a shorter one publishes an `Update` then an `Insert`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::Unsupported`] when the lengths differ and
    /// the step is not 1, and [`CollectionError::InvalidSlice`] for a zero
    /// step.
    pub fn set_slice(&self, slice: Slice, values: impl IntoIterator<Item = T>) -> CollectionResult {
        let values: Vec<T> = values.into_iter().collect();
        let bounds = slice.indices(self.len())?;
        let span = bounds.len();

        if span == values.len() {
            if span == 0 {
                return Ok(());
            }
            let _scope = self.scope(SequenceEvent::Update {
                position: Position::Slice(slice),
                values: values.clone(),
            });
            let mut contents = self.inner.contents.borrow_mut();
            for (i, value) in bounds.positions().into_iter().zip(values) {
                contents[i] = value;
            }
            return Ok(());
        }

        let start = bounds.start as usize;
        if span > values.len() {
            if bounds.step != 1 {
                return Err(CollectionError::unsupported(
                    "shrinking extended slices unsupported",
                ));
            }
            tracing::debug!(%slice, span, new_len = values.len(), "shrinking slice assignment");
            let split = start + values.len();
            self.set_slice(Slice::span(start, split), values)?;
            self.delete_slice(Slice::span(split, start + span))?;
            return Ok(());
        }

        if bounds.step != 1 {
            return Err(CollectionError::unsupported(
                "growing extended slices unsupported",
            ));
        }
        tracing::debug!(%slice, span, new_len = values.len(), "growing slice assignment");
        let mut head = values;
        let tail = head.split_off(span);
        let insert_at = start + span;
        self.set_slice(Slice::span(start, insert_at), head)?;
        let _scope = self.scope(SequenceEvent::Insert {
            index: insert_at,
            values: tail.clone(),
        });
        let mut contents = self.inner.contents.borrow_mut();
        let rest = contents.split_off(insert_at);
        contents.extend(tail);
        contents.extend(rest);
        Ok(())
    }

    /// Remove the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::IndexOutOfRange`] past the end.
    pub fn delete(&self, index: usize) -> CollectionResult<T> {
        slice::check_index(index, self.len())?;
        let _scope = self.scope(SequenceEvent::Delete {
            position: Position::Index(index),
        });
        let removed = self.inner.contents.borrow_mut().remove(index);
        Ok(removed)
    }

    /// Remove the elements addressed by `slice`, returning them in slice
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidSlice`] for a zero step.
    pub fn delete_slice(&self, slice: Slice) -> CollectionResult<Vec<T>> {
        let bounds = slice.indices(self.len())?;
        if bounds.is_empty() {
            return Ok(Vec::new());
        }
        let _scope = self.scope(SequenceEvent::Delete {
            position: Position::Slice(slice),
        });
        let removed = slice::delete(&mut self.inner.contents.borrow_mut(), bounds);
        Ok(removed)
    }

    pub fn append(&self, value: T) {
        let _scope = self.scope(SequenceEvent::Insert {
            index: self.len(),
            values: vec![value.clone()],
        });
        self.inner.contents.borrow_mut().push(value);
    }

    pub fn extend(&self, values: impl IntoIterator<Item = T>) {
        let values: Vec<T> = values.into_iter().collect();
        if values.is_empty() {
            return;
        }
        let _scope = self.scope(SequenceEvent::Insert {
            index: self.len(),
            values: values.clone(),
        });
        self.inner.contents.borrow_mut().extend(values);
    }

    /// Remove the first element equal to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::NotFound`] if no element matches.
    pub fn remove(&self, value: &T) -> CollectionResult<T> {
        let index = self
            .inner
            .contents
            .borrow()
            .iter()
            .position(|v| v == value);
        match index {
            Some(index) => self.delete(index),
            None => Err(CollectionError::not_found(value, "WatchableSequence")),
        }
    }

    /// Observe changes for as long as the returned guard lives.
    pub fn subscribe(&self, observer: impl Fn(&SequenceEvent<T>) + 'static) -> Subscription {
        self.inner.watch.observers().subscribe(observer)
    }

    /// Observe changes until explicitly removed.
    pub fn add_listener(&self, observer: impl Fn(&SequenceEvent<T>) + 'static) -> ListenerToken {
        self.inner.watch.observers().add(observer)
    }

    /// Observe changes while `callback`'s owner is alive.
    pub fn add_weak_listener<O: ?Sized + 'static>(
        &self,
        callback: WeakCallback<O, SequenceEvent<T>>,
    ) -> ListenerToken {
        self.inner.watch.observers().add_weak(callback)
    }

    /// # Errors
    ///
    /// Returns [`CollectionError::ListenerNotFound`] if `token` is not
    /// registered.
    pub fn remove_listener(&self, token: ListenerToken) -> CollectionResult {
        self.inner.watch.observers().remove(token)
    }

    /// Number of events published so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.watch.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<SequenceEvent<i32>>>>;

    fn recorded(seq: &WatchableSequence<i32>) -> (Log, Subscription) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let sub = seq.subscribe(move |e| log_clone.borrow_mut().push(e.clone()));
        (log, sub)
    }

    #[test]
    fn reads_behave_like_a_list() {
        let seq = WatchableSequence::new(vec![1, 2, 3]);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.get(1), Some(2));
        assert_eq!(seq.get(3), None);
        assert_eq!(seq.slice(Slice::starting(1)).unwrap(), vec![2, 3]);
        assert_eq!(seq.with(|s| s.iter().sum::<i32>()), 6);
    }

    #[test]
    fn shrinking_slice_emits_update_then_delete() {
        let seq = WatchableSequence::new(vec![1, 2, 3, 4]);
        let (log, _sub) = recorded(&seq);

        seq.set_slice(Slice::new(1, 3), [10]).unwrap();

        assert_eq!(seq.to_vec(), vec![1, 10, 4]);
        assert_eq!(
            *log.borrow(),
            vec![
                SequenceEvent::Update {
                    position: Position::Slice(Slice::new(1, 2)),
                    values: vec![10],
                },
                SequenceEvent::Delete {
                    position: Position::Slice(Slice::new(2, 3)),
                },
            ]
        );
    }

    #[test]
    fn growing_slice_emits_update_then_insert() {
        let seq = WatchableSequence::new(vec![1, 2, 3]);
        let (log, _sub) = recorded(&seq);

        seq.set_slice(Slice::new(1, 2), [7, 8, 9]).unwrap();

        assert_eq!(seq.to_vec(), vec![1, 7, 8, 9, 3]);
        let kinds: Vec<_> = log.borrow().iter().map(SequenceEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::Update, EventKind::Insert]);
        assert_eq!(
            log.borrow()[1],
            SequenceEvent::Insert {
                index: 2,
                values: vec![8, 9],
            }
        );
    }

    #[test]
    fn insertion_at_empty_slice_emits_only_insert() {
        let seq = WatchableSequence::new(vec![1, 2]);
        let (log, _sub) = recorded(&seq);

        seq.set_slice(Slice::new(1, 1), [5]).unwrap();

        assert_eq!(seq.to_vec(), vec![1, 5, 2]);
        assert_eq!(
            *log.borrow(),
            vec![SequenceEvent::Insert {
                index: 1,
                values: vec![5],
            }]
        );
    }

    #[test]
    fn equal_length_extended_slice_is_one_update() {
        let seq = WatchableSequence::new(vec![0, 1, 2, 3]);
        let (log, _sub) = recorded(&seq);

        seq.set_slice(Slice::full().step(2), [9, 9]).unwrap();

        assert_eq!(seq.to_vec(), vec![9, 1, 9, 3]);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].kind(), EventKind::Update);
    }

    #[test]
    fn resizing_extended_slice_is_rejected_without_events() {
        let seq = WatchableSequence::new(vec![0, 1, 2, 3]);
        let (log, _sub) = recorded(&seq);

        assert!(matches!(
            seq.set_slice(Slice::full().step(2), [1]),
            Err(CollectionError::Unsupported(_))
        ));
        assert!(matches!(
            seq.set_slice(Slice::full().step(2), [1, 2, 3]),
            Err(CollectionError::Unsupported(_))
        ));
        assert_eq!(seq.to_vec(), vec![0, 1, 2, 3]);
        assert!(log.borrow().is_empty());
        assert_eq!(seq.version(), 0);
    }

    #[test]
    fn append_extend_remove() {
        let seq = WatchableSequence::new(vec![1]);
        let (log, _sub) = recorded(&seq);

        seq.append(2);
        seq.extend([3, 4]);
        assert_eq!(seq.remove(&3).unwrap(), 3);
        assert_eq!(seq.to_vec(), vec![1, 2, 4]);

        assert_eq!(
            *log.borrow(),
            vec![
                SequenceEvent::Insert {
                    index: 1,
                    values: vec![2],
                },
                SequenceEvent::Insert {
                    index: 2,
                    values: vec![3, 4],
                },
                SequenceEvent::Delete {
                    position: Position::Index(2),
                },
            ]
        );
    }

    #[test]
    fn remove_absent_is_not_found() {
        let seq = WatchableSequence::new(vec![1, 2]);
        assert!(matches!(
            seq.remove(&5),
            Err(CollectionError::NotFound { .. })
        ));
    }

    #[test]
    fn set_out_of_range_publishes_nothing() {
        let seq = WatchableSequence::new(vec![1]);
        assert_eq!(
            seq.set(4, 0),
            Err(CollectionError::IndexOutOfRange { index: 4, len: 1 })
        );
        assert_eq!(seq.version(), 0);
    }

    #[test]
    fn observers_see_applied_state() {
        let seq = WatchableSequence::new(vec![1, 2, 3]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (seen_clone, handle) = (Rc::clone(&seen), seq.clone());
        let _sub = seq.subscribe(move |_| seen_clone.borrow_mut().push(handle.to_vec()));

        seq.delete(0).unwrap();
        assert_eq!(*seen.borrow(), vec![vec![2, 3]]);
    }

    #[test]
    fn clone_shares_contents_and_observers() {
        let a = WatchableSequence::new(vec![1]);
        let b = a.clone();
        let (log, _sub) = recorded(&a);
        b.append(2);
        assert_eq!(a.to_vec(), vec![1, 2]);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(a.version(), 1);
    }

    #[test]
    fn weak_listener_stops_after_owner_drop() {
        struct Counter(std::cell::Cell<u32>);
        let owner = Rc::new(Counter(std::cell::Cell::new(0)));
        let seq = WatchableSequence::new(vec![1]);
        seq.add_weak_listener(WeakCallback::new(
            &owner,
            |c: &Counter, _: &SequenceEvent<i32>| c.0.set(c.0.get() + 1),
        ));

        seq.append(2);
        assert_eq!(owner.0.get(), 1);
        drop(owner);
        seq.append(3);
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn explicit_listener_removal() {
        let seq = WatchableSequence::new(vec![1]);
        let token = seq.add_listener(|_| {});
        assert!(seq.remove_listener(token).is_ok());
        assert!(seq.remove_listener(token).is_err());
    }

    #[test]
    fn debug_shows_contents_and_version() {
        let seq = WatchableSequence::new(vec![7]);
        seq.append(8);
        let shown = format!("{seq:?}");
        assert!(shown.contains("[7, 8]"), "{shown}");
        assert!(shown.contains("version: 1"), "{shown}");
    }
}
