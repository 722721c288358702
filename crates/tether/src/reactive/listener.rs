#![forbid(unsafe_code)]

//! Listener registrations with weak and strong ownership.
//!
//! # Design
//!
//! A [`ListenerList<S>`] holds callbacks notified with a subject `&S`, in
//! registration order. Every entry reports whether its target is still alive
//! when called; entries whose target is gone are pruned after the pass, with
//! no error.
//!
//! Three registration styles:
//!
//! - [`ListenerList::add`]: a strongly held closure, removed only through
//!   [`ListenerList::remove`].
//! - [`ListenerList::add_weak`]: a [`WeakCallback`] bound to an owner held by
//!   `Weak`. Once the owner is dropped the callback stops firing and the entry
//!   disappears on the next notification.
//! - [`ListenerList::subscribe`]: a closure kept alive by the returned
//!   [`Subscription`] guard; dropping the guard unsubscribes.
//!
//! When the list itself is dropped (with the collection that owns it), every
//! registration goes with it.
//!
//! # Failure Modes
//!
//! - **Explicit removal of an unknown token** fails with
//!   [`CollectionError::ListenerNotFound`]. Pruning of dead entries never
//!   fails, even if the entry was already removed.
//! - **Strong cycles**: a strongly held closure that captures its own
//!   collection keeps both alive. Bind such listeners with
//!   [`ListenerList::add_weak`] instead.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{CollectionError, CollectionResult};

/// A stored callback. Returns `false` once its target is gone.
type Callback<S> = Rc<dyn Fn(&S) -> bool>;

/// Handle naming one registration in a [`ListenerList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerToken(u64);

/// A method bound to a weakly held owner.
///
/// Calling it invokes the method only while the owner is alive; afterwards
/// the call is a no-op that reports `false`.
pub struct WeakCallback<O: ?Sized, S: ?Sized> {
    owner: Weak<O>,
    method: Rc<dyn Fn(&O, &S)>,
}

impl<O: ?Sized, S: ?Sized> Clone for WeakCallback<O, S> {
    fn clone(&self) -> Self {
        Self {
            owner: Weak::clone(&self.owner),
            method: Rc::clone(&self.method),
        }
    }
}

impl<O: ?Sized, S: ?Sized> fmt::Debug for WeakCallback<O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCallback")
            .field("alive", &(self.owner.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

impl<O: ?Sized + 'static, S: ?Sized + 'static> WeakCallback<O, S> {
    /// Bind `method` to `owner` without keeping `owner` alive.
    #[must_use]
    pub fn new(owner: &Rc<O>, method: impl Fn(&O, &S) + 'static) -> Self {
        Self {
            owner: Rc::downgrade(owner),
            method: Rc::new(method),
        }
    }

    /// Invoke the method if the owner is alive. Returns whether it was.
    pub fn call(&self, subject: &S) -> bool {
        match self.owner.upgrade() {
            Some(owner) => {
                (self.method)(&owner, subject);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

/// Ordered listener registrations for one subject type.
pub struct ListenerList<S: ?Sized> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(ListenerToken, Callback<S>)>>,
}

impl<S: ?Sized> Default for ListenerList<S> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<S: ?Sized> fmt::Debug for ListenerList<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.entries.borrow().len())
            .finish()
    }
}

impl<S: ?Sized + 'static> ListenerList<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strongly held closure.
    pub fn add(&self, listener: impl Fn(&S) + 'static) -> ListenerToken {
        self.push(Rc::new(move |subject: &S| {
            listener(subject);
            true
        }))
    }

    /// Register a method bound to a weakly held owner.
    pub fn add_weak<O: ?Sized + 'static>(&self, callback: WeakCallback<O, S>) -> ListenerToken {
        self.push(Rc::new(move |subject: &S| callback.call(subject)))
    }

    /// Register a closure that lives exactly as long as the returned guard.
    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> Subscription {
        let strong: Rc<dyn Fn(&S)> = Rc::new(listener);
        let weak = Rc::downgrade(&strong);
        let token = self.push(Rc::new(move |subject: &S| match weak.upgrade() {
            Some(cb) => {
                cb(subject);
                true
            }
            None => false,
        }));
        Subscription {
            token,
            _guard: Box::new(strong),
        }
    }

    fn push(&self, callback: Callback<S>) -> ListenerToken {
        let token = ListenerToken(self.next_id.get());
        self.next_id.set(token.0 + 1);
        self.entries.borrow_mut().push((token, callback));
        token
    }

    /// Remove a registration.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::ListenerNotFound`] if `token` is not
    /// currently registered.
    pub fn remove(&self, token: ListenerToken) -> CollectionResult {
        if self.discard(token) {
            Ok(())
        } else {
            Err(CollectionError::ListenerNotFound(token))
        }
    }

    /// Remove a registration if present.
    fn discard(&self, token: ListenerToken) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(t, _)| *t != token);
        entries.len() != before
    }

    /// Whether `token` names a current registration.
    #[must_use]
    pub fn contains(&self, token: ListenerToken) -> bool {
        self.entries.borrow().iter().any(|(t, _)| *t == token)
    }

    /// Number of registrations, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Call every registration with `subject`, then prune the dead ones.
    ///
    /// No borrow is held while callbacks run, so a callback may register,
    /// remove, or trigger further notifications.
    pub fn notify(&self, subject: &S) {
        let callbacks: Vec<(ListenerToken, Callback<S>)> = self.entries.borrow().clone();
        let mut dead = Vec::new();
        for (token, cb) in &callbacks {
            if !cb(subject) {
                dead.push(*token);
            }
        }
        for token in dead {
            // A reentrant call may have removed it already.
            if self.discard(token) {
                tracing::trace!(?token, "pruned dead listener");
            }
        }
    }
}

/// RAII guard for a [`ListenerList::subscribe`] registration.
///
/// Dropping the guard drops the only strong reference to the closure, so the
/// registration stops firing and is pruned on the next notification.
pub struct Subscription {
    token: ListenerToken,
    /// Type-erased strong reference keeping the callback `Rc` alive.
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    #[must_use]
    pub fn token(&self) -> ListenerToken {
        self.token
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
