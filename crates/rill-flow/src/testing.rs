#![forbid(unsafe_code)]

//! Test doubles.
//!
//! [`PassiveObserver`] records everything it receives and never requests
//! demand on its own, so a test decides exactly when values may flow. It
//! never drives the coordinator either; the test calls `run`.
//!
//! ```
//! use rill_flow::{Coordinator, ObserverState, PassiveObserver};
//!
//! let ctx = Coordinator::scoped();
//! let snk = PassiveObserver::<i32>::new();
//! ctx.make_observable().empty::<i32>().subscribe(snk.as_observer());
//! ctx.run();
//! assert_eq!(snk.state(), ObserverState::Completed);
//! assert!(snk.buffer().is_empty());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::FlowError;
use crate::observer::{Observer, ObserverState};
use crate::subscription::Subscription;

/// Kind of a received notification, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    Subscribe,
    Next,
    Complete,
    Error,
}

struct Recorded<T> {
    state: ObserverState,
    buf: Vec<T>,
    sub: Option<Subscription>,
    error: Option<FlowError>,
    log: Vec<Notification>,
}

/// Recording observer with manual demand control.
///
/// Cloning creates another handle to the **same** record; pass
/// [`as_observer`](Self::as_observer) to `subscribe` and keep the original
/// for assertions.
pub struct PassiveObserver<T> {
    inner: Rc<RefCell<Recorded<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for PassiveObserver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for PassiveObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PassiveObserver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PassiveObserver")
            .field("state", &inner.state)
            .field("received", &inner.buf.len())
            .field("subscription", &inner.sub)
            .finish()
    }
}

impl<T> PassiveObserver<T> {
    /// Create an idle observer with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Recorded {
                state: ObserverState::Idle,
                buf: Vec::new(),
                sub: None,
                error: None,
                log: Vec::new(),
            })),
        }
    }

    /// Handle to pass to `subscribe`.
    #[must_use]
    pub fn as_observer(&self) -> Self {
        self.clone()
    }

    #[must_use]
    pub fn state(&self) -> ObserverState {
        self.inner.borrow().state
    }

    /// The captured subscription, kept after terminal notification.
    #[must_use]
    pub fn subscription(&self) -> Option<Subscription> {
        self.inner.borrow().sub.clone()
    }

    /// The reason passed to `on_error`, if any.
    #[must_use]
    pub fn error(&self) -> Option<FlowError> {
        self.inner.borrow().error.clone()
    }

    /// Notification kinds in arrival order.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.borrow().log.clone()
    }

    /// Number of values received so far.
    #[must_use]
    pub fn received(&self) -> usize {
        self.inner.borrow().buf.len()
    }

    /// Access the buffer without cloning.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.borrow().buf)
    }

    /// Request `n` values on the captured subscription, if any.
    pub fn request(&self, n: u64) {
        // The record must not be borrowed while the producer reacts.
        if let Some(sub) = self.subscription() {
            sub.request(n);
        }
    }

    /// Cancel the captured subscription, if any.
    pub fn cancel(&self) {
        if let Some(sub) = self.subscription() {
            sub.cancel();
        }
    }
}

impl<T: Clone> PassiveObserver<T> {
    /// Copy of every value received so far, in order.
    #[must_use]
    pub fn buffer(&self) -> Vec<T> {
        self.inner.borrow().buf.clone()
    }
}

impl<T> Observer<T> for PassiveObserver<T> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        let mut inner = self.inner.borrow_mut();
        if inner.state != ObserverState::Idle {
            drop(inner);
            subscription.cancel();
            return;
        }
        inner.state = ObserverState::Subscribed;
        inner.sub = Some(subscription);
        inner.log.push(Notification::Subscribe);
    }

    fn on_next(&mut self, value: T) {
        let mut inner = self.inner.borrow_mut();
        if inner.state == ObserverState::Subscribed {
            inner.buf.push(value);
            inner.log.push(Notification::Next);
        }
    }

    fn on_complete(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if inner.state == ObserverState::Subscribed {
            inner.state = ObserverState::Completed;
            inner.log.push(Notification::Complete);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        let mut inner = self.inner.borrow_mut();
        if inner.state == ObserverState::Subscribed {
            inner.state = ObserverState::Errored;
            inner.error = Some(error);
            inner.log.push(Notification::Error);
        }
    }
}
