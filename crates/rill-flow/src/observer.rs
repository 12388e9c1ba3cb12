#![forbid(unsafe_code)]

//! Consumer side of a stream.
//!
//! [`Observer`] is the capability implemented by consumers. Producers never
//! call it directly; they go through a [`Sink`], which owns the observer and
//! enforces the notification protocol by construction.
//!
//! # Protocol
//!
//! ```text
//!   Idle ──on_subscribe──▶ Subscribed ──on_complete──▶ Completed
//!                              │
//!                              └────────on_error─────▶ Errored
//! ```
//!
//! 1. `on_subscribe` is delivered exactly once, before anything else.
//! 2. `on_next` is delivered only while subscribed, not cancelled, and
//!    covered by outstanding demand.
//! 3. At most one of `on_complete` / `on_error`; nothing after it.
//! 4. Cancellation produces no notification. The observer stays in
//!    `Subscribed` from its own point of view.

use std::fmt;

use crate::error::FlowError;
use crate::logging::{TARGET, debug};
use crate::subscription::Subscription;

/// Receives the values and the terminal notification of one subscription.
pub trait Observer<T> {
    /// Called once before any other notification.
    fn on_subscribe(&mut self, subscription: Subscription);

    /// Called for each value, never more often than requested.
    fn on_next(&mut self, value: T);

    /// Called once when the stream ends normally.
    fn on_complete(&mut self);

    /// Called once when the stream fails.
    fn on_error(&mut self, error: FlowError);
}

impl<T, O: Observer<T> + ?Sized> Observer<T> for Box<O> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        (**self).on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        (**self).on_next(value);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }

    fn on_error(&mut self, error: FlowError) {
        (**self).on_error(error);
    }
}

/// Externally observable state of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObserverState {
    /// Not yet subscribed.
    #[default]
    Idle,
    /// Received `on_subscribe`, no terminal notification yet.
    Subscribed,
    /// Received `on_complete`.
    Completed,
    /// Received `on_error`.
    Errored,
}

impl ObserverState {
    /// True for `Completed` and `Errored`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }
}

impl fmt::Display for ObserverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Subscribed => "subscribed",
            Self::Completed => "completed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Protocol guard between a producer and its observer.
///
/// Every delivery checks the state, the cancellation flag and, for values,
/// the outstanding demand. The observer is dropped right after its terminal
/// notification.
pub(crate) struct Sink<T> {
    observer: Option<Box<dyn Observer<T>>>,
    state: ObserverState,
    subscription: Option<Subscription>,
}

impl<T> Sink<T> {
    pub(crate) fn new(observer: Box<dyn Observer<T>>) -> Self {
        Self {
            observer: Some(observer),
            state: ObserverState::Idle,
            subscription: None,
        }
    }

    /// Deliver `on_subscribe`. Ignored unless idle.
    pub(crate) fn subscribe(&mut self, subscription: Subscription) {
        if self.state != ObserverState::Idle {
            return;
        }
        self.state = ObserverState::Subscribed;
        self.subscription = Some(subscription.clone());
        if let Some(observer) = self.observer.as_mut() {
            observer.on_subscribe(subscription);
        }
    }

    /// True while values or a terminal notification may still be delivered.
    pub(crate) fn is_active(&self) -> bool {
        self.state == ObserverState::Subscribed
            && self
                .subscription
                .as_ref()
                .is_some_and(|sub| !sub.is_disposed())
    }

    /// True if a value could be delivered right now.
    pub(crate) fn has_demand(&self) -> bool {
        self.is_active()
            && self
                .subscription
                .as_ref()
                .is_some_and(|sub| !sub.demand().is_zero())
    }

    /// Deliver one value if active and covered by demand.
    ///
    /// Returns `false` (dropping the value) otherwise.
    pub(crate) fn next(&mut self, value: T) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(sub) = self.subscription.as_ref() else {
            return false;
        };
        if !sub.try_consume_one() {
            return false;
        }
        match self.observer.as_mut() {
            Some(observer) => {
                observer.on_next(value);
                true
            }
            None => false,
        }
    }

    /// Deliver `on_complete`. Demand-exempt.
    pub(crate) fn complete(&mut self) {
        if !self.begin_terminal() {
            return;
        }
        self.state = ObserverState::Completed;
        debug!(target: TARGET, sub_id = self.sub_id(), "subscription completed");
        if let Some(mut observer) = self.observer.take() {
            observer.on_complete();
        }
    }

    /// Deliver `on_error`. Demand-exempt.
    pub(crate) fn error(&mut self, error: FlowError) {
        if !self.begin_terminal() {
            return;
        }
        self.state = ObserverState::Errored;
        debug!(target: TARGET, sub_id = self.sub_id(), %error, "subscription errored");
        if let Some(mut observer) = self.observer.take() {
            observer.on_error(error);
        }
    }

    fn begin_terminal(&mut self) -> bool {
        self.state == ObserverState::Subscribed
            && self
                .subscription
                .as_ref()
                .is_some_and(Subscription::mark_terminal)
    }

    fn sub_id(&self) -> u64 {
        self.subscription.as_ref().map_or(0, Subscription::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Coordinator;
    use crate::subscription::{Inert, Producer};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Subscribe,
        Next(i32),
        Complete,
        Error(FlowError),
    }

    struct Log(Rc<RefCell<Vec<Seen>>>);

    impl Observer<i32> for Log {
        fn on_subscribe(&mut self, _subscription: Subscription) {
            self.0.borrow_mut().push(Seen::Subscribe);
        }
        fn on_next(&mut self, value: i32) {
            self.0.borrow_mut().push(Seen::Next(value));
        }
        fn on_complete(&mut self) {
            self.0.borrow_mut().push(Seen::Complete);
        }
        fn on_error(&mut self, error: FlowError) {
            self.0.borrow_mut().push(Seen::Error(error));
        }
    }

    fn fixture() -> (Coordinator, Subscription, Sink<i32>, Rc<RefCell<Vec<Seen>>>) {
        let ctx = Coordinator::scoped();
        let sub = ctx.attach(Rc::new(Inert) as Rc<dyn Producer>);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Sink::new(Box::new(Log(Rc::clone(&log))));
        (ctx, sub, sink, log)
    }

    #[test]
    fn state_display_and_terminal() {
        assert_eq!(ObserverState::Idle.to_string(), "idle");
        assert_eq!(ObserverState::Errored.to_string(), "errored");
        assert!(ObserverState::Completed.is_terminal());
        assert!(!ObserverState::Subscribed.is_terminal());
        assert_eq!(ObserverState::default(), ObserverState::Idle);
    }

    #[test]
    fn nothing_before_subscribe() {
        let (_ctx, _sub, mut sink, log) = fixture();
        assert!(!sink.next(1));
        sink.complete();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn next_requires_demand() {
        let (_ctx, sub, mut sink, log) = fixture();
        sink.subscribe(sub.clone());
        assert!(!sink.has_demand());
        assert!(!sink.next(1));
        sub.request(1);
        assert!(sink.has_demand());
        assert!(sink.next(2));
        assert!(!sink.next(3));
        assert_eq!(*log.borrow(), vec![Seen::Subscribe, Seen::Next(2)]);
    }

    #[test]
    fn single_terminal() {
        let (_ctx, sub, mut sink, log) = fixture();
        sink.subscribe(sub.clone());
        sub.request(10);
        sink.complete();
        sink.error(FlowError::producer("late"));
        sink.complete();
        assert!(!sink.next(1));
        assert_eq!(*log.borrow(), vec![Seen::Subscribe, Seen::Complete]);
        assert!(sub.is_terminal());
    }

    #[test]
    fn error_is_terminal() {
        let (_ctx, sub, mut sink, log) = fixture();
        sink.subscribe(sub);
        sink.error(FlowError::producer("boom"));
        sink.complete();
        assert_eq!(
            *log.borrow(),
            vec![Seen::Subscribe, Seen::Error(FlowError::producer("boom"))]
        );
    }

    #[test]
    fn cancelled_sink_stays_silent() {
        let (_ctx, sub, mut sink, log) = fixture();
        sink.subscribe(sub.clone());
        sub.request(5);
        sub.cancel();
        assert!(!sink.is_active());
        assert!(!sink.next(1));
        sink.complete();
        assert_eq!(*log.borrow(), vec![Seen::Subscribe]);
    }

    #[test]
    fn subscribe_only_once() {
        let (ctx, sub, mut sink, log) = fixture();
        sink.subscribe(sub);
        let second = ctx.attach(Rc::new(Inert) as Rc<dyn Producer>);
        sink.subscribe(second);
        assert_eq!(*log.borrow(), vec![Seen::Subscribe]);
    }
}
