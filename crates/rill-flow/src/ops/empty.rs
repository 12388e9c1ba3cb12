#![forbid(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::observable::Source;
use crate::observer::{Observer, Sink};
use crate::subscription::Inert;

/// Completes without emitting values.
///
/// `on_subscribe` is delivered inside `subscribe`; `on_complete` is
/// scheduled and only arrives on the next `run`, unless the subscription
/// was cancelled first.
pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Empty<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Empty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Empty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Empty")
    }
}

impl<T: 'static> Source<T> for Empty<T> {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<T>>) {
        let sub = super::attach(coordinator, Rc::new(Inert), self.name());
        let mut sink = Sink::new(observer);
        sink.subscribe(sub);
        coordinator.schedule(move || sink.complete());
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinator::Coordinator;
    use crate::observer::ObserverState;
    use crate::testing::PassiveObserver;

    #[test]
    fn completes_after_run() {
        let ctx = Coordinator::scoped();
        let snk = PassiveObserver::<i32>::new();
        ctx.make_observable().empty::<i32>().subscribe(snk.as_observer());
        assert_eq!(snk.state(), ObserverState::Subscribed);
        assert_eq!(ctx.active_subscriptions(), 1);
        ctx.run();
        assert_eq!(snk.state(), ObserverState::Completed);
        assert!(snk.buffer().is_empty());
        assert_eq!(ctx.active_subscriptions(), 0);
    }

    #[test]
    fn cancel_before_run_suppresses_completion() {
        let ctx = Coordinator::scoped();
        let snk = PassiveObserver::<i32>::new();
        ctx.make_observable().empty::<i32>().subscribe(snk.as_observer());
        snk.cancel();
        ctx.run();
        assert_eq!(snk.state(), ObserverState::Subscribed);
        assert_eq!(ctx.active_subscriptions(), 0);
    }
}
