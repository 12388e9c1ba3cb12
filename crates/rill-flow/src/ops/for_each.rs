#![forbid(unsafe_code)]

use crate::demand::Demand;
use crate::error::FlowError;
use crate::logging::{TARGET, debug};
use crate::observer::Observer;
use crate::subscription::Subscription;

/// Observer that requests unbounded demand and hands every value to a
/// closure. Terminal notifications are only logged.
pub struct ForEach<F> {
    f: F,
}

impl<F> ForEach<F> {
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F: FnMut(T)> Observer<T> for ForEach<F> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        subscription.request(Demand::UNBOUNDED.get());
    }

    fn on_next(&mut self, value: T) {
        (self.f)(value);
    }

    fn on_complete(&mut self) {}

    fn on_error(&mut self, error: FlowError) {
        debug!(target: TARGET, %error, "for_each stream failed");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::coordinator::Coordinator;
    use crate::error::FlowError;

    #[test]
    fn visits_every_value_in_order() {
        let ctx = Coordinator::scoped();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        ctx.make_observable()
            .from_iter(vec!['a', 'b', 'c'])
            .for_each(move |v| s.borrow_mut().push(v));
        assert!(seen.borrow().is_empty());
        ctx.run();
        assert_eq!(*seen.borrow(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn error_ends_iteration() {
        let ctx = Coordinator::scoped();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        ctx.make_observable()
            .try_from_iter(vec![Ok(1), Err(FlowError::producer("eof")), Ok(3)])
            .for_each(move |v| s.borrow_mut().push(v));
        ctx.run();
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(ctx.active_subscriptions(), 0);
    }
}
