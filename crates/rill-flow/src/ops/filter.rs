#![forbid(unsafe_code)]

use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::error::FlowError;
use crate::observable::Source;
use crate::observer::Observer;
use crate::subscription::Subscription;

/// Drops values that do not match a predicate.
///
/// Each dropped value consumed one unit of upstream demand; it is requested
/// again so the downstream observer still receives what it asked for.
pub struct Filter<T> {
    upstream: Rc<dyn Source<T>>,
    predicate: Rc<dyn Fn(&T) -> bool>,
}

impl<T> Filter<T> {
    #[must_use]
    pub fn new(upstream: Rc<dyn Source<T>>, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        Self {
            upstream,
            predicate: Rc::new(predicate),
        }
    }
}

impl<T: 'static> Source<T> for Filter<T> {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<T>>) {
        self.upstream.subscribe(
            coordinator,
            Box::new(FilterObserver {
                predicate: Rc::clone(&self.predicate),
                downstream: observer,
                subscription: None,
            }),
        );
    }
}

struct FilterObserver<T> {
    predicate: Rc<dyn Fn(&T) -> bool>,
    downstream: Box<dyn Observer<T>>,
    subscription: Option<Subscription>,
}

impl<T> Observer<T> for FilterObserver<T> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription.clone());
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        if (self.predicate)(&value) {
            self.downstream.on_next(value);
        } else if let Some(sub) = self.subscription.as_ref() {
            sub.request(1);
        }
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }

    fn on_error(&mut self, error: FlowError) {
        self.downstream.on_error(error);
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinator::Coordinator;
    use crate::observer::ObserverState;
    use crate::testing::PassiveObserver;

    #[test]
    fn keeps_matching_values() {
        let ctx = Coordinator::scoped();
        let snk = PassiveObserver::new();
        ctx.make_observable()
            .from_iter(1..=10)
            .filter(|x| x % 2 == 0)
            .subscribe(snk.as_observer());
        snk.request(100);
        ctx.run();
        assert_eq!(snk.buffer(), vec![2, 4, 6, 8, 10]);
        assert_eq!(snk.state(), ObserverState::Completed);
    }

    #[test]
    fn dropped_values_do_not_eat_demand() {
        let ctx = Coordinator::scoped();
        let snk = PassiveObserver::new();
        ctx.make_observable()
            .from_iter(1..=20)
            .filter(|x| x % 5 == 0)
            .subscribe(snk.as_observer());
        snk.request(3);
        ctx.run();
        assert_eq!(snk.buffer(), vec![5, 10, 15]);
        assert_eq!(snk.state(), ObserverState::Subscribed);
    }
}
