#![forbid(unsafe_code)]

use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::error::FlowError;
use crate::observable::Source;
use crate::observer::Observer;
use crate::subscription::Subscription;

use super::Empty;

/// Forwards the first `count` values, then stops upstream and completes.
///
/// `take(0)` never subscribes upstream and behaves like `empty`.
pub struct Take<T> {
    upstream: Rc<dyn Source<T>>,
    count: u64,
}

impl<T> Take<T> {
    #[must_use]
    pub fn new(upstream: Rc<dyn Source<T>>, count: u64) -> Self {
        Self { upstream, count }
    }
}

impl<T: 'static> Source<T> for Take<T> {
    fn name(&self) -> &'static str {
        "take"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<T>>) {
        if self.count == 0 {
            Empty::<T>::new().subscribe(coordinator, observer);
            return;
        }
        self.upstream.subscribe(
            coordinator,
            Box::new(TakeObserver {
                remaining: self.count,
                downstream: observer,
                subscription: None,
                done: false,
            }),
        );
    }
}

struct TakeObserver<T> {
    remaining: u64,
    downstream: Box<dyn Observer<T>>,
    subscription: Option<Subscription>,
    done: bool,
}

impl<T> Observer<T> for TakeObserver<T> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription.clone());
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        if self.done {
            return;
        }
        self.remaining -= 1;
        self.downstream.on_next(value);
        if self.remaining == 0 {
            self.done = true;
            if let Some(sub) = self.subscription.take() {
                sub.terminate();
            }
            self.downstream.on_complete();
        }
    }

    fn on_complete(&mut self) {
        if !self.done {
            self.done = true;
            self.downstream.on_complete();
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if !self.done {
            self.done = true;
            self.downstream.on_error(error);
        }
    }
}
