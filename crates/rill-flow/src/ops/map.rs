#![forbid(unsafe_code)]

use std::fmt;
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::error::FlowError;
use crate::observable::Source;
use crate::observer::Observer;
use crate::subscription::Subscription;

/// Applies a function to every value.
pub struct Map<T, U> {
    upstream: Rc<dyn Source<T>>,
    f: Rc<dyn Fn(T) -> U>,
}

impl<T, U> Map<T, U> {
    #[must_use]
    pub fn new(upstream: Rc<dyn Source<T>>, f: impl Fn(T) -> U + 'static) -> Self {
        Self {
            upstream,
            f: Rc::new(f),
        }
    }
}

impl<T: 'static, U: 'static> Source<U> for Map<T, U> {
    fn name(&self) -> &'static str {
        "map"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<U>>) {
        self.upstream.subscribe(
            coordinator,
            Box::new(MapObserver {
                f: Rc::clone(&self.f),
                downstream: observer,
            }),
        );
    }
}

struct MapObserver<T, U> {
    f: Rc<dyn Fn(T) -> U>,
    downstream: Box<dyn Observer<U>>,
}

impl<T, U> Observer<T> for MapObserver<T, U> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        self.downstream.on_next((self.f)(value));
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }

    fn on_error(&mut self, error: FlowError) {
        self.downstream.on_error(error);
    }
}

/// Applies a fallible function to every value.
///
/// The first `Err` stops the upstream producer and is delivered as
/// [`FlowError::Operator`]. Nothing reaches the downstream observer after
/// that.
pub struct TryMap<T, U, E> {
    upstream: Rc<dyn Source<T>>,
    f: Rc<dyn Fn(T) -> Result<U, E>>,
}

impl<T, U, E> TryMap<T, U, E> {
    #[must_use]
    pub fn new(upstream: Rc<dyn Source<T>>, f: impl Fn(T) -> Result<U, E> + 'static) -> Self {
        Self {
            upstream,
            f: Rc::new(f),
        }
    }
}

impl<T, U, E> Source<U> for TryMap<T, U, E>
where
    T: 'static,
    U: 'static,
    E: fmt::Display + 'static,
{
    fn name(&self) -> &'static str {
        "try_map"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<U>>) {
        self.upstream.subscribe(
            coordinator,
            Box::new(TryMapObserver {
                f: Rc::clone(&self.f),
                downstream: observer,
                subscription: None,
                failed: false,
            }),
        );
    }
}

struct TryMapObserver<T, U, E> {
    f: Rc<dyn Fn(T) -> Result<U, E>>,
    downstream: Box<dyn Observer<U>>,
    subscription: Option<Subscription>,
    failed: bool,
}

impl<T, U, E: fmt::Display> Observer<T> for TryMapObserver<T, U, E> {
    fn on_subscribe(&mut self, subscription: Subscription) {
        self.subscription = Some(subscription.clone());
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, value: T) {
        if self.failed {
            return;
        }
        match (self.f)(value) {
            Ok(mapped) => self.downstream.on_next(mapped),
            Err(err) => {
                self.failed = true;
                if let Some(sub) = self.subscription.take() {
                    sub.terminate();
                }
                self.downstream
                    .on_error(FlowError::operator("try_map", err.to_string()));
            }
        }
    }

    fn on_complete(&mut self) {
        if !self.failed {
            self.downstream.on_complete();
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if !self.failed {
            self.downstream.on_error(error);
        }
    }
}
