#![forbid(unsafe_code)]

//! Producer descriptions.
//!
//! An [`Observable<T>`] is an immutable recipe for a sequence of `T` bound to
//! one [`Coordinator`]. It holds no production state: every call to
//! [`subscribe`](Observable::subscribe) builds a fresh producer (cold
//! semantics), registers it with the coordinator and delivers
//! `on_subscribe` synchronously. Everything after that is scheduled.
//!
//! Operators are [`Source`] implementations that wrap an upstream source;
//! they compose, they do not inherit.

use std::fmt;
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::error::FlowError;
use crate::observer::Observer;
use crate::ops;

/// How to produce values for one subscriber.
pub trait Source<T> {
    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Build a producer for `observer` on `coordinator`.
    ///
    /// Must deliver `on_subscribe` before returning and must not deliver
    /// anything else synchronously.
    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<T>>);
}

/// A cold, immutable description of a stream of `T`.
pub struct Observable<T> {
    coordinator: Coordinator,
    source: Rc<dyn Source<T>>,
}

// Manual Clone: `T` itself need not be Clone.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            source: Rc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("source", &self.source.name())
            .field("coordinator", &self.coordinator.name())
            .finish()
    }
}

impl<T: 'static> Observable<T> {
    /// Wrap a source.
    #[must_use]
    pub fn new(coordinator: Coordinator, source: impl Source<T> + 'static) -> Self {
        Self {
            coordinator,
            source: Rc::new(source),
        }
    }

    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Name of the outermost source or operator.
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Attach an observer.
    ///
    /// `on_subscribe` has been delivered when this returns; values and the
    /// terminal notification arrive during later [`Coordinator::run`] calls.
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) {
        self.source.subscribe(&self.coordinator, Box::new(observer));
    }

    /// Subscribe with unbounded demand, calling `f` for every value.
    pub fn for_each(&self, f: impl FnMut(T) + 'static) {
        self.subscribe(ops::ForEach::new(f));
    }

    /// Transform every value.
    #[must_use]
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Observable<U> {
        let coordinator = self.coordinator.clone();
        Observable::new(coordinator, ops::Map::new(self.source, f))
    }

    /// Transform every value with a fallible function. The first `Err`
    /// stops upstream and ends the stream with
    /// [`FlowError::Operator`].
    #[must_use]
    pub fn try_map<U, E>(self, f: impl Fn(T) -> Result<U, E> + 'static) -> Observable<U>
    where
        U: 'static,
        E: fmt::Display + 'static,
    {
        let coordinator = self.coordinator.clone();
        Observable::new(coordinator, ops::TryMap::new(self.source, f))
    }

    /// Keep values matching `predicate`.
    #[must_use]
    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'static) -> Observable<T> {
        let coordinator = self.coordinator.clone();
        Observable::new(coordinator, ops::Filter::new(self.source, predicate))
    }

    /// Forward the first `n` values, then stop upstream and complete.
    #[must_use]
    pub fn take(self, n: u64) -> Observable<T> {
        let coordinator = self.coordinator.clone();
        Observable::new(coordinator, ops::Take::new(self.source, n))
    }
}

/// Factory for source observables, obtained from
/// [`Coordinator::make_observable`].
#[derive(Debug, Clone)]
pub struct ObservableBuilder {
    coordinator: Coordinator,
}

impl ObservableBuilder {
    pub(crate) fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    /// Completes without emitting anything.
    #[must_use]
    pub fn empty<T: 'static>(&self) -> Observable<T> {
        Observable::new(self.coordinator.clone(), ops::Empty::new())
    }

    /// Never emits and never terminates.
    #[must_use]
    pub fn never<T: 'static>(&self) -> Observable<T> {
        Observable::new(self.coordinator.clone(), ops::Never::new())
    }

    /// Fails with `error` without emitting anything.
    #[must_use]
    pub fn fail<T: 'static>(&self, error: FlowError) -> Observable<T> {
        Observable::new(self.coordinator.clone(), ops::Fail::new(error))
    }

    /// Emits `value` once, then completes.
    #[must_use]
    pub fn just<T: Clone + 'static>(&self, value: T) -> Observable<T> {
        self.from_iter(std::iter::once(value))
    }

    /// Emits every item of `items`. Each subscriber iterates its own clone.
    #[must_use]
    pub fn from_iter<I>(&self, items: I) -> Observable<I::Item>
    where
        I: IntoIterator + Clone + 'static,
        I::IntoIter: 'static,
        I::Item: 'static,
    {
        Observable::new(self.coordinator.clone(), ops::FromIter::new(items))
    }

    /// Emits the `Ok` items of `items`; the first `Err` ends the stream with
    /// `on_error`.
    #[must_use]
    pub fn try_from_iter<I, T>(&self, items: I) -> Observable<T>
    where
        I: IntoIterator<Item = Result<T, FlowError>> + Clone + 'static,
        I::IntoIter: 'static,
        T: 'static,
    {
        Observable::new(self.coordinator.clone(), ops::FromIter::fallible(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PassiveObserver;

    #[test]
    fn builder_names_sources() {
        let ctx = Coordinator::scoped();
        let b = ctx.make_observable();
        assert_eq!(b.empty::<i32>().source_name(), "empty");
        assert_eq!(b.never::<i32>().source_name(), "never");
        assert_eq!(b.fail::<i32>(FlowError::producer("x")).source_name(), "fail");
        assert_eq!(b.just(1).source_name(), "from_iter");
        assert_eq!(b.from_iter(vec![1, 2]).map(|x| x + 1).source_name(), "map");
    }

    #[test]
    fn subscribe_delivers_on_subscribe_synchronously() {
        let ctx = Coordinator::scoped();
        let snk = PassiveObserver::<i32>::new();
        ctx.make_observable().just(5).subscribe(snk.as_observer());
        assert!(snk.subscription().is_some());
        assert!(snk.buffer().is_empty());
        assert_eq!(ctx.pending(), 1);
    }

    #[test]
    fn observable_is_cold_and_reusable() {
        let ctx = Coordinator::scoped();
        let obs = ctx.make_observable().from_iter(vec![1, 2, 3]);
        let a = PassiveObserver::new();
        let b = PassiveObserver::new();
        obs.subscribe(a.as_observer());
        obs.clone().subscribe(b.as_observer());
        a.request(10);
        b.request(2);
        ctx.run();
        assert_eq!(a.buffer(), vec![1, 2, 3]);
        assert_eq!(b.buffer(), vec![1, 2]);
    }

    #[test]
    fn for_each_requests_unbounded() {
        let ctx = Coordinator::scoped();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        ctx.make_observable()
            .from_iter(0..100)
            .for_each(move |v| s.borrow_mut().push(v));
        ctx.run();
        assert_eq!(seen.borrow().len(), 100);
        assert_eq!(ctx.active_subscriptions(), 0);
    }

    #[test]
    fn debug_format() {
        let ctx = Coordinator::scoped();
        let obs = ctx.make_observable().empty::<u8>();
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("empty"));
        assert!(dbg.contains("scoped"));
    }
}
