#![forbid(unsafe_code)]

//! Iterator-backed source.
//!
//! Each subscription clones the iterable and pulls from its own iterator.
//! Emission happens in scheduled pull actions:
//!
//! - at most the outstanding demand, and at most `max_batch` values per
//!   action; with demand left over the producer re-schedules itself so other
//!   queued work gets a turn,
//! - with zero demand the producer parks until `request` schedules a pull,
//! - exhaustion and `Err` items are delivered regardless of demand.

use std::cell::{Cell, RefCell};
use std::iter::Peekable;
use std::rc::{Rc, Weak};

use crate::coordinator::{Coordinator, WeakCoordinator};
use crate::demand::Demand;
use crate::error::FlowError;
use crate::observable::Source;
use crate::observer::{Observer, Sink};
use crate::subscription::Producer;

/// Adapts a plain iterable to the `Result` items [`FromIter`] consumes.
#[derive(Debug, Clone)]
pub struct AlwaysOk<I>(I);

impl<I: IntoIterator> IntoIterator for AlwaysOk<I> {
    type Item = Result<I::Item, FlowError>;
    type IntoIter = std::iter::Map<I::IntoIter, fn(I::Item) -> Result<I::Item, FlowError>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter().map(Ok as fn(I::Item) -> Result<I::Item, FlowError>)
    }
}

/// Emits the items of an iterable, one fresh iterator per subscriber.
#[derive(Debug, Clone)]
pub struct FromIter<I> {
    items: I,
}

impl<I> FromIter<AlwaysOk<I>> {
    /// Source over infallible items.
    #[must_use]
    pub fn new(items: I) -> Self {
        Self {
            items: AlwaysOk(items),
        }
    }
}

impl<I> FromIter<I> {
    /// Source over `Result` items; the first `Err` ends the stream.
    #[must_use]
    pub fn fallible(items: I) -> Self {
        Self { items }
    }
}

impl<I, T> Source<T> for FromIter<I>
where
    I: IntoIterator<Item = Result<T, FlowError>> + Clone + 'static,
    I::IntoIter: 'static,
    T: 'static,
{
    fn name(&self) -> &'static str {
        "from_iter"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<T>>) {
        let producer = Rc::new_cyclic(|this| Pull {
            iter: RefCell::new(self.items.clone().into_iter().peekable()),
            sink: RefCell::new(Sink::new(observer)),
            coordinator: coordinator.downgrade(),
            scheduled: Cell::new(false),
            max_batch: coordinator.config().max_batch.max(1),
            this: this.clone(),
        });
        let sub = super::attach(coordinator, Rc::clone(&producer) as Rc<dyn Producer>, self.name());
        producer.sink.borrow_mut().subscribe(sub);
        // An exhausted or failing iterator terminates without any demand.
        producer.schedule_pull();
    }
}

enum Step<T> {
    Emit(T),
    Fail(FlowError),
    Complete,
    Park,
    Yield,
}

struct Pull<It: Iterator<Item = Result<T, FlowError>>, T> {
    iter: RefCell<Peekable<It>>,
    sink: RefCell<Sink<T>>,
    coordinator: WeakCoordinator,
    scheduled: Cell<bool>,
    max_batch: usize,
    this: Weak<Self>,
}

impl<It, T> Pull<It, T>
where
    It: Iterator<Item = Result<T, FlowError>> + 'static,
    T: 'static,
{
    fn schedule_pull(&self) {
        if self.scheduled.replace(true) {
            return;
        }
        let (Some(this), Some(coordinator)) = (self.this.upgrade(), self.coordinator.upgrade())
        else {
            self.scheduled.set(false);
            return;
        };
        coordinator.schedule(move || this.pull());
    }

    fn pull(&self) {
        self.scheduled.set(false);
        let mut emitted = 0usize;
        loop {
            let (active, has_demand) = {
                let sink = self.sink.borrow();
                (sink.is_active(), sink.has_demand())
            };
            if !active {
                return;
            }
            match self.step(has_demand, emitted) {
                Step::Emit(value) => {
                    self.sink.borrow_mut().next(value);
                    emitted += 1;
                }
                Step::Fail(error) => {
                    self.sink.borrow_mut().error(error);
                    return;
                }
                Step::Complete => {
                    self.sink.borrow_mut().complete();
                    return;
                }
                Step::Park => return,
                Step::Yield => {
                    self.schedule_pull();
                    return;
                }
            }
        }
    }

    fn step(&self, has_demand: bool, emitted: usize) -> Step<T> {
        let mut iter = self.iter.borrow_mut();
        if let Some(Err(error)) = iter.next_if(Result::is_err) {
            return Step::Fail(error);
        }
        if iter.peek().is_none() {
            return Step::Complete;
        }
        if !has_demand {
            return Step::Park;
        }
        if emitted >= self.max_batch {
            return Step::Yield;
        }
        match iter.next() {
            Some(Ok(value)) => Step::Emit(value),
            Some(Err(error)) => Step::Fail(error),
            None => Step::Complete,
        }
    }
}

impl<It, T> Producer for Pull<It, T>
where
    It: Iterator<Item = Result<T, FlowError>> + 'static,
    T: 'static,
{
    fn on_request(&self, _demand: Demand) {
        self.schedule_pull();
    }
}
