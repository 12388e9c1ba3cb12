#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::demand::Demand;
use crate::observable::Source;
use crate::observer::{Observer, Sink};
use crate::subscription::Producer;

/// Never emits and never terminates.
///
/// The producer stays registered, holding its observer, until the
/// subscription is cancelled or the coordinator is dropped.
#[derive(Debug)]
pub struct Never<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Never<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Never<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct Parked<T> {
    sink: RefCell<Sink<T>>,
}

impl<T> Producer for Parked<T> {
    fn on_request(&self, _demand: Demand) {}
}

impl<T: 'static> Source<T> for Never<T> {
    fn name(&self) -> &'static str {
        "never"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<T>>) {
        let producer = Rc::new(Parked {
            sink: RefCell::new(Sink::new(observer)),
        });
        let sub = super::attach(coordinator, Rc::clone(&producer) as Rc<dyn Producer>, self.name());
        producer.sink.borrow_mut().subscribe(sub);
    }
}
