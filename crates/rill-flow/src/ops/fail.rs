#![forbid(unsafe_code)]

use std::marker::PhantomData;
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::error::FlowError;
use crate::observable::Source;
use crate::observer::{Observer, Sink};
use crate::subscription::Inert;

/// Fails with a fixed error without emitting values.
#[derive(Debug)]
pub struct Fail<T> {
    error: FlowError,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Fail<T> {
    #[must_use]
    pub fn new(error: FlowError) -> Self {
        Self {
            error,
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> Source<T> for Fail<T> {
    fn name(&self) -> &'static str {
        "fail"
    }

    fn subscribe(&self, coordinator: &Coordinator, observer: Box<dyn Observer<T>>) {
        let sub = super::attach(coordinator, Rc::new(Inert), self.name());
        let mut sink = Sink::new(observer);
        sink.subscribe(sub);
        let error = self.error.clone();
        coordinator.schedule(move || sink.error(error));
    }
}
