#![forbid(unsafe_code)]

//! Sources and operators.
//!
//! Sources (`empty`, `never`, `fail`, `from_iter`) build a producer per
//! subscription and register it with the coordinator. Operators wrap an
//! upstream [`Source`](crate::observable::Source) and interpose an observer
//! of their own; the upstream subscription handle is passed through to the
//! downstream observer unchanged, so demand flows straight to the producer.

mod empty;
mod fail;
mod filter;
mod for_each;
mod from_iter;
mod map;
mod never;
mod take;

pub use empty::Empty;
pub use fail::Fail;
pub use filter::Filter;
pub use for_each::ForEach;
pub use from_iter::{AlwaysOk, FromIter};
pub use map::{Map, TryMap};
pub use never::Never;
pub use take::Take;

use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::logging::{TARGET, debug};
use crate::subscription::{Producer, Subscription};

/// Register `producer` and log the new subscription.
fn attach(coordinator: &Coordinator, producer: Rc<dyn Producer>, source: &'static str) -> Subscription {
    let sub = coordinator.attach(producer);
    debug!(
        target: TARGET,
        sub_id = sub.id(),
        source,
        coordinator = %coordinator.name(),
        "subscribed"
    );
    sub
}
