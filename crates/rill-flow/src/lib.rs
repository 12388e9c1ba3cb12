#![forbid(unsafe_code)]

//! Rill Flow: cooperative reactive streams.
//!
//! # Role
//! `rill-flow` is a push/pull stream engine. Producers ([`Observable`])
//! emit to consumers ([`Observer`]) only as much as the consumer asked for
//! through its [`Subscription`], and every emission runs as an action on a
//! single-threaded [`Coordinator`].
//!
//! # Primary responsibilities
//! - **Coordinator**: FIFO action queue, drained by explicit `run` calls.
//! - **Subscription**: demand accounting and cooperative cancellation.
//! - **Observer protocol**: `on_subscribe` first, at most one terminal
//!   notification, nothing after it.
//! - **Sources and operators**: `empty`, `never`, `fail`, `just`,
//!   `from_iter`, `try_from_iter`, `map`, `try_map`, `filter`, `take`.
//!
//! # Example
//!
//! ```
//! use rill_flow::{Coordinator, ObserverState, PassiveObserver};
//!
//! let ctx = Coordinator::scoped();
//! let snk = PassiveObserver::new();
//! ctx.make_observable()
//!     .from_iter(1..=5)
//!     .map(|x| x * x)
//!     .subscribe(snk.as_observer());
//!
//! snk.request(2);
//! ctx.run();
//! assert_eq!(snk.buffer(), vec![1, 4]);
//!
//! snk.request(10);
//! ctx.run();
//! assert_eq!(snk.buffer(), vec![1, 4, 9, 16, 25]);
//! assert_eq!(snk.state(), ObserverState::Completed);
//! ```

pub mod coordinator;
pub mod demand;
pub mod error;
pub mod logging;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod subscription;
pub mod testing;

pub use coordinator::{Coordinator, CoordinatorConfig, RemoteHandle};
pub use demand::Demand;
pub use error::FlowError;
pub use observable::{Observable, ObservableBuilder, Source};
pub use observer::{Observer, ObserverState};
pub use subscription::Subscription;
pub use testing::{Notification, PassiveObserver};
