#![forbid(unsafe_code)]

//! The handle linking one producer to one observer.
//!
//! # Ownership
//!
//! The coordinator owns every active producer in its registry. A
//! [`Subscription`] holds only `Weak` references to the producer and to the
//! coordinator, so handing it to an observer never creates a cycle and never
//! extends the producer's life past its release (terminal delivery or
//! cancellation).
//!
//! ```text
//!   Coordinator ──owns──▶ Rc<dyn Producer> ──owns──▶ Sink ──owns──▶ Observer
//!        ▲                      ▲                                     │
//!        └──── Weak ────────────┴─────────── Weak ─── Subscription ◀──┘
//! ```
//!
//! # Invariants
//!
//! 1. `cancelled` and `terminal` are monotonic: false → true, never back.
//! 2. Once either flag is set, `request` is a no-op.
//! 3. `cancel` is idempotent; the producer is notified at most once.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::coordinator::WeakCoordinator;
use crate::demand::Demand;
use crate::logging::{TARGET, debug};

/// Producer side of a subscription.
///
/// Implementations must not deliver to their observer from inside these
/// callbacks. They are invoked synchronously from `request`/`cancel`, which
/// may itself run inside an observer callback; delivery belongs in a
/// scheduled action.
pub(crate) trait Producer {
    /// Outstanding demand grew; `demand` is the new total.
    fn on_request(&self, demand: Demand);

    /// The observer cancelled, or an operator ended the stream downstream.
    /// Called at most once.
    fn on_cancel(&self) {}
}

/// Producer that ignores demand, used by sources that never emit values.
pub(crate) struct Inert;

impl Producer for Inert {
    fn on_request(&self, _demand: Demand) {}
}

/// Demand and lifecycle flags shared by the handle and its producer.
#[derive(Debug)]
pub(crate) struct SubscriptionState {
    id: u64,
    demand: Cell<Demand>,
    cancelled: Cell<bool>,
    terminal: Cell<bool>,
}

impl SubscriptionState {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            demand: Cell::new(Demand::ZERO),
            cancelled: Cell::new(false),
            terminal: Cell::new(false),
        }
    }
}

/// Handle for requesting values from, or cancelling, a running stream.
///
/// Cloning yields another handle to the same subscription.
#[derive(Clone)]
pub struct Subscription {
    state: Rc<SubscriptionState>,
    producer: Weak<dyn Producer>,
    coordinator: WeakCoordinator,
}

impl Subscription {
    pub(crate) fn new(
        state: Rc<SubscriptionState>,
        producer: Weak<dyn Producer>,
        coordinator: WeakCoordinator,
    ) -> Self {
        Self {
            state,
            producer,
            coordinator,
        }
    }

    /// Identifier, unique per coordinator.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// Current outstanding demand.
    #[must_use]
    pub fn demand(&self) -> Demand {
        self.state.demand.get()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }

    /// True once the producer delivered `on_complete` or `on_error`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.terminal.get()
    }

    /// True when no further deliveries can happen.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.is_cancelled() || self.is_terminal()
    }

    /// Ask for `n` more values.
    ///
    /// Saturates at [`Demand::UNBOUNDED`]. A no-op for `n == 0` and after
    /// cancellation or terminal delivery.
    pub fn request(&self, n: u64) {
        if n == 0 || self.is_disposed() {
            return;
        }
        let demand = self.state.demand.get().saturating_add(n);
        self.state.demand.set(demand);
        if let Some(producer) = self.producer.upgrade() {
            producer.on_request(demand);
        }
    }

    /// Stop the stream. Idempotent; a no-op after terminal delivery.
    ///
    /// Cancellation is cooperative: an action already running finishes, but
    /// every delivery re-checks the flag first.
    pub fn cancel(&self) {
        if self.is_disposed() {
            return;
        }
        self.state.cancelled.set(true);
        debug!(target: TARGET, sub_id = self.state.id, "subscription cancelled");
        if let Some(producer) = self.producer.upgrade() {
            producer.on_cancel();
        }
        self.release();
    }

    /// End the stream on behalf of an operator that is about to deliver its
    /// own terminal notification downstream.
    ///
    /// Like [`cancel`](Self::cancel) the producer is told to stop and is
    /// released, but the subscription is marked terminal, not cancelled.
    /// Returns `false` if it was already disposed.
    pub(crate) fn terminate(&self) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.state.terminal.set(true);
        debug!(target: TARGET, sub_id = self.state.id, "subscription terminated downstream");
        if let Some(producer) = self.producer.upgrade() {
            producer.on_cancel();
        }
        self.release();
        true
    }

    /// Consume one unit of demand for an `on_next` delivery.
    pub(crate) fn try_consume_one(&self) -> bool {
        let mut demand = self.state.demand.get();
        let ok = demand.try_consume_one();
        self.state.demand.set(demand);
        ok
    }

    /// Mark terminal and release the producer. Returns `false` if the
    /// subscription was already disposed.
    pub(crate) fn mark_terminal(&self) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.state.terminal.set(true);
        self.release();
        true
    }

    fn release(&self) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.release(self.state.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.state.id)
            .field("demand", &self.state.demand.get())
            .field("cancelled", &self.state.cancelled.get())
            .field("terminal", &self.state.terminal.get())
            .finish()
    }
}
