#![forbid(unsafe_code)]

//! Cooperative execution context.
//!
//! A [`Coordinator`] owns a FIFO queue of pending actions and drains it only
//! when [`Coordinator::run`] is called. Sources never deliver from inside
//! `subscribe`; they schedule actions here, so every effect past
//! `on_subscribe` happens on the caller's next `run`.
//!
//! # Invariants
//!
//! 1. Actions run in enqueue order, one at a time.
//! 2. `schedule` never blocks and never runs anything.
//! 3. `run` drains until the queue is empty, including actions scheduled
//!    by the actions it runs. Calling it on an empty queue is a no-op.
//! 4. `run` is not re-entrant: a nested call from inside an action is
//!    refused.
//!
//! # Threads
//!
//! The coordinator itself is `!Send`; a process runs one per worker thread.
//! Other threads reach it through a [`RemoteHandle`], whose actions travel
//! over an `mpsc` channel. The channel is drained into the local queue before
//! every local `schedule`, every `pending` count and every action `run`
//! fetches, so an action sent from another thread before a local `schedule`
//! call also runs before it.
//!
//! # Failure Modes
//!
//! - **Panicking action**: not caught. Faults must be turned into `on_error`
//!   by the producer before they reach the queue.
//! - **Leaked subscription**: a producer stays in the registry until it
//!   terminates, is cancelled, or the coordinator is dropped.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::mpsc;

use crate::logging::{TARGET, debug, debug_span, trace, warn};
use crate::observable::ObservableBuilder;
use crate::subscription::{Producer, Subscription, SubscriptionState};

/// A unit of deferred work.
pub type Action = Box<dyn FnOnce()>;

/// A unit of deferred work submitted from another thread.
pub type RemoteAction = Box<dyn FnOnce() + Send>;

const DEFAULT_NAME: &str = "coordinator";
const DEFAULT_MAX_BATCH: usize = 32;

/// Configuration for a [`Coordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Label attached to spans and events.
    pub name: String,
    /// Maximum values an iterator-backed source emits per scheduled action
    /// before yielding the queue to other work.
    pub max_batch: usize,
    /// Emit a trace event for every executed action.
    pub trace_actions: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            max_batch: DEFAULT_MAX_BATCH,
            trace_actions: false,
        }
    }
}

impl CoordinatorConfig {
    /// Defaults overridden by `RILL_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom lookup.
    ///
    /// Malformed values are ignored.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(name) = get_env("RILL_COORDINATOR_NAME").filter(|n| !n.is_empty()) {
            config.name = name;
        }
        if let Some(batch) = get_env("RILL_MAX_BATCH").and_then(|v| v.trim().parse().ok()) {
            config = config.with_max_batch(batch);
        }
        if let Some(flag) = get_env("RILL_TRACE_ACTIONS") {
            config.trace_actions = matches!(flag.as_str(), "1" | "true" | "TRUE");
        }
        config
    }

    /// Set the coordinator name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the batch limit (clamped to at least 1).
    #[must_use]
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// Enable per-action trace events.
    #[must_use]
    pub fn with_trace_actions(mut self, enabled: bool) -> Self {
        self.trace_actions = enabled;
        self
    }
}

struct Shared {
    config: CoordinatorConfig,
    queue: RefCell<VecDeque<Action>>,
    producers: RefCell<HashMap<u64, Rc<dyn Producer>>>,
    next_id: Cell<u64>,
    running: Cell<bool>,
    remote_tx: mpsc::Sender<RemoteAction>,
    remote_rx: mpsc::Receiver<RemoteAction>,
}

/// Single-threaded, FIFO execution context for streams.
///
/// Cloning creates another handle to the **same** context.
#[derive(Clone)]
pub struct Coordinator {
    shared: Rc<Shared>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.shared.config.name)
            .field("pending", &self.pending())
            .field("active_subscriptions", &self.active_subscriptions())
            .finish()
    }
}

impl Coordinator {
    /// Create a coordinator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Create a coordinator owned by the calling scope, typically a test.
    ///
    /// Nothing runs until the scope calls [`run`](Self::run).
    #[must_use]
    pub fn scoped() -> Self {
        Self::with_config(CoordinatorConfig::default().with_name("scoped"))
    }

    #[must_use]
    pub fn with_config(config: CoordinatorConfig) -> Self {
        let (remote_tx, remote_rx) = mpsc::channel();
        Self {
            shared: Rc::new(Shared {
                config,
                queue: RefCell::new(VecDeque::new()),
                producers: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
                running: Cell::new(false),
                remote_tx,
                remote_rx,
            }),
        }
    }

    /// Entry point for building observables bound to this coordinator.
    #[must_use]
    pub fn make_observable(&self) -> ObservableBuilder {
        ObservableBuilder::new(self.clone())
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Append an action to the tail of the queue.
    pub fn schedule(&self, action: impl FnOnce() + 'static) {
        self.collect_remote();
        self.shared.queue.borrow_mut().push_back(Box::new(action));
    }

    /// Handle for scheduling from other threads.
    #[must_use]
    pub fn remote(&self) -> RemoteHandle {
        RemoteHandle {
            tx: self.shared.remote_tx.clone(),
        }
    }

    /// Number of queued actions, including those already sent through a
    /// [`RemoteHandle`].
    #[must_use]
    pub fn pending(&self) -> usize {
        self.collect_remote();
        self.shared.queue.borrow().len()
    }

    /// True if no action is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Number of producers that have neither terminated nor been cancelled.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.shared.producers.borrow().len()
    }

    /// Execute actions until the queue is empty.
    ///
    /// Returns the number of actions executed. A nested call from inside an
    /// action returns 0 without running anything.
    pub fn run(&self) -> usize {
        if self.shared.running.replace(true) {
            warn!(
                target: TARGET,
                coordinator = %self.shared.config.name,
                "re-entrant run() refused"
            );
            return 0;
        }
        let _guard = RunGuard(&self.shared.running);
        let _span = debug_span!(target: TARGET, "coordinator_run", coordinator = %self.shared.config.name)
            .entered();

        let mut executed = 0usize;
        while let Some(action) = self.next_action() {
            if self.shared.config.trace_actions {
                trace!(target: TARGET, seq = executed, "running action");
            }
            action();
            executed += 1;
        }
        if executed > 0 {
            debug!(target: TARGET, executed, "coordinator drained");
        }
        executed
    }

    fn next_action(&self) -> Option<Action> {
        self.collect_remote();
        self.shared.queue.borrow_mut().pop_front()
    }

    fn collect_remote(&self) {
        let mut queue = self.shared.queue.borrow_mut();
        while let Ok(action) = self.shared.remote_rx.try_recv() {
            queue.push_back(action);
        }
    }

    /// Register a producer and hand out the subscription handle for it.
    pub(crate) fn attach(&self, producer: Rc<dyn Producer>) -> Subscription {
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);
        let weak = Rc::downgrade(&producer);
        self.shared.producers.borrow_mut().insert(id, producer);
        Subscription::new(
            Rc::new(SubscriptionState::new(id)),
            weak,
            self.downgrade(),
        )
    }

    /// Drop the registry's reference to a producer.
    pub(crate) fn release(&self, id: u64) {
        let removed = self.shared.producers.borrow_mut().remove(&id);
        // Dropped outside the borrow: the producer may own observers whose
        // destructors touch this coordinator.
        drop(removed);
    }

    pub(crate) fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator {
            shared: Rc::downgrade(&self.shared),
        }
    }
}

struct RunGuard<'a>(&'a Cell<bool>);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Non-owning coordinator reference held by subscriptions and producers.
#[derive(Clone)]
pub(crate) struct WeakCoordinator {
    shared: Weak<Shared>,
}

impl WeakCoordinator {
    pub(crate) fn upgrade(&self) -> Option<Coordinator> {
        self.shared.upgrade().map(|shared| Coordinator { shared })
    }
}

/// Thread-safe handle for scheduling onto a coordinator from elsewhere.
#[derive(Clone)]
pub struct RemoteHandle {
    tx: mpsc::Sender<RemoteAction>,
}

impl RemoteHandle {
    /// Queue an action for the coordinator's next `run`.
    ///
    /// The action is ordered before any local `schedule` call that happens
    /// after this returns. Returns `false` if the coordinator has been
    /// dropped.
    pub fn schedule(&self, action: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(action)).is_ok()
    }
}

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHandle").finish_non_exhaustive()
    }
}
