//! Structured log events emitted by the engine.

use std::io;
use std::sync::{Arc, Mutex};

use rill_flow::{Coordinator, CoordinatorConfig, PassiveObserver};
use tracing::Level;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn with_capture(f: impl FnOnce()) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    capture.text()
}

#[test]
fn lifecycle_events_are_logged() {
    let out = with_capture(|| {
        let ctx = Coordinator::with_config(CoordinatorConfig::default().with_name("smoke"));
        let done = PassiveObserver::<i32>::new();
        ctx.make_observable().empty::<i32>().subscribe(done.as_observer());
        let cancelled = PassiveObserver::<i32>::new();
        ctx.make_observable().never::<i32>().subscribe(cancelled.as_observer());
        cancelled.cancel();
        ctx.run();
    });

    assert!(out.contains("subscribed"), "{out}");
    assert!(out.contains("source=\"empty\"") || out.contains("source=empty"), "{out}");
    assert!(out.contains("subscription completed"), "{out}");
    assert!(out.contains("subscription cancelled"), "{out}");
    assert!(out.contains("coordinator_run"), "{out}");
    assert!(out.contains("smoke"), "{out}");
    assert!(!out.contains("subscription terminated downstream"), "{out}");
}

#[test]
fn events_share_the_crate_target() {
    let out = with_capture(|| {
        let ctx = Coordinator::scoped();
        let snk = PassiveObserver::new();
        ctx.make_observable()
            .from_iter(0..5)
            .take(2)
            .subscribe(snk.as_observer());
        snk.request(2);
        ctx.run();
    });

    assert!(out.contains(&format!(" {}: subscribed", rill_flow::logging::TARGET)), "{out}");
    assert!(out.contains("subscription terminated downstream"), "{out}");
    assert!(!out.contains("rill_flow::"), "module-path target leaked: {out}");
}

#[test]
fn per_action_tracing_is_opt_in() {
    let quiet = with_capture(|| {
        let ctx = Coordinator::scoped();
        ctx.schedule(|| {});
        ctx.run();
    });
    assert!(!quiet.contains("running action"), "{quiet}");

    let loud = with_capture(|| {
        let ctx = Coordinator::with_config(CoordinatorConfig::default().with_trace_actions(true));
        ctx.schedule(|| {});
        ctx.schedule(|| {});
        ctx.run();
    });
    assert_eq!(loud.matches("running action").count(), 2, "{loud}");
}

#[test]
fn reentrant_run_warns() {
    let out = with_capture(|| {
        let ctx = Coordinator::scoped();
        let inner = ctx.clone();
        ctx.schedule(move || {
            inner.run();
        });
        ctx.run();
    });
    assert!(out.contains("WARN"), "{out}");
    assert!(out.contains("re-entrant run() refused"), "{out}");
}
