use tracing::{error, info};

/// Sink for per-operation success/failure events. Components hold one of
/// these instead of logging through a global so tests can stay silent.
pub trait Observer: Send + Sync {
    fn success(&self, component: &'static str, message: &str);
    fn failure(&self, component: &'static str, message: &str);
}

/// Forwards events to the installed `tracing` subscriber.
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn success(&self, component: &'static str, message: &str) {
        info!(component, "{}", message);
    }

    fn failure(&self, component: &'static str, message: &str) {
        error!(component, "{}", message);
    }
}

pub struct NoopObserver;

impl Observer for NoopObserver {
    fn success(&self, _component: &'static str, _message: &str) {}
    fn failure(&self, _component: &'static str, _message: &str) {}
}
