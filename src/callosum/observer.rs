use super::event::LossEvent;

/// Receives diagnostics from the loss aggregator. Injected at construction
/// so callers decide where warnings go.
pub trait LossObserver: Send + Sync {
    fn observe(&self, event: &LossEvent);
}

/// Default observer: structured `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl LossObserver for TracingObserver {
    fn observe(&self, event: &LossEvent) {
        match event {
            LossEvent::UnsupportedReduction { requested, fallback } => {
                tracing::warn!(requested = %requested, fallback = fallback.as_str(), "{event}");
            }
            LossEvent::NoActiveLabels { task } => {
                tracing::warn!(task = task.name(), "{event}");
            }
        }
    }
}

/// Forwards every event to each inner observer, in order.
pub struct FanoutObserver {
    inner: Vec<std::sync::Arc<dyn LossObserver>>,
}

impl FanoutObserver {
    pub fn new(inner: Vec<std::sync::Arc<dyn LossObserver>>) -> Self {
        Self { inner }
    }
}

impl LossObserver for FanoutObserver {
    fn observe(&self, event: &LossEvent) {
        for obs in &self.inner {
            obs.observe(event);
        }
    }
}
