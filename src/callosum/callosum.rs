use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::{channel, Receiver, Sender},
    Arc, PoisonError, RwLock,
};
use std::time::SystemTime;

use super::event::{EventEnvelope, LossEvent};
use super::observer::LossObserver;

type Subscriber = Sender<Arc<EventEnvelope>>;

/// In-process fan-out of loss diagnostics to named subscribers.
pub struct DiagnosticsBus {
    subscribers: Arc<RwLock<HashMap<String, Subscriber>>>,
    seq: AtomicU64,
    source: &'static str,
}

impl Default for DiagnosticsBus {
    fn default() -> Self {
        Self::new("sgd_loss")
    }
}

impl DiagnosticsBus {
    pub fn new(source: &'static str) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            seq: AtomicU64::new(1),
            source,
        }
    }

    /// Add/replace a subscriber by name. Returns its receiver.
    pub fn subscribe(&self, name: &str) -> Receiver<Arc<EventEnvelope>> {
        let (tx, rx) = channel();
        let mut subs = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        subs.insert(name.to_string(), tx);
        rx
    }

    pub fn unsubscribe(&self, name: &str) {
        let mut subs = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        subs.remove(name);
    }

    /// Deliver an envelope to every live subscriber; drop the ones whose
    /// receiver is gone.
    pub fn publish_envelope(&self, env: EventEnvelope) {
        let shared = Arc::new(env);
        let mut dead: Vec<String> = Vec::new();

        {
            let subs = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
            for (name, sub) in subs.iter() {
                if sub.send(shared.clone()).is_err() {
                    dead.push(name.clone());
                }
            }
        }

        if !dead.is_empty() {
            let mut subs = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
            for name in dead {
                subs.remove(&name);
            }
        }
    }

    /// Stamp id/ts/source and publish. Returns the envelope id.
    pub fn publish(&self, event: LossEvent) -> u64 {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        self.publish_envelope(EventEnvelope {
            id,
            ts: SystemTime::now(),
            source: self.source,
            event,
        });
        id
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl LossObserver for DiagnosticsBus {
    fn observe(&self, event: &LossEvent) {
        self.publish(event.clone());
    }
}
