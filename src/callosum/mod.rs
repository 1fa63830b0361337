pub mod callosum;
pub mod event;
pub mod observer;

pub use callosum::DiagnosticsBus;
pub use event::{EventEnvelope, LossEvent};
pub use observer::{FanoutObserver, LossObserver, TracingObserver};
