use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::SystemTime;

use crate::learning::loss::Reduction;
use crate::learning::sgd_loss::SubTask;

/// Diagnostics raised while building or running the dialogue-state loss.
/// None of them abort a step.
#[derive(Debug, Clone, PartialEq)]
pub enum LossEvent {
    /// Construction saw a reduction other than "mean"/"sum".
    UnsupportedReduction {
        requested: String,
        fallback: Reduction,
    },
    /// Every label of `task` was the ignore sentinel (or, for requested slots,
    /// the mask was all false); a structural zero stood in for the loss.
    /// Raised once per head: span start and span end are checked on their
    /// own labels, so an all-ignored span family yields two events.
    NoActiveLabels { task: SubTask },
}

impl Display for LossEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LossEvent::UnsupportedReduction { requested, fallback } => write!(
                f,
                "{requested} reduction is not supported. Setting reduction to \"{}\"",
                fallback.as_str()
            ),
            LossEvent::NoActiveLabels { task } => {
                write!(f, "no active labels for {} in the batch", task.name())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub id: u64,              // monotonic
    pub ts: SystemTime,       // when published
    pub source: &'static str, // "sgd_loss", "probe", ...
    pub event: LossEvent,
}
