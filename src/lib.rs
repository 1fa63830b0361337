pub mod callosum;
pub mod learning;
pub mod training;

pub use callosum::{DiagnosticsBus, LossEvent, LossObserver, TracingObserver};
pub use learning::{
    BatchDims, DialogueStateBatch, DialogueStateLoss, DialogueStateLossOutput, Reduction, SubTask,
    IGNORE_INDEX, SUB_LOSS_COUNT,
};
