// src/learning/sgd_loss.rs
//! Composite loss for Schema-Guided Dialogue state tracking.
//!
//! Seven heads are scored per step: intent, requested slots, categorical slot
//! status and value, non-categorical slot status, span start and span end.
//! Their losses are summed and divided either by the number of heads (`mean`)
//! or by the batch size (`sum`).

use std::fmt;
use std::sync::Arc;

use burn::tensor::{backend::Backend, Bool, ElementConversion, Int, Tensor};

use crate::callosum::{LossEvent, LossObserver, TracingObserver};
use crate::learning::batch::{DialogueStateBatch, NUM_SLOT_STATUSES};
use crate::learning::loss::{
    bce_with_logits, cross_entropy_ignore, labels_to_host, masked_positions, structural_zero, Reduction,
};

/// Label value that keeps a position out of every cross-entropy term.
pub const IGNORE_INDEX: i64 = -1;

/// Number of sub-losses folded into the total.
pub const SUB_LOSS_COUNT: usize = 7;

/// One head of the dialogue-state model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubTask {
    Intent,
    RequestedSlot,
    CatSlotStatus,
    CatSlotValue,
    NoncatSlotStatus,
    SpanStart,
    SpanEnd,
}

impl SubTask {
    pub const ALL: [SubTask; SUB_LOSS_COUNT] = [
        SubTask::Intent,
        SubTask::RequestedSlot,
        SubTask::CatSlotStatus,
        SubTask::CatSlotValue,
        SubTask::NoncatSlotStatus,
        SubTask::SpanStart,
        SubTask::SpanEnd,
    ];

    /// Key used when logging the per-head losses.
    pub fn name(&self) -> &'static str {
        match self {
            SubTask::Intent => "intent_loss",
            SubTask::RequestedSlot => "requested_slot_loss",
            SubTask::CatSlotStatus => "cat_slot_status_loss",
            SubTask::CatSlotValue => "cat_slot_value_loss",
            SubTask::NoncatSlotStatus => "noncat_slot_status_loss",
            SubTask::SpanStart => "span_start_loss",
            SubTask::SpanEnd => "span_end_loss",
        }
    }
}

impl fmt::Display for SubTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-head losses of one step plus the aggregated total. Every tensor is [1].
#[derive(Debug, Clone)]
pub struct DialogueStateLossOutput<B: Backend> {
    pub intent_loss: Tensor<B, 1>,
    pub requested_slot_loss: Tensor<B, 1>,
    pub cat_slot_status_loss: Tensor<B, 1>,
    pub cat_slot_value_loss: Tensor<B, 1>,
    pub noncat_slot_status_loss: Tensor<B, 1>,
    pub span_start_loss: Tensor<B, 1>,
    pub span_end_loss: Tensor<B, 1>,
    pub total: Tensor<B, 1>,
}

impl<B: Backend> DialogueStateLossOutput<B> {
    pub fn get(&self, task: SubTask) -> &Tensor<B, 1> {
        match task {
            SubTask::Intent => &self.intent_loss,
            SubTask::RequestedSlot => &self.requested_slot_loss,
            SubTask::CatSlotStatus => &self.cat_slot_status_loss,
            SubTask::CatSlotValue => &self.cat_slot_value_loss,
            SubTask::NoncatSlotStatus => &self.noncat_slot_status_loss,
            SubTask::SpanStart => &self.span_start_loss,
            SubTask::SpanEnd => &self.span_end_loss,
        }
    }

    /// Host copies of the seven sub-losses, in `SubTask::ALL` order.
    /// Forces a device sync; meant for step logging.
    pub fn scalars(&self) -> Vec<(&'static str, f32)> {
        SubTask::ALL
            .iter()
            .map(|&t| (t.name(), self.get(t).clone().into_scalar().elem::<f32>()))
            .collect()
    }

    pub fn total_scalar(&self) -> f32 {
        self.total.clone().into_scalar().elem::<f32>()
    }
}

/// Multi-task loss for the SGD dialogue-state model.
#[derive(Clone)]
pub struct DialogueStateLoss {
    reduction: Reduction,
    ignore_index: i64,
    observer: Arc<dyn LossObserver>,
}

impl fmt::Debug for DialogueStateLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueStateLoss")
            .field("reduction", &self.reduction)
            .field("ignore_index", &self.ignore_index)
            .finish_non_exhaustive()
    }
}

impl Default for DialogueStateLoss {
    fn default() -> Self {
        Self::new("mean")
    }
}

impl DialogueStateLoss {
    /// `reduction` is "mean" or "sum"; anything else warns and falls back to "mean".
    pub fn new(reduction: &str) -> Self {
        Self::with_observer(reduction, Arc::new(TracingObserver))
    }

    pub fn with_observer(reduction: &str, observer: Arc<dyn LossObserver>) -> Self {
        let reduction = match Reduction::parse(reduction) {
            Some(r) => r,
            None => {
                observer.observe(&LossEvent::UnsupportedReduction {
                    requested: reduction.to_string(),
                    fallback: Reduction::Mean,
                });
                Reduction::Mean
            }
        };
        tracing::debug!(reduction = reduction.as_str(), "dialogue-state loss ready");
        Self { reduction, ignore_index: IGNORE_INDEX, observer }
    }

    pub fn with_ignore_index(mut self, ignore_index: i64) -> Self {
        self.ignore_index = ignore_index;
        self
    }

    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    pub fn ignore_index(&self) -> i64 {
        self.ignore_index
    }

    /// Total loss of the step -> [1].
    pub fn compute_loss<B: Backend>(&self, batch: &DialogueStateBatch<B>) -> Tensor<B, 1> {
        self.forward(batch).total
    }

    /// All seven sub-losses and their aggregate.
    pub fn forward<B: Backend>(&self, batch: &DialogueStateBatch<B>) -> DialogueStateLossOutput<B> {
        let intent_loss = self.classification_loss(
            SubTask::Intent,
            batch.logit_intent_status.clone(),
            batch.intent_status_labels.clone(),
        );

        // Sigmoid CE: several slots can be requested in one utterance.
        let requested_slot_loss = self.requested_slot_loss(
            batch.logit_req_slot_status.clone(),
            batch.requested_slot_status.clone(),
            batch.req_slot_mask.clone(),
        );

        // [B, maxCatSlots, 3] -> [B*maxCatSlots, 3]
        let cat_slot_status_loss = self.slot_loss(
            SubTask::CatSlotStatus,
            batch.logit_cat_slot_status.clone(),
            batch.categorical_slot_status.clone(),
        );
        let cat_slot_value_loss = self.slot_loss(
            SubTask::CatSlotValue,
            batch.logit_cat_slot_value.clone(),
            batch.categorical_slot_values.clone(),
        );

        let noncat_slot_status_loss = self.slot_loss(
            SubTask::NoncatSlotStatus,
            batch.logit_noncat_slot_status.clone(),
            batch.noncategorical_slot_status.clone(),
        );
        // [B, maxNoncatSlots, maxTokens] -> [B*maxNoncatSlots, maxTokens]
        let span_start_loss = self.slot_loss(
            SubTask::SpanStart,
            batch.logit_noncat_slot_start.clone(),
            batch.noncategorical_slot_value_start.clone(),
        );
        let span_end_loss = self.slot_loss(
            SubTask::SpanEnd,
            batch.logit_noncat_slot_end.clone(),
            batch.noncategorical_slot_value_end.clone(),
        );

        let sum = intent_loss.clone()
            + requested_slot_loss.clone()
            + cat_slot_status_loss.clone()
            + cat_slot_value_loss.clone()
            + noncat_slot_status_loss.clone()
            + span_start_loss.clone()
            + span_end_loss.clone();

        let total = match self.reduction {
            Reduction::Mean => sum.div_scalar(SUB_LOSS_COUNT as f32),
            // an empty batch has nothing to average; keep the zero finite
            Reduction::Sum => sum.div_scalar(batch.batch_size().max(1) as f32),
        };

        DialogueStateLossOutput {
            intent_loss,
            requested_slot_loss,
            cat_slot_status_loss,
            cat_slot_value_loss,
            noncat_slot_status_loss,
            span_start_loss,
            span_end_loss,
            total,
        }
    }

    /// Cross-entropy over [N, C] logits with ignore-index labels [N].
    fn classification_loss<B: Backend>(
        &self,
        task: SubTask,
        logits: Tensor<B, 2>,
        labels: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        let labels = labels_to_host(labels);
        if labels.iter().all(|&y| y == self.ignore_index) {
            self.observer.observe(&LossEvent::NoActiveLabels { task });
            return structural_zero(logits);
        }
        cross_entropy_ignore(logits, &labels, self.ignore_index, self.reduction)
    }

    /// Flattens [B, S, C] logits and [B, S] labels to rows, then scores them.
    fn slot_loss<B: Backend>(
        &self,
        task: SubTask,
        logits: Tensor<B, 3>,
        labels: Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let [b, s, c] = logits.dims();
        // status heads are always [.., 3]; a wider head fails in the reshape
        let classes = match task {
            SubTask::CatSlotStatus | SubTask::NoncatSlotStatus => NUM_SLOT_STATUSES,
            _ => c,
        };
        let labels = labels.reshape([b * s]);
        self.classification_loss(task, logits.reshape([b * s, classes]), labels)
    }

    /// BCE restricted to positions where the schema defines the slot.
    fn requested_slot_loss<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        labels: Tensor<B, 2>,
        mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 1> {
        let device = logits.device();
        let [b, s] = logits.dims();

        let keep = masked_positions(mask);
        if keep.is_empty() {
            self.observer.observe(&LossEvent::NoActiveLabels { task: SubTask::RequestedSlot });
            return structural_zero(logits);
        }

        let keep = Tensor::<B, 1, Int>::from_ints(keep.as_slice(), &device);
        let logits = logits.reshape([b * s]).select(0, keep.clone());
        let labels = labels.reshape([b * s]).select(0, keep);
        bce_with_logits(logits, labels, self.reduction)
    }
}
