// src/learning/batch.rs

use burn::tensor::{backend::Backend, Bool, Int, Tensor, TensorData};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Deserialize;

/// Slot status classes shared by categorical and non-categorical heads.
pub const STATUS_OFF: i64 = 0;
pub const STATUS_ACTIVE: i64 = 1;
pub const STATUS_DONTCARE: i64 = 2;
pub const NUM_SLOT_STATUSES: usize = 3;

/// Padded sizes of one training step.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BatchDims {
    pub batch_size: usize,
    pub num_intents: usize,
    pub max_slots: usize,
    pub max_cat_slots: usize,
    pub max_cat_values: usize,
    pub max_noncat_slots: usize,
    pub max_tokens: usize,
}

impl Default for BatchDims {
    fn default() -> Self {
        Self {
            batch_size: 8,
            num_intents: 4,
            max_slots: 6,
            max_cat_slots: 4,
            max_cat_values: 11,
            max_noncat_slots: 5,
            max_tokens: 32,
        }
    }
}

/// Everything the dialogue-state loss reads in one step.
/// Label tensors use the ignore sentinel for padded or inapplicable slots.
#[derive(Debug, Clone)]
pub struct DialogueStateBatch<B: Backend> {
    pub logit_intent_status: Tensor<B, 2>,          // [B, numIntents]
    pub intent_status_labels: Tensor<B, 1, Int>,    // [B]

    pub logit_req_slot_status: Tensor<B, 2>,        // [B, maxSlots]
    pub requested_slot_status: Tensor<B, 2>,        // [B, maxSlots], 0/1
    pub req_slot_mask: Tensor<B, 2, Bool>,          // [B, maxSlots]

    pub logit_cat_slot_status: Tensor<B, 3>,        // [B, maxCatSlots, 3]
    pub categorical_slot_status: Tensor<B, 2, Int>, // [B, maxCatSlots]
    pub logit_cat_slot_value: Tensor<B, 3>,         // [B, maxCatSlots, maxCatValues]
    pub categorical_slot_values: Tensor<B, 2, Int>, // [B, maxCatSlots]

    pub logit_noncat_slot_status: Tensor<B, 3>,         // [B, maxNoncatSlots, 3]
    pub noncategorical_slot_status: Tensor<B, 2, Int>,  // [B, maxNoncatSlots]
    pub logit_noncat_slot_start: Tensor<B, 3>,          // [B, maxNoncatSlots, maxTokens]
    pub logit_noncat_slot_end: Tensor<B, 3>,            // [B, maxNoncatSlots, maxTokens]
    pub noncategorical_slot_value_start: Tensor<B, 2, Int>, // [B, maxNoncatSlots]
    pub noncategorical_slot_value_end: Tensor<B, 2, Int>,   // [B, maxNoncatSlots]
}

impl<B: Backend> DialogueStateBatch<B> {
    /// Batch size as seen by the intent head.
    pub fn batch_size(&self) -> usize {
        self.logit_intent_status.dims()[0]
    }

    /// Mark every logits tensor as a leaf that wants gradients.
    pub fn require_grad(self) -> Self {
        Self {
            logit_intent_status: self.logit_intent_status.require_grad(),
            logit_req_slot_status: self.logit_req_slot_status.require_grad(),
            logit_cat_slot_status: self.logit_cat_slot_status.require_grad(),
            logit_cat_slot_value: self.logit_cat_slot_value.require_grad(),
            logit_noncat_slot_status: self.logit_noncat_slot_status.require_grad(),
            logit_noncat_slot_start: self.logit_noncat_slot_start.require_grad(),
            logit_noncat_slot_end: self.logit_noncat_slot_end.require_grad(),
            ..self
        }
    }

    /// Seeded random step shaped like real SGD batches: each example owns a
    /// random number of schema slots (the rest is padding), slot values and
    /// spans are only labelled when the slot status is active.
    pub fn sample(dims: &BatchDims, ignore_index: i64, seed: u64, device: &B::Device) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let b = dims.batch_size;

        let mut logits = |n: usize| -> Vec<f32> { (0..n).map(|_| rng.gen_range(-2.0f32..2.0)).collect() };
        let intent_logits = logits(b * dims.num_intents);
        let req_logits = logits(b * dims.max_slots);
        let cat_status_logits = logits(b * dims.max_cat_slots * NUM_SLOT_STATUSES);
        let cat_value_logits = logits(b * dims.max_cat_slots * dims.max_cat_values);
        let noncat_status_logits = logits(b * dims.max_noncat_slots * NUM_SLOT_STATUSES);
        let start_logits = logits(b * dims.max_noncat_slots * dims.max_tokens);
        let end_logits = logits(b * dims.max_noncat_slots * dims.max_tokens);

        let mut intents = Vec::with_capacity(b);
        let mut req_status = Vec::with_capacity(b * dims.max_slots);
        let mut req_mask = Vec::with_capacity(b * dims.max_slots);
        let mut cat_status = Vec::with_capacity(b * dims.max_cat_slots);
        let mut cat_values = Vec::with_capacity(b * dims.max_cat_slots);
        let mut noncat_status = Vec::with_capacity(b * dims.max_noncat_slots);
        let mut span_start = Vec::with_capacity(b * dims.max_noncat_slots);
        let mut span_end = Vec::with_capacity(b * dims.max_noncat_slots);

        for _ in 0..b {
            intents.push(rng.gen_range(0..dims.num_intents.max(1)) as i64);

            let n_slots = rng.gen_range(0..=dims.max_slots);
            for s in 0..dims.max_slots {
                let valid = s < n_slots;
                req_mask.push(valid);
                req_status.push(if valid && rng.gen_bool(0.3) { 1.0f32 } else { 0.0 });
            }

            let n_cat = rng.gen_range(0..=dims.max_cat_slots);
            for s in 0..dims.max_cat_slots {
                if s >= n_cat {
                    cat_status.push(ignore_index);
                    cat_values.push(ignore_index);
                    continue;
                }
                let status = rng.gen_range(STATUS_OFF..=STATUS_DONTCARE);
                cat_status.push(status);
                cat_values.push(if status == STATUS_ACTIVE {
                    rng.gen_range(0..dims.max_cat_values.max(1)) as i64
                } else {
                    ignore_index
                });
            }

            let n_noncat = rng.gen_range(0..=dims.max_noncat_slots);
            for s in 0..dims.max_noncat_slots {
                if s >= n_noncat {
                    noncat_status.push(ignore_index);
                    span_start.push(ignore_index);
                    span_end.push(ignore_index);
                    continue;
                }
                let status = rng.gen_range(STATUS_OFF..=STATUS_DONTCARE);
                noncat_status.push(status);
                if status == STATUS_ACTIVE && dims.max_tokens > 0 {
                    let start = rng.gen_range(0..dims.max_tokens);
                    let end = rng.gen_range(start..dims.max_tokens);
                    span_start.push(start as i64);
                    span_end.push(end as i64);
                } else {
                    span_start.push(ignore_index);
                    span_end.push(ignore_index);
                }
            }
        }

        let floats2 = |v: Vec<f32>, d1: usize| Tensor::<B, 2>::from_floats(TensorData::new(v, [b, d1]), device);
        let floats3 =
            |v: Vec<f32>, d1: usize, d2: usize| Tensor::<B, 3>::from_floats(TensorData::new(v, [b, d1, d2]), device);
        let ints2 = |v: Vec<i64>, d1: usize| Tensor::<B, 2, Int>::from_ints(TensorData::new(v, [b, d1]), device);

        Self {
            logit_intent_status: floats2(intent_logits, dims.num_intents),
            intent_status_labels: Tensor::<B, 1, Int>::from_ints(TensorData::new(intents, [b]), device),

            logit_req_slot_status: floats2(req_logits, dims.max_slots),
            requested_slot_status: floats2(req_status, dims.max_slots),
            req_slot_mask: Tensor::<B, 2, Bool>::from_bool(TensorData::new(req_mask, [b, dims.max_slots]), device),

            logit_cat_slot_status: floats3(cat_status_logits, dims.max_cat_slots, NUM_SLOT_STATUSES),
            categorical_slot_status: ints2(cat_status, dims.max_cat_slots),
            logit_cat_slot_value: floats3(cat_value_logits, dims.max_cat_slots, dims.max_cat_values),
            categorical_slot_values: ints2(cat_values, dims.max_cat_slots),

            logit_noncat_slot_status: floats3(noncat_status_logits, dims.max_noncat_slots, NUM_SLOT_STATUSES),
            noncategorical_slot_status: ints2(noncat_status, dims.max_noncat_slots),
            logit_noncat_slot_start: floats3(start_logits, dims.max_noncat_slots, dims.max_tokens),
            logit_noncat_slot_end: floats3(end_logits, dims.max_noncat_slots, dims.max_tokens),
            noncategorical_slot_value_start: ints2(span_start, dims.max_noncat_slots),
            noncategorical_slot_value_end: ints2(span_end, dims.max_noncat_slots),
        }
    }
}
