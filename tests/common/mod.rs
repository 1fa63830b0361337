#![allow(dead_code)]

use std::sync::Mutex;

use burn::tensor::{backend::Backend, Bool, ElementConversion, Int, Tensor, TensorData};
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;

use sgd_dst_loss::callosum::{LossEvent, LossObserver};
use sgd_dst_loss::learning::DialogueStateBatch;

pub type AD = Autodiff<NdArray<f32>>;

pub const IGN: i64 = -1;

pub fn device() -> <AD as Backend>::Device {
    Default::default()
}

pub fn floats<const D: usize>(v: Vec<f32>, shape: [usize; D]) -> Tensor<AD, D> {
    Tensor::<AD, D>::from_floats(TensorData::new(v, shape), &device())
}

pub fn ints<const D: usize>(v: Vec<i64>, shape: [usize; D]) -> Tensor<AD, D, Int> {
    Tensor::<AD, D, Int>::from_ints(TensorData::new(v, shape), &device())
}

pub fn bools<const D: usize>(v: Vec<bool>, shape: [usize; D]) -> Tensor<AD, D, Bool> {
    Tensor::<AD, D, Bool>::from_bool(TensorData::new(v, shape), &device())
}

pub fn scalar(t: Tensor<AD, 1>) -> f32 {
    t.into_scalar().elem::<f32>()
}

pub fn host<const D: usize>(t: Tensor<NdArray<f32>, D>) -> Vec<f32> {
    t.into_data().iter::<f32>().collect()
}

/// Plain-Rust cross-entropy over rows of width `c`, skipping `ignore` labels.
pub fn ref_ce(logits: &[f32], c: usize, labels: &[i64], ignore: i64, mean: bool) -> f32 {
    let mut total = 0.0f32;
    let mut n = 0usize;
    for (row, &y) in logits.chunks(c).zip(labels) {
        if y == ignore {
            continue;
        }
        let m = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let lse = m + row.iter().map(|x| (x - m).exp()).sum::<f32>().ln();
        total += lse - row[y as usize];
        n += 1;
    }
    if mean { total / n as f32 } else { total }
}

pub fn ref_bce(x: f32, y: f32) -> f32 {
    x.max(0.0) - x * y + (-x.abs()).exp().ln_1p()
}

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct Collector(pub Mutex<Vec<LossEvent>>);

impl Collector {
    pub fn events(&self) -> Vec<LossEvent> {
        self.0.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl LossObserver for Collector {
    fn observe(&self, event: &LossEvent) {
        if let Ok(mut v) = self.0.lock() {
            v.push(event.clone());
        }
    }
}

// B=2, 3 intents, 2 requested slots, 2 cat slots x 4 values, 2 noncat slots x 5 tokens.
pub const B: usize = 2;
pub const INTENTS: usize = 3;
pub const SLOTS: usize = 2;
pub const CAT: usize = 2;
pub const CAT_VALUES: usize = 4;
pub const NONCAT: usize = 2;
pub const TOKENS: usize = 5;

fn ramp(n: usize, scale: f32) -> Vec<f32> {
    (0..n).map(|i| ((i * 7 % 11) as f32 - 5.0) * scale).collect()
}

/// Only the intent head carries labels. Requested slots are all valid and
/// their logits saturate toward the targets, so their BCE is ~0.
pub fn intent_only_batch(intent_logits: Vec<f32>, intents: Vec<i64>) -> DialogueStateBatch<AD> {
    DialogueStateBatch {
        logit_intent_status: floats(intent_logits, [B, INTENTS]),
        intent_status_labels: ints(intents, [B]),

        logit_req_slot_status: floats(vec![50.0, -50.0, -50.0, 50.0], [B, SLOTS]),
        requested_slot_status: floats(vec![1.0, 0.0, 0.0, 1.0], [B, SLOTS]),
        req_slot_mask: bools(vec![true; B * SLOTS], [B, SLOTS]),

        logit_cat_slot_status: floats(ramp(B * CAT * 3, 0.7), [B, CAT, 3]),
        categorical_slot_status: ints(vec![IGN; B * CAT], [B, CAT]),
        logit_cat_slot_value: floats(ramp(B * CAT * CAT_VALUES, 0.3), [B, CAT, CAT_VALUES]),
        categorical_slot_values: ints(vec![IGN; B * CAT], [B, CAT]),

        logit_noncat_slot_status: floats(ramp(B * NONCAT * 3, 0.5), [B, NONCAT, 3]),
        noncategorical_slot_status: ints(vec![IGN; B * NONCAT], [B, NONCAT]),
        logit_noncat_slot_start: floats(ramp(B * NONCAT * TOKENS, 0.2), [B, NONCAT, TOKENS]),
        logit_noncat_slot_end: floats(ramp(B * NONCAT * TOKENS, -0.2), [B, NONCAT, TOKENS]),
        noncategorical_slot_value_start: ints(vec![IGN; B * NONCAT], [B, NONCAT]),
        noncategorical_slot_value_end: ints(vec![IGN; B * NONCAT], [B, NONCAT]),
    }
}
