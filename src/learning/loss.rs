// src/learning/loss.rs

use burn::tensor::{activation, backend::Backend, Bool, Int, Tensor, TensorData};

/// How per-example losses are folded into one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reduction {
    #[default]
    Mean,
    Sum,
}

impl Reduction {
    /// Recognizes exactly "mean" and "sum".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mean" => Some(Reduction::Mean),
            "sum" => Some(Reduction::Sum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Reduction::Mean => "mean",
            Reduction::Sum => "sum",
        }
    }
}

/// Pull an integer label tensor of any rank back to the host, row-major.
pub fn labels_to_host<B: Backend, const D: usize>(labels: Tensor<B, D, Int>) -> Vec<i64> {
    labels.into_data().iter::<i64>().collect()
}

/// Flat (row-major) indices of every `true` entry in `mask`.
pub fn masked_positions<B: Backend, const D: usize>(mask: Tensor<B, D, Bool>) -> Vec<i64> {
    mask.int()
        .into_data()
        .iter::<i64>()
        .enumerate()
        .filter(|(_, keep)| *keep != 0)
        .map(|(i, _)| i as i64)
        .collect()
}

/// `0 * sum(logits)`: exactly zero, but still a node of the autodiff graph
/// hanging off `logits`, so its gradient exists and is all zeros.
pub fn structural_zero<B: Backend, const D: usize>(logits: Tensor<B, D>) -> Tensor<B, 1> {
    logits.sum().mul_scalar(0.0)
}

/// Cross-entropy from logits [N, C] and integer labels (len N).
/// Rows whose label equals `ignore_index` take no part in the loss nor in the
/// `Mean` denominator. With no active row the result is a structural zero.
pub fn cross_entropy_ignore<B: Backend>(
    logits: Tensor<B, 2>,   // [N, C]
    labels: &[i64],         // len N
    ignore_index: i64,
    reduction: Reduction,
) -> Tensor<B, 1> {
    let device = logits.device();

    let mut rows = Vec::<i64>::with_capacity(labels.len());
    let mut targets = Vec::<i64>::with_capacity(labels.len());
    for (i, &y) in labels.iter().enumerate() {
        if y != ignore_index {
            rows.push(i as i64);
            targets.push(y);
        }
    }
    let active = rows.len();
    if active == 0 {
        return structural_zero(logits);
    }

    // keep only active rows: [A, C]
    let rows = Tensor::<B, 1, Int>::from_ints(rows.as_slice(), &device);
    let picked = logits.select(0, rows);

    let targets = Tensor::<B, 2, Int>::from_ints(TensorData::new(targets, [active, 1]), &device);
    let log_probs = activation::log_softmax(picked, 1);                // [A, C]
    let nll = log_probs.gather(1, targets).reshape([active]).neg();    // [A]

    match reduction {
        Reduction::Mean => nll.mean(),
        Reduction::Sum => nll.sum(),
    }
}

/// Binary cross-entropy on raw logits [N] against 0/1 targets [N].
/// Stable form: max(x, 0) - x*y + log(1 + exp(-|x|)).
pub fn bce_with_logits<B: Backend>(
    logits: Tensor<B, 1>,
    targets: Tensor<B, 1>,
    reduction: Reduction,
) -> Tensor<B, 1> {
    let per_elem = logits.clone().clamp_min(0.0) - logits.clone() * targets
        + logits.abs().neg().exp().log1p();

    match reduction {
        Reduction::Mean => per_elem.mean(),
        Reduction::Sum => per_elem.sum(),
    }
}
