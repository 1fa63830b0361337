// training/manager.rs
use std::sync::Arc;

use anyhow::Result;
use burn::tensor::{backend::AutodiffBackend, ElementConversion, Tensor};

use crate::callosum::{DiagnosticsBus, FanoutObserver, LossEvent, LossObserver, TracingObserver};
use crate::learning::batch::DialogueStateBatch;
use crate::learning::sgd_loss::SubTask;
use crate::training::config::{load_config, ProbeConfig};

/// What one probe step measured.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub reduction: &'static str,
    pub batch_size: usize,
    pub losses: Vec<(&'static str, f32)>,
    pub total: f32,
    /// L2 norm of d(total)/d(logits) per head; `None` if the head fell off the graph.
    pub grad_norms: Vec<(&'static str, Option<f32>)>,
    pub events: Vec<LossEvent>,
}

pub fn run(config_path: Option<&str>) -> Result<ProbeReport> {
    let cfg = match config_path {
        Some(path) => load_config(path)?,
        None => ProbeConfig::default(),
    };
    type AD = burn_autodiff::Autodiff<burn_ndarray::NdArray<f32>>;
    let device = Default::default();
    Ok(probe_step::<AD>(&cfg, &device))
}

/// Sample one step, score it, backprop, and collect diagnostics.
pub fn probe_step<B: AutodiffBackend>(cfg: &ProbeConfig, device: &B::Device) -> ProbeReport {
    let bus = Arc::new(DiagnosticsBus::new("probe"));
    let rx = bus.subscribe("report");
    let log: Arc<dyn LossObserver> = Arc::new(TracingObserver);
    let collect: Arc<dyn LossObserver> = bus.clone();
    let observer: Arc<dyn LossObserver> = Arc::new(FanoutObserver::new(vec![log, collect]));
    let loss_fn = cfg.loss.init_with_observer(observer);

    let batch = DialogueStateBatch::<B>::sample(&cfg.batch, loss_fn.ignore_index(), cfg.seed, device)
        .require_grad();

    let out = loss_fn.forward(&batch);
    let losses = out.scalars();
    let total = out.total_scalar();

    let grads = out.total.backward();
    let grad_norms = vec![
        (SubTask::Intent.name(), grad_norm(&batch.logit_intent_status, &grads)),
        (SubTask::RequestedSlot.name(), grad_norm(&batch.logit_req_slot_status, &grads)),
        (SubTask::CatSlotStatus.name(), grad_norm(&batch.logit_cat_slot_status, &grads)),
        (SubTask::CatSlotValue.name(), grad_norm(&batch.logit_cat_slot_value, &grads)),
        (SubTask::NoncatSlotStatus.name(), grad_norm(&batch.logit_noncat_slot_status, &grads)),
        (SubTask::SpanStart.name(), grad_norm(&batch.logit_noncat_slot_start, &grads)),
        (SubTask::SpanEnd.name(), grad_norm(&batch.logit_noncat_slot_end, &grads)),
    ];

    let events = rx.try_iter().map(|env| env.event.clone()).collect();

    ProbeReport {
        reduction: loss_fn.reduction().as_str(),
        batch_size: batch.batch_size(),
        losses,
        total,
        grad_norms,
        events,
    }
}

fn grad_norm<B: AutodiffBackend, const D: usize>(
    logits: &Tensor<B, D>,
    grads: &B::Gradients,
) -> Option<f32> {
    let g = logits.grad(grads)?;
    Some((g.clone() * g).sum().sqrt().into_scalar().elem::<f32>())
}
