// training/config.rs
use std::sync::Arc;

use serde::Deserialize;

use crate::callosum::LossObserver;
use crate::learning::batch::BatchDims;
use crate::learning::sgd_loss::{DialogueStateLoss, IGNORE_INDEX};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LossConfig {
    #[serde(default = "default_reduction")]
    pub reduction: String,       // "mean" | "sum"
    #[serde(default = "default_ignore_index")]
    pub ignore_index: i64,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self { reduction: default_reduction(), ignore_index: default_ignore_index() }
    }
}

impl LossConfig {
    pub fn init(&self) -> DialogueStateLoss {
        DialogueStateLoss::new(&self.reduction).with_ignore_index(self.ignore_index)
    }

    pub fn init_with_observer(&self, observer: Arc<dyn LossObserver>) -> DialogueStateLoss {
        DialogueStateLoss::with_observer(&self.reduction, observer).with_ignore_index(self.ignore_index)
    }
}

fn default_reduction() -> String { "mean".to_string() }
fn default_ignore_index() -> i64 { IGNORE_INDEX }

/// Settings of the probe run: loss knobs plus the shape of the sampled step.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProbeConfig {
    #[serde(default)]
    pub loss: LossConfig,
    #[serde(default)]
    pub batch: BatchDims,
    #[serde(default)]
    pub seed: u64,
}

pub fn parse_config(txt: &str) -> anyhow::Result<ProbeConfig> {
    Ok(toml::from_str::<ProbeConfig>(txt)?)
}

pub fn load_config(path: &str) -> anyhow::Result<ProbeConfig> {
    let txt = std::fs::read_to_string(path)?;
    parse_config(&txt)
}
