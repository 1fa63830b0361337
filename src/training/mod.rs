pub mod config;
pub mod manager;

pub use config::{load_config, parse_config, LossConfig, ProbeConfig};
pub use manager::{probe_step, run, ProbeReport};
