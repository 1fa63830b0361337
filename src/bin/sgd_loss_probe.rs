use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use sgd_dst_loss::training::manager;

#[derive(Parser, Debug)]
struct Args {
    /// TOML with [loss] and [batch] tables; defaults are used when omitted
    #[arg(long)]
    config: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    Registry::default().with(filter).with(fmt_layer).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let report = manager::run(args.config.as_deref())?;

    println!("[probe] reduction={} batch_size={}", report.reduction, report.batch_size);
    for (name, v) in &report.losses {
        println!("  {name:<24} {v:.6}");
    }
    println!("  {:<24} {:.6}", "total", report.total);

    println!("[grad] L2 norm of d(total)/d(logits)");
    for (name, g) in &report.grad_norms {
        match g {
            Some(g) => println!("  {name:<24} {g:.6}"),
            None => println!("  {name:<24} (no gradient)"),
        }
    }

    if report.events.is_empty() {
        println!("[events] none");
    } else {
        println!("[events] {}", report.events.len());
        for e in &report.events {
            println!("  {e}");
        }
    }
    Ok(())
}
