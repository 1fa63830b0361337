use std::io::Write;

use sgd_dst_loss::learning::{BatchDims, Reduction, IGNORE_INDEX};
use sgd_dst_loss::training::config::{load_config, parse_config, LossConfig, ProbeConfig};

#[test]
fn full_config_parses() {
    let cfg = parse_config(
        r#"
        seed = 7

        [loss]
        reduction = "sum"
        ignore_index = -100

        [batch]
        batch_size = 2
        num_intents = 3
        max_slots = 4
        max_cat_slots = 1
        max_cat_values = 5
        max_noncat_slots = 2
        max_tokens = 16
        "#,
    )
    .expect("valid toml");

    assert_eq!(cfg.seed, 7);
    assert_eq!(cfg.loss, LossConfig { reduction: "sum".into(), ignore_index: -100 });
    assert_eq!(cfg.batch.batch_size, 2);
    assert_eq!(cfg.batch.max_tokens, 16);

    let loss = cfg.loss.init();
    assert_eq!(loss.reduction(), Reduction::Sum);
    assert_eq!(loss.ignore_index(), -100);
}

#[test]
fn missing_tables_fall_back_to_defaults() {
    let cfg = parse_config("[batch]\nbatch_size = 3\n").expect("valid toml");
    assert_eq!(cfg.loss.reduction, "mean");
    assert_eq!(cfg.loss.ignore_index, IGNORE_INDEX);
    assert_eq!(cfg.batch, BatchDims { batch_size: 3, ..BatchDims::default() });

    assert_eq!(parse_config("").expect("empty is fine"), ProbeConfig::default());
}

#[test]
fn unknown_reduction_in_config_still_builds() {
    let cfg = parse_config("[loss]\nreduction = \"none\"\n").expect("valid toml");
    assert_eq!(cfg.loss.init().reduction(), Reduction::Mean);
}

#[test]
fn malformed_config_is_an_error() {
    assert!(parse_config("[loss]\nignore_index = \"minus one\"\n").is_err());
    assert!(load_config("/definitely/not/here.toml").is_err());
}

#[test]
fn loads_from_disk() {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(f, "[loss]\nreduction = \"sum\"").expect("write");
    let cfg = load_config(f.path().to_str().expect("utf8 path")).expect("load");
    assert_eq!(cfg.loss.reduction, "sum");
}
