use mcq_tagger::config::Config;
use mcq_tagger::dataset::SourceFormat;

#[test]
fn parse_example_config() {
    let raw = include_str!("../mcq-tagger.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.alignment.max_length, 512);
    assert_eq!(cfg.data.sources.len(), 2);
    assert_eq!(cfg.data.sources[1].format, SourceFormat::MedQa);
    assert!(!cfg.paths.out_dir.is_empty());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[alignment]\nmax_length = 128\nquestion_gap = 1\noption_gap = 3\n")
        .expect("parse TOML");
    assert_eq!(cfg.alignment.max_length, 128);
    assert_eq!(cfg.output.train_filename, "train.jsonl");
    assert!(cfg.validate().is_ok());
}

#[test]
fn partial_section_keeps_field_defaults() {
    let cfg: Config = toml::from_str("[alignment]\nmax_length = 256\n").expect("parse TOML");
    assert_eq!(cfg.alignment.max_length, 256);
    assert_eq!(cfg.alignment.question_gap, 1);
    assert_eq!(cfg.alignment.option_gap, 3);

    let cfg: Config =
        toml::from_str("[logging]\njson = true\n[data]\neval_fraction = 0.1\n").expect("parse TOML");
    assert!(cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");
    assert_eq!(cfg.data.input_dir, "data");
    assert!(cfg.data.sources.is_empty());
    assert!(cfg.validate().is_ok());
}

#[test]
fn validate_rejects_bad_values() {
    let mut cfg = Config::default();
    cfg.alignment.max_length = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.data.eval_fraction = 1.5;
    assert!(cfg.validate().is_err());

    let mut cfg = Config::default();
    cfg.data.use_custom_dataset = true;
    assert!(cfg.validate().is_err());
}
