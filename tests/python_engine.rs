use mcq_tagger::config::Config;
use mcq_tagger::engine::{Engine, PredictIn, python::PythonEngine};
use std::path::Path;

fn engine_with_predict_reply(dir: &Path, reply: &str) -> PythonEngine {
    let script = format!(
        "import json, sys\njson.load(sys.stdin)\nprint(json.dumps({reply}))\n"
    );
    std::fs::write(dir.join("token_predict.py"), script).unwrap();
    std::fs::write(dir.join("extract_text.py"), "").unwrap();

    let mut cfg = Config::default();
    cfg.paths.scripts_dir = dir.display().to_string();
    cfg.security.pin_scripts_dir = false;
    PythonEngine::new(&cfg).unwrap()
}

fn request() -> PredictIn {
    PredictIn {
        model_dir: "models/mcq-ner".into(),
        text: "What is 2+2? 3 , 4 , 5".into(),
        max_length: 512,
        device: "cpu".into(),
    }
}

#[test]
fn failed_prediction_reports_the_helper_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_predict_reply(
        dir.path(),
        r#"{"ok": False, "error": "CUDA out of memory"}"#,
    );
    let err = engine.predict_tokens(&request()).unwrap_err().to_string();
    assert!(err.contains("CUDA out of memory"), "{err}");
    assert!(!err.contains("failed to load model"), "{err}");
}

#[test]
fn successful_prediction_returns_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with_predict_reply(
        dir.path(),
        r#"{"ok": True, "tokens": [{"label": "B-QUESTION", "span": {"start": 0, "end": 4}, "score": 0.9}]}"#,
    );
    let out = engine.predict_tokens(&request()).unwrap();
    assert_eq!(out.tokens.len(), 1);
    assert_eq!(out.tokens[0].label, "B-QUESTION");
}

#[test]
fn missing_scripts_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.paths.scripts_dir = dir.path().display().to_string();
    cfg.security.pin_scripts_dir = false;
    assert!(PythonEngine::new(&cfg).is_err());
}
