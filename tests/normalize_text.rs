use mcq_tagger::config::Config;
use mcq_tagger::normalize::normalize_text;

#[test]
fn collapses_whitespace_and_trims() {
    let cfg = Config::default();
    let raw = "  Question 1:\n\tWhat is\r\n 2+2?\n\nA. 3   B. 4  ";
    assert_eq!(normalize_text(&cfg, raw), "Question 1: What is 2+2? A. 3 B. 4");
}

#[test]
fn strips_control_characters() {
    let cfg = Config::default();
    assert_eq!(normalize_text(&cfg, "Alpha\u{0002}Beta\u{000C}"), "AlphaBeta");
}

#[test]
fn optional_unicode_normalization() {
    let mut cfg = Config::default();
    assert_eq!(normalize_text(&cfg, "ﬁle"), "ﬁle");
    cfg.normalize.normalize_unicode = true;
    assert_eq!(normalize_text(&cfg, "ﬁle"), "file");
}
