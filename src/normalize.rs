use crate::config::Config;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Produces the single normalized string the labeling core consumes.
pub fn normalize_text(cfg: &Config, raw: &str) -> String {
    let mut text = if cfg.normalize.normalize_unicode {
        raw.nfkc().collect::<String>()
    } else {
        raw.to_string()
    };

    text = sanitize_control_chars(&text, &cfg.normalize.control_chars_to_sanitize);

    if cfg.normalize.collapse_whitespace {
        text = WHITESPACE_RUN.replace_all(&text, " ").into_owned();
    }

    text.trim().to_string()
}

fn sanitize_control_chars(s: &str, codes: &[u8]) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            if ch == '\n' || ch == '\r' || ch == '\t' {
                return true;
            }
            let cp = ch as u32;
            cp >= 128 || !mask[cp as usize]
        })
        .collect()
}
