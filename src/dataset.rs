//! Standardizes heterogeneous QA records into [`McqExample`]s.
//!
//! Records are read from local JSONL files. Three shapes are accepted:
//! math-style (`Problem` + comma-joined `options`), med-style (`question` +
//! option list) and records that are already standard.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Separator between options in a standardized text.
pub const OPTION_SEPARATOR: &str = " , ";

/// One question with its options, `question` and every option being
/// substrings of `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqExample {
    pub text: String,
    pub question: String,
    pub options: Vec<String>,
}

impl McqExample {
    pub fn new(question: impl Into<String>, options: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            question: question.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    MathQa,
    MedQa,
    Standard,
}

#[derive(Debug, Deserialize)]
struct MathQaRecord {
    #[serde(rename = "Problem")]
    problem: String,
    options: String,
}

#[derive(Debug, Deserialize)]
struct MedQaRecord {
    question: String,
    options: Vec<String>,
}

/// `Problem + " " + options`, options split on `" , "`.
pub fn standardize_math_qa(problem: &str, options: &str) -> McqExample {
    McqExample::new(
        problem,
        options.split(OPTION_SEPARATOR).map(str::to_string).collect(),
        format!("{problem} {options}"),
    )
}

/// Prefixes options with `a) `, `b) `, .. and joins them after the question.
pub fn standardize_med_qa<S: AsRef<str>>(question: &str, options: &[S]) -> McqExample {
    let options: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}) {}", letter_prefix(i), opt.as_ref()))
        .collect();
    let text = format!("{question} {}", options.join(OPTION_SEPARATOR));
    McqExample::new(question, options, text)
}

fn letter_prefix(i: usize) -> char {
    u8::try_from(i)
        .ok()
        .and_then(|i| b'a'.checked_add(i))
        .map(char::from)
        .unwrap_or('?')
}

pub fn parse_record(line: &str, format: SourceFormat) -> Result<McqExample> {
    Ok(match format {
        SourceFormat::MathQa => {
            let r: MathQaRecord = serde_json::from_str(line)?;
            standardize_math_qa(&r.problem, &r.options)
        }
        SourceFormat::MedQa => {
            let r: MedQaRecord = serde_json::from_str(line)?;
            standardize_med_qa(&r.question, &r.options)
        }
        SourceFormat::Standard => serde_json::from_str(line)?,
    })
}

pub fn load_jsonl(path: &Path, format: SourceFormat) -> Result<Vec<McqExample>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset: {}", path.display()))?;
    let mut out = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let ex = parse_record(line, format)
            .with_context(|| format!("{}:{}: bad {:?} record", path.display(), i + 1, format))?;
        out.push(ex);
    }
    info!("loaded {} examples from {} ({:?})", out.len(), path.display(), format);
    Ok(out)
}

/// Splits items into (train, eval) by hashing each item's key, so the
/// split is reproducible across runs and independent of input order.
pub fn split_train_eval<T, F>(items: Vec<T>, eval_fraction: f32, key: F) -> Result<(Vec<T>, Vec<T>)>
where
    F: Fn(&T) -> String,
{
    if !(0.0..1.0).contains(&eval_fraction) {
        return Err(anyhow!("eval_fraction must be in [0, 1): {eval_fraction}"));
    }
    let threshold = (eval_fraction as f64 * u64::MAX as f64) as u64;
    let (eval, train): (Vec<T>, Vec<T>) = items
        .into_iter()
        .partition(|item| bucket(&key(item)) < threshold);
    debug!(train = train.len(), eval = eval.len(), "split dataset");
    Ok((train, eval))
}

fn bucket(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}
