use crate::{
    align::{LabeledSequence, label_example},
    config::Config,
    conll::{TaggedSentence, label_sentence, load_conll},
    dataset::{McqExample, load_jsonl, split_train_eval},
    error::preview,
    report::{DiagnosticTally, ExampleReport, PrepareReport},
    tokenize::SubwordTokenizer,
    util::{ensure_dir, now_rfc3339, sha256_hex, write_jsonl},
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Batch alignment over a whole dataset.
///
/// Examples are labeled independently in parallel and collected in input
/// order. A fatal error for any example aborts the batch.
pub struct Preparer<'a, T: SubwordTokenizer + ?Sized> {
    cfg: &'a Config,
    tokenizer: &'a T,
}

pub struct PreparedSet {
    pub keys: Vec<String>,
    pub sequences: Vec<LabeledSequence>,
}

impl<'a, T: SubwordTokenizer + ?Sized> Preparer<'a, T> {
    pub fn new(cfg: &'a Config, tokenizer: &'a T) -> Self {
        Self { cfg, tokenizer }
    }

    pub fn label_examples(&self, examples: &[McqExample]) -> Result<PreparedSet> {
        let locator = self.cfg.locator();
        let sequences = self.in_pool(|| {
            examples
                .par_iter()
                .map(|ex| {
                    label_example(self.tokenizer, ex, &locator)
                        .with_context(|| format!("labeling example: {}...", preview(&ex.text)))
                })
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(PreparedSet {
            keys: examples.iter().map(|ex| ex.text.clone()).collect(),
            sequences,
        })
    }

    pub fn label_sentences(&self, sentences: &[TaggedSentence]) -> Result<PreparedSet> {
        let sequences = self.in_pool(|| {
            sentences
                .par_iter()
                .map(|s| label_sentence(self.tokenizer, s).map_err(anyhow::Error::from))
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(PreparedSet {
            keys: sentences.iter().map(|s| s.words.join(" ")).collect(),
            sequences,
        })
    }

    fn in_pool<R: Send>(&self, op: impl FnOnce() -> Result<R> + Send) -> Result<R> {
        match self.cfg.global.max_parallel_examples {
            0 => op(),
            n => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .with_context(|| "building alignment thread pool")?
                .install(op),
        }
    }

    /// Loads the configured dataset, labels it and writes train/eval JSONL
    /// files plus a report into `out_dir`.
    pub fn run(&self, out_dir: &Path) -> Result<PrepareReport> {
        let started_at = Instant::now();
        let started = now_rfc3339();

        let (source, set) = if self.cfg.data.use_custom_dataset {
            let path = PathBuf::from(&self.cfg.data.input_dir).join(&self.cfg.data.custom_dataset_file);
            if !path.exists() {
                return Err(anyhow!("custom dataset file not found: {}", path.display()));
            }
            let sentences = load_conll(&path)
                .with_context(|| format!("loading corpus: {}", path.display()))?;
            info!("loaded {} sentences from {}", sentences.len(), path.display());
            ("custom".to_string(), self.label_sentences(&sentences)?)
        } else {
            let mut examples = Vec::new();
            for src in &self.cfg.data.sources {
                examples.extend(load_jsonl(Path::new(&src.path), src.format)?);
            }
            if examples.is_empty() {
                return Err(anyhow!("no examples loaded; configure data.sources"));
            }
            ("standardized".to_string(), self.label_examples(&examples)?)
        };

        let mut tally = DiagnosticTally::default();
        let mut flagged = Vec::new();
        for (index, (key, seq)) in set.keys.iter().zip(&set.sequences).enumerate() {
            if seq.diagnostics.is_empty() {
                continue;
            }
            tally.add(&seq.diagnostics);
            flagged.push(ExampleReport {
                index,
                preview: preview(key),
                diagnostics: seq.diagnostics.clone(),
            });
        }
        let examples = set.sequences.len();
        debug!(?tally, "alignment diagnostics");

        let pairs: Vec<(String, LabeledSequence)> = set.keys.into_iter().zip(set.sequences).collect();
        let (train, eval) = split_train_eval(pairs, self.cfg.data.eval_fraction, |(k, _)| k.clone())?;
        let train: Vec<LabeledSequence> = train.into_iter().map(|(_, s)| s).collect();
        let eval: Vec<LabeledSequence> = eval.into_iter().map(|(_, s)| s).collect();

        ensure_dir(out_dir)?;
        write_jsonl(&out_dir.join(&self.cfg.output.train_filename), &train)?;
        write_jsonl(&out_dir.join(&self.cfg.output.eval_filename), &eval)?;

        let report = PrepareReport {
            source,
            started,
            finished: now_rfc3339(),
            config_hash: sha256_hex(self.cfg.normalized_for_hash().as_bytes()),
            examples,
            train: train.len(),
            eval: eval.len(),
            tally,
            flagged,
        };

        if self.cfg.output.write_report_json {
            std::fs::write(
                out_dir.join(&self.cfg.output.report_filename),
                serde_json::to_string_pretty(&report)?,
            )?;
        }

        info!(
            "prepared {} examples (train={} eval={}) in {:?}",
            report.examples,
            report.train,
            report.eval,
            started_at.elapsed()
        );
        Ok(report)
    }
}
