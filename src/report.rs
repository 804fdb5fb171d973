use crate::align::Diagnostic;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticTally {
    pub truncated: usize,
    pub options_not_found: usize,
    pub options_dropped: usize,
    pub spans_cut: usize,
}

impl DiagnosticTally {
    pub fn add(&mut self, diagnostics: &[Diagnostic]) {
        for d in diagnostics {
            match d {
                Diagnostic::Truncated { .. } => self.truncated += 1,
                Diagnostic::OptionNotFound { .. } => self.options_not_found += 1,
                Diagnostic::OptionsDropped { count } => self.options_dropped += count,
                Diagnostic::SpanCut { .. } => self.spans_cut += 1,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareReport {
    pub source: String,
    pub started: String,
    pub finished: String,
    pub config_hash: String,
    pub examples: usize,
    pub train: usize,
    pub eval: usize,
    pub tally: DiagnosticTally,
    pub flagged: Vec<ExampleReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleReport {
    pub index: usize,
    pub preview: String,
    pub diagnostics: Vec<Diagnostic>,
}
