pub mod python;
pub mod types;

use anyhow::Result;

pub use types::{EngineDiag, ExtractIn, ExtractOut, PredictIn, PredictOut};

/// Out-of-process collaborators: document text extraction and model inference.
pub trait Engine {
    fn doctor(&self) -> Result<EngineDiag>;
    fn extract_text(&self, req: &ExtractIn) -> Result<ExtractOut>;
    fn predict_tokens(&self, req: &PredictIn) -> Result<PredictOut>;
}
