use crate::aggregate::TokenPrediction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDiag {
    pub python_exe: String,
    pub python_version: String,
    #[serde(default)]
    pub transformers_version: Option<String>,
    #[serde(default)]
    pub tesseract_version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractIn {
    pub input: String,
    pub ocr_lang: String,
    pub extract_tables: bool,
    pub ocr_images: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOut {
    pub ok: bool,
    pub text: String,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub ocr_pages: u32,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictIn {
    pub model_dir: String,
    pub text: String,
    pub max_length: usize,
    pub device: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictOut {
    pub ok: bool,
    #[serde(default)]
    pub tokens: Vec<TokenPrediction>,
    #[serde(default)]
    pub error: Option<String>,
}
