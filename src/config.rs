use crate::dataset::SourceFormat;
use crate::locate::SpanLocator;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub model: Model,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub normalize: Normalize,
    #[serde(default)]
    pub inference: Inference,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.alignment.max_length == 0 {
            return Err(anyhow!("alignment.max_length must be > 0"));
        }
        if !(0.0..1.0).contains(&self.data.eval_fraction) {
            return Err(anyhow!(
                "data.eval_fraction must be in [0, 1): {}",
                self.data.eval_fraction
            ));
        }
        if self.data.use_custom_dataset && self.data.custom_dataset_file.is_empty() {
            return Err(anyhow!(
                "data.custom_dataset_file is required when use_custom_dataset=true"
            ));
        }
        for src in &self.data.sources {
            if src.path.is_empty() {
                return Err(anyhow!("data.sources entry has an empty path"));
            }
        }
        Ok(())
    }

    pub fn locator(&self) -> SpanLocator {
        SpanLocator::new(self.alignment.question_gap, self.alignment.option_gap)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub print_summary: bool,
    /// Worker threads for batch alignment; 0 lets rayon decide.
    pub max_parallel_examples: usize,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
            max_parallel_examples: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub out_dir: String,
    pub scripts_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            scripts_dir: "scripts".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    pub tokenizer_path: String,
    pub model_dir: String,
}
impl Default for Model {
    fn default() -> Self {
        Self {
            tokenizer_path: "models/mcq-ner/tokenizer.json".into(),
            model_dir: "models/mcq-ner".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub path: String,
    pub format: SourceFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Data {
    pub use_custom_dataset: bool,
    pub input_dir: String,
    pub custom_dataset_file: String,
    pub sources: Vec<DataSource>,
    pub eval_fraction: f32,
}
impl Default for Data {
    fn default() -> Self {
        Self {
            use_custom_dataset: false,
            input_dir: "data".into(),
            custom_dataset_file: "".into(),
            sources: Vec::new(),
            eval_fraction: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Alignment {
    pub max_length: usize,
    pub question_gap: usize,
    pub option_gap: usize,
}
impl Default for Alignment {
    fn default() -> Self {
        let locator = SpanLocator::default();
        Self {
            max_length: 512,
            question_gap: locator.question_gap,
            option_gap: locator.option_gap,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Extraction {
    pub python_exe: String,
    pub ocr_lang: String,
    pub extract_tables: bool,
    pub ocr_images: bool,
    pub timeout_seconds: u64,
    pub env: std::collections::BTreeMap<String, String>,
}
impl Default for Extraction {
    fn default() -> Self {
        Self {
            python_exe: "python3".into(),
            ocr_lang: "eng+vie".into(),
            extract_tables: true,
            ocr_images: true,
            timeout_seconds: 600,
            env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Normalize {
    pub normalize_unicode: bool,
    pub collapse_whitespace: bool,
    pub control_chars_to_sanitize: Vec<u8>,
}
impl Default for Normalize {
    fn default() -> Self {
        Self {
            normalize_unicode: false,
            collapse_whitespace: true,
            control_chars_to_sanitize: (0u8..32).filter(|&c| !matches!(c, 9 | 10 | 13)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Inference {
    pub device: String,
    pub timeout_seconds: u64,
    pub doctor_timeout_seconds: u64,
}
impl Default for Inference {
    fn default() -> Self {
        Self {
            device: "AUTO".into(),
            timeout_seconds: 300,
            doctor_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub write_report_json: bool,
    pub train_filename: String,
    pub eval_filename: String,
    pub report_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_report_json: true,
            train_filename: "train.jsonl".into(),
            eval_filename: "eval.jsonl".into(),
            report_filename: "prepare-report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub keep_python_stderr: bool,
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_python_stderr: true,
            dump_effective_config: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub reject_url_inputs: bool,
    pub pin_scripts_dir: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
            pin_scripts_dir: true,
        }
    }
}
