use crate::{
    aggregate::{aggregate, group_entities},
    config::Config,
    engine::{Engine, ExtractIn, PredictIn, python::PythonEngine},
    labels::schema,
    normalize::normalize_text,
    prepare::Preparer,
    tokenize::HfTokenizer,
    util::{ensure_dir, looks_like_url},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mcq-tagger")]
#[command(about = "MCQ span labeling: dataset preparation and structured prediction")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./mcq-tagger.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Doctor {},
    /// Print the label schema as JSON.
    Labels {},
    /// Extract and normalize the text of a PDF/DOCX document.
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Tokenize and label the configured dataset into train/eval JSONL.
    Prepare {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Run the model over a document and print the recovered MCQ.
    Predict {
        #[arg(long)]
        input: PathBuf,
        /// Treat the input as an already-extracted plain text file.
        #[arg(long)]
        raw_text: bool,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let loaded = match &cfg_path {
        Some(p) => Config::load(p),
        None => Ok(Config::default()),
    };
    // Log config errors through the default subscriber setup.
    let _guard = init_logging(&args, loaded.as_ref().unwrap_or(&Config::default()))?;
    let cfg = loaded?;
    if cfg_path.is_none() {
        info!("no config file found; using defaults");
    }

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Labels {} => labels(),
        Command::Extract { input, out } => extract(&cfg, input, out.as_deref()),
        Command::Prepare { out_dir } => prepare(&cfg, out_dir.as_deref()),
        Command::Predict { input, raw_text } => predict(&cfg, input, *raw_text),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("mcq-tagger.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match resolve_log_path(cfg) {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            ensure_dir(parent)?;
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.out_dir).join("mcq-tagger.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let engine = PythonEngine::new(cfg)?;
    let diag = engine.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn labels() -> Result<()> {
    let s = schema();
    let table: Vec<_> = s
        .names()
        .iter()
        .enumerate()
        .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

fn extract_document(cfg: &Config, engine: &dyn Engine, input: &Path) -> Result<String> {
    validate_input(cfg, input)?;
    let req = ExtractIn {
        input: input.display().to_string(),
        ocr_lang: cfg.extraction.ocr_lang.clone(),
        extract_tables: cfg.extraction.extract_tables,
        ocr_images: cfg.extraction.ocr_images,
    };
    let out = engine
        .extract_text(&req)
        .with_context(|| format!("extracting text: {}", input.display()))?;
    for w in &out.warnings {
        warn!("{w}");
    }
    info!(
        "extracted {} pages ({} via OCR) from {}",
        out.pages,
        out.ocr_pages,
        input.display()
    );
    Ok(normalize_text(cfg, &out.text))
}

fn extract(cfg: &Config, input: &Path, out: Option<&Path>) -> Result<()> {
    let engine = PythonEngine::new(cfg)?;
    let text = extract_document(cfg, &engine, input)?;
    match out {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn prepare(cfg: &Config, out_override: Option<&Path>) -> Result<()> {
    let out_dir = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    ensure_dir(&out_dir)?;

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(out_dir.join("effective-config.toml"), raw)?;
    }

    let tokenizer = HfTokenizer::from_file(&cfg.model.tokenizer_path, cfg.alignment.max_length)?;
    let report = Preparer::new(cfg, &tokenizer).run(&out_dir)?;

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "out_dir": out_dir,
                "examples": report.examples,
                "train": report.train,
                "eval": report.eval,
                "tally": report.tally,
            }))?
        );
    }
    Ok(())
}

fn predict(cfg: &Config, input: &Path, raw_text: bool) -> Result<()> {
    let model_dir = Path::new(&cfg.model.model_dir);
    if !model_dir.exists() {
        return Err(anyhow!(
            "failed to load model or tokenizer from {}: directory does not exist",
            model_dir.display()
        ));
    }

    let engine = PythonEngine::new(cfg)?;
    let text = if raw_text {
        let raw = std::fs::read_to_string(input)
            .with_context(|| format!("reading {}", input.display()))?;
        normalize_text(cfg, &raw)
    } else {
        extract_document(cfg, &engine, input)?
    };

    let out = engine.predict_tokens(&PredictIn {
        model_dir: cfg.model.model_dir.clone(),
        text: text.clone(),
        max_length: cfg.alignment.max_length,
        device: cfg.inference.device.clone(),
    })?;
    let groups = group_entities(&text, &out.tokens);
    let record = aggregate(&groups);
    info!("{} tokens, {} entity groups", out.tokens.len(), groups.len());

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": input,
            "mcq": record,
        }))?
    );
    Ok(())
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("file not found: {}", input.display()));
    }

    match input
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") | Some("docx") => Ok(()),
        _ => Err(anyhow!("unsupported file type: {}", input.display())),
    }
}
