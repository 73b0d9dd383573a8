//! CLI binary for invoice2json.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use invoice2json::{extract, validate, ExtractionConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic extraction (JSON to stdout)
  invoice2json invoice.png

  # Pretty-printed, with a post-hoc validation report
  invoice2json --pretty --validate invoice.jpg

  # Write to a file, custom model
  invoice2json --model gemini-2.5-pro invoice.png -o invoice.json

  # Skip image enhancement for clean digital renders
  invoice2json --no-enhance render.png

OUTPUT:
  A JSON object with `success`, and either `record` + `confidence` or
  `error`. With --validate, a `validation` object is attached on success.
  Exit code is 0 on success, 1 when extraction failed.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  GOOGLE_API_KEY          Fallback API key variable

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Extract:         invoice2json invoice.png -o invoice.json
"#;

/// Extract structured invoice data from images using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "invoice2json",
    version,
    about = "Extract structured invoice data from images using Vision LLMs",
    long_about = "Extract a structured, normalised invoice record (parties, line items, \
amounts, dates) from an invoice photo or scan using a multimodal Vision Language Model, \
and print it as JSON.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Invoice image file (PNG, JPEG, WebP…).
    input: PathBuf,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "INVOICE2JSON_OUTPUT")]
    output: Option<PathBuf>,

    /// Vision model ID.
    #[arg(long, env = "INVOICE2JSON_MODEL", default_value = "gemini-2.0-flash")]
    model: String,

    /// API key; read from GEMINI_API_KEY / GOOGLE_API_KEY when not set.
    #[arg(long)]
    api_key: Option<String>,

    /// Model sampling temperature (0.0–2.0).
    #[arg(long, env = "INVOICE2JSON_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max model output tokens.
    #[arg(long, env = "INVOICE2JSON_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Model call timeout in seconds.
    #[arg(long, env = "INVOICE2JSON_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Max preprocessed image dimension in pixels.
    #[arg(long, env = "INVOICE2JSON_MAX_DIMENSION", default_value_t = 2048)]
    max_dimension: u32,

    /// Skip sharpening/contrast/brightness enhancement.
    #[arg(long, env = "INVOICE2JSON_NO_ENHANCE")]
    no_enhance: bool,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "INVOICE2JSON_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Attach a post-hoc validation report to the output.
    #[arg(long)]
    validate: bool,

    /// Pretty-print the JSON output.
    #[arg(short, long)]
    pretty: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INVOICE2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "INVOICE2JSON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Logs go to stderr so stdout stays pure JSON and pipes cleanly.
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let result = extract(&bytes, &config).await;

    let mut output = serde_json::to_value(&result).context("Failed to serialise result")?;
    if cli.validate {
        if let Some(ref record) = result.record {
            let report = validate(record);
            output["validation"] =
                serde_json::to_value(&report).context("Failed to serialise report")?;
        }
    }
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output).context("Failed to render output")?
    } else {
        serde_json::to_string(&output).context("Failed to render output")?
    };

    if let Some(ref path) = cli.output {
        tokio::fs::write(path, format!("{rendered}\n"))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("wrote {}", path.display());
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .max_image_dimension(cli.max_dimension)
        .enhance(!cli.no_enhance);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {}", path.display()))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
