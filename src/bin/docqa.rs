//! CLI binary for edgequake-docqa.
//!
//! A thin shim over the library crate: maps CLI flags to `PipelineConfig`,
//! runs OCR on one document, prints what was extracted, and answers
//! questions about it.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docqa::{
    DocQaError, ExtractedDocument, ExtractionProgressCallback, ExtractionStats, OcrInput,
    PipelineConfig, ProgressCallback, Session,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

fn spinner(prefix: &str, message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(spinner_style());
    bar.set_prefix(prefix.to_string());
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner while the OCR tool runs, then a
/// summary line per stage. The spinner stays hidden until OCR starts.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        bar.set_style(spinner_style());
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_ocr_start(&self, input_name: &str) {
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.set_prefix("OCR");
        self.bar.set_message(format!("reading {input_name}…"));
    }

    fn on_ocr_complete(&self, duration_ms: u64) {
        self.bar.println(format!(
            "  {} OCR finished  {}",
            green("✓"),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0))
        ));
        self.bar.set_prefix("Scanning");
        self.bar.set_message("collecting artefacts…");
    }

    fn on_ocr_error(&self, error: &str) {
        let first_line = error.lines().next().unwrap_or("");
        self.bar.println(format!("  {} {}", red("✗"), red(first_line)));
        self.bar.finish_and_clear();
    }

    fn on_artifacts_scanned(&self, count: usize) {
        self.bar.set_message(format!("{count} artefacts"));
    }

    fn on_extraction_complete(&self, stats: &ExtractionStats) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} text · {} tables · {} images  {}",
            green("✔"),
            bold(&stats.text_artifacts.to_string()),
            bold(&stats.tables.to_string()),
            bold(&stats.image_artifacts.to_string()),
            dim(&format!("{}ms", stats.total_duration_ms)),
        );
    }

    fn on_extraction_error(&self, _error: &str) {
        // main reports the error itself.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR a scan and print the extracted text and tables
  docqa invoice.pdf

  # Ask one or more questions
  docqa invoice.pdf -q "What is the total?" -q "Who issued it?"

  # Interactive question loop (empty line or 'exit' to quit)
  docqa contract.png --interactive

  # Use a remote Ollama server and another model
  docqa scan.webp --chat-url http://gpu-box:11434/api/chat --model qwen2.5:14b -q "Summarise"

  # Route questions through another provider
  docqa scan.pdf --provider openai --model gpt-4.1-mini -q "Summarise"

  # JSON output, save extracted images
  docqa scan.pdf --json --save-images ./figures > doc.json

OCR TOOL CONTRACT:
  <tool> <input_path> <output_dir> --method <method>
  exit 0 = success; anything else = failure, reported with the tool's stderr.
  Artefacts: .md/.txt (text), .html/.htm (tables), .png/.jpg/.jpeg/.webp (images).

ENVIRONMENT VARIABLES:
  DOCQA_OCR_TOOL       OCR executable (default: chandra)
  DOCQA_OCR_METHOD     OCR strategy id (default: hf)
  DOCQA_CHAT_URL       Ollama-compatible /api/chat URL
  DOCQA_MODEL          Chat model (default: llama3.1:8b)
  DOCQA_PROVIDER       edgequake-llm provider (openai, anthropic, gemini, …)
  RUST_LOG             Override log filter
"#;

/// Ask questions about scanned documents using an external OCR tool and an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    about = "Ask questions about scanned documents (OCR + grounded LLM chat)",
    long_about = "Runs an external OCR tool on a PDF or image, normalises its text, table and \
image artefacts, and answers questions strictly from the recognised content using an \
Ollama-compatible chat endpoint or any edgequake-llm provider.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or image file (pdf, png, jpg, jpeg, webp).
    input: PathBuf,

    /// Question to ask about the document. Repeat for several questions.
    #[arg(short = 'q', long = "question")]
    questions: Vec<String>,

    /// Read questions from stdin, one per line, after extraction.
    #[arg(short, long)]
    interactive: bool,

    /// OCR executable name or path.
    #[arg(long, env = "DOCQA_OCR_TOOL", default_value = "chandra")]
    ocr_tool: String,

    /// OCR strategy id passed as `--method`.
    #[arg(long, env = "DOCQA_OCR_METHOD", default_value = "hf")]
    ocr_method: String,

    /// Extra KEY=VALUE environment for the OCR subprocess. Repeatable.
    #[arg(long = "ocr-env", value_parser = parse_key_val)]
    ocr_env: Vec<(String, String)>,

    /// Ollama-compatible chat endpoint.
    #[arg(long, env = "DOCQA_CHAT_URL", default_value = "http://localhost:11434/api/chat")]
    chat_url: String,

    /// Chat model identifier.
    #[arg(long, env = "DOCQA_MODEL", default_value = "llama3.1:8b")]
    model: String,

    /// edgequake-llm provider instead of the Ollama endpoint.
    #[arg(long, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Chat request timeout in seconds.
    #[arg(long, env = "DOCQA_CHAT_TIMEOUT", default_value_t = 300)]
    chat_timeout: u64,

    /// Sampling temperature (0.0–2.0). Endpoint default if unset.
    #[arg(long, env = "DOCQA_TEMPERATURE")]
    temperature: Option<f32>,

    /// Text file with a custom grounding prompt containing `{context}`.
    #[arg(long, env = "DOCQA_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Print the grounding context instead of the formatted document.
    #[arg(long)]
    print_context: bool,

    /// Write extracted images into this directory.
    #[arg(long)]
    save_images: Option<PathBuf>,

    /// Output structured JSON (document and exchanges).
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCQA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCQA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and answers.
    #[arg(short = 'Q', long, env = "DOCQA_QUIET")]
    quiet: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if k.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((k.to_string(), v.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives enough feedback; library INFO logs only show when
    // it is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let input = OcrInput::from_path(&cli.input)
        .await
        .with_context(|| format!("Cannot use {}", cli.input.display()))?;

    // ── Build config & session ───────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;
    let mut session = Session::new(config).context("Failed to initialise chat client")?;

    // ── Extract ──────────────────────────────────────────────────────────
    let document = match session.ingest(&input).await {
        Ok(doc) => doc.clone(),
        Err(e @ DocQaError::OcrToolError { .. }) => {
            // Verbatim tool diagnostics are the useful part here.
            return Err(anyhow::Error::new(e).context("OCR failed"));
        }
        Err(e) => return Err(e).context("Extraction failed"),
    };

    if let Some(ref dir) = cli.save_images {
        save_images(&document, dir).await?;
    }

    if !cli.json {
        if cli.print_context {
            println!("{}", document.grounding_context());
        } else if !cli.quiet || cli.questions.is_empty() {
            print_document(&document);
        }
        for w in &document.warnings {
            eprintln!("{} {}", cyan("⚠"), w);
        }
    }

    // ── Questions ────────────────────────────────────────────────────────
    let mut exchanges = Vec::new();
    let mut failures = 0usize;

    for question in &cli.questions {
        if !ask_and_print(&mut session, question, &cli, show_progress).await {
            failures += 1;
        }
        if let Some(ex) = session.exchange() {
            exchanges.push(ex.clone());
        }
    }

    if cli.interactive {
        if !document.has_content() && !cli.quiet {
            eprintln!(
                "{} OCR produced no text or tables; answers will not be grounded in anything.",
                cyan("⚠")
            );
        }
        let stdin = io::stdin();
        loop {
            if !cli.quiet {
                eprint!("{} ", bold("?"));
                io::stderr().flush().ok();
            }
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).context("Failed to read stdin")? == 0 {
                break;
            }
            let question = line.trim();
            if question.is_empty() || question.eq_ignore_ascii_case("exit") {
                break;
            }
            if !ask_and_print(&mut session, question, &cli, show_progress).await {
                failures += 1;
            }
            if let Some(ex) = session.exchange() {
                exchanges.push(ex.clone());
            }
        }
    }

    if cli.json {
        let out = serde_json::json!({
            "document": document,
            "context": document.grounding_context(),
            "exchanges": exchanges,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise output")?
        );
    }

    if failures > 0 {
        anyhow::bail!("{failures} question(s) could not be answered");
    }
    Ok(())
}

/// Ask one question, print the answer (or error). Returns false on failure.
async fn ask_and_print(session: &mut Session, question: &str, cli: &Cli, show_progress: bool) -> bool {
    let bar = show_progress.then(|| spinner("LLM", "thinking…"));
    let result = session.ask(question).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(answer) => {
            if !cli.json {
                if !cli.quiet {
                    eprintln!("{} {}", cyan("◆"), bold(question));
                }
                println!("{answer}");
            }
            true
        }
        Err(e) => {
            let label = if e.is_chat_failure() {
                "LLM request failed"
            } else {
                "Question rejected"
            };
            eprintln!("{} {}: {}", red("✘"), label, e);
            false
        }
    }
}

fn print_document(doc: &ExtractedDocument) {
    if !doc.text.is_empty() {
        println!("{}", bold("Text"));
        println!("{}", doc.text);
    }
    for (i, table) in doc.tables.iter().enumerate() {
        println!();
        println!("{} {}", bold(&format!("Table {}", i + 1)), dim(&table.source));
        println!("{}", table.text);
    }
    if !doc.images.is_empty() {
        println!();
        println!("{}", bold("Images"));
        for img in &doc.images {
            println!("  {}  {}", img.name, dim(&format!("{} bytes", img.bytes.len())));
        }
    }
    if !doc.has_content() && doc.images.is_empty() {
        eprintln!("{} OCR produced no text, tables or images", cyan("⚠"));
    }
}

async fn save_images(doc: &ExtractedDocument, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    for (i, img) in doc.images.iter().enumerate() {
        // Prefix with the index: names repeat across OCR page directories.
        let path = dir.join(format!("{:03}_{}", i + 1, img.name));
        tokio::fs::write(&path, &img.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .ocr_tool(&cli.ocr_tool)
        .ocr_method(&cli.ocr_method)
        .chat_url(&cli.chat_url)
        .model(&cli.model)
        .chat_timeout_secs(cli.chat_timeout);

    for (k, v) in &cli.ocr_env {
        builder = builder.ocr_env(k, v);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
