mod display;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand};
use resumelens_ai::{Analysis, Analyzer, ChatMessage, DEFAULT_MODEL, analyze_response};
use resumelens_core::{CanonicalRecord, JobContext, PipelineError};
use resumelens_gemini::{DEFAULT_API_BASE, GeminiClient};
use resumelens_render::{render_document, render_optimized_text};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "resumelens", about = "ATS-style résumé analysis", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a résumé against a job description.
    Analyze(AnalyzeArgs),
    /// Re-render a saved record to HTML.
    Render(RenderArgs),
    /// Ask a follow-up question about a saved record.
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
struct BackendArgs {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    #[arg(long, env = "RESUMELENS_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "RESUMELENS_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

impl BackendArgs {
    fn client(&self) -> GeminiClient {
        GeminiClient::new(self.api_key.clone(), self.model.clone()).with_base_url(&self.api_base)
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Extracted résumé text (`-` for stdin).
    #[arg(long, value_name = "FILE")]
    resume: PathBuf,

    #[arg(long)]
    job_title: String,

    #[arg(long, default_value = "")]
    job_level: String,

    #[arg(long, default_value = "")]
    company: String,

    /// Job description text (`-` for stdin).
    #[arg(long, value_name = "FILE")]
    description: Option<PathBuf>,

    /// Use a saved raw model response instead of calling the backend.
    #[arg(long, value_name = "FILE")]
    response: Option<PathBuf>,

    /// Write the canonical record as JSON.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Write the annotated optimized résumé as HTML.
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    #[command(flatten)]
    backend: BackendArgs,
}

impl AnalyzeArgs {
    /// Only one input can be read from stdin.
    fn check_stdin(&self) -> Result<()> {
        let stdin = Path::new("-");
        let readers: Vec<&str> = [
            ("--resume", Some(self.resume.as_path())),
            ("--description", self.description.as_deref()),
            ("--response", self.response.as_deref()),
        ]
        .into_iter()
        .filter(|(_, path)| *path == Some(stdin))
        .map(|(flag, _)| flag)
        .collect();
        ensure!(
            readers.len() <= 1,
            "only one of {} may read from stdin",
            readers.join(" and ")
        );
        Ok(())
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Canonical record JSON.
    #[arg(long, value_name = "FILE")]
    record: PathBuf,

    /// Skip highlight spans.
    #[arg(long)]
    plain: bool,

    /// Output file; stdout when omitted.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Canonical record JSON.
    #[arg(long, value_name = "FILE")]
    record: PathBuf,

    #[arg(long)]
    message: String,

    /// Earlier messages as a JSON array of `{role, content}`.
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Print sanitized HTML instead of Markdown.
    #[arg(long)]
    html: bool,

    #[command(flatten)]
    backend: BackendArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    info!("resumelens v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => cmd_analyze(args).await,
        Command::Render(args) => cmd_render(args),
        Command::Chat(args) => cmd_chat(args).await,
    }
}

// ── Commands ──

async fn cmd_analyze(args: AnalyzeArgs) -> Result<()> {
    args.check_stdin()?;
    let source_text = read_text(&args.resume)?;
    let description = match &args.description {
        Some(path) => read_text(path)?,
        None => String::new(),
    };
    let job = JobContext {
        title: args.job_title,
        level: args.job_level,
        company: args.company,
        description,
    };

    let analysis: Analysis = match &args.response {
        Some(path) => {
            let raw = read_text(path)?;
            info!(path = %path.display(), "using saved model response");
            analyze_response(&raw, &job, &source_text)
                .map_err(|e| fail(PipelineError::from(e)))?
        }
        None => {
            let analyzer = Analyzer::new(args.backend.client());
            analyzer.analyze(&job, &source_text).await.map_err(fail)?
        }
    };

    display::print_record_card(&analysis.record);
    display::print_diagnostics(&analysis.warnings, &analysis.document.skipped);

    if let Some(path) = &args.out {
        let json = serde_json::to_string_pretty(&analysis.record)?;
        write_file(path, &json)?;
    }
    if let Some(path) = &args.html {
        write_file(path, &analysis.document.html)?;
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let record = load_record(&args.record)?;
    let html = if args.plain {
        render_optimized_text(&record)
    } else {
        let doc = render_document(&record);
        display::print_diagnostics(&[], &doc.skipped);
        doc.html
    };

    match &args.out {
        Some(path) => write_file(path, &html),
        None => {
            println!("{html}");
            Ok(())
        }
    }
}

async fn cmd_chat(args: ChatArgs) -> Result<()> {
    let record = load_record(&args.record)?;
    let history: Vec<ChatMessage> = match &args.history {
        Some(path) => serde_json::from_str(&read_text(path)?)
            .with_context(|| format!("invalid chat history in {}", path.display()))?,
        None => Vec::new(),
    };

    let analyzer = Analyzer::new(args.backend.client());
    let reply = analyzer
        .chat(&record, &history, &args.message)
        .await
        .map_err(|e| fail(PipelineError::from(e)))?;

    if args.html {
        println!("{}", reply.html);
    } else {
        println!("{}", reply.text);
    }
    Ok(())
}

// ── Helpers ──

/// Log the full failure and surface only the user-facing category.
fn fail(err: PipelineError) -> anyhow::Error {
    match &err {
        PipelineError::Malformed(e) => {
            error!(reason = %e.reason, raw = e.raw_preview(), "analysis failed");
        }
        PipelineError::Upstream(e) => {
            error!(kind = e.kind.as_str(), detail = %e.detail, "generation failed");
        }
    }
    anyhow::anyhow!(err.user_message())
}

fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

fn load_record(path: &Path) -> Result<CanonicalRecord> {
    let json = read_text(path)?;
    serde_json::from_str(&json)
        .with_context(|| format!("invalid record JSON in {}", path.display()))
}
