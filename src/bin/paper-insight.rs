//! CLI binary for paper-insight.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig` and prints per-document results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use paper_insight::{
    analyze_pdf, search_and_analyze, store_reports, AnalysisConfig, AnalysisOutcome,
    AnalysisProgressCallback, DocumentReport, JsonLinesSink, ProgressCallback, Stage,
    TaskSelection,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while downloading, then a bar over documents
/// whose message names the running stage.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_download(&self, index: usize, total: usize, url: &str, saved: bool) {
        self.bar.set_prefix("Downloading");
        let mark = if saved { green("✓") } else { red("✗") };
        self.bar
            .println(format!("  {mark} [{index}/{total}] {}", dim(url)));
    }

    fn on_batch_start(&self, total_documents: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_documents as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Analysing");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Analysing {total_documents} document(s)…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, document_id: &str) {
        self.bar.set_prefix("Analysing");
        self.bar.set_message(document_id.to_string());
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(stage.to_string());
    }

    fn on_document_complete(
        &self,
        index: usize,
        total: usize,
        document_id: &str,
        error: Option<&str>,
    ) {
        match error {
            None => self.bar.println(format!(
                "  {} {:>3}/{:<3}  {}",
                green("✓"),
                index,
                total,
                document_id
            )),
            Some(e) => {
                self.errors.fetch_add(1, Ordering::SeqCst);
                self.bar.println(format!(
                    "  {} {:>3}/{:<3}  {}  {}",
                    red("✗"),
                    index,
                    total,
                    document_id,
                    red(e)
                ));
            }
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} document(s) analysed",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} document(s) analysed  ({} failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise one paper
  paper-insight analyze paper.pdf

  # Every task, JSON output
  paper-insight analyze --tasks all --json https://arxiv.org/pdf/1706.03762

  # Search, download five papers, analyse them and store the results
  paper-insight search "graph neural networks" --num 5 --tasks all --sink results.jsonl

  # Also report keywords and topic
  paper-insight analyze --keywords 8 paper.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium
"#;

/// Search for, download and analyse academic papers with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "paper-insight",
    version,
    about = "Search, download and analyse academic PDFs with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    opts: SharedOpts,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one local PDF or PDF URL.
    Analyze {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
    },
    /// Search Google Scholar, download the PDFs, and analyse each one.
    Search {
        /// Search query; also names the download sub-folder.
        query: String,

        /// Number of papers to fetch.
        #[arg(long, env = "PAPER_INSIGHT_NUM_RESULTS", default_value_t = 5)]
        num: usize,

        /// Folder downloads are stored under.
        #[arg(long, env = "PAPER_INSIGHT_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SharedOpts {
    /// Tasks to show: summary, metadata, sentiment, entities, or all.
    #[arg(long, global = true, env = "PAPER_INSIGHT_TASKS", default_value = "summary")]
    tasks: String,

    /// Workflow timeout per document, in seconds.
    #[arg(long, global = true, env = "PAPER_INSIGHT_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// LLM model ID (e.g. gpt-4o, gpt-4o-mini, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Pages of text read from each PDF.
    #[arg(long, global = true, env = "PAPER_INSIGHT_MAX_PAGES", default_value_t = 10)]
    max_pages: usize,

    /// Append completed results to this JSON Lines file.
    #[arg(long, global = true, env = "PAPER_INSIGHT_SINK")]
    sink: Option<PathBuf>,

    /// Also report this many keywords and the document topic.
    #[arg(long, global = true, env = "PAPER_INSIGHT_KEYWORDS")]
    keywords: Option<usize>,

    /// HTTP timeout for search and downloads, in seconds.
    #[arg(long, global = true, env = "PAPER_INSIGHT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output JSON reports instead of text.
    #[arg(long, global = true, env = "PAPER_INSIGHT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PAPER_INSIGHT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPER_INSIGHT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PAPER_INSIGHT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let opts = &cli.opts;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !opts.quiet && !opts.no_progress && !opts.json;
    let filter = if opts.verbose {
        "debug"
    } else if opts.quiet || show_progress {
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };

    let reports = match &cli.command {
        Command::Analyze { input } => {
            let config = build_config(opts, None, progress_cb.clone())?;
            if let Some(ref cb) = progress_cb {
                cb.on_batch_start(1);
                cb.on_document_start(1, 1, input);
            }
            let report = analyze_pdf(input, &config)
                .await
                .context("Analysis failed")?;
            if let Some(ref cb) = progress_cb {
                cb.on_document_complete(1, 1, input, report.outcome.error());
                cb.on_batch_complete(1, usize::from(!report.outcome.is_failed()));
            }
            vec![report]
        }
        Command::Search {
            query,
            num,
            data_dir,
        } => {
            let mut config = build_config(opts, Some(*num), progress_cb.clone())?;
            config.data_dir = data_dir.clone();
            search_and_analyze(query, &config)
                .await
                .with_context(|| format!("Search for '{query}' failed"))?
        }
    };

    // ── Output ───────────────────────────────────────────────────────────
    if opts.json {
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialise reports")?;
        println!("{json}");
    } else {
        for report in &reports {
            print_report(report, opts.keywords.is_some());
        }
    }

    if let Some(ref path) = opts.sink {
        let sink = JsonLinesSink::new(path);
        let stored = store_reports(&reports, &sink)
            .await
            .context("Failed to store results")?;
        if !opts.quiet {
            eprintln!("Stored {stored} record(s) in {}", bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(
    opts: &SharedOpts,
    num_results: Option<usize>,
    progress: Option<ProgressCallback>,
) -> Result<AnalysisConfig> {
    let tasks = TaskSelection::parse_list(&opts.tasks).context("Invalid --tasks")?;

    let mut builder = AnalysisConfig::builder()
        .tasks(tasks)
        .timeout_secs(opts.timeout)
        .max_pages(opts.max_pages)
        .download_timeout_secs(opts.download_timeout)
        .keyword_count(opts.keywords.unwrap_or(0));

    if let Some(n) = num_results {
        builder = builder.num_results(n);
    }
    if let Some(ref model) = opts.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = opts.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_report(report: &DocumentReport, with_keywords: bool) {
    println!("{}", bold(&format!("── {} ──", report.document_id)));
    match &report.outcome {
        AnalysisOutcome::Failed(f) => println!("{} {}", red("Error:"), f.error),
        AnalysisOutcome::Completed(results) => {
            if let Some(ref summary) = results.summary {
                println!("{}\n{}\n", cyan("Summary"), summary);
            }
            if let Some(ref meta) = results.metadata {
                println!("{}", cyan("Metadata"));
                println!("  Title:            {}", meta.title);
                println!("  Authors:          {}", meta.authors.join(", "));
                println!("  Publication Date: {}", meta.publication_date);
                println!("  Abstract:         {}\n", meta.abstract_text);
            }
            if let Some(ref sentiment) = results.sentiment {
                println!("{} {}\n", cyan("Sentiment:"), sentiment);
            }
            if let Some(ref entities) = results.entities {
                println!("{}", cyan("Entities"));
                println!("  names:   {:?}", entities.names);
                println!("  dates:   {:?}", entities.dates);
                println!("  amounts: {:?}\n", entities.amounts);
            }
        }
    }
    if with_keywords {
        println!("{} {}", cyan("Keywords:"), report.keywords.join(", "));
        println!("{} {}", cyan("Topic:"), report.topic);
    }
    println!("{}", dim(&format!("{}ms", report.duration_ms)));
}
