//! CLI binary for paperlens.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! `AssistConfig` / `ExtractOptions` / `MarkupOptions` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use paperlens::{
    extract_file, render_html_with, AssistConfig, ExtractOptions, FallbackPolicy, ListWrap,
    MarkupOptions, PaperAssistant, PaperSession,
};
use serde_json::json;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  paperlens extract paper.pdf
  paperlens extract https://arxiv.org/pdf/1706.03762 --json
  echo '**bold** and <think>hidden</think>' | paperlens render
  paperlens summarize paper.pdf -o summary.html
  paperlens ask paper.pdf -Q "What dataset was used?" -Q "What is the main result?"
  paperlens serve --port 3000

PROVIDERS:
  The LLM provider is auto-detected from OPENAI_API_KEY, ANTHROPIC_API_KEY,
  GEMINI_API_KEY, … unless --provider is given. EDGEQUAKE_LLM_PROVIDER plus
  EDGEQUAKE_MODEL select a provider and model from the environment.
"#;

/// Research-paper assistant: text recovery, LLM analysis and Q&A.
#[derive(Parser, Debug)]
#[command(
    name = "paperlens",
    version,
    about = "Research-paper assistant: text recovery, LLM analysis and Q&A",
    long_about = "Recover readable text from PDF research papers without a PDF engine, \
analyse them with an LLM, answer questions about them, and render model output as \
display-safe HTML. Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any \
OpenAI-compatible endpoint (Ollama, vLLM, NVIDIA NIM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: LlmArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PAPERLENS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "PAPERLENS_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PAPERLENS_TEMPERATURE", default_value_t = 0.6)]
    temperature: f32,

    /// Nucleus sampling mass (0.0–1.0).
    #[arg(long, global = true, env = "PAPERLENS_TOP_P", default_value_t = 0.95)]
    top_p: f32,

    /// Frequency penalty (-2.0–2.0).
    #[arg(
        long,
        global = true,
        env = "PAPERLENS_FREQUENCY_PENALTY",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    frequency_penalty: f32,

    /// Presence penalty (-2.0–2.0).
    #[arg(
        long,
        global = true,
        env = "PAPERLENS_PRESENCE_PENALTY",
        default_value_t = 0.0,
        allow_negative_numbers = true
    )]
    presence_penalty: f32,

    /// Max LLM output tokens per answer.
    #[arg(long, global = true, env = "PAPERLENS_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Retries per LLM call.
    #[arg(long, global = true, env = "PAPERLENS_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, global = true, env = "PAPERLENS_API_TIMEOUT", default_value_t = 90)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "PAPERLENS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Characters of extracted text sent for analysis.
    #[arg(long, global = true, env = "PAPERLENS_CONTEXT_CHARS", default_value_t = 4000)]
    context_chars: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recover text from a PDF file or URL (no LLM involved).
    Extract {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Print the full ExtractedDocument as JSON.
        #[arg(long)]
        json: bool,

        /// Fail instead of printing the placeholder outline.
        #[arg(long, env = "PAPERLENS_FAIL_ON_PLACEHOLDER")]
        fail_on_placeholder: bool,

        /// Reject inputs larger than this many bytes (0 disables the cap).
        #[arg(long, env = "PAPERLENS_MAX_BYTES", default_value_t = paperlens::config::DEFAULT_MAX_INPUT_BYTES)]
        max_bytes: usize,
    },

    /// Render model output (markdown with reasoning spans) to HTML.
    Render {
        /// Input file; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Keep HTML already present in the input instead of escaping it.
        #[arg(long)]
        raw_html: bool,

        /// Which contiguous list runs get a <ul> container.
        #[arg(long, value_enum, default_value = "every")]
        list_wrap: ListWrapArg,
    },

    /// Extract a paper and produce an LLM analysis as HTML.
    Summarize {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Write the HTML analysis to this file instead of stdout.
        #[arg(short, long, env = "PAPERLENS_OUTPUT")]
        output: Option<PathBuf>,

        /// Print document and analysis as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract and analyse a paper, then answer questions about it.
    Ask {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Question to answer; repeat for several.
        #[arg(short = 'Q', long = "question", required = true)]
        questions: Vec<String>,

        /// Questions answered at once.
        #[arg(short, long, env = "PAPERLENS_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Print answers as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP API (requires the `server` feature).
    Serve {
        /// Port to listen on.
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Address to bind.
        #[arg(long, env = "PAPERLENS_HOST", default_value = "0.0.0.0")]
        host: std::net::IpAddr,
    },
}

impl Command {
    fn wants_json(&self) -> bool {
        match self {
            Command::Extract { json, .. }
            | Command::Summarize { json, .. }
            | Command::Ask { json, .. } => *json,
            _ => false,
        }
    }

    fn calls_llm(&self) -> bool {
        matches!(self, Command::Summarize { .. } | Command::Ask { .. })
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ListWrapArg {
    Every,
    First,
}

impl From<ListWrapArg> for ListWrap {
    fn from(v: ListWrapArg) -> Self {
        match v {
            ListWrapArg::Every => ListWrap::EveryRun,
            ListWrapArg::First => ListWrap::FirstRun,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives enough feedback during LLM calls; library INFO logs
    // would only interleave with it.
    let show_progress = !cli.quiet && !cli.command.wants_json() && cli.command.calls_llm();
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

    match &cli.command {
        Command::Extract {
            input,
            json,
            fail_on_placeholder,
            max_bytes,
        } => {
            let opts = ExtractOptions {
                max_input_bytes: (*max_bytes > 0).then_some(*max_bytes),
                fallback: if *fail_on_placeholder {
                    FallbackPolicy::Fail
                } else {
                    FallbackPolicy::Placeholder
                },
            };
            let doc = extract_file(input, &opts, cli.llm.download_timeout)
                .await
                .context("Extraction failed")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&doc).context("Failed to serialise output")?
                );
            } else {
                write_stdout(&doc.text)?;
                if !cli.quiet {
                    eprintln!(
                        "{}  {} words  ~{} pages  {}",
                        green("✔"),
                        doc.word_count(),
                        doc.page_estimate,
                        dim(&format!("{:?}", doc.origin)),
                    );
                }
            }
        }

        Command::Render {
            file,
            raw_html,
            list_wrap,
        } => {
            let input = match file {
                Some(path) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };
            let opts = MarkupOptions {
                escape_html: !raw_html,
                list_wrap: (*list_wrap).into(),
            };
            write_stdout(&render_html_with(&input, &opts))?;
        }

        Command::Summarize {
            input,
            output,
            json,
        } => {
            let config = build_config(&cli, None)?;
            let assistant = Arc::new(PaperAssistant::new(config).context("LLM setup failed")?);
            let spinner = spinner(show_progress, "Analysing paper…");
            let session = PaperSession::open(assistant, input).await;
            finish(spinner);
            let session = session.context("Analysis failed")?;
            let analysis = session.analysis();

            if *json {
                let value = json!({
                    "document": session.document(),
                    "analysis": analysis,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&value).context("Failed to serialise output")?
                );
            } else if let Some(path) = output {
                tokio::fs::write(path, &analysis.html)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
                }
            } else {
                write_stdout(&analysis.html)?;
            }

            if !cli.quiet && !*json {
                eprintln!(
                    "   {} tokens in  /  {} tokens out  ({}ms)",
                    dim(&analysis.input_tokens.to_string()),
                    dim(&analysis.output_tokens.to_string()),
                    analysis.duration_ms,
                );
            }
        }

        Command::Ask {
            input,
            questions,
            concurrency,
            json,
        } => {
            let config = build_config(&cli, Some(*concurrency))?;
            let assistant = Arc::new(PaperAssistant::new(config).context("LLM setup failed")?);
            let spinner = spinner(show_progress, "Analysing paper…");
            let session = match PaperSession::open(assistant, input).await {
                Ok(session) => session,
                Err(e) => {
                    finish(spinner);
                    return Err(e).context("Analysis failed");
                }
            };
            if let Some(ref bar) = spinner {
                bar.set_message(format!("Answering {} question(s)…", questions.len()));
            }
            let answers = session.ask_many(questions).await;
            finish(spinner);

            if *json {
                let items: Vec<_> = questions
                    .iter()
                    .zip(&answers)
                    .map(|(q, a)| match a {
                        Ok(reply) => json!({ "question": q, "answer": reply.html }),
                        Err(e) => json!({ "question": q, "error": e.to_string() }),
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&items).context("Failed to serialise output")?
                );
            } else {
                for (q, a) in questions.iter().zip(&answers) {
                    println!("{}", bold(&format!("Q: {q}")));
                    match a {
                        Ok(reply) => println!("{}\n", reply.html),
                        Err(e) => println!("error: {e}\n"),
                    }
                }
            }

            let failed = answers.iter().filter(|a| a.is_err()).count();
            if failed > 0 {
                anyhow::bail!("{failed} of {} questions failed", answers.len());
            }
        }

        Command::Serve { port, host } => {
            serve(&cli, std::net::SocketAddr::new(*host, *port)).await?;
        }
    }

    Ok(())
}

#[cfg(feature = "server")]
async fn serve(cli: &Cli, addr: std::net::SocketAddr) -> Result<()> {
    let config = build_config(cli, None)?;
    let extract = config.extract.clone();
    let assistant = match PaperAssistant::new(config) {
        Ok(a) => Some(Arc::new(a)),
        Err(e) => {
            tracing::warn!("LLM provider unavailable, /api/llama will answer 500: {e}");
            None
        }
    };
    let state = paperlens::server::AppState::new(assistant, extract);
    paperlens::server::serve(addr, state)
        .await
        .with_context(|| format!("Server on {addr} failed"))
}

#[cfg(not(feature = "server"))]
async fn serve(_cli: &Cli, _addr: std::net::SocketAddr) -> Result<()> {
    anyhow::bail!("this build of paperlens was compiled without the `server` feature")
}

/// Map CLI args to `AssistConfig`.
fn build_config(cli: &Cli, concurrency: Option<usize>) -> Result<AssistConfig> {
    let llm = &cli.llm;
    let mut builder = AssistConfig::builder()
        .temperature(llm.temperature)
        .top_p(llm.top_p)
        .frequency_penalty(llm.frequency_penalty)
        .presence_penalty(llm.presence_penalty)
        .max_tokens(llm.max_tokens)
        .max_retries(llm.max_retries)
        .api_timeout_secs(llm.api_timeout)
        .download_timeout_secs(llm.download_timeout)
        .context_chars(llm.context_chars);

    if let Some(ref model) = llm.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = llm.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(n) = concurrency {
        builder = builder.concurrency(n);
    }

    builder.build().context("Invalid configuration")
}

fn spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
