use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use shopbot::harness::{load_cases, run_cases};
use shopbot::session::run_chat;
use shopbot::{Chatbot, ChatbotConfig, ChatbotError};
use shopbot_index::IndexError;

#[derive(Debug, Parser)]
#[command(name = "shopbot", version, about = "Retrieval-augmented e-commerce support chatbot")]
struct Cli {
    /// Prompt corpus, one snippet per line.
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,
    /// Number of corpus entries passed to the model as context.
    #[arg(long, global = true)]
    top_k: Option<usize>,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Interactive session on stdin/stdout (default).
    Chat,
    /// Run JSON test cases and print a report.
    Eval {
        #[arg(required = true)]
        cases: Vec<PathBuf>,
        /// Fail cases whose answer takes at least this long.
        #[arg(long)]
        max_seconds: Option<f64>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    shopbot::logging::init();
    let cli = Cli::parse();
    let chat = matches!(cli.cmd, None | Some(Cmd::Chat));
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log_failure(&e);
            // An interactive session reports its failure like any other
            // reply and terminates normally.
            if chat {
                println!("Error: {e}");
                ExitCode::SUCCESS
            } else {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        }
    }
}

fn log_failure(e: &ChatbotError) {
    match e {
        ChatbotError::Configuration(_) => tracing::error!("startup aborted: bad configuration"),
        ChatbotError::Index(IndexError::NotFound(path)) => {
            tracing::error!(path = %path.display(), "startup aborted: corpus not found")
        }
        ChatbotError::Index(err) => tracing::error!(error = %err, "index build failed"),
        ChatbotError::Upstream(err) => tracing::error!(error = %err, "upstream service failed"),
        ChatbotError::Io(err) => tracing::error!(error = %err, "terminal i/o failed"),
        ChatbotError::TestData { path, .. } => {
            tracing::error!(path = %path.display(), "could not load test cases")
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, ChatbotError> {
    let mut config = ChatbotConfig::from_env()?;
    if let Some(path) = cli.corpus {
        config = config.with_corpus_path(path);
    }
    if let Some(k) = cli.top_k {
        config = config.with_top_k(k)?;
    }

    match cli.cmd.unwrap_or(Cmd::Chat) {
        Cmd::Chat => {
            let bot = Chatbot::setup(&config).await?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            run_chat(&bot, stdin.lock(), &mut stdout).await?;
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Eval {
            cases,
            max_seconds,
            json,
        } => {
            let budget = match max_seconds {
                Some(s) if s.is_finite() && s > 0.0 => Some(Duration::from_secs_f64(s)),
                Some(_) => {
                    return Err(ChatbotError::Configuration(
                        "--max-seconds must be a positive number".to_string(),
                    ))
                }
                None => None,
            };
            let mut all = Vec::new();
            for path in &cases {
                all.extend(load_cases(path)?);
            }
            let bot = Chatbot::setup(&config).await?;
            let report = run_cases(&bot, &all, budget).await;
            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| ChatbotError::Io(std::io::Error::other(e)))?;
                println!("{text}");
            } else {
                println!("{}", report.render());
            }
            Ok(if report.failed() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
