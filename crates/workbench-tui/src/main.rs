use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use workbench_core::{workflow, Config, Message, Mode, RagClient, UploadStatus, Workbench};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

const DEFAULT_LOG_FILTER: &str = "rag_workbench=info,workbench_core=info";

#[derive(Parser)]
#[command(name = "rag-workbench")]
#[command(about = "Chat with your PDFs through a RAG backend and compare retrieval modes")]
#[command(version)]
struct Cli {
    /// Backend origin, e.g. http://localhost:8000
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Retrieval mode: simple or agentic
    #[arg(long, global = true, value_parser = parse_mode)]
    mode: Option<Mode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a PDF to the backend for indexing
    Ingest {
        /// Path to the document
        path: PathBuf,
    },
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
        /// Also print the retrieved context passages
        #[arg(long)]
        contexts: bool,
    },
    /// Show the effective configuration
    Config {
        /// Persist the effective settings to the config file
        #[arg(long)]
        save: bool,
    },
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::from_str(s).ok_or_else(|| format!("unknown mode '{}' (expected simple or agentic)", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = match cli.command {
        None => init_file_logging(),
        Some(_) => {
            init_stderr_logging();
            None
        }
    };

    let repairing = matches!(cli.command, Some(Commands::Config { .. }));
    let config = load_config(&Config::config_path()?, repairing)?;
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let mode = config.resolve_mode(cli.mode);

    match cli.command {
        None => {
            info!(api_url = %api_url, mode = mode.as_str(), "starting workbench");
            run_tui(RagClient::new(&api_url), mode).await
        }
        Some(command) => {
            let client = RagClient::new(&api_url);
            match command {
                Commands::Ingest { path } => ingest_document(&client, mode, path).await,
                Commands::Ask { question, contexts } => {
                    ask_question(&client, mode, &question, contexts).await
                }
                Commands::Config { save } => show_config(config, &api_url, mode, save),
            }
        }
    }
}

/// Load the config file. The `config` command must still work when the file is
/// broken, since `config --save` is how it gets rewritten.
fn load_config(path: &std::path::Path, repairing: bool) -> Result<Config> {
    match Config::load_from(path) {
        Ok(config) => Ok(config),
        Err(err) if repairing => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable config file");
            Ok(Config::new())
        }
        Err(err) => Err(err.context(format!("could not load {}", path.display()))),
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// The TUI owns the terminal, so logs go to `<config_dir>/rag-workbench.log`.
/// The returned guard flushes the writer on drop.
fn init_file_logging() -> Option<WorkerGuard> {
    let dir = Config::config_dir().ok()?;
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(&dir, "rag-workbench.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_LOG_FILTER))
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .ok()?;

    Some(guard)
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

async fn run_tui(client: RagClient, mode: Mode) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(client, mode, events.sender());

    let result = async {
        while !app.should_quit {
            let area = terminal.draw(|frame| ui::render(&app, frame))?.area;
            app.set_scroll_limit(ui::max_scroll(&app, area));

            let Some(event) = events.next().await else {
                break;
            };
            handler::handle_event(&mut app, event)?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    result
}

async fn ingest_document(client: &RagClient, mode: Mode, path: PathBuf) -> Result<()> {
    let mut workbench = Workbench::new(mode);
    workbench.select_file(&path);

    let name = workbench.upload().selected_name().unwrap_or_default();
    println!("{} {}", "📄 Ingesting".bold().blue(), name.bold());

    workflow::submit_ingestion(&mut workbench, client).await;

    let upload = workbench.upload();
    match upload.status {
        UploadStatus::Success => {
            println!("{} {}", "✓".green(), upload.status_message.green());
            Ok(())
        }
        _ => bail!("{}", upload.status_message),
    }
}

async fn ask_question(client: &RagClient, mode: Mode, question: &str, show_contexts: bool) -> Result<()> {
    println!("{} {}", "🔍 Asking".bold().blue(), mode.display_name().dimmed());
    let reply = ask(client, mode, question).await?;

    println!("\n{}", reply.content);

    if !reply.sources.is_empty() {
        println!("\n{}", "Sources:".bold());
        for src in &reply.sources {
            println!("  • {} {}", src.source.cyan(), format!("(p.{})", src.page).dimmed());
        }
    }

    if show_contexts && !reply.contexts.is_empty() {
        println!("\n{}", "Contexts:".bold());
        for (i, context) in reply.contexts.iter().enumerate() {
            println!("{} {}", format!("[{}]", i + 1).yellow(), context.trim());
        }
    }

    Ok(())
}

/// One round trip through the chat workflow. A failed request comes back as
/// the transcript's error turn and is returned as an `Err` with its text.
async fn ask(client: &RagClient, mode: Mode, question: &str) -> Result<Message> {
    let mut workbench = Workbench::new(mode);
    if !workflow::submit_query(&mut workbench, client, question).await {
        bail!("Question is empty");
    }

    let Some(reply) = workbench.transcript().last().cloned() else {
        bail!("No answer received");
    };
    if reply.error {
        bail!("{}", reply.content.trim_start_matches("Error: "));
    }
    Ok(reply)
}

fn show_config(mut config: Config, api_url: &str, mode: Mode, save: bool) -> Result<()> {
    println!("{}", "⚙ Configuration".bold().blue());
    println!("  API URL: {}", api_url.cyan());
    println!("  Mode:    {}", mode.display_name().cyan());
    if let Ok(path) = Config::config_path() {
        println!("  File:    {}", path.display().to_string().dimmed());
    }

    if save {
        config.api_url = Some(api_url.to_string());
        config.default_mode = Some(mode);
        config.save()?;
        println!("{}", "✓ Saved".green());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_cli_parses_subcommands_and_globals() {
        let cli = Cli::try_parse_from([
            "rag-workbench",
            "ask",
            "what is this?",
            "--contexts",
            "--mode",
            "agentic",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(Mode::Agentic));
        match cli.command {
            Some(Commands::Ask { question, contexts }) => {
                assert_eq!(question, "what is this?");
                assert!(contexts);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_cli_without_subcommand_runs_tui() {
        let cli = Cli::try_parse_from(["rag-workbench", "--api-url", "http://x:1"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.api_url.as_deref(), Some("http://x:1"));
    }

    #[tokio::test]
    async fn test_ask_returns_answer_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/agentic"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "a document",
                "sources": [{"source": "doc.pdf", "page": 3, "content": "..."}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let reply = ask(&client, Mode::Agentic, "what is it?").await.unwrap();
        assert_eq!(reply.content, "a document");
        assert_eq!(reply.sources[0].page, 3);
    }

    #[tokio::test]
    async fn test_ask_failure_goes_through_error_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/simple"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "index empty"})))
            .mount(&server)
            .await;

        let client = RagClient::new(&server.uri());
        let err = ask(&client, Mode::Simple, "q").await.unwrap_err();
        assert_eq!(err.to_string(), "index empty");

        let err = ask(&client, Mode::Simple, "   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Question is empty");
    }

    #[test]
    fn test_broken_config_only_tolerated_by_config_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(load_config(&path, false).is_err());
        let config = load_config(&path, true).unwrap();
        assert!(config.api_url.is_none());
        assert_eq!(config.resolve_mode(None), Mode::Simple);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["rag-workbench", "--mode", "fancy"]).is_err());
    }
}
