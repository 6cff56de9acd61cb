//! BA Todo CLI entry point

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use batodo::cli::{Cli, Command, OutputFormat, render_chat_line, render_history_line, render_sections, render_tier};
use batodo::config::Config;
use batodo::llm::create_client;
use batodo::prompts::PromptLoader;
use batodo::server::{self, AppState};
use batodo::state::StateManager;
use batodo::{BaAssistant, SectionParser, TodoList};

/// Map a level name to a tracing level; unknown names fall back to INFO
fn parse_log_level(level: Option<&str>) -> (tracing::Level, Option<String>) {
    match level.map(|s| s.to_uppercase()) {
        None => (tracing::Level::INFO, None),
        Some(s) => match s.as_str() {
            "TRACE" => (tracing::Level::TRACE, None),
            "DEBUG" => (tracing::Level::DEBUG, None),
            "INFO" => (tracing::Level::INFO, None),
            "WARN" | "WARNING" => (tracing::Level::WARN, None),
            "ERROR" => (tracing::Level::ERROR, None),
            _ => (tracing::Level::INFO, Some(s)),
        },
    }
}

fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("batodo")
        .join("logs")
        .join("batodo.log")
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, to_stderr: bool) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let (level, unknown) = parse_log_level(cli_log_level.or(config_log_level));
    if let Some(name) = unknown {
        eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", name);
    }
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    if to_stderr {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        // Keep stdout clean for command output
        let path = log_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create log directory")?;
        }
        let log_file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_ansi(false)
            .with_env_filter(filter)
            .init();
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the API key variable
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(
        cli.log_level.as_deref(),
        config_log_level.as_deref(),
        cli.command.logs_to_stderr(),
    )
    .context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { host, port } => cmd_serve(config, host, port).await,
        Command::Parse { file, format } => cmd_parse(file.as_deref(), format),
        Command::Generate {
            user_story,
            save,
            accept,
            format,
        } => cmd_generate(&config, &user_story, save || accept, accept, format).await,
        Command::History {
            limit,
            all,
            chats: false,
            format,
        } => cmd_history(&config, limit, all, format).await,
        Command::History {
            limit,
            chats: true,
            format,
            ..
        } => cmd_chat_history(&config, limit, format).await,
    }
}

fn build_assistant(config: &Config) -> Result<BaAssistant> {
    config.validate()?;
    let llm = create_client(&config.llm)?;
    let prompts = PromptLoader::new(config.prompts.dir.as_ref());
    let assistant = BaAssistant::new(llm, prompts, config.llm.max_tokens);
    info!(provider = %config.llm.provider, model = %assistant.model(), "LLM client ready");
    Ok(assistant)
}

async fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let assistant = build_assistant(&config)?;
    let store = StateManager::spawn(&config.storage.store_dir).context("Failed to open store")?;
    info!(store_dir = %config.storage.store_dir.display(), "Store opened");

    let result = server::serve(&config.server, AppState::new(assistant, store.clone())).await;
    store.shutdown().await?;
    result
}

fn cmd_parse(file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    debug!(text_len = text.len(), "cmd_parse: input read");

    let outcome = SectionParser::new().parse_outcome(Some(text.as_str()));
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => {
            print!("{}", render_sections(&outcome.sections));
            eprintln!("{}", render_tier(outcome.tier));
        }
    }
    Ok(())
}

async fn cmd_generate(
    config: &Config,
    user_story: &str,
    save: bool,
    accept: bool,
    format: OutputFormat,
) -> Result<()> {
    let assistant = build_assistant(config)?;
    let generated = assistant.generate(user_story).await?;

    let id = if save {
        let store = StateManager::spawn(&config.storage.store_dir).context("Failed to open store")?;
        let list = TodoList::new(user_story, generated.parsed.clone()).with_accepted(accept);
        let id = store.create_todo_list(list).await?;
        store.shutdown().await?;
        Some(id)
    } else {
        None
    };

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "reply": generated.reply,
                "parsed": generated.parsed,
                "tier": generated.tier,
                "id": id,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            print!("{}", render_sections(&generated.parsed));
            eprintln!("{}", render_tier(generated.tier));
            if let Some(id) = id {
                let label = if accept { "Accepted" } else { "Saved" };
                println!("{} {}", label.green().bold(), id);
            }
        }
    }
    Ok(())
}

async fn cmd_history(config: &Config, limit: usize, all: bool, format: OutputFormat) -> Result<()> {
    let store = StateManager::spawn(&config.storage.store_dir).context("Failed to open store")?;
    let accepted = if all { None } else { Some(true) };
    let lists = store.list_todo_lists(accepted, Some(limit)).await?;
    store.shutdown().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&lists)?),
        OutputFormat::Text => {
            if lists.is_empty() {
                println!("No to-do lists found.");
            }
            for list in &lists {
                println!("{}", render_history_line(list));
            }
        }
    }
    Ok(())
}

async fn cmd_chat_history(config: &Config, limit: usize, format: OutputFormat) -> Result<()> {
    let store = StateManager::spawn(&config.storage.store_dir).context("Failed to open store")?;
    let chats = store.list_chats(Some(limit)).await?;
    store.shutdown().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chats)?),
        OutputFormat::Text => {
            if chats.is_empty() {
                println!("No chat messages found.");
            }
            for chat in &chats {
                println!("{}", render_chat_line(chat));
            }
        }
    }
    Ok(())
}
