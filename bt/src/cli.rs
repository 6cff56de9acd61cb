//! CLI command definitions and text rendering

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;

use crate::domain::{ChatMessage, TodoList};
use crate::parser::{Section, Tier};

/// BA Todo - turn user stories into business-analyst to-do lists
#[derive(Debug, Parser)]
#[command(
    name = "bt",
    about = "Generate, parse and store BA to-do lists from user stories",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Parse an LLM reply into sections (reads stdin when no file is given)
    Parse {
        /// File holding the reply text
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate a to-do list for a user story
    Generate {
        /// The user story
        #[arg(value_name = "USER_STORY")]
        user_story: String,

        /// Store the generated list
        #[arg(short, long)]
        save: bool,

        /// Store the generated list as accepted (implies --save)
        #[arg(short, long)]
        accept: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show stored to-do lists, most recent first
    History {
        /// Maximum number of lists to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Include lists that were never accepted
        #[arg(long, conflicts_with = "chats")]
        all: bool,

        /// Show logged chat exchanges instead of to-do lists
        #[arg(long)]
        chats: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

impl Command {
    /// Whether this command logs to stderr instead of the log file
    pub fn logs_to_stderr(&self) -> bool {
        matches!(self, Self::Serve { .. })
    }
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use 'text' or 'json'", s)),
        }
    }
}

const NUMERALS: [&str; 3] = ["I", "II", "III"];

/// Render sections as a numbered checklist
pub fn render_sections(sections: &[Section]) -> String {
    if sections.is_empty() {
        return format!("{}\n", "(empty input, no sections)".dimmed());
    }

    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        let numeral = NUMERALS.get(i).copied().unwrap_or("-");
        out.push_str(&format!("{}. {}\n", numeral, section.title.bold()));
        if section.tasks.is_empty() {
            out.push_str(&format!("  {}\n", "(no tasks)".dimmed()));
        }
        for task in &section.tasks {
            out.push_str(&format!("  - [ ] {}\n", task));
        }
        out.push('\n');
    }
    out
}

/// One-line label for the strategy that produced a parse
pub fn render_tier(tier: Option<Tier>) -> String {
    let Some(tier) = tier else {
        return "nothing to parse".dimmed().to_string();
    };
    let label = format!("parsed via {}", tier);
    match tier {
        Tier::RomanNumerals | Tier::HeaderKeywords => label.green(),
        Tier::BulletBuckets => label.yellow(),
        Tier::EmptySkeleton => label.red(),
    }
    .to_string()
}

fn format_when(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render a stored list summary line
pub fn render_history_line(list: &TodoList) -> String {
    let when = format_when(list.generated_at);
    let status = if list.accepted {
        "accepted".green()
    } else {
        "draft".yellow()
    };
    format!(
        "{}  {}  {:<8}  {} ({} tasks)",
        list.id.cyan(),
        when,
        status,
        list.user_story,
        list.task_count()
    )
}

const REPLY_PREVIEW_CHARS: usize = 60;

/// Render a logged chat exchange: the user message, then the first reply line
pub fn render_chat_line(chat: &ChatMessage) -> String {
    let first_line = chat.ai_reply.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    let mut preview: String = first_line.chars().take(REPLY_PREVIEW_CHARS).collect();
    if first_line.chars().count() > REPLY_PREVIEW_CHARS {
        preview.push_str("...");
    }
    format!(
        "{}  {}  {}\n    {}",
        chat.id.cyan(),
        format_when(chat.timestamp),
        chat.user_message,
        preview.dimmed()
    )
}
