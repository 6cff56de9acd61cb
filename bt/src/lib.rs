//! BA Todo - business-analyst to-do lists from user stories
//!
//! A user story goes to a generative-language API with a BA prompt; the
//! loosely formatted reply is parsed into three titled task sections, which
//! can be stored and later accepted.
//!
//! Core modules:
//! - `parser`: Reply-to-sections parser with a four-tier fallback chain
//! - `llm`: LLM client trait with Gemini and Anthropic implementations
//! - `prompts`: Handlebars prompt templates with file overrides
//! - `assistant`: Prompt, call, parse pipeline
//! - `domain`: Persisted records (TodoList, ChatMessage)
//! - `state`: Actor owning the TodoStore
//! - `server`: axum HTTP API and static web UI
//! - `config`: YAML configuration

pub mod assistant;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod parser;
pub mod prompts;
pub mod server;
pub mod state;

pub use assistant::{AssistantError, BaAssistant, Generated};
pub use config::Config;
pub use domain::{ChatMessage, TodoList};
pub use llm::{LlmClient, LlmError, create_client};
pub use parser::{ParseOutcome, Section, SectionKind, SectionParser, Tier, parse_sections};
pub use prompts::PromptLoader;
pub use server::{AppState, build_router};
pub use state::{StateError, StateManager};
