//! BA assistant pipeline
//!
//! Renders the BA prompts, calls the LLM and parses the reply into sections.
//! Independent of HTTP so the CLI and the server share it.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::parser::{Section, SectionParser, Tier};
use crate::prompts::{PromptContext, PromptLoader};

/// Errors from the assistant pipeline
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Message is required")]
    MissingInput,

    #[error("LLM request failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

/// Result of one BA generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Raw LLM reply
    pub reply: String,
    /// Sections parsed from the reply
    pub parsed: Vec<Section>,
    /// Strategy that produced `parsed`
    pub tier: Option<Tier>,
}

pub struct BaAssistant {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    parser: SectionParser,
    max_tokens: u32,
}

impl BaAssistant {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            parser: SectionParser::new(),
            max_tokens,
        }
    }

    /// Model identifier of the underlying client
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Send `message` to the model as-is and return the reply text
    pub async fn chat(&self, message: &str) -> Result<String, AssistantError> {
        debug!(message_len = message.len(), "chat: called");
        if message.trim().is_empty() {
            return Err(AssistantError::MissingInput);
        }

        let request = CompletionRequest::single("", message, self.max_tokens);
        let reply = self.llm.complete(request).await?.text()?;
        debug!(reply_len = reply.len(), "chat: reply received");
        Ok(reply)
    }

    /// Generate a BA to-do list for `user_story`
    pub async fn generate(&self, user_story: &str) -> Result<Generated, AssistantError> {
        debug!(story_len = user_story.len(), "generate: called");
        if user_story.trim().is_empty() {
            return Err(AssistantError::MissingInput);
        }

        let context = PromptContext::new(user_story);
        let system = self
            .prompts
            .ba_system(&context)
            .map_err(|e| AssistantError::Prompt(e.to_string()))?;
        let user = self
            .prompts
            .ba_user(&context)
            .map_err(|e| AssistantError::Prompt(e.to_string()))?;

        let request = CompletionRequest::single(system, user, self.max_tokens);
        let reply = self.llm.complete(request).await?.text()?;

        let outcome = self.parser.parse_outcome(Some(reply.as_str()));
        info!(
            model = %self.llm.model(),
            tier = ?outcome.tier,
            tasks = outcome.sections.iter().map(|s| s.tasks.len()).sum::<usize>(),
            "generate: reply parsed"
        );

        Ok(Generated {
            reply,
            parsed: outcome.sections,
            tier: outcome.tier,
        })
    }
}
