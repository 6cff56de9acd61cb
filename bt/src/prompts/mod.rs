//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for BA to-do generation.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (override, when configured)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
