//! # Application State
//!
//! Core business state. This module contains domain logic only, no
//! TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── provider: Arc<dyn CompletionProvider>  // upstream model API
//! ├── history: ChatHistory          // append-only chat turns
//! ├── input: String                 // text in the prompt field
//! ├── error: Option<String>         // inline error line
//! ├── pending: Option<PendingExchange> // request in flight
//! ├── status_message: String        // status bar text
//! ├── model_name: String            // current model
//! ├── question: String              // fixed question appended to prompts
//! ├── generation / safety           // request options
//! └── rng: StdRng                   // source for "surprise me"
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::core::config::ResolvedConfig;
use crate::inference::{ChatHistory, CompletionProvider, GenerationConfig, SafetySetting};

/// A submitted prompt and the response text streamed for it so far.
///
/// Shown live while streaming but kept out of `history` until the stream
/// ends, so history only ever grows by whole exchanges.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingExchange {
    /// What the user typed (without the appended question)
    pub input: String,
    /// Concatenation of the fragments received so far
    pub response: String,
}

pub struct App {
    pub provider: Arc<dyn CompletionProvider>,
    pub history: ChatHistory,
    pub input: String,
    pub error: Option<String>,
    pub pending: Option<PendingExchange>,
    pub status_message: String,
    pub model_name: String,
    pub question: String,
    pub generation: GenerationConfig,
    pub safety: Vec<SafetySetting>,
    pub rng: StdRng,
}

impl App {
    pub fn from_config(provider: Arc<dyn CompletionProvider>, config: &ResolvedConfig) -> Self {
        Self {
            provider,
            history: ChatHistory::new(),
            input: String::new(),
            error: None,
            pending: None,
            status_message: String::from("Ask away!"),
            model_name: config.model_name.clone(),
            question: config.question.clone(),
            generation: config.generation.clone(),
            safety: config.safety.clone(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the random source (tests use a seeded one).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}
