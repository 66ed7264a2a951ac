//! Prompt construction and the "surprise me" prompt pool.

use rand::Rng;
use rand::seq::SliceRandom;

/// Appended to every user prompt before it is sent upstream.
pub const DEFAULT_QUESTION: &str = "Is Solana price going up or down in the next 24 hours? \
    Please give elaborate answer but start with UP or DOWN.";

/// Shown when an empty prompt is submitted.
pub const EMPTY_PROMPT_ERROR: &str = "Error! Please ask a question";

pub const SURPRISE_PROMPTS: &[&str] = &[
    "What is the best token on Solana?",
    "How did Solana react to the last Bitcoin halving?",
    "Are memecoins pumping on Solana this week?",
    "What does rising DEX volume on Solana usually mean for SOL?",
    "Is staking SOL still worth it with current yields?",
    "How do network outages affect the SOL price?",
    "Which Solana DeFi protocols are gaining the most TVL?",
];

/// Joins the user's text and the fixed question into the upstream prompt.
pub fn build_prompt(input: &str, question: &str) -> String {
    format!("{input}\n\n{question}")
}

/// Picks one prompt uniformly at random. Repeats across calls are possible.
pub fn pick_surprise<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    SURPRISE_PROMPTS
        .choose(rng)
        .copied()
        .unwrap_or(SURPRISE_PROMPTS[0])
}
