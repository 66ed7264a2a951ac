pub mod accumulate;
pub mod provider;
pub mod providers;
pub mod types;

pub use accumulate::{collect_fragments, stream_to_completion};
pub use provider::{CompletionProvider, CompletionRequest, ProviderError};
pub use providers::GeminiProvider;
pub use types::{
    ChatHistory, ChatTurn, GenerationConfig, HarmBlockThreshold, HarmCategory, Role,
    SafetySetting, StreamChunk, default_safety_settings,
};
