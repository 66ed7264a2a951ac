//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc::Sender;

use crate::core::config::ResolvedConfig;
use crate::inference::{CompletionProvider, CompletionRequest, ProviderError, StreamChunk};

/// A no-op provider for tests that don't need real API calls.
pub struct NoopProvider;

#[async_trait]
impl CompletionProvider for NoopProvider {
    fn name(&self) -> &str {
        "noop"
    }

    async fn stream_completion(
        &self,
        _request: CompletionRequest<'_>,
        _sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Replays a fixed list of fragments, then ends the stream.
pub struct ScriptedProvider {
    fragments: Vec<String>,
}

impl ScriptedProvider {
    pub fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_completion(
        &self,
        _request: CompletionRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        for fragment in &self.fragments {
            sender
                .send(StreamChunk::Content(fragment.clone()))
                .await
                .map_err(|_| ProviderError::ChannelClosed)?;
        }
        Ok(())
    }
}

/// Fails before producing any fragment.
pub struct FailingProvider;

#[async_trait]
impl CompletionProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn stream_completion(
        &self,
        _request: CompletionRequest<'_>,
        _sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        Err(ProviderError::Api {
            status: 500,
            message: "boom".to_string(),
        })
    }
}

/// Creates a test App with a NoopProvider and a fixed random seed.
pub fn test_app() -> crate::core::state::App {
    let config = ResolvedConfig::for_model("test-model");
    crate::core::state::App::from_config(Arc::new(NoopProvider), &config)
        .with_rng(StdRng::seed_from_u64(7))
}
