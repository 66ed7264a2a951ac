//! Folding a fragment stream into one response string.
//!
//! Both front ends go through `stream_to_completion`: the TUI forwards each
//! fragment as `Action::ResponseChunk` from its callback, the one-shot CLI
//! writes each one to stdout.

use log::debug;
use tokio::sync::mpsc::{self, Receiver};

use crate::inference::{CompletionProvider, CompletionRequest, ProviderError, StreamChunk};

/// Capacity of the fragment channel between a provider and its consumer.
pub const CHUNK_CHANNEL_CAPACITY: usize = 100;

/// Concatenates every fragment in arrival order until the sender is dropped,
/// handing each one to `on_fragment` first.
pub async fn collect_fragments<F>(
    mut receiver: Receiver<StreamChunk>,
    mut on_fragment: F,
) -> String
where
    F: FnMut(&str),
{
    let mut text = String::new();
    while let Some(StreamChunk::Content(fragment)) = receiver.recv().await {
        on_fragment(&fragment);
        text.push_str(&fragment);
    }
    text
}

/// Runs one streamed completion to the end.
///
/// `on_fragment` sees each fragment as it arrives; the return value is the
/// whole response. The provider and the consumer run concurrently on the
/// current task, so fragments are handled while the stream is still open.
pub async fn stream_to_completion<F>(
    provider: &dyn CompletionProvider,
    request: CompletionRequest<'_>,
    on_fragment: F,
) -> Result<String, ProviderError>
where
    F: FnMut(&str),
{
    let (tx, rx) = mpsc::channel::<StreamChunk>(CHUNK_CHANNEL_CAPACITY);

    let (result, text) = futures::join!(
        provider.stream_completion(request, tx),
        collect_fragments(rx, on_fragment)
    );
    result?;

    debug!(
        "{} completion finished: {} bytes",
        provider.name(),
        text.len()
    );
    Ok(text)
}
