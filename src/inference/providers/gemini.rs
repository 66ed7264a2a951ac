//! Gemini provider implementation using the `streamGenerateContent` endpoint.
//!
//! With `alt=sse` the endpoint answers with server-sent events. Every `data:`
//! line carries a complete `GenerateContentResponse` JSON object whose
//! candidate parts hold the next text fragment. There are no `event:` lines;
//! the stream ends when the connection closes.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::inference::{
    CompletionProvider, CompletionRequest, GenerationConfig, ProviderError, Role, SafetySetting,
    StreamChunk,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Serialize, Debug)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug)]
struct Content {
    role: Role,
    parts: Vec<Part>,
}

/// The request body for `models/{model}:streamGenerateContent`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    generation_config: &'a GenerationConfig,
    #[serde(skip_serializing_if = "no_safety_rules")]
    safety_settings: &'a [SafetySetting],
}

fn no_safety_rules(rules: &&[SafetySetting]) -> bool {
    rules.is_empty()
}

/// One SSE payload. Every field is optional: the final event may carry only
/// usage metadata, and a blocked prompt carries only `promptFeedback`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

// ============================================================================
// Translation Layer
// ============================================================================

/// Wraps the prompt as a single user turn. The upstream call is stateless:
/// earlier exchanges are shown on screen but never sent back.
fn prompt_to_contents(prompt: &str) -> Vec<Content> {
    vec![Content {
        role: Role::User,
        parts: vec![Part {
            text: prompt.to_string(),
        }],
    }]
}

#[derive(Default)]
struct StreamStats {
    chunks: usize,
    content_bytes: usize,
}

/// Handles one SSE line. Lines other than `data:` (comments, blanks) are ignored.
async fn handle_line(
    line: &[u8],
    sender: &Sender<StreamChunk>,
    stats: &mut StreamStats,
) -> Result<(), ProviderError> {
    let line = std::str::from_utf8(line)
        .map_err(|e| ProviderError::Parse(format!("invalid UTF-8 in stream: {e}")))?
        .trim();

    let Some(data) = line.strip_prefix("data:") else {
        return Ok(());
    };
    let data = data.trim_start();

    let event: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| ProviderError::Parse(format!("{e}: {data}")))?;

    if let Some(err) = event.error {
        warn!("Gemini stream error: {} - {}", err.code, err.message);
        return Err(ProviderError::Api {
            status: err.code,
            message: err.message,
        });
    }

    if let Some(reason) = event
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        warn!("Prompt blocked by safety filter: {}", reason);
        return Err(ProviderError::Blocked(reason));
    }

    let text = event.text();
    if !text.is_empty() {
        stats.chunks += 1;
        stats.content_bytes += text.len();
        debug!(
            "Sending Content chunk (len={}, total={})",
            text.len(),
            stats.content_bytes
        );
        if sender.send(StreamChunk::Content(text)).await.is_err() {
            warn!("Content chunk send failed: receiver dropped");
            return Err(ProviderError::ChannelClosed);
        }
    }

    if let Some(reason) = event.finish_reason() {
        debug!("Candidate finished: {}", reason);
    }

    Ok(())
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Generative Language API provider
pub struct GeminiProvider {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider.
    ///
    /// A missing key is accepted here and reported when a request is made.
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Sends the request and returns the response if the status is a success.
    async fn send_request(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<reqwest::Response, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::Config("Gemini API key is not set".to_string()))?;

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        debug!("Gemini response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Gemini API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: err_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn stream_completion(
        &self,
        request: CompletionRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        let body = GenerateContentRequest {
            contents: prompt_to_contents(request.prompt),
            generation_config: request.generation,
            safety_settings: request.safety,
        };

        info!(
            "Gemini streamGenerateContent request: model={}, prompt_len={}, safety_rules={}",
            request.model,
            request.prompt.len(),
            request.safety.len()
        );

        let mut response = self.send_request(request.model, &body).await?;

        // Raw bytes: a network chunk may end inside a multi-byte character
        let mut buffer: Vec<u8> = Vec::new();
        let mut stats = StreamStats::default();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?
        {
            buffer.extend_from_slice(&chunk);
            debug!("Raw chunk received: {} bytes", chunk.len());

            // Process complete lines from buffer
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                handle_line(&line, &sender, &mut stats).await?;
            }
        }

        // Final event without a trailing newline
        if !buffer.is_empty() {
            handle_line(&buffer, &sender, &mut stats).await?;
        }

        info!(
            "Stream ended: {} chunks, {} total content bytes",
            stats.chunks, stats.content_bytes
        );
        Ok(())
    }
}
