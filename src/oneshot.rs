//! Non-interactive mode: ask one question, stream the answer to a writer.
//!
//! Runs the same reducer as the TUI, so validation and history behave the
//! same way; only the presentation differs.

use std::io::Write;

use log::{info, warn};

use crate::core::action::{Action, Effect, update};
use crate::core::state::App;
use crate::inference::{CompletionRequest, stream_to_completion};

/// Submits `input` and writes each fragment to `out` as it arrives.
///
/// Returns the error line the TUI would show when validation or the
/// upstream call fails, or a write error when `out` stops accepting output.
pub async fn ask_once<W: Write>(app: &mut App, input: String, out: &mut W) -> Result<(), String> {
    update(app, Action::InputChanged(input));

    let prompt = match update(app, Action::Submit) {
        Effect::SpawnRequest { prompt } => prompt,
        _ => return Err(app.error.clone().unwrap_or_else(|| app.status_message.clone())),
    };

    info!("One-shot request to {}", app.model_name);

    let provider = app.provider.clone();
    let request = CompletionRequest {
        prompt: &prompt,
        model: &app.model_name,
        generation: &app.generation,
        safety: &app.safety,
    };

    // First write failure; later fragments are not attempted
    let mut write_error: Option<std::io::Error> = None;
    let result = stream_to_completion(provider.as_ref(), request, |fragment| {
        if write_error.is_none()
            && let Err(e) = out.write_all(fragment.as_bytes()).and_then(|()| out.flush())
        {
            warn!("Failed to write fragment to output: {}", e);
            write_error = Some(e);
        }
    })
    .await;

    let action = match result {
        Ok(text) => {
            if write_error.is_none()
                && let Err(e) = writeln!(out).and_then(|()| out.flush())
            {
                write_error = Some(e);
            }
            // Fragments were written live; fold the full text into history in one step.
            update(app, Action::ResponseChunk(text));
            Action::ResponseDone
        }
        Err(e) => Action::ResponseFailed(e.to_string()),
    };
    update(app, action);

    if let Some(error) = &app.error {
        return Err(error.clone());
    }
    match write_error {
        Some(e) => Err(format!("Failed to write output: {e}")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::config::ResolvedConfig;
    use crate::inference::ChatTurn;
    use crate::test_support::{FailingProvider, ScriptedProvider, test_app};

    fn app_with(provider: Arc<dyn crate::inference::CompletionProvider>) -> App {
        App::from_config(provider, &ResolvedConfig::for_model("test-model"))
    }

    #[tokio::test]
    async fn test_ask_once_streams_and_records_exchange() {
        let provider = ScriptedProvider::new(vec!["UP".into(), " today".into()]);
        let mut app = app_with(Arc::new(provider));
        let mut out = Vec::new();

        let result = ask_once(&mut app, "What is the best token on Solana?".into(), &mut out).await;

        assert!(result.is_ok());
        assert_eq!(String::from_utf8(out).unwrap(), "UP today\n");
        assert_eq!(
            app.history.turns(),
            &[
                ChatTurn::user("What is the best token on Solana?"),
                ChatTurn::model("UP today"),
            ]
        );
    }

    /// Accepts `capacity` bytes, then fails like a closed pipe.
    struct ClosedPipe {
        capacity: usize,
        written: Vec<u8>,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written.len() >= self.capacity {
                return Err(std::io::ErrorKind::BrokenPipe.into());
            }
            let n = buf.len().min(self.capacity - self.written.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_ask_once_fails_when_output_closes() {
        let provider = ScriptedProvider::new(vec!["UP".into(), " today".into()]);
        let mut app = app_with(Arc::new(provider));
        let mut out = ClosedPipe {
            capacity: 1,
            written: Vec::new(),
        };

        let result = ask_once(&mut app, "SOL 150".into(), &mut out).await;

        let error = result.unwrap_err();
        assert!(error.starts_with("Failed to write output"), "got {error}");
        assert_eq!(out.written, b"U");
        // The answer still lands in history
        assert_eq!(app.history.len(), 2);
    }

    #[tokio::test]
    async fn test_ask_once_fails_when_trailing_newline_cannot_be_written() {
        let provider = ScriptedProvider::new(vec!["UP".into()]);
        let mut app = app_with(Arc::new(provider));
        let mut out = ClosedPipe {
            capacity: 2,
            written: Vec::new(),
        };

        let result = ask_once(&mut app, "SOL 150".into(), &mut out).await;

        assert!(result.is_err_and(|e| e.starts_with("Failed to write output")));
        assert_eq!(out.written, b"UP");
    }

    #[tokio::test]
    async fn test_ask_once_rejects_empty_input() {
        let mut app = test_app();
        let mut out = Vec::new();

        let result = ask_once(&mut app, String::new(), &mut out).await;

        assert_eq!(result, Err("Error! Please ask a question".to_string()));
        assert!(out.is_empty());
        assert!(app.history.is_empty());
    }

    #[tokio::test]
    async fn test_ask_once_reports_upstream_failure() {
        let mut app = app_with(Arc::new(FailingProvider));
        let mut out = Vec::new();

        let result = ask_once(&mut app, "hi".into(), &mut out).await;

        let error = result.unwrap_err();
        assert!(error.starts_with("Request failed:"));
        assert!(error.contains("500"));
        assert!(app.history.is_empty());
    }
}
