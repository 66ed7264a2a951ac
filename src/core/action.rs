//! # Actions
//!
//! Everything that can happen in the app becomes an `Action`.
//! User presses Enter? That's `Action::Submit`.
//! A fragment streams in? That's `Action::ResponseChunk(text)`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing any I/O the caller must
//! perform. No side effects here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::prompt::{EMPTY_PROMPT_ERROR, build_prompt, pick_surprise};
use crate::core::state::{App, PendingExchange};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The prompt field now holds this text
    InputChanged(String),
    /// Send the current input
    Submit,
    /// Replace the input with a random example prompt
    SurpriseMe,
    /// One streamed fragment of the pending response
    ResponseChunk(String),
    /// The fragment stream ended normally
    ResponseDone,
    /// The upstream call failed; carries a displayable reason
    ResponseFailed(String),
    Quit,
}

/// I/O the event loop must perform after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Start one streamed completion for this prompt
    SpawnRequest { prompt: String },
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::InputChanged(text) => {
            app.input = text;
            Effect::None
        }
        Action::Submit => submit(app),
        Action::SurpriseMe => {
            app.input = pick_surprise(&mut app.rng).to_string();
            debug!("Surprise prompt: {}", app.input);
            Effect::None
        }
        Action::ResponseChunk(text) => {
            match app.pending.as_mut() {
                Some(pending) => pending.response.push_str(&text),
                None => debug!("Dropping stray chunk ({} bytes): no request pending", text.len()),
            }
            Effect::None
        }
        Action::ResponseDone => {
            if let Some(pending) = app.pending.take() {
                info!(
                    "Response complete: {} bytes, history now {} turns",
                    pending.response.len(),
                    app.history.len() + 2
                );
                app.history.push_exchange(pending.input, pending.response);
                app.status_message = String::from("Done");
            }
            Effect::None
        }
        Action::ResponseFailed(reason) => {
            warn!("Request failed: {}", reason);
            if let Some(pending) = app.pending.take()
                && app.input.is_empty()
            {
                // Give the prompt back so it can be resubmitted as-is
                app.input = pending.input;
            }
            app.error = Some(format!("Request failed: {reason}"));
            app.status_message = String::from("Request failed");
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

fn submit(app: &mut App) -> Effect {
    if app.is_loading() {
        app.status_message = String::from("Still waiting for the last answer...");
        return Effect::None;
    }

    if app.input.is_empty() {
        app.error = Some(EMPTY_PROMPT_ERROR.to_string());
        return Effect::None;
    }

    let input = std::mem::take(&mut app.input);
    let prompt = build_prompt(&input, &app.question);
    app.pending = Some(PendingExchange {
        input,
        response: String::new(),
    });
    app.error = None;
    app.status_message = format!("Asking {}...", app.model_name);

    Effect::SpawnRequest { prompt }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prompt::{DEFAULT_QUESTION, SURPRISE_PROMPTS};
    use crate::inference::{ChatTurn, Role};
    use crate::test_support::test_app;

    /// Drives one full exchange through the reducer.
    fn ask(app: &mut App, input: &str, fragments: &[&str]) -> Effect {
        update(app, Action::InputChanged(input.to_string()));
        let effect = update(app, Action::Submit);
        for fragment in fragments {
            update(app, Action::ResponseChunk(fragment.to_string()));
        }
        update(app, Action::ResponseDone);
        effect
    }

    #[test]
    fn test_submit_appends_user_then_model_turn() {
        let mut app = test_app();
        let effect = ask(
            &mut app,
            "What is the best token on Solana?",
            &["UP. ", "Volume is ", "rising."],
        );

        assert_eq!(
            effect,
            Effect::SpawnRequest {
                prompt: format!("What is the best token on Solana?\n\n{DEFAULT_QUESTION}")
            }
        );
        assert_eq!(app.history.len(), 2);
        assert_eq!(
            app.history.turns()[0],
            ChatTurn::user("What is the best token on Solana?")
        );
        assert_eq!(
            app.history.turns()[1],
            ChatTurn::model("UP. Volume is rising.")
        );
        assert!(app.input.is_empty());
        assert!(app.error.is_none());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_empty_submit_sets_error_and_skips_request() {
        let mut app = test_app();
        ask(&mut app, "first", &["DOWN"]);
        let before = app.history.clone();

        let effect = update(&mut app, Action::Submit);

        assert_eq!(effect, Effect::None);
        assert_eq!(app.error.as_deref(), Some("Error! Please ask a question"));
        assert_eq!(app.history, before);
        assert_eq!(app.input, "");
        assert!(!app.is_loading());
    }

    #[test]
    fn test_whitespace_input_is_submitted() {
        let mut app = test_app();
        update(&mut app, Action::InputChanged("  ".to_string()));
        let effect = update(&mut app, Action::Submit);
        assert!(matches!(effect, Effect::SpawnRequest { .. }));
        assert!(app.error.is_none());
    }

    #[test]
    fn test_successful_submit_clears_previous_error() {
        let mut app = test_app();
        update(&mut app, Action::Submit);
        assert!(app.error.is_some());

        ask(&mut app, "retry", &["UP"]);
        assert!(app.error.is_none());
        assert_eq!(app.history.len(), 2);
    }

    #[test]
    fn test_input_cleared_while_request_in_flight() {
        let mut app = test_app();
        update(&mut app, Action::InputChanged("hello".to_string()));
        update(&mut app, Action::Submit);

        assert!(app.input.is_empty());
        assert!(app.is_loading());
        // Not in history until the stream ends
        assert!(app.history.is_empty());
        assert_eq!(app.pending.as_ref().unwrap().input, "hello");
    }

    #[test]
    fn test_chunks_accumulate_in_pending() {
        let mut app = test_app();
        update(&mut app, Action::InputChanged("q".to_string()));
        update(&mut app, Action::Submit);
        update(&mut app, Action::ResponseChunk("a".to_string()));
        update(&mut app, Action::ResponseChunk("b".to_string()));
        assert_eq!(app.pending.as_ref().unwrap().response, "ab");
    }

    #[test]
    fn test_submit_while_loading_is_rejected() {
        let mut app = test_app();
        update(&mut app, Action::InputChanged("one".to_string()));
        update(&mut app, Action::Submit);
        update(&mut app, Action::InputChanged("two".to_string()));

        let effect = update(&mut app, Action::Submit);

        assert_eq!(effect, Effect::None);
        // Second prompt stays in the field for later
        assert_eq!(app.input, "two");
        assert_eq!(app.pending.as_ref().unwrap().input, "one");
        assert!(app.error.is_none());
    }

    #[test]
    fn test_failure_leaves_history_unchanged() {
        let mut app = test_app();
        ask(&mut app, "first", &["UP"]);

        update(&mut app, Action::InputChanged("second".to_string()));
        update(&mut app, Action::Submit);
        update(&mut app, Action::ResponseChunk("partial".to_string()));
        update(
            &mut app,
            Action::ResponseFailed("API error (HTTP 403): denied".to_string()),
        );

        assert_eq!(app.history.len(), 2);
        assert_eq!(
            app.error.as_deref(),
            Some("Request failed: API error (HTTP 403): denied")
        );
        assert!(!app.is_loading());
        // Prompt restored because the field was empty
        assert_eq!(app.input, "second");
    }

    #[test]
    fn test_failure_keeps_newer_input() {
        let mut app = test_app();
        update(&mut app, Action::InputChanged("old".to_string()));
        update(&mut app, Action::Submit);
        update(&mut app, Action::InputChanged("typed meanwhile".to_string()));
        update(&mut app, Action::ResponseFailed("network error".to_string()));
        assert_eq!(app.input, "typed meanwhile");
    }

    #[test]
    fn test_done_after_failure_is_ignored() {
        let mut app = test_app();
        update(&mut app, Action::InputChanged("q".to_string()));
        update(&mut app, Action::Submit);
        update(&mut app, Action::ResponseFailed("x".to_string()));
        update(&mut app, Action::ResponseDone);
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_stray_chunk_without_pending_is_dropped() {
        let mut app = test_app();
        update(&mut app, Action::ResponseChunk("late".to_string()));
        update(&mut app, Action::ResponseDone);
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_history_grows_by_two_per_exchange() {
        let mut app = test_app();
        for (i, input) in ["a", "b", "c"].iter().enumerate() {
            ask(&mut app, input, &["x"]);
            assert_eq!(app.history.len(), (i + 1) * 2);
        }
        let roles: Vec<Role> = app.history.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Model, Role::User, Role::Model, Role::User, Role::Model]
        );
    }

    #[test]
    fn test_empty_stream_still_appends_model_turn() {
        let mut app = test_app();
        ask(&mut app, "anything", &[]);
        assert_eq!(app.history.len(), 2);
        assert_eq!(app.history.turns()[1], ChatTurn::model(""));
    }

    #[test]
    fn test_surprise_me_replaces_input() {
        let mut app = test_app();
        update(&mut app, Action::InputChanged("my own question".to_string()));
        for _ in 0..20 {
            update(&mut app, Action::SurpriseMe);
            assert!(SURPRISE_PROMPTS.contains(&app.input.as_str()));
        }
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_quit_effect() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
