//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (landing page, loading): draws every ~80ms.
//! - **Idle**: sleeps up to 500ms, only redraws on events or resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.
//!
//! ## Streaming
//!
//! A submit spawns one tokio task that drives the provider. It forwards each
//! fragment as `Action::ResponseChunk` over a std channel and finishes with
//! exactly one `ResponseDone` or `ResponseFailed`. The loop drains that
//! channel every frame.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::inference::{CompletionProvider, CompletionRequest, stream_to_completion};
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const ANIMATION_TICK: Duration = Duration::from_millis(80);
const IDLE_TICK: Duration = Duration::from_millis(500);

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub pulse_value: f32,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            pulse_value: 0.0,
        }
    }
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is pushed unconditionally; terminals
        // without support ignore it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, paste, steady cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Runs the interactive UI until the user quits.
///
/// Must be called from inside a tokio runtime; requests are spawned onto it.
pub fn run(provider: Arc<dyn CompletionProvider>, config: ResolvedConfig) -> std::io::Result<()> {
    let mut app = App::from_config(provider, &config);
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let result = TerminalModeGuard::new()
        .and_then(|_guard| event_loop(&mut terminal, &mut app, &mut tui));
    ratatui::restore();

    info!("Exiting with {} turns in history", app.history.len());
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    tui: &mut TuiState,
) -> std::io::Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut active_request: Option<tokio::task::AbortHandle> = None;

    let start_time = Instant::now();
    let mut needs_redraw = true;

    loop {
        tui.input_box.dimmed = app.is_loading();

        let animating = app.is_loading() || app.history.is_empty();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            let spinner_frame = (elapsed * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, app, tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if animating { ANIMATION_TICK } else { IDLE_TICK };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain everything pending before the next draw
        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            let action = match event {
                TuiEvent::Resize => continue,
                TuiEvent::Quit | TuiEvent::ForceQuit => Some(Action::Quit),
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown => {
                    tui.message_list.handle_event(&event);
                    continue;
                }
                _ => tui.input_box.handle_event(&event).map(|input_event| match input_event {
                    InputEvent::ContentChanged => {
                        Action::InputChanged(tui.input_box.buffer.clone())
                    }
                    InputEvent::Submit => Action::Submit,
                    InputEvent::SurpriseMe => Action::SurpriseMe,
                }),
            };

            let Some(action) = action else { continue };
            match dispatch(app, tui, action, &tx) {
                Dispatch::Quit => should_quit = true,
                Dispatch::Spawned(handle) => active_request = Some(handle),
                Dispatch::Continue => {}
            }
        }

        if should_quit {
            break;
        }

        // Actions from the streaming task
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            if matches!(action, Action::ResponseDone | Action::ResponseFailed(_)) {
                active_request = None;
            }
            if let Dispatch::Spawned(handle) = dispatch(app, tui, action, &tx) {
                active_request = Some(handle);
            }
        }
    }

    if let Some(handle) = active_request {
        debug!("Aborting in-flight request on exit");
        handle.abort();
    }
    Ok(())
}

enum Dispatch {
    Continue,
    Spawned(tokio::task::AbortHandle),
    Quit,
}

/// Applies one action and performs the resulting effect.
fn dispatch(
    app: &mut App,
    tui: &mut TuiState,
    action: Action,
    tx: &mpsc::Sender<Action>,
) -> Dispatch {
    let outcome = match update(app, action) {
        Effect::None => Dispatch::Continue,
        Effect::SpawnRequest { prompt } => {
            // Follow the new exchange even if the user had scrolled away
            tui.message_list.stick_to_bottom = true;
            Dispatch::Spawned(spawn_request(app, prompt, tx.clone()))
        }
        Effect::Quit => Dispatch::Quit,
    };

    // The reducer may rewrite the input (submit, surprise, failed request)
    if tui.input_box.buffer != app.input {
        tui.input_box.set_text(&app.input);
    }

    outcome
}

fn spawn_request(app: &App, prompt: String, tx: mpsc::Sender<Action>) -> tokio::task::AbortHandle {
    info!("Spawning request to {} ({} byte prompt)", app.model_name, prompt.len());

    let provider = app.provider.clone();
    let model = app.model_name.clone();
    let generation = app.generation.clone();
    let safety = app.safety.clone();

    let handle = tokio::spawn(async move {
        let request = CompletionRequest {
            prompt: &prompt,
            model: &model,
            generation: &generation,
            safety: &safety,
        };

        let mut receiver_gone = false;
        let result = stream_to_completion(provider.as_ref(), request, |fragment| {
            if !receiver_gone && tx.send(Action::ResponseChunk(fragment.to_string())).is_err() {
                warn!("Failed to forward ResponseChunk: receiver dropped");
                receiver_gone = true;
            }
        })
        .await;

        let last = match result {
            Ok(text) => {
                info!("Stream finished: {} bytes", text.len());
                Action::ResponseDone
            }
            Err(e) => {
                info!("Stream error: {}", e);
                Action::ResponseFailed(e.to_string())
            }
        };
        if tx.send(last).is_err() {
            warn!("Failed to send final stream action: receiver dropped");
        }
    });

    handle.abort_handle()
}
