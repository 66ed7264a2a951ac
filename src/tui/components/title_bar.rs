//! # TitleBar Component
//!
//! Top status line: app name, current model, status message and a
//! "↓ New" hint when turns sit below the scroll position.
//!
//! Purely presentational. All three props are copied in from `App` and
//! `MessageListState` each frame:
//!
//! 1. **Unseen content**: `"Solana Up or Down (model: m) | Done | ↓ New"`
//! 2. **Status message**: `"Solana Up or Down (model: m) | Done"`
//! 3. **Default**: `"Solana Up or Down (model: m)"`

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use crate::tui::component::Component;

const APP_TITLE: &str = "Solana Up or Down";

pub struct TitleBar {
    pub model_name: String,
    pub status_message: String,
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(model_name: String, status_message: String, has_unseen_content: bool) -> Self {
        Self {
            model_name,
            status_message,
            has_unseen_content,
        }
    }

    fn text(&self) -> String {
        let mut text = format!("{APP_TITLE} (model: {})", self.model_name);
        if !self.status_message.is_empty() {
            text.push_str(" | ");
            text.push_str(&self.status_message);
        }
        if self.has_unseen_content {
            text.push_str(" | ↓ New");
        }
        text
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let span = Span::styled(self.text(), Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(span, area);
    }
}
