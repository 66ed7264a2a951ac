//! One-line error display between the conversation and the input box.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;

pub struct ErrorLine<'a> {
    pub message: &'a str,
}

impl<'a> ErrorLine<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }
}

impl Component for ErrorLine<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let style = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
        frame.render_widget(Paragraph::new(format!(" {}", self.message)).style(style), area);
    }
}
