//! # Landing Page Component
//!
//! Shown in place of the message list until the first question is asked.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;

/// Ticks the arrow between up and down; driven by the spinner frame.
const ARROWS: [&str; 2] = ["▲", "▼"];

const GREETING: &str = "Hey 👋, Solana UP or DOWN?";
pub const DESCRIPTION: &str = "AI analyzing tokens movements and trends on Solana. Up or Down?";

pub struct LandingPage {
    frame_index: usize,
}

impl LandingPage {
    pub fn new(frame_index: usize) -> Self {
        Self { frame_index }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let arrow = ARROWS[(self.frame_index / 6) % ARROWS.len()];
        let arrow_color = if arrow == ARROWS[0] {
            Color::Green
        } else {
            Color::Red
        };

        vec![
            Line::from(Span::styled(
                arrow,
                Style::default().fg(arrow_color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                GREETING,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(DESCRIPTION, Style::default().fg(Color::Gray))),
            Line::from(Span::styled(
                "Out of ideas? Ctrl+R fills in an example.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                format!("v{}", env!("CARGO_PKG_VERSION")),
                Style::default().fg(Color::DarkGray),
            )),
        ]
    }
}

impl Component for LandingPage {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let [text_area] = Layout::vertical([Constraint::Length(lines.len() as u16)])
            .flex(Flex::Center)
            .areas(area);

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), text_area);
    }
}
