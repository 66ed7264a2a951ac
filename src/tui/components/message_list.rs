//! # MessageList Component
//!
//! Scrollable view of the chat: committed history turns followed by the
//! exchange currently streaming in.
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) plus the turns to show
//! (props).
//!
//! Since `Component::render` takes `&mut self`, we can safely mutate the state
//! (including layout cache and scroll state) during the render pass, aligning
//! with Ratatui's `StatefulWidget` pattern.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::state::PendingExchange;
use crate::inference::{ChatTurn, Role};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Braille spinner shown under the conversation while waiting.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Rows reserved below the last turn for the spinner line.
const SPINNER_PADDING: u16 = 2;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// Cached layout measurements
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the bottom.
    /// Called on scroll-down events so that scrolling past the end re-pins to bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// True when turns exist below the viewport (drives the "↓ New" hint).
    pub fn has_unseen_content(&self) -> bool {
        !self.stick_to_bottom && self.scroll_state.offset().y < self.max_offset()
    }
}

/// One rendered row of the conversation.
struct Row<'a> {
    role: Role,
    content: &'a str,
}

/// Flattens committed turns plus the in-flight exchange into display rows.
fn rows<'a>(turns: &'a [ChatTurn], pending: Option<&'a PendingExchange>) -> Vec<Row<'a>> {
    let mut rows: Vec<Row<'a>> = turns
        .iter()
        .map(|turn| Row {
            role: turn.role,
            content: &turn.content,
        })
        .collect();

    if let Some(pending) = pending {
        rows.push(Row {
            role: Role::User,
            content: &pending.input,
        });
        rows.push(Row {
            role: Role::Model,
            content: &pending.response,
        });
    }

    rows
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub turns: &'a [ChatTurn],
    pub pending: Option<&'a PendingExchange>,
    pub pulse_value: f32,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        turns: &'a [ChatTurn],
        pending: Option<&'a PendingExchange>,
        pulse_value: f32,
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            turns,
            pending,
            pulse_value,
            spinner_frame,
        }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let rows = rows(self.turns, self.pending);
        let is_loading = self.pending.is_some();

        // 1. Update layout cache
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(rows.len(), content_width);
        layout.heights.truncate(reusable.min(layout.heights.len()));
        for row in rows.iter().skip(layout.heights.len()) {
            layout
                .heights
                .push(Message::calculate_height(row.content, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(rows.len(), content_width);

        let total_height = self.state.layout.total_height();
        let spinner_padding = if is_loading { SPINNER_PADDING } else { 0 };
        let canvas_height = total_height + spinner_padding;

        // 2. Clamp scroll offset (auto-scroll targets the padded canvas instead)
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible rows into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        let last = rows.len().saturating_sub(1);
        for i in visible_range {
            let row = &rows[i];
            let height = self.state.layout.heights[i];
            let pulse_intensity = if is_loading && i == last {
                self.pulse_value
            } else {
                0.0
            };

            let rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(Message::new(row.role, row.content, pulse_intensity), rect);
            y_offset += height;
        }

        if is_loading {
            let frame_symbol = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
            let spinner = Span::styled(
                format!(" {frame_symbol} waiting for the model..."),
                Style::default().fg(Color::DarkGray),
            );
            scroll_view.render_widget(spinner, Rect::new(0, total_height + 1, content_width, 1));
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Implemented on the persistent state since `MessageList` is rebuilt each frame.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached layout measurements
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    row_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            row_count: 0,
            content_width: 0,
        }
    }

    /// Number of cached heights still valid for `row_count` rows at `content_width`.
    ///
    /// The last cached row is always remeasured: it is either the streaming
    /// response or a response that finished growing since the previous frame.
    pub fn reusable_count(&self, row_count: usize, content_width: u16) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }

        // Rows disappeared (failed request dropped its pending exchange)
        if row_count < self.row_count {
            return 0;
        }

        self.row_count.saturating_sub(1)
    }

    pub fn update_metadata(&mut self, row_count: usize, content_width: u16) {
        self.row_count = row_count;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn visible_range(
        &self,
        scroll_offset: u16,
        viewport_height: u16,
    ) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_layout_cache_reusable() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![1; 4];
        cache.update_metadata(4, 80);

        // Same rows: all but the last (which may still be growing)
        assert_eq!(cache.reusable_count(4, 80), 3);
        // Exchange appended: the previous last row is remeasured too
        assert_eq!(cache.reusable_count(6, 80), 3);
        // Width changed
        assert_eq!(cache.reusable_count(4, 40), 0);
        // Rows dropped
        assert_eq!(cache.reusable_count(2, 80), 0);
    }

    #[test]
    fn test_empty_cache_reuses_nothing() {
        let cache = LayoutCache::new();
        assert_eq!(cache.reusable_count(3, 80), 0);
    }

    #[test]
    fn test_streaming_row_height_is_refreshed() {
        let width: u16 = 30;
        let mut cache = LayoutCache::new();

        // Frame 1: short partial response
        for content in ["hi", "short"] {
            cache.heights.push(Message::calculate_height(content, width));
        }
        cache.rebuild_prefix_heights();
        cache.update_metadata(2, width);
        let stale = cache.heights[1];

        // Frame 2: the rest of the answer arrived in one batch
        let full = "this response is long enough to wrap across multiple lines at width 30";
        let reusable = cache.reusable_count(2, width);
        assert_eq!(reusable, 1);
        cache.heights.truncate(reusable);
        cache.heights.push(Message::calculate_height(full, width));
        cache.rebuild_prefix_heights();

        assert!(cache.heights[1] > stale);
        assert_eq!(cache.heights[0], Message::calculate_height("hi", width));
    }

    #[test]
    fn test_prefix_heights_and_visible_range() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3, 3, 3, 3, 3, 3];
        cache.rebuild_prefix_heights();
        assert_eq!(cache.prefix_heights, vec![3, 6, 9, 12, 15, 18]);
        assert_eq!(cache.total_height(), 18);

        // Viewport of 4 rows at offset 9, plus a half-viewport buffer each side
        let range = cache.visible_range(9, 4);
        assert_eq!(range, 2..5);
    }

    #[test]
    fn test_rows_include_pending_exchange() {
        let turns = vec![ChatTurn::user("SOL 150"), ChatTurn::model("UP")];
        let pending = PendingExchange {
            input: "SOL 140".to_string(),
            response: "DO".to_string(),
        };

        let rows = rows(&turns, Some(&pending));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].role, Role::User);
        assert_eq!(rows[2].content, "SOL 140");
        assert_eq!(rows[3].role, Role::Model);
        assert_eq!(rows[3].content, "DO");
    }

    #[test]
    fn test_scroll_up_detaches_and_scroll_down_repins() {
        let mut state = MessageListState::new();
        state.layout.heights = vec![10, 10];
        state.layout.rebuild_prefix_heights();
        state.viewport_height = 5;
        let bottom = state.max_offset();
        state.scroll_state.set_offset(Position { x: 0, y: bottom });

        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.stick_to_bottom);
        assert!(state.has_unseen_content());

        state.handle_event(&TuiEvent::ScrollDown);
        assert!(state.stick_to_bottom);
        assert!(!state.has_unseen_content());
    }

    #[test]
    fn test_render_shows_turns_and_spinner() {
        let backend = TestBackend::new(40, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut state = MessageListState::new();
        let turns = vec![ChatTurn::user("SOL 150"), ChatTurn::model("UP")];
        let pending = PendingExchange {
            input: "SOL 140".to_string(),
            response: String::new(),
        };

        terminal
            .draw(|f| {
                let area = f.area();
                MessageList::new(&mut state, &turns, Some(&pending), 0.0, 0).render(f, area);
            })
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("SOL 150"));
        assert!(text.contains("SOL 140"));
        assert!(text.contains("waiting for the model"));
    }
}
