use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::message_list::SPINNER_FRAMES;
use crate::tui::components::{ErrorLine, LandingPage, MessageList, TitleBar};

/// Draws one frame: title, conversation (or landing page), error, input.
pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};

    let input_height = tui.input_box.calculate_height(frame.area().width);
    let error_height = u16::from(app.error.is_some());
    let [title_area, main_area, error_area, input_area] = Layout::vertical([
        Length(1),
        Min(0),
        Length(error_height),
        Length(input_height),
    ])
    .areas(frame.area());

    if app.history.is_empty() && app.pending.is_none() {
        LandingPage::new(spinner_frame).render(frame, main_area);
    } else {
        MessageList::new(
            &mut tui.message_list,
            app.history.turns(),
            app.pending.as_ref(),
            tui.pulse_value,
            spinner_frame,
        )
        .render(frame, main_area);
    }

    let status = if app.is_loading() {
        let symbol = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
        format!("{symbol} {}", app.status_message)
    } else {
        app.status_message.clone()
    };
    TitleBar::new(
        app.model_name.clone(),
        status,
        tui.message_list.has_unseen_content(),
    )
    .render(frame, title_area);

    if let Some(error) = &app.error {
        ErrorLine::new(error).render(frame, error_area);
    }

    tui.input_box.render(frame, input_area);
}
