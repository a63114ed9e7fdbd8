mod layout;
mod theme;
pub mod widgets;

pub use layout::Layout;
pub use theme::Theme;

use crate::app::WelcomeApp;
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &WelcomeApp) {
    let layout = Layout::new(frame.area());

    widgets::draw_background(frame, layout.full, &app.theme);
    widgets::draw_header(frame, layout.header, app);
    widgets::draw_actions(frame, layout.actions, app);
    widgets::draw_mirror_form(frame, layout.form, app);
    widgets::draw_log_table(frame, layout.log, app);
    widgets::draw_message_panel(frame, layout.message, app);
    widgets::draw_status_bar(frame, layout.status, app);
}
