mod actions;
mod header;
mod log_table;
mod message_panel;
mod mirror_form;
mod status_bar;

pub use actions::draw_actions;
pub use header::draw_header;
pub use log_table::{draw_log_table, log_columns};
pub use message_panel::draw_message_panel;
pub use mirror_form::draw_mirror_form;
pub use status_bar::draw_status_bar;

use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Block;

pub fn draw_background(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = Block::default().style(theme.style());
    frame.render_widget(block, area);
}
