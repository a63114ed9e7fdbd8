use crate::app::WelcomeApp;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

pub fn draw_message_panel(frame: &mut Frame, area: Rect, app: &WelcomeApp) {
    let (text, is_error) = match &app.message {
        Some(m) => (m.text.as_str(), m.is_error),
        None if app.install_status.running => ("Installer is running", false),
        None => return,
    };

    let (title, style) = if is_error {
        (" Error ", app.theme.error_style())
    } else {
        (" Info ", app.theme.secondary_style())
    };
    let text_style = if is_error { style } else { app.theme.style() };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
        .title_style(style.add_modifier(Modifier::BOLD));

    let mut spans = vec![Span::styled(text, text_style)];
    if app.message.is_some() {
        spans.push(Span::styled(" (press any key to dismiss)", app.theme.muted_style()));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
