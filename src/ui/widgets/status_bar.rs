use crate::app::{Focus, WelcomeApp};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &WelcomeApp) {
    let focus_name = match app.focus {
        Focus::Actions => "ACTIONS",
        Focus::Mirrors => "MIRRORS",
    };

    let left = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!(" {focus_name} "),
            app.theme.secondary_style().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ]);

    let keys: &[(&str, &str)] = match app.focus {
        Focus::Actions => &[("j/k", ":move "), ("Enter", ":select "), ("q", ":quit ")],
        Focus::Mirrors => &[
            ("Tab", ":field "),
            ("j/k", ":move "),
            ("Space", ":toggle "),
            ("h/l", ":adjust "),
            ("Enter", ":refresh "),
            ("Esc", ":back "),
        ],
    };
    let hints: Vec<Span> = keys
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::styled(*key, app.theme.secondary_style()),
                Span::styled(*action, app.theme.muted_style()),
            ]
        })
        .collect();
    let right = Line::from(hints);

    frame.render_widget(Paragraph::new(left).style(app.theme.style()), area);

    let right_width = right.width() as u16;
    if area.width > right_width {
        let right_area = Rect {
            x: area.x + area.width - right_width - 1,
            y: area.y,
            width: right_width + 1,
            height: 1,
        };
        frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), right_area);
    }
}
