use crate::app::{Focus, MirrorField, WelcomeApp};
use crate::mirrors::RunState;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

pub fn draw_mirror_form(frame: &mut Frame, area: Rect, app: &WelcomeApp) {
    let focused = app.focus == Focus::Mirrors;
    let form = &app.form;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.panel_border(focused))
        .title(" Mirrorlist ")
        .title_style(app.theme.primary_style());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(20)])
        .split(inner);

    // Country checklist
    let countries_active = focused && form.field == MirrorField::Countries;
    let items: Vec<ListItem> = form
        .countries
        .iter()
        .enumerate()
        .map(|(i, (name, selected))| {
            let is_cursor = countries_active && i == form.country_cursor;
            let style = if is_cursor {
                app.theme.primary_style().add_modifier(Modifier::REVERSED)
            } else if *selected {
                app.theme.secondary_style()
            } else {
                app.theme.style()
            };
            let checkbox = if *selected { "[x]" } else { "[ ]" };
            ListItem::new(format!("{checkbox} {name}")).style(style)
        })
        .collect();
    let mut state = ListState::default().with_selected(Some(form.country_cursor));
    frame.render_stateful_widget(List::new(items), columns[0], &mut state);

    // Settings
    let label = |field: MirrorField, text: &'static str| {
        let style = if focused && form.field == field {
            app.theme.primary_style().add_modifier(Modifier::BOLD)
        } else {
            app.theme.muted_style()
        };
        Span::styled(format!("{text:<13}"), style)
    };

    let mut protocol_spans = vec![label(MirrorField::Protocols, "Protocols")];
    for (i, (protocol, enabled)) in form.protocols.iter().enumerate() {
        let is_cursor = focused && form.field == MirrorField::Protocols && i == form.protocol_cursor;
        let style = if is_cursor {
            app.theme.primary_style().add_modifier(Modifier::REVERSED)
        } else {
            app.theme.style()
        };
        let checkbox = if *enabled { "[x]" } else { "[ ]" };
        protocol_spans.push(Span::styled(format!("{checkbox} {protocol}"), style));
        protocol_spans.push(Span::raw(" "));
    }

    let state_line = match app.refresh_state {
        RunState::Idle => Span::styled("idle", app.theme.muted_style()),
        RunState::Running => Span::styled("running...", app.theme.primary_style()),
        RunState::Finished(0) => Span::styled("done", app.theme.success_style()),
        RunState::Finished(code) => Span::styled(format!("failed ({code})"), app.theme.error_style()),
    };

    let command = match &app.last_command {
        Some(command) => Span::styled(command.as_str(), app.theme.muted_style()),
        None => Span::styled("Enter to refresh", app.theme.muted_style()),
    };

    let lines = vec![
        Line::from(protocol_spans),
        Line::from(vec![
            label(MirrorField::MaxMirrors, "Max mirrors"),
            Span::raw(format!("< {} >", form.max_mirrors)),
        ]),
        Line::from(vec![
            label(MirrorField::Timeout, "Timeout"),
            Span::raw(format!("< {} s >", form.timeout_secs)),
        ]),
        Line::from(vec![
            label(MirrorField::Sort, "Sort by"),
            Span::raw(format!("< {} >", form.sort)),
        ]),
        Line::from(vec![Span::styled(format!("{:<13}", "Status"), app.theme.muted_style()), state_line]),
        Line::from(""),
        Line::from(command),
    ];

    let paragraph = Paragraph::new(lines)
        .style(app.theme.style())
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, columns[1]);
}
