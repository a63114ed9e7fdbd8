use crate::app::{Focus, PanelAction, WelcomeApp};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

fn checkbox(on: bool) -> &'static str {
    if on { "[x]" } else { "[ ]" }
}

pub fn draw_actions(frame: &mut Frame, area: Rect, app: &WelcomeApp) {
    let focused = app.focus == Focus::Actions;

    let items: Vec<ListItem> = PanelAction::ALL
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let is_cursor = i == app.selected_action;
            let marker = if is_cursor { ">" } else { " " };

            let (text, enabled) = match action {
                PanelAction::Install => (
                    app.install_status.label.to_string(),
                    app.live_iso && app.install_status.enabled,
                ),
                PanelAction::Theme => {
                    (format!("{} {}", checkbox(app.dark_theme), action.label()), true)
                }
                PanelAction::Autostart => {
                    (format!("{} {}", checkbox(app.autostart_enabled), action.label()), true)
                }
                PanelAction::Mirrors => (action.label().to_string(), !app.is_refreshing()),
                _ => (action.label().to_string(), true),
            };

            let style = if is_cursor && focused {
                app.theme.primary_style().add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else if !enabled {
                app.theme.muted_style()
            } else {
                app.theme.style()
            };
            ListItem::new(format!("{marker} {text}")).style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.panel_border(focused))
        .title(" Actions ")
        .title_style(app.theme.primary_style());

    let list = List::new(items).block(block);
    let mut state = ListState::default().with_selected(Some(app.selected_action));

    frame.render_stateful_widget(list, area, &mut state);
}
