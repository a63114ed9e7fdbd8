use crate::app::WelcomeApp;
use crate::mirrors::{LogRecord, RunState};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Row, Table};

/// Server, rate and time cells for a record; other kinds fill the first cell.
pub fn log_columns(record: &LogRecord) -> [&str; 3] {
    match record {
        LogRecord::Info(text) => [text.as_str(), "", ""],
        LogRecord::ServerStat { server, rate, time, .. } => [server.as_str(), rate.as_str(), time.as_str()],
        LogRecord::Warning(text) => [text.as_str(), "WARNING", "N/A"],
        LogRecord::Error(text) => [text.as_str(), "ERROR", "N/A"],
    }
}

pub fn draw_log_table(frame: &mut Frame, area: Rect, app: &WelcomeApp) {
    let title = match app.refresh_state {
        RunState::Running => " Log (refreshing) ",
        _ => " Log ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style())
        .title(title)
        .title_style(app.theme.primary_style());

    // Borders and header row
    let visible = area.height.saturating_sub(3) as usize;
    let skip = app.log.len().saturating_sub(visible);

    let rows: Vec<Row> = app
        .log
        .iter()
        .skip(skip)
        .map(|record| Row::new(log_columns(record)).style(app.theme.record_style(record.kind())))
        .collect();

    let header = Row::new(["Server", "Rate", "Time"])
        .style(app.theme.secondary_style().add_modifier(Modifier::BOLD));

    let table = Table::new(
        rows,
        [Constraint::Min(30), Constraint::Length(14), Constraint::Length(10)],
    )
    .header(header)
    .block(block)
    .column_spacing(2);

    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirrors::classify;

    #[test]
    fn server_stats_fill_all_columns() {
        let record = classify(
            "[2024-05-01 10:00:00] INFO: https://mirror.example.org/archlinux/  1.23 MiB/s  0.45 s",
        );
        assert_eq!(
            log_columns(&record),
            ["https://mirror.example.org/archlinux/", "1.23 MiB/s", "0.45 s"]
        );
    }

    #[test]
    fn other_records_use_first_column() {
        assert_eq!(
            log_columns(&LogRecord::Info("Starting reflector...".to_string())),
            ["Starting reflector...", "", ""]
        );
        assert_eq!(
            log_columns(&LogRecord::Warning("slow mirror".to_string())),
            ["slow mirror", "WARNING", "N/A"]
        );
        assert_eq!(
            log_columns(&LogRecord::Error("Update failed with code 1".to_string())),
            ["Update failed with code 1", "ERROR", "N/A"]
        );
    }
}
