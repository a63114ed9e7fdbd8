use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

pub struct Layout {
    pub full: Rect,
    pub header: Rect,
    pub actions: Rect,
    pub form: Rect,
    pub log: Rect,
    pub message: Rect,
    pub status: Rect,
}

impl Layout {
    pub fn new(area: Rect) -> Self {
        // Message panel space is always reserved so the panels don't jump
        let rows = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),  // Header
                Constraint::Min(12),    // Content
                Constraint::Length(3),  // Message panel
                Constraint::Length(1),  // Status bar
            ])
            .split(area);

        let columns = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(40)])
            .split(rows[1]);

        let right = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(11), Constraint::Min(5)])
            .split(columns[1]);

        Self {
            full: area,
            header: rows[0],
            actions: columns[0],
            form: right[0],
            log: right[1],
            message: rows[2],
            status: rows[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_fill_the_content_area() {
        let layout = Layout::new(Rect::new(0, 0, 100, 40));

        assert_eq!(layout.header.height, 1);
        assert_eq!(layout.status.y, 39);
        assert_eq!(layout.message.height, 3);
        assert_eq!(layout.actions.width + layout.form.width, 100);
        assert_eq!(layout.form.height + layout.log.height, layout.actions.height);
    }
}
