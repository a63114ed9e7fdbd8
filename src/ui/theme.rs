use ratatui::style::{Color, Modifier, Style};

use crate::mirrors::LogKind;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub background: Color,
    pub foreground: Color,
    pub error: Color,
    pub warning: Color,
    pub success: Color,
    pub border: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Yellow,
            secondary: Color::Cyan,
            background: Color::Reset,
            foreground: Color::White,
            error: Color::Red,
            warning: Color::LightYellow,
            success: Color::Green,
            border: Color::DarkGray,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn primary_style(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn secondary_style(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Border of a panel, highlighted while it has focus
    pub fn panel_border(&self, focused: bool) -> Style {
        if focused {
            self.primary_style()
        } else {
            self.border_style()
        }
    }

    pub fn record_style(&self, kind: LogKind) -> Style {
        match kind {
            LogKind::Info => self.style(),
            LogKind::ServerStat => self.secondary_style(),
            LogKind::Warning => Style::default().fg(self.warning),
            LogKind::Error => self.error_style().add_modifier(Modifier::BOLD),
        }
    }
}
