use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols::{self, border},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::utils::{ACCENT, MUTED, TEXT};

/// Previous, play/pause and next buttons.
pub struct PlayerControlsWidget {
    enabled: bool,
    is_playing: bool,
}

impl PlayerControlsWidget {
    pub fn new(enabled: bool, is_playing: bool) -> Self {
        Self {
            enabled,
            is_playing,
        }
    }

    fn button(&self, label: &'static str, primary: bool) -> Span<'static> {
        let style = if !self.enabled {
            Style::new().fg(MUTED).add_modifier(Modifier::DIM)
        } else if primary {
            Style::new().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(TEXT)
        };

        Span::styled(label, style)
    }
}

impl Widget for PlayerControlsWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let play_pause = if self.is_playing { "[ ⏸ ]" } else { "[ ▶ ]" };

        let line = Line::from(vec![
            self.button("[ ⏮ ]", false),
            Span::raw("   "),
            self.button(play_pause, true),
            Span::raw("   "),
            self.button("[ ⏭ ]", false),
        ]);

        let block = Block::default()
            .borders(Borders::TOP | Borders::BOTTOM)
            .border_style(Style::new().fg(MUTED))
            .border_set(border::Set {
                top_left: symbols::line::NORMAL.horizontal,
                top_right: symbols::line::NORMAL.horizontal,
                bottom_left: symbols::line::NORMAL.horizontal,
                bottom_right: symbols::line::NORMAL.horizontal,
                ..symbols::border::PLAIN
            });

        Paragraph::new(line).block(block).centered().render(area, buf);
    }
}
