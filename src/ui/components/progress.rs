use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Gauge, Paragraph, Widget},
};

use crate::{
    audio::state::PlaybackState,
    ui::utils::{ACCENT, MUTED, TEXT},
    utils::format_time,
};

/// Seek bar: elapsed time, a `[0, duration]` gauge and the total time.
pub struct ProgressWidget<'a> {
    state: &'a PlaybackState,
    enabled: bool,
}

impl<'a> ProgressWidget<'a> {
    pub fn new(state: &'a PlaybackState, enabled: bool) -> Self {
        Self { state, enabled }
    }

    fn split(area: Rect) -> [Rect; 3] {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(7),
                Constraint::Min(1),
                Constraint::Length(7),
            ])
            .split(area);

        [chunks[0], chunks[1], chunks[2]]
    }

    /// Area of the clickable bar inside `area`.
    pub fn bar_area(area: Rect) -> Rect {
        Self::split(area)[1]
    }

    /// Position a click at `column` inside `bar` points at.
    pub fn position_at(bar: Rect, column: u16, duration: f64) -> f64 {
        if bar.width == 0 || !(duration.is_finite() && duration > 0.0) {
            return 0.0;
        }
        let offset = column.saturating_sub(bar.x).min(bar.width) as f64;
        duration * offset / bar.width as f64
    }
}

impl<'a> Widget for ProgressWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [elapsed, bar, total] = Self::split(area);
        let text = Style::new().fg(if self.enabled { TEXT } else { MUTED });

        Paragraph::new(format_time(self.state.current_time))
            .style(text)
            .centered()
            .render(elapsed, buf);

        let bar_style = if self.enabled {
            Style::new().fg(ACCENT).bg(MUTED)
        } else {
            Style::new().fg(MUTED).bg(MUTED)
        };
        Gauge::default()
            .gauge_style(bar_style)
            .ratio(self.state.progress_ratio())
            .label("")
            .render(bar, buf);

        Paragraph::new(format_time(self.state.duration))
            .style(text)
            .centered()
            .render(total, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_maps_onto_duration() {
        let bar = Rect::new(10, 0, 100, 1);

        assert_eq!(ProgressWidget::position_at(bar, 10, 200.0), 0.0);
        assert_eq!(ProgressWidget::position_at(bar, 60, 200.0), 100.0);
        assert_eq!(ProgressWidget::position_at(bar, 500, 200.0), 200.0);
        assert_eq!(ProgressWidget::position_at(bar, 60, 0.0), 0.0);
    }
}
