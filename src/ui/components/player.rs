use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::Line,
    widgets::{Paragraph, Widget},
};

use crate::ui::utils::{MUTED, TEXT};

pub struct PlayerWidget<'a> {
    song_name: Option<&'a str>,
    is_playing: bool,
}

impl<'a> PlayerWidget<'a> {
    pub fn new(song_name: Option<&'a str>, is_playing: bool) -> Self {
        Self {
            song_name,
            is_playing,
        }
    }

    pub fn status(&self) -> &'static str {
        match (self.song_name, self.is_playing) {
            (None, _) => "Playlist empty",
            (Some(_), true) => "Now Playing",
            (Some(_), false) => "Paused",
        }
    }
}

impl<'a> Widget for PlayerWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            Line::from(self.song_name.unwrap_or("Select a song").bold())
                .style(Style::new().fg(TEXT)),
            Line::from(self.status()).style(Style::new().fg(MUTED)),
        ];

        Paragraph::new(lines).centered().render(area, buf);
    }
}
