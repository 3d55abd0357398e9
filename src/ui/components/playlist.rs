use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, StatefulWidget},
};

use crate::{
    api::Song,
    ui::utils::{ACCENT, MUTED, TEXT},
};

pub struct PlaylistWidget<'a> {
    songs: &'a [Song],
    active: Option<i64>,
}

impl<'a> PlaylistWidget<'a> {
    pub fn new(songs: &'a [Song], active: Option<i64>) -> Self {
        Self { songs, active }
    }

    fn item(&self, song: &'a Song) -> ListItem<'a> {
        let active = self.active == Some(song.id);
        let name_style = if active {
            Style::new().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(TEXT)
        };

        ListItem::new(Line::from(vec![
            Span::styled(format!("{:>4}  ", song.id), Style::new().fg(MUTED)),
            Span::styled(song.name.as_str(), name_style),
        ]))
    }
}

impl<'a> StatefulWidget for PlaylistWidget<'a> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::bordered()
            .title(" Playlist ")
            .border_style(Style::new().fg(MUTED));

        if self.songs.is_empty() {
            let placeholder = List::new([ListItem::new(
                Line::from("Loading songs...").style(Style::new().fg(MUTED)),
            )])
            .block(block);
            StatefulWidget::render(
                placeholder,
                area,
                buf,
                &mut ListState::default(),
            );
            return;
        }

        let items: Vec<ListItem> =
            self.songs.iter().map(|song| self.item(song)).collect();
        let list = List::new(items)
            .block(block)
            .highlight_symbol("> ")
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED));

        StatefulWidget::render(list, area, buf, state);
    }
}
