use flume::{Receiver, Sender};

use ratatui::{
    crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Style, Stylize},
    widgets::{block::Title, Block, ListState, StatefulWidget, Widget},
    Frame,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    api::SongsClient,
    audio::{
        backend::AudioPlayer,
        media::{MediaElement, UnavailableElement},
        playback::element::OutputElement,
    },
    config::Config,
    event::events::GlobalEvent,
    keymap,
};

use super::{
    components::{
        controls::PlayerControlsWidget, player::PlayerWidget,
        playlist::PlaylistWidget, progress::ProgressWidget,
    },
    tui::{self, Event},
    utils::{ACCENT, BACKGROUND, MUTED},
};

pub const TITLE: &str = "API Audio Player";

pub struct App {
    pub event_rx: Receiver<GlobalEvent>,
    pub event_tx: Sender<GlobalEvent>,
    pub player: AudioPlayer<Box<dyn MediaElement>>,
    pub config: Config,
    pub has_focus: bool,
    pub should_quit: bool,
    fetch_token: CancellationToken,
    playlist_state: ListState,
    seek_bar: Rect,
    playlist_area: Rect,
}

impl App {
    pub async fn new(config: Config) -> color_eyre::Result<Self> {
        let (event_tx, event_rx) = flume::unbounded();

        let media: Box<dyn MediaElement> =
            match OutputElement::spawn(event_tx.clone()) {
                Ok(element) => Box::new(element),
                Err(err) => {
                    warn!("audio output unavailable: {err:#}");
                    Box::new(UnavailableElement::new(
                        event_tx.clone(),
                        format!("audio output unavailable: {err:#}"),
                    ))
                }
            };

        Ok(Self::with_media(config, media, event_tx, event_rx))
    }

    pub fn with_media(
        config: Config,
        media: Box<dyn MediaElement>,
        event_tx: Sender<GlobalEvent>,
        event_rx: Receiver<GlobalEvent>,
    ) -> Self {
        Self {
            event_rx,
            event_tx,
            player: AudioPlayer::new(media, config.clone()),
            config,
            has_focus: true,
            should_quit: false,
            fetch_token: CancellationToken::new(),
            playlist_state: ListState::default(),
            seek_bar: Rect::default(),
            playlist_area: Rect::default(),
        }
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = tui::Tui::new()?.mouse(true);

        tui.enter()?;

        loop {
            tui.draw(|f| {
                self.ui(f);
            })?;

            if let Some(evt) = tui.next().await {
                self.handle_event(evt);
            };

            if self.should_quit {
                break;
            }
        }

        self.fetch_token.cancel();
        tui.exit()?;

        Ok(())
    }

    /// Starts the one playlist request. Its result lands on the event
    /// channel and is applied on the next tick.
    pub fn fetch_songs(&self) {
        SongsClient::new(&self.config)
            .spawn_fetch(self.event_tx.clone(), self.fetch_token.child_token());
    }

    fn handle_event(&mut self, evt: Event) {
        match evt {
            Event::Init => self.fetch_songs(),
            Event::Tick => self.handle_actions(),
            Event::FocusGained => self.has_focus = true,
            Event::FocusLost => self.has_focus = false,
            Event::Key(key) => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            _ => {}
        }
    }

    pub fn handle_key_event(&mut self, evt: KeyEvent) {
        keymap!(evt,
            KeyCode::Char('c') | CONTROL => self.should_quit = true,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') => self.handle_action(GlobalEvent::TogglePlayPause),
            KeyCode::Char('n') => self.handle_action(GlobalEvent::Next),
            KeyCode::Char('p') => self.handle_action(GlobalEvent::Previous),
            KeyCode::Left => self.handle_action(GlobalEvent::SeekBackward(self.config.seek_step)),
            KeyCode::Right => self.handle_action(GlobalEvent::SeekForward(self.config.seek_step)),
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Enter => self.play_selected(),
        );
    }

    pub fn handle_mouse_event(&mut self, evt: MouseEvent) {
        match evt.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if contains(self.seek_bar, evt.column, evt.row) {
                    let position = ProgressWidget::position_at(
                        self.seek_bar,
                        evt.column,
                        self.player.state().duration,
                    );
                    self.handle_action(GlobalEvent::Seek(position));
                } else if contains(self.playlist_area, evt.column, evt.row) {
                    let row = (evt.row - self.playlist_area.y) as usize
                        + self.playlist_state.offset();
                    if let Some(song) = self.player.songs().get(row) {
                        let id = song.id;
                        self.playlist_state.select(Some(row));
                        self.handle_action(GlobalEvent::PlaySong(id));
                    }
                }
            }
            MouseEventKind::ScrollDown => self.move_cursor(1),
            MouseEventKind::ScrollUp => self.move_cursor(-1),
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: i64) {
        let len = self.player.songs().len();
        if len == 0 {
            return;
        }
        let current = self.playlist_state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, len as i64 - 1) as usize;
        self.playlist_state.select(Some(next));
    }

    fn play_selected(&mut self) {
        let selected = self.playlist_state.selected();
        if let Some(song) = selected.and_then(|i| self.player.songs().get(i)) {
            let id = song.id;
            self.handle_action(GlobalEvent::PlaySong(id));
        }
    }

    pub fn handle_actions(&mut self) {
        while let Ok(evt) = self.event_rx.try_recv() {
            self.handle_action(evt);
        }
    }

    pub fn handle_action(&mut self, evt: GlobalEvent) {
        match evt {
            GlobalEvent::SongsFetched(songs) => {
                if self.fetch_token.is_cancelled() {
                    return;
                }
                info!("playlist loaded with {} songs", songs.len());
                self.player.load_songs(songs);
                let cursor = (!self.player.songs().is_empty()).then_some(0);
                self.playlist_state.select(cursor);
            }
            GlobalEvent::FetchFailed(reason) => self.player.fetch_failed(&reason),
            GlobalEvent::Media { generation, event } => {
                self.player.handle_media_event(generation, event)
            }
            GlobalEvent::PlaySong(id) => self.player.play_song_by_id(id),
            GlobalEvent::TogglePlayPause => self.player.play_pause(),
            GlobalEvent::Next => self.player.play_next(),
            GlobalEvent::Previous => self.player.play_previous(),
            GlobalEvent::Seek(position) => self.player.seek(position),
            GlobalEvent::SeekForward(step) => self.player.seek_forwards(step),
            GlobalEvent::SeekBackward(step) => self.player.seek_backwards(step),
        }
    }

    pub fn ui(&mut self, frame: &mut Frame) {
        if self.has_focus {
            self.render(frame);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let buf = frame.buffer_mut();
        buf.set_style(area, Style::new().bg(BACKGROUND));

        let title = Title::from(TITLE.bold().fg(ACCENT))
            .alignment(Alignment::Center);
        let block = Block::bordered()
            .title(title)
            .border_style(Style::new().fg(MUTED));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(inner);

        let state = self.player.state();
        let enabled = self.player.controls_enabled();
        let current = state.current_song.as_ref();

        PlayerWidget::new(current.map(|s| s.name.as_str()), state.is_playing)
            .render(chunks[0], buf);
        PlayerControlsWidget::new(enabled, state.is_playing)
            .render(chunks[1], buf);
        ProgressWidget::new(state, enabled).render(chunks[2], buf);
        PlaylistWidget::new(self.player.songs(), current.map(|s| s.id))
            .render(chunks[3], buf, &mut self.playlist_state);

        self.seek_bar = if enabled {
            ProgressWidget::bar_area(chunks[2])
        } else {
            Rect::default()
        };
        self.playlist_area = Block::bordered().inner(chunks[3]);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.fetch_token.cancel();
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x + area.width
        && row >= area.y
        && row < area.y + area.height
}

#[cfg(test)]
mod tests {
    use ratatui::{
        backend::TestBackend,
        buffer::Buffer,
        crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers},
        Terminal,
    };

    use super::*;
    use crate::{api::Song, audio::media::MediaEvent};

    fn app() -> App {
        let (event_tx, event_rx) = flume::unbounded();
        let media = Box::new(UnavailableElement::new(
            event_tx.clone(),
            "no output in tests".into(),
        ));
        App::with_media(Config::default(), media, event_tx, event_rx)
    }

    fn songs() -> Vec<Song> {
        vec![
            Song {
                id: 1,
                name: "Mario Castle".into(),
                url: "/sound/files/mario/songs/castle.mp3".into(),
            },
            Song {
                id: 2,
                name: "Mario Star".into(),
                url: "/sound/files/mario/songs/hurry-starman.mp3".into(),
            },
        ]
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| app.ui(f)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn buffer_text(buf: &Buffer) -> String {
        let mut text = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                text.push_str(buf.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn empty_widget_shows_placeholders() {
        let mut app = app();
        app.handle_action(GlobalEvent::FetchFailed("Fetch failed: 500".into()));

        let screen = draw(&mut app);

        assert!(screen.contains(TITLE));
        assert!(screen.contains("Select a song"));
        assert!(screen.contains("Playlist empty"));
        assert!(screen.contains("Loading songs..."));
        assert!(!app.player.controls_enabled());
        assert_eq!(app.seek_bar, Rect::default());
    }

    #[test]
    fn fetched_playlist_is_listed_and_paused() {
        let mut app = app();
        app.event_tx.send(GlobalEvent::SongsFetched(songs())).unwrap();
        app.handle_actions();

        let screen = draw(&mut app);

        assert!(screen.contains("Mario Castle"));
        assert!(screen.contains("Mario Star"));
        assert!(screen.contains("Paused"));
        assert_eq!(app.playlist_state.selected(), Some(0));
    }

    #[test]
    fn seek_shows_new_position_immediately() {
        let mut app = app();
        app.handle_action(GlobalEvent::SongsFetched(songs()));
        app.handle_action(GlobalEvent::Media {
            generation: app.player.generation(),
            event: MediaEvent::LoadedMetadata(Some(200.0)),
        });

        app.handle_action(GlobalEvent::Seek(65.0));
        let screen = draw(&mut app);

        assert!(screen.contains("01:05"));
        assert!(screen.contains("03:20"));
    }

    #[test]
    fn unfocused_terminal_is_not_redrawn() {
        let mut app = app();
        app.handle_action(GlobalEvent::SongsFetched(songs()));

        app.handle_event(Event::FocusLost);
        assert!(!draw(&mut app).contains(TITLE));

        app.handle_event(Event::FocusGained);
        assert!(draw(&mut app).contains(TITLE));
    }

    #[test]
    fn rejected_start_from_keyboard_settles_to_paused() {
        let mut app = app();
        app.handle_action(GlobalEvent::SongsFetched(songs()));

        app.handle_key_event(key(KeyCode::Char(' ')));
        assert!(app.player.state().is_playing);

        // The unavailable element answers with PlayFailed on the channel.
        app.handle_actions();
        assert!(!app.player.state().is_playing);
    }

    #[test]
    fn enter_plays_song_under_cursor() {
        let mut app = app();
        app.handle_action(GlobalEvent::SongsFetched(songs()));

        app.handle_key_event(key(KeyCode::Down));
        app.handle_key_event(key(KeyCode::Enter));

        let current = app.player.state().current_song.as_ref().map(|s| s.id);
        assert_eq!(current, Some(2));
    }

    #[test]
    fn clicking_a_row_plays_it() {
        let mut app = app();
        app.handle_action(GlobalEvent::SongsFetched(songs()));
        draw(&mut app);

        let row = app.playlist_area.y + 1;
        app.handle_mouse_event(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: app.playlist_area.x + 2,
            row,
            modifiers: KeyModifiers::NONE,
        });

        let current = app.player.state().current_song.as_ref().map(|s| s.id);
        assert_eq!(current, Some(2));
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        app.handle_key_event(key(KeyCode::Char('c')));
        assert!(!app.should_quit);

        app.handle_key_event(KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        });
        assert!(app.should_quit);
    }

    #[test]
    fn late_playlist_is_ignored_after_teardown() {
        let mut app = app();
        app.fetch_token.cancel();

        app.handle_action(GlobalEvent::SongsFetched(songs()));

        assert!(app.player.songs().is_empty());
    }
}
