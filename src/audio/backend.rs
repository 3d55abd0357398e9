use tracing::{debug, error, info};

use crate::{api::Song, config::Config};

use super::{
    media::{MediaElement, MediaEvent},
    state::PlaybackState,
};

/// Playlist, playback state and the media element they drive.
///
/// Every transport operation is a no-op while no song is current, which is
/// also what keeps navigation away from an empty playlist.
pub struct AudioPlayer<M: MediaElement> {
    media: M,
    config: Config,
    songs: Vec<Song>,
    state: PlaybackState,
    /// Bumped on every bind; media events for older sources are dropped.
    generation: u64,
}

impl<M: MediaElement> AudioPlayer<M> {
    pub fn new(media: M, config: Config) -> Self {
        Self {
            media,
            config,
            songs: Vec::new(),
            state: PlaybackState::default(),
            generation: 0,
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn controls_enabled(&self) -> bool {
        self.state.current_song.is_some()
    }

    pub fn is_current(&self, song: &Song) -> bool {
        self.state
            .current_song
            .as_ref()
            .is_some_and(|current| current.id == song.id)
    }

    /// Takes a freshly fetched playlist and cues its first entry, paused.
    pub fn load_songs(&mut self, songs: Vec<Song>) {
        self.songs = songs;
        self.state.is_playing = false;

        if let Some(first) = self.songs.first().cloned() {
            self.bind(first);
        }
    }

    pub fn fetch_failed(&mut self, reason: &str) {
        error!("Error fetching songs: {reason}");
    }

    fn bind(&mut self, song: Song) {
        let url = self.config.media_url(&song.url);
        debug!("binding song {} to {url}", song.id);

        self.generation += 1;
        self.state.current_song = Some(song);
        self.state.reset_progress();
        self.media.set_source(&url, self.generation);

        if self.state.is_playing {
            self.media.play();
        }
    }

    pub fn play_song(&mut self, song: Song) {
        self.state.is_playing = true;

        if self.is_current(&song) {
            self.media.play();
        } else {
            self.bind(song);
        }
    }

    pub fn play_song_by_id(&mut self, id: i64) {
        if let Some(song) = self.songs.iter().find(|s| s.id == id).cloned() {
            self.play_song(song);
        }
    }

    pub fn play_pause(&mut self) {
        if !self.controls_enabled() {
            return;
        }

        if self.state.is_playing {
            self.media.pause();
        } else {
            self.media.play();
        }
        self.state.is_playing = !self.state.is_playing;
    }

    pub fn play_next(&mut self) {
        self.step(1);
    }

    pub fn play_previous(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, offset: i64) {
        if !self.controls_enabled() || self.songs.is_empty() {
            return;
        }

        let len = self.songs.len() as i64;
        let index = (self.current_index() + offset).rem_euclid(len) as usize;
        let song = self.songs[index].clone();
        self.play_song(song);
    }

    /// Position of the current song, `-1` when it is not in the list.
    fn current_index(&self) -> i64 {
        self.state
            .current_song
            .as_ref()
            .and_then(|current| {
                self.songs.iter().position(|s| s.id == current.id)
            })
            .map_or(-1, |i| i as i64)
    }

    pub fn seek(&mut self, position: f64) {
        if !self.controls_enabled() {
            return;
        }

        let position = self.state.clamp_position(position);
        self.media.seek(position);
        self.state.current_time = position;
    }

    pub fn seek_forwards(&mut self, seconds: f64) {
        self.seek(self.state.current_time + seconds);
    }

    pub fn seek_backwards(&mut self, seconds: f64) {
        self.seek(self.state.current_time - seconds);
    }

    pub fn handle_media_event(&mut self, generation: u64, evt: MediaEvent) {
        if generation != self.generation {
            debug!("dropping {evt:?} from source {generation}");
            return;
        }

        match evt {
            MediaEvent::TimeUpdate(position) => {
                self.state.set_current_time(position)
            }
            MediaEvent::LoadedMetadata(Some(duration)) => {
                self.state.duration = duration;
                let position = self.state.current_time;
                self.state.set_current_time(position);
            }
            MediaEvent::LoadedMetadata(None) => {
                debug!("source did not report a duration");
                self.state.duration = 0.0;
            }
            MediaEvent::Ended => {
                info!("track ended, advancing");
                self.play_next();
            }
            MediaEvent::PlayFailed(reason) => {
                error!("Playback error: {reason}");
                self.state.is_playing = false;
            }
            MediaEvent::Error(reason) => error!("Media error: {reason}"),
        }
    }
}
