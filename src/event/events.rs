use crate::{api::Song, audio::media::MediaEvent};

pub enum GlobalEvent {
    // Events
    SongsFetched(Vec<Song>),
    FetchFailed(String),
    Media { generation: u64, event: MediaEvent },

    // Commands
    PlaySong(i64),
    TogglePlayPause,
    Next,
    Previous,
    Seek(f64),
    SeekForward(f64),
    SeekBackward(f64),
}

/// Commands understood by the audio output thread.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    Load { url: String, generation: u64 },
    Play,
    Pause,
    Seek(f64),
    Shutdown,
}
