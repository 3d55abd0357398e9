use crate::api::Song;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub current_song: Option<Song>,
    pub is_playing: bool,
    /// Seconds.
    pub current_time: f64,
    /// Seconds, `0.0` until the source reports its length.
    pub duration: f64,
}

impl PlaybackState {
    pub fn has_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Clamps a position the way a `[0, duration]` range input does.
    pub fn clamp_position(&self, position: f64) -> f64 {
        let max = if self.has_duration() { self.duration } else { 0.0 };
        if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, max)
        }
    }

    pub fn set_current_time(&mut self, position: f64) {
        self.current_time = if self.has_duration() {
            self.clamp_position(position)
        } else {
            position.max(0.0)
        };
    }

    pub fn reset_progress(&mut self) {
        self.current_time = 0.0;
        self.duration = 0.0;
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.has_duration() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
