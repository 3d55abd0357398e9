use flume::Sender;

use crate::event::events::GlobalEvent;

/// Notifications coming back from a playback resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position in seconds.
    TimeUpdate(f64),
    /// The source is decoded. `None` when its length is unknown.
    LoadedMetadata(Option<f64>),
    Ended,
    /// Play was requested but the resource could not start.
    PlayFailed(String),
    Error(String),
}

/// The single audio resource a player is bound to.
///
/// Commands are fire-and-forget; their outcome and all progress are
/// reported back as [`MediaEvent`]s on the channel the resource was
/// created with, tagged with the generation of the source they concern.
pub trait MediaElement {
    fn set_source(&mut self, url: &str, generation: u64);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: f64);
}

impl<M: MediaElement + ?Sized> MediaElement for Box<M> {
    fn set_source(&mut self, url: &str, generation: u64) {
        (**self).set_source(url, generation)
    }

    fn play(&mut self) {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn seek(&mut self, position: f64) {
        (**self).seek(position)
    }
}

/// Stand-in used when no audio output could be opened. Every play request
/// is rejected so the player settles back to paused.
pub struct UnavailableElement {
    events: Sender<GlobalEvent>,
    reason: String,
    generation: u64,
}

impl UnavailableElement {
    pub fn new(events: Sender<GlobalEvent>, reason: String) -> Self {
        Self {
            events,
            reason,
            generation: 0,
        }
    }
}

impl MediaElement for UnavailableElement {
    fn set_source(&mut self, _url: &str, generation: u64) {
        self.generation = generation;
    }

    fn play(&mut self) {
        let _ = self.events.send(GlobalEvent::Media {
            generation: self.generation,
            event: MediaEvent::PlayFailed(self.reason.clone()),
        });
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _position: f64) {}
}
