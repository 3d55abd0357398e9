use std::time::Duration;

use anyhow::Context;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::stream::streamer::MediaBuffer;

use super::utils::setup_output_device;

/// What the output thread needs from a playing source.
pub trait Playback {
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    fn is_paused(&self) -> bool;
    fn empty(&self) -> bool;
    fn position(&self) -> Duration;
    fn seek(&self, position: Duration) -> anyhow::Result<()>;
}

impl Playback for Sink {
    fn play(&self) {
        Sink::play(self)
    }

    fn pause(&self) {
        Sink::pause(self)
    }

    fn stop(&self) {
        Sink::stop(self)
    }

    fn is_paused(&self) -> bool {
        Sink::is_paused(self)
    }

    fn empty(&self) -> bool {
        Sink::empty(self)
    }

    fn position(&self) -> Duration {
        self.get_pos()
    }

    fn seek(&self, position: Duration) -> anyhow::Result<()> {
        self.try_seek(position)
            .map_err(|err| anyhow::Error::msg(err.to_string()))
    }
}

/// Opens decoded sources on an audio output.
pub trait OutputDevice {
    type Playback: Playback;

    /// Builds a paused playback positioned at the start of `buffer`, with
    /// the source's length when the container reports one.
    fn open(
        &self,
        buffer: &MediaBuffer,
    ) -> anyhow::Result<(Self::Playback, Option<Duration>)>;
}

pub struct RodioDevice {
    stream_handle: OutputStreamHandle,
}

impl OutputDevice for RodioDevice {
    type Playback = Sink;

    fn open(
        &self,
        buffer: &MediaBuffer,
    ) -> anyhow::Result<(Sink, Option<Duration>)> {
        let source = Decoder::new(buffer.cursor())
            .with_context(|| format!("Failed to decode {}", buffer.url))?;
        let total_duration = source.total_duration();

        let sink = Sink::try_new(&self.stream_handle)
            .context("Failed to create audio sink")?;
        sink.pause();
        sink.append(source);

        Ok((sink, total_duration))
    }
}

/// Opens the default output. The stream must outlive every sink opened on
/// the returned device.
pub fn init() -> anyhow::Result<(OutputStream, RodioDevice)> {
    let device = setup_output_device()?;
    let (stream, stream_handle) = OutputStream::try_from_device(&device)
        .context("Failed to open audio output stream")?;

    Ok((stream, RodioDevice { stream_handle }))
}
