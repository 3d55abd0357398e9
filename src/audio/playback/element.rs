use std::{
    thread::{self, JoinHandle},
    time::Duration,
};

use flume::{Receiver, RecvError, Selector, Sender};
use tracing::{debug, error, info, warn};

use crate::{
    audio::media::{MediaElement, MediaEvent},
    event::events::{GlobalEvent, MediaCommand},
    stream::streamer::{Fetch, MediaBuffer, MediaFetcher},
};

use super::player::{init, OutputDevice, Playback};

const TICK: Duration = Duration::from_millis(250);

/// Handle to the audio output thread.
///
/// The thread owns the output stream and the only sender of media events;
/// dropping the handle shuts it down, which ends the subscription too.
pub struct OutputElement {
    command_tx: Sender<MediaCommand>,
    thread: Option<JoinHandle<()>>,
}

impl OutputElement {
    pub fn spawn(event_tx: Sender<GlobalEvent>) -> anyhow::Result<Self> {
        let (command_tx, command_rx) = flume::unbounded();
        let (ready_tx, ready_rx) = flume::bounded(1);

        let thread = thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || {
                let (stream, device) = match init() {
                    Ok(output) => {
                        let _ = ready_tx.send(Ok(()));
                        output
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                Output::new(device, MediaFetcher::new(), event_tx)
                    .run(command_rx);

                drop(stream);
                debug!("audio output thread stopped");
            })?;

        ready_rx.recv()??;

        Ok(Self {
            command_tx,
            thread: Some(thread),
        })
    }

    fn send(&self, cmd: MediaCommand) {
        if self.command_tx.send(cmd).is_err() {
            warn!("audio output thread is gone");
        }
    }
}

impl MediaElement for OutputElement {
    fn set_source(&mut self, url: &str, generation: u64) {
        self.send(MediaCommand::Load {
            url: url.to_string(),
            generation,
        });
    }

    fn play(&mut self) {
        self.send(MediaCommand::Play);
    }

    fn pause(&mut self) {
        self.send(MediaCommand::Pause);
    }

    fn seek(&mut self, position: f64) {
        self.send(MediaCommand::Seek(position));
    }
}

impl Drop for OutputElement {
    fn drop(&mut self) {
        let _ = self.command_tx.send(MediaCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("audio output thread panicked");
            }
        }
    }
}

/// Drops commands made stale by a later `Load`. Loading resets the
/// element to paused at position zero, so nothing before it survives.
pub fn coalesce(batch: Vec<MediaCommand>) -> Vec<MediaCommand> {
    if batch.contains(&MediaCommand::Shutdown) {
        return vec![MediaCommand::Shutdown];
    }

    match batch
        .iter()
        .rposition(|cmd| matches!(cmd, MediaCommand::Load { .. }))
    {
        Some(last_load) => batch.into_iter().skip(last_load).collect(),
        None => batch,
    }
}

struct Download {
    generation: u64,
    url: String,
    result: anyhow::Result<Vec<u8>>,
}

enum Wake {
    Command(Result<MediaCommand, RecvError>),
    Download(Result<Download, RecvError>),
}

struct Output<D: OutputDevice, F: Fetch> {
    device: D,
    fetcher: F,
    events: Sender<GlobalEvent>,
    download_tx: Sender<Download>,
    download_rx: Receiver<Download>,
    generation: u64,
    loading: bool,
    play_when_ready: bool,
    seek_when_ready: Option<f64>,
    sink: Option<D::Playback>,
    source: Option<MediaBuffer>,
    ended: bool,
    last_position: Option<f64>,
}

impl<D: OutputDevice, F: Fetch> Output<D, F> {
    fn new(device: D, fetcher: F, events: Sender<GlobalEvent>) -> Self {
        let (download_tx, download_rx) = flume::unbounded();

        Self {
            device,
            fetcher,
            events,
            download_tx,
            download_rx,
            generation: 0,
            loading: false,
            play_when_ready: false,
            seek_when_ready: None,
            sink: None,
            source: None,
            ended: false,
            last_position: None,
        }
    }

    fn run(mut self, commands: Receiver<MediaCommand>) {
        loop {
            let wake = Selector::new()
                .recv(&commands, Wake::Command)
                .recv(&self.download_rx, Wake::Download)
                .wait_timeout(TICK);

            match wake {
                Ok(Wake::Command(Ok(cmd))) => {
                    let mut batch = vec![cmd];
                    batch.extend(commands.try_iter());

                    for cmd in coalesce(batch) {
                        if cmd == MediaCommand::Shutdown {
                            self.stop();
                            return;
                        }
                        self.handle(cmd);
                    }
                }
                Ok(Wake::Command(Err(_))) => {
                    self.stop();
                    return;
                }
                Ok(Wake::Download(Ok(download))) => self.on_download(download),
                Ok(Wake::Download(Err(_))) | Err(_) => {}
            }

            self.poll();
        }
    }

    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(GlobalEvent::Media {
            generation: self.generation,
            event,
        });
    }

    fn handle(&mut self, cmd: MediaCommand) {
        match cmd {
            MediaCommand::Load { url, generation } => self.load(url, generation),
            MediaCommand::Play => self.play(),
            MediaCommand::Pause => {
                self.play_when_ready = false;
                if let Some(sink) = self.sink.as_ref() {
                    sink.pause();
                }
            }
            MediaCommand::Seek(position) => self.seek(position),
            MediaCommand::Shutdown => self.stop(),
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Starts the download on its own thread; the bytes come back through
    /// `download_rx` tagged with `generation`.
    fn load(&mut self, url: String, generation: u64) {
        self.stop();
        self.source = None;
        self.ended = false;
        self.last_position = None;
        self.generation = generation;
        self.loading = true;
        self.play_when_ready = false;
        self.seek_when_ready = None;

        info!("loading {url}");
        let fetcher = self.fetcher.clone();
        let download_tx = self.download_tx.clone();
        let spawned = thread::Builder::new()
            .name("media-fetch".into())
            .spawn(move || {
                let result = fetcher.fetch(&url);
                let _ = download_tx.send(Download {
                    generation,
                    url,
                    result,
                });
            });

        if let Err(err) = spawned {
            error!("Failed to start download: {err}");
            self.loading = false;
            self.emit(MediaEvent::Error(format!("download not started: {err}")));
        }
    }

    fn on_download(&mut self, download: Download) {
        if download.generation != self.generation || !self.loading {
            debug!("discarding download of {}", download.url);
            return;
        }
        self.loading = false;

        let opened = download.result.and_then(|bytes| {
            let buffer = MediaBuffer::new(download.url.clone(), bytes);
            let (sink, total_duration) = self.device.open(&buffer)?;
            Ok((buffer, sink, total_duration))
        });

        let (buffer, sink, total_duration) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                error!("Failed to load {}: {err:#}", download.url);
                self.emit(MediaEvent::Error(format!("{err:#}")));
                if self.play_when_ready {
                    self.play_when_ready = false;
                    self.emit(MediaEvent::PlayFailed(
                        "no playable source".to_string(),
                    ));
                }
                return;
            }
        };

        self.sink = Some(sink);
        self.source = Some(buffer);
        self.emit(MediaEvent::LoadedMetadata(
            total_duration.map(|d| d.as_secs_f64()),
        ));
        self.emit(MediaEvent::TimeUpdate(0.0));

        if let Some(position) = self.seek_when_ready.take() {
            self.seek(position);
        }
        if std::mem::take(&mut self.play_when_ready) {
            self.play();
        }
    }

    fn play(&mut self) {
        if self.loading {
            self.play_when_ready = true;
            return;
        }

        if self.ended {
            if let Err(err) = self.restart() {
                self.emit(MediaEvent::PlayFailed(format!("{err:#}")));
                return;
            }
        }

        match self.sink.as_ref() {
            Some(sink) => sink.play(),
            None => self.emit(MediaEvent::PlayFailed(
                "no playable source".to_string(),
            )),
        }
    }

    /// Re-opens the current source at position zero after it has ended.
    fn restart(&mut self) -> anyhow::Result<()> {
        let buffer = self
            .source
            .as_ref()
            .ok_or(anyhow::Error::msg("no playable source"))?;
        let (sink, _) = self.device.open(buffer)?;

        self.stop();
        self.sink = Some(sink);
        self.ended = false;
        self.last_position = None;
        self.emit(MediaEvent::TimeUpdate(0.0));

        Ok(())
    }

    fn seek(&mut self, position: f64) {
        if self.loading {
            self.seek_when_ready = Some(position);
            return;
        }

        if self.ended {
            if let Err(err) = self.restart() {
                self.emit(MediaEvent::Error(format!("{err:#}")));
                return;
            }
        }

        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let target = Duration::from_secs_f64(position.max(0.0));
        if let Err(err) = sink.seek(target) {
            warn!("seek to {position:.1}s failed: {err:#}");
            self.emit(MediaEvent::Error(format!("seek failed: {err:#}")));
        }
    }

    fn poll(&mut self) {
        if self.ended {
            return;
        }
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        if sink.empty() {
            self.ended = true;
            self.emit(MediaEvent::Ended);
            return;
        }

        if sink.is_paused() {
            return;
        }

        let position = sink.position().as_secs_f64();
        if self.last_position != Some(position) {
            self.last_position = Some(position);
            self.emit(MediaEvent::TimeUpdate(position));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct SinkState {
        playing: bool,
        stopped: bool,
        empty: bool,
        position: Duration,
        seeks: Vec<Duration>,
    }

    #[derive(Clone, Default)]
    struct FakeSink(Arc<Mutex<SinkState>>);

    impl FakeSink {
        fn with<T>(&self, f: impl FnOnce(&mut SinkState) -> T) -> T {
            f(&mut *self.0.lock().unwrap())
        }
    }

    impl Playback for FakeSink {
        fn play(&self) {
            self.with(|s| s.playing = true)
        }

        fn pause(&self) {
            self.with(|s| s.playing = false)
        }

        fn stop(&self) {
            self.with(|s| s.stopped = true)
        }

        fn is_paused(&self) -> bool {
            self.with(|s| !s.playing)
        }

        fn empty(&self) -> bool {
            self.with(|s| s.empty)
        }

        fn position(&self) -> Duration {
            self.with(|s| s.position)
        }

        fn seek(&self, position: Duration) -> anyhow::Result<()> {
            self.with(|s| {
                s.position = position;
                s.seeks.push(position);
            });
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeDevice {
        opened: Arc<Mutex<Vec<FakeSink>>>,
    }

    impl FakeDevice {
        fn sinks(&self) -> Vec<FakeSink> {
            self.opened.lock().unwrap().clone()
        }
    }

    impl OutputDevice for FakeDevice {
        type Playback = FakeSink;

        fn open(
            &self,
            _buffer: &MediaBuffer,
        ) -> anyhow::Result<(FakeSink, Option<Duration>)> {
            let sink = FakeSink::default();
            self.opened.lock().unwrap().push(sink.clone());
            Ok((sink, Some(Duration::from_secs(120))))
        }
    }

    #[derive(Clone)]
    enum FakeFetch {
        Bytes,
        Fail,
        Stall(Receiver<()>),
    }

    impl Fetch for FakeFetch {
        fn fetch(&self, _url: &str) -> anyhow::Result<Vec<u8>> {
            match self {
                FakeFetch::Bytes => Ok(vec![0; 16]),
                FakeFetch::Fail => anyhow::bail!("media request returned 404"),
                FakeFetch::Stall(gate) => {
                    let _ = gate.recv();
                    anyhow::bail!("stalled")
                }
            }
        }
    }

    type TestOutput = Output<FakeDevice, FakeFetch>;

    fn output(
        fetch: FakeFetch,
    ) -> (TestOutput, FakeDevice, Receiver<GlobalEvent>) {
        let device = FakeDevice::default();
        let (tx, rx) = flume::unbounded();
        (Output::new(device.clone(), fetch, tx), device, rx)
    }

    fn load(output: &mut TestOutput, generation: u64) {
        output.handle(MediaCommand::Load {
            url: format!("/sound/{generation}.mp3"),
            generation,
        });
    }

    fn finish_download(output: &mut TestOutput) {
        let download = output
            .download_rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        output.on_download(download);
    }

    fn events(rx: &Receiver<GlobalEvent>) -> Vec<(u64, MediaEvent)> {
        rx.try_iter()
            .filter_map(|evt| match evt {
                GlobalEvent::Media { generation, event } => {
                    Some((generation, event))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn later_load_discards_earlier_commands() {
        let batch = vec![
            MediaCommand::Load {
                url: "/a.mp3".into(),
                generation: 1,
            },
            MediaCommand::Play,
            MediaCommand::Load {
                url: "/b.mp3".into(),
                generation: 2,
            },
            MediaCommand::Play,
        ];

        assert_eq!(
            coalesce(batch),
            vec![
                MediaCommand::Load {
                    url: "/b.mp3".into(),
                    generation: 2,
                },
                MediaCommand::Play,
            ]
        );
    }

    #[test]
    fn commands_without_load_keep_their_order() {
        let batch = vec![
            MediaCommand::Seek(3.0),
            MediaCommand::Pause,
            MediaCommand::Play,
        ];

        assert_eq!(coalesce(batch.clone()), batch);
    }

    #[test]
    fn shutdown_wins() {
        let batch = vec![
            MediaCommand::Play,
            MediaCommand::Shutdown,
            MediaCommand::Load {
                url: "/a.mp3".into(),
                generation: 1,
            },
        ];

        assert_eq!(coalesce(batch), vec![MediaCommand::Shutdown]);
    }

    #[test]
    fn loaded_source_reports_under_its_generation() {
        let (mut output, _, rx) = output(FakeFetch::Bytes);

        load(&mut output, 7);
        finish_download(&mut output);

        assert_eq!(
            events(&rx),
            vec![
                (7, MediaEvent::LoadedMetadata(Some(120.0))),
                (7, MediaEvent::TimeUpdate(0.0)),
            ]
        );
    }

    #[test]
    fn play_while_loading_starts_once_ready() {
        let (mut output, device, _rx) = output(FakeFetch::Bytes);

        load(&mut output, 1);
        output.handle(MediaCommand::Seek(30.0));
        output.handle(MediaCommand::Play);
        assert!(device.sinks().is_empty());

        finish_download(&mut output);

        let sink = &device.sinks()[0];
        assert!(sink.with(|s| s.playing));
        assert_eq!(sink.with(|s| s.seeks.clone()), vec![Duration::from_secs(30)]);
    }

    #[test]
    fn play_without_source_fails() {
        let (mut output, _, rx) = output(FakeFetch::Bytes);

        output.handle(MediaCommand::Play);

        assert!(matches!(
            events(&rx).as_slice(),
            [(0, MediaEvent::PlayFailed(_))]
        ));
    }

    #[test]
    fn failed_download_rejects_pending_play() {
        let (mut output, _, rx) = output(FakeFetch::Fail);

        load(&mut output, 2);
        output.handle(MediaCommand::Play);
        finish_download(&mut output);

        assert!(matches!(
            events(&rx).as_slice(),
            [(2, MediaEvent::Error(_)), (2, MediaEvent::PlayFailed(_))]
        ));
    }

    #[test]
    fn superseded_download_is_discarded() {
        let (mut output, device, rx) = output(FakeFetch::Bytes);

        load(&mut output, 1);
        load(&mut output, 2);
        finish_download(&mut output);
        finish_download(&mut output);

        assert_eq!(device.sinks().len(), 1);
        assert!(events(&rx).iter().all(|(generation, _)| *generation == 2));
    }

    #[test]
    fn end_is_reported_once() {
        let (mut output, device, rx) = output(FakeFetch::Bytes);
        load(&mut output, 1);
        finish_download(&mut output);
        output.handle(MediaCommand::Play);
        events(&rx);

        device.sinks()[0].with(|s| s.empty = true);
        output.poll();
        output.poll();

        assert_eq!(events(&rx), vec![(1, MediaEvent::Ended)]);
    }

    #[test]
    fn play_after_end_restarts_from_zero() {
        let (mut output, device, rx) = output(FakeFetch::Bytes);
        load(&mut output, 1);
        finish_download(&mut output);
        device.sinks()[0].with(|s| s.empty = true);
        output.poll();
        events(&rx);

        output.handle(MediaCommand::Play);

        let sinks = device.sinks();
        assert_eq!(sinks.len(), 2);
        assert!(sinks[0].with(|s| s.stopped));
        assert!(sinks[1].with(|s| s.playing));
        assert_eq!(events(&rx), vec![(1, MediaEvent::TimeUpdate(0.0))]);
    }

    #[test]
    fn position_is_reported_only_when_it_moves() {
        let (mut output, device, rx) = output(FakeFetch::Bytes);
        load(&mut output, 1);
        finish_download(&mut output);
        output.handle(MediaCommand::Play);
        events(&rx);

        device.sinks()[0].with(|s| s.position = Duration::from_secs(3));
        output.poll();
        output.poll();

        assert_eq!(events(&rx), vec![(1, MediaEvent::TimeUpdate(3.0))]);
    }

    #[test]
    fn shutdown_does_not_wait_for_a_pending_download() {
        let (gate_tx, gate_rx) = flume::bounded::<()>(0);
        let (command_tx, command_rx) = flume::unbounded();
        let (done_tx, done_rx) = flume::bounded(1);
        let (event_tx, _event_rx) = flume::unbounded();

        thread::spawn(move || {
            Output::new(FakeDevice::default(), FakeFetch::Stall(gate_rx), event_tx)
                .run(command_rx);
            let _ = done_tx.send(());
        });

        command_tx
            .send(MediaCommand::Load {
                url: "/slow.mp3".into(),
                generation: 1,
            })
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        command_tx.send(MediaCommand::Shutdown).unwrap();

        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        drop(gate_tx);
    }
}
