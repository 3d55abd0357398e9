use std::{
    ops::{Deref, DerefMut},
    thread,
    time::Duration,
};

use color_eyre::eyre::Result;

use flume::{Receiver, Sender};
use ratatui::crossterm::{
    cursor,
    event::{
        self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture,
        EnableBracketedPaste, EnableFocusChange, EnableMouseCapture,
        Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend as Backend, crossterm};
use tracing::error;

const FRAME_RATE: Duration = Duration::from_millis(16);

#[derive(Clone, Debug)]
pub enum Event {
    Init,
    Error,
    Tick,
    FocusGained,
    FocusLost,
    Paste(String),
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
}

pub struct Tui {
    pub terminal: ratatui::Terminal<Backend<std::io::Stdout>>,
    pub event_rx: Receiver<Event>,
    pub event_tx: Sender<Event>,
    pub mouse: bool,
    pub paste: bool,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let terminal = ratatui::Terminal::new(Backend::new(std::io::stdout()))?;
        let (event_tx, event_rx) = flume::unbounded();
        Ok(Self {
            terminal,
            event_rx,
            event_tx,
            mouse: false,
            paste: false,
        })
    }

    pub fn mouse(mut self, mouse: bool) -> Self {
        self.mouse = mouse;
        self
    }

    pub fn paste(mut self, paste: bool) -> Self {
        self.paste = paste;
        self
    }

    /// Reads terminal input on its own thread. The thread ends once the
    /// receiving side has been dropped.
    pub fn start(&mut self) {
        let event_tx = self.event_tx.clone();
        thread::spawn(move || {
            if event_tx.send(Event::Init).is_err() {
                return;
            }
            loop {
                if event_tx.send(Event::Tick).is_err() {
                    break;
                }
                match event::poll(FRAME_RATE) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(err) => {
                        error!("terminal poll failed: {err}");
                        let _ = event_tx.send(Event::Error);
                        continue;
                    }
                }
                let evt = match event::read() {
                    Ok(CrosstermEvent::Key(key)) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        Event::Key(key)
                    }
                    Ok(CrosstermEvent::Mouse(mouse)) => Event::Mouse(mouse),
                    Ok(CrosstermEvent::Resize(x, y)) => Event::Resize(x, y),
                    Ok(CrosstermEvent::FocusLost) => Event::FocusLost,
                    Ok(CrosstermEvent::FocusGained) => Event::FocusGained,
                    Ok(CrosstermEvent::Paste(s)) => Event::Paste(s),
                    Err(_) => Event::Error,
                };
                if event_tx.send(evt).is_err() {
                    break;
                }
            }
        });
    }

    pub fn enter(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            EnterAlternateScreen,
            EnableFocusChange,
            cursor::Hide
        )?;
        if self.mouse {
            crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
        }
        if self.paste {
            crossterm::execute!(std::io::stdout(), EnableBracketedPaste)?;
        }
        self.start();
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        if crossterm::terminal::is_raw_mode_enabled()? {
            self.flush()?;
            if self.paste {
                crossterm::execute!(std::io::stdout(), DisableBracketedPaste)?;
            }
            if self.mouse {
                crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
            }
            crossterm::execute!(
                std::io::stdout(),
                DisableFocusChange,
                LeaveAlternateScreen,
                cursor::Show
            )?;
            crossterm::terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    pub fn restore() -> Result<()> {
        crossterm::execute!(
            std::io::stdout(),
            DisableMouseCapture,
            DisableFocusChange,
            LeaveAlternateScreen,
            cursor::Show
        )?;
        crossterm::terminal::disable_raw_mode()?;
        Ok(())
    }

    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Option<Event> {
        self.event_rx.recv_async().await.ok()
    }
}

impl Deref for Tui {
    type Target = ratatui::Terminal<Backend<std::io::Stdout>>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for Tui {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(err) = self.exit() {
            error!("Unable to restore the terminal: {err:?}");
        }
    }
}
