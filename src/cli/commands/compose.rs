//! Compose command - take notes while watching.
//!
//! Opens an input line in raw mode. The playback position is captured the
//! moment you start typing, shifted 5 seconds earlier to cover reaction
//! time, and used when you press Enter. Clearing the line starts over.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, queue};
use tokio::sync::mpsc;

use vidnote_cli::capture::{fetch_position, CaptureSession, CaptureState, CaptureTicket};
use vidnote_cli::config::Config;
use vidnote_cli::context::Navigator;
use vidnote_cli::export::format_time;
use vidnote_cli::player::PositionProvider;
use vidnote_cli::storage::{Database, NoteStore};
use vidnote_cli::{NoteError, NoteResult};

use crate::cli::{navigator, newest_note, open_store, player};

type CaptureResult = (CaptureTicket, NoteResult<f64>);

/// Arguments for the compose command.
#[derive(clap::Args)]
#[command(after_help = "KEYS:\n    \
    Enter          Save the note\n    \
    Ctrl+Enter     New line within the note (also Alt+Enter, Ctrl+J)\n    \
    Ctrl+U         Clear the line (the next keystroke captures a new time)\n    \
    Esc, Ctrl+C    Quit\n\n\
COMMANDS (typed on the input line):\n    \
    /open VIDEO    Switch to another video\n    \
    /quit          Quit")]
pub struct Args {
    /// Watch URL or video ID
    #[arg(value_name = "VIDEO")]
    pub video: String,
}

/// Executes the compose command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let client = player(&config)?;

    let navigator = navigator(&config)?;
    let token = navigator
        .navigate(&args.video)
        .map_err(|e| anyhow::anyhow!("{e}. Pass a watch URL or the bare video ID."))?;
    let existing = store.load(&token.content_id)?.len();

    println!(
        "{} {} ({} notes so far)",
        "Taking notes for".bold(),
        token.content_id.to_string().cyan(),
        existing
    );
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    if let Err(e) = rt.block_on(client.ping()) {
        println!("{} {}", "Warning:".yellow(), e);
        println!("Start the bridge with 'vidnote player' before saving notes.");
    }
    println!("{}", "Start typing; Enter saves, Esc quits.".dimmed());

    let timeout = config.position_timeout();
    let composer = Composer {
        session: CaptureSession::new(navigator.clone(), token, timeout),
        navigator,
        store,
        client: client as Arc<dyn PositionProvider>,
        timeout,
        input: String::new(),
    };

    let _raw = RawMode::enable()?;
    rt.block_on(composer.run())
}

enum Flow {
    Continue,
    Quit,
}

struct Composer {
    store: NoteStore<Database>,
    navigator: Navigator,
    session: CaptureSession,
    client: Arc<dyn PositionProvider>,
    timeout: Duration,
    input: String,
}

impl Composer {
    async fn run(mut self) -> Result<()> {
        let (key_tx, mut key_rx) = mpsc::unbounded_channel();
        let (capture_tx, mut capture_rx) = mpsc::unbounded_channel::<CaptureResult>();
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_key_reader(key_tx, stop.clone());

        self.redraw()?;
        loop {
            tokio::select! {
                key = key_rx.recv() => {
                    let Some(key) = key else { break };
                    if let Flow::Quit = self.handle_key(key, &capture_tx).await? {
                        break;
                    }
                }
                Some((ticket, result)) = capture_rx.recv() => {
                    self.session.complete(&ticket, result);
                }
            }
            self.redraw()?;
        }

        stop.store(true, Ordering::Relaxed);
        let _ = reader.join();
        self.print_line("")?;
        Ok(())
    }

    async fn handle_key(
        &mut self,
        key: KeyEvent,
        capture_tx: &mpsc::UnboundedSender<CaptureResult>,
    ) -> Result<Flow> {
        match apply_key(&mut self.input, key) {
            KeyAction::Quit => return Ok(Flow::Quit),
            KeyAction::Submit => return self.submit().await,
            KeyAction::Edited => self.input_changed(capture_tx),
            KeyAction::Ignored => {}
        }
        Ok(Flow::Continue)
    }

    /// Starts a background position fetch when a new cycle begins.
    fn input_changed(&mut self, capture_tx: &mpsc::UnboundedSender<CaptureResult>) {
        let Some(ticket) = self.session.input_changed(&self.input) else {
            return;
        };

        let client = self.client.clone();
        let capture_tx = capture_tx.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let result = fetch_position(client.as_ref(), timeout).await;
            let _ = capture_tx.send((ticket, result));
        });
    }

    async fn submit(&mut self) -> Result<Flow> {
        let text = self.input.trim().to_string();

        if text == "/quit" {
            return Ok(Flow::Quit);
        }
        if let Some(video) = text.strip_prefix("/open ") {
            self.open(video.trim())?;
            return Ok(Flow::Continue);
        }

        match self
            .session
            .submit(&self.store, &text, self.client.as_ref())
            .await
        {
            Ok(notes) => {
                self.input.clear();
                if let Some((_, note)) = newest_note(&notes) {
                    self.print_line(&format!("  {} - {}", format_time(note.time), note.text))?;
                }
            }
            Err(NoteError::EmptyInput) => {}
            Err(NoteError::StaleContext) => {
                self.warn("No video open. Use /open VIDEO.")?;
            }
            Err(e) => {
                self.warn(&e.to_string())?;
            }
        }
        Ok(Flow::Continue)
    }

    fn open(&mut self, video: &str) -> Result<()> {
        self.input.clear();
        match self.navigator.navigate(video) {
            Ok(token) => {
                let count = self.store.load(&token.content_id)?.len();
                let line = format!(
                    "{} {} ({} notes so far)",
                    "Taking notes for".bold(),
                    token.content_id.to_string().cyan(),
                    count
                );
                self.session.rebind(token);
                self.print_line(&line)?;
            }
            Err(e) => {
                // The old video is no longer current either way.
                self.session.reset();
                self.warn(&format!("{e}. Note taking is paused until /open succeeds."))?;
            }
        }
        Ok(())
    }

    fn print_line(&self, line: &str) -> Result<()> {
        let mut stdout = io::stdout();
        queue!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine)
        )?;
        write!(stdout, "{}\r\n", line.replace('\n', "\r\n    "))?;
        stdout.flush()?;
        Ok(())
    }

    fn warn(&self, message: &str) -> Result<()> {
        self.print_line(&message.red().to_string())
    }

    fn redraw(&self) -> Result<()> {
        let marker = match self.session.state() {
            CaptureState::Idle => "       ".to_string(),
            CaptureState::Capturing { start_time: None } => "[--:--]".dimmed().to_string(),
            CaptureState::Capturing {
                start_time: Some(time),
            } => format!("[{}]", format_time(time)).yellow().to_string(),
        };

        let mut stdout = io::stdout();
        queue!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine)
        )?;
        write!(stdout, "{marker} > {}", self.input.replace('\n', " \u{21b5} "))?;
        stdout.flush()?;
        Ok(())
    }
}

/// What a key press did to the input line.
#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Edited,
    Submit,
    Quit,
    Ignored,
}

/// Applies one key press to `input`.
///
/// Enter submits. Ctrl+Enter, Alt+Enter and Ctrl+J insert a line break,
/// since terminals differ in which of them they report.
fn apply_key(input: &mut String, key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => KeyAction::Quit,
        KeyCode::Char('u') if ctrl => {
            input.clear();
            KeyAction::Edited
        }
        KeyCode::Char('j') if ctrl => {
            input.push('\n');
            KeyAction::Edited
        }
        KeyCode::Char(c) if !ctrl => {
            input.push(c);
            KeyAction::Edited
        }
        KeyCode::Backspace => {
            input.pop();
            KeyAction::Edited
        }
        KeyCode::Enter if ctrl || alt => {
            input.push('\n');
            KeyAction::Edited
        }
        KeyCode::Enter => KeyAction::Submit,
        _ => KeyAction::Ignored,
    }
}

/// Reads key presses on a blocking thread until `stop` is set.
fn spawn_key_reader(tx: mpsc::UnboundedSender<KeyEvent>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Failed to poll terminal: {}", e);
                    break;
                }
            }
        }
    })
}

/// Keeps the terminal in raw mode while alive.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
