//! Text-to-speech on a dedicated worker thread.
//!
//! The worker owns the engine, so engines that are not `Send` work too.
//! Callers get a completion signal once the utterance has finished playing.

use anyhow::Context;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::process::{Child, Command as Process, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechState {
    Idle,
    Speaking,
}

/// A speech engine driven by the worker thread.
pub trait SpeechBackend {
    /// Begin speaking `text` without waiting for it to finish.
    fn start(&mut self, text: &str) -> Result<(), anyhow::Error>;
    fn is_speaking(&mut self) -> Result<bool, anyhow::Error>;
    fn stop(&mut self) -> Result<(), anyhow::Error>;
}

/// Runs an external program (espeak and friends) with the text as its last
/// argument, after `--` so text starting with `-` is never read as an option.
pub struct EspeakBackend {
    program: String,
    child: Option<Child>,
}

impl EspeakBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
        }
    }
}

impl SpeechBackend for EspeakBackend {
    fn start(&mut self, text: &str) -> Result<(), anyhow::Error> {
        self.stop()?;
        let child = Process::new(&self.program)
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to run speech command '{}'", self.program))?;
        self.child = Some(child);
        Ok(())
    }

    fn is_speaking(&mut self) -> Result<bool, anyhow::Error> {
        let Some(child) = self.child.as_mut() else {
            return Ok(false);
        };
        match child.try_wait().context("Failed to poll speech command")? {
            Some(status) => {
                if !status.success() {
                    warn!("Speech command '{}' exited with {}", self.program, status);
                }
                self.child = None;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    fn stop(&mut self) -> Result<(), anyhow::Error> {
        if let Some(mut child) = self.child.take() {
            // Already exited is fine.
            let _ = child.kill();
            child.wait().context("Failed to reap speech command")?;
        }
        Ok(())
    }
}

/// Platform speech engine through the `tts` crate.
#[cfg(not(target_os = "linux"))]
pub struct TtsBackend {
    tts: tts::Tts,
}

#[cfg(not(target_os = "linux"))]
impl TtsBackend {
    pub fn new() -> Result<Self, anyhow::Error> {
        let mut tts = tts::Tts::default().context("Failed to initialize text-to-speech")?;
        let normal = tts.normal_rate();
        let _ = tts.set_rate(normal);
        Ok(Self { tts })
    }
}

#[cfg(not(target_os = "linux"))]
impl SpeechBackend for TtsBackend {
    fn start(&mut self, text: &str) -> Result<(), anyhow::Error> {
        self.tts.speak(text, true).context("Text-to-speech failed")?;
        Ok(())
    }

    fn is_speaking(&mut self) -> Result<bool, anyhow::Error> {
        self.tts
            .is_speaking()
            .context("Failed to query text-to-speech state")
    }

    fn stop(&mut self) -> Result<(), anyhow::Error> {
        self.tts.stop().context("Failed to stop text-to-speech")?;
        Ok(())
    }
}

/// The engine for this platform: `command` on Linux, the `tts` crate elsewhere.
#[cfg(target_os = "linux")]
pub fn platform_backend(command: String) -> Result<Box<dyn SpeechBackend>, anyhow::Error> {
    Ok(Box::new(EspeakBackend::new(command)))
}

#[cfg(not(target_os = "linux"))]
pub fn platform_backend(_command: String) -> Result<Box<dyn SpeechBackend>, anyhow::Error> {
    Ok(Box::new(TtsBackend::new()?))
}

enum Command {
    Say {
        text: String,
        done: oneshot::Sender<Result<(), anyhow::Error>>,
    },
    Interrupt,
}

/// Handle to the speech thread.
pub struct SpeechWorker {
    tx: Sender<Command>,
    state: Arc<Mutex<SpeechState>>,
}

impl SpeechWorker {
    /// Start the worker; `factory` builds the engine on the worker thread.
    pub fn spawn<F>(factory: F) -> Result<Self, anyhow::Error>
    where
        F: FnOnce() -> Result<Box<dyn SpeechBackend>, anyhow::Error> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let state = Arc::new(Mutex::new(SpeechState::Idle));
        let worker_state = state.clone();

        std::thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                let backend = match factory() {
                    Ok(backend) => {
                        let _ = ready_tx.send(Ok(()));
                        backend
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run(backend, rx, worker_state);
            })
            .context("Failed to spawn speech thread")?;

        ready_rx
            .recv()
            .context("Speech thread exited during startup")??;
        info!("Speech worker ready");

        Ok(Self { tx, state })
    }

    pub fn state(&self) -> SpeechState {
        *self.state.lock()
    }

    /// Speak `text` and wait until the engine is done with it.
    pub async fn say(&self, text: &str) -> Result<(), anyhow::Error> {
        let (done, finished) = oneshot::channel();
        self.tx
            .send(Command::Say {
                text: text.to_string(),
                done,
            })
            .map_err(|_| anyhow::anyhow!("Speech worker is not running"))?;

        finished
            .await
            .map_err(|_| anyhow::anyhow!("Speech worker dropped the request"))?
    }

    /// Cut off the current utterance, if any.
    pub fn interrupt(&self) {
        if self.tx.send(Command::Interrupt).is_err() {
            warn!("Speech worker is not running");
        }
    }
}

fn run(mut backend: Box<dyn SpeechBackend>, rx: Receiver<Command>, state: Arc<Mutex<SpeechState>>) {
    let mut pending = VecDeque::new();

    loop {
        let command = match pending.pop_front() {
            Some(command) => command,
            None => match rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            Command::Interrupt => {
                if let Err(e) = backend.stop() {
                    warn!("Failed to stop speech: {:#}", e);
                }
            }
            Command::Say { text, done } => {
                *state.lock() = SpeechState::Speaking;
                let result = utter(backend.as_mut(), &rx, &mut pending, &text);
                *state.lock() = SpeechState::Idle;
                // The caller may have gone away; the utterance still counts.
                let _ = done.send(result);
            }
        }
    }

    let _ = backend.stop();
    debug!("Speech worker stopped");
}

fn utter(
    backend: &mut dyn SpeechBackend,
    rx: &Receiver<Command>,
    pending: &mut VecDeque<Command>,
    text: &str,
) -> Result<(), anyhow::Error> {
    debug!("Speaking {} chars", text.len());
    backend.start(text)?;

    loop {
        match rx.try_recv() {
            Ok(Command::Interrupt) => {
                backend.stop()?;
                info!("Utterance interrupted");
                return Ok(());
            }
            Ok(other) => pending.push_back(other),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                backend.stop()?;
                return Ok(());
            }
        }

        if !backend.is_speaking()? {
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
