use crate::services::audio_output::AudioOutput;
use crate::services::speech::{SpeechState, SpeechWorker};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing(PathBuf),
    Speaking,
}

/// The one audio output shared by sound playback and speech.
///
/// Every operation that touches the output holds `lock` for its whole
/// duration, so play, stop and speak never interleave.
pub struct OutputSlot {
    output: Arc<dyn AudioOutput>,
    speech: SpeechWorker,
    lock: Mutex<()>,
}

impl OutputSlot {
    pub fn new(output: Arc<dyn AudioOutput>, speech: SpeechWorker) -> Self {
        Self {
            output,
            speech,
            lock: Mutex::new(()),
        }
    }

    /// Take the slot without touching what is on it.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Take the slot and silence it: stop the sound, cut off speech.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        let guard = self.lock.lock().await;

        if self.output.is_busy() {
            debug!("Stopping current sound");
            self.output.stop();
        }
        if self.speech.state() == SpeechState::Speaking {
            debug!("Interrupting lingering utterance");
            self.speech.interrupt();
        }

        guard
    }

    pub fn output(&self) -> &Arc<dyn AudioOutput> {
        &self.output
    }

    pub fn speech(&self) -> &SpeechWorker {
        &self.speech
    }

    pub fn state(&self) -> PlaybackState {
        if let Some(path) = self.output.current() {
            PlaybackState::Playing(path)
        } else if self.speech.state() == SpeechState::Speaking {
            PlaybackState::Speaking
        } else {
            PlaybackState::Idle
        }
    }
}
