//! In-memory stand-ins for the audio device and speech engine.

use crate::services::audio_output::AudioOutput;
use crate::services::speech::SpeechBackend;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct FakeOutput {
    current: Mutex<Option<PathBuf>>,
    played: Mutex<Vec<PathBuf>>,
    stops: AtomicUsize,
}

impl FakeOutput {
    pub fn played(&self) -> Vec<PathBuf> {
        self.played.lock().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Pretend the current sound ran to its end.
    pub fn finish(&self) {
        *self.current.lock() = None;
    }
}

impl AudioOutput for FakeOutput {
    fn play(&self, path: &Path) -> Result<(), anyhow::Error> {
        *self.current.lock() = Some(path.to_path_buf());
        self.played.lock().push(path.to_path_buf());
        Ok(())
    }

    fn stop(&self) {
        if self.current.lock().take().is_some() {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_busy(&self) -> bool {
        self.current.lock().is_some()
    }

    fn current(&self) -> Option<PathBuf> {
        self.current.lock().clone()
    }
}

/// Speaks for a fixed number of polls.
#[derive(Clone)]
pub struct FakeSpeech {
    polls: usize,
    fail: bool,
    remaining: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl FakeSpeech {
    pub fn new(polls: usize) -> Self {
        Self {
            polls,
            fail: false,
            remaining: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0)
        }
    }

    pub fn factory(
        &self,
    ) -> impl FnOnce() -> Result<Box<dyn SpeechBackend>, anyhow::Error> + Send + 'static {
        let backend = self.clone();
        move || Ok(Box::new(backend) as Box<dyn SpeechBackend>)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechBackend for FakeSpeech {
    fn start(&mut self, text: &str) -> Result<(), anyhow::Error> {
        if self.fail {
            anyhow::bail!("engine unavailable");
        }
        self.spoken.lock().push(text.to_string());
        self.remaining.store(self.polls, Ordering::SeqCst);
        Ok(())
    }

    fn is_speaking(&mut self) -> Result<bool, anyhow::Error> {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(false);
        }
        self.remaining.store(left - 1, Ordering::SeqCst);
        Ok(true)
    }

    fn stop(&mut self) -> Result<(), anyhow::Error> {
        self.remaining.store(0, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
