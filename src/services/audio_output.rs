use anyhow::Context;
use parking_lot::Mutex;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{cpal, Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, warn};

/// The device side of the output slot: one sound at a time.
pub trait AudioOutput: Send + Sync {
    /// Start `path`, replacing whatever was loaded.
    fn play(&self, path: &Path) -> Result<(), anyhow::Error>;
    fn stop(&self);
    /// True while queued audio is still audible.
    fn is_busy(&self) -> bool;
    /// The file last started, while it is still busy.
    fn current(&self) -> Option<PathBuf>;
}

struct Loaded {
    sink: Sink,
    path: PathBuf,
}

pub struct RodioOutput {
    handle: OutputStreamHandle,
    loaded: Mutex<Option<Loaded>>,
}

impl RodioOutput {
    /// Open the default output device at `sample_rate` if it supports it.
    ///
    /// `OutputStream` is not `Send`, so it lives on its own thread for the rest
    /// of the process and only the handle comes back.
    pub fn open(sample_rate: u32) -> Result<Self, anyhow::Error> {
        let (tx, rx) = mpsc::sync_channel(1);

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match open_stream(sample_rate) {
                Ok((stream, handle)) => {
                    let _stream = stream;
                    if tx.send(Ok(handle)).is_err() {
                        return;
                    }
                    loop {
                        std::thread::park();
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                }
            })
            .context("Failed to spawn audio output thread")?;

        let handle = rx
            .recv()
            .context("Audio output thread exited before opening the device")??;

        Ok(Self {
            handle,
            loaded: Mutex::new(None),
        })
    }
}

fn open_stream(sample_rate: u32) -> Result<(OutputStream, OutputStreamHandle), anyhow::Error> {
    let device = cpal::default_host()
        .default_output_device()
        .context("No default audio output device")?;

    let config = device
        .supported_output_configs()
        .context("Failed to query output configs")?
        .find(|range| {
            range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
        })
        .map(|range| range.with_sample_rate(cpal::SampleRate(sample_rate)));

    let stream = match config {
        Some(config) => {
            info!("Opening audio output at {} Hz", sample_rate);
            OutputStream::try_from_device_config(&device, config)
        }
        None => {
            warn!(
                "Output device does not support {} Hz, using its default config",
                sample_rate
            );
            OutputStream::try_from_device(&device)
        }
    };

    stream.context("Failed to open audio output stream")
}

impl AudioOutput for RodioOutput {
    fn play(&self, path: &Path) -> Result<(), anyhow::Error> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open audio file {}", path.display()))?;
        let source = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        let sink = Sink::try_new(&self.handle).context("Failed to create audio sink")?;

        let mut loaded = self.loaded.lock();
        if let Some(previous) = loaded.take() {
            previous.sink.stop();
        }
        sink.append(source);
        debug!("Started {}", path.display());
        *loaded = Some(Loaded {
            sink,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn stop(&self) {
        if let Some(previous) = self.loaded.lock().take() {
            previous.sink.stop();
            debug!("Stopped {}", previous.path.display());
        }
    }

    fn is_busy(&self) -> bool {
        self.loaded
            .lock()
            .as_ref()
            .map_or(false, |loaded| !loaded.sink.empty())
    }

    fn current(&self) -> Option<PathBuf> {
        self.loaded
            .lock()
            .as_ref()
            .filter(|loaded| !loaded.sink.empty())
            .map(|loaded| loaded.path.clone())
    }
}
