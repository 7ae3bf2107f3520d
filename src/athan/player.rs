use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, warn};
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::mpsc;

use crate::error::AppResult;

/// Audio source after the fallback chain ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    File(PathBuf),
    FallbackTone,
}

/// Custom sound if the file exists, else the bundled default, else the
/// synthesized tone. A configured file that vanished from disk is a
/// silent fallback, never an error.
pub fn resolve_source(custom: Option<&str>, default_sound: Option<&Path>) -> ResolvedSource {
    if let Some(path) = custom {
        let path = Path::new(path);
        if path.exists() {
            return ResolvedSource::File(path.to_path_buf());
        }
        warn!("Custom athan sound missing: {:?}; falling back", path);
    }
    if let Some(path) = default_sound {
        if path.exists() {
            return ResolvedSource::File(path.to_path_buf());
        }
    }
    ResolvedSource::FallbackTone
}

/// Emitted once by the playback thread when it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Ended,
    Failed(String),
}

/// Stops the playback thread. Dropping the handle stops it as well.
pub struct PlayerHandle {
    stop_tx: Option<std_mpsc::Sender<()>>,
}

impl PlayerHandle {
    pub fn new(stop_tx: std_mpsc::Sender<()>) -> Self {
        Self {
            stop_tx: Some(stop_tx),
        }
    }

    pub fn noop() -> Self {
        Self { stop_tx: None }
    }

    pub fn stop(&self) {
        if let Some(tx) = &self.stop_tx {
            let _ = tx.send(());
        }
    }
}

pub trait AthanPlayer: Send + Sync {
    /// Starts looping playback and returns immediately. Failures after
    /// start arrive on the event channel.
    fn play_looping(
        &self,
        source: &ResolvedSource,
        volume: f32,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> AppResult<PlayerHandle>;
}

pub struct RodioAthanPlayer {
    disabled: bool,
}

impl RodioAthanPlayer {
    pub fn new() -> Self {
        Self { disabled: false }
    }

    /// Create a dummy player that never opens the audio device
    /// Used when audio system initialization fails and in tests
    pub fn new_dummy() -> Self {
        warn!("Using dummy athan player - audio output will be disabled");
        Self { disabled: true }
    }

    fn run_blocking(
        source: ResolvedSource,
        volume: f32,
        stop_rx: std_mpsc::Receiver<()>,
    ) -> Result<()> {
        // Create output stream on each call (OutputStream is not Send + Sync)
        let (_stream, stream_handle) =
            OutputStream::try_default().context("Failed to open default audio output")?;
        let sink = Sink::try_new(&stream_handle).context("Failed to create audio sink")?;

        match &source {
            ResolvedSource::File(path) => {
                debug!("Playing athan from {:?}", path);
                let file = File::open(path).context("Failed to open athan sound file")?;
                let reader = BufReader::new(file);
                let decoded =
                    Decoder::new(reader).context("Failed to decode athan sound file")?;
                sink.append(
                    decoded
                        .convert_samples::<f32>()
                        .amplify(volume)
                        .repeat_infinite(),
                );
            }
            ResolvedSource::FallbackTone => {
                warn!("Playing fallback tone (no athan sound file found)");
                let tone = rodio::source::SineWave::new(440.0) // A4 note
                    .take_duration(Duration::from_millis(500))
                    .amplify(volume * 0.3) // Lower volume for sine wave
                    .repeat_infinite();
                sink.append(tone);
            }
        }

        // A looping source never drains on its own; block here until a
        // stop arrives or the handle is dropped.
        let _ = stop_rx.recv();
        sink.stop();
        Ok(())
    }
}

impl AthanPlayer for RodioAthanPlayer {
    fn play_looping(
        &self,
        source: &ResolvedSource,
        volume: f32,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> AppResult<PlayerHandle> {
        let volume = volume.clamp(0.0, 1.0);
        let (stop_tx, stop_rx) = std_mpsc::channel();

        if self.disabled {
            tokio::task::spawn_blocking(move || {
                let _ = stop_rx.recv();
                let _ = events.send(PlayerEvent::Ended);
            });
            return Ok(PlayerHandle::new(stop_tx));
        }

        let source = source.clone();
        tokio::task::spawn_blocking(move || {
            match Self::run_blocking(source, volume, stop_rx) {
                Ok(()) => {
                    let _ = events.send(PlayerEvent::Ended);
                }
                Err(e) => {
                    error!("Athan playback failed: {}", e);
                    let _ = events.send(PlayerEvent::Failed(e.to_string()));
                }
            }
        });

        Ok(PlayerHandle::new(stop_tx))
    }
}
