//! Completion sound

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Plays a sound file when a session finishes
pub struct FeedbackPlayer {
    /// Whether sound feedback is enabled
    enabled: bool,
    /// Sound to play on completion
    sound: PathBuf,
}

impl FeedbackPlayer {
    /// Create new feedback player
    pub const fn new(enabled: bool, sound: PathBuf) -> Self {
        Self { enabled, sound }
    }

    /// Play the completion sound, logging instead of failing
    pub fn notify(&self) {
        if !self.enabled {
            return;
        }
        if let Err(e) = Self::play(&self.sound) {
            error!("Failed to play completion sound: {:#}", e);
        }
    }

    /// Play sound file to the end
    fn play(path: &Path) -> Result<()> {
        let file = File::open(path).context("Failed to open sound file")?;
        let source = Decoder::new(BufReader::new(file)).context("Failed to decode sound file")?;

        let stream =
            OutputStreamBuilder::open_default_stream().context("Failed to get audio output")?;
        let sink = Sink::connect_new(stream.mixer());

        sink.append(source);
        sink.sleep_until_end();

        info!("Played sound: {}", path.display());

        Ok(())
    }
}
