//! Configuration loading from .env file

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::encoder::NewlinePolicy;
use crate::hotkey::{StopKey, StopStrategy};
use crate::injector::BackendKind;
use crate::pacing::PacingMode;
use crate::session::{SETTLE_INTERVAL, SessionConfig};

/// Whether the tray icon can run on this platform
const TRAY_SUPPORTED: bool = cfg!(windows);

/// Application configuration loaded from .env
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Config {
    pub text_file: PathBuf,
    pub countdown_secs: u32,
    pub base_delay_ms: u64,
    pub pacing_mode: PacingMode,
    pub repeat_count: u32,
    pub chat_safe_newlines: bool,
    pub text: TextOptions,
    pub auto_minimize: bool,
    pub restore_window: bool,
    pub notify_on_complete: bool,
    pub completion_sound: PathBuf,
    pub stop_key: StopKey,
    pub stop_key_strategy: StopStrategy,
    pub input_backend: BackendKind,
    pub show_tray: bool,
    pub log_to_file: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from .env file
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().context(
            "Missing .env file. Copy .env.example to .env and fill in the required values",
        )?;

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let randomness_percent: u8 = parse(&get("RANDOMNESS_PERCENT", "40"), "RANDOMNESS_PERCENT")?;
        anyhow::ensure!(
            randomness_percent <= 100,
            "Invalid RANDOMNESS_PERCENT: {randomness_percent} (expected 0-100)"
        );
        let randomness = f64::from(randomness_percent) / 100.0;

        let mode = get("PACING_MODE", "constant");
        let pacing_mode = PacingMode::parse(&mode, randomness)
            .with_context(|| format!("Invalid PACING_MODE: {mode} (expected constant, human or burst)"))?;

        let stop_key_strategy = match lookup("STOP_KEY_STRATEGY") {
            Some(name) => StopStrategy::parse(&name).with_context(|| {
                format!("Invalid STOP_KEY_STRATEGY: {name} (expected poll, latch or off)")
            })?,
            None => StopStrategy::platform_default(),
        };
        anyhow::ensure!(
            stop_key_strategy.is_supported(),
            "STOP_KEY_STRATEGY={stop_key_strategy:?} is not available on this platform"
        );

        // The tray needs a pumped platform event loop, which only exists on Windows
        let show_tray: bool = parse(
            &get("SHOW_TRAY", if TRAY_SUPPORTED { "true" } else { "false" }),
            "SHOW_TRAY",
        )?;
        anyhow::ensure!(
            TRAY_SUPPORTED || !show_tray,
            "SHOW_TRAY=true is only available on Windows"
        );

        let input_backend = match lookup("INPUT_BACKEND") {
            Some(name) => BackendKind::parse(&name).with_context(|| {
                format!("Invalid INPUT_BACKEND: {name} (expected native, accessibility or dry-run)")
            })?,
            None => BackendKind::platform_default(),
        };

        Ok(Self {
            text_file: PathBuf::from(Self::get_env(&lookup, "TEXT_FILE")?),
            countdown_secs: parse(&get("COUNTDOWN_SECS", "5"), "COUNTDOWN_SECS")?,
            base_delay_ms: parse(&get("BASE_DELAY_MS", "30"), "BASE_DELAY_MS")?,
            pacing_mode,
            repeat_count: parse::<u32>(&get("REPEAT_COUNT", "1"), "REPEAT_COUNT")?.max(1),
            chat_safe_newlines: parse(&get("CHAT_SAFE_NEWLINES", "true"), "CHAT_SAFE_NEWLINES")?,
            text: TextOptions {
                trim_trailing_whitespace: parse(
                    &get("TRIM_TRAILING_WHITESPACE", "false"),
                    "TRIM_TRAILING_WHITESPACE",
                )?,
                skip_empty_lines: parse(&get("SKIP_EMPTY_LINES", "false"), "SKIP_EMPTY_LINES")?,
            },
            auto_minimize: parse(&get("AUTO_MINIMIZE", "true"), "AUTO_MINIMIZE")?,
            restore_window: parse(&get("RESTORE_WINDOW", "true"), "RESTORE_WINDOW")?,
            notify_on_complete: parse(&get("NOTIFY_ON_COMPLETE", "true"), "NOTIFY_ON_COMPLETE")?,
            completion_sound: PathBuf::from(get("COMPLETION_SOUND", "./assets/sounds/finish.mp3")),
            stop_key: StopKey::parse(&get("STOP_KEY", "F9")).context("Invalid STOP_KEY")?,
            stop_key_strategy,
            input_backend,
            show_tray,
            log_to_file: parse(&get("LOG_TO_FILE", "false"), "LOG_TO_FILE")?,
            log_level: get("LOG_LEVEL", "info"),
        })
    }

    /// Get a required variable with context
    fn get_env<F>(lookup: &F, key: &str) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(key).with_context(|| {
            format!("Missing or invalid environment variable: {key}. See .env.example for required configuration")
        })
    }

    /// Snapshot of the settings a typing session needs
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            countdown_secs: self.countdown_secs,
            base_delay: Duration::from_millis(self.base_delay_ms),
            pacing: self.pacing_mode,
            repeat: self.repeat_count,
            newline: if self.chat_safe_newlines {
                NewlinePolicy::ChatSafe
            } else {
                NewlinePolicy::Plain
            },
            auto_minimize: self.auto_minimize,
            restore_window: self.restore_window,
            notify_on_complete: self.notify_on_complete,
            settle_interval: SETTLE_INTERVAL,
        }
    }
}

/// Parse a value, naming the key on failure
fn parse<T: FromStr>(value: &str, key: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key}: {value}"))
}

/// Clean-up applied to the text before typing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    /// Strip trailing whitespace from every line
    pub trim_trailing_whitespace: bool,
    /// Drop empty and whitespace-only lines
    pub skip_empty_lines: bool,
}

impl TextOptions {
    /// Normalize line endings, drop trailing newlines, then apply the options
    pub fn prepare(&self, raw: &str) -> String {
        let normalized = raw.replace("\r\n", "\n");
        let text = normalized.trim_end_matches('\n');

        let lines = text
            .split('\n')
            .map(|line| {
                if self.trim_trailing_whitespace {
                    line.trim_end()
                } else {
                    line
                }
            })
            .filter(|line| !self.skip_empty_lines || !line.trim().is_empty());

        lines.collect::<Vec<_>>().join("\n")
    }
}
