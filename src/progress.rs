//! Progress snapshots, terminal reports and the arithmetic behind them

use std::fmt;
use std::time::Duration;

/// Share of the progress scale reserved for the countdown
pub const COUNTDOWN_SHARE: u8 = 5;

/// Characters per "word" for words-per-minute
const CHARS_PER_WORD: f64 = 5.0;

/// Live snapshot published after every character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// `5..=100`
    pub percent: u8,
    /// Characters attempted so far, across repeats
    pub chars_typed: usize,
    /// Characters across all repeats
    pub total_chars: usize,
    /// Zero-based repeat currently running
    pub repeat_index: u32,
    /// Number of repeats in the session
    pub repeat_count: u32,
    /// Time since typing began (countdown excluded)
    pub elapsed: Duration,
    /// Extrapolated time left
    pub estimated_remaining: Duration,
}

impl Progress {
    /// Typing speed so far, in words per minute
    pub fn wpm(&self) -> f64 {
        words_per_minute(self.chars_typed, self.elapsed)
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every character of every repeat was typed
    Completed,
    /// Stopped by the user or the stop key
    Cancelled,
    /// Aborted by an injection error
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        })
    }
}

/// Terminal summary, delivered exactly once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// How the session ended
    pub outcome: Outcome,
    /// Characters attempted before the session ended
    pub chars_typed: usize,
    /// Typing time (zero when the countdown never finished)
    pub elapsed: Duration,
    /// Human-readable explanation for anything but a clean completion
    pub detail: Option<String>,
}

impl Report {
    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        match self.outcome {
            Outcome::Completed => format!(
                "Done! {} characters typed in {}.",
                self.chars_typed,
                format_duration(self.elapsed)
            ),
            Outcome::Cancelled | Outcome::Failed => match &self.detail {
                Some(detail) => format!("{detail} ({} characters typed)", self.chars_typed),
                None => format!("{} after {} characters", self.outcome, self.chars_typed),
            },
        }
    }
}

/// Percent for a countdown tick with `remaining` seconds left.
pub fn countdown_percent(countdown: u32, remaining: u32) -> u8 {
    if countdown == 0 {
        return 0;
    }
    let done = u64::from(countdown.saturating_sub(remaining));
    u8::try_from(done * u64::from(COUNTDOWN_SHARE) / u64::from(countdown)).unwrap_or(COUNTDOWN_SHARE)
}

/// Percent after `typed` of `total` characters: 5% for the countdown, then linear.
pub fn typing_percent(typed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let span = usize::from(100 - COUNTDOWN_SHARE);
    let scaled = typed.min(total) * span / total;
    COUNTDOWN_SHARE + u8::try_from(scaled).unwrap_or(100 - COUNTDOWN_SHARE)
}

/// Remaining time extrapolated from the average time per character so far.
pub fn estimate_remaining(elapsed: Duration, typed: usize, total: usize) -> Duration {
    if typed == 0 || typed >= total {
        return Duration::ZERO;
    }
    let (Ok(typed), Ok(left)) = (u32::try_from(typed), u32::try_from(total - typed)) else {
        return Duration::ZERO;
    };
    (elapsed / typed).saturating_mul(left)
}

/// Words per minute at five characters per word.
pub fn words_per_minute(chars: usize, elapsed: Duration) -> f64 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }
    let chars = u32::try_from(chars).map_or(f64::from(u32::MAX), f64::from);
    chars / CHARS_PER_WORD / minutes
}

/// Up-front duration estimate shown before a session starts.
pub fn estimate_session(chars: usize, base_delay: Duration, repeat: u32, countdown_secs: u32) -> Duration {
    let chars = u32::try_from(chars).unwrap_or(u32::MAX);
    base_delay
        .saturating_mul(chars)
        .saturating_mul(repeat)
        .saturating_add(Duration::from_secs(u64::from(countdown_secs)))
}

/// `"42s"`, `"3m 7s"` or `"1h 12m"`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        return format!("{secs}s");
    }
    let (minutes, secs) = (secs / 60, secs % 60);
    if minutes < 60 {
        return format!("{minutes}m {secs}s");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}
