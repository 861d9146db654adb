//! Inter-character delay models

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shortest burst by default, in characters
pub const MIN_BURST: u32 = 3;
/// Longest burst by default, in characters
pub const MAX_BURST: u32 = 8;
/// Fraction of the base delay used between characters inside a burst
const BURST_FACTOR: f64 = 0.3;

/// Timing model selected for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacingMode {
    /// Fixed delay after every character
    Constant,
    /// Jittered delay with extra pauses after punctuation and whitespace
    HumanLike {
        /// Jitter as a fraction of the base delay, in `0.0..=1.0`
        randomness: f64,
    },
    /// Fast clusters of characters separated by longer pauses
    Burst {
        /// Fewest characters in a cluster
        min: u32,
        /// Most characters in a cluster
        max: u32,
    },
}

impl PacingMode {
    /// Parse a mode name from configuration, attaching `randomness` for human-like pacing.
    pub fn parse(s: &str, randomness: f64) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "constant" | "normal" => Some(Self::Constant),
            "human" | "humanlike" | "human-like" => Some(Self::HumanLike { randomness }),
            "burst" => Some(Self::burst()),
            _ => None,
        }
    }

    /// Burst pacing with the default cluster sizes
    pub const fn burst() -> Self {
        Self::Burst {
            min: MIN_BURST,
            max: MAX_BURST,
        }
    }

    /// Short name for logs
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::HumanLike { .. } => "human",
            Self::Burst { .. } => "burst",
        }
    }

    /// Cluster size range, ordered and at least one character
    fn burst_range(&self) -> (u32, u32) {
        match *self {
            Self::Burst { min, max } => (min.min(max).max(1), max.max(min).max(1)),
            Self::Constant | Self::HumanLike { .. } => (MIN_BURST, MAX_BURST),
        }
    }
}

/// Computes the delay after each character. One per session: the burst
/// counter must never leak from one run into the next.
#[derive(Debug, Clone)]
pub struct Pacer<R = StdRng> {
    /// Active model
    mode: PacingMode,
    /// Base delay in seconds
    base: f64,
    /// Random source
    rng: R,
    /// Characters emitted in the current burst
    burst_count: u32,
    /// Length of the current burst
    burst_size: u32,
}

impl Pacer<StdRng> {
    /// Create a pacer seeded from OS entropy
    pub fn new(mode: PacingMode, base: Duration) -> Self {
        Self::with_rng(mode, base, StdRng::from_entropy())
    }
}

impl<R: Rng> Pacer<R> {
    /// Create a pacer with an explicit random source
    pub fn with_rng(mode: PacingMode, base: Duration, mut rng: R) -> Self {
        let (min, max) = mode.burst_range();
        let burst_size = rng.gen_range(min..=max);
        Self {
            mode,
            base: base.as_secs_f64(),
            rng,
            burst_count: 0,
            burst_size,
        }
    }

    /// Delay to wait after typing `ch`
    pub fn delay_after(&mut self, ch: char) -> Duration {
        let secs = match self.mode {
            PacingMode::Constant => self.base,
            PacingMode::HumanLike { randomness } => self.human(ch, randomness),
            PacingMode::Burst { .. } => self.burst(),
        };
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Jittered base plus a punctuation-dependent pause
    fn human(&mut self, ch: char, randomness: f64) -> f64 {
        let base = self.base;
        let variance = base * randomness.clamp(0.0, 1.0);
        let mut delay = base + self.rng.gen_range(-variance..=variance);
        delay += match ch {
            '.' | '!' | '?' => base * self.rng.gen_range(2.0..=5.0),
            ',' | ';' | ':' => base * self.rng.gen_range(0.5..=2.0),
            '\n' => base * self.rng.gen_range(1.0..=3.0),
            ' ' => base * self.rng.gen_range(0.0..=0.5),
            _ => 0.0,
        };
        delay.max(0.0)
    }

    /// Short delays until the burst fills, then one long pause and a new burst length
    fn burst(&mut self) -> f64 {
        self.burst_count += 1;
        if self.burst_count >= self.burst_size {
            self.burst_count = 0;
            let (min, max) = self.mode.burst_range();
            self.burst_size = self.rng.gen_range(min..=max);
            return self.base * self.rng.gen_range(3.0..=7.0);
        }
        self.base * BURST_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(100);

    fn seeded(mode: PacingMode) -> Pacer {
        Pacer::with_rng(mode, BASE, StdRng::seed_from_u64(7))
    }

    #[test]
    fn constant_always_returns_base() {
        let mut pacer = seeded(PacingMode::Constant);
        for ch in "Hello, world.\n ?".chars().cycle().take(500) {
            assert_eq!(pacer.delay_after(ch), BASE);
        }
    }

    #[test]
    fn human_letters_stay_within_jitter() {
        let mut pacer = seeded(PacingMode::HumanLike { randomness: 0.4 });
        for _ in 0..1000 {
            let d = pacer.delay_after('a').as_secs_f64();
            assert!((0.06 - 1e-9..=0.14 + 1e-9).contains(&d), "{d}");
        }
    }

    #[test]
    fn human_sentence_end_pauses_longer() {
        let mut pacer = seeded(PacingMode::HumanLike { randomness: 0.0 });
        for _ in 0..200 {
            let d = pacer.delay_after('.').as_secs_f64();
            assert!((0.3 - 1e-9..=0.6 + 1e-9).contains(&d), "{d}");
            let d = pacer.delay_after(',').as_secs_f64();
            assert!((0.15 - 1e-9..=0.3 + 1e-9).contains(&d), "{d}");
            let d = pacer.delay_after('\n').as_secs_f64();
            assert!((0.2 - 1e-9..=0.4 + 1e-9).contains(&d), "{d}");
            let d = pacer.delay_after(' ').as_secs_f64();
            assert!((0.1 - 1e-9..=0.15 + 1e-9).contains(&d), "{d}");
        }
    }

    #[test]
    fn human_jitter_is_clamped_to_full_randomness() {
        let mut pacer = seeded(PacingMode::HumanLike { randomness: 1.0 });
        let base = BASE.as_secs_f64();
        for _ in 0..1000 {
            // Out-of-range randomness behaves like 1.0: within [0, 2 * base]
            let secs = pacer.human('x', 5.0);
            assert!((0.0..=base * 2.0 + 1e-9).contains(&secs), "{secs}");
        }
    }

    #[test]
    fn burst_range_comes_from_the_mode() {
        let mut pacer = seeded(PacingMode::Burst { min: 2, max: 2 });
        let long: Vec<bool> = (0..10)
            .map(|_| pacer.delay_after('a') > BASE)
            .collect();
        assert_eq!(long, [false, true].repeat(5));

        let mut reversed = seeded(PacingMode::Burst { min: 4, max: 1 });
        assert!((0..100).any(|_| reversed.delay_after('a') > BASE));
        assert_eq!(PacingMode::parse("burst", 0.0), Some(PacingMode::burst()));
    }

    #[test]
    fn burst_long_pauses_follow_burst_lengths() {
        let mut pacer = seeded(PacingMode::burst());
        let short = BASE.mul_f64(BURST_FACTOR);
        let delays: Vec<Duration> = (0..1000).map(|_| pacer.delay_after('a')).collect();

        let mut shorts_since_long = 0;
        let mut first_long = true;
        let mut longs = 0;
        for d in &delays {
            if *d == short {
                shorts_since_long += 1;
                continue;
            }
            assert!(*d >= BASE * 3 && *d <= BASE * 7, "{d:?}");
            if !first_long {
                assert!(shorts_since_long >= 2, "only {shorts_since_long} short delays between pauses");
            }
            first_long = false;
            shorts_since_long = 0;
            longs += 1;
        }

        let ratio = f64::from(longs) / 1000.0;
        let expected = 1.0 / (f64::from(MIN_BURST + MAX_BURST) / 2.0);
        assert!((ratio - expected).abs() < 0.04, "ratio {ratio}, expected ~{expected}");
    }

    #[test]
    fn fresh_pacers_do_not_share_burst_state() {
        let mut first = seeded(PacingMode::burst());
        let mut second = seeded(PacingMode::burst());
        first.delay_after('a');
        first.delay_after('a');
        assert_eq!(second.delay_after('a'), BASE.mul_f64(BURST_FACTOR));
    }

    #[test]
    fn parse_modes() {
        assert_eq!(PacingMode::parse("normal", 0.4), Some(PacingMode::Constant));
        assert_eq!(
            PacingMode::parse("Human", 0.25),
            Some(PacingMode::HumanLike { randomness: 0.25 })
        );
        assert_eq!(PacingMode::parse("burst", 0.0), Some(PacingMode::burst()));
        assert_eq!(PacingMode::parse("robotic", 0.0), None);
    }
}
