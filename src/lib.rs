//! Types text into whichever window has keyboard focus, one synthetic
//! keystroke at a time, with a configurable human-like cadence.
//!
//! The library holds the typing core; the binary wraps it in a small shell
//! (tray menu, completion sound, window minimize/restore).

pub mod config;
pub mod encoder;
pub mod error;
pub mod hotkey;
pub mod injector;
pub mod pacing;
pub mod progress;
pub mod session;
pub mod signals;

pub use error::TypingError;
pub use session::{SessionConfig, SessionEvent, SessionHandle, TypingSession, start_session};
