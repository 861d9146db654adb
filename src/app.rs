//! Application state and main event loop.
//!
//! Loads the text, starts one typing session and relays tray commands and
//! session events until the session reports its outcome.

use std::io::Read;
use std::path::Path;
use std::sync::mpsc::TryRecvError;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, trace, warn};

#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
};

use autotyper::config::Config;
use autotyper::encoder::NewlinePolicy;
use autotyper::hotkey::{HotkeyListener, StopMonitor, StopStrategy};
use autotyper::injector::PlatformInjector;
use autotyper::pacing::PacingMode;
use autotyper::progress::{Outcome, Report, estimate_session, format_duration};
use autotyper::session::{SessionEvent, SessionHandle, TypingSession};

use crate::feedback::FeedbackPlayer;
use crate::shell::DesktopShell;
use crate::tray::{TrayCommand, TrayManager, TrayState};

/// Interval between event loop iterations
const LOOP_INTERVAL: Duration = Duration::from_millis(10);

/// Holds all runtime components and drives the event loop.
pub struct App {
    /// Configuration snapshot
    config: Config,
    /// Prepared text to type
    text: String,
    /// System tray, when available
    tray: Option<TrayManager>,
    /// Global hotkey registration, kept alive for the latch strategy
    _hotkey: Option<HotkeyListener>,
    /// Stop key monitor handed to the session
    monitor: StopMonitor,
    /// Last percent reported, shown again after a resume
    last_percent: u8,
}

impl App {
    /// Initialize all components from the provided configuration.
    pub fn new(config: Config) -> Result<Self> {
        let raw = Self::read_text(&config.text_file)?;
        let text = config.text.prepare(&raw);

        let (hotkey, monitor) = match config.stop_key_strategy {
            #[cfg(windows)]
            StopStrategy::Poll => (
                None,
                StopMonitor::Poll(autotyper::hotkey::KeyStatePoller::new(config.stop_key.vk)),
            ),
            #[cfg(not(windows))]
            StopStrategy::Poll => anyhow::bail!("Stop key polling is only available on Windows"),
            StopStrategy::Latch => {
                let (listener, latch) = HotkeyListener::register(config.stop_key)
                    .context("Failed to register stop key")?;
                (Some(listener), StopMonitor::Latch(latch))
            }
            StopStrategy::Off => (None, StopMonitor::Disabled),
        };

        let tray = if config.show_tray {
            match TrayManager::new(config.stop_key.label) {
                Ok(tray) => Some(tray),
                Err(e) => {
                    warn!("Running without tray icon: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        if matches!(monitor, StopMonitor::Disabled) {
            warn!("Autotyper ready. No stop key: interrupt the process to stop typing.");
        } else {
            info!(
                "Autotyper ready. Press {} at any time to stop typing.",
                config.stop_key.label
            );
        }

        Ok(Self {
            config,
            text,
            tray,
            _hotkey: hotkey,
            monitor,
            last_percent: 0,
        })
    }

    /// Read the text from a file, or from stdin for `-`
    fn read_text(path: &Path) -> Result<String> {
        if path == Path::new("-") {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read text from stdin")?;
            return Ok(text);
        }
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read text file {}", path.display()))
    }

    /// Run one session until it reports its outcome.
    pub fn run(mut self) -> Result<()> {
        if self.text.trim().is_empty() {
            warn!("Start aborted: no text");
            return Ok(());
        }

        let session_config = self.config.session_config();
        let chars = self.text.chars().count();
        info!("Starting typing session");
        info!(
            "  Mode: {} | Delay: {}ms | Rand: {}% | Repeat: {}x",
            session_config.pacing.name(),
            self.config.base_delay_ms,
            match session_config.pacing {
                PacingMode::HumanLike { randomness } => (randomness * 100.0).round(),
                PacingMode::Constant | PacingMode::Burst { .. } => 0.0,
            },
            session_config.repeat
        );
        info!("  Text: {} chars", chars);
        info!(
            "  Newlines: {}",
            match session_config.newline {
                NewlinePolicy::ChatSafe => "Shift+Enter (chat-safe)",
                NewlinePolicy::Plain => "plain Enter",
            }
        );
        info!(
            "  Estimated time: {}",
            format_duration(estimate_session(
                chars,
                session_config.base_delay,
                session_config.repeat,
                session_config.countdown_secs,
            ))
        );

        let backend = self.config.input_backend;
        let shell = DesktopShell::new(FeedbackPlayer::new(
            self.config.notify_on_complete,
            self.config.completion_sound.clone(),
        ));
        let handle = TypingSession::new(std::mem::take(&mut self.text), session_config)
            .with_monitor(self.monitor.clone())
            .with_shell(shell)
            .start(move || PlatformInjector::open(backend));

        let report = self.drive(&handle)?;
        // The worker has already sent its report; joining only reaps the thread.
        let _ = handle.wait();

        match report.outcome {
            Outcome::Completed | Outcome::Cancelled => {
                info!("{}", report.summary());
                Ok(())
            }
            Outcome::Failed => anyhow::bail!("{}", report.summary()),
        }
    }

    /// Relay tray commands and session events until the session finishes.
    fn drive(&mut self, handle: &SessionHandle) -> Result<Report> {
        loop {
            Self::pump_messages();

            if let Some(command) = self.tray.as_ref().and_then(TrayManager::poll_command) {
                Self::apply(command, handle);
            }

            loop {
                match handle.events().try_recv() {
                    Ok(SessionEvent::Finished(report)) => {
                        self.show(TrayState::Finished)?;
                        return Ok(report);
                    }
                    Ok(event) => self.on_event(&event)?,
                    Err(TryRecvError::Empty) => break,
                    // The worker always reports before exiting, unless it panicked.
                    Err(TryRecvError::Disconnected) => {
                        anyhow::bail!("Typing worker exited unexpectedly")
                    }
                }
            }

            std::thread::sleep(LOOP_INTERVAL);
        }
    }

    /// Forward a tray command to the session
    fn apply(command: TrayCommand, handle: &SessionHandle) {
        match command {
            TrayCommand::TogglePause if handle.is_paused() => {
                handle.request_resume();
                info!("Resume requested");
            }
            TrayCommand::TogglePause => {
                handle.request_pause();
                info!("Pause requested");
            }
            TrayCommand::Stop => {
                handle.request_cancel();
                info!("Stop requested by user");
            }
            TrayCommand::Quit => {
                handle.request_cancel();
                info!("Quit requested");
            }
        }
    }

    /// Reflect a session event in the log and the tray
    fn on_event(&mut self, event: &SessionEvent) -> Result<()> {
        match *event {
            SessionEvent::Countdown { remaining, .. } => {
                info!("Starting in {}s -- focus the target!", remaining);
                self.show(TrayState::Countdown(remaining))
            }
            SessionEvent::RepeatStarted { .. } => Ok(()),
            SessionEvent::Progress(progress) => {
                trace!(
                    "{}% | {} / ~{} left | {:.0} WPM",
                    progress.percent,
                    format_duration(progress.elapsed),
                    format_duration(progress.estimated_remaining),
                    progress.wpm()
                );
                self.last_percent = progress.percent;
                self.show(TrayState::Typing(progress.percent))
            }
            SessionEvent::Paused => self.show(TrayState::Paused),
            SessionEvent::Resumed => self.show(TrayState::Typing(self.last_percent)),
            SessionEvent::Finished(_) => self.show(TrayState::Finished),
        }
    }

    /// Update the tray, if there is one
    fn show(&mut self, state: TrayState) -> Result<()> {
        match self.tray.as_mut() {
            Some(tray) => tray.set_state(state),
            None => Ok(()),
        }
    }

    /// Pump the Windows message queue so tray and hotkey events are delivered.
    fn pump_messages() {
        #[cfg(windows)]
        // SAFETY: MSG is a plain Windows struct; PeekMessageW, TranslateMessage,
        // and DispatchMessageW are standard message-loop calls with no invariants
        // beyond what the Windows API guarantees.
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}
