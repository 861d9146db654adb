//! Typing session controller
//!
//! A session runs on its own worker thread: optional window minimize,
//! countdown, then one pass over the text per repeat. The caller steers it
//! through [`SessionHandle`] (pause, resume, cancel) and observes it through
//! [`SessionEvent`]s. The worker never waits on the caller.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::encoder::{CharacterEncoder, KeyAction, NewlinePolicy, VirtualKey};
use crate::error::TypingError;
use crate::hotkey::{HotkeyMonitor, NoHotkey};
use crate::injector::InputInjector;
use crate::pacing::{Pacer, PacingMode};
use crate::progress::{
    Outcome, Progress, Report, countdown_percent, estimate_remaining, typing_percent,
};
use crate::signals::Signals;

/// Length of one countdown tick
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Default pause between repeats
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(1);

/// Settings captured when a session starts. Never changes while it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Seconds to wait before typing
    pub countdown_secs: u32,
    /// Base delay between characters
    pub base_delay: Duration,
    /// Timing model
    pub pacing: PacingMode,
    /// Times to type the text, at least 1
    pub repeat: u32,
    /// Newline handling
    pub newline: NewlinePolicy,
    /// Ask the shell to minimize its window before the countdown
    pub auto_minimize: bool,
    /// Ask the shell to restore its window when the session ends
    pub restore_window: bool,
    /// Ask the shell to notify the user on completion
    pub notify_on_complete: bool,
    /// Pause between repeats
    pub settle_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5,
            base_delay: Duration::from_millis(30),
            pacing: PacingMode::Constant,
            repeat: 1,
            newline: NewlinePolicy::ChatSafe,
            auto_minimize: false,
            restore_window: false,
            notify_on_complete: false,
            settle_interval: SETTLE_INTERVAL,
        }
    }
}

/// Mutable counters owned by the worker.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Characters attempted, skipped ones included
    pub chars_typed: usize,
    /// Characters across all repeats
    pub total_chars: usize,
    /// When the countdown finished
    pub started_at: Option<Instant>,
    /// Zero-based repeat in progress
    pub repeat_index: u32,
}

impl SessionState {
    /// Time since typing began
    pub fn elapsed(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |start| start.elapsed())
    }
}

/// Notifications from the worker, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// One countdown tick
    Countdown {
        /// Seconds left before typing starts
        remaining: u32,
        /// Progress within the countdown share
        percent: u8,
    },
    /// A new pass over the text began
    RepeatStarted {
        /// Zero-based repeat
        index: u32,
        /// Total repeats
        count: u32,
    },
    /// A character was processed
    Progress(Progress),
    /// The worker is holding on a pause request
    Paused,
    /// The worker left the pause
    Resumed,
    /// Terminal report; always the last event
    Finished(Report),
}

/// Window and notification requests the session makes of its host.
///
/// All calls are fire-and-forget and must not fail the session.
pub trait SessionShell {
    /// Get the host window out of the way
    fn minimize(&self) {}
    /// Bring the host window back
    fn restore(&self) {}
    /// Tell the user the text was fully typed
    fn notify_complete(&self) {}
}

/// Shell that ignores every request
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShell;

impl SessionShell for NoShell {}

/// Caller's side of a running session.
pub struct SessionHandle {
    /// Shared control flags
    signals: Arc<Signals>,
    /// Events from the worker
    events: Receiver<SessionEvent>,
    /// Worker thread
    worker: JoinHandle<Report>,
}

impl SessionHandle {
    /// Hold before the next character
    pub fn request_pause(&self) {
        self.signals.request_pause();
    }

    /// Continue after a pause
    pub fn request_resume(&self) {
        self.signals.request_resume();
    }

    /// Stop at the next character boundary, releasing a pause if needed
    pub fn request_cancel(&self) {
        self.signals.request_cancel();
    }

    /// Whether a stop has been requested, by the host or the stop key
    pub fn is_cancel_requested(&self) -> bool {
        self.signals.is_cancel_requested()
    }

    /// Whether a pause is in effect
    pub fn is_paused(&self) -> bool {
        self.signals.is_pause_requested()
    }

    /// Whether the worker has exited
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Next pending event, if any
    pub fn try_event(&self) -> Option<SessionEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Blocking event stream, ending after [`SessionEvent::Finished`]
    pub const fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }

    /// Wait for the worker and return its report
    pub fn wait(self) -> Report {
        self.worker.join().unwrap_or_else(|_| {
            error!("Typing worker panicked");
            Report {
                outcome: Outcome::Failed,
                chars_typed: 0,
                elapsed: Duration::ZERO,
                detail: Some("typing worker panicked".into()),
            }
        })
    }
}

/// A configured session waiting to be started. Each start consumes it.
pub struct TypingSession<H = NoHotkey, S = NoShell> {
    /// Text to type
    text: String,
    /// Settings snapshot
    config: SessionConfig,
    /// Emergency-stop key
    monitor: H,
    /// Host window hooks
    shell: S,
}

impl TypingSession {
    /// Session over `text` with no stop key and no shell hooks
    pub fn new<T: Into<String>>(text: T, config: SessionConfig) -> Self {
        Self {
            text: text.into(),
            config,
            monitor: NoHotkey,
            shell: NoShell,
        }
    }
}

impl<H, S> TypingSession<H, S> {
    /// Use `monitor` as the emergency stop
    pub fn with_monitor<M: HotkeyMonitor>(self, monitor: M) -> TypingSession<M, S> {
        TypingSession {
            text: self.text,
            config: self.config,
            monitor,
            shell: self.shell,
        }
    }

    /// Send window and notification requests to `shell`
    pub fn with_shell<W: SessionShell>(self, shell: W) -> TypingSession<H, W> {
        TypingSession {
            text: self.text,
            config: self.config,
            monitor: self.monitor,
            shell,
        }
    }
}

impl<H, S> TypingSession<H, S>
where
    H: HotkeyMonitor + Send + 'static,
    S: SessionShell + Send + 'static,
{
    /// Spawn the worker. `open` builds the injector on the worker thread.
    pub fn start<I, F>(self, open: F) -> SessionHandle
    where
        I: InputInjector,
        F: FnOnce() -> Result<I, TypingError> + Send + 'static,
    {
        let signals = Arc::new(Signals::new());
        let (tx, events) = mpsc::channel();
        let worker_signals = Arc::clone(&signals);

        let worker = thread::spawn(move || self.run(worker_signals, &tx, open));

        SessionHandle {
            signals,
            events,
            worker,
        }
    }

    /// Worker body, from start request to terminal report
    fn run<I, F>(self, signals: Arc<Signals>, events: &Sender<SessionEvent>, open: F) -> Report
    where
        I: InputInjector,
        F: FnOnce() -> Result<I, TypingError>,
    {
        let chars: Arc<[char]> = self.text.chars().collect();
        let repeat = self.config.repeat.max(1);
        let total_chars = chars.len() * usize::try_from(repeat).unwrap_or(usize::MAX);

        if total_chars == 0 {
            info!("Nothing to type");
            return finish(
                events,
                Report {
                    outcome: Outcome::Completed,
                    chars_typed: 0,
                    elapsed: Duration::ZERO,
                    detail: None,
                },
            );
        }

        let injector = match open() {
            Ok(injector) => injector,
            Err(err) => {
                error!("Could not open input backend: {err}");
                return finish(
                    events,
                    Report {
                        outcome: Outcome::Failed,
                        chars_typed: 0,
                        elapsed: Duration::ZERO,
                        detail: Some(err.to_string()),
                    },
                );
            }
        };

        let encoder = CharacterEncoder::new(
            injector.layout(),
            self.config.newline,
            injector.supports_raw_unicode(),
        );
        let pacer = Pacer::new(self.config.pacing, self.config.base_delay);
        let mut worker = Worker {
            chars,
            repeat,
            config: self.config,
            signals,
            events,
            monitor: self.monitor,
            injector,
            encoder,
            pacer,
            state: SessionState {
                total_chars,
                ..SessionState::default()
            },
        };

        if worker.config.auto_minimize {
            self.shell.minimize();
        }

        let result = worker.countdown().and_then(|()| worker.type_all());
        let report = finish(events, worker.report(result));

        // Host hooks run after the report is out so a slow shell cannot hold it back.
        if worker.config.restore_window {
            self.shell.restore();
        }
        if report.outcome == Outcome::Completed && worker.config.notify_on_complete {
            self.shell.notify_complete();
        }
        report
    }
}

/// Publish the terminal report. Called exactly once per run.
fn finish(events: &Sender<SessionEvent>, report: Report) -> Report {
    let _ = events.send(SessionEvent::Finished(report.clone()));
    report
}

/// Why the loop ended early
enum Stop {
    /// Cancellation observed; carries the detail for the report
    Cancelled(String),
    /// Injection failed
    Failed(TypingError),
}

/// State owned by the worker thread for one run
struct Worker<'a, I: InputInjector, H> {
    /// Text as characters
    chars: Arc<[char]>,
    /// Effective repeat count
    repeat: u32,
    /// Settings snapshot
    config: SessionConfig,
    /// Control flags
    signals: Arc<Signals>,
    /// Event sink
    events: &'a Sender<SessionEvent>,
    /// Emergency stop
    monitor: H,
    /// Input backend
    injector: I,
    /// Character encoder for the backend's layout
    encoder: CharacterEncoder<I::Layout>,
    /// Delay model, fresh for this run
    pacer: Pacer,
    /// Counters
    state: SessionState,
}

impl<I: InputInjector, H: HotkeyMonitor> Worker<'_, I, H> {
    /// Publish an event; a caller that stopped listening is not an error
    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Tick down once per second, honouring cancellation on every tick
    fn countdown(&mut self) -> Result<(), Stop> {
        let countdown = self.config.countdown_secs;
        if countdown > 0 {
            info!("Countdown: {}s", countdown);
        }
        for remaining in (1..=countdown).rev() {
            if self.signals.is_cancel_requested() {
                return Err(Stop::Cancelled("Cancelled during countdown".into()));
            }
            self.emit(SessionEvent::Countdown {
                remaining,
                percent: countdown_percent(countdown, remaining),
            });
            self.signals.sleep(COUNTDOWN_TICK);
        }
        Ok(())
    }

    /// Every repeat of the text, with a settling pause in between
    fn type_all(&mut self) -> Result<(), Stop> {
        self.state.started_at = Some(Instant::now());
        let chars = Arc::clone(&self.chars);

        for index in 0..self.repeat {
            self.state.repeat_index = index;
            if self.repeat > 1 {
                info!("Repeat {}/{}", index + 1, self.repeat);
            }
            self.emit(SessionEvent::RepeatStarted {
                index,
                count: self.repeat,
            });

            for &ch in chars.iter() {
                self.step(ch)?;
            }

            if index + 1 < self.repeat {
                debug!("Waiting {:?} before next repeat", self.config.settle_interval);
                self.signals.sleep(self.config.settle_interval);
            }
        }
        Ok(())
    }

    /// One character: check signals, inject, count, publish, pace
    fn step(&mut self, ch: char) -> Result<(), Stop> {
        let typed = self.state.chars_typed;
        if self.signals.is_cancel_requested() {
            return Err(Stop::Cancelled(format!("Stopped after {typed} chars")));
        }
        if self.monitor.is_stop_requested() {
            self.signals.request_cancel();
            info!("Stop key pressed");
            return Err(Stop::Cancelled(format!("Stopped by stop key after {typed} chars")));
        }
        if self.signals.is_pause_requested() {
            info!("Paused");
            self.emit(SessionEvent::Paused);
            if !self.signals.wait_while_paused() {
                return Err(Stop::Cancelled("Stopped while paused".into()));
            }
            info!("Resumed");
            self.emit(SessionEvent::Resumed);
        }

        match self.encoder.encode(ch) {
            Ok(actions) => self.inject_character(&actions).map_err(Stop::Failed)?,
            Err(err) if err.is_fatal() => return Err(Stop::Failed(err)),
            Err(err) => warn!("{err}; skipping"),
        }

        self.state.chars_typed += 1;
        self.publish_progress();

        let delay = self.pacer.delay_after(ch);
        if !delay.is_zero() {
            self.signals.sleep(delay);
        }
        Ok(())
    }

    /// Inject a character's actions in order, releasing any held modifier on failure
    fn inject_character(&mut self, actions: &[KeyAction]) -> Result<(), TypingError> {
        let mut held: Vec<VirtualKey> = Vec::new();
        for &action in actions {
            if let Err(err) = self.injector.inject(action) {
                for &vk in held.iter().rev() {
                    if let Err(release_err) = self.injector.inject(KeyAction::ModifierUp(vk)) {
                        warn!("Could not release modifier {:#04X}: {release_err}", vk.0);
                    }
                }
                return Err(err);
            }
            match action {
                KeyAction::ModifierDown(vk) => held.push(vk),
                KeyAction::ModifierUp(vk) => held.retain(|&h| h != vk),
                KeyAction::Tap(_) | KeyAction::RawUnicode { .. } => {}
            }
        }
        Ok(())
    }

    /// Snapshot the counters for the caller
    fn publish_progress(&self) {
        let typed = self.state.chars_typed;
        let total = self.state.total_chars;
        let elapsed = self.state.elapsed();
        self.emit(SessionEvent::Progress(Progress {
            percent: typing_percent(typed, total),
            chars_typed: typed,
            total_chars: total,
            repeat_index: self.state.repeat_index,
            repeat_count: self.repeat,
            elapsed,
            estimated_remaining: estimate_remaining(elapsed, typed, total),
        }));
    }

    /// Turn the loop result into the terminal report
    fn report(&self, result: Result<(), Stop>) -> Report {
        let (outcome, detail) = match result {
            Ok(()) => (Outcome::Completed, None),
            Err(Stop::Cancelled(detail)) => {
                info!("{detail}");
                (Outcome::Cancelled, Some(detail))
            }
            Err(Stop::Failed(err)) => {
                error!(
                    "Typing failed after {} chars: {err}",
                    self.state.chars_typed
                );
                (Outcome::Failed, Some(err.to_string()))
            }
        };
        Report {
            outcome,
            chars_typed: self.state.chars_typed,
            elapsed: self.state.elapsed(),
            detail,
        }
    }
}

/// Start typing `text` with `config`, opening the injector on the worker thread.
pub fn start_session<I, F>(text: &str, config: SessionConfig, open: F) -> SessionHandle
where
    I: InputInjector,
    F: FnOnce() -> Result<I, TypingError> + Send + 'static,
{
    TypingSession::new(text, config).start(open)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;
    use crate::encoder::IdentityLayout;
    use crate::hotkey::StopLatch;
    use crate::injector::{ActionLog, DryRunInjector};

    fn quick(repeat: u32) -> SessionConfig {
        SessionConfig {
            countdown_secs: 0,
            base_delay: Duration::ZERO,
            repeat,
            newline: NewlinePolicy::Plain,
            settle_interval: Duration::from_millis(5),
            ..SessionConfig::default()
        }
    }

    fn dry_run(log: &ActionLog) -> impl FnOnce() -> Result<DryRunInjector, TypingError> + Send + 'static {
        let log = log.clone();
        move || Ok(DryRunInjector::with_log(log))
    }

    fn drain(handle: SessionHandle) -> (Vec<SessionEvent>, Report) {
        let events: Vec<SessionEvent> = handle.events().iter().collect();
        (events, handle.wait())
    }

    /// Injector that fails on a chosen action
    struct FailingInjector {
        /// Actions that went through
        log: Arc<Mutex<Vec<KeyAction>>>,
        /// Fail when this many actions have been sent
        fail_at: usize,
        /// Error to return
        error: TypingError,
    }

    impl InputInjector for FailingInjector {
        type Layout = IdentityLayout;

        fn inject(&mut self, action: KeyAction) -> Result<(), TypingError> {
            let mut log = self.log.lock().unwrap();
            if log.len() == self.fail_at {
                self.fail_at = usize::MAX;
                return Err(self.error.clone());
            }
            log.push(action);
            Ok(())
        }

        fn layout(&self) -> IdentityLayout {
            IdentityLayout
        }
    }

    /// Records shell requests
    #[derive(Clone, Default)]
    struct RecordingShell(Arc<Mutex<Vec<&'static str>>>);

    impl SessionShell for RecordingShell {
        fn minimize(&self) {
            self.0.lock().unwrap().push("minimize");
        }
        fn restore(&self) {
            self.0.lock().unwrap().push("restore");
        }
        fn notify_complete(&self) {
            self.0.lock().unwrap().push("notify");
        }
    }

    #[test]
    fn empty_text_completes_without_opening_backend() {
        let handle = start_session("", quick(3), || -> Result<DryRunInjector, TypingError> {
            panic!("backend must not be opened")
        });
        let (events, report) = drain(handle);
        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.chars_typed, 0);
        assert_eq!(events, vec![SessionEvent::Finished(report)]);
    }

    #[test]
    fn progress_counts_increase_strictly() {
        let log = ActionLog::new();
        let (events, report) = drain(start_session("abc", quick(2), dry_run(&log)));
        let counts: Vec<usize> = events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Progress(p) => Some(p.chars_typed),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(report.chars_typed, 6);
        assert_eq!(log.typed_text(), "abcabc");
        assert_matches!(events.last(), Some(SessionEvent::Finished(_)));
    }

    #[test]
    fn final_progress_is_full() {
        let log = ActionLog::new();
        let (events, _) = drain(start_session("xy", quick(1), dry_run(&log)));
        let last = events.iter().rev().find_map(|event| match event {
            SessionEvent::Progress(p) => Some(*p),
            _ => None,
        });
        assert_matches!(last, Some(Progress { percent: 100, chars_typed: 2, total_chars: 2, .. }));
    }

    #[test]
    fn cancel_during_countdown_types_nothing() {
        let log = ActionLog::new();
        let config = SessionConfig {
            countdown_secs: 30,
            ..quick(1)
        };
        let handle = start_session("hello", config, dry_run(&log));
        handle.request_cancel();
        let report = handle.wait();
        assert_eq!(report.outcome, Outcome::Cancelled);
        assert_eq!(report.chars_typed, 0);
        assert!(log.actions().is_empty());
    }

    #[test]
    fn stop_key_cancels_and_sets_flag() {
        let log = ActionLog::new();
        let latch = StopLatch::new();
        latch.trigger();
        let handle = TypingSession::new("hello", quick(1))
            .with_monitor(latch.clone())
            .start(dry_run(&log));
        let report = handle.wait();
        assert_eq!(report.outcome, Outcome::Cancelled);
        assert_eq!(report.chars_typed, 0);
        assert!(report.detail.unwrap().contains("stop key"));
        assert!(!latch.is_stop_requested(), "press must be consumed once");
    }

    #[test]
    fn injection_failure_aborts_and_releases_modifiers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let config = SessionConfig {
            newline: NewlinePolicy::ChatSafe,
            ..quick(1)
        };
        // 'a' is one action, then the newline's Shift-down succeeds and Enter fails.
        let handle = start_session("a\nb", config, move || {
            Ok(FailingInjector {
                log: sink,
                fail_at: 2,
                error: TypingError::InjectionTransientFailure("queue full".into()),
            })
        });
        let report = handle.wait();
        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.chars_typed, 1);
        assert_eq!(report.detail.as_deref(), Some("input injection failed: queue full"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                KeyAction::Tap(VirtualKey(u16::from(b'a'))),
                KeyAction::ModifierDown(VirtualKey::SHIFT),
                KeyAction::ModifierUp(VirtualKey::SHIFT),
            ]
        );
    }

    #[test]
    fn backend_denial_fails_before_typing() {
        let handle = start_session("abc", quick(1), || -> Result<DryRunInjector, TypingError> {
            Err(TypingError::InjectionDenied("not trusted".into()))
        });
        let report = handle.wait();
        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.chars_typed, 0);
        assert!(report.detail.unwrap().contains("not trusted"));
    }

    #[test]
    fn shell_hooks_follow_outcome() {
        let shell = RecordingShell::default();
        let log = ActionLog::new();
        let config = SessionConfig {
            auto_minimize: true,
            restore_window: true,
            notify_on_complete: true,
            ..quick(1)
        };
        let report = TypingSession::new("ok", config.clone())
            .with_shell(shell.clone())
            .start(dry_run(&log))
            .wait();
        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(*shell.0.lock().unwrap(), vec!["minimize", "restore", "notify"]);

        let cancelled = RecordingShell::default();
        let latch = StopLatch::new();
        latch.trigger();
        TypingSession::new("ok", config)
            .with_monitor(latch)
            .with_shell(cancelled.clone())
            .start(dry_run(&log))
            .wait();
        assert_eq!(*cancelled.0.lock().unwrap(), vec!["minimize", "restore"]);
    }

    #[test]
    fn try_event_polls_without_blocking() {
        let log = ActionLog::new();
        let handle = start_session("abc", quick(1), dry_run(&log));
        let mut seen = Vec::new();
        while !matches!(seen.last(), Some(SessionEvent::Finished(_))) {
            match handle.try_event() {
                Some(event) => seen.push(event),
                None => std::thread::sleep(Duration::from_millis(1)),
            }
        }
        assert!(handle.try_event().is_none());
        assert_eq!(handle.wait().chars_typed, 3);
        assert_eq!(log.typed_text(), "abc");
    }

    /// Shell whose completion notification takes a while
    struct SlowShell(Duration);

    impl SessionShell for SlowShell {
        fn notify_complete(&self) {
            std::thread::sleep(self.0);
        }
    }

    #[test]
    fn slow_notification_does_not_delay_report() {
        let log = ActionLog::new();
        let config = SessionConfig {
            notify_on_complete: true,
            ..quick(1)
        };
        let started = Instant::now();
        let handle = TypingSession::new("done", config)
            .with_shell(SlowShell(Duration::from_millis(800)))
            .start(dry_run(&log));

        let finished = handle
            .events()
            .iter()
            .find_map(|event| match event {
                SessionEvent::Finished(report) => Some(report),
                _ => None,
            })
            .unwrap();
        assert_eq!(finished.outcome, Outcome::Completed);
        assert!(
            started.elapsed() < Duration::from_millis(400),
            "report waited on the shell: {:?}",
            started.elapsed()
        );
        assert_eq!(handle.wait(), finished);
    }

    #[test]
    fn stop_key_mid_session_keeps_typed_prefix() {
        let log = ActionLog::new();
        let latch = StopLatch::new();
        let config = SessionConfig {
            base_delay: Duration::from_millis(100),
            ..quick(1)
        };
        let handle = TypingSession::new("abcdef", config)
            .with_monitor(latch.clone())
            .start(dry_run(&log));

        let mut typed = 0;
        for event in handle.events() {
            if let SessionEvent::Progress(progress) = event {
                typed = progress.chars_typed;
                if typed == 2 {
                    latch.trigger();
                }
            }
        }
        assert!(handle.is_cancel_requested());
        let report = handle.wait();
        assert_eq!(typed, 2);
        assert_eq!(report.outcome, Outcome::Cancelled);
        assert_eq!(report.chars_typed, 2);
        assert_eq!(log.typed_text(), "ab");
    }

    #[test]
    fn countdown_ticks_precede_typing() {
        let log = ActionLog::new();
        let config = SessionConfig {
            countdown_secs: 2,
            ..quick(1)
        };
        let (events, report) = drain(start_session("go", config, dry_run(&log)));
        assert_eq!(report.outcome, Outcome::Completed);

        let countdown: Vec<(u32, u8)> = events
            .iter()
            .filter_map(|event| match *event {
                SessionEvent::Countdown { remaining, percent } => Some((remaining, percent)),
                _ => None,
            })
            .collect();
        assert_eq!(countdown, vec![(2, 0), (1, 2)]);

        let first_progress = events
            .iter()
            .position(|event| matches!(event, SessionEvent::Progress(_)))
            .unwrap();
        assert!(events[..first_progress].iter().all(|event| match *event {
            SessionEvent::Countdown { percent, .. } => percent < 5,
            _ => true,
        }));
        assert_matches!(events.get(2), Some(SessionEvent::RepeatStarted { index: 0, count: 1 }));
        assert_eq!(log.typed_text(), "go");
    }
}
