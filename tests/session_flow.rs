// End-to-end typing sessions against the dry-run backend.
// These drive the real worker thread, signals and pacing; only the OS
// injection call is replaced by an in-memory action log.

use std::time::Duration;

use assert_matches::assert_matches;

use autotyper::encoder::{KeyAction, NewlinePolicy, VirtualKey};
use autotyper::injector::{ActionLog, DryRunInjector};
use autotyper::pacing::PacingMode;
use autotyper::progress::{Outcome, Progress};
use autotyper::session::{SessionConfig, SessionEvent, start_session};

fn config(base_delay_ms: u64, repeat: u32) -> SessionConfig {
    SessionConfig {
        countdown_secs: 0,
        base_delay: Duration::from_millis(base_delay_ms),
        pacing: PacingMode::Constant,
        repeat,
        newline: NewlinePolicy::Plain,
        ..SessionConfig::default()
    }
}

fn progress_counts(events: &[SessionEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Progress(Progress { chars_typed, .. }) => Some(*chars_typed),
            _ => None,
        })
        .collect()
}

#[test]
fn short_greeting_types_in_order() {
    let log = ActionLog::new();
    let sink = log.clone();
    let handle = start_session("Hi!\n", config(10, 1), move || {
        Ok(DryRunInjector::with_log(sink))
    });
    let events: Vec<SessionEvent> = handle.events().iter().collect();
    let report = handle.wait();

    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.chars_typed, 4);
    assert!(report.detail.is_none());
    assert!(report.elapsed >= Duration::from_millis(40), "{:?}", report.elapsed);
    assert!(report.elapsed < Duration::from_millis(500), "{:?}", report.elapsed);

    assert_eq!(
        log.actions(),
        vec![
            KeyAction::Tap(VirtualKey(u16::from(b'H'))),
            KeyAction::Tap(VirtualKey(u16::from(b'i'))),
            KeyAction::Tap(VirtualKey(u16::from(b'!'))),
            KeyAction::Tap(VirtualKey::ENTER),
        ]
    );
    assert_eq!(progress_counts(&events), vec![1, 2, 3, 4]);
    assert_matches!(events.last(), Some(SessionEvent::Finished(r)) if *r == report);
}

#[test]
fn repeats_are_separated_by_settling_pause() {
    let settle = Duration::from_millis(150);
    let log = ActionLog::new();
    let sink = log.clone();
    let handle = start_session(
        "ab",
        SessionConfig {
            settle_interval: settle,
            ..config(0, 3)
        },
        move || Ok(DryRunInjector::with_log(sink)),
    );
    let events: Vec<SessionEvent> = handle.events().iter().collect();
    let report = handle.wait();

    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.chars_typed, 6);
    assert_eq!(log.typed_text(), "ababab");

    let repeats: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::RepeatStarted { index, count: 3 } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(repeats, vec![0, 1, 2]);

    let stamps: Vec<_> = log.entries().into_iter().map(|(at, _)| at).collect();
    let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(gaps[1] >= settle, "no pause after first repeat: {gaps:?}");
    assert!(gaps[3] >= settle, "no pause after second repeat: {gaps:?}");
    for i in [0, 2, 4] {
        assert!(gaps[i] < settle, "unexpected pause inside a repeat: {gaps:?}");
    }
    // Two settling pauses, not three.
    assert!(report.elapsed >= settle * 2, "{:?}", report.elapsed);
    assert!(report.elapsed < settle * 3, "{:?}", report.elapsed);
}

#[test]
fn pause_and_resume_neither_skips_nor_repeats() {
    let log = ActionLog::new();
    let sink = log.clone();
    let handle = start_session("abcdef", config(20, 1), move || {
        Ok(DryRunInjector::with_log(sink))
    });

    let mut events = Vec::new();
    for event in handle.events().iter() {
        let reached_two = matches!(event, SessionEvent::Progress(Progress { chars_typed: 2, .. }));
        events.push(event);
        if reached_two {
            break;
        }
    }
    handle.request_pause();
    for event in handle.events().iter() {
        let paused = event == SessionEvent::Paused;
        events.push(event);
        if paused {
            break;
        }
    }

    let typed_while_paused = log.actions().len();
    std::thread::sleep(Duration::from_millis(120));
    assert_eq!(log.actions().len(), typed_while_paused, "typed while paused");
    assert!(handle.is_paused());

    handle.request_resume();
    events.extend(handle.events().iter());
    let report = handle.wait();

    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(log.typed_text(), "abcdef");
    assert_eq!(progress_counts(&events), vec![1, 2, 3, 4, 5, 6]);
    assert!(events.contains(&SessionEvent::Resumed));
}

#[test]
fn cancel_before_first_character() {
    let log = ActionLog::new();
    let sink = log.clone();
    let handle = start_session(
        "never typed",
        SessionConfig {
            countdown_secs: 3,
            ..config(10, 1)
        },
        move || Ok(DryRunInjector::with_log(sink)),
    );
    handle.request_cancel();
    let report = handle.wait();

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(report.chars_typed, 0);
    assert!(log.actions().is_empty());
}

#[test]
fn cancel_while_paused_reports_progress_so_far() {
    let log = ActionLog::new();
    let sink = log.clone();
    let handle = start_session("abcdef", config(200, 1), move || {
        Ok(DryRunInjector::with_log(sink))
    });
    for event in handle.events().iter() {
        if matches!(event, SessionEvent::Progress(Progress { chars_typed: 3, .. })) {
            break;
        }
    }
    handle.request_pause();
    for event in handle.events().iter() {
        if event == SessionEvent::Paused {
            break;
        }
    }
    handle.request_cancel();
    let report = handle.wait();

    assert_eq!(report.outcome, Outcome::Cancelled);
    assert_eq!(report.chars_typed, 3);
    assert_eq!(log.typed_text(), "abc");
}

#[test]
fn unicode_text_reaches_the_backend_intact() {
    let text = "Grüße 👋\nдо свидания";
    let log = ActionLog::new();
    let sink = log.clone();
    let report = start_session(text, config(0, 1), move || {
        Ok(DryRunInjector::with_log(sink))
    })
    .wait();

    assert_eq!(report.outcome, Outcome::Completed);
    assert_eq!(report.chars_typed, text.chars().count());
    assert_eq!(log.typed_text(), text);
}
