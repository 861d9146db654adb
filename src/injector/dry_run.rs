//! Injector that records actions instead of sending them

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::trace;

use super::InputInjector;
use crate::encoder::{IdentityLayout, KeyAction, VirtualKey};
use crate::error::TypingError;

/// Shared, timestamped record of injected actions.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    /// Recorded actions in injection order
    entries: Arc<Mutex<Vec<(Instant, KeyAction)>>>,
}

impl ActionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action
    fn push(&self, action: KeyAction) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((Instant::now(), action));
    }

    /// Copy of every recorded action with its timestamp
    pub fn entries(&self) -> Vec<(Instant, KeyAction)> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Copy of every recorded action
    pub fn actions(&self) -> Vec<KeyAction> {
        self.entries().into_iter().map(|(_, action)| action).collect()
    }

    /// Reconstruct the text an identity-layout session produced.
    ///
    /// Enter taps become `'\n'`; modifiers are ignored; surrogate pairs are joined.
    pub fn typed_text(&self) -> String {
        let units: Vec<u16> = self
            .actions()
            .into_iter()
            .filter_map(|action| match action {
                KeyAction::Tap(VirtualKey::ENTER) => Some(u16::from(b'\n')),
                KeyAction::Tap(vk) => Some(vk.0),
                KeyAction::RawUnicode {
                    code_unit,
                    key_up: false,
                } => Some(code_unit),
                _ => None,
            })
            .collect();
        String::from_utf16_lossy(&units)
    }
}

/// Records actions into an [`ActionLog`] and traces them.
#[derive(Debug, Clone, Default)]
pub struct DryRunInjector {
    /// Destination for recorded actions
    log: ActionLog,
}

impl DryRunInjector {
    /// Create an injector with its own log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an injector writing into a shared log
    pub const fn with_log(log: ActionLog) -> Self {
        Self { log }
    }

    /// The log this injector writes to
    pub fn log(&self) -> ActionLog {
        self.log.clone()
    }
}

impl InputInjector for DryRunInjector {
    type Layout = IdentityLayout;

    fn inject(&mut self, action: KeyAction) -> Result<(), TypingError> {
        trace!(?action, "dry run");
        self.log.push(action);
        Ok(())
    }

    fn layout(&self) -> IdentityLayout {
        IdentityLayout
    }
}
