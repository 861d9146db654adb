//! Keystroke injection backends
//!
//! One backend per platform family, selected once at startup. Only the
//! session worker thread ever calls into an injector.

mod accessibility;
mod dry_run;
#[cfg(windows)]
mod sendinput;

pub use accessibility::AccessibilityInjector;
pub use dry_run::{ActionLog, DryRunInjector};
#[cfg(windows)]
pub use sendinput::{SendInputInjector, SystemLayout};

use crate::encoder::{IdentityLayout, KeyAction, KeyLayout, ShiftState, VirtualKey};
use crate::error::TypingError;

/// Executes primitive key actions against the OS input subsystem.
pub trait InputInjector {
    /// Layout used to resolve characters into virtual keys for this backend.
    type Layout: KeyLayout;

    /// Replay one action. Must not block beyond the OS call itself.
    fn inject(&mut self, action: KeyAction) -> Result<(), TypingError>;

    /// The layout the encoder should use with this backend.
    fn layout(&self) -> Self::Layout;

    /// Whether [`KeyAction::RawUnicode`] is supported.
    fn supports_raw_unicode(&self) -> bool {
        true
    }
}

/// Which backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Native synthetic input (`SendInput` on Windows)
    Native,
    /// Accessibility / automation service via `enigo`
    Accessibility,
    /// Log actions without touching the OS
    DryRun,
}

impl BackendKind {
    /// Parse a backend name from configuration.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "native" | "sendinput" => Some(Self::Native),
            "accessibility" | "enigo" => Some(Self::Accessibility),
            "dry-run" | "dryrun" | "none" => Some(Self::DryRun),
            _ => None,
        }
    }

    /// The backend that suits the current platform best.
    pub const fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Native
        } else {
            Self::Accessibility
        }
    }
}

/// The closed set of backends, dispatched statically.
pub enum PlatformInjector {
    /// Windows `SendInput`
    #[cfg(windows)]
    Native(SendInputInjector),
    /// `enigo`
    Accessibility(AccessibilityInjector),
    /// Logging only
    DryRun(DryRunInjector),
}

impl PlatformInjector {
    /// Construct the requested backend.
    ///
    /// Must be called on the thread that will inject, since some platform
    /// connections are not transferable between threads.
    pub fn open(kind: BackendKind) -> Result<Self, TypingError> {
        match kind {
            #[cfg(windows)]
            BackendKind::Native => Ok(Self::Native(SendInputInjector::new())),
            #[cfg(not(windows))]
            BackendKind::Native => Err(TypingError::InjectionDenied(
                "no native input backend on this platform; use the accessibility backend".into(),
            )),
            BackendKind::Accessibility => AccessibilityInjector::new().map(Self::Accessibility),
            BackendKind::DryRun => Ok(Self::DryRun(DryRunInjector::new())),
        }
    }
}

/// Layout matching whichever backend was opened.
#[derive(Debug, Clone, Copy)]
pub enum PlatformLayout {
    /// Active Windows keyboard layout
    #[cfg(windows)]
    System(SystemLayout),
    /// Character-carrying identity layout
    Identity(IdentityLayout),
}

impl KeyLayout for PlatformLayout {
    fn lookup(&self, ch: char) -> Option<(VirtualKey, ShiftState)> {
        match self {
            #[cfg(windows)]
            Self::System(layout) => layout.lookup(ch),
            Self::Identity(layout) => layout.lookup(ch),
        }
    }
}

impl InputInjector for PlatformInjector {
    type Layout = PlatformLayout;

    fn inject(&mut self, action: KeyAction) -> Result<(), TypingError> {
        match self {
            #[cfg(windows)]
            Self::Native(injector) => injector.inject(action),
            Self::Accessibility(injector) => injector.inject(action),
            Self::DryRun(injector) => injector.inject(action),
        }
    }

    fn layout(&self) -> PlatformLayout {
        match self {
            #[cfg(windows)]
            Self::Native(injector) => PlatformLayout::System(injector.layout()),
            Self::Accessibility(injector) => PlatformLayout::Identity(injector.layout()),
            Self::DryRun(injector) => PlatformLayout::Identity(injector.layout()),
        }
    }

    fn supports_raw_unicode(&self) -> bool {
        match self {
            #[cfg(windows)]
            Self::Native(injector) => injector.supports_raw_unicode(),
            Self::Accessibility(injector) => injector.supports_raw_unicode(),
            Self::DryRun(injector) => injector.supports_raw_unicode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_backend_names() {
        assert_eq!(BackendKind::parse("native"), Some(BackendKind::Native));
        assert_eq!(BackendKind::parse(" Enigo "), Some(BackendKind::Accessibility));
        assert_eq!(BackendKind::parse("dry-run"), Some(BackendKind::DryRun));
        assert_eq!(BackendKind::parse("xdotool"), None);
    }

    #[test]
    fn dry_run_backend_always_opens() {
        let injector = PlatformInjector::open(BackendKind::DryRun).unwrap();
        assert!(injector.supports_raw_unicode());
        assert!(injector.layout().lookup('a').is_some());
    }

    #[cfg(not(windows))]
    #[test]
    fn native_backend_is_denied_off_windows() {
        assert!(matches!(
            PlatformInjector::open(BackendKind::Native),
            Err(TypingError::InjectionDenied(_))
        ));
    }
}
