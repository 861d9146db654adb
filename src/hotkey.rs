//! Emergency-stop hotkey
//!
//! Two strategies: poll the physical key state on every character (Windows),
//! or register a global hotkey whose handler sets a latch that the session
//! consumes with an atomic test-and-clear.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey},
};
use tracing::info;

use crate::encoder::VirtualKey;

/// Non-blocking check for the emergency-stop key.
///
/// Called once per character, so implementations must be cheap.
pub trait HotkeyMonitor {
    /// Whether a stop was requested since the last call (or is requested right now).
    fn is_stop_requested(&self) -> bool;
}

/// Monitor that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHotkey;

impl HotkeyMonitor for NoHotkey {
    fn is_stop_requested(&self) -> bool {
        false
    }
}

/// Set by a listener, consumed exactly once by the session.
#[derive(Debug, Clone, Default)]
pub struct StopLatch {
    /// Latched key-down
    flag: Arc<AtomicBool>,
}

impl StopLatch {
    /// Create an unset latch
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl HotkeyMonitor for StopLatch {
    fn is_stop_requested(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

/// Reads the physical state of a key through `GetAsyncKeyState`.
#[cfg(windows)]
#[derive(Debug, Clone, Copy)]
pub struct KeyStatePoller {
    /// Key to watch
    vk: VirtualKey,
}

#[cfg(windows)]
impl KeyStatePoller {
    /// Watch `vk`
    pub const fn new(vk: VirtualKey) -> Self {
        Self { vk }
    }
}

#[cfg(windows)]
impl HotkeyMonitor for KeyStatePoller {
    fn is_stop_requested(&self) -> bool {
        use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

        // SAFETY: GetAsyncKeyState only reads global keyboard state for the given key code.
        let state = unsafe { GetAsyncKeyState(i32::from(self.vk.0)) };
        // High bit set means the key is down right now.
        state < 0
    }
}

/// How the stop key is observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStrategy {
    /// Poll hardware key state (Windows only)
    Poll,
    /// Register a global hotkey and latch presses
    Latch,
    /// No emergency stop key
    Off,
}

impl StopStrategy {
    /// Parse a strategy name from configuration.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "poll" => Some(Self::Poll),
            "latch" | "listen" => Some(Self::Latch),
            "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }

    /// Whether the stop key can be observed this way on the current platform.
    ///
    /// Polling needs `GetAsyncKeyState`. Hotkey events arrive through the
    /// Windows message queue we pump, or the X11 thread `global-hotkey` runs
    /// itself; macOS only delivers them to an app run loop, which we lack.
    pub const fn is_supported(self) -> bool {
        match self {
            Self::Poll => cfg!(windows),
            Self::Latch => cfg!(any(windows, target_os = "linux")),
            Self::Off => true,
        }
    }

    /// Best supported strategy for the current platform
    pub const fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Poll
        } else if Self::Latch.is_supported() {
            Self::Latch
        } else {
            Self::Off
        }
    }
}

/// A key that can serve as the emergency stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopKey {
    /// Name shown to the user
    pub label: &'static str,
    /// Code for global hotkey registration
    pub code: Code,
    /// Virtual key for state polling
    pub vk: VirtualKey,
}

impl StopKey {
    /// Parse key string to a stop key
    pub fn parse(key: &str) -> Result<Self> {
        let (label, code, vk) = match key.trim().to_uppercase().as_str() {
            "F1" => ("F1", Code::F1, 0x70),
            "F2" => ("F2", Code::F2, 0x71),
            "F3" => ("F3", Code::F3, 0x72),
            "F4" => ("F4", Code::F4, 0x73),
            "F5" => ("F5", Code::F5, 0x74),
            "F6" => ("F6", Code::F6, 0x75),
            "F7" => ("F7", Code::F7, 0x76),
            "F8" => ("F8", Code::F8, 0x77),
            "F9" => ("F9", Code::F9, 0x78),
            "F10" => ("F10", Code::F10, 0x79),
            "F11" => ("F11", Code::F11, 0x7A),
            "F12" => ("F12", Code::F12, 0x7B),
            "ESC" | "ESCAPE" => ("Esc", Code::Escape, 0x1B),
            "PAUSE" => ("Pause", Code::Pause, 0x13),
            "SCROLLLOCK" => ("Scroll Lock", Code::ScrollLock, 0x91),
            _ => anyhow::bail!("Invalid stop key: {}", key),
        };
        Ok(Self {
            label,
            code,
            vk: VirtualKey(vk),
        })
    }
}

impl Default for StopKey {
    fn default() -> Self {
        Self {
            label: "F9",
            code: Code::F9,
            vk: VirtualKey(0x78),
        }
    }
}

/// Global hotkey registration feeding a [`StopLatch`].
///
/// Must be created on, and outlived by, the thread that pumps the platform
/// message loop.
pub struct HotkeyListener {
    /// Hotkey manager
    _manager: GlobalHotKeyManager,
    /// Registered hotkey
    pub hotkey: HotKey,
}

impl HotkeyListener {
    /// Register `key` globally; presses trigger the returned latch.
    pub fn register(key: StopKey) -> Result<(Self, StopLatch)> {
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
        let hotkey = HotKey::new(None, key.code);

        if let Err(e) = manager.register(hotkey) {
            anyhow::bail!(
                "Failed to register stop key {} ({}). It may be taken by another program; \
                try a different STOP_KEY in your .env file.",
                key.label,
                e
            );
        }

        let latch = StopLatch::new();
        let handler_latch = latch.clone();
        let id = hotkey.id();
        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            if event.id == id && event.state == HotKeyState::Pressed {
                handler_latch.trigger();
            }
        }));

        info!("Registered stop key: {}", key.label);
        Ok((
            Self {
                _manager: manager,
                hotkey,
            },
            latch,
        ))
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        GlobalHotKeyEvent::set_event_handler(None::<fn(GlobalHotKeyEvent)>);
    }
}

/// The monitor handed to the session worker.
#[derive(Debug, Clone)]
pub enum StopMonitor {
    /// Hardware state polling
    #[cfg(windows)]
    Poll(KeyStatePoller),
    /// Latched global hotkey
    Latch(StopLatch),
    /// No emergency stop available
    Disabled,
}

impl HotkeyMonitor for StopMonitor {
    fn is_stop_requested(&self) -> bool {
        match self {
            #[cfg(windows)]
            Self::Poll(poller) => poller.is_stop_requested(),
            Self::Latch(latch) => latch.is_stop_requested(),
            Self::Disabled => false,
        }
    }
}
