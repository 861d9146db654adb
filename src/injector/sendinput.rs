//! Native keystroke injection via the Win32 `SendInput` API.

use tracing::debug;
use windows::Win32::Foundation::E_ACCESSDENIED;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, SendInput, VIRTUAL_KEY, VkKeyScanW,
};

use super::InputInjector;
use crate::encoder::{KeyAction, KeyLayout, ShiftState, VirtualKey};
use crate::error::TypingError;

/// Shift-state bits we know how to press; anything else (Hankaku, etc.) is not typeable.
const SUPPORTED_SHIFT_BITS: u8 = 0b111;

/// The keyboard layout active for the calling thread, queried through `VkKeyScanW`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLayout;

impl KeyLayout for SystemLayout {
    fn lookup(&self, ch: char) -> Option<(VirtualKey, ShiftState)> {
        let unit = u16::try_from(u32::from(ch)).ok()?;
        // SAFETY: VkKeyScanW takes a plain UTF-16 code unit and only reads
        // the current thread's keyboard layout.
        let result = unsafe { VkKeyScanW(unit) };
        if result == -1 {
            return None;
        }
        let [vk, shift] = result.to_le_bytes();
        if shift & !SUPPORTED_SHIFT_BITS != 0 {
            return None;
        }
        Some((VirtualKey(u16::from(vk)), ShiftState(shift)))
    }
}

/// `SendInput`-backed injector
#[derive(Debug, Default)]
pub struct SendInputInjector;

impl SendInputInjector {
    /// Create the injector. `SendInput` needs no connection setup.
    pub fn new() -> Self {
        debug!("Native SendInput backend ready");
        Self
    }

    /// Submit keyboard events as one atomic batch
    fn send(events: &[KEYBDINPUT]) -> Result<(), TypingError> {
        let inputs: Vec<INPUT> = events
            .iter()
            .map(|&ki| INPUT {
                r#type: INPUT_KEYBOARD,
                Anonymous: INPUT_0 { ki },
            })
            .collect();
        let size = i32::try_from(size_of::<INPUT>())
            .map_err(|_| TypingError::InjectionTransientFailure("INPUT size overflow".into()))?;

        // SAFETY: `inputs` is a fully initialised slice of keyboard INPUT
        // structs and `size` is the exact size of one element.
        let sent = unsafe { SendInput(&inputs, size) };
        if usize::try_from(sent).is_ok_and(|n| n == inputs.len()) {
            return Ok(());
        }

        let err = windows::core::Error::from_thread();
        if err.code() == E_ACCESSDENIED || err.code().is_ok() {
            // UIPI blocks input to elevated windows without setting an error code.
            Err(TypingError::InjectionDenied(format!(
                "SendInput was blocked ({err}); the focused window may be running elevated"
            )))
        } else {
            Err(TypingError::InjectionTransientFailure(format!(
                "SendInput inserted {sent} of {} events: {err}",
                inputs.len()
            )))
        }
    }
}

/// Keyboard event for a virtual key
const fn vk_event(vk: VirtualKey, flags: KEYBD_EVENT_FLAGS) -> KEYBDINPUT {
    KEYBDINPUT {
        wVk: VIRTUAL_KEY(vk.0),
        wScan: 0,
        dwFlags: flags,
        time: 0,
        dwExtraInfo: 0,
    }
}

impl InputInjector for SendInputInjector {
    type Layout = SystemLayout;

    fn inject(&mut self, action: KeyAction) -> Result<(), TypingError> {
        match action {
            KeyAction::Tap(vk) => Self::send(&[
                vk_event(vk, KEYBD_EVENT_FLAGS(0)),
                vk_event(vk, KEYEVENTF_KEYUP),
            ]),
            KeyAction::ModifierDown(vk) => Self::send(&[vk_event(vk, KEYBD_EVENT_FLAGS(0))]),
            KeyAction::ModifierUp(vk) => Self::send(&[vk_event(vk, KEYEVENTF_KEYUP)]),
            KeyAction::RawUnicode { code_unit, key_up } => {
                let flags = if key_up {
                    KEYEVENTF_UNICODE | KEYEVENTF_KEYUP
                } else {
                    KEYEVENTF_UNICODE
                };
                Self::send(&[KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: code_unit,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                }])
            }
        }
    }

    fn layout(&self) -> SystemLayout {
        SystemLayout
    }
}
