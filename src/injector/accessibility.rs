//! Keystroke injection through `enigo`
//!
//! Covers platforms without a native synthesis API reachable from user code.
//! On macOS this goes through the accessibility service and needs the
//! process to be trusted for input monitoring.

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::{debug, warn};

use super::InputInjector;
use crate::encoder::{IdentityLayout, KeyAction, VirtualKey};
use crate::error::TypingError;

/// `enigo`-backed injector
pub struct AccessibilityInjector {
    /// Enigo connection
    enigo: Enigo,
    /// High surrogate waiting for its low half
    pending_high: Option<u16>,
    /// Character currently held down through the raw path
    held: Option<char>,
}

impl AccessibilityInjector {
    /// Open a connection to the input service.
    ///
    /// Fails with [`TypingError::InjectionDenied`] when the connection cannot be
    /// established, which on macOS means the accessibility permission is missing.
    pub fn new() -> Result<Self, TypingError> {
        let enigo = Enigo::new(&Settings::default()).map_err(|e| {
            TypingError::InjectionDenied(format!(
                "could not open input connection ({e}); grant this program input simulation permission"
            ))
        })?;
        debug!("Accessibility input backend ready");

        Ok(Self {
            enigo,
            pending_high: None,
            held: None,
        })
    }

    /// Send one key event, mapping enigo failures onto the error taxonomy
    fn send(&mut self, key: Key, direction: Direction) -> Result<(), TypingError> {
        self.enigo
            .key(key, direction)
            .map_err(|e| TypingError::InjectionTransientFailure(format!("{e}")))
    }

    /// Handle one half of a raw code-unit key event
    fn raw(&mut self, code_unit: u16, key_up: bool) -> Result<(), TypingError> {
        match (code_unit, key_up) {
            (0xD800..=0xDBFF, false) => {
                self.pending_high = Some(code_unit);
                Ok(())
            }
            (0xD800..=0xDBFF, true) => Ok(()),
            (_, false) => {
                let ch = match self.pending_high.take() {
                    Some(high) => char::decode_utf16([high, code_unit])
                        .next()
                        .and_then(Result::ok),
                    None => char::from_u32(u32::from(code_unit)),
                };
                let Some(ch) = ch else {
                    warn!("Dropping unpaired UTF-16 code unit {code_unit:#06X}");
                    return Ok(());
                };
                self.held = Some(ch);
                self.send(Key::Unicode(ch), Direction::Press)
            }
            (_, true) => match self.held.take() {
                Some(ch) => self.send(Key::Unicode(ch), Direction::Release),
                None => Ok(()),
            },
        }
    }
}

/// Key for a virtual key produced by [`IdentityLayout`] or the encoder's fixed keys
fn key_for(vk: VirtualKey) -> Result<Key, TypingError> {
    Ok(match vk {
        VirtualKey::ENTER => Key::Return,
        VirtualKey::TAB => Key::Tab,
        VirtualKey::BACKSPACE => Key::Backspace,
        VirtualKey::ESCAPE => Key::Escape,
        VirtualKey::SHIFT => Key::Shift,
        VirtualKey::CONTROL => Key::Control,
        VirtualKey::ALT => Key::Alt,
        VirtualKey(code) => Key::Unicode(char::from_u32(u32::from(code)).ok_or_else(|| {
            TypingError::InjectionTransientFailure(format!("virtual key {code:#06X} has no character"))
        })?),
    })
}

impl InputInjector for AccessibilityInjector {
    type Layout = IdentityLayout;

    fn inject(&mut self, action: KeyAction) -> Result<(), TypingError> {
        match action {
            KeyAction::Tap(vk) => self.send(key_for(vk)?, Direction::Click),
            KeyAction::ModifierDown(vk) => self.send(key_for(vk)?, Direction::Press),
            KeyAction::ModifierUp(vk) => self.send(key_for(vk)?, Direction::Release),
            KeyAction::RawUnicode { code_unit, key_up } => self.raw(code_unit, key_up),
        }
    }

    fn layout(&self) -> IdentityLayout {
        IdentityLayout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_keys_map_to_named_enigo_keys() {
        assert_eq!(key_for(VirtualKey::ENTER).unwrap(), Key::Return);
        assert_eq!(key_for(VirtualKey::SHIFT).unwrap(), Key::Shift);
        assert_eq!(key_for(VirtualKey(u16::from(b'q'))).unwrap(), Key::Unicode('q'));
    }

    #[test]
    fn lone_surrogate_key_is_rejected() {
        assert!(key_for(VirtualKey(0xD800)).is_err());
    }
}
