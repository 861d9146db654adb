//! Character to key-action encoding
//!
//! Turns one Unicode character into the ordered list of primitive key actions
//! an injector must replay. Knows nothing about any OS: the keyboard layout
//! lookup is supplied through [`KeyLayout`].

use crate::error::TypingError;

/// Layout-independent key identifier, numerically compatible with Windows virtual keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualKey(pub u16);

impl VirtualKey {
    /// Backspace
    pub const BACKSPACE: Self = Self(0x08);
    /// Tab
    pub const TAB: Self = Self(0x09);
    /// Enter / Return
    pub const ENTER: Self = Self(0x0D);
    /// Shift
    pub const SHIFT: Self = Self(0x10);
    /// Control
    pub const CONTROL: Self = Self(0x11);
    /// Alt (`VK_MENU`)
    pub const ALT: Self = Self(0x12);
    /// Escape
    pub const ESCAPE: Self = Self(0x1B);
}

/// Modifier bitmask reported by a layout lookup: bit0 Shift, bit1 Ctrl, bit2 Alt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftState(pub u8);

impl ShiftState {
    /// No modifiers
    pub const NONE: Self = Self(0);
    /// Shift bit
    pub const SHIFT: Self = Self(0b001);
    /// Ctrl bit
    pub const CTRL: Self = Self(0b010);
    /// Alt bit
    pub const ALT: Self = Self(0b100);

    /// Modifier keys for the set bits, always in Shift, Ctrl, Alt order.
    pub fn modifiers(self) -> impl DoubleEndedIterator<Item = VirtualKey> {
        [
            (Self::SHIFT, VirtualKey::SHIFT),
            (Self::CTRL, VirtualKey::CONTROL),
            (Self::ALT, VirtualKey::ALT),
        ]
        .into_iter()
        .filter(move |&(bit, _)| self.0 & bit.0 != 0)
        .map(|(_, vk)| vk)
    }
}

/// One primitive keyboard operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Press and release a virtual key
    Tap(VirtualKey),
    /// Press and hold a modifier
    ModifierDown(VirtualKey),
    /// Release a held modifier
    ModifierUp(VirtualKey),
    /// Send a UTF-16 code unit directly, bypassing the layout
    RawUnicode {
        /// The UTF-16 code unit (possibly one half of a surrogate pair)
        code_unit: u16,
        /// `false` for key-down, `true` for key-up
        key_up: bool,
    },
}

/// Ordered actions produced for a single input character.
pub type EncodedCharacter = Vec<KeyAction>;

/// How a newline is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlinePolicy {
    /// Shift+Enter, which most chat inputs treat as "insert line break"
    #[default]
    ChatSafe,
    /// A bare Enter
    Plain,
}

/// Resolves a character to a virtual key on the active keyboard layout.
pub trait KeyLayout {
    /// The key and modifiers producing `ch`, or `None` when the layout has no key for it.
    fn lookup(&self, ch: char) -> Option<(VirtualKey, ShiftState)>;
}

/// Maps printable ASCII, tab and carriage return to a key whose code equals
/// the character, with no modifiers.
///
/// Used by backends that resolve characters themselves (such as the
/// accessibility backend), where the "virtual key" just carries the character.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLayout;

impl KeyLayout for IdentityLayout {
    fn lookup(&self, ch: char) -> Option<(VirtualKey, ShiftState)> {
        match ch {
            ' '..='~' | '\t' | '\r' => {
                Some((VirtualKey(u16::try_from(u32::from(ch)).ok()?), ShiftState::NONE))
            }
            _ => None,
        }
    }
}

/// Encodes characters into key actions for one session.
#[derive(Debug, Clone)]
pub struct CharacterEncoder<L> {
    /// Layout used for the direct virtual-key path
    layout: L,
    /// Newline handling
    newline: NewlinePolicy,
    /// Whether the backend can send raw UTF-16 code units
    raw_unicode: bool,
}

impl<L: KeyLayout> CharacterEncoder<L> {
    /// Create an encoder over `layout`.
    pub const fn new(layout: L, newline: NewlinePolicy, raw_unicode: bool) -> Self {
        Self {
            layout,
            newline,
            raw_unicode,
        }
    }

    /// Encode one character.
    ///
    /// Fails only with [`TypingError::EncodingUnsupported`], when the layout has
    /// no key for `ch` and the backend cannot send raw code units.
    pub fn encode(&self, ch: char) -> Result<EncodedCharacter, TypingError> {
        if ch == '\n' {
            return Ok(match self.newline {
                NewlinePolicy::ChatSafe => vec![
                    KeyAction::ModifierDown(VirtualKey::SHIFT),
                    KeyAction::Tap(VirtualKey::ENTER),
                    KeyAction::ModifierUp(VirtualKey::SHIFT),
                ],
                NewlinePolicy::Plain => vec![KeyAction::Tap(VirtualKey::ENTER)],
            });
        }

        if u32::from(ch) > 0xFFFF {
            return self.raw(ch);
        }

        match self.layout.lookup(ch) {
            Some((vk, shift)) => {
                let mut actions: EncodedCharacter = shift.modifiers().map(KeyAction::ModifierDown).collect();
                actions.push(KeyAction::Tap(vk));
                actions.extend(shift.modifiers().rev().map(KeyAction::ModifierUp));
                Ok(actions)
            }
            None => self.raw(ch),
        }
    }

    /// Encode through the raw-unicode path, splitting into surrogates when needed.
    fn raw(&self, ch: char) -> Result<EncodedCharacter, TypingError> {
        if !self.raw_unicode {
            return Err(TypingError::EncodingUnsupported { ch });
        }

        let code_point = u32::from(ch);
        let units = match surrogate_pair(code_point) {
            Some((high, low)) => vec![high, low],
            None => vec![u16::try_from(code_point).map_err(|_| TypingError::EncodingUnsupported { ch })?],
        };

        Ok(units
            .into_iter()
            .flat_map(|code_unit| {
                [
                    KeyAction::RawUnicode {
                        code_unit,
                        key_up: false,
                    },
                    KeyAction::RawUnicode {
                        code_unit,
                        key_up: true,
                    },
                ]
            })
            .collect())
    }
}

/// Splits a supplementary-plane code point into its UTF-16 surrogates.
///
/// Returns `None` for code points inside the Basic Multilingual Plane.
pub fn surrogate_pair(code_point: u32) -> Option<(u16, u16)> {
    if !(0x1_0000..=0x10_FFFF).contains(&code_point) {
        return None;
    }
    let offset = code_point - 0x1_0000;
    let high = u16::try_from(0xD800 + (offset >> 10)).ok()?;
    let low = u16::try_from(0xDC00 + (offset & 0x3FF)).ok()?;
    Some((high, low))
}
