//! Error taxonomy for encoding and injecting keystrokes

use thiserror::Error;

/// Errors raised while turning characters into OS input events
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TypingError {
    /// No viable action sequence exists for this character on the active backend.
    #[error("cannot encode {ch:?} ({}) on this platform", code_point(.ch))]
    EncodingUnsupported {
        /// The character that was skipped
        ch: char,
    },

    /// The platform refused to synthesize input, usually a missing permission.
    #[error("input injection denied: {0}")]
    InjectionDenied(String),

    /// A single OS call failed without a permission cause.
    #[error("input injection failed: {0}")]
    InjectionTransientFailure(String),
}

impl TypingError {
    /// Whether this error must abort the running session.
    ///
    /// Encoding problems are recovered per character; any injection problem is
    /// fatal because retrying could duplicate or reorder visible keystrokes.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InjectionDenied(_) | Self::InjectionTransientFailure(_)
        )
    }
}

/// Formats a character as `U+XXXX`.
fn code_point(ch: &char) -> String {
    format!("U+{:04X}", u32::from(*ch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_errors_are_recoverable() {
        assert!(!TypingError::EncodingUnsupported { ch: 'x' }.is_fatal());
        assert!(TypingError::InjectionDenied("no access".into()).is_fatal());
        assert!(TypingError::InjectionTransientFailure("busy".into()).is_fatal());
    }

    #[test]
    fn encoding_error_names_the_code_point() {
        let msg = TypingError::EncodingUnsupported { ch: '\u{1F600}' }.to_string();
        assert!(msg.contains("U+1F600"), "unexpected message: {msg}");
    }
}
