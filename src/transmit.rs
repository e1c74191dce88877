// src/transmit.rs
//
// Transmit buffer: composes the user's text with the active terminator
// before it is handed to the session engine for writing.

use crate::framing::Terminator;

/// A composed outbound message: user text plus the terminator's literal
/// bytes. Owned by the transmit buffer; the session engine reads it and
/// never mutates it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransmitMessage(Vec<u8>);

impl TransmitMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compose a transmit message. Pure function of its two inputs; callers
/// recompute it whenever either changes. No I/O happens here.
pub fn compose(text: &str, terminator: &Terminator) -> TransmitMessage {
    let mut bytes = Vec::with_capacity(text.len() + terminator.bytes().len());
    bytes.extend_from_slice(text.as_bytes());
    bytes.extend_from_slice(terminator.bytes());
    TransmitMessage(bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_appends_crlf() {
        assert_eq!(compose("ping", &Terminator::CrLf).as_bytes(), b"ping\r\n");
    }

    #[test]
    fn test_compose_without_terminator() {
        assert_eq!(compose("ping", &Terminator::None).as_bytes(), b"ping");
    }

    #[test]
    fn test_compose_custom_terminator() {
        let terminator = Terminator::Custom("EOT".to_string());
        assert_eq!(compose("data", &terminator).as_bytes(), b"dataEOT");
    }

    #[test]
    fn test_compose_empty_text() {
        let message = compose("", &Terminator::Cr);
        assert_eq!(message.as_bytes(), b"\r");
        assert_eq!(message.len(), 1);
        assert!(!message.is_empty());
    }
}
