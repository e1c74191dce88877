// src/framing.rs
//
// Message terminator policy and the framed read scanner.
// The scanner consumes one byte at a time and stops on a full terminator
// match or when the connection yields no more bytes; matched terminator
// bytes are excluded from the returned text.

use crate::error::Result;

// ============================================================================
// Terminator Policy
// ============================================================================

/// Message terminator. Replaced wholesale whenever the user changes the
/// terminator mode or edits the custom text; the session engine reads it
/// at read time and never caches it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    /// No terminator: read until the connection yields no more bytes
    None,
    Cr,
    Lf,
    CrLf,
    Custom(String),
}

impl Terminator {
    /// Literal bytes appended to transmitted text and matched on reads.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Terminator::None => b"",
            Terminator::Cr => b"\r",
            Terminator::Lf => b"\n",
            Terminator::CrLf => b"\r\n",
            Terminator::Custom(text) => text.as_bytes(),
        }
    }
}

// ============================================================================
// Framed Read Scanner
// ============================================================================

/// One byte at a time from the underlying connection. `None` means the
/// read yielded nothing within the timeout policy (end of available data);
/// errors are OS-level read failures.
pub trait ByteSource {
    fn next_byte(&mut self) -> Result<Option<u8>>;
}

/// Read one framed message from `source`.
///
/// With an empty terminator, collects bytes until the source is exhausted.
/// Otherwise a suffix scan counts consecutively matched terminator bytes;
/// a mismatch restarts the scan at the current byte. The read ends on a
/// full match (terminator excluded from the result) or on end of data.
///
/// A scan ending with exactly two terminator bytes matched has stored one
/// of them, so the last byte is trimmed. The two-count case is the only
/// one trimmed, whatever the terminator length.
pub fn read_frame(source: &mut dyn ByteSource, terminator: &Terminator) -> Result<String> {
    let term = terminator.bytes();
    let mut out: Vec<u8> = Vec::new();

    if term.is_empty() {
        while let Some(byte) = source.next_byte()? {
            out.push(byte);
        }
        return Ok(String::from_utf8_lossy(&out).into_owned());
    }

    let mut matched = 0usize;
    while let Some(byte) = source.next_byte()? {
        if byte == term[matched] {
            matched += 1;
        } else if byte == term[0] {
            matched = 1;
        } else {
            matched = 0;
        }
        if matched == term.len() {
            break;
        }
        out.push(byte);
    }
    if matched == 2 {
        out.pop();
    }

    Ok(String::from_utf8_lossy(&out).into_owned())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SerialError;

    /// Scripted byte source: serves the given bytes, then reports end of
    /// data, optionally failing partway through.
    struct Script {
        bytes: Vec<u8>,
        pos: usize,
        fail_at: Option<usize>,
    }

    impl Script {
        fn new(bytes: &[u8]) -> Self {
            Script {
                bytes: bytes.to_vec(),
                pos: 0,
                fail_at: None,
            }
        }

        fn failing_at(bytes: &[u8], at: usize) -> Self {
            Script {
                bytes: bytes.to_vec(),
                pos: 0,
                fail_at: Some(at),
            }
        }
    }

    impl ByteSource for Script {
        fn next_byte(&mut self) -> Result<Option<u8>> {
            if self.fail_at == Some(self.pos) {
                return Err(SerialError::read("injected failure"));
            }
            let byte = self.bytes.get(self.pos).copied();
            self.pos += 1;
            Ok(byte)
        }
    }

    #[test]
    fn test_crlf_terminator_fully_stripped() {
        let mut source = Script::new(b"hello\r\n");
        let text = read_frame(&mut source, &Terminator::CrLf).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_lf_reads_until_first_match() {
        let mut source = Script::new(b"a\nb\n");
        let text = read_frame(&mut source, &Terminator::Lf).unwrap();
        assert_eq!(text, "a");
    }

    #[test]
    fn test_none_terminator_on_empty_source() {
        let mut source = Script::new(b"");
        let text = read_frame(&mut source, &Terminator::None).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_none_terminator_collects_everything() {
        let mut source = Script::new(b"raw stream\r\nwith line noise");
        let text = read_frame(&mut source, &Terminator::None).unwrap();
        assert_eq!(text, "raw stream\r\nwith line noise");
    }

    #[test]
    fn test_cr_terminator() {
        let mut source = Script::new(b"ok\rrest");
        let text = read_frame(&mut source, &Terminator::Cr).unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_embedded_cr_does_not_end_crlf_scan() {
        // The bare CR restarts the scan; only the trailing CRLF terminates
        let mut source = Script::new(b"ab\r\r\n");
        let text = read_frame(&mut source, &Terminator::CrLf).unwrap();
        assert_eq!(text, "ab\r");
    }

    #[test]
    fn test_interleaved_partial_match_resets() {
        let mut source = Script::new(b"a\rb\r\n");
        let text = read_frame(&mut source, &Terminator::CrLf).unwrap();
        assert_eq!(text, "a\rb");
    }

    #[test]
    fn test_custom_single_byte_terminator() {
        let mut source = Script::new(b"value;more");
        let text = read_frame(&mut source, &Terminator::Custom(";".to_string())).unwrap();
        assert_eq!(text, "value");
    }

    #[test]
    fn test_custom_long_terminator_keeps_two_matched_bytes() {
        // Three-byte terminators end the scan but only the two-count case
        // trims, so the stored "EN" stays in the result.
        let mut source = Script::new(b"xEND");
        let text = read_frame(&mut source, &Terminator::Custom("END".to_string())).unwrap();
        assert_eq!(text, "xEN");
    }

    #[test]
    fn test_end_of_data_with_two_matched_bytes_trims_one() {
        // Source dries up two bytes into a three-byte terminator
        let mut source = Script::new(b"xEN");
        let text = read_frame(&mut source, &Terminator::Custom("END".to_string())).unwrap();
        assert_eq!(text, "xE");
    }

    #[test]
    fn test_end_of_data_without_match_returns_partial() {
        let mut source = Script::new(b"no terminator here");
        let text = read_frame(&mut source, &Terminator::CrLf).unwrap();
        assert_eq!(text, "no terminator here");
    }

    #[test]
    fn test_read_failure_propagates() {
        let mut source = Script::failing_at(b"abc\r\n", 2);
        let err = read_frame(&mut source, &Terminator::CrLf).unwrap_err();
        assert!(matches!(err, SerialError::Read(_)));
    }

    #[test]
    fn test_terminator_bytes() {
        assert_eq!(Terminator::None.bytes(), b"");
        assert_eq!(Terminator::Cr.bytes(), b"\r");
        assert_eq!(Terminator::Lf.bytes(), b"\n");
        assert_eq!(Terminator::CrLf.bytes(), b"\r\n");
        assert_eq!(Terminator::Custom("##".to_string()).bytes(), b"##");
    }
}
