#![forbid(unsafe_code)]

//! Incremental escape-sequence decoder.
//!
//! Resolves the CSI (`ESC [`) and SS3 (`ESC O`) input families one byte at
//! a time. A bare ESC is a prefix of every sequence, so a pending sequence
//! can only be settled by more bytes or by the event loop's multi-keypress
//! timeout; the decoder itself never waits.
//!
//! # Contract
//!
//! The event loop starts a sequence with [`EscapeDecoder::begin`] when a
//! raw ESC arrives, then routes every following byte through
//! [`EscapeDecoder::feed`]:
//!
//! - [`Decoded::Incomplete`]: keep reading.
//! - [`Decoded::Key`]: a resolved key; CSI parameters (if any) stay
//!   readable until [`EscapeDecoder::reset`].
//! - [`Decoded::Invalid`] / [`Decoded::Unsupported`]: the sequence is dead;
//!   the caller takes the accumulated bytes with
//!   [`EscapeDecoder::take_replay`] and delivers each as an ordinary key
//!   with repeat count 1. Nothing is silently dropped.
//!
//! Every outcome other than `Incomplete` requires a reset (or
//! `take_replay`, which resets) before the next `begin`.
//!
//! # DoS Protection
//!
//! Accumulated sequences are capped at [`MAX_SEQUENCE_LEN`] bytes; a longer
//! sequence goes `Invalid` and replays, so hostile input cannot grow the
//! buffer without bound.

use crate::event::{KeyCode, control};

/// DoS protection: maximum accumulated sequence length.
///
/// The longest sequence this decoder resolves is a cursor-position report
/// from a 999x999 negotiation probe, 11 bytes.
pub const MAX_SEQUENCE_LEN: usize = 16;

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// The sequence resolved to a key.
    Key(KeyCode),
    /// More bytes are needed.
    Incomplete,
    /// Not a sequence at all; replay the accumulated bytes as plain keys.
    Invalid,
    /// A well-formed sequence with no mapping; replay the accumulated
    /// bytes as plain keys.
    Unsupported,
}

/// Incremental CSI/SS3 decoder.
///
/// Owns the pending byte buffer and CSI parameter list for one event-loop
/// invocation; nested sessions each run their own instance so no pending
/// state leaks across session boundaries.
#[derive(Debug, Default)]
pub struct EscapeDecoder {
    /// Accumulated bytes of the pending sequence, starting with ESC.
    seq: Vec<u8>,
    /// Decimal CSI parameters accumulated so far.
    params: Vec<String>,
    /// A CSI intermediate byte was seen; blocks `~` table resolution.
    saw_intermediate: bool,
}

impl EscapeDecoder {
    /// Create an idle decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a sequence is accumulated but unresolved.
    #[must_use]
    pub fn pending(&self) -> bool {
        !self.seq.is_empty()
    }

    /// Start a sequence from a received ESC byte.
    pub fn begin(&mut self) {
        debug_assert!(!self.pending(), "begin with a sequence still pending");
        self.seq.push(control::ESC);
    }

    /// Decimal parameters of the current/just-resolved CSI sequence.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Take the accumulated bytes for replay and reset the decoder.
    #[must_use]
    pub fn take_replay(&mut self) -> Vec<u8> {
        let bytes = std::mem::take(&mut self.seq);
        self.params.clear();
        self.saw_intermediate = false;
        bytes
    }

    /// Drop all pending state.
    pub fn reset(&mut self) {
        self.seq.clear();
        self.params.clear();
        self.saw_intermediate = false;
    }

    /// Feed the next byte of a pending sequence.
    pub fn feed(&mut self, byte: u8) -> Decoded {
        debug_assert!(self.pending(), "feed with no pending sequence");
        if self.seq.len() >= MAX_SEQUENCE_LEN {
            self.seq.push(byte);
            #[cfg(feature = "tracing")]
            tracing::debug!(len = self.seq.len(), "escape sequence over length cap");
            return Decoded::Invalid;
        }
        if self.seq.len() == 1 {
            return self.feed_introducer(byte);
        }
        match self.seq[1] {
            b'O' => self.feed_ss3(byte),
            b'[' => self.feed_csi(byte),
            _ => {
                self.seq.push(byte);
                Decoded::Invalid
            }
        }
    }

    /// Second byte: ESC again is a literal Escape keystroke, `[`/`O` open
    /// a sequence, anything else was never a sequence.
    fn feed_introducer(&mut self, byte: u8) -> Decoded {
        match byte {
            control::ESC => Decoded::Key(KeyCode::Byte(control::ESC)),
            b'[' | b'O' => {
                self.seq.push(byte);
                Decoded::Incomplete
            }
            _ => {
                self.seq.push(byte);
                Decoded::Invalid
            }
        }
    }

    /// Third byte of `ESC O x`: navigation, F1-F4, or application keypad.
    fn feed_ss3(&mut self, byte: u8) -> Decoded {
        let code = match byte {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            // Application keypad: digits and operators.
            b'p'..=b'y' => KeyCode::Byte(byte - b'p' + b'0'),
            b'k' => KeyCode::Byte(b'+'),
            b'm' => KeyCode::Byte(b'-'),
            b'j' => KeyCode::Byte(b'*'),
            b'o' => KeyCode::Byte(b'/'),
            b'X' => KeyCode::Byte(b'='),
            b'n' => KeyCode::Byte(b'.'),
            b'l' => KeyCode::Byte(b','),
            b'M' => KeyCode::Byte(control::ENTER),
            _ => {
                self.seq.push(byte);
                #[cfg(feature = "tracing")]
                tracing::debug!(byte, "unsupported SS3 final byte");
                return Decoded::Unsupported;
            }
        };
        Decoded::Key(code)
    }

    /// Bytes after `ESC [`: parameters and intermediates accumulate, a
    /// final byte resolves.
    fn feed_csi(&mut self, byte: u8) -> Decoded {
        match byte {
            b'0'..=b'9' => {
                if self.params.is_empty() {
                    self.params.push(String::new());
                }
                if let Some(param) = self.params.last_mut() {
                    param.push(byte as char);
                }
                self.seq.push(byte);
                Decoded::Incomplete
            }
            b';' => {
                self.params.push(String::new());
                self.seq.push(byte);
                Decoded::Incomplete
            }
            b' '..=b'/' | b':' | b'<'..=b'?' => {
                self.saw_intermediate = true;
                self.seq.push(byte);
                Decoded::Incomplete
            }
            b'A' => Decoded::Key(KeyCode::Up),
            b'B' => Decoded::Key(KeyCode::Down),
            b'C' => Decoded::Key(KeyCode::Right),
            b'D' => Decoded::Key(KeyCode::Left),
            b'H' => Decoded::Key(KeyCode::Home),
            b'F' => Decoded::Key(KeyCode::End),
            b'R' => Decoded::Key(KeyCode::CursorReport),
            b'~' => self.resolve_tilde(),
            0x40..=0x7F => {
                self.seq.push(byte);
                #[cfg(feature = "tracing")]
                tracing::debug!(byte, "unsupported CSI final byte");
                Decoded::Unsupported
            }
            _ => {
                self.seq.push(byte);
                Decoded::Invalid
            }
        }
    }

    /// `ESC [ n ~` navigation and function-key tables. Only a single bare
    /// parameter of one or two digits resolves.
    fn resolve_tilde(&mut self) -> Decoded {
        if self.saw_intermediate || self.params.len() != 1 {
            self.seq.push(b'~');
            return Decoded::Unsupported;
        }
        let code = match self.params[0].as_str() {
            "1" | "7" => KeyCode::Home,
            "2" => KeyCode::Insert,
            "3" => KeyCode::Delete,
            "4" | "8" => KeyCode::End,
            "5" => KeyCode::PageUp,
            "6" => KeyCode::PageDown,
            "10" => KeyCode::F(0),
            "11" => KeyCode::F(1),
            "12" => KeyCode::F(2),
            "13" => KeyCode::F(3),
            "14" => KeyCode::F(4),
            "15" => KeyCode::F(5),
            "17" => KeyCode::F(6),
            "18" => KeyCode::F(7),
            "19" => KeyCode::F(8),
            "20" => KeyCode::F(9),
            "21" => KeyCode::F(10),
            "23" => KeyCode::F(11),
            "24" => KeyCode::F(12),
            _ => {
                self.seq.push(b'~');
                #[cfg(feature = "tracing")]
                tracing::debug!(param = %self.params[0], "unsupported tilde parameter");
                return Decoded::Unsupported;
            }
        };
        Decoded::Key(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a full sequence from the byte after ESC, asserting every
    /// intermediate byte reports `Incomplete`.
    fn decode_all(decoder: &mut EscapeDecoder, bytes: &[u8]) -> Decoded {
        decoder.reset();
        decoder.begin();
        let (last, rest) = bytes.split_last().expect("non-empty sequence");
        for &b in rest {
            assert_eq!(
                decoder.feed(b),
                Decoded::Incomplete,
                "byte {b:#04x} should leave the sequence incomplete"
            );
        }
        decoder.feed(*last)
    }

    #[test]
    fn double_escape_is_a_literal_escape() {
        let mut decoder = EscapeDecoder::new();
        decoder.begin();
        assert_eq!(
            decoder.feed(control::ESC),
            Decoded::Key(KeyCode::Byte(control::ESC))
        );
    }

    #[test]
    fn csi_arrows_and_home_end() {
        let mut decoder = EscapeDecoder::new();
        for (seq, key) in [
            (&b"[A"[..], KeyCode::Up),
            (b"[B", KeyCode::Down),
            (b"[C", KeyCode::Right),
            (b"[D", KeyCode::Left),
            (b"[H", KeyCode::Home),
            (b"[F", KeyCode::End),
        ] {
            assert_eq!(decode_all(&mut decoder, seq), Decoded::Key(key));
        }
    }

    #[test]
    fn ss3_navigation_and_function_keys() {
        let mut decoder = EscapeDecoder::new();
        for (seq, key) in [
            (&b"OA"[..], KeyCode::Up),
            (b"OB", KeyCode::Down),
            (b"OC", KeyCode::Right),
            (b"OD", KeyCode::Left),
            (b"OH", KeyCode::Home),
            (b"OF", KeyCode::End),
            (b"OP", KeyCode::F(1)),
            (b"OQ", KeyCode::F(2)),
            (b"OR", KeyCode::F(3)),
            (b"OS", KeyCode::F(4)),
        ] {
            assert_eq!(decode_all(&mut decoder, seq), Decoded::Key(key));
        }
    }

    #[test]
    fn ss3_application_keypad() {
        let mut decoder = EscapeDecoder::new();
        for (seq, byte) in [
            (&b"Op"[..], b'0'),
            (b"Oy", b'9'),
            (b"Ok", b'+'),
            (b"Om", b'-'),
            (b"Oj", b'*'),
            (b"Oo", b'/'),
            (b"OX", b'='),
            (b"On", b'.'),
            (b"Ol", b','),
            (b"OM", b'\r'),
        ] {
            assert_eq!(decode_all(&mut decoder, seq), Decoded::Key(KeyCode::Byte(byte)));
        }
    }

    #[test]
    fn tilde_navigation_table() {
        let mut decoder = EscapeDecoder::new();
        for (seq, key) in [
            (&b"[1~"[..], KeyCode::Home),
            (b"[2~", KeyCode::Insert),
            (b"[3~", KeyCode::Delete),
            (b"[4~", KeyCode::End),
            (b"[5~", KeyCode::PageUp),
            (b"[6~", KeyCode::PageDown),
            (b"[7~", KeyCode::Home),
            (b"[8~", KeyCode::End),
        ] {
            assert_eq!(decode_all(&mut decoder, seq), Decoded::Key(key));
        }
    }

    #[test]
    fn tilde_function_key_banks() {
        let mut decoder = EscapeDecoder::new();
        for (seq, n) in [
            (&b"[10~"[..], 0),
            (b"[11~", 1),
            (b"[12~", 2),
            (b"[13~", 3),
            (b"[14~", 4),
            (b"[15~", 5),
            (b"[17~", 6),
            (b"[18~", 7),
            (b"[19~", 8),
            (b"[20~", 9),
            (b"[21~", 10),
            (b"[23~", 11),
            (b"[24~", 12),
        ] {
            assert_eq!(decode_all(&mut decoder, seq), Decoded::Key(KeyCode::F(n)));
        }
    }

    #[test]
    fn tilde_gaps_are_unsupported() {
        // 16~ and 22~ sit between the function-key banks.
        let mut decoder = EscapeDecoder::new();
        assert_eq!(decode_all(&mut decoder, b"[16~"), Decoded::Unsupported);
        assert_eq!(decode_all(&mut decoder, b"[22~"), Decoded::Unsupported);
        // Three digits never resolve.
        assert_eq!(decode_all(&mut decoder, b"[123~"), Decoded::Unsupported);
        // Multiple parameters never resolve.
        assert_eq!(decode_all(&mut decoder, b"[1;5~"), Decoded::Unsupported);
        // A bare tilde has no parameter to look up.
        assert_eq!(decode_all(&mut decoder, b"[~"), Decoded::Unsupported);
    }

    #[test]
    fn cursor_report_collects_parameters() {
        let mut decoder = EscapeDecoder::new();
        assert_eq!(
            decode_all(&mut decoder, b"[24;80R"),
            Decoded::Key(KeyCode::CursorReport)
        );
        assert_eq!(decoder.params(), ["24", "80"]);
    }

    #[test]
    fn cursor_report_without_parameters_still_resolves() {
        let mut decoder = EscapeDecoder::new();
        assert_eq!(decode_all(&mut decoder, b"[R"), Decoded::Key(KeyCode::CursorReport));
        assert!(decoder.params().is_empty());
    }

    #[test]
    fn non_introducer_after_escape_is_invalid() {
        let mut decoder = EscapeDecoder::new();
        decoder.begin();
        assert_eq!(decoder.feed(b'x'), Decoded::Invalid);
        assert_eq!(decoder.take_replay(), vec![control::ESC, b'x']);
        assert!(!decoder.pending());
    }

    #[test]
    fn unmapped_ss3_replays_all_bytes() {
        let mut decoder = EscapeDecoder::new();
        assert_eq!(decode_all(&mut decoder, b"OZ"), Decoded::Unsupported);
        assert_eq!(decoder.take_replay(), vec![control::ESC, b'O', b'Z']);
    }

    #[test]
    fn intermediate_bytes_block_tilde_resolution() {
        let mut decoder = EscapeDecoder::new();
        assert_eq!(decode_all(&mut decoder, b"[<5~"), Decoded::Unsupported);
    }

    #[test]
    fn unknown_csi_final_byte_is_unsupported() {
        let mut decoder = EscapeDecoder::new();
        assert_eq!(decode_all(&mut decoder, b"[5m"), Decoded::Unsupported);
        assert_eq!(decoder.take_replay(), vec![control::ESC, b'[', b'5', b'm']);
    }

    #[test]
    fn csi_byte_outside_final_range_is_invalid() {
        let mut decoder = EscapeDecoder::new();
        decoder.begin();
        assert_eq!(decoder.feed(b'['), Decoded::Incomplete);
        assert_eq!(decoder.feed(0x07), Decoded::Invalid);
        assert_eq!(decoder.take_replay(), vec![control::ESC, b'[', 0x07]);
    }

    #[test]
    fn one_byte_short_is_incomplete() {
        let mut decoder = EscapeDecoder::new();
        for seq in [&b"["[..], b"O", b"[2", b"[24;80", b"[1"] {
            decoder.reset();
            decoder.begin();
            for &b in seq {
                assert_eq!(
                    decoder.feed(b),
                    Decoded::Incomplete,
                    "prefix {seq:?} must stay incomplete"
                );
            }
            assert!(decoder.pending());
        }
    }

    #[test]
    fn length_cap_forces_invalid() {
        let mut decoder = EscapeDecoder::new();
        decoder.begin();
        assert_eq!(decoder.feed(b'['), Decoded::Incomplete);
        let mut out = Decoded::Incomplete;
        for _ in 0..MAX_SEQUENCE_LEN {
            out = decoder.feed(b';');
            if out != Decoded::Incomplete {
                break;
            }
        }
        assert_eq!(out, Decoded::Invalid);
        let replay = decoder.take_replay();
        assert_eq!(replay.len(), MAX_SEQUENCE_LEN + 1);
        assert_eq!(replay[0], control::ESC);
    }

    #[test]
    fn reset_clears_everything() {
        let mut decoder = EscapeDecoder::new();
        decoder.begin();
        assert_eq!(decoder.feed(b'['), Decoded::Incomplete);
        assert_eq!(decoder.feed(b'9'), Decoded::Incomplete);
        decoder.reset();
        assert!(!decoder.pending());
        assert!(decoder.params().is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Arbitrary byte soup never panics and never leaves the
            /// decoder pending after a non-incomplete outcome is handled
            /// the way the loop handles it.
            #[test]
            fn feed_never_panics(bytes in proptest::collection::vec(any::<u8>(), 1..64)) {
                let mut decoder = EscapeDecoder::new();
                decoder.begin();
                for b in bytes {
                    if !decoder.pending() {
                        decoder.begin();
                    }
                    match decoder.feed(b) {
                        Decoded::Incomplete => {}
                        Decoded::Key(_) => decoder.reset(),
                        Decoded::Invalid | Decoded::Unsupported => {
                            let replay = decoder.take_replay();
                            prop_assert!(!replay.is_empty());
                            prop_assert_eq!(replay[0], control::ESC);
                        }
                    }
                }
            }

            /// The pending buffer never exceeds the cap plus the final byte.
            #[test]
            fn buffer_stays_bounded(bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
                let mut decoder = EscapeDecoder::new();
                decoder.begin();
                for b in bytes {
                    if !decoder.pending() {
                        decoder.begin();
                    }
                    if decoder.feed(b) != Decoded::Incomplete {
                        prop_assert!(decoder.take_replay().len() <= MAX_SEQUENCE_LEN + 1);
                    }
                }
            }
        }
    }
}
