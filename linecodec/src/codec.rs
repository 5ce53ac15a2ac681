//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use super::{CodecError, LineEvent, consts};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// A codec that frames a raw Telnet byte stream into lines.
///
/// `LineCodec` maintains the line in progress and the IAC lookahead state
/// across `decode` calls, so control sequences and line terminators that
/// straddle read boundaries are handled correctly. It is typically used
/// through a `tokio_util::codec::Framed` wrapping one connection's
/// `TcpStream`.
pub struct LineCodec {
    line: Vec<u8>,
    state: DecoderState,
}

impl LineCodec {
    /// Creates a new `LineCodec` with an empty line buffer.
    pub fn new() -> LineCodec {
        LineCodec::default()
    }

    /// Take the accumulated line, decoding it as single-byte ASCII text.
    fn take_line(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();
        text
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        LineCodec {
            line: Vec::new(),
            state: DecoderState::Data,
        }
    }
}

impl Decoder for LineCodec {
    type Item = LineEvent;
    type Error = CodecError;

    /// Decodes bytes from `src` one at a time until a complete line or a
    /// disconnect request is produced, or the buffer runs dry.
    ///
    /// ## States
    ///
    /// - [`DecoderState::Data`]: normal accumulation. CR terminates the
    ///   line and, if another byte is already buffered, consumes it as the
    ///   LF of a CR-LF pair - it does NOT wait for one. LF terminates the
    ///   line. IAC switches to lookahead.
    /// - [`DecoderState::InterpretAsCommand`]: one byte of lookahead after
    ///   IAC. DO yields [`LineEvent::Disconnect`] and abandons the line in
    ///   progress; anything else is discarded and framing resumes.
    ///
    /// A CR that ends the buffer terminates its line immediately; if the
    /// peer's LF arrives in a later read it frames an empty line. The
    /// swallow rule only ever applies to a byte that is already buffered,
    /// never one the framer would have to wait for.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<LineEvent>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();
            match (self.state, byte) {
                (DecoderState::Data, consts::IAC) => {
                    self.state = DecoderState::InterpretAsCommand;
                }
                (DecoderState::Data, consts::CR) => {
                    if src.has_remaining() {
                        src.advance(1);
                    }
                    return Ok(Some(LineEvent::Line(self.take_line())));
                }
                (DecoderState::Data, consts::LF) => {
                    return Ok(Some(LineEvent::Line(self.take_line())));
                }
                (DecoderState::Data, _) => {
                    self.line.push(byte);
                }
                (DecoderState::InterpretAsCommand, consts::DO) => {
                    self.state = DecoderState::Data;
                    self.line.clear();
                    return Ok(Some(LineEvent::Disconnect));
                }
                (DecoderState::InterpretAsCommand, _) => {
                    trace!("Discarding IAC sequence 0xFF 0x{:02X}", byte);
                    self.state = DecoderState::Data;
                }
            }
        }
        Ok(None)
    }

    /// On end of stream any partial line is discarded: the contract is one
    /// terminated line or nothing, and a peer that vanishes mid-line gets
    /// nothing.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<LineEvent>, Self::Error> {
        let event = self.decode(src)?;
        if event.is_none() && !self.line.is_empty() {
            trace!("Discarding {} unterminated bytes at EOF", self.line.len());
            self.line.clear();
        }
        Ok(event)
    }
}

impl Encoder<&str> for LineCodec {
    type Error = CodecError;

    /// Encodes outbound text verbatim as ASCII bytes.
    ///
    /// No line ending is appended: prompts are sent with no terminator
    /// while messages carry an explicit CRLF, so the session layer owns
    /// the distinction.
    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(item.as_bytes());
        Ok(())
    }
}

/// Internal state of the line framer, tracked across `decode` calls.
#[derive(Clone, Copy, Debug)]
enum DecoderState {
    /// Normal data accumulation.
    Data,
    /// Received IAC, next byte is the command lookahead.
    InterpretAsCommand,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Helper Functions
    // ========================================================================

    fn collect_all(codec: &mut LineCodec, mut src: BytesMut) -> Vec<LineEvent> {
        let mut out = Vec::new();
        while let Some(event) = codec.decode(&mut src).expect("decode should not error") {
            out.push(event);
        }
        out
    }

    fn decode_bytes(input: &[u8]) -> Vec<LineEvent> {
        let mut codec = LineCodec::new();
        collect_all(&mut codec, BytesMut::from(input))
    }

    fn line(text: &str) -> LineEvent {
        LineEvent::Line(text.to_string())
    }

    // ========================================================================
    // Decoding Tests - Line Terminators
    // ========================================================================

    #[test]
    fn decode_lf_terminated_line() {
        assert_eq!(decode_bytes(b"help\n"), vec![line("help")]);
    }

    #[test]
    fn decode_cr_terminated_line() {
        assert_eq!(decode_bytes(b"help\r"), vec![line("help")]);
    }

    #[test]
    fn decode_crlf_terminated_line() {
        assert_eq!(decode_bytes(b"help\r\n"), vec![line("help")]);
    }

    #[test]
    fn decode_multiple_lines() {
        assert_eq!(
            decode_bytes(b"one\r\ntwo\nthree\r"),
            vec![line("one"), line("two"), line("three")],
        );
    }

    #[test]
    fn decode_empty_line() {
        assert_eq!(decode_bytes(b"\r\n"), vec![line("")]);
    }

    #[test]
    fn cr_swallows_one_already_buffered_byte() {
        // The byte after CR is consumed whether or not it is LF.
        assert_eq!(decode_bytes(b"hi\rXrest\n"), vec![line("hi"), line("rest")]);
    }

    #[test]
    fn cr_at_buffer_end_does_not_wait_for_lf() {
        let mut codec = LineCodec::new();
        assert_eq!(
            collect_all(&mut codec, BytesMut::from(&b"hi\r"[..])),
            vec![line("hi")],
        );
        // The LF arrives in a later read and frames an empty line.
        assert_eq!(
            collect_all(&mut codec, BytesMut::from(&b"\n"[..])),
            vec![line("")],
        );
    }

    #[test]
    fn decode_empty_buffer() {
        let mut codec = LineCodec::new();
        let mut src = BytesMut::new();
        assert!(codec.decode(&mut src).expect("decode ok").is_none());
    }

    #[test]
    fn partial_line_held_across_reads() {
        let mut codec = LineCodec::new();
        assert!(
            collect_all(&mut codec, BytesMut::from(&b"hel"[..])).is_empty(),
            "no terminator yet",
        );
        assert_eq!(
            collect_all(&mut codec, BytesMut::from(&b"p\r\n"[..])),
            vec![line("help")],
        );
    }

    // ========================================================================
    // Decoding Tests - IAC Handling
    // ========================================================================

    #[test]
    fn iac_do_yields_disconnect() {
        assert_eq!(
            decode_bytes(&[consts::IAC, consts::DO]),
            vec![LineEvent::Disconnect],
        );
    }

    #[test]
    fn iac_do_mid_line_abandons_line_in_progress() {
        assert_eq!(
            decode_bytes(b"par\xFF\xFDtial\r\n"),
            vec![LineEvent::Disconnect, line("tial")],
        );
    }

    #[test]
    fn other_iac_pairs_are_discarded() {
        for verb in [consts::WILL, consts::WONT, consts::DONT] {
            let input = [b'a', b'b', consts::IAC, verb, b'c', b'd', consts::LF];
            assert_eq!(decode_bytes(&input), vec![line("abcd")]);
        }
    }

    #[test]
    fn escaped_iac_is_discarded_not_data() {
        // IAC IAC would be a literal 0xFF under RFC 854; this framer does
        // not negotiate binary and drops the pair like any other.
        assert_eq!(decode_bytes(b"ab\xFF\xFFcd\n"), vec![line("abcd")]);
    }

    #[test]
    fn iac_lookahead_survives_read_boundary() {
        let mut codec = LineCodec::new();
        assert!(collect_all(&mut codec, BytesMut::from(&b"ab\xFF"[..])).is_empty());
        assert_eq!(
            collect_all(&mut codec, BytesMut::from(&b"\xFD"[..])),
            vec![LineEvent::Disconnect],
        );
    }

    // ========================================================================
    // Decoding Tests - End of Stream
    // ========================================================================

    #[test]
    fn eof_discards_partial_line() {
        let mut codec = LineCodec::new();
        let mut src = BytesMut::from(&b"partial"[..]);
        assert!(codec.decode(&mut src).expect("decode ok").is_none());
        assert!(codec.decode_eof(&mut src).expect("decode_eof ok").is_none());
        // A later terminator must not resurrect the discarded fragment.
        assert_eq!(
            collect_all(&mut codec, BytesMut::from(&b"\n"[..])),
            vec![line("")],
        );
    }

    #[test]
    fn eof_still_yields_terminated_line() {
        let mut codec = LineCodec::new();
        let mut src = BytesMut::from(&b"last\n"[..]);
        assert_eq!(
            codec.decode_eof(&mut src).expect("decode_eof ok"),
            Some(line("last")),
        );
    }

    // ========================================================================
    // Encoding Tests
    // ========================================================================

    fn encode_str(text: &str) -> BytesMut {
        let mut codec = LineCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(text, &mut dst).expect("encode ok");
        dst
    }

    #[test]
    fn encode_is_verbatim() {
        assert_eq!(&encode_str("Login: ")[..], b"Login: ");
    }

    #[test]
    fn encode_does_not_append_line_ending() {
        assert_eq!(&encode_str("> ")[..], b"> ");
        assert_eq!(&encode_str("Goodbye!\r\n")[..], b"Goodbye!\r\n");
    }

    #[test]
    fn encode_empty_string() {
        assert_eq!(&encode_str("")[..], b"");
    }
}
