//! Framing state machine.
//!
//! The parser only runs once enough bytes are buffered for its current state,
//! so every step inspects a complete span: three header bytes, then the whole
//! payload.

use bincom_proto::{FrameHeader, Status, HEADER_LEN};

use crate::ring::RingBuffer;

/// Where the parser is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Waiting for a 3-byte header.
    #[default]
    AwaitingHeader,
    /// Header accepted, waiting for `wait` payload bytes.
    AwaitingPayload { wait: u8 },
}

impl ParserState {
    /// Buffered bytes required before the next step may run.
    #[inline]
    #[must_use]
    pub const fn wait_count(&self) -> usize {
        match self {
            ParserState::AwaitingHeader => HEADER_LEN,
            ParserState::AwaitingPayload { wait } => *wait as usize,
        }
    }
}

/// A complete request frame, still sitting in the inbound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    pub function_id: u8,
    /// Payload length from the header, function id included.
    pub length: u8,
    /// Inbound buffer position of the first argument byte.
    pub args_position: usize,
}

/// Outcome of one [`FrameParser::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Not enough bytes buffered yet.
    Waiting,
    /// Malformed header; the inbound buffer was flushed. Each flag set calls
    /// for its own `COMMUNICATION_ERROR` reply.
    Rejected { bad_marker: bool, bad_status: bool },
    /// Valid header with zero length; reply `STATUS_OK`.
    Acknowledge,
    /// Valid header, now waiting for this many payload bytes.
    AwaitPayload(u8),
    /// Payload complete. Dispatch it, then call [`FrameParser::finish`].
    Message(Message),
}

/// Turns the inbound byte stream into [`Message`]s.
#[derive(Debug, Default)]
pub struct FrameParser {
    state: ParserState,
}

impl FrameParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::AwaitingHeader,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> ParserState {
        self.state
    }

    /// Bytes that must be buffered before [`advance`](Self::advance) does
    /// anything.
    #[inline]
    #[must_use]
    pub const fn wait_count(&self) -> usize {
        self.state.wait_count()
    }

    /// Run one parsing step against the inbound buffer.
    pub fn advance<const N: usize>(&mut self, inbound: &mut RingBuffer<N>) -> Step {
        if inbound.len() < self.wait_count() {
            return Step::Waiting;
        }

        match self.state {
            ParserState::AwaitingHeader => self.read_header(inbound),
            ParserState::AwaitingPayload { wait } => {
                // wait >= 1, so the function id is buffered
                let function_id = inbound.pop().unwrap_or_default();
                trace!("frame: function {} length {}", function_id, wait);
                Step::Message(Message {
                    function_id,
                    length: wait,
                    args_position: inbound.read_position(),
                })
            }
        }
    }

    fn read_header<const N: usize>(&mut self, inbound: &mut RingBuffer<N>) -> Step {
        let mut bytes = [0u8; HEADER_LEN];
        for byte in &mut bytes {
            *byte = inbound.pop().unwrap_or_default();
        }
        let header = FrameHeader::from_bytes(bytes);

        // Both checks run even when the first one fails
        let bad_marker = !header.has_valid_marker();
        if bad_marker {
            warn!("frame: bad marker {:#x}", header.marker);
            inbound.clear();
        }
        let bad_status = header.status != Status::Ok.as_u8();
        if bad_status {
            warn!("frame: bad status {:#x}", header.status);
            inbound.clear();
        }
        if bad_marker || bad_status {
            return Step::Rejected {
                bad_marker,
                bad_status,
            };
        }

        if header.length == 0 {
            return Step::Acknowledge;
        }
        self.state = ParserState::AwaitingPayload {
            wait: header.length,
        };
        Step::AwaitPayload(header.length)
    }

    /// Drop whatever is left of the current frame (and anything buffered
    /// after it) and go back to waiting for a header.
    pub fn finish<const N: usize>(&mut self, inbound: &mut RingBuffer<N>) {
        inbound.clear();
        self.state = ParserState::AwaitingHeader;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::FrameBuffer;

    fn buffer_with(bytes: &[u8]) -> FrameBuffer {
        let mut ring = FrameBuffer::new();
        ring.try_extend(bytes).unwrap();
        ring
    }

    #[test]
    fn test_waits_for_full_header() {
        let mut parser = FrameParser::new();
        let mut inbound = buffer_with(&[b'b', 0x00]);
        assert_eq!(parser.wait_count(), 3);
        assert_eq!(parser.advance(&mut inbound), Step::Waiting);
        assert_eq!(inbound.len(), 2);
    }

    #[test]
    fn test_zero_length_is_acknowledged() {
        let mut parser = FrameParser::new();
        let mut inbound = buffer_with(&[b'b', 0x00, 0x00]);
        assert_eq!(parser.advance(&mut inbound), Step::Acknowledge);
        assert_eq!(parser.state(), ParserState::AwaitingHeader);
        assert!(inbound.is_empty());
    }

    #[test]
    fn test_header_then_payload() {
        let mut parser = FrameParser::new();
        let mut inbound = buffer_with(&[b'b', 0x00, 0x03, 0x01]);

        assert_eq!(parser.advance(&mut inbound), Step::AwaitPayload(3));
        assert_eq!(parser.state(), ParserState::AwaitingPayload { wait: 3 });
        assert_eq!(parser.wait_count(), 3);
        assert_eq!(parser.advance(&mut inbound), Step::Waiting);

        inbound.try_extend(&[0x02, 0x00]).unwrap();
        let args_at = inbound.read_position() + 1;
        match parser.advance(&mut inbound) {
            Step::Message(msg) => {
                assert_eq!(msg.function_id, 0x01);
                assert_eq!(msg.length, 3);
                assert_eq!(msg.args_position, args_at);
                assert_eq!(inbound.get(msg.args_position), 0x02);
            }
            other => panic!("expected message, got {:?}", other),
        }

        parser.finish(&mut inbound);
        assert!(inbound.is_empty());
        assert_eq!(parser.state(), ParserState::AwaitingHeader);
    }

    #[test]
    fn test_bad_marker_flushes() {
        let mut parser = FrameParser::new();
        let mut inbound = buffer_with(&[b'x', 0x00, 0x01, 0x00, b'b']);
        assert_eq!(
            parser.advance(&mut inbound),
            Step::Rejected {
                bad_marker: true,
                bad_status: false
            }
        );
        assert!(inbound.is_empty());
        assert_eq!(parser.state(), ParserState::AwaitingHeader);
    }

    #[test]
    fn test_bad_status_flushes() {
        let mut parser = FrameParser::new();
        let mut inbound = buffer_with(&[b'b', 0x02, 0x05, 1, 2]);
        assert_eq!(
            parser.advance(&mut inbound),
            Step::Rejected {
                bad_marker: false,
                bad_status: true
            }
        );
        assert!(inbound.is_empty());
        // The declared length is ignored
        assert_eq!(parser.wait_count(), 3);
    }

    #[test]
    fn test_both_checks_reported() {
        let mut parser = FrameParser::new();
        let mut inbound = buffer_with(&[0xFF, 0xFF, 0x00]);
        assert_eq!(
            parser.advance(&mut inbound),
            Step::Rejected {
                bad_marker: true,
                bad_status: true
            }
        );
    }

    #[test]
    fn test_header_across_wrap() {
        let mut parser = FrameParser::new();
        let mut inbound = FrameBuffer::new();
        for _ in 0..255 {
            inbound.push(0).unwrap();
            inbound.pop();
        }
        inbound.try_extend(&[b'b', 0x00, 0x02, 0x07, 0x09]).unwrap();

        assert_eq!(parser.advance(&mut inbound), Step::AwaitPayload(2));
        match parser.advance(&mut inbound) {
            Step::Message(msg) => {
                assert_eq!(msg.function_id, 0x07);
                assert_eq!(inbound.get(msg.args_position), 0x09);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }
}
