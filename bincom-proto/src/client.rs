//! Blocking host-side client.
//!
//! Speaks the request/reply protocol over any [`embedded_io`] transport: a
//! serial port on the host, or a mock in tests. Every call sends exactly one
//! request frame and reads exactly one reply frame.
//!
//! # Example
//!
//! ```no_run
//! # fn demo<T: embedded_io::Read + embedded_io::Write>(port: T) {
//! use bincom_proto::{Client, Value};
//!
//! let mut client = Client::new(port);
//! let count = client.command_count().ok();
//! let signature = client.describe(2).ok();
//! let reply = client.call(2, "B", &[Value::U8(1)], "").ok();
//! # }
//! ```

use embedded_io::{Read, ReadExactError, Write};
use heapless::{String, Vec};

use crate::format::{pack, unpack, FormatError, Value, MAX_VALUES};
use crate::frame::{
    encode_frame, encode_request, FrameError, FrameHeader, HEADER_LEN, MAX_FRAME_SIZE,
    MAX_PAYLOAD_SIZE,
};
use crate::status::Status;

/// Function id of the built-in command that returns the command count.
pub const COMMAND_COUNT_ID: u8 = 0x00;

/// Function id of the built-in command that returns command names and formats.
pub const COMMAND_NAMES_ID: u8 = 0x01;

/// Text field returned by the introspection command.
pub type Name = String<MAX_PAYLOAD_SIZE>;

/// Errors returned by [`Client`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientError<E> {
    /// Transport error.
    Io(E),
    /// Transport closed in the middle of a reply.
    UnexpectedEof,
    /// Reply did not start with the frame marker.
    InvalidMarker(u8),
    /// Reply carried a status byte outside the known set.
    UnknownStatus(u8),
    /// Device answered with an error status.
    Device(Status),
    /// Arguments or reply did not match the declared format.
    Format(FormatError),
    /// Request could not be framed.
    Frame(FrameError),
    /// Reply payload larger than the caller's buffer.
    BufferTooSmall,
    /// String reply was not valid UTF-8.
    Utf8,
}

impl<E> From<FormatError> for ClientError<E> {
    fn from(err: FormatError) -> Self {
        ClientError::Format(err)
    }
}

impl<E> From<FrameError> for ClientError<E> {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::InvalidMarker(b) => ClientError::InvalidMarker(b),
            FrameError::UnknownStatus(b) => ClientError::UnknownStatus(b),
            other => ClientError::Frame(other),
        }
    }
}

impl<E> From<ReadExactError<E>> for ClientError<E> {
    fn from(err: ReadExactError<E>) -> Self {
        match err {
            ReadExactError::UnexpectedEof => ClientError::UnexpectedEof,
            ReadExactError::Other(e) => ClientError::Io(e),
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for ClientError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "transport error: {:?}", e),
            Self::UnexpectedEof => write!(f, "unexpected end of stream"),
            Self::InvalidMarker(b) => {
                write!(f, "answer does not start with a frame marker (0x{:02X})", b)
            }
            Self::UnknownStatus(b) => write!(f, "unknown status 0x{:02X}", b),
            Self::Device(status) => write!(f, "{}, {}", status.name(), status.description()),
            Self::Format(e) => write!(f, "{}", e),
            Self::Frame(e) => write!(f, "{}", e),
            Self::BufferTooSmall => write!(f, "reply buffer too small"),
            Self::Utf8 => write!(f, "reply is not valid UTF-8"),
        }
    }
}

/// Return format of a command whose reply payload is a single string.
pub const STRING_FORMAT: &str = "s";

/// Decoded reply of [`Client::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Values decoded per the return format.
    Values(Vec<Value, MAX_VALUES>),
    /// Whole payload of a command returning [`STRING_FORMAT`].
    Text(Name),
}

impl Reply {
    /// Decoded values, or `None` for a text reply.
    #[must_use]
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Reply::Values(values) => Some(values.as_slice()),
            Reply::Text(_) => None,
        }
    }

    /// Reply text, or `None` for a value reply.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text.as_str()),
            Reply::Values(_) => None,
        }
    }
}

/// Name and formats of one device command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSignature {
    pub name: Name,
    pub args: Name,
    pub returns: Name,
}

/// Request/reply client over a blocking byte transport.
pub struct Client<T> {
    io: T,
}

impl<T: Read + Write> Client<T> {
    /// Wrap a transport.
    #[must_use]
    pub fn new(io: T) -> Self {
        Self { io }
    }

    /// Get a mutable reference to the transport.
    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.io
    }

    /// Send a bodyless frame; the device acknowledges with `STATUS_OK`.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; a device answering with an error status yields
    /// [`ClientError::Device`].
    pub fn ping(&mut self) -> Result<(), ClientError<T::Error>> {
        let mut frame = [0u8; HEADER_LEN];
        let len = encode_frame(Status::Ok, &[], &mut frame)?;
        self.send(&frame[..len])?;
        self.receive(&mut [])?;
        Ok(())
    }

    /// Call `function_id` with pre-packed `args`, reading the reply payload
    /// into `reply`.
    ///
    /// Returns the reply payload length.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`].
    pub fn transact(
        &mut self,
        function_id: u8,
        args: &[u8],
        reply: &mut [u8],
    ) -> Result<usize, ClientError<T::Error>> {
        let mut frame = [0u8; MAX_FRAME_SIZE];
        let len = encode_request(function_id, args, &mut frame)?;
        self.send(&frame[..len])?;
        self.receive(reply)
    }

    /// Call `function_id`, packing `values` per `args_format` and decoding
    /// the reply per `returns_format`.
    ///
    /// A return format of [`STRING_FORMAT`] yields [`Reply::Text`] holding the
    /// whole payload; any other format yields [`Reply::Values`].
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; mismatched values or replies yield
    /// [`ClientError::Format`], a text reply that is not UTF-8 yields
    /// [`ClientError::Utf8`].
    pub fn call(
        &mut self,
        function_id: u8,
        args_format: &str,
        values: &[Value],
        returns_format: &str,
    ) -> Result<Reply, ClientError<T::Error>> {
        let mut args = [0u8; MAX_PAYLOAD_SIZE];
        let args_len = pack(args_format, values, &mut args)?;
        let mut reply = [0u8; MAX_PAYLOAD_SIZE];
        let reply_len = self.transact(function_id, &args[..args_len], &mut reply)?;
        let payload = &reply[..reply_len];

        if returns_format == STRING_FORMAT {
            Ok(Reply::Text(decode_text(payload)?))
        } else {
            Ok(Reply::Values(unpack(returns_format, payload)?))
        }
    }

    /// Number of commands registered on the device, built-ins included.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`].
    pub fn command_count(&mut self) -> Result<u8, ClientError<T::Error>> {
        let mut reply = [0u8; 1];
        let len = self.transact(COMMAND_COUNT_ID, &[], &mut reply)?;
        if len != 1 {
            return Err(ClientError::Format(FormatError::LengthMismatch));
        }
        Ok(reply[0])
    }

    /// Name (`slot` 0), argument format (1) or return format (2) of a command.
    ///
    /// # Errors
    ///
    /// [`ClientError::Device`] with `UNDEFINED_FUNCTION_ERROR` or
    /// `VALUE_ERROR` for an unknown id or slot.
    pub fn command_name(
        &mut self,
        function_id: u8,
        slot: u8,
    ) -> Result<Name, ClientError<T::Error>> {
        let mut reply = [0u8; MAX_PAYLOAD_SIZE];
        let len = self.transact(COMMAND_NAMES_ID, &[function_id, slot], &mut reply)?;
        decode_text(&reply[..len])
    }

    /// Fetch the name and both formats of a command.
    ///
    /// # Errors
    ///
    /// Same as [`Client::command_name`].
    pub fn describe(&mut self, function_id: u8) -> Result<CommandSignature, ClientError<T::Error>> {
        Ok(CommandSignature {
            name: self.command_name(function_id, 0)?,
            args: self.command_name(function_id, 1)?,
            returns: self.command_name(function_id, 2)?,
        })
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), ClientError<T::Error>> {
        self.io.write_all(frame).map_err(ClientError::Io)?;
        self.io.flush().map_err(ClientError::Io)
    }

    /// Read one reply frame. The whole payload is always consumed so the
    /// stream stays aligned on frame boundaries, even on error.
    fn receive(&mut self, reply: &mut [u8]) -> Result<usize, ClientError<T::Error>> {
        let mut header = [0u8; HEADER_LEN];
        self.io.read_exact(&mut header)?;
        let header = FrameHeader::from_bytes(header);
        let status = header.validate()?;

        let len = header.length as usize;
        if len > reply.len() {
            self.discard(len)?;
            return Err(if status.is_ok() {
                ClientError::BufferTooSmall
            } else {
                ClientError::Device(status)
            });
        }
        self.io.read_exact(&mut reply[..len])?;

        if status.is_ok() {
            Ok(len)
        } else {
            Err(ClientError::Device(status))
        }
    }

    fn discard(&mut self, mut len: usize) -> Result<(), ClientError<T::Error>> {
        let mut scratch = [0u8; 16];
        while len > 0 {
            let chunk = len.min(scratch.len());
            self.io.read_exact(&mut scratch[..chunk])?;
            len -= chunk;
        }
        Ok(())
    }
}

fn decode_text<E>(payload: &[u8]) -> Result<Name, ClientError<E>> {
    let text = core::str::from_utf8(payload).map_err(|_| ClientError::Utf8)?;
    let mut name = Name::new();
    name.push_str(text).map_err(|_| ClientError::BufferTooSmall)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::convert::Infallible;
    use std::collections::VecDeque;
    use std::vec::Vec as StdVec;

    /// Transport replaying scripted device output and recording host writes.
    struct ScriptedPort {
        replies: VecDeque<u8>,
        written: StdVec<u8>,
    }

    impl ScriptedPort {
        fn new(replies: &[u8]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                written: StdVec::new(),
            }
        }
    }

    impl embedded_io::ErrorType for ScriptedPort {
        type Error = Infallible;
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut n = 0;
            while n < buf.len() {
                match self.replies.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_command_count_request_and_reply() {
        let mut client = Client::new(ScriptedPort::new(&[b'b', 0x00, 0x01, 0x05]));
        assert_eq!(client.command_count(), Ok(5));
        assert_eq!(client.into_inner().written, [b'b', 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_command_name_invalid_slot() {
        let mut client = Client::new(ScriptedPort::new(&[b'b', 0x07, 0x00]));
        assert_eq!(
            client.command_name(1, 3),
            Err(ClientError::Device(Status::Value))
        );
        assert_eq!(client.into_inner().written, [b'b', 0x00, 0x03, 0x01, 0x01, 0x03]);
    }

    #[test]
    fn test_describe_reads_three_slots() {
        let mut replies = StdVec::new();
        replies.extend_from_slice(&[b'b', 0x00, 0x09]);
        replies.extend_from_slice(b"heartbeat");
        replies.extend_from_slice(&[b'b', 0x00, 0x00]);
        replies.extend_from_slice(&[b'b', 0x00, 0x00]);

        let mut client = Client::new(ScriptedPort::new(&replies));
        let signature = client.describe(2).unwrap();
        assert_eq!(signature.name.as_str(), "heartbeat");
        assert_eq!(signature.args.as_str(), "");
        assert_eq!(signature.returns.as_str(), "");
    }

    #[test]
    fn test_call_packs_and_unpacks() {
        let reply = [b'b', 0x00, 0x04, 0xE8, 0x03, 0x00, 0x00];
        let mut client = Client::new(ScriptedPort::new(&reply));
        let reply = client.call(4, "H", &[Value::U16(0x0201)], "I").unwrap();
        assert_eq!(reply.values(), Some(&[Value::U32(1000)][..]));
        assert_eq!(reply.as_str(), None);
        assert_eq!(client.into_inner().written, [b'b', 0x00, 0x03, 0x04, 0x01, 0x02]);
    }

    #[test]
    fn test_call_string_reply() {
        let mut script = StdVec::new();
        script.extend_from_slice(&[b'b', 0x00, 0x05]);
        script.extend_from_slice(b"0.1.0");
        let mut client = Client::new(ScriptedPort::new(&script));

        let reply = client.call(8, "", &[], STRING_FORMAT).unwrap();
        assert_eq!(reply.as_str(), Some("0.1.0"));
        assert_eq!(reply.values(), None);
        assert_eq!(client.into_inner().written, [b'b', 0x00, 0x01, 0x08]);
    }

    #[test]
    fn test_call_empty_string_reply() {
        let mut client = Client::new(ScriptedPort::new(&[b'b', 0x00, 0x00]));
        let reply = client.call(8, "", &[], "s").unwrap();
        assert_eq!(reply, Reply::Text(Name::new()));
    }

    #[test]
    fn test_call_string_reply_not_utf8() {
        let mut client = Client::new(ScriptedPort::new(&[b'b', 0x00, 0x02, 0xFF, 0xFE]));
        assert_eq!(client.call(8, "", &[], "s"), Err(ClientError::Utf8));
    }

    #[test]
    fn test_call_rejects_bad_arguments_before_sending() {
        let mut client = Client::new(ScriptedPort::new(&[]));
        assert_eq!(
            client.call(4, "H", &[Value::U8(1)], ""),
            Err(ClientError::Format(FormatError::TypeMismatch { index: 0 }))
        );
        assert!(client.into_inner().written.is_empty());
    }

    #[test]
    fn test_ping() {
        let mut client = Client::new(ScriptedPort::new(&[b'b', 0x00, 0x00]));
        assert_eq!(client.ping(), Ok(()));
        assert_eq!(client.into_inner().written, [b'b', 0x00, 0x00]);
    }

    #[test]
    fn test_invalid_marker() {
        let mut client = Client::new(ScriptedPort::new(&[b'x', 0x00, 0x00]));
        assert_eq!(client.ping(), Err(ClientError::InvalidMarker(b'x')));
    }

    #[test]
    fn test_unknown_status() {
        let mut client = Client::new(ScriptedPort::new(&[b'b', 0x20, 0x00]));
        assert_eq!(client.ping(), Err(ClientError::UnknownStatus(0x20)));
    }

    #[test]
    fn test_truncated_reply() {
        let mut client = Client::new(ScriptedPort::new(&[b'b', 0x00, 0x04, 0x01]));
        let mut reply = [0u8; 8];
        assert_eq!(
            client.transact(3, &[], &mut reply),
            Err(ClientError::UnexpectedEof)
        );
    }

    #[test]
    fn test_oversized_reply_is_drained() {
        let mut script = StdVec::new();
        script.extend_from_slice(&[b'b', 0x00, 0x04, 1, 2, 3, 4]);
        script.extend_from_slice(&[b'b', 0x00, 0x01, 9]);
        let mut client = Client::new(ScriptedPort::new(&script));

        let mut small = [0u8; 2];
        assert_eq!(
            client.transact(3, &[], &mut small),
            Err(ClientError::BufferTooSmall)
        );
        // The next reply is still frame-aligned
        assert_eq!(client.command_count(), Ok(9));
    }
}
