//! Frame encoding and header decoding.
//!
//! Frame format (both directions):
//! - MARKER (1 byte): `b'b'` synchronization byte
//! - STATUS (1 byte): [`Status`] code, always `STATUS_OK` in requests
//! - LENGTH (1 byte): payload length (0-255)
//! - PAYLOAD (LENGTH bytes): function id and arguments for requests,
//!   return value bytes for replies

use crate::status::Status;

/// Frame synchronization byte.
pub const FRAME_MARKER: u8 = b'b';

/// Header size in bytes (MARKER + STATUS + LENGTH).
pub const HEADER_LEN: usize = 3;

/// Maximum payload size in bytes.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Maximum complete frame size.
pub const MAX_FRAME_SIZE: usize = HEADER_LEN + MAX_PAYLOAD_SIZE;

/// Errors that can occur while encoding a frame or validating a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds 255 bytes.
    PayloadTooLarge,
    /// Output buffer too small for the encoded frame.
    BufferTooSmall,
    /// First header byte is not [`FRAME_MARKER`].
    InvalidMarker(u8),
    /// Status byte is not a known [`Status`].
    UnknownStatus(u8),
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::InvalidMarker(b) => write!(f, "invalid frame marker 0x{:02X}", b),
            Self::UnknownStatus(b) => write!(f, "unknown status 0x{:02X}", b),
        }
    }
}

/// The three raw header bytes of a frame.
///
/// Fields are kept raw so that each check can be reported on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    pub marker: u8,
    pub status: u8,
    pub length: u8,
}

impl FrameHeader {
    /// Header for a frame with the given status and payload length.
    #[inline]
    #[must_use]
    pub const fn new(status: Status, length: u8) -> Self {
        Self {
            marker: FRAME_MARKER,
            status: status.as_u8(),
            length,
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            marker: bytes[0],
            status: bytes[1],
            length: bytes[2],
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_bytes(self) -> [u8; HEADER_LEN] {
        [self.marker, self.status, self.length]
    }

    /// Returns `true` if the first byte is the frame marker.
    #[inline]
    #[must_use]
    pub const fn has_valid_marker(&self) -> bool {
        self.marker == FRAME_MARKER
    }

    /// Decoded status, if the status byte is known.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> Option<Status> {
        Status::from_u8(self.status)
    }

    /// Check marker and status byte, returning the decoded status.
    ///
    /// # Errors
    ///
    /// [`FrameError::InvalidMarker`] or [`FrameError::UnknownStatus`].
    pub fn validate(&self) -> Result<Status, FrameError> {
        if !self.has_valid_marker() {
            return Err(FrameError::InvalidMarker(self.marker));
        }
        self.status().ok_or(FrameError::UnknownStatus(self.status))
    }
}

/// Encode a complete frame into `buf`.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// [`FrameError::PayloadTooLarge`] if the payload exceeds 255 bytes,
/// [`FrameError::BufferTooSmall`] if `buf` cannot hold the frame.
pub fn encode_frame(status: Status, payload: &[u8], buf: &mut [u8]) -> Result<usize, FrameError> {
    let length = u8::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge)?;
    let frame_len = HEADER_LEN + payload.len();
    if buf.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    buf[..HEADER_LEN].copy_from_slice(&FrameHeader::new(status, length).to_bytes());
    buf[HEADER_LEN..frame_len].copy_from_slice(payload);
    Ok(frame_len)
}

/// Encode a request frame calling `function_id` with pre-packed `args`.
///
/// # Errors
///
/// Same as [`encode_frame`]; the payload is `1 + args.len()` bytes.
pub fn encode_request(function_id: u8, args: &[u8], buf: &mut [u8]) -> Result<usize, FrameError> {
    if args.len() >= MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }
    let frame_len = HEADER_LEN + 1 + args.len();
    if buf.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    buf[..HEADER_LEN]
        .copy_from_slice(&FrameHeader::new(Status::Ok, (1 + args.len()) as u8).to_bytes());
    buf[HEADER_LEN] = function_id;
    buf[HEADER_LEN + 1..frame_len].copy_from_slice(args);
    Ok(frame_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_status_only_frame() {
        let mut buf = [0u8; 8];
        let len = encode_frame(Status::Value, &[], &mut buf).unwrap();
        assert_eq!(len, 3);
        assert_eq!(&buf[..3], &[FRAME_MARKER, 0x07, 0x00]);
    }

    #[test]
    fn test_encode_frame_with_payload() {
        let mut buf = [0u8; 8];
        let len = encode_frame(Status::Ok, &[0x2A, 0x01], &mut buf).unwrap();
        assert_eq!(&buf[..len], &[b'b', 0x00, 0x02, 0x2A, 0x01]);
    }

    #[test]
    fn test_encode_frame_buffer_too_small() {
        let mut buf = [0u8; 4];
        assert_eq!(
            encode_frame(Status::Ok, &[1, 2], &mut buf),
            Err(FrameError::BufferTooSmall)
        );
    }

    #[test]
    fn test_encode_frame_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        let mut buf = [0u8; MAX_FRAME_SIZE + 1];
        assert_eq!(
            encode_frame(Status::Ok, &payload, &mut buf),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_encode_max_payload_fits_max_frame() {
        let payload = [0xAB; MAX_PAYLOAD_SIZE];
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = encode_frame(Status::Ok, &payload, &mut buf).unwrap();
        assert_eq!(len, MAX_FRAME_SIZE);
        assert_eq!(buf[2], 255);
    }

    #[test]
    fn test_encode_request_prefixes_function_id() {
        let mut buf = [0u8; 8];
        let len = encode_request(0x01, &[0x04, 0x02], &mut buf).unwrap();
        assert_eq!(&buf[..len], &[b'b', 0x00, 0x03, 0x01, 0x04, 0x02]);
    }

    #[test]
    fn test_encode_request_without_args() {
        let mut buf = [0u8; 4];
        let len = encode_request(0x00, &[], &mut buf).unwrap();
        assert_eq!(&buf[..len], &[b'b', 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_header_validate() {
        let ok = FrameHeader::from_bytes([b'b', 0x04, 0]);
        assert_eq!(ok.validate(), Ok(Status::ByteCount));

        let bad_marker = FrameHeader::from_bytes([b'x', 0x00, 0]);
        assert_eq!(bad_marker.validate(), Err(FrameError::InvalidMarker(b'x')));

        let bad_status = FrameHeader::from_bytes([b'b', 0x10, 0]);
        assert_eq!(bad_status.validate(), Err(FrameError::UnknownStatus(0x10)));
    }

    #[test]
    fn test_header_bytes_roundtrip() {
        let header = FrameHeader::new(Status::Busy, 9);
        assert_eq!(FrameHeader::from_bytes(header.to_bytes()), header);
        assert!(header.has_valid_marker());
        assert_eq!(header.status(), Some(Status::Busy));
    }
}
