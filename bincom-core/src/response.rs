//! Reply frame encoder.

use bincom_proto::{FrameHeader, Status, HEADER_LEN};

use crate::ring::FrameBuffer;

/// Error type for reply encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseError {
    /// Payload longer than 255 bytes.
    PayloadTooLarge,
    /// Not enough free outbound space for the whole frame; nothing was queued.
    Overflow,
}

impl core::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "reply payload too large"),
            Self::Overflow => write!(f, "outbound buffer overflow, reply dropped"),
        }
    }
}

/// A dropped reply surfaces to the host as `STATUS_ERROR`.
impl From<ResponseError> for Status {
    fn from(_: ResponseError) -> Self {
        Status::Error
    }
}

/// Queues reply frames into the outbound buffer.
///
/// A frame is queued whole or not at all: when it does not fit in the free
/// outbound space it is dropped and [`ResponseError::Overflow`] is returned.
pub struct Responder<'a> {
    outbound: &'a mut FrameBuffer,
    sent: usize,
}

impl<'a> Responder<'a> {
    pub fn new(outbound: &'a mut FrameBuffer) -> Self {
        Self { outbound, sent: 0 }
    }

    /// Number of frames queued through this responder.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Queue `marker, status, length, payload`.
    pub fn send(&mut self, payload: &[u8], status: Status) -> Result<(), ResponseError> {
        let Ok(length) = u8::try_from(payload.len()) else {
            warn!("reply dropped: payload of {} bytes", payload.len());
            return Err(ResponseError::PayloadTooLarge);
        };
        let frame_len = HEADER_LEN + payload.len();
        if frame_len > self.outbound.free() {
            warn!(
                "reply dropped: {} bytes, {} free",
                frame_len,
                self.outbound.free()
            );
            return Err(ResponseError::Overflow);
        }

        self.outbound
            .try_extend(&FrameHeader::new(status, length).to_bytes())
            .and_then(|()| self.outbound.try_extend(payload))
            .map_err(|_| ResponseError::Overflow)?;
        self.sent += 1;
        trace!("reply: status {} length {}", status, length);
        Ok(())
    }

    /// Queue a `STATUS_OK` frame carrying `payload`.
    #[inline]
    pub fn send_ok(&mut self, payload: &[u8]) -> Result<(), ResponseError> {
        self.send(payload, Status::Ok)
    }

    /// Queue a `STATUS_OK` frame carrying the UTF-8 bytes of `s`.
    #[inline]
    pub fn send_str(&mut self, s: &str) -> Result<(), ResponseError> {
        self.send(s.as_bytes(), Status::Ok)
    }

    /// Queue a bodyless frame, used for acknowledgments and errors.
    #[inline]
    pub fn send_status(&mut self, status: Status) -> Result<(), ResponseError> {
        self.send(&[], status)
    }
}
