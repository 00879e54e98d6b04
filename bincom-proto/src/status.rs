//! Status byte carried in the second position of every frame.

/// Status codes understood by both ends of the link.
///
/// Requests always carry [`Status::Ok`]. Replies carry `Ok` with the return
/// value as payload, or one of the error codes with an empty payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Action performed successfully.
    Ok = 0x00,
    /// Device is busy with another action.
    Busy = 0x01,
    /// Action failed for an undefined cause.
    Error = 0x02,
    /// Unknown function id.
    UndefinedFunction = 0x03,
    /// Payload length does not match the command's argument format.
    ByteCount = 0x04,
    /// Ill-formed frame header on the serial line.
    Communication = 0x05,
    /// Reserved, never emitted by the device.
    Checksum = 0x06,
    /// An argument is outside its allowed range.
    Value = 0x07,
}

impl Status {
    /// All status codes, indexed by their wire value.
    pub const ALL: [Status; 8] = [
        Status::Ok,
        Status::Busy,
        Status::Error,
        Status::UndefinedFunction,
        Status::ByteCount,
        Status::Communication,
        Status::Checksum,
        Status::Value,
    ];

    /// Decode a status byte.
    #[inline]
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        if (byte as usize) < Self::ALL.len() {
            Some(Self::ALL[byte as usize])
        } else {
            None
        }
    }

    /// Wire value of this status.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for [`Status::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Canonical identifier, as used in device firmware headers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Status::Ok => "STATUS_OK",
            Status::Busy => "STATUS_BUSY",
            Status::Error => "STATUS_ERROR",
            Status::UndefinedFunction => "UNDEFINED_FUNCTION_ERROR",
            Status::ByteCount => "BYTE_COUNT_ERROR",
            Status::Communication => "COMMUNICATION_ERROR",
            Status::Checksum => "CHECKSUM_ERROR",
            Status::Value => "VALUE_ERROR",
        }
    }

    /// Human readable explanation for host-side error reports.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Status::Ok => "action performed successfully",
            Status::Busy => "device is busy with another action",
            Status::Error => "action failed for undefined cause",
            Status::UndefinedFunction => "unknown function code (check command_count)",
            Status::ByteCount => {
                "incorrect size for the provided arguments (check the command's argument format)"
            }
            Status::Communication => "ill-formed message on the communication port",
            Status::Checksum => "checksum mismatch (not used)",
            Status::Value => "the provided arguments are outside the allowed range",
        }
    }
}

impl From<Status> for u8 {
    #[inline]
    fn from(status: Status) -> Self {
        status.as_u8()
    }
}

impl TryFrom<u8> for Status {
    type Error = u8;

    /// Returns the unrecognised byte on failure.
    fn try_from(byte: u8) -> Result<Self, u8> {
        Self::from_u8(byte).ok_or(byte)
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_wire_values() {
        assert_eq!(Status::Ok.as_u8(), 0x00);
        assert_eq!(Status::Busy.as_u8(), 0x01);
        assert_eq!(Status::Error.as_u8(), 0x02);
        assert_eq!(Status::UndefinedFunction.as_u8(), 0x03);
        assert_eq!(Status::ByteCount.as_u8(), 0x04);
        assert_eq!(Status::Communication.as_u8(), 0x05);
        assert_eq!(Status::Checksum.as_u8(), 0x06);
        assert_eq!(Status::Value.as_u8(), 0x07);
    }

    #[test]
    fn test_from_u8_matches_table() {
        for (i, status) in Status::ALL.iter().enumerate() {
            assert_eq!(Status::from_u8(i as u8), Some(*status));
        }
        assert_eq!(Status::from_u8(0x08), None);
        assert_eq!(Status::from_u8(0xFF), None);
    }

    #[test]
    fn test_try_from_returns_unknown_byte() {
        assert_eq!(Status::try_from(0x07), Ok(Status::Value));
        assert_eq!(Status::try_from(0x42), Err(0x42));
    }

    #[test]
    fn test_display_uses_name() {
        assert_eq!(Status::ByteCount.to_string(), "BYTE_COUNT_ERROR");
        assert_eq!(Status::Ok.to_string(), "STATUS_OK");
    }

    #[test]
    fn test_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(!Status::Value.is_ok());
    }
}
