//! Compact argument format strings and little-endian value packing.
//!
//! Every command declares its arguments and its return value as a string with
//! one character per value:
//!
//! | Chars         | Type           | Bytes |
//! |---------------|----------------|-------|
//! | `B`, `b`, `c` | u8, i8, char   | 1     |
//! | `h`, `H`      | i16, u16       | 2     |
//! | `i`, `I`, `f` | i32, u32, f32  | 4     |
//! | `d`, `l`, `L` | f64, i64, u64  | 8     |
//!
//! Other characters have width 0. A return format of `s` means the whole reply
//! payload is a string.

/// Maximum number of values [`unpack`] decodes from one reply.
pub const MAX_VALUES: usize = 32;

/// Byte width of a single format character (0 if unrecognised).
#[inline]
#[must_use]
pub const fn char_width(c: u8) -> usize {
    match c {
        b'B' | b'b' | b'c' => 1,
        b'h' | b'H' => 2,
        b'i' | b'I' | b'f' => 4,
        b'd' | b'l' | b'L' => 8,
        _ => 0,
    }
}

/// Number of argument bytes a format string describes.
///
/// # Example
///
/// ```
/// use bincom_proto::required_bytes;
///
/// assert_eq!(required_bytes("BBI"), 6);
/// assert_eq!(required_bytes(""), 0);
/// ```
#[must_use]
pub const fn required_bytes(format: &str) -> usize {
    let bytes = format.as_bytes();
    let mut total = 0;
    let mut i = 0;
    while i < bytes.len() {
        total += char_width(bytes[i]);
        i += 1;
    }
    total
}

/// Errors raised while packing or unpacking values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Number of values differs from the number of format characters.
    ArgumentCount,
    /// Value at `index` does not match its format character.
    TypeMismatch { index: usize },
    /// Output buffer too small.
    BufferTooSmall,
    /// Byte count differs from what the format requires.
    LengthMismatch,
    /// More than [`MAX_VALUES`] values in one format.
    TooManyValues,
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ArgumentCount => write!(f, "argument count does not match format"),
            Self::TypeMismatch { index } => write!(f, "argument {} does not match format", index),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::LengthMismatch => write!(f, "byte count does not match format"),
            Self::TooManyValues => write!(f, "too many values"),
        }
    }
}

/// A single typed argument or return value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    U8(u8),
    I8(i8),
    Char(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
    I64(i64),
    U64(u64),
}

impl Value {
    /// Format character describing this value.
    #[must_use]
    pub const fn format_char(&self) -> u8 {
        match self {
            Value::U8(_) => b'B',
            Value::I8(_) => b'b',
            Value::Char(_) => b'c',
            Value::I16(_) => b'h',
            Value::U16(_) => b'H',
            Value::I32(_) => b'i',
            Value::U32(_) => b'I',
            Value::F32(_) => b'f',
            Value::F64(_) => b'd',
            Value::I64(_) => b'l',
            Value::U64(_) => b'L',
        }
    }

    /// Encoded size in bytes.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        char_width(self.format_char())
    }

    /// Write the little-endian encoding into `out`, returning the byte count.
    fn write_le(&self, out: &mut [u8]) -> usize {
        match *self {
            Value::U8(v) | Value::Char(v) => copy_into(out, &[v]),
            Value::I8(v) => copy_into(out, &v.to_le_bytes()),
            Value::I16(v) => copy_into(out, &v.to_le_bytes()),
            Value::U16(v) => copy_into(out, &v.to_le_bytes()),
            Value::I32(v) => copy_into(out, &v.to_le_bytes()),
            Value::U32(v) => copy_into(out, &v.to_le_bytes()),
            Value::F32(v) => copy_into(out, &v.to_le_bytes()),
            Value::F64(v) => copy_into(out, &v.to_le_bytes()),
            Value::I64(v) => copy_into(out, &v.to_le_bytes()),
            Value::U64(v) => copy_into(out, &v.to_le_bytes()),
        }
    }

    /// Decode one value of type `c` from the start of `bytes`.
    ///
    /// `bytes` must hold at least `char_width(c)` bytes.
    #[cfg(feature = "heapless")]
    fn read_le(c: u8, bytes: &[u8]) -> Option<Self> {
        let value = match c {
            b'B' => Value::U8(bytes[0]),
            b'b' => Value::I8(i8::from_le_bytes([bytes[0]])),
            b'c' => Value::Char(bytes[0]),
            b'h' => Value::I16(i16::from_le_bytes(take(bytes))),
            b'H' => Value::U16(u16::from_le_bytes(take(bytes))),
            b'i' => Value::I32(i32::from_le_bytes(take(bytes))),
            b'I' => Value::U32(u32::from_le_bytes(take(bytes))),
            b'f' => Value::F32(f32::from_le_bytes(take(bytes))),
            b'd' => Value::F64(f64::from_le_bytes(take(bytes))),
            b'l' => Value::I64(i64::from_le_bytes(take(bytes))),
            b'L' => Value::U64(u64::from_le_bytes(take(bytes))),
            _ => return None,
        };
        Some(value)
    }
}

#[inline]
fn copy_into(out: &mut [u8], bytes: &[u8]) -> usize {
    out[..bytes.len()].copy_from_slice(bytes);
    bytes.len()
}

#[cfg(feature = "heapless")]
#[inline]
fn take<const K: usize>(bytes: &[u8]) -> [u8; K] {
    let mut array = [0u8; K];
    array.copy_from_slice(&bytes[..K]);
    array
}

/// Iterate over the format characters that carry a value.
fn typed_chars(format: &str) -> impl Iterator<Item = u8> + '_ {
    format.bytes().filter(|&c| char_width(c) > 0)
}

/// Pack `values` according to `format` into `buf`.
///
/// Returns the number of bytes written, which equals
/// [`required_bytes`]`(format)`.
///
/// # Errors
///
/// [`FormatError::ArgumentCount`] or [`FormatError::TypeMismatch`] when the
/// values do not follow the format, [`FormatError::BufferTooSmall`] when `buf`
/// is too short.
///
/// # Example
///
/// ```
/// use bincom_proto::{pack, Value};
///
/// let mut buf = [0u8; 8];
/// let len = pack("BH", &[Value::U8(3), Value::U16(0x0102)], &mut buf).unwrap();
/// assert_eq!(&buf[..len], &[3, 0x02, 0x01]);
/// ```
pub fn pack(format: &str, values: &[Value], buf: &mut [u8]) -> Result<usize, FormatError> {
    if typed_chars(format).count() != values.len() {
        return Err(FormatError::ArgumentCount);
    }
    if buf.len() < required_bytes(format) {
        return Err(FormatError::BufferTooSmall);
    }

    let mut pos = 0;
    for (index, (c, value)) in typed_chars(format).zip(values).enumerate() {
        if value.format_char() != c {
            return Err(FormatError::TypeMismatch { index });
        }
        pos += value.write_le(&mut buf[pos..]);
    }
    Ok(pos)
}

/// Decode `bytes` according to `format`.
///
/// # Errors
///
/// [`FormatError::LengthMismatch`] if `bytes` is not exactly
/// [`required_bytes`]`(format)` long, [`FormatError::TooManyValues`] if the
/// format holds more than [`MAX_VALUES`] values.
#[cfg(feature = "heapless")]
pub fn unpack(format: &str, bytes: &[u8]) -> Result<heapless::Vec<Value, MAX_VALUES>, FormatError> {
    if bytes.len() != required_bytes(format) {
        return Err(FormatError::LengthMismatch);
    }

    let mut values = heapless::Vec::new();
    let mut pos = 0;
    for c in typed_chars(format) {
        // Widths were checked against the total above
        if let Some(value) = Value::read_le(c, &bytes[pos..]) {
            values.push(value).map_err(|_| FormatError::TooManyValues)?;
        }
        pos += char_width(c);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_widths() {
        for c in *b"Bbc" {
            assert_eq!(char_width(c), 1);
        }
        for c in *b"hH" {
            assert_eq!(char_width(c), 2);
        }
        for c in *b"iIf" {
            assert_eq!(char_width(c), 4);
        }
        for c in *b"dlL" {
            assert_eq!(char_width(c), 8);
        }
    }

    #[test]
    fn test_unknown_chars_are_ignored() {
        assert_eq!(char_width(b's'), 0);
        assert_eq!(char_width(b'x'), 0);
        assert_eq!(required_bytes("s"), 0);
        assert_eq!(required_bytes("B?H"), 3);
    }

    #[test]
    fn test_required_bytes_sums_widths() {
        assert_eq!(required_bytes(""), 0);
        assert_eq!(required_bytes("BB"), 2);
        assert_eq!(required_bytes("BHI"), 7);
        assert_eq!(required_bytes("dlL"), 24);
        assert_eq!(required_bytes("bchif"), 12);
    }

    #[test]
    fn test_required_bytes_is_const() {
        const WIDTH: usize = required_bytes("BIH");
        assert_eq!(WIDTH, 7);
        assert_eq!(required_bytes("BIH"), required_bytes("BIH"));
    }

    #[test]
    fn test_pack_little_endian() {
        let mut buf = [0u8; 16];
        let len = pack(
            "BhI",
            &[Value::U8(0xFF), Value::I16(-2), Value::U32(0x0403_0201)],
            &mut buf,
        )
        .unwrap();
        assert_eq!(&buf[..len], &[0xFF, 0xFE, 0xFF, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_pack_float() {
        let mut buf = [0u8; 8];
        let len = pack("f", &[Value::F32(1.5)], &mut buf).unwrap();
        assert_eq!(&buf[..len], &1.5f32.to_le_bytes());
    }

    #[test]
    fn test_pack_argument_count_mismatch() {
        let mut buf = [0u8; 8];
        assert_eq!(
            pack("BB", &[Value::U8(1)], &mut buf),
            Err(FormatError::ArgumentCount)
        );
    }

    #[test]
    fn test_pack_type_mismatch() {
        let mut buf = [0u8; 8];
        assert_eq!(
            pack("BH", &[Value::U8(1), Value::I16(2)], &mut buf),
            Err(FormatError::TypeMismatch { index: 1 })
        );
    }

    #[test]
    fn test_pack_buffer_too_small() {
        let mut buf = [0u8; 3];
        assert_eq!(
            pack("I", &[Value::U32(1)], &mut buf),
            Err(FormatError::BufferTooSmall)
        );
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn test_unpack_reply() {
        let values = unpack("IB", &[0x10, 0x00, 0x00, 0x00, 0x07]).unwrap();
        assert_eq!(values.as_slice(), &[Value::U32(16), Value::U8(7)]);
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn test_unpack_length_mismatch() {
        assert_eq!(unpack("H", &[1]), Err(FormatError::LengthMismatch));
        assert_eq!(unpack("", &[1]), Err(FormatError::LengthMismatch));
    }

    #[cfg(feature = "heapless")]
    #[test]
    fn test_pack_then_unpack_mixed() {
        let values = [Value::I64(-5), Value::F64(2.25), Value::Char(b'z')];
        let mut buf = [0u8; 32];
        let len = pack("ldc", &values, &mut buf).unwrap();
        assert_eq!(len, 17);
        assert_eq!(unpack("ldc", &buf[..len]).unwrap().as_slice(), &values);
    }
}
