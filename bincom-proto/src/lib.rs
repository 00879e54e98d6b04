//! Wire format, argument encoding and host client for the bincom serial
//! command protocol.
//!
//! This crate provides everything both ends of the link agree on:
//!
//! - **Frames**: [`FrameHeader`], [`encode_frame`], [`encode_request`]
//! - **Status codes**: [`Status`]
//! - **Argument formats**: [`required_bytes`], [`pack`], [`unpack`], [`Value`]
//! - **Host client**: [`Client`] (feature `client`)
//!
//! # Protocol Format
//!
//! ```text
//! ┌────────┬────────┬────────┬──────────────────┐
//! │ MARKER │ STATUS │ LENGTH │ PAYLOAD          │
//! │ 'b'    │ 1B     │ 1B     │ 0-255B           │
//! └────────┴────────┴────────┴──────────────────┘
//! ```
//!
//! A request payload is a function id followed by the command's arguments,
//! packed little-endian according to its argument format string. A reply
//! carries `STATUS_OK` and the return value, or an error status and no
//! payload. A request with `LENGTH == 0` is acknowledged with a bodyless
//! `STATUS_OK` reply.
//!
//! ```
//! use bincom_proto::{encode_request, pack, Value, FRAME_MARKER};
//!
//! // get_command_names(3, 0)
//! let mut args = [0u8; 2];
//! let n = pack("BB", &[Value::U8(3), Value::U8(0)], &mut args).unwrap();
//! let mut frame = [0u8; 8];
//! let len = encode_request(0x01, &args[..n], &mut frame).unwrap();
//! assert_eq!(&frame[..len], &[FRAME_MARKER, 0x00, 0x03, 0x01, 0x03, 0x00]);
//! ```
//!
//! # Features
//!
//! - **`client`** (default): blocking [`Client`] over `embedded-io` transports
//! - **`heapless`**: [`unpack`] into a `heapless::Vec`
//! - **`std`**: standard library support (host testing)
//! - **`defmt`**: defmt formatting for embedded logging
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "client")]
pub mod client;
pub mod format;
pub mod frame;
pub mod status;

#[cfg(feature = "client")]
pub use client::{
    Client, ClientError, CommandSignature, Reply, COMMAND_COUNT_ID, COMMAND_NAMES_ID,
    STRING_FORMAT,
};
#[cfg(feature = "heapless")]
pub use format::unpack;
pub use format::{char_width, pack, required_bytes, FormatError, Value, MAX_VALUES};
pub use frame::{
    encode_frame, encode_request, FrameError, FrameHeader, FRAME_MARKER, HEADER_LEN,
    MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
};
pub use status::Status;
