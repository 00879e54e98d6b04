//! Platform-agnostic device side of the bincom serial command protocol.
//!
//! This crate turns a non-blocking serial port into a command server. It has
//! no chip-specific dependencies and runs on host for testing.
//!
//! # Overview
//!
//! - [`ring`]: fixed-capacity byte ring buffer ([`RingBuffer`], [`FrameBuffer`])
//! - [`transport`]: one-byte-at-a-time port I/O ([`Transport`], [`SerialPort`])
//! - [`parser`]: framing state machine ([`FrameParser`])
//! - [`response`]: reply encoder ([`Responder`])
//! - [`command`]: command table and handler requests ([`CommandTable`], [`Request`])
//! - [`handlers`]: stock heartbeat handlers
//! - [`watchdog`]: heartbeat deadline ([`Watchdog`])
//! - [`server`]: the poll loop tying it together ([`CommandServer`])
//!
//! # Example
//!
//! ```
//! use bincom_core::{handlers, Command, CommandServer, Device, Watchdog};
//! # use core::convert::Infallible;
//! # struct Port;
//! # impl embedded_io::ErrorType for Port { type Error = Infallible; }
//! # impl embedded_io::Read for Port {
//! #     fn read(&mut self, _: &mut [u8]) -> Result<usize, Infallible> { Ok(0) }
//! # }
//! # impl embedded_io::ReadReady for Port {
//! #     fn read_ready(&mut self) -> Result<bool, Infallible> { Ok(false) }
//! # }
//! # impl embedded_io::Write for Port {
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # impl embedded_io::WriteReady for Port {
//! #     fn write_ready(&mut self) -> Result<bool, Infallible> { Ok(true) }
//! # }
//!
//! struct Board {
//!     halted: bool,
//! }
//!
//! impl Device for Board {
//!     fn stop(&mut self) {
//!         self.halted = true;
//!     }
//! }
//!
//! static COMMANDS: [Command<Board>; 1] = [Command::new("heartbeat", "", "", handlers::heartbeat)];
//!
//! let mut board = Board { halted: false };
//! let mut server = CommandServer::new(Port, &COMMANDS, Watchdog::new(1000)).unwrap();
//! server.poll(&mut board).unwrap();
//! assert_eq!(server.commands().count(), 3);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through `defmt` and derive `defmt::Format` (for embedded logging)
//! - **`log`**: Log through the `log` facade when `defmt` is off
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod command;
pub mod handlers;
pub mod parser;
pub mod response;
pub mod ring;
pub mod server;
pub mod transport;
pub mod watchdog;

// Re-export main types at crate root
pub use bincom_proto::{Status, FRAME_MARKER};
pub use command::{
    ArgReader, Command, CommandTable, Handler, Request, TableError, BUILTIN_COMMANDS,
    MAX_COMMANDS,
};
pub use parser::{FrameParser, Message, ParserState, Step};
pub use response::{Responder, ResponseError};
pub use ring::{FrameBuffer, RingBuffer, BUFFER_SIZE};
pub use server::{CommandServer, Device};
pub use transport::{SerialPort, Transport, TransportError};
pub use watchdog::{Watchdog, WatchdogState};
