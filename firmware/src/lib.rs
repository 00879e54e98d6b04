//! bincom command server for RP2040.
//!
//! This crate provides the chip-specific pieces around `bincom-core`: the
//! UART port adapter, the board device and the command table.

#![no_std]

// Re-export core types for convenience
pub use bincom_core::{CommandServer, Device, Status, Watchdog};

pub mod board;
pub mod commands;
pub mod uart_port;

pub use board::{Board, TICK_MS};
pub use commands::COMMANDS;
pub use uart_port::{UartError, UartPort};

/// Serial line speed expected by the host.
pub const BAUD_RATE: u32 = 1_000_000;

/// Watchdog timeout at boot, in ticks. 0 keeps it disarmed until the host
/// sends `set_heartbeat_timeout`.
pub const HEARTBEAT_TIMEOUT_TICKS: u32 = 0;
