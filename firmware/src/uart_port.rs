//! Non-blocking serial port over the UART0 registers.
//!
//! Pins, baud rate and framing are configured by `Uart::new_blocking`; the
//! port then polls the flag register so that every call returns at once,
//! which is what the command server's poll loop needs. Interrupts for the
//! peripheral stay disabled.
//!
//! # Pins
//!
//! - GPIO 0: TX
//! - GPIO 1: RX

use embassy_rp::pac;
use embassy_rp::uart::{Blocking, Uart};
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write, WriteReady};

/// Receive errors flagged in the UART data register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum UartError {
    /// Receive FIFO overflowed.
    Overrun,
    /// Line held low for longer than a frame.
    Break,
    /// Parity mismatch.
    Parity,
    /// Missing stop bit.
    Framing,
}

impl embedded_io::Error for UartError {
    fn kind(&self) -> ErrorKind {
        match self {
            UartError::Overrun => ErrorKind::OutOfMemory,
            UartError::Break | UartError::Parity | UartError::Framing => ErrorKind::InvalidData,
        }
    }
}

/// UART0 exposed through the `embedded-io` readiness traits.
pub struct UartPort<'d> {
    /// Owns the peripheral and pins for as long as the port lives.
    _uart: Uart<'d, Blocking>,
    regs: pac::uart::Uart,
}

impl<'d> UartPort<'d> {
    /// Wrap a blocking UART created on `UART0`.
    #[must_use]
    pub fn new(uart: Uart<'d, Blocking>) -> Self {
        Self {
            _uart: uart,
            regs: pac::UART0,
        }
    }
}

impl ErrorType for UartPort<'_> {
    type Error = UartError;
}

impl ReadReady for UartPort<'_> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.regs.uartfr().read().rxfe())
    }
}

impl Read for UartPort<'_> {
    /// Read one byte, waiting for it if the receive FIFO is empty. Check
    /// [`ReadReady::read_ready`] first to never wait.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(slot) = buf.first_mut() else {
            return Ok(0);
        };
        while self.regs.uartfr().read().rxfe() {}

        let dr = self.regs.uartdr().read();
        if dr.oe() {
            Err(UartError::Overrun)
        } else if dr.be() {
            Err(UartError::Break)
        } else if dr.pe() {
            Err(UartError::Parity)
        } else if dr.fe() {
            Err(UartError::Framing)
        } else {
            *slot = dr.data();
            Ok(1)
        }
    }
}

impl WriteReady for UartPort<'_> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.regs.uartfr().read().txff())
    }
}

impl Write for UartPort<'_> {
    /// Write one byte, waiting for FIFO space if needed. Check
    /// [`WriteReady::write_ready`] first to never wait.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let Some(&byte) = buf.first() else {
            return Ok(0);
        };
        while self.regs.uartfr().read().txff() {}
        self.regs.uartdr().write(|w| w.set_data(byte));
        Ok(1)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while self.regs.uartfr().read().busy() {}
        Ok(())
    }
}
