//! Ring-buffered byte transport over a non-blocking serial port.

use embedded_io::{Read, ReadReady, Write, WriteReady};

use crate::ring::FrameBuffer;

/// A serial port that can report readiness without blocking.
///
/// Implemented automatically for any type providing the four `embedded-io`
/// traits, such as a UART peripheral wrapper or a host-side mock.
pub trait SerialPort: Read + Write + ReadReady + WriteReady {}

impl<T: Read + Write + ReadReady + WriteReady> SerialPort for T {}

/// Error type for transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Outbound buffer has no room left.
    OutboundFull,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutboundFull => write!(f, "outbound buffer full"),
        }
    }
}

/// A serial port plus one ring buffer per direction.
///
/// Every operation moves at most one byte and never waits on the port.
pub struct Transport<P> {
    port: P,
    pub(crate) inbound: FrameBuffer,
    pub(crate) outbound: FrameBuffer,
}

impl<P: SerialPort> Transport<P> {
    /// Wrap a port with empty buffers.
    pub fn new(port: P) -> Self {
        Self {
            port,
            inbound: FrameBuffer::new(),
            outbound: FrameBuffer::new(),
        }
    }

    /// Move one received byte from the port into the inbound buffer.
    ///
    /// Returns the byte, or `None` if the port had nothing to read. While the
    /// inbound buffer is full the port is not read at all, so the byte waits
    /// in the peripheral.
    pub fn try_receive(&mut self) -> Result<Option<u8>, P::Error> {
        if self.inbound.is_full() || !self.port.read_ready()? {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        if self.port.read(&mut byte)? == 0 {
            return Ok(None);
        }
        // Room was checked above
        let _ = self.inbound.push(byte[0]);
        Ok(Some(byte[0]))
    }

    /// Move one queued outbound byte to the port if it can take it.
    ///
    /// Returns `true` if a byte was written.
    pub fn try_transmit(&mut self) -> Result<bool, P::Error> {
        let Some(byte) = self.outbound.peek(0) else {
            return Ok(false);
        };
        if !self.port.write_ready()? {
            return Ok(false);
        }

        if self.port.write(&[byte])? == 0 {
            return Ok(false);
        }
        self.outbound.pop();
        Ok(true)
    }

    /// Queue one byte for transmission.
    pub fn enqueue_outbound(&mut self, byte: u8) -> Result<(), TransportError> {
        self.outbound
            .push(byte)
            .map_err(|_| TransportError::OutboundFull)
    }

    pub fn inbound(&self) -> &FrameBuffer {
        &self.inbound
    }

    pub fn outbound(&self) -> &FrameBuffer {
        &self.outbound
    }

    /// Get a reference to the serial port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get a mutable reference to the serial port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Give back the serial port, dropping anything still buffered.
    pub fn into_port(self) -> P {
        self.port
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockPort;
    use super::*;
    use crate::ring::BUFFER_SIZE;

    #[test]
    fn test_receive_one_byte_per_call() {
        let mut port = MockPort::new();
        port.feed(&[1, 2]);
        let mut transport = Transport::new(port);

        assert_eq!(transport.try_receive(), Ok(Some(1)));
        assert_eq!(transport.inbound().len(), 1);
        assert_eq!(transport.try_receive(), Ok(Some(2)));
        assert_eq!(transport.try_receive(), Ok(None));
        assert_eq!(transport.inbound().len(), 2);
    }

    #[test]
    fn test_receive_backpressure_when_inbound_full() {
        let mut port = MockPort::new();
        port.feed(&[0xAA; BUFFER_SIZE + 1]);
        let mut transport = Transport::new(port);

        for _ in 0..BUFFER_SIZE {
            assert!(transport.try_receive().unwrap().is_some());
        }
        assert_eq!(transport.try_receive(), Ok(None));
        // The extra byte is still waiting in the port
        assert_eq!(transport.port().rx.len(), 1);
    }

    #[test]
    fn test_transmit_one_byte_per_call() {
        let mut transport = Transport::new(MockPort::new());
        assert_eq!(transport.try_transmit(), Ok(false));

        transport.enqueue_outbound(b'b').unwrap();
        transport.enqueue_outbound(0).unwrap();
        assert_eq!(transport.try_transmit(), Ok(true));
        assert_eq!(transport.port().tx, [b'b']);
        assert_eq!(transport.try_transmit(), Ok(true));
        assert_eq!(transport.port().tx, [b'b', 0]);
        assert!(transport.outbound().is_empty());
    }

    #[test]
    fn test_transmit_waits_for_ready_port() {
        let mut port = MockPort::new();
        port.tx_ready = false;
        let mut transport = Transport::new(port);
        transport.enqueue_outbound(7).unwrap();

        assert_eq!(transport.try_transmit(), Ok(false));
        assert_eq!(transport.outbound().len(), 1);

        transport.port_mut().tx_ready = true;
        assert_eq!(transport.try_transmit(), Ok(true));
        assert_eq!(transport.into_port().tx, [7]);
    }

    #[test]
    fn test_enqueue_outbound_full() {
        let mut transport = Transport::new(MockPort::new());
        for _ in 0..BUFFER_SIZE {
            transport.enqueue_outbound(0).unwrap();
        }
        assert_eq!(
            transport.enqueue_outbound(0),
            Err(TransportError::OutboundFull)
        );
    }
}
