//! CommandServer: the device's poll loop.

use bincom_proto::Status;

use crate::command::{Command, CommandTable, Request, TableError};
use crate::parser::{FrameParser, Message, ParserState, Step};
use crate::response::Responder;
use crate::transport::{SerialPort, Transport};
use crate::watchdog::Watchdog;

/// Hardware the server drives besides the serial port.
///
/// The same value is handed to every command handler as its state.
pub trait Device {
    /// Watchdog ticks elapsed since the previous call.
    fn take_ticks(&mut self) -> u32 {
        0
    }

    /// Halt the device.
    ///
    /// Called on every poll while the watchdog is expired, so it must be
    /// idempotent.
    fn stop(&mut self);
}

/// Serves request frames from a serial port against a command table.
///
/// Each [`poll`](Self::poll) does a bounded amount of work and never blocks:
/// receive at most one byte, transmit at most one byte, run at most one
/// parser step, then check the watchdog.
pub struct CommandServer<P, S: 'static> {
    transport: Transport<P>,
    parser: FrameParser,
    commands: CommandTable<S>,
    watchdog: Watchdog,
    expired: bool,
}

impl<P: SerialPort, S: Device> CommandServer<P, S> {
    /// Create a server for the given application commands.
    pub fn new(
        port: P,
        commands: &'static [Command<S>],
        watchdog: Watchdog,
    ) -> Result<Self, TableError> {
        Ok(Self::with_table(port, CommandTable::new(commands)?, watchdog))
    }

    /// Create a server from an already built table.
    pub fn with_table(port: P, commands: CommandTable<S>, watchdog: Watchdog) -> Self {
        Self {
            transport: Transport::new(port),
            parser: FrameParser::new(),
            commands,
            watchdog,
            expired: false,
        }
    }

    /// Serve forever.
    pub fn run(&mut self, device: &mut S) -> ! {
        loop {
            if self.poll(device).is_err() {
                error!("serial port error");
            }
        }
    }

    /// Run one iteration of the loop.
    ///
    /// Port errors are returned only after every step has run, so a failing
    /// receiver never starves transmission or the watchdog.
    pub fn poll(&mut self, device: &mut S) -> Result<(), P::Error> {
        let received = self.transport.try_receive();
        let transmitted = self.transport.try_transmit();

        if self.transport.inbound.len() >= self.parser.wait_count() {
            self.step(device);
        }

        self.watchdog.advance(device.take_ticks());
        let expired = self.watchdog.is_expired();
        if expired {
            if !self.expired {
                warn!(
                    "heartbeat missed: {} ticks elapsed, timeout {}",
                    self.watchdog.elapsed_ticks(),
                    self.watchdog.timeout_ticks()
                );
            }
            device.stop();
        }
        self.expired = expired;

        received?;
        transmitted?;
        Ok(())
    }

    fn step(&mut self, device: &mut S) {
        match self.parser.advance(&mut self.transport.inbound) {
            Step::Waiting | Step::AwaitPayload(_) => {}
            Step::Acknowledge => {
                let _ = Responder::new(&mut self.transport.outbound).send_status(Status::Ok);
            }
            Step::Rejected {
                bad_marker,
                bad_status,
            } => {
                let mut reply = Responder::new(&mut self.transport.outbound);
                for _ in 0..(u8::from(bad_marker) + u8::from(bad_status)) {
                    let _ = reply.send_status(Status::Communication);
                }
            }
            Step::Message(message) => {
                self.dispatch(message, device);
                self.parser.finish(&mut self.transport.inbound);
            }
        }
    }

    fn dispatch(&mut self, message: Message, device: &mut S) {
        let id = message.function_id;
        let mut request = Request::new(
            message,
            &self.transport.inbound,
            &mut self.transport.outbound,
            &self.commands,
            &mut self.watchdog,
        );

        let result = match self.commands.required_bytes(id) {
            None => Err(Status::UndefinedFunction),
            Some(bytes) if message.length as usize != 1 + bytes => Err(Status::ByteCount),
            Some(_) => self.commands.invoke(id, &mut request, device),
        };

        let reply = request.reply();
        let replied = reply.sent() > 0;
        let _ = match result {
            Ok(()) if !replied => reply.send_status(Status::Ok),
            Ok(()) => Ok(()),
            Err(status) if !replied => {
                debug!("function {}: {}", id, status);
                reply.send_status(status)
            }
            Err(status) => {
                warn!("function {} failed with {} after replying", id, status);
                Ok(())
            }
        };
    }

    #[must_use]
    pub fn parser_state(&self) -> ParserState {
        self.parser.state()
    }

    pub fn commands(&self) -> &CommandTable<S> {
        &self.commands
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub fn watchdog_mut(&mut self) -> &mut Watchdog {
        &mut self.watchdog
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &Transport<P> {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut Transport<P> {
        &mut self.transport
    }

    /// Decompose the server into its port and watchdog.
    pub fn into_parts(self) -> (P, Watchdog) {
        (self.transport.into_port(), self.watchdog)
    }
}
