//! Command table, handler requests and the built-in introspection commands.
//!
//! Function ids index a fixed table: ids 0 and 1 are the built-in
//! `command_count` and `get_command_names`, application commands follow from
//! id 2 in registration order.
//!
//! # Example
//!
//! ```
//! use bincom_core::{Command, CommandTable, Request, Status};
//!
//! struct Led(bool);
//!
//! fn set_led(req: &mut Request<'_, Led>, led: &mut Led) -> Result<(), Status> {
//!     led.0 = req.args().read_u8()? != 0;
//!     req.reply().send_status(Status::Ok)?;
//!     Ok(())
//! }
//!
//! static COMMANDS: [Command<Led>; 1] = [Command::new("set_led", "B", "", set_led)];
//!
//! let table = CommandTable::new(&COMMANDS).unwrap();
//! assert_eq!(table.count(), 3);
//! assert_eq!(table.required_bytes(2), Some(1));
//! assert_eq!(table.name(2, 0), Ok("set_led"));
//! ```

use bincom_proto::{required_bytes, Status, MAX_PAYLOAD_SIZE};

use crate::parser::Message;
use crate::response::Responder;
use crate::ring::{FrameBuffer, BUFFER_SIZE};
use crate::watchdog::Watchdog;

/// Number of built-in commands ahead of the application ones.
pub const BUILTIN_COMMANDS: usize = 2;

/// Largest table size whose count still fits the 1-byte `command_count` reply.
pub const MAX_COMMANDS: usize = u8::MAX as usize;

/// Command handler.
///
/// Reads its arguments through [`Request::args`] and replies through
/// [`Request::reply`]. Returning `Err(status)` without having replied makes
/// the server answer with a bodyless frame carrying `status`; returning
/// `Ok(())` without having replied is answered with a bodyless `STATUS_OK`.
pub type Handler<S> = fn(&mut Request<'_, S>, &mut S) -> Result<(), Status>;

/// One entry of the command table.
pub struct Command<S: 'static> {
    pub name: &'static str,
    /// Argument format string, see [`bincom_proto::format`].
    pub args: &'static str,
    /// Return format string.
    pub returns: &'static str,
    pub handler: Handler<S>,
}

impl<S> Command<S> {
    #[must_use]
    pub const fn new(
        name: &'static str,
        args: &'static str,
        returns: &'static str,
        handler: Handler<S>,
    ) -> Self {
        Self {
            name,
            args,
            returns,
            handler,
        }
    }

    /// Argument bytes a request for this command carries after the function id.
    #[inline]
    #[must_use]
    pub const fn required_bytes(&self) -> usize {
        required_bytes(self.args)
    }
}

impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Command<S> {}

impl<S> core::fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Error type for table construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// More than [`MAX_COMMANDS`] commands including the built-ins.
    TooManyCommands,
    /// Command `id` declares more argument bytes than one frame can carry.
    ArgumentsTooLong { id: u8 },
}

impl core::fmt::Display for TableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooManyCommands => write!(f, "more than {} commands", MAX_COMMANDS),
            Self::ArgumentsTooLong { id } => {
                write!(f, "arguments of command {} do not fit in one frame", id)
            }
        }
    }
}

/// Immutable id-indexed command table with precomputed argument sizes.
pub struct CommandTable<S: 'static> {
    builtins: [Command<S>; BUILTIN_COMMANDS],
    commands: &'static [Command<S>],
    required: heapless::Vec<u8, MAX_COMMANDS>,
}

impl<S> CommandTable<S> {
    /// Build the table from the application commands, which get ids starting
    /// at 2.
    pub fn new(commands: &'static [Command<S>]) -> Result<Self, TableError> {
        let mut table = Self {
            builtins: [
                Command::new("command_count", "", "B", command_count::<S>),
                Command::new("get_command_names", "BB", "s", get_command_names::<S>),
            ],
            commands,
            required: heapless::Vec::new(),
        };

        if BUILTIN_COMMANDS + commands.len() > MAX_COMMANDS {
            return Err(TableError::TooManyCommands);
        }
        for id in 0..BUILTIN_COMMANDS + commands.len() {
            let id = id as u8;
            let bytes = table
                .command(id)
                .map(Command::required_bytes)
                .unwrap_or_default();
            // The function id shares the payload with the arguments
            if bytes + 1 > MAX_PAYLOAD_SIZE {
                return Err(TableError::ArgumentsTooLong { id });
            }
            table
                .required
                .push(bytes as u8)
                .map_err(|_| TableError::TooManyCommands)?;
        }
        debug!("command table: {} commands", table.count());
        Ok(table)
    }

    /// Total number of commands, built-ins included.
    #[inline]
    #[must_use]
    pub fn count(&self) -> u8 {
        self.required.len() as u8
    }

    #[must_use]
    pub fn command(&self, id: u8) -> Option<&Command<S>> {
        let id = id as usize;
        match id.checked_sub(BUILTIN_COMMANDS) {
            None => self.builtins.get(id),
            Some(index) => self.commands.get(index),
        }
    }

    /// Argument bytes expected after the function id, `None` for unknown ids.
    #[inline]
    #[must_use]
    pub fn required_bytes(&self, id: u8) -> Option<usize> {
        self.required.get(id as usize).map(|&b| b as usize)
    }

    /// Name (`slot` 0), argument format (1) or return format (2) of a command.
    pub fn name(&self, id: u8, slot: u8) -> Result<&'static str, Status> {
        let command = self.command(id).ok_or(Status::UndefinedFunction)?;
        match slot {
            0 => Ok(command.name),
            1 => Ok(command.args),
            2 => Ok(command.returns),
            _ => Err(Status::Value),
        }
    }

    /// Commands in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Command<S>> + '_ {
        self.builtins.iter().chain(self.commands.iter())
    }

    /// Call the handler registered under `id`.
    pub fn invoke(&self, id: u8, request: &mut Request<'_, S>, state: &mut S) -> Result<(), Status> {
        let command = self.command(id).ok_or(Status::UndefinedFunction)?;
        (command.handler)(request, state)
    }
}

/// Everything a handler can reach while serving one request.
pub struct Request<'a, S: 'static> {
    message: Message,
    inbound: &'a FrameBuffer,
    reply: Responder<'a>,
    commands: &'a CommandTable<S>,
    watchdog: &'a mut Watchdog,
}

impl<'a, S> Request<'a, S> {
    pub fn new(
        message: Message,
        inbound: &'a FrameBuffer,
        outbound: &'a mut FrameBuffer,
        commands: &'a CommandTable<S>,
        watchdog: &'a mut Watchdog,
    ) -> Self {
        Self {
            message,
            inbound,
            reply: Responder::new(outbound),
            commands,
            watchdog,
        }
    }

    #[inline]
    #[must_use]
    pub fn function_id(&self) -> u8 {
        self.message.function_id
    }

    /// Reader over this request's argument bytes in the inbound buffer.
    #[must_use]
    pub fn args(&self) -> ArgReader<'a> {
        ArgReader::new(
            self.inbound,
            self.message.args_position,
            (self.message.length as usize).saturating_sub(1),
        )
    }

    #[inline]
    pub fn reply(&mut self) -> &mut Responder<'a> {
        &mut self.reply
    }

    #[inline]
    #[must_use]
    pub fn commands(&self) -> &CommandTable<S> {
        self.commands
    }

    #[inline]
    pub fn watchdog(&mut self) -> &mut Watchdog {
        &mut *self.watchdog
    }
}

/// Little-endian cursor over argument bytes still in the inbound buffer.
#[derive(Clone)]
pub struct ArgReader<'a> {
    buf: &'a FrameBuffer,
    position: usize,
    remaining: usize,
}

impl<'a> ArgReader<'a> {
    /// Reader over `len` bytes starting at absolute buffer `position`.
    pub fn new(buf: &'a FrameBuffer, position: usize, len: usize) -> Self {
        Self {
            buf,
            position: position % BUFFER_SIZE,
            remaining: len,
        }
    }

    /// Absolute buffer position of the next byte.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Read `K` bytes. Running past the frame's arguments is a byte-count
    /// error.
    pub fn read_array<const K: usize>(&mut self) -> Result<[u8; K], Status> {
        if K > self.remaining {
            return Err(Status::ByteCount);
        }
        let mut out = [0u8; K];
        for byte in &mut out {
            *byte = self.buf.get(self.position);
            self.position = (self.position + 1) % BUFFER_SIZE;
        }
        self.remaining -= K;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, Status> {
        self.read_array::<1>().map(|[b]| b)
    }

    pub fn read_i8(&mut self) -> Result<i8, Status> {
        self.read_array().map(i8::from_le_bytes)
    }

    pub fn read_u16(&mut self) -> Result<u16, Status> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16, Status> {
        self.read_array().map(i16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, Status> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, Status> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, Status> {
        self.read_array().map(f32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, Status> {
        self.read_array().map(u64::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, Status> {
        self.read_array().map(i64::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64, Status> {
        self.read_array().map(f64::from_le_bytes)
    }
}

fn command_count<S>(req: &mut Request<'_, S>, _: &mut S) -> Result<(), Status> {
    let count = req.commands().count();
    req.reply().send_ok(&[count])?;
    Ok(())
}

fn get_command_names<S>(req: &mut Request<'_, S>, _: &mut S) -> Result<(), Status> {
    let mut args = req.args();
    let id = args.read_u8()?;
    let slot = args.read_u8()?;
    let text = req.commands().name(id, slot)?;
    req.reply().send_str(text)?;
    Ok(())
}
