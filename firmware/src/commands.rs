//! Command table served by the firmware.
//!
//! Ids 0 and 1 are the built-in introspection commands; the entries below
//! follow from id 2.

use bincom_core::{handlers, Command, Request, Status};
use embassy_time::Instant;

use crate::board::Board;

/// Application commands in id order.
pub static COMMANDS: [Command<Board<'static>>; 7] = [
    Command::new("heartbeat", "", "", handlers::heartbeat),
    Command::new("set_heartbeat_timeout", "I", "", handlers::set_heartbeat_timeout),
    Command::new("heartbeat_status", "", "II", handlers::heartbeat_status),
    Command::new("set_led", "B", "", set_led),
    Command::new("set_actuator", "B", "", set_actuator),
    Command::new("uptime", "", "I", uptime),
    Command::new("version", "", "s", version),
];

/// Decode a 0/1 switch argument.
fn read_switch(req: &Request<'_, Board<'static>>) -> Result<bool, Status> {
    match req.args().read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(Status::Value),
    }
}

fn set_led(req: &mut Request<'_, Board<'static>>, board: &mut Board<'static>) -> Result<(), Status> {
    let on = read_switch(req)?;
    board.set_led(on);
    Ok(())
}

fn set_actuator(
    req: &mut Request<'_, Board<'static>>,
    board: &mut Board<'static>,
) -> Result<(), Status> {
    if board.is_halted() {
        return Err(Status::Busy);
    }
    let on = read_switch(req)?;
    board.set_actuator(on);
    Ok(())
}

/// Milliseconds since boot, wrapping at `u32::MAX`.
fn uptime(req: &mut Request<'_, Board<'static>>, _: &mut Board<'static>) -> Result<(), Status> {
    let millis = Instant::now().as_millis() as u32;
    req.reply().send_ok(&millis.to_le_bytes())?;
    Ok(())
}

fn version(req: &mut Request<'_, Board<'static>>, _: &mut Board<'static>) -> Result<(), Status> {
    req.reply().send_str(env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
