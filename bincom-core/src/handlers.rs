//! Stock heartbeat handlers.
//!
//! Generic over the application state so any command table can register
//! them:
//!
//! ```
//! use bincom_core::{handlers, Command};
//!
//! static COMMANDS: [Command<()>; 3] = [
//!     Command::new("heartbeat", "", "", handlers::heartbeat),
//!     Command::new("set_heartbeat_timeout", "I", "", handlers::set_heartbeat_timeout),
//!     Command::new("heartbeat_status", "", "II", handlers::heartbeat_status),
//! ];
//! ```

use bincom_proto::Status;

use crate::command::Request;

/// Restart the watchdog count and acknowledge with `STATUS_OK`.
pub fn heartbeat<S>(req: &mut Request<'_, S>, _: &mut S) -> Result<(), Status> {
    req.watchdog().heartbeat();
    req.reply().send_status(Status::Ok)?;
    Ok(())
}

/// Set the watchdog timeout in ticks from a `u32` argument; 0 disarms.
///
/// The count restarts so a new deadline never fires immediately.
pub fn set_heartbeat_timeout<S>(req: &mut Request<'_, S>, _: &mut S) -> Result<(), Status> {
    let timeout = req.args().read_u32()?;
    let watchdog = req.watchdog();
    watchdog.set_timeout(timeout);
    watchdog.heartbeat();
    debug!("heartbeat timeout set to {} ticks", timeout);
    req.reply().send_status(Status::Ok)?;
    Ok(())
}

/// Reply with the elapsed and timeout tick counts (`"II"`).
pub fn heartbeat_status<S>(req: &mut Request<'_, S>, _: &mut S) -> Result<(), Status> {
    let watchdog = req.watchdog();
    let mut payload = [0u8; 8];
    payload[..4].copy_from_slice(&watchdog.elapsed_ticks().to_le_bytes());
    payload[4..].copy_from_slice(&watchdog.timeout_ticks().to_le_bytes());
    req.reply().send_ok(&payload)?;
    Ok(())
}
