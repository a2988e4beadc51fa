//! Crate for driving LED passenger information displays over a serial link.
//!
//! ```no_run
//! # async fn run() -> Result<(), pid_serial::SessionError> {
//! let mut session = pid_serial::serial::open_session("/dev/ttyUSB0")?;
//! session.send("V0^OPEN_FOR BUSINESS").await?;
//! session.ping().await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub use pid_protocol as protocol;
pub use pid_protocol::inspect;

mod config;
mod error;
mod session;

#[cfg(feature = "serial")]
pub mod serial;

pub use config::{SessionConfig, PID_SERIAL_BAUDRATE};
pub use error::SessionError;
pub use session::Session;
