//! Opening displays connected through a serial port.

use log::debug;
use tokio_serial::SerialStream;

use crate::{Session, SessionConfig, SessionError};

impl Session<SerialStream> {
    /// Opens the serial device at `path` with the given line settings.
    pub fn open(path: &str, config: SessionConfig) -> Result<Self, SessionError> {
        let stream = SerialStream::open(
            &tokio_serial::new(path, config.baud_rate)
                .data_bits(config.data_bits)
                .parity(config.parity)
                .stop_bits(config.stop_bits)
                .flow_control(config.flow_control)
                .timeout(config.read_timeout),
        )
        .map_err(SessionError::DeviceUnavailable)?;

        debug!("Opened display session on {path:?} at {} baud.", config.baud_rate);
        Ok(Self::from_stream(stream, config))
    }
}

/// Opens the serial device at `path` with the default [`SessionConfig`].
pub fn open_session(path: &str) -> Result<Session<SerialStream>, SessionError> {
    Session::open(path, SessionConfig::default())
}
