use pid_protocol::{DecodeError, EncodeError, Message};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[cfg(feature = "serial")]
    #[error("Display could not be opened: {0}")]
    DeviceUnavailable(#[from] tokio_serial::Error),

    #[error("IO Error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Message encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Packet decoding error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Packet timeout")]
    Timeout,

    #[error("Unexpected reply from the display: {0}")]
    UnexpectedReply(Message),

    #[error("Session is closed")]
    Closed,
}

impl SessionError {
    /// Returns `true` if the failure came from the link rather than from the
    /// message, so sending the same message again may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}
