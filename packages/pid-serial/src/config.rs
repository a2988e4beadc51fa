use std::time::Duration;

#[cfg(feature = "serial")]
use serialport::{DataBits, FlowControl, Parity, StopBits};

/// Baud rate used by displays on their RS-485 link.
pub const PID_SERIAL_BAUDRATE: u32 = 9600;

/// Settings for a [`Session`](crate::Session).
///
/// The defaults match the line settings displays ship with: 9600 baud, 8N1,
/// no flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub baud_rate: u32,
    #[cfg(feature = "serial")]
    pub data_bits: DataBits,
    #[cfg(feature = "serial")]
    pub parity: Parity,
    #[cfg(feature = "serial")]
    pub stop_bits: StopBits,
    #[cfg(feature = "serial")]
    pub flow_control: FlowControl,

    /// How long [`Session::recv`](crate::Session::recv) waits for a packet.
    pub read_timeout: Duration,

    /// How long to wait for the display to acknowledge each write, or `None`
    /// to not wait at all.
    pub ack_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baud_rate: PID_SERIAL_BAUDRATE,
            #[cfg(feature = "serial")]
            data_bits: DataBits::Eight,
            #[cfg(feature = "serial")]
            parity: Parity::None,
            #[cfg(feature = "serial")]
            stop_bits: StopBits::One,
            #[cfg(feature = "serial")]
            flow_control: FlowControl::None,
            read_timeout: Duration::from_millis(500),
            ack_timeout: Some(Duration::from_millis(500)),
        }
    }
}

impl SessionConfig {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[cfg(feature = "serial")]
    pub fn with_data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    #[cfg(feature = "serial")]
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    #[cfg(feature = "serial")]
    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    #[cfg(feature = "serial")]
    pub fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Option<Duration>) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }
}
