//! The seam between the session and whatever produces response lines.

use crate::error::CaptureError;

use std::{io, time::Duration};

/// How a response device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Line speed, 9600 unless the box says otherwise.
    pub baud_rate: u32,
    /// Upper bound on how long a single read may wait on the device.
    pub read_timeout: Duration,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// `Transport`
///
/// A byte stream from a response device. Implementations must answer
/// `bytes_available` without blocking, and `read` must not block when asked
/// for no more than that many bytes.
pub trait Transport {
    /// How many bytes can be read right now.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Reads up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Releases the underlying device. Dropping the transport must also
    /// release it; this only exists to surface errors from doing so.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// `DeviceConnector`
///
/// Opens [Transport]s by port identifier. The session controller goes through
/// one of these, so it never needs to know what is on the other end.
pub trait DeviceConnector {
    #[allow(missing_docs)]
    type Transport: Transport;

    /// Opens `port`. Fails with [CaptureError::Connection] when the port is
    /// wrong, busy, or gone.
    fn connect(
        &mut self,
        port: &str,
        settings: &DeviceSettings,
    ) -> Result<Self::Transport, CaptureError>;
}
