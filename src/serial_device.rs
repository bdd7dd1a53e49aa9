//! A [Transport] on a real serial port.

use crate::{
    error::CaptureError,
    transport::{DeviceConnector, DeviceSettings, Transport},
};

use log::info;
use serial2::SerialPort;
use std::{io, path::PathBuf};

/// A response box on the end of a serial line.
pub struct SerialTransport {
    port: SerialPort,
}

impl SerialTransport {
    /// Opens `name` at the configured baud rate and read timeout.
    pub fn open(name: &str, settings: &DeviceSettings) -> io::Result<Self> {
        let mut port = SerialPort::open(name, settings.baud_rate)?;

        // The poller only asks for bytes the driver already has, so on unix
        // this timeout is a ceiling that is never reached. Elsewhere there is
        // no way to ask, and reads must give up straight away instead.
        #[cfg(unix)]
        port.set_read_timeout(settings.read_timeout)?;
        #[cfg(not(unix))]
        port.set_read_timeout(std::time::Duration::ZERO)?;

        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    #[cfg(unix)]
    fn bytes_available(&mut self) -> io::Result<usize> {
        use std::os::unix::io::AsRawFd;

        let mut count: libc::c_int = 0;
        // SAFETY: FIONREAD writes a single c_int through the pointer, and the
        // descriptor stays open for as long as `self.port` lives.
        let res = unsafe {
            libc::ioctl(
                self.port.as_raw_fd(),
                libc::FIONREAD,
                &mut count as *mut libc::c_int,
            )
        };
        if res == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(count.max(0) as usize)
    }

    // No portable way to ask, so claim a chunk's worth and let the
    // zero-timeout read come back empty.
    #[cfg(not(unix))]
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(256)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

/// Opens [SerialTransport]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl DeviceConnector for SerialConnector {
    type Transport = SerialTransport;

    fn connect(
        &mut self,
        port: &str,
        settings: &DeviceSettings,
    ) -> Result<SerialTransport, CaptureError> {
        let transport =
            SerialTransport::open(port, settings).map_err(|source| CaptureError::Connection {
                port: port.to_owned(),
                source,
            })?;
        info!("connected to {} at {} baud", port, settings.baud_rate);
        Ok(transport)
    }
}

/// Every serial port the operating system knows about.
pub fn available_ports() -> io::Result<Vec<PathBuf>> {
    SerialPort::available_ports()
}
