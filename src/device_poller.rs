//! Turns a response device's byte stream into discrete response lines,
//! without ever making the caller wait.

use crate::{
    error::CaptureError,
    transport::{DeviceConnector, DeviceSettings, Transport},
};

use log::{debug, warn};
use std::{io, str};

/// Bytes read from the transport per call, at most.
const READ_CHUNK: usize = 256;

/// A device that never sends a newline shouldn't grow the buffer forever.
const MAX_LINE_LEN: usize = 4096;

/// Keeps one poll bounded when a device streams faster than we tick.
const MAX_FILLS_PER_POLL: usize = MAX_LINE_LEN / READ_CHUNK + 1;

/// Owns the connection to a response device and hands out one complete line
/// per [DevicePoller::poll()].
#[derive(Debug)]
pub struct DevicePoller<T: Transport> {
    transport: Option<T>,
    read_buf: Vec<u8>,
    // Set while the transport is erroring, so a pulled cable doesn't log
    // a warning every tick.
    faulted: bool,
    // Set after an over-long line was cut; everything up to and including
    // its newline is dropped.
    discarding: bool,
}

impl<T: Transport> DevicePoller<T> {
    /// Opens `port` through `connector`.
    pub fn open<C>(
        connector: &mut C,
        port: &str,
        settings: &DeviceSettings,
    ) -> Result<Self, CaptureError>
    where
        C: DeviceConnector<Transport = T>,
    {
        let transport = connector.connect(port, settings)?;
        debug!("opened device on {} at {} baud", port, settings.baud_rate);
        Ok(Self::new(transport))
    }

    /// Wraps an already open transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            read_buf: Vec::new(),
            faulted: false,
            discarding: false,
        }
    }

    /// Returns the next complete, non-empty line, trimmed, if one has arrived.
    ///
    /// Never blocks. Partial lines stay buffered until their newline shows
    /// up. Blank lines, lines that aren't UTF-8, and transport errors all
    /// come back as `None`; a live session should not die because of line
    /// noise.
    pub fn poll(&mut self) -> Option<String> {
        for _ in 0..MAX_FILLS_PER_POLL {
            while let Some(raw) = self.take_line() {
                if let Some(line) = decode_line(&raw) {
                    return Some(line);
                }
            }

            match self.fill() {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    if !self.faulted {
                        warn!("Failed to read from device: {}", e);
                        self.faulted = true;
                    }
                    return None;
                }
            }
        }
        None
    }

    /// Releases the transport. Safe to call any number of times.
    pub fn close(&mut self) -> Result<(), CaptureError> {
        self.read_buf.clear();
        self.discarding = false;
        match self.transport.take() {
            Some(mut transport) => {
                debug!("closing device");
                transport.close().map_err(CaptureError::from)
            }
            None => Ok(()),
        }
    }

    /// `true` until [DevicePoller::close()] has been called.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Pulls whatever the transport has ready into the line buffer and
    /// returns how many bytes that was.
    fn fill(&mut self) -> io::Result<usize> {
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => return Ok(0),
        };

        let available = transport.bytes_available()?;
        if available == 0 {
            self.faulted = false;
            return Ok(0);
        }

        let mut buffer = [0; READ_CHUNK];
        let want = available.min(READ_CHUNK);
        let read_len = match transport.read(&mut buffer[..want]) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => 0,
            Err(e) => return Err(e),
        };
        self.faulted = false;
        self.read_buf.extend_from_slice(&buffer[..read_len]);
        self.cut_runaway_line();
        Ok(read_len)
    }

    // Drops a line that grew past MAX_LINE_LEN, including whatever of it
    // arrives later, so no tail of it is ever handed out as a line.
    fn cut_runaway_line(&mut self) {
        if self.discarding {
            match self.read_buf.iter().position(|&c| c == b'\n') {
                Some(end) => {
                    self.read_buf.drain(..=end);
                    self.discarding = false;
                    debug!("Resynchronised with device after an over-long line");
                }
                None => self.read_buf.clear(),
            }
        }

        if !self.discarding
            && self.read_buf.len() > MAX_LINE_LEN
            && !self.read_buf.contains(&b'\n')
        {
            warn!(
                "Discarding {} bytes from device with no line ending",
                self.read_buf.len()
            );
            self.read_buf.clear();
            self.discarding = true;
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.read_buf.iter().position(|&c| c == b'\n')?;
        let line = self.read_buf.drain(..=end).collect();
        Some(line)
    }
}

/// Decodes and trims one raw line. `None` means the line was noise.
fn decode_line(raw: &[u8]) -> Option<String> {
    match str::from_utf8(raw) {
        Ok(s) => {
            let line = s.trim();
            if line.is_empty() {
                None
            } else {
                debug!("Received {:?} from device", line);
                Some(line.to_owned())
            }
        }
        // Often happens right after the port opens, while there is still
        // garbage in the hardware buffer
        Err(e) => {
            warn!("Failed to decode utf-8 from device: {:?}", e);
            None
        }
    }
}
