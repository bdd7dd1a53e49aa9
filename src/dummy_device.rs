//! A pretend response box, for trying things out without the hardware.
//!
//! A background thread plays a participant: every so often it "presses" a
//! random point on the scale and sends it down the line, and now and then it
//! sends a blank line, like a real box does when a button bounces.

use crate::{
    error::CaptureError,
    response::SCALE_POINTS,
    transport::{DeviceConnector, DeviceSettings, Transport},
};

use log::{info, warn};
use rand::prelude::*;
use std::{
    collections::VecDeque,
    io,
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

/// Port name that the dummy answers to in the front ends.
pub const DUMMY_PORT: &str = "dummy";

enum Signal {
    Gap(Duration, Duration),
    Noise(f64),
    Stop,
}

/// A simulated device, see the [module docs](self).
pub struct DummyDevice {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    line: Arc<Mutex<VecDeque<u8>>>,
}

/// Configures a [DummyDevice] before its thread starts.
#[derive(Debug, Clone)]
pub struct DummyDeviceBuilder {
    min_gap: Duration,
    max_gap: Duration,
    noise: f64,
}

impl Default for DummyDeviceBuilder {
    fn default() -> Self {
        Self {
            min_gap: Duration::from_millis(800),
            max_gap: Duration::from_millis(3000),
            noise: 0.1,
        }
    }
}

impl DummyDeviceBuilder {
    /// Shortest and longest pause between two responses.
    pub fn gap(self, min_gap: Duration, max_gap: Duration) -> Self {
        Self {
            min_gap,
            max_gap: max_gap.max(min_gap),
            ..self
        }
    }

    /// Chance, from 0 to 1, that a response is followed by a blank line.
    pub fn noise(self, noise: f64) -> Self {
        Self {
            noise: noise.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Starts the device.
    pub fn build(self) -> DummyDevice {
        let (tx, rx) = mpsc::channel::<Signal>();
        let line = Arc::new(Mutex::new(VecDeque::new()));
        let th_line = Arc::clone(&line);

        let handle = thread::spawn(move || {
            let mut rng = thread_rng();
            let (mut min_gap, mut max_gap, mut noise) = (self.min_gap, self.max_gap, self.noise);
            loop {
                let gap = rng.gen_range(min_gap..=max_gap);
                match rx.recv_timeout(gap) {
                    Ok(Signal::Gap(new_min, new_max)) => {
                        min_gap = new_min;
                        max_gap = new_max.max(new_min);
                    }
                    Ok(Signal::Noise(new_noise)) => noise = new_noise,
                    Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        let mut bytes = format!("{}\r\n", rng.gen_range(1..=SCALE_POINTS));
                        if rng.gen_bool(noise) {
                            bytes.push_str("\r\n");
                        }
                        if let Ok(mut line) = th_line.lock() {
                            line.extend(bytes.as_bytes());
                        }
                    }
                }
            }
        });

        DummyDevice {
            handle: Some(handle),
            tx,
            line,
        }
    }
}

impl DummyDevice {
    #[allow(missing_docs)]
    pub fn builder() -> DummyDeviceBuilder {
        DummyDeviceBuilder::default()
    }

    /// Changes how long the pretend participant takes to answer.
    pub fn set_gap(&self, min_gap: Duration, max_gap: Duration) {
        // A send only fails once the thread is gone, and then there is
        // nothing left to configure.
        let _ = self.tx.send(Signal::Gap(min_gap, max_gap));
    }

    /// Changes how often blank lines are mixed in.
    pub fn set_noise(&self, noise: f64) {
        // Same as in set_gap
        let _ = self.tx.send(Signal::Noise(noise.clamp(0.0, 1.0)));
    }

    /// Stops the generator thread and waits for it. A thread that died
    /// early is reported when it is joined.
    pub fn stop(&mut self) {
        // A failed send means the thread already exited; join tells us how
        let _ = self.tx.send(Signal::Stop);
        // `.join()` consumes the handle, so take it out of the struct first
        if let Some(thread) = self.handle.take() {
            if thread.join().is_err() {
                warn!("Dummy device thread panicked");
            }
        }
    }

    fn line(&self) -> io::Result<std::sync::MutexGuard<'_, VecDeque<u8>>> {
        self.line
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "dummy device thread panicked"))
    }
}

impl Transport for DummyDevice {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.line()?.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut line = self.line()?;
        let n = buf.len().min(line.len());
        for (slot, byte) in buf.iter_mut().zip(line.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn close(&mut self) -> io::Result<()> {
        self.stop();
        Ok(())
    }
}

impl Drop for DummyDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Hands out a fresh [DummyDevice] for every connection, whatever the port.
#[derive(Debug, Default, Clone)]
pub struct DummyConnector {
    #[allow(missing_docs)]
    pub builder: DummyDeviceBuilder,
}

impl DeviceConnector for DummyConnector {
    type Transport = DummyDevice;

    fn connect(
        &mut self,
        port: &str,
        _settings: &DeviceSettings,
    ) -> Result<DummyDevice, CaptureError> {
        info!("connected to a dummy device as {}", port);
        Ok(self.builder.clone().build())
    }
}
