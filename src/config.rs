//! Settings that stay the same across a study.
//!
//! They can be loaded from a [ron] file, where every field is optional:
//!
//! ```text
//! (
//!     baud_rate: 9600,
//!     read_timeout_ms: 1000,
//!     tick_interval_ms: 100,
//!     output_dir: "data",
//!     extension: "csv",
//! )
//! ```

use crate::{error::CaptureError, transport::DeviceSettings};

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Settings for a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Line speed of the response device.
    pub baud_rate: u32,
    /// Longest a single device read may wait, in milliseconds.
    pub read_timeout_ms: u64,
    /// How often the device is polled, in milliseconds.
    pub tick_interval_ms: u64,
    /// Directory output files are created in.
    pub output_dir: PathBuf,
    /// Extension given to every output file, without the dot.
    pub extension: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let device = DeviceSettings::default();
        Self {
            baud_rate: device.baud_rate,
            read_timeout_ms: device.read_timeout.as_millis() as u64,
            tick_interval_ms: 100,
            output_dir: PathBuf::from("."),
            extension: "csv".to_owned(),
        }
    }
}

impl CaptureConfig {
    /// Reads a config from the [ron] file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let text = fs::read_to_string(path).map_err(CaptureError::ConfigIo)?;
        Self::from_ron(&text)
    }

    /// Parses a config from [ron] text.
    pub fn from_ron(text: &str) -> Result<Self, CaptureError> {
        Ok(ron::de::from_str(text)?)
    }

    /// How the response device should be opened.
    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }

    /// The interval between two device polls.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Where the output for `filename` goes. The extension is appended, not
    /// substituted, so `p1.v2` becomes `p1.v2.csv`.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", filename, self.extension))
    }
}
