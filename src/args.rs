// Commandline argument parsers using clap for the capture tools

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::{config::CaptureConfig, error::CaptureError};

/// Options shared by both binaries for reaching the response device.
#[derive(Debug, Args, Clone)]
pub struct DeviceArgs {
    /// Serial port of the response device, e.g. COM3 or /dev/ttyUSB0.
    /// Without it, you are asked to pick one
    #[arg(short, long)]
    pub port: Option<String>,

    /// Use a simulated response device instead of a serial port
    #[arg(long, conflicts_with = "port")]
    pub dummy: bool,

    /// Print the available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// RON file with capture settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Baud rate of the response device, overrides the config file
    #[arg(short, long)]
    pub baud: Option<u32>,
}

impl DeviceArgs {
    /// The config file if one was given, otherwise the defaults, with the
    /// command line overrides applied.
    pub fn load_config(&self) -> Result<CaptureConfig, CaptureError> {
        let mut config = match &self.config {
            Some(path) => CaptureConfig::from_path(path)?,
            None => CaptureConfig::default(),
        };
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        Ok(config)
    }
}

#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
/// Record Likert scale responses from buttons and a response device
pub struct CaptureArgs {
    #[command(flatten)]
    #[allow(missing_docs)]
    pub device: DeviceArgs,

    /// Prefill the study name
    #[arg(short, long)]
    pub study: Option<String>,

    /// Prefill the output filename, without extension
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Directory to write output files to, overrides the config file
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl CaptureArgs {
    /// [DeviceArgs::load_config()], plus the output directory override.
    pub fn load_config(&self) -> Result<CaptureConfig, CaptureError> {
        let mut config = self.device.load_config()?;
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
/// Print every line a response device sends, to check it before a study
pub struct MonitorArgs {
    #[command(flatten)]
    #[allow(missing_docs)]
    pub device: DeviceArgs,
}
