//! Prints every line a response device sends, one `timestamp,line` per row,
//! until interrupted.
//!
//! Example:
//! cargo run --bin monitor --release -- --port /dev/ttyUSB0

use std::error::Error;

use clap::Parser;
use likert::{
    args::MonitorArgs,
    clock::{format_timestamp, Clock, SystemClock},
    config::CaptureConfig,
    device_poller::DevicePoller,
    dummy_device::{DummyConnector, DUMMY_PORT},
    gui::device_selector,
    serial_device::{available_ports, SerialConnector},
    ticker::Ticker,
    transport::DeviceConnector,
};
use log::{info, warn};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = MonitorArgs::parse();

    if args.device.list_ports {
        for port in available_ports()? {
            println!("{}", port.to_string_lossy());
        }
        return Ok(());
    }

    let config = args.device.load_config()?;

    if args.device.dummy {
        return monitor(DummyConnector::default(), DUMMY_PORT, &config);
    }

    let port = match &args.device.port {
        Some(port) => port.clone(),
        None => match device_selector(available_ports()?)? {
            Some(path) => path.to_string_lossy().into_owned(),
            None => {
                warn!("no port selected");
                return Ok(());
            }
        },
    };
    monitor(SerialConnector, &port, &config)
}

fn monitor<C: DeviceConnector>(
    mut connector: C,
    port: &str,
    config: &CaptureConfig,
) -> Result<(), Box<dyn Error>> {
    let mut poller = DevicePoller::open(&mut connector, port, &config.device_settings())?;
    let mut ticker = Ticker::new(config.tick_interval(), std::time::Instant::now());
    info!("monitoring {}, polling every {:?}", port, ticker.interval());

    loop {
        ticker.wait();
        // Drain everything that arrived since the last tick
        while let Some(line) = poller.poll() {
            println!("{},{}", format_timestamp(&SystemClock.now()), line);
        }
    }
}
