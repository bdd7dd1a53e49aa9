//! The experimenter's screen for running a study.
//!
//! Example:
//! cargo run --bin likert-capture --release -- --port COM3 --study StudyA

use std::error::Error;

use clap::Parser;
use likert::{
    args::{CaptureArgs, DeviceArgs},
    config::CaptureConfig,
    dummy_device::{DummyConnector, DUMMY_PORT},
    gui::{capture_screen, device_selector},
    serial_device::{available_ports, SerialConnector},
    session::{Field, SessionController},
    transport::DeviceConnector,
};
use log::info;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CaptureArgs::parse();

    if args.device.list_ports {
        for port in available_ports()? {
            println!("{}", port.to_string_lossy());
        }
        return Ok(());
    }

    let config = args.load_config()?;
    info!("capturing with {:?}", config);

    if args.device.dummy {
        run(DummyConnector::default(), config, DUMMY_PORT.to_owned(), &args)
    } else {
        let port = choose_port(&args.device)?;
        run(SerialConnector, config, port, &args)
    }
}

// The port from the command line, or the one picked from the list. Empty if
// neither, so it can be typed into the screen instead.
fn choose_port(args: &DeviceArgs) -> Result<String, Box<dyn Error>> {
    if let Some(port) = &args.port {
        return Ok(port.clone());
    }
    let picked = device_selector(available_ports()?)?;
    Ok(picked
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default())
}

fn run<C: DeviceConnector>(
    connector: C,
    config: CaptureConfig,
    port: String,
    args: &CaptureArgs,
) -> Result<(), Box<dyn Error>> {
    let mut controller = SessionController::new(connector, config);
    controller.set_field(Field::Port, &port)?;
    if let Some(study) = &args.study {
        controller.set_field(Field::Study, study)?;
    }
    if let Some(filename) = &args.filename {
        controller.set_field(Field::Filename, filename)?;
    }

    capture_screen(controller)?;
    Ok(())
}
