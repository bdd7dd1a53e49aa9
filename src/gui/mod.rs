//! Terminal screens for running a study.

mod capture_screen;
mod device_selector;
mod error;

pub use capture_screen::capture_screen;
pub use device_selector::device_selector;
pub use error::GuiError;
