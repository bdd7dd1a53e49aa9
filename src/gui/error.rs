use std::{error::Error, fmt::Display, io};

use crate::error::CaptureError;

/// Errors that end a terminal screen.
#[derive(Debug)]
pub enum GuiError {
    /// The terminal could not be driven.
    IOError(io::Error),
    /// The session could not be wound down when leaving the screen.
    CaptureError(CaptureError),
}

impl Display for GuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuiError::IOError(e) => write!(f, "terminal error: {}", e),
            GuiError::CaptureError(e) => write!(f, "{}", e),
        }
    }
}

impl Error for GuiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GuiError::IOError(e) => Some(e),
            GuiError::CaptureError(e) => Some(e),
        }
    }
}

impl From<io::Error> for GuiError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<CaptureError> for GuiError {
    fn from(value: CaptureError) -> Self {
        Self::CaptureError(value)
    }
}
