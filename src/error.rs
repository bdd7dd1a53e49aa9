//! The error type shared by every part of the capture pipeline.

use std::{borrow::Cow, fmt, io};

use crate::session::Field;

/// Everything that can go wrong while opening, running, or closing a
/// participant session.
#[derive(Debug)]
pub enum CaptureError {
    /// Returned by [SessionController::start()](crate::session::SessionController::start)
    /// when a required field is empty. Nothing has been opened.
    Validation(Field),

    /// Returned when the response device could not be opened, because the
    /// port does not exist, is busy, or the device was unplugged.
    Connection {
        /// The port identifier that was tried.
        port: String,
        /// What the operating system told us.
        source: io::Error,
    },

    /// Returned when io fails while opening or writing the output file.
    Io(io::Error),

    /// Returned when an operation is invoked in a state that does not
    /// permit it, such as writing to a closed logger.
    IllegalState(&'static str),

    /// Returned when more than one step failed while releasing a session's
    /// resources.
    Release(Vec<CaptureError>),

    /// Returned when the configuration file could not be read.
    ConfigIo(io::Error),

    /// Returned when the configuration file is not valid RON.
    Config(ron::de::SpannedError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use CaptureError as CE;
        let msg = match self {
            CE::Validation(field) => Cow::from(format!("please enter the {}", field)),
            CE::Connection { port, source } => Cow::from(format!(
                "could not open port {}: {}, please check the connection and try again",
                port, source
            )),
            CE::Io(error) => Cow::from(format!("io error: {}", error)),
            CE::IllegalState(what) => Cow::from(format!("illegal state: {}", what)),
            CE::Release(errors) => Cow::from(format!(
                "failed to release session resources: {}",
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            )),
            CE::ConfigIo(error) => Cow::from(format!("could not read config: {}", error)),
            CE::Config(error) => Cow::from(format!("config error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Connection { source, .. } => Some(source),
            CaptureError::Io(error) | CaptureError::ConfigIo(error) => Some(error),
            CaptureError::Config(error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for CaptureError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ron::de::SpannedError> for CaptureError {
    fn from(value: ron::de::SpannedError) -> Self {
        Self::Config(value)
    }
}

impl CaptureError {
    /// Folds the failures collected while releasing resources into at most
    /// one error.
    pub fn aggregate(mut errors: Vec<CaptureError>) -> Option<CaptureError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(CaptureError::Release(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_nothing_is_none() {
        assert!(CaptureError::aggregate(vec![]).is_none());
    }

    #[test]
    fn aggregate_single_error_is_unwrapped() {
        let err = CaptureError::aggregate(vec![CaptureError::IllegalState("closed")]);
        assert!(matches!(err, Some(CaptureError::IllegalState("closed"))));
    }

    #[test]
    fn aggregate_many_errors_are_released_together() {
        let err = CaptureError::aggregate(vec![
            CaptureError::IllegalState("first"),
            CaptureError::Io(io::Error::new(io::ErrorKind::Other, "second")),
        ])
        .unwrap();
        match &err {
            CaptureError::Release(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        let msg = err.to_string();
        assert!(msg.contains("first"));
        assert!(msg.contains("second"));
    }

    #[test]
    fn validation_message_names_the_field() {
        let msg = CaptureError::Validation(Field::Filename).to_string();
        assert_eq!(msg, "please enter the filename");
    }
}
