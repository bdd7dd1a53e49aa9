//! Response values and the records they become once written.

use std::fmt::{self, Display};

use chrono::NaiveDateTime;

/// The number of points on the response scale.
pub const SCALE_POINTS: u8 = 5;

/// A point on the five-point Likert scale, always in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LikertValue(u8);

impl LikertValue {
    /// Returns `None` if `value` is off the scale.
    pub fn new(value: u8) -> Option<Self> {
        (1..=SCALE_POINTS).contains(&value).then_some(Self(value))
    }

    /// Every point on the scale, lowest first.
    pub fn all() -> impl Iterator<Item = LikertValue> {
        (1..=SCALE_POINTS).map(Self)
    }

    #[allow(missing_docs)]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Display for LikertValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One response, from either of the two sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A button press on the scale.
    Scale(LikertValue),
    /// A trimmed, non-empty line sent by the response device. Written to the
    /// file verbatim.
    Device(String),
}

impl Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Scale(value) => write!(f, "{}", value),
            Response::Device(line) => write!(f, "{}", line),
        }
    }
}

impl From<LikertValue> for Response {
    fn from(value: LikertValue) -> Self {
        Response::Scale(value)
    }
}

impl From<String> for Response {
    fn from(value: String) -> Self {
        Response::Device(value)
    }
}

impl From<&str> for Response {
    fn from(value: &str) -> Self {
        Response::Device(value.to_owned())
    }
}

/// A response as it was written: the row's timestamp and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    #[allow(missing_docs)]
    pub timestamp: NaiveDateTime,
    #[allow(missing_docs)]
    pub value: Response,
}
