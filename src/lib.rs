//! Likert capture records the answers participants give on a five point
//! response scale during an experiment. Answers come from two places: the
//! experimenter's screen, where each of the five points is a button, and a
//! response box on a serial line that sends one line of text per answer.
//! Every answer is stamped to the second and written straight through to one
//! file per participant, and any number of participants can be run, one
//! after the other, under a single study name.
//!
//! The heart of it is the [session::SessionController]; the rest feeds it
//! (the [device_poller], [serial_device] and [dummy_device] modules), writes
//! for it ([line_logger]), or drives it ([ticker], [gui]).
//!
//! See the [guide] for how to run a study.

#![warn(missing_docs)]
pub mod args;
pub mod clock;
pub mod config;
pub mod device_poller;
pub mod dummy_device;
pub mod error;
pub mod guide;
pub mod gui;
pub mod line_logger;
pub mod response;
pub mod serial_device;
pub mod session;
pub mod ticker;
pub mod transport;
