//! How to run a study
//!
//!
//! # Before the study
//!
//! Plug in the response box and check that it talks. The `monitor` binary
//! prints every line the box sends, stamped with the time it arrived:
//!
//! ```shell
//! cargo run --bin monitor --release -- --port /dev/ttyUSB0
//! ```
//!
//! Leave out `--port` to pick from the serial ports the system knows about,
//! or pass `--list-ports` to just print them. Without a box at hand,
//! `--dummy` simulates one that answers every second or two.
//!
//! # Running participants
//!
//! ```shell
//! cargo run --bin likert-capture --release -- --port COM3 --study StudyA
//! ```
//!
//! The screen has three fields: the port, the study name, and the filename
//! for the participant. All three are needed. Move between them with
//! `<Tab>` and press `<Enter>` to start. The fields lock while collecting.
//!
//! While collecting, keys `1` to `5` record an answer on the scale, and
//! every line from the response box is recorded as it arrives. Each answer
//! shows up on the status line. `<Esc>` stops.
//!
//! After every stop the screen asks whether to add another participant to
//! the same study. Answer `<Y>` and only the filename opens up: type the
//! next participant's name and press `<Enter>`. Answer `<N>` to end the
//! study; every field opens up again, so the next study can use another
//! port.
//!
//! Quitting with `<Esc>` or `<Ctrl-C>` while collecting stops the session
//! first, so the file is always closed properly.
//!
//! # Output files
//!
//! Each participant's answers go to `<filename>.csv` in the output directory.
//! Files are only ever appended to: starting again with the same filename
//! adds a new session to the end instead of replacing what was there.
//!
//! ```text
//! Study: StudyA, Start Time: 2024-05-01 10:00:00
//! Timestamp,Participant,Response
//! 2024-05-01 10:00:00,3
//! 2024-05-01 10:00:02,5
//! End Time: 2024-05-01 10:00:05
//! ```
//!
//! The column header mentions a `Participant` column, but rows only ever hold
//! the timestamp and the response. The participant is identified by the
//! file. Rows from the response box hold whatever text the box sent.
//!
//! Rows are written to disk one at a time as they are recorded. If the
//! program dies mid-session the rows are safe, only the `End Time` line is
//! missing.
//!
//! # Settings
//!
//! Settings that rarely change live in an optional [ron] file passed with
//! `--config`. See [CaptureConfig](crate::config::CaptureConfig) for the
//! fields. `--baud` and `--output-dir` override the file.
//!
//! Set `RUST_LOG=debug` to see every line and row as it goes by; logs go to
//! stderr, so redirect it when running the screen.
