//! The experiment session controller.
//!
//! A [SessionController] runs one study: a sequence of participant sessions
//! that share a study name and a response device. It moves between three
//! states:
//!
//! ```text
//!            start()                stop()
//!   Idle ─────────────▶ Collecting ─────────▶ Stopped
//!    ▲                      ▲                    │
//!    │                      │ start()            │ continue_study(..)
//!    │                      └────────────────────┤
//!    └───────────────────────────────────────────┘
//!          continue_study(false)
//! ```
//!
//! While collecting, responses come in from two places: the UI calls
//! [SessionController::record()] on a button press, and whoever drives the
//! [Ticker](crate::ticker::Ticker) calls [SessionController::tick()], which
//! polls the device once. Both run on the caller's one thread, so rows land
//! in the file in exactly the order the calls were made.
//!
//! The controller also owns the three input fields a UI shows (port, study,
//! filename) and whether each one may currently be edited.

use crate::{
    clock::{format_timestamp, Clock, SystemClock},
    config::CaptureConfig,
    device_poller::DevicePoller,
    error::CaptureError,
    line_logger::LineLogger,
    response::{Response, ResponseRecord},
    transport::{DeviceConnector, Transport},
};

use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

/// Where the controller is in a participant session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session has run yet, or the last study ended.
    Idle,
    /// Responses are being accepted and written.
    Collecting,
    /// A session just ended.
    Stopped,
}

/// The three values a session is started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Identifier of the response device's port, e.g. `COM3`.
    Port,
    /// Name of the study, written into every participant file.
    Study,
    /// Output file name, without its extension.
    Filename,
}

impl Field {
    /// In the order a form shows them.
    pub const ALL: [Field; 3] = [Field::Port, Field::Study, Field::Filename];
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Port => "port",
            Field::Study => "study name",
            Field::Filename => "filename",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Default, Clone)]
struct FieldState {
    value: String,
    locked: bool,
}

/// What became of a participant session once it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    #[allow(missing_docs)]
    pub study: String,
    /// The file the session was appended to.
    pub path: PathBuf,
    #[allow(missing_docs)]
    pub start_time: NaiveDateTime,
    #[allow(missing_docs)]
    pub end_time: NaiveDateTime,
    /// Rows written, not counting header and footer.
    pub responses: usize,
}

// The resources of the one session that is collecting.
struct ActiveSession<T: Transport> {
    logger: LineLogger,
    device: DevicePoller<T>,
    study: String,
    start_time: NaiveDateTime,
    responses: usize,
}

/// Runs the participant sessions of one study. See the [module docs](self).
pub struct SessionController<C, K = SystemClock>
where
    C: DeviceConnector,
    K: Clock,
{
    connector: C,
    clock: K,
    config: CaptureConfig,
    status: SessionStatus,
    port: FieldState,
    study: FieldState,
    filename: FieldState,
    active: Option<ActiveSession<C::Transport>>,
    continuation_pending: bool,
    last_session: Option<SessionSummary>,
}

impl<C: DeviceConnector> SessionController<C, SystemClock> {
    /// A controller that stamps rows with the local system time.
    pub fn new(connector: C, config: CaptureConfig) -> Self {
        Self::with_clock(connector, config, SystemClock)
    }
}

impl<C, K> SessionController<C, K>
where
    C: DeviceConnector,
    K: Clock,
{
    /// A controller that stamps rows with `clock`.
    pub fn with_clock(connector: C, config: CaptureConfig, clock: K) -> Self {
        Self {
            connector,
            clock,
            config,
            status: SessionStatus::Idle,
            port: FieldState::default(),
            study: FieldState::default(),
            filename: FieldState::default(),
            active: None,
            continuation_pending: false,
            last_session: None,
        }
    }

    /// Starts collecting for one participant.
    ///
    /// All three values must be non-blank. The device is opened first, then
    /// the output file; if the file can't be opened the device is closed
    /// again, and if the device can't be opened no file is created. On
    /// success every field is locked. On failure the controller is Idle with
    /// every field editable.
    ///
    /// While the port or study is locked for a continuing study, `port` and
    /// `study` must match it; a mismatch is rejected with
    /// [CaptureError::IllegalState] and changes nothing.
    pub fn start(&mut self, port: &str, study: &str, filename: &str) -> Result<(), CaptureError> {
        if self.status == SessionStatus::Collecting {
            return Err(CaptureError::IllegalState(
                "a participant session is already collecting",
            ));
        }
        if self.port.locked && self.port.value != port {
            return Err(CaptureError::IllegalState(
                "the port is locked until the study ends",
            ));
        }
        if self.study.locked && self.study.value != study {
            return Err(CaptureError::IllegalState(
                "the study name is locked until the study ends",
            ));
        }

        self.port.value = port.to_owned();
        self.study.value = study.to_owned();
        self.filename.value = filename.to_owned();
        self.continuation_pending = false;

        match self.open_session(port, study, filename) {
            Ok(session) => {
                info!(
                    "Started collecting for study {} into {} at {}",
                    study,
                    session.logger.path().display(),
                    format_timestamp(&session.start_time)
                );
                self.active = Some(session);
                self.status = SessionStatus::Collecting;
                self.set_locks(true, true, true);
                Ok(())
            }
            Err(e) => {
                warn!("Could not start session: {}", e);
                self.status = SessionStatus::Idle;
                self.set_locks(false, false, false);
                Err(e)
            }
        }
    }

    /// [SessionController::start()] with the current field values.
    pub fn start_from_fields(&mut self) -> Result<(), CaptureError> {
        let (port, study, filename) = (
            self.port.value.clone(),
            self.study.value.clone(),
            self.filename.value.clone(),
        );
        self.start(&port, &study, &filename)
    }

    /// Starts the next participant of the current study into `filename`,
    /// reusing the port and study name of the previous session.
    pub fn start_next_participant(&mut self, filename: &str) -> Result<(), CaptureError> {
        let (port, study) = (self.port.value.clone(), self.study.value.clone());
        self.start(&port, &study, filename)
    }

    /// Writes one response, stamped with the current time.
    ///
    /// Responses that arrive while not collecting are dropped, and `Ok(None)`
    /// is returned. If the row can't be written, collection stops and the
    /// write error is returned.
    pub fn record(
        &mut self,
        value: impl Into<Response>,
    ) -> Result<Option<ResponseRecord>, CaptureError> {
        let value = value.into();
        let session = match (self.status, self.active.as_mut()) {
            (SessionStatus::Collecting, Some(session)) => session,
            _ => {
                debug!("Dropping response {} while not collecting", value);
                return Ok(None);
            }
        };

        let timestamp = self.clock.now();
        match session.logger.append(&timestamp, &value) {
            Ok(()) => {
                session.responses += 1;
                debug!("Recorded {} at {}", value, format_timestamp(&timestamp));
                Ok(Some(ResponseRecord { timestamp, value }))
            }
            Err(e) => {
                error!("Failed to write response {}, stopping collection: {}", value, e);
                if let Err(stop_error) = self.stop() {
                    error!("Failed to release session after write error: {}", stop_error);
                }
                Err(e)
            }
        }
    }

    /// One scheduling quantum: polls the device once while collecting and
    /// records the line it returns, if any. Does nothing otherwise.
    pub fn tick(&mut self) -> Result<Option<ResponseRecord>, CaptureError> {
        if self.status != SessionStatus::Collecting {
            return Ok(None);
        }

        let line = self.active.as_mut().and_then(|session| session.device.poll());
        match line {
            Some(line) => self.record(Response::Device(line)),
            None => Ok(None),
        }
    }

    /// Ends the current participant session.
    ///
    /// Writes the footer and releases the file and the device, attempting
    /// both even if one fails. The controller is Stopped afterwards no matter
    /// what, and a continuation decision is pending; see
    /// [SessionController::continue_study()]. Does nothing if not
    /// collecting.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if self.status != SessionStatus::Collecting {
            return Ok(());
        }
        self.status = SessionStatus::Stopped;
        self.continuation_pending = true;

        let Some(mut session) = self.active.take() else {
            return Ok(());
        };

        let end_time = self.clock.now();
        let mut errors = Vec::new();
        if let Err(e) = session.logger.close(&end_time) {
            errors.push(e);
        }
        if let Err(e) = session.device.close() {
            errors.push(e);
        }

        info!(
            "Stopped collecting for study {} at {}, {} responses",
            session.study,
            format_timestamp(&end_time),
            session.responses
        );
        self.last_session = Some(SessionSummary {
            study: session.study,
            path: session.logger.path().to_path_buf(),
            start_time: session.start_time,
            end_time,
            responses: session.responses,
        });

        match CaptureError::aggregate(errors) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Answers "add another participant to the same study?" after a stop.
    ///
    /// `true` unlocks only the filename; the port and study stay locked and
    /// the next start reuses them. `false` ends the study: every field is
    /// unlocked and the controller goes back to Idle.
    pub fn continue_study(&mut self, another_participant: bool) -> Result<(), CaptureError> {
        if self.status != SessionStatus::Stopped || !self.continuation_pending {
            return Err(CaptureError::IllegalState(
                "no stopped session is waiting for a continuation decision",
            ));
        }
        self.continuation_pending = false;

        if another_participant {
            info!("Continuing study {} with another participant", self.study.value);
            self.filename.locked = false;
        } else {
            info!("Study {} ended", self.study.value);
            self.set_locks(false, false, false);
            self.status = SessionStatus::Idle;
        }
        Ok(())
    }

    /// Changes a field's value, unless it is locked.
    pub fn set_field(&mut self, field: Field, value: &str) -> Result<(), CaptureError> {
        let state = self.field_state_mut(field);
        if state.locked {
            return Err(CaptureError::IllegalState("that field is locked"));
        }
        state.value = value.to_owned();
        Ok(())
    }

    #[allow(missing_docs)]
    pub fn field(&self, field: Field) -> &str {
        &self.field_state(field).value
    }

    /// Whether the UI must keep `field` read-only right now.
    pub fn is_locked(&self, field: Field) -> bool {
        self.field_state(field).locked
    }

    #[allow(missing_docs)]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[allow(missing_docs)]
    pub fn is_collecting(&self) -> bool {
        self.status == SessionStatus::Collecting
    }

    /// `true` between a stop and the matching
    /// [SessionController::continue_study()].
    pub fn awaiting_continuation(&self) -> bool {
        self.continuation_pending
    }

    /// The file the collecting session writes to.
    pub fn output_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|session| session.logger.path())
    }

    /// Rows written so far by the collecting session.
    pub fn responses(&self) -> usize {
        self.active.as_ref().map_or(0, |session| session.responses)
    }

    /// The most recently stopped session.
    pub fn last_session(&self) -> Option<&SessionSummary> {
        self.last_session.as_ref()
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    fn open_session(
        &mut self,
        port: &str,
        study: &str,
        filename: &str,
    ) -> Result<ActiveSession<C::Transport>, CaptureError> {
        for (field, value) in Field::ALL.into_iter().zip([port, study, filename]) {
            if value.trim().is_empty() {
                return Err(CaptureError::Validation(field));
            }
        }

        let mut device =
            DevicePoller::open(&mut self.connector, port, &self.config.device_settings())?;

        let start_time = self.clock.now();
        let path = self.config.output_path(filename);
        let logger = match LineLogger::open(&path, study, &start_time) {
            Ok(logger) => logger,
            Err(e) => {
                if let Err(close_error) = device.close() {
                    warn!("Failed to close device after file error: {}", close_error);
                }
                return Err(e);
            }
        };

        Ok(ActiveSession {
            logger,
            device,
            study: study.to_owned(),
            start_time,
            responses: 0,
        })
    }

    fn set_locks(&mut self, port: bool, study: bool, filename: bool) {
        self.port.locked = port;
        self.study.locked = study;
        self.filename.locked = filename;
    }

    fn field_state(&self, field: Field) -> &FieldState {
        match field {
            Field::Port => &self.port,
            Field::Study => &self.study,
            Field::Filename => &self.filename,
        }
    }

    fn field_state_mut(&mut self, field: Field) -> &mut FieldState {
        match field {
            Field::Port => &mut self.port,
            Field::Study => &mut self.study,
            Field::Filename => &mut self.filename,
        }
    }
}

impl<C, K> Drop for SessionController<C, K>
where
    C: DeviceConnector,
    K: Clock,
{
    // Quitting mid-session still closes the participant's file properly
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Failed to release session on shutdown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::manual::ManualClock,
        response::LikertValue,
        transport::fake::{FakeConnector, FakeDevice},
    };
    use std::{fs::read_to_string, io};
    use tempfile::TempDir;

    struct Rig {
        dir: TempDir,
        clock: ManualClock,
        connector: FakeConnector,
        controller: SessionController<FakeConnector, ManualClock>,
    }

    impl Rig {
        fn device(&self) -> &FakeDevice {
            &self.connector.device
        }

        fn read(&self, filename: &str) -> String {
            read_to_string(self.dir.path().join(format!("{}.csv", filename))).unwrap()
        }

        fn exists(&self, filename: &str) -> bool {
            self.dir.path().join(format!("{}.csv", filename)).exists()
        }
    }

    fn rig_with(connector: FakeConnector) -> Rig {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::at("2024-05-01 10:00:00");
        let config = CaptureConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let controller = SessionController::with_clock(connector.clone(), config, clock.clone());
        Rig {
            dir,
            clock,
            connector,
            controller,
        }
    }

    fn rig() -> Rig {
        rig_with(FakeConnector::default())
    }

    fn likert(v: u8) -> LikertValue {
        LikertValue::new(v).unwrap()
    }

    fn data_rows(contents: &str) -> Vec<&str> {
        contents
            .lines()
            .filter(|l| {
                !l.starts_with("Study: ")
                    && !l.starts_with("End Time: ")
                    && *l != crate::line_logger::COLUMN_HEADER
            })
            .collect()
    }

    #[test]
    fn example_session() {
        let mut rig = rig();
        rig.controller.start("COM3", "StudyA", "p1").unwrap();
        rig.controller.record(likert(3)).unwrap();
        rig.clock.set("2024-05-01 10:00:02");
        rig.controller.record(likert(5)).unwrap();
        rig.clock.set("2024-05-01 10:00:05");
        rig.controller.stop().unwrap();

        assert_eq!(
            rig.read("p1"),
            "Study: StudyA, Start Time: 2024-05-01 10:00:00\n\
             Timestamp,Participant,Response\n\
             2024-05-01 10:00:00,3\n\
             2024-05-01 10:00:02,5\n\
             End Time: 2024-05-01 10:00:05\n"
        );
        let summary = rig.controller.last_session().unwrap();
        assert_eq!(summary.responses, 2);
        assert_eq!(summary.study, "StudyA");
    }

    #[test]
    fn start_writes_headers_before_any_row() {
        let mut rig = rig();
        rig.controller.start("COM3", "StudyA", "p1").unwrap();

        assert_eq!(rig.controller.status(), SessionStatus::Collecting);
        let contents = rig.read("p1");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Study: StudyA, Start Time: 2024-05-01 10:00:00",
                "Timestamp,Participant,Response",
            ]
        );
        assert_eq!(
            rig.controller.output_path(),
            Some(rig.dir.path().join("p1.csv").as_path())
        );
        for field in Field::ALL {
            assert!(rig.controller.is_locked(field));
        }
    }

    #[test]
    fn rows_follow_call_order_and_keep_duplicates() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        for v in [2, 2, 4, 1] {
            rig.controller.record(likert(v)).unwrap();
        }
        rig.clock.set("2024-05-01 10:00:01");
        rig.controller.record("device says 5").unwrap();
        rig.controller.stop().unwrap();

        let contents = rig.read("p1");
        assert_eq!(
            data_rows(&contents),
            vec![
                "2024-05-01 10:00:00,2",
                "2024-05-01 10:00:00,2",
                "2024-05-01 10:00:00,4",
                "2024-05-01 10:00:00,1",
                "2024-05-01 10:00:01,device says 5",
            ]
        );
    }

    #[test]
    fn responses_outside_collection_are_dropped() {
        let mut rig = rig();
        assert_eq!(rig.controller.record(likert(1)).unwrap(), None);
        assert_eq!(rig.controller.tick().unwrap(), None);

        rig.controller.start("COM3", "S", "p1").unwrap();
        let record = rig.controller.record(likert(2)).unwrap().unwrap();
        assert_eq!(record.value, Response::Scale(likert(2)));
        rig.controller.stop().unwrap();

        assert_eq!(rig.controller.record(likert(3)).unwrap(), None);
        assert_eq!(data_rows(&rig.read("p1")), vec!["2024-05-01 10:00:00,2"]);
    }

    #[test]
    fn blank_fields_fail_validation_and_touch_nothing() {
        let mut rig = rig();
        let cases = [
            ("", "S", "p1", Field::Port),
            ("COM3", "", "p1", Field::Study),
            ("COM3", "S", "", Field::Filename),
            ("COM3", "S", "   ", Field::Filename),
        ];
        for (port, study, filename, missing) in cases {
            match rig.controller.start(port, study, filename) {
                Err(CaptureError::Validation(field)) => assert_eq!(field, missing),
                other => panic!("expected validation error, got {:?}", other),
            }
            assert_eq!(rig.controller.status(), SessionStatus::Idle);
        }

        assert!(rig.connector.connects.borrow().is_empty());
        assert_eq!(std::fs::read_dir(rig.dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn connection_failure_creates_no_file() {
        let mut rig = rig_with(FakeConnector {
            refuse: true,
            ..Default::default()
        });
        let res = rig.controller.start("COM3", "StudyA", "p1");

        assert!(matches!(res, Err(CaptureError::Connection { .. })));
        assert!(!rig.exists("p1"));
        assert_eq!(rig.controller.status(), SessionStatus::Idle);
        for field in Field::ALL {
            assert!(!rig.controller.is_locked(field));
        }
        // The user can fix the port and try again
        assert_eq!(rig.controller.field(Field::Port), "COM3");
        rig.controller.set_field(Field::Port, "COM4").unwrap();
    }

    #[test]
    fn file_failure_closes_the_device() {
        let mut rig = rig();
        let res = rig.controller.start("COM3", "S", "missing/dir/p1");

        assert!(matches!(res, Err(CaptureError::Io(_))));
        assert_eq!(rig.connector.connects.borrow().len(), 1);
        assert!(rig.device().is_closed());
        assert_eq!(rig.controller.status(), SessionStatus::Idle);
        assert!(!rig.controller.is_locked(Field::Filename));
    }

    #[test]
    fn cannot_start_twice() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        assert!(matches!(
            rig.controller.start("COM3", "S", "p2"),
            Err(CaptureError::IllegalState(_))
        ));
        assert!(rig.controller.is_collecting());
        assert!(!rig.exists("p2"));
    }

    #[test]
    fn stop_without_a_session_does_nothing() {
        let mut rig = rig();
        rig.controller.stop().unwrap();
        assert_eq!(rig.controller.status(), SessionStatus::Idle);
        assert!(!rig.controller.awaiting_continuation());
        assert!(rig.controller.last_session().is_none());
    }

    #[test]
    fn reusing_a_filename_appends() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        rig.controller.record(likert(1)).unwrap();
        rig.controller.record(likert(2)).unwrap();
        rig.controller.stop().unwrap();
        let first = rig.read("p1").lines().count();

        rig.controller.continue_study(true).unwrap();
        rig.controller.start_next_participant("p1").unwrap();
        rig.controller.record(likert(3)).unwrap();
        rig.controller.stop().unwrap();

        let contents = rig.read("p1");
        // 3 framing lines per session
        assert_eq!(first, 2 + 3);
        assert_eq!(contents.lines().count(), (2 + 3) + (1 + 3));
        assert_eq!(data_rows(&contents).len(), 3);
        assert_eq!(contents.matches("Study: S, Start Time:").count(), 2);
    }

    #[test]
    fn ticks_poll_only_while_collecting() {
        let mut rig = rig();
        rig.controller.tick().unwrap();
        assert_eq!(rig.device().polls(), 0);

        rig.controller.start("COM3", "S", "p1").unwrap();
        assert_eq!(rig.controller.tick().unwrap(), None);
        rig.device().send(b"4\r\n");
        let record = rig.controller.tick().unwrap().unwrap();
        assert_eq!(record.value, Response::Device("4".to_owned()));
        let polls = rig.device().polls();
        assert_eq!(polls, 2);

        rig.controller.stop().unwrap();
        rig.device().send(b"5\r\n");
        rig.controller.tick().unwrap();
        assert_eq!(rig.device().polls(), polls);
        assert_eq!(data_rows(&rig.read("p1")), vec!["2024-05-01 10:00:00,4"]);
    }

    #[test]
    fn device_and_buttons_interleave_in_call_order() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        rig.device().send(b"from device\n");
        rig.controller.record(likert(1)).unwrap();
        rig.controller.tick().unwrap();
        rig.controller.record(likert(2)).unwrap();
        rig.controller.stop().unwrap();

        assert_eq!(
            data_rows(&rig.read("p1")),
            vec![
                "2024-05-01 10:00:00,1",
                "2024-05-01 10:00:00,from device",
                "2024-05-01 10:00:00,2",
            ]
        );
    }

    #[test]
    fn stop_releases_everything_even_when_the_device_fails() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        rig.device().fail_close(io::ErrorKind::Other);
        rig.clock.set("2024-05-01 10:01:00");

        assert!(matches!(rig.controller.stop(), Err(CaptureError::Io(_))));
        assert_eq!(rig.controller.status(), SessionStatus::Stopped);
        assert!(rig.device().is_closed());
        assert!(rig.read("p1").ends_with("End Time: 2024-05-01 10:01:00\n"));
        assert!(rig.controller.awaiting_continuation());

        // Nothing is stuck: the next participant can start
        rig.controller.continue_study(true).unwrap();
        rig.controller.start_next_participant("p2").unwrap();
    }

    #[test]
    fn write_failure_stops_collection() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        rig.controller.record(likert(1)).unwrap();

        let read_only = std::fs::File::open(rig.dir.path().join("p1.csv")).unwrap();
        rig.controller
            .active
            .as_mut()
            .unwrap()
            .logger
            .swap_file(read_only);

        assert!(matches!(
            rig.controller.record(likert(2)),
            Err(CaptureError::Io(_))
        ));
        assert_eq!(rig.controller.status(), SessionStatus::Stopped);
        assert!(rig.controller.awaiting_continuation());
        assert!(rig.device().is_closed());
        assert_eq!(rig.controller.output_path(), None);
        assert_eq!(rig.controller.last_session().unwrap().responses, 1);
        assert_eq!(data_rows(&rig.read("p1")), vec!["2024-05-01 10:00:00,1"]);

        // Later responses are dropped, not written
        assert_eq!(rig.controller.record(likert(3)).unwrap(), None);
    }

    #[test]
    fn stop_keeps_fields_locked_until_the_decision() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        rig.controller.stop().unwrap();

        assert_eq!(rig.controller.status(), SessionStatus::Stopped);
        assert!(rig.controller.awaiting_continuation());
        for field in Field::ALL {
            assert!(rig.controller.is_locked(field));
        }
    }

    #[test]
    fn continuing_reuses_port_and_study() {
        let mut rig = rig();
        rig.controller.start("COM3", "StudyA", "p1").unwrap();
        rig.controller.stop().unwrap();
        rig.controller.continue_study(true).unwrap();

        assert_eq!(rig.controller.status(), SessionStatus::Stopped);
        assert!(rig.controller.is_locked(Field::Port));
        assert!(rig.controller.is_locked(Field::Study));
        assert!(!rig.controller.is_locked(Field::Filename));
        assert!(matches!(
            rig.controller.set_field(Field::Study, "StudyB"),
            Err(CaptureError::IllegalState(_))
        ));

        rig.controller.set_field(Field::Filename, "p2").unwrap();
        rig.clock.set("2024-05-01 10:05:00");
        rig.controller.start_from_fields().unwrap();

        assert!(rig
            .read("p2")
            .starts_with("Study: StudyA, Start Time: 2024-05-01 10:05:00\n"));
        let connects = rig.connector.connects.borrow();
        assert_eq!(connects.len(), 2);
        assert_eq!(connects[1].0, "COM3");
    }

    #[test]
    fn declining_ends_the_study() {
        let mut rig = rig();
        rig.controller.start("COM3", "StudyA", "p1").unwrap();
        rig.controller.stop().unwrap();
        rig.controller.continue_study(false).unwrap();

        assert_eq!(rig.controller.status(), SessionStatus::Idle);
        for field in Field::ALL {
            assert!(!rig.controller.is_locked(field));
        }
        assert!(!rig.controller.awaiting_continuation());

        // The next study can use another device
        rig.controller.set_field(Field::Port, "COM4").unwrap();
        rig.controller.set_field(Field::Study, "StudyB").unwrap();
        rig.controller.set_field(Field::Filename, "q1").unwrap();
        rig.controller.start_from_fields().unwrap();
        assert!(rig.read("q1").starts_with("Study: StudyB,"));
        assert_eq!(rig.connector.connects.borrow()[1].0, "COM4");
    }

    #[test]
    fn locked_port_and_study_cannot_be_swapped_at_start() {
        let mut rig = rig();
        rig.controller.start("COM3", "StudyA", "p1").unwrap();
        rig.controller.stop().unwrap();
        rig.controller.continue_study(true).unwrap();

        assert!(matches!(
            rig.controller.start("COM4", "StudyA", "p2"),
            Err(CaptureError::IllegalState(_))
        ));
        assert!(matches!(
            rig.controller.start("COM3", "StudyB", "p2"),
            Err(CaptureError::IllegalState(_))
        ));
        assert_eq!(rig.controller.status(), SessionStatus::Stopped);
        assert!(rig.controller.is_locked(Field::Port));
        assert_eq!(rig.controller.field(Field::Port), "COM3");
        assert_eq!(rig.controller.field(Field::Study), "StudyA");
        assert_eq!(rig.connector.connects.borrow().len(), 1);
        assert!(!rig.exists("p2"));

        rig.controller.start("COM3", "StudyA", "p2").unwrap();
        assert!(rig.read("p2").starts_with("Study: StudyA,"));
    }

    #[test]
    fn continuation_needs_a_stopped_session() {
        let mut rig = rig();
        assert!(matches!(
            rig.controller.continue_study(true),
            Err(CaptureError::IllegalState(_))
        ));

        rig.controller.start("COM3", "S", "p1").unwrap();
        assert!(matches!(
            rig.controller.continue_study(false),
            Err(CaptureError::IllegalState(_))
        ));

        rig.controller.stop().unwrap();
        rig.controller.continue_study(false).unwrap();
        assert!(matches!(
            rig.controller.continue_study(false),
            Err(CaptureError::IllegalState(_))
        ));
    }

    #[test]
    fn starting_from_stopped_skips_the_question() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        rig.controller.stop().unwrap();
        rig.controller.start("COM3", "S", "p2").unwrap();

        assert!(rig.controller.is_collecting());
        assert!(!rig.controller.awaiting_continuation());
    }

    #[test]
    fn dropping_mid_session_writes_the_footer() {
        let mut rig = rig();
        rig.controller.start("COM3", "S", "p1").unwrap();
        rig.controller.record(likert(2)).unwrap();
        rig.clock.set("2024-05-01 10:00:09");

        let Rig {
            dir,
            controller,
            connector,
            ..
        } = rig;
        drop(controller);

        let contents = read_to_string(dir.path().join("p1.csv")).unwrap();
        assert!(contents.ends_with("2024-05-01 10:00:00,2\nEnd Time: 2024-05-01 10:00:09\n"));
        assert!(connector.device.is_closed());
    }

    #[test]
    fn editing_fields() {
        let mut rig = rig();
        rig.controller.set_field(Field::Port, "COM3").unwrap();
        rig.controller.set_field(Field::Study, "S").unwrap();
        rig.controller.set_field(Field::Filename, "p1").unwrap();
        rig.controller.start_from_fields().unwrap();

        assert!(matches!(
            rig.controller.set_field(Field::Filename, "p2"),
            Err(CaptureError::IllegalState(_))
        ));
        assert_eq!(rig.controller.field(Field::Filename), "p1");
        assert_eq!(rig.controller.responses(), 0);
        rig.controller.record(likert(4)).unwrap();
        assert_eq!(rig.controller.responses(), 1);
    }
}
