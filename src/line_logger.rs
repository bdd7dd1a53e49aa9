//! Append-only, human readable record of one participant's session.
//!
//! A session appears in the output file as:
//!
//! ```text
//! Study: <study_name>, Start Time: <YYYY-MM-DD HH:MM:SS>
//! Timestamp,Participant,Response
//! <YYYY-MM-DD HH:MM:SS>,<response>
//! ...
//! End Time: <YYYY-MM-DD HH:MM:SS>
//! ```
//!
//! The column header names a `Participant` column that data rows never fill;
//! rows are only ever `timestamp,response`.

use crate::{
    clock::format_timestamp,
    error::CaptureError,
    response::Response,
};

use chrono::NaiveDateTime;
use log::debug;
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// The column header written after every session header.
pub const COLUMN_HEADER: &str = "Timestamp,Participant,Response";

/// Owns the open output file for one participant.
#[derive(Debug)]
pub struct LineLogger {
    path: PathBuf,
    file: Option<File>,
}

impl LineLogger {
    /// Opens `path` for appending, creating it if needed, and writes the
    /// session header and column header. Existing content is never touched.
    pub fn open(
        path: impl AsRef<Path>,
        study_name: &str,
        start_time: &NaiveDateTime,
    ) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut logger = Self {
            path,
            file: Some(file),
        };
        logger.write_line(&format!(
            "Study: {}, Start Time: {}",
            study_name,
            format_timestamp(start_time)
        ))?;
        logger.write_line(COLUMN_HEADER)?;

        debug!("opened {} for study {}", logger.path.display(), study_name);
        Ok(logger)
    }

    /// Writes one data row. The row has reached the disk when this returns.
    pub fn append(
        &mut self,
        timestamp: &NaiveDateTime,
        value: &Response,
    ) -> Result<(), CaptureError> {
        self.write_line(&format!("{},{}", format_timestamp(timestamp), value))
    }

    /// Writes the footer and releases the file. Only the first call does
    /// anything; later calls fail with [CaptureError::IllegalState].
    pub fn close(&mut self, end_time: &NaiveDateTime) -> Result<(), CaptureError> {
        let footer = format!("End Time: {}", format_timestamp(end_time));
        let result = self.write_line(&footer);

        // Release the handle even if the footer didn't make it
        if self.file.take().is_some() {
            debug!("closed {}", self.path.display());
        }
        result
    }

    /// `true` until [LineLogger::close()] has been called.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Where this logger writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Puts a different handle under the logger, e.g. a read-only one so
    /// that writes fail.
    #[cfg(test)]
    pub(crate) fn swap_file(&mut self, file: File) {
        self.file = Some(file);
    }

    fn write_line(&mut self, line: &str) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or(CaptureError::IllegalState("the log file is already closed"))?;

        // Rows already written must survive a crash mid-session
        file.write_all(format!("{}\n", line).as_bytes())?;
        file.sync_data()?;
        Ok(())
    }
}
