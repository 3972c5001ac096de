//! UTC day math, day file paths, and the append-only day file handle.
//!
//! A day file holds every record whose timestamp falls within one UTC
//! calendar day, `[start, start + 86400)` in epoch seconds. The file is
//! named after that day (`YYYY-MM-DD.<ext>`) and is always opened in append
//! mode so a restarted process continues an existing file rather than
//! truncating it. The one exception is a partial trailing record left by an
//! interrupted write, which is cut off so the file stays a whole number of
//! records.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate};
use tracing::{debug, warn};

use crate::error::{Result, SeismoError};
use crate::record::{DayRecord, RECORD_LEN};

/// Length of a UTC calendar day in seconds.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Current UTC time as high-resolution epoch seconds.
pub fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Epoch seconds of the start of the UTC day containing `timestamp`.
pub fn day_start(timestamp: f64) -> i64 {
    let secs = timestamp.floor() as i64;
    secs - secs.rem_euclid(SECONDS_PER_DAY)
}

/// File name (without directory) for the day starting at `start` epoch
/// seconds: `YYYY-MM-DD.<extension>`.
pub fn day_file_name(start: i64, extension: &str) -> String {
    let date = DateTime::from_timestamp(start, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| start.to_string());
    format!("{date}.{extension}")
}

/// Parse the UTC day start out of a day file path (`.../YYYY-MM-DD.<ext>`).
pub fn day_from_path(path: &Path) -> Result<i64> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SeismoError::InvalidDayFileName {
            path: path.to_path_buf(),
        })?;
    let date = NaiveDate::parse_from_str(stem, "%Y-%m-%d").map_err(|_| {
        SeismoError::InvalidDayFileName {
            path: path.to_path_buf(),
        }
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| SeismoError::InvalidDayFileName {
            path: path.to_path_buf(),
        })?;
    Ok(midnight.and_utc().timestamp())
}

/// An open, append-only day file. The length is tracked so a failed or
/// interrupted write can be rolled back to the last whole record.
pub struct DayFile {
    file: File,
    path: PathBuf,
    start: i64,
    end: i64,
    len: u64,
}

impl DayFile {
    /// Open (creating if missing, never truncating whole records) the day
    /// file in `dir` that covers `timestamp`. A partial trailing record
    /// left by an interrupted process is cut off so appends stay aligned.
    pub fn open(dir: &Path, extension: &str, timestamp: f64) -> Result<Self> {
        let start = day_start(timestamp);
        let path = dir.join(day_file_name(start, extension));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut len = file.metadata()?.len();
        let partial = len % RECORD_LEN as u64;
        if partial != 0 {
            warn!(
                path = %path.display(),
                bytes = partial,
                "trimming partial trailing record"
            );
            len -= partial;
            file.set_len(len)?;
        }
        debug!(path = %path.display(), "opened day file");
        Ok(Self {
            file,
            path,
            start,
            end: start + SECONDS_PER_DAY,
            len,
        })
    }

    /// Whether `timestamp` falls past the end of this file's day, i.e. the
    /// file must be rotated out before a record with that timestamp is
    /// written. A timestamp of exactly `end` belongs to the next day.
    pub fn is_past_end(&self, timestamp: f64) -> bool {
        timestamp >= self.end as f64
    }

    /// Epoch seconds of this file's UTC day start.
    pub fn start_time(&self) -> i64 {
        self.start
    }

    /// Absolute path of this file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one encoded record. On failure the file is cut back to the
    /// last whole record, so a retried reading cannot misalign the file.
    pub fn append(&mut self, record: &DayRecord) -> Result<()> {
        if let Err(err) = self.file.write_all(&record.encode()) {
            let _ = self.file.set_len(self.len);
            return Err(err.into());
        }
        self.len += RECORD_LEN as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // 2021-03-01T00:00:00Z
    const MAR_1_2021: i64 = 1_614_556_800;

    #[test]
    fn day_start_is_utc_midnight() {
        assert_eq!(day_start(3_661.042), 0);
        assert_eq!(day_start(MAR_1_2021 as f64 + 12.5 * 3600.0), MAR_1_2021);
        assert_eq!(
            day_start((MAR_1_2021 + SECONDS_PER_DAY) as f64),
            MAR_1_2021 + SECONDS_PER_DAY
        );
    }

    #[test]
    fn file_name_formats_utc_date() {
        assert_eq!(day_file_name(0, "ibsd"), "1970-01-01.ibsd");
        assert_eq!(day_file_name(MAR_1_2021, "ibsd"), "2021-03-01.ibsd");
    }

    #[test]
    fn day_from_path_round_trips() {
        let name = day_file_name(MAR_1_2021, "ibsd");
        let parsed = day_from_path(Path::new(&name)).unwrap();
        assert_eq!(parsed, MAR_1_2021);

        assert!(day_from_path(Path::new("notes.txt")).is_err());
    }

    #[test]
    fn boundary_timestamp_is_past_end() {
        let dir = TempDir::new().unwrap();
        let file = DayFile::open(dir.path(), "ibsd", MAR_1_2021 as f64 + 10.0).unwrap();
        assert!(!file.is_past_end(MAR_1_2021 as f64 + 86_399.999));
        assert!(file.is_past_end((MAR_1_2021 + SECONDS_PER_DAY) as f64));
    }

    #[test]
    fn reopen_appends_without_truncating() {
        let dir = TempDir::new().unwrap();
        let ts = MAR_1_2021 as f64 + 100.0;
        let record = DayRecord {
            ms_of_day: 100_000,
            x: 1,
            y: 2,
            z: 3,
        };

        let path = {
            let mut file = DayFile::open(dir.path(), "ibsd", ts).unwrap();
            file.append(&record).unwrap();
            file.path().to_path_buf()
        };
        let before = std::fs::read(&path).unwrap();

        let mut file = DayFile::open(dir.path(), "ibsd", ts).unwrap();
        file.append(&record).unwrap();
        drop(file);

        let after = std::fs::read(&path).unwrap();
        assert_eq!(after.len(), before.len() * 2);
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[test]
    fn open_trims_partial_trailing_record() {
        let dir = TempDir::new().unwrap();
        let ts = MAR_1_2021 as f64 + 5.0;
        let record = DayRecord {
            ms_of_day: 5_000,
            x: 1,
            y: 2,
            z: 3,
        };

        let path = {
            let mut file = DayFile::open(dir.path(), "ibsd", ts).unwrap();
            file.append(&record).unwrap();
            file.path().to_path_buf()
        };

        // An interrupted write: a record missing its last six bytes.
        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&record.encode()[..4]);
        std::fs::write(&path, &bytes).unwrap();

        let mut file = DayFile::open(dir.path(), "ibsd", ts).unwrap();
        file.append(&record).unwrap();
        drop(file);

        let after = std::fs::read(&path).unwrap();
        assert_eq!(after.len(), 2 * RECORD_LEN);
        for chunk in after.chunks_exact(RECORD_LEN) {
            assert_eq!(DayRecord::decode(chunk).unwrap(), record);
        }
    }
}
