//! File writer: drains the queue, applies calibration offsets, and appends
//! binary records to day-partitioned files.
//!
//! [`DayWriter`] holds the rotation logic and the open file handle;
//! [`run`] wraps it in the periodic writer thread. The writer never starts
//! before calibration offsets are published, keeps the current day file
//! open across cycles, and rotates before writing any record whose
//! timestamp has reached the next UTC day. A record timestamped exactly at
//! the day boundary lands in the new file. On shutdown the final drain
//! waits for the sampling thread to exit first, so a last burst queued
//! during shutdown still reaches disk.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dayfile::DayFile;
use crate::error::{Result, SeismoError};
use crate::queue::ReadingQueue;
use crate::reading::{Axes, Reading};
use crate::record::DayRecord;
use crate::state::SharedState;

/// How often the writer re-checks for calibration completion or an early
/// shutdown while it would otherwise be sleeping.
const WAIT_SLICE: Duration = Duration::from_millis(250);

/// Capacity of the rotation notification channel. Rotations happen once a
/// day; a small bound is plenty.
const ROTATION_CHANNEL_CAPACITY: usize = 16;

/// Notification that a day file was closed because its day ended.
///
/// Delivery is best-effort at-least-once within the process lifetime;
/// consumers must treat repeated notification of the same path as
/// idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationEvent {
    /// Absolute path of the file that was just closed.
    pub path: PathBuf,
}

/// Create the rotation notification channel.
pub fn rotation_channel() -> (mpsc::Sender<RotationEvent>, mpsc::Receiver<RotationEvent>) {
    mpsc::channel(ROTATION_CHANNEL_CAPACITY)
}

/// A batch write that failed partway: everything before `unwritten_from`
/// was persisted, the rest was not.
#[derive(Debug)]
pub struct BatchError {
    /// Index of the first reading that was not written.
    pub unwritten_from: usize,
    /// The underlying failure.
    pub source: SeismoError,
}

/// Converts readings to records and maintains the day-file lifecycle.
pub struct DayWriter {
    dir: PathBuf,
    extension: String,
    offsets: Axes,
    current: Option<DayFile>,
}

impl DayWriter {
    /// Create a writer rooted at `dir` with finished calibration offsets.
    /// No file is opened until the first write needs one.
    pub fn new(dir: PathBuf, extension: impl Into<String>, offsets: Axes) -> Self {
        Self {
            dir,
            extension: extension.into(),
            offsets,
            current: None,
        }
    }

    /// Path of the currently open day file, if any.
    pub fn current_path(&self) -> Option<&std::path::Path> {
        self.current.as_ref().map(DayFile::path)
    }

    /// Write a batch of readings in order, rotating files at UTC day
    /// boundaries. Paths of files closed by rotation are pushed onto
    /// `rotated`. On error, reports how much of the batch was persisted so
    /// the caller can re-queue the remainder.
    pub fn write_batch(
        &mut self,
        batch: &[Reading],
        rotated: &mut Vec<PathBuf>,
    ) -> std::result::Result<(), BatchError> {
        for (index, reading) in batch.iter().enumerate() {
            self.write_one(reading, rotated)
                .map_err(|source| BatchError {
                    unwritten_from: index,
                    source,
                })?;
        }
        Ok(())
    }

    fn write_one(&mut self, reading: &Reading, rotated: &mut Vec<PathBuf>) -> Result<()> {
        let needs_rotation = match &self.current {
            Some(file) => file.is_past_end(reading.timestamp),
            None => true,
        };
        if needs_rotation {
            if let Some(closed) = self.current.take() {
                info!(path = %closed.path().display(), "day complete, rotating file");
                rotated.push(closed.path().to_path_buf());
            }
            self.current = Some(DayFile::open(&self.dir, &self.extension, reading.timestamp)?);
        }

        // The rotation check above guarantees the file covers this
        // timestamp, so the record's day offset is computed against the
        // file actually being written.
        if let Some(file) = self.current.as_mut() {
            let record = DayRecord::from_reading(reading, self.offsets, file.start_time());
            file.append(&record)?;
        }
        Ok(())
    }
}

/// Run the periodic writer loop until shutdown. Waits for calibration,
/// then drains and flushes every `flush_interval`, with one final flush
/// after the sampling thread has exited so in-flight readings reach disk.
pub(crate) fn run(
    state: Arc<SharedState>,
    queue: Arc<ReadingQueue>,
    dir: PathBuf,
    extension: String,
    flush_interval: Duration,
    notify: mpsc::Sender<RotationEvent>,
) {
    // Persistence must not begin before calibration completes. Once the
    // sampler has exited with calibration still unfinished, nothing was
    // ever queued and there is nothing to flush.
    let offsets = loop {
        if let Some(offsets) = state.offsets() {
            break offsets;
        }
        if !state.is_running() && state.sampling_finished() {
            debug!("writer exiting before calibration completed");
            return;
        }
        thread::sleep(WAIT_SLICE);
    };

    let mut writer = DayWriter::new(dir, extension, offsets);
    debug!("file writer started");

    loop {
        let shutting_down = !state.is_running();
        if shutting_down {
            // The sampler may still be queueing its last burst; the final
            // drain must happen after it has exited.
            while !state.sampling_finished() {
                thread::sleep(WAIT_SLICE);
            }
        }

        let batch = queue.drain_all();
        if !batch.is_empty() {
            debug!(readings = batch.len(), "flushing batch");
            let mut rotated = Vec::new();
            if let Err(e) = writer.write_batch(&batch, &mut rotated) {
                // Unwritten readings go back to the head of the queue and
                // are retried on the next cycle.
                warn!(
                    error = %e.source,
                    written = e.unwritten_from,
                    requeued = batch.len() - e.unwritten_from,
                    "batch write failed"
                );
                queue.requeue_front(&batch[e.unwritten_from..]);
            }
            for path in rotated {
                if let Err(e) = notify.try_send(RotationEvent { path }) {
                    warn!(error = %e, "dropping day-completion notification");
                }
            }
        }

        if shutting_down {
            break;
        }
        sleep_interruptibly(&state, flush_interval);
    }

    debug!("file writer exiting");
}

/// Sleep for `total`, waking early if shutdown is requested.
fn sleep_interruptibly(state: &SharedState, total: Duration) {
    let mut remaining = total;
    while !remaining.is_zero() {
        if !state.is_running() {
            return;
        }
        let slice = remaining.min(WAIT_SLICE);
        thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dayfile::SECONDS_PER_DAY;
    use crate::record::RECORD_LEN;
    use tempfile::TempDir;

    // 2021-03-01T00:00:00Z
    const DAY: i64 = 1_614_556_800;

    fn reading(ts: f64, x: i32, y: i32, z: i32) -> Reading {
        Reading::new(ts, Axes::new(x, y, z))
    }

    fn decode_all(path: &std::path::Path) -> Vec<DayRecord> {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(bytes.len() % RECORD_LEN, 0);
        bytes
            .chunks_exact(RECORD_LEN)
            .map(|c| DayRecord::decode(c).unwrap())
            .collect()
    }

    #[test]
    fn writes_calibrated_records_in_order() {
        let dir = TempDir::new().unwrap();
        let offsets = Axes::new(40, -20, 400);
        let mut writer = DayWriter::new(dir.path().to_path_buf(), "ibsd", offsets);

        let base = DAY as f64;
        let batch = vec![
            reading(base + 1.0, 160, -65, 1398),
            reading(base + 2.5, 40, -20, 400),
        ];
        let mut rotated = Vec::new();
        writer.write_batch(&batch, &mut rotated).unwrap();
        assert!(rotated.is_empty());

        let path = writer.current_path().unwrap().to_path_buf();
        assert!(path.ends_with("2021-03-01.ibsd"));
        let records = decode_all(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            DayRecord {
                ms_of_day: 1_000,
                x: 120,
                y: -45,
                z: 998
            }
        );
        assert_eq!(
            records[1],
            DayRecord {
                ms_of_day: 2_500,
                x: 0,
                y: 0,
                z: 0
            }
        );
    }

    #[test]
    fn boundary_reading_lands_in_new_file() {
        let dir = TempDir::new().unwrap();
        let mut writer = DayWriter::new(dir.path().to_path_buf(), "ibsd", Axes::default());

        let end = (DAY + SECONDS_PER_DAY) as f64;
        let batch = vec![
            reading(end - 0.5, 1, 1, 1),
            // Exactly the boundary: must rotate first, then write.
            reading(end, 2, 2, 2),
        ];
        let mut rotated = Vec::new();
        writer.write_batch(&batch, &mut rotated).unwrap();

        assert_eq!(rotated.len(), 1);
        assert!(rotated[0].ends_with("2021-03-01.ibsd"));

        let old = decode_all(&rotated[0]);
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].x, 1);

        let new_path = writer.current_path().unwrap().to_path_buf();
        assert!(new_path.ends_with("2021-03-02.ibsd"));
        let new = decode_all(&new_path);
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].x, 2);
        // Day offset restarts in the new file.
        assert_eq!(new[0].ms_of_day, 0);
    }

    #[test]
    fn rotation_spans_multiple_days_in_one_batch() {
        let dir = TempDir::new().unwrap();
        let mut writer = DayWriter::new(dir.path().to_path_buf(), "ibsd", Axes::default());

        let batch: Vec<Reading> = (0..3)
            .map(|d| reading((DAY + d * SECONDS_PER_DAY) as f64 + 60.0, d as i32, 0, 0))
            .collect();
        let mut rotated = Vec::new();
        writer.write_batch(&batch, &mut rotated).unwrap();

        assert_eq!(rotated.len(), 2);
        assert!(rotated[0].ends_with("2021-03-01.ibsd"));
        assert!(rotated[1].ends_with("2021-03-02.ibsd"));
        assert!(writer
            .current_path()
            .unwrap()
            .ends_with("2021-03-03.ibsd"));
    }

    #[test]
    fn restart_appends_to_existing_day_file() {
        let dir = TempDir::new().unwrap();
        let offsets = Axes::new(1, 1, 1);
        let base = DAY as f64;

        let mut writer = DayWriter::new(dir.path().to_path_buf(), "ibsd", offsets);
        let mut rotated = Vec::new();
        writer
            .write_batch(&[reading(base + 10.0, 11, 21, 31)], &mut rotated)
            .unwrap();
        let path = writer.current_path().unwrap().to_path_buf();
        let before = std::fs::read(&path).unwrap();
        drop(writer);

        // Fresh writer, same directory: must reopen in append mode.
        let mut writer = DayWriter::new(dir.path().to_path_buf(), "ibsd", offsets);
        writer
            .write_batch(&[reading(base + 20.0, 12, 22, 32)], &mut rotated)
            .unwrap();
        drop(writer);

        let after = std::fs::read(&path).unwrap();
        assert_eq!(&after[..before.len()], &before[..]);
        let records = decode_all(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].x, 10);
        assert_eq!(records[1].x, 11);
    }

    #[test]
    fn final_flush_drains_readings_queued_during_shutdown() {
        let dir = TempDir::new().unwrap();
        let state = Arc::new(SharedState::new());
        let queue = Arc::new(ReadingQueue::new());
        state.publish_offsets(Axes::default());
        let (notify, _rotations) = rotation_channel();

        let writer_state = Arc::clone(&state);
        let writer_queue = Arc::clone(&queue);
        let data_dir = dir.path().to_path_buf();
        let handle = thread::spawn(move || {
            run(
                writer_state,
                writer_queue,
                data_dir,
                "ibsd".into(),
                Duration::from_secs(60),
                notify,
            )
        });

        // Shut down while the sampling side is still producing: readings
        // queued after the shutdown request must still reach disk.
        state.request_shutdown();
        thread::sleep(Duration::from_millis(50));
        queue.append(reading(DAY as f64 + 1.0, 7, 7, 7));
        queue.append(reading(DAY as f64 + 2.0, 8, 8, 8));
        state.mark_sampling_finished();
        handle.join().unwrap();

        assert!(queue.is_empty());
        let records = decode_all(&dir.path().join("2021-03-01.ibsd"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].x, 7);
        assert_eq!(records[1].x, 8);
    }

    #[test]
    fn failed_batch_reports_written_prefix() {
        // Point the writer at a directory that cannot be created.
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"not a directory").unwrap();

        let mut writer = DayWriter::new(blocked.join("sub"), "ibsd", Axes::default());
        let mut rotated = Vec::new();
        let err = writer
            .write_batch(&[reading(DAY as f64, 1, 1, 1)], &mut rotated)
            .unwrap_err();
        assert_eq!(err.unwritten_from, 0);
    }
}
