//! Day file record codec.
//!
//! Each persisted measurement is a fixed 10-byte little-endian record:
//!
//! | Offset | Size | Field                              |
//! |--------|------|------------------------------------|
//! | 0      | 4    | u32 milliseconds since UTC day start |
//! | 4      | 2    | i16 X, calibrated                  |
//! | 6      | 2    | i16 Y, calibrated                  |
//! | 8      | 2    | i16 Z, calibrated                  |
//!
//! Axis values are raw decimated sums with the calibration offset
//! subtracted. They are *not* scaled: one count is about
//! [`MILLI_G_PER_COUNT`] milli-g, and readers must also account for the
//! decimation gain of the summing filter.

use bytes::{Buf, BufMut};

use crate::error::{Result, SeismoError};
use crate::reading::{Axes, Reading};

/// Size of one encoded record in bytes.
pub const RECORD_LEN: usize = 10;

/// Nominal sensor scale factor: milli-g per raw count (full-resolution
/// ADXL345, any range). Not applied by the daemon; documented for file
/// consumers.
pub const MILLI_G_PER_COUNT: f64 = 0.24375;

/// One decoded (or to-be-encoded) day file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRecord {
    /// Milliseconds since the start of the file's UTC day.
    pub ms_of_day: u32,
    /// Calibrated X sum.
    pub x: i16,
    /// Calibrated Y sum.
    pub y: i16,
    /// Calibrated Z sum.
    pub z: i16,
}

impl DayRecord {
    /// Build a record from a reading, subtracting the calibration offsets
    /// and expressing the timestamp relative to `file_start` (UTC day start
    /// in epoch seconds).
    ///
    /// Axis values are truncated to the i16 record field; overflow beyond
    /// that range wraps, a known limitation of the format.
    pub fn from_reading(reading: &Reading, offsets: Axes, file_start: i64) -> Self {
        let ms = (1000.0 * (reading.timestamp - file_start as f64)).round();
        Self {
            ms_of_day: ms as u32,
            x: (reading.values.x - offsets.x) as i16,
            y: (reading.values.y - offsets.y) as i16,
            z: (reading.values.z - offsets.z) as i16,
        }
    }

    /// Encode into the fixed 10-byte wire form.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        let mut cursor = &mut buf[..];
        cursor.put_u32_le(self.ms_of_day);
        cursor.put_i16_le(self.x);
        cursor.put_i16_le(self.y);
        cursor.put_i16_le(self.z);
        buf
    }

    /// Decode one record from the front of `buf`.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < RECORD_LEN {
            return Err(SeismoError::TruncatedRecord {
                len: buf.len(),
                expected: RECORD_LEN,
            });
        }
        Ok(Self {
            ms_of_day: buf.get_u32_le(),
            x: buf.get_i16_le(),
            y: buf.get_i16_le(),
            z: buf.get_i16_le(),
        })
    }
}
