//! Core data model for the acquisition pipeline.
//!
//! Samples move through the pipeline in three shapes: raw 16-bit device
//! counts from the sensor FIFO ([`crate::sensor::RawSample`]), per-axis
//! integer triples used for running sums and calibration offsets ([`Axes`]),
//! and timestamped decimated sums ([`Reading`]) handed from the sampling
//! thread to the file writer.
//!
//! Readings carry the *sum* of the decimated raw samples, not their average.
//! Offsets are computed as a mean of such sums, so subtraction at
//! persistence time stays in the same sum domain throughout. Consumers of
//! persisted files must account for the implicit decimation gain.

use std::ops::{Add, AddAssign};

/// A per-axis integer triple.
///
/// Used both for the filter's running sums and for calibration offsets.
/// Arithmetic is plain `i32`; at 16 summed samples of i16 each, sums stay
/// far from overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Axes {
    /// X axis, device counts (summed).
    pub x: i32,
    /// Y axis, device counts (summed).
    pub y: i32,
    /// Z axis, device counts (summed).
    pub z: i32,
}

impl Axes {
    /// Create a triple from its components.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Element-wise truncating division. Used to turn an accumulated
    /// calibration sum into a mean.
    pub fn div_trunc(self, divisor: i32) -> Self {
        Self {
            x: self.x / divisor,
            y: self.y / divisor,
            z: self.z / divisor,
        }
    }
}

impl Add for Axes {
    type Output = Axes;

    fn add(self, rhs: Axes) -> Axes {
        Axes {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl AddAssign for Axes {
    fn add_assign(&mut self, rhs: Axes) {
        *self = *self + rhs;
    }
}

/// One decimated measurement: the sum of a fixed number of raw samples,
/// stamped with the UTC wall-clock time at which the sum was closed.
///
/// Ownership moves from the sampling thread into the shared queue and from
/// there into the writer's local batch; a Reading is never shared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// High-resolution UTC time in seconds since the Unix epoch.
    pub timestamp: f64,
    /// Per-axis raw sums, not yet offset-corrected or scaled.
    pub values: Axes,
}

impl Reading {
    /// Create a reading from a close timestamp and summed values.
    pub fn new(timestamp: f64, values: Axes) -> Self {
        Self { timestamp, values }
    }
}
