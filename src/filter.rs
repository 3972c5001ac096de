//! Decimation filter: sums fixed-size groups of raw samples.
//!
//! The sensor produces raw triaxial counts at its output data rate; the
//! filter reduces both rate and noise by accumulating a per-axis running
//! sum and closing one value per `factor` samples. The closed value is the
//! plain sum, deliberately not divided back down: downstream consumers
//! account for the fixed decimation gain, and calibration offsets are
//! computed in the same sum domain.

use crate::reading::Axes;
use crate::sensor::RawSample;

/// Default decimation factor: one output value per 16 raw samples, matching
/// the sensor FIFO watermark.
pub const DEFAULT_DECIMATION_FACTOR: u32 = 16;

/// Summing decimation filter.
#[derive(Debug)]
pub struct DecimationFilter {
    factor: u32,
    sum: Axes,
    count: u32,
}

impl DecimationFilter {
    /// Create a filter that closes one sum per `factor` samples.
    /// `factor` must be at least 1 (enforced by configuration validation).
    pub fn new(factor: u32) -> Self {
        Self {
            factor: factor.max(1),
            sum: Axes::default(),
            count: 0,
        }
    }

    /// Feed one raw sample. Returns the closed per-axis sum when this
    /// sample completes a group, resetting the accumulator.
    pub fn push(&mut self, sample: RawSample) -> Option<Axes> {
        self.sum += Axes::new(
            i32::from(sample.x),
            i32::from(sample.y),
            i32::from(sample.z),
        );
        self.count += 1;
        if self.count >= self.factor {
            let closed = self.sum;
            self.sum = Axes::default();
            self.count = 0;
            Some(closed)
        } else {
            None
        }
    }

    /// The configured decimation factor.
    pub fn factor(&self) -> u32 {
        self.factor
    }
}
