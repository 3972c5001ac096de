//! Startup calibration: estimate the per-axis sensor bias.
//!
//! The sensor sits still during startup, so the first readings measure pure
//! bias (including gravity on whichever axis points down). The calibrator
//! consumes a fixed number of readings, averages them, and then passes
//! everything through untouched for the rest of the process lifetime. The
//! offsets themselves are subtracted at persistence time, not here, so the
//! queue always carries raw sums.

use crate::reading::{Axes, Reading};

/// Default number of readings averaged into the offsets.
pub const DEFAULT_CALIBRATION_READINGS: u32 = 50;

/// Calibration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    /// Accumulating readings into the offsets sum; nothing is forwarded.
    Calibrating,
    /// Offsets are final; readings pass through unmodified.
    Active,
}

/// What became of a reading handed to the calibrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Disposition {
    /// Consumed into the calibration sum.
    Absorbed,
    /// This reading completed calibration; here are the finished offsets.
    /// The reading itself was consumed, like every calibration reading.
    Calibrated(Axes),
    /// Calibration is done; forward this reading downstream.
    Pass(Reading),
}

/// One-shot calibration state machine. Transitions `Calibrating` to
/// `Active` exactly once and never back.
#[derive(Debug)]
pub struct Calibrator {
    target: u32,
    seen: u32,
    sum: Axes,
    state: CalibrationState,
}

impl Calibrator {
    /// Create a calibrator that averages `target` readings.
    /// `target` must be at least 1 (enforced by configuration validation).
    pub fn new(target: u32) -> Self {
        Self {
            target: target.max(1),
            seen: 0,
            sum: Axes::default(),
            state: CalibrationState::Calibrating,
        }
    }

    /// Current phase.
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Route one reading through the calibration gate.
    pub fn ingest(&mut self, reading: Reading) -> Disposition {
        match self.state {
            CalibrationState::Active => Disposition::Pass(reading),
            CalibrationState::Calibrating => {
                self.sum += reading.values;
                self.seen += 1;
                if self.seen >= self.target {
                    self.state = CalibrationState::Active;
                    // Divide by the count actually accumulated, truncating.
                    Disposition::Calibrated(self.sum.div_trunc(self.target as i32))
                } else {
                    Disposition::Absorbed
                }
            }
        }
    }
}
