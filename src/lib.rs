//! seismolog: unattended day-partitioned logging daemon for a triaxial
//! accelerometer.
//!
//! The daemon continuously polls an accelerometer, sums raw samples through
//! a decimation filter, estimates the per-axis sensor bias during a startup
//! calibration phase, and persists calibrated measurements as compact
//! 10-byte binary records into one append-only file per UTC calendar day.
//!
//! # Architecture
//!
//! Two OS threads around a mutex-guarded queue:
//!
//! ```text
//! SensorDriver ──> sampler thread ──> ReadingQueue ──> writer thread ──> day files
//!                  (decimate +                         (subtract offsets,
//!                   calibrate)                          rotate at UTC midnight)
//!                                                           │
//!                                                           └──> rotation events
//! ```
//!
//! The sampling thread polls the sensor in a tight loop, closes one
//! [`Reading`] per 16 raw samples, and routes the first 50 readings into
//! the calibration average. The writer thread wakes every few seconds,
//! drains the queue, applies the offsets, and appends records, opening a
//! new file whenever a reading's UTC day has advanced. Day completions are
//! announced on a channel for a downstream catalog.
//!
//! # Example
//!
//! ```no_run
//! use seismolog::{Config, MockAdxl345, SeismoLogger};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let logger = SeismoLogger::new(config, Box::new(MockAdxl345::new()));
//! let mut rotations = logger.start()?;
//!
//! // ... run until a shutdown signal ...
//! logger.stop();
//! # Ok(())
//! # }
//! ```

pub mod calibration;
pub mod config;
pub mod daemon;
pub mod dayfile;
pub mod error;
pub mod filter;
pub mod logging;
pub mod queue;
pub mod reading;
pub mod record;
mod sampler;
pub mod sensor;
pub mod state;
pub mod writer;

pub use config::Config;
pub use daemon::SeismoLogger;
pub use error::{Result, SeismoError};
pub use reading::{Axes, Reading};
pub use record::{DayRecord, MILLI_G_PER_COUNT, RECORD_LEN};
pub use sensor::{MockAdxl345, RawSample, SensorDriver};
pub use writer::RotationEvent;
