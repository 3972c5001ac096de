//! Sensor driver interface and a simulated accelerometer.
//!
//! The daemon is hardware-agnostic: anything that can be polled for a burst
//! of raw triaxial counts plugs in through [`SensorDriver`]. Real drivers
//! (SPI register protocols, chip-select timing) live out of tree;
//! [`MockAdxl345`] simulates the stream-mode FIFO of an ADXL345 so the
//! daemon can run and be tested without hardware.

use std::time::Instant;

use rand::Rng;
use tracing::info;

use crate::error::Result;

/// One instantaneous triaxial reading in raw device counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// X axis counts.
    pub x: i16,
    /// Y axis counts.
    pub y: i16,
    /// Z axis counts.
    pub z: i16,
}

/// A pollable triaxial accelerometer.
///
/// `poll` drains whatever the hardware has buffered since the last call: a
/// finite, possibly empty burst, never blocking. A `start` failure is fatal
/// to the daemon; the process must not begin logging without a sensor.
pub trait SensorDriver: Send {
    /// Probe the device and begin measurement.
    fn start(&mut self) -> Result<()>;

    /// Drain the hardware buffer. Returns zero or more samples.
    fn poll(&mut self) -> Result<Vec<RawSample>>;

    /// Best-effort halt of the measurement.
    fn stop(&mut self);
}

/// FIFO depth of the simulated sensor, matching the ADXL345.
const FIFO_DEPTH: usize = 32;

/// Simulated output data rate in samples per second.
const OUTPUT_RATE_HZ: f64 = 100.0;

/// Roughly +1 g on Z in raw counts (0.24375 milli-g per count).
const ONE_G_COUNTS: i16 = 4103;

/// Simulated ADXL345 in stream mode: a 100 Hz output rate filling a
/// 32-deep FIFO, with a gravity bias on Z and a little uniform noise.
#[derive(Debug)]
pub struct MockAdxl345 {
    bias: RawSample,
    noise: i16,
    last_poll: Option<Instant>,
    carry: f64,
    running: bool,
}

impl MockAdxl345 {
    /// A sensor lying flat: gravity on Z, small noise on all axes.
    pub fn new() -> Self {
        Self {
            bias: RawSample {
                x: 12,
                y: -9,
                z: ONE_G_COUNTS,
            },
            noise: 4,
            running: false,
            last_poll: None,
            carry: 0.0,
        }
    }

    /// Override the per-axis bias (counts).
    pub fn with_bias(mut self, bias: RawSample) -> Self {
        self.bias = bias;
        self
    }

    /// Override the noise amplitude (counts, uniform in `-noise..=noise`).
    pub fn with_noise(mut self, noise: i16) -> Self {
        self.noise = noise;
        self
    }
}

impl Default for MockAdxl345 {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriver for MockAdxl345 {
    fn start(&mut self) -> Result<()> {
        self.running = true;
        self.last_poll = Some(Instant::now());
        self.carry = 0.0;
        info!(rate_hz = OUTPUT_RATE_HZ, "mock accelerometer started");
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<RawSample>> {
        if !self.running {
            return Ok(Vec::new());
        }

        let now = Instant::now();
        let elapsed = self
            .last_poll
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        self.last_poll = Some(now);

        // Samples produced since the last poll, with the fractional part
        // carried forward. The FIFO overwrites in stream mode, so a late
        // poll yields at most FIFO_DEPTH samples.
        let produced = elapsed * OUTPUT_RATE_HZ + self.carry;
        let count = (produced as usize).min(FIFO_DEPTH);
        self.carry = if produced >= FIFO_DEPTH as f64 {
            0.0
        } else {
            produced - produced.floor()
        };

        let mut rng = rand::thread_rng();
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            let jitter = |rng: &mut rand::rngs::ThreadRng, noise: i16| -> i16 {
                if noise == 0 {
                    0
                } else {
                    rng.gen_range(-noise..=noise)
                }
            };
            samples.push(RawSample {
                x: self.bias.x + jitter(&mut rng, self.noise),
                y: self.bias.y + jitter(&mut rng, self.noise),
                z: self.bias.z + jitter(&mut rng, self.noise),
            });
        }
        Ok(samples)
    }

    fn stop(&mut self) {
        self.running = false;
        info!("mock accelerometer stopped");
    }
}
