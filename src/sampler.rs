//! Sampling thread: drives the sensor, the decimation filter, and the
//! calibration gate.
//!
//! This is a tight poll loop with no inherent pacing: each iteration drains
//! whatever the sensor has buffered and feeds every sample through the
//! filter. Closed readings go to the calibration gate, never straight to
//! the queue. The loop checks the shutdown flag every iteration; an empty
//! poll earns a sub-millisecond sleep so an idle sensor does not spin a
//! core, but the loop never blocks without a bound.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::calibration::{Calibrator, Disposition};
use crate::dayfile::epoch_now;
use crate::filter::DecimationFilter;
use crate::queue::ReadingQueue;
use crate::reading::Reading;
use crate::sensor::SensorDriver;
use crate::state::SharedState;

/// Pause after a poll that returned no samples.
const IDLE_POLL_PAUSE: Duration = Duration::from_micros(500);

/// Pause after a poll error before trying again.
const ERROR_PAUSE: Duration = Duration::from_millis(5);

/// Run the sampling loop until shutdown is requested. Owns the driver for
/// the life of the loop and stops it on the way out.
pub(crate) fn run(
    mut driver: Box<dyn SensorDriver>,
    state: Arc<SharedState>,
    queue: Arc<ReadingQueue>,
    decimation_factor: u32,
    calibration_readings: u32,
) {
    let mut filter = DecimationFilter::new(decimation_factor);
    let mut calibrator = Calibrator::new(calibration_readings);
    info!(
        decimation_factor = filter.factor(),
        calibration_readings, "sampling loop started, calibrating"
    );

    while state.is_running() {
        let samples = match driver.poll() {
            Ok(samples) => samples,
            Err(e) => {
                error!(error = %e, "sensor poll failed");
                thread::sleep(ERROR_PAUSE);
                continue;
            }
        };

        if samples.is_empty() {
            thread::sleep(IDLE_POLL_PAUSE);
            continue;
        }

        for sample in samples {
            let Some(values) = filter.push(sample) else {
                continue;
            };
            let reading = Reading::new(epoch_now(), values);
            match calibrator.ingest(reading) {
                Disposition::Absorbed => {}
                Disposition::Calibrated(offsets) => {
                    if state.publish_offsets(offsets) {
                        info!(
                            x = offsets.x,
                            y = offsets.y,
                            z = offsets.z,
                            "calibration complete, logging readings"
                        );
                    } else {
                        warn!("calibration offsets were already published");
                    }
                }
                Disposition::Pass(reading) => queue.append(reading),
            }
        }
    }

    driver.stop();
    // The writer holds its final drain until this mark is set.
    state.mark_sampling_finished();
    debug!("sampling loop exiting");
}
