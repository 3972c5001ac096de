//! Daemon composition: wires the sensor, sampling thread, queue, and file
//! writer together and owns their lifecycle.
//!
//! Two long-lived OS threads do the work: the sampler (tight poll loop,
//! owns the sensor) and the writer (periodic flush loop, owns the file
//! handle). `start` bootstraps the data directory, probes the sensor
//! (fatal if absent), and spawns both; `stop` raises the shutdown flag,
//! joins the sampler, then joins the writer, whose final flush runs only
//! after the sampler is done queueing.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Result, SeismoError};
use crate::queue::ReadingQueue;
use crate::sampler;
use crate::sensor::SensorDriver;
use crate::state::SharedState;
use crate::writer::{self, rotation_channel, RotationEvent};

/// The accelerometer logging daemon.
pub struct SeismoLogger {
    config: Config,
    state: Arc<SharedState>,
    queue: Arc<ReadingQueue>,
    driver: Mutex<Option<Box<dyn SensorDriver>>>,
    sampler_thread: Mutex<Option<JoinHandle<()>>>,
    writer_thread: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl SeismoLogger {
    /// Create a logger from validated configuration and a sensor driver.
    pub fn new(config: Config, driver: Box<dyn SensorDriver>) -> Self {
        Self {
            config,
            state: Arc::new(SharedState::new()),
            queue: Arc::new(ReadingQueue::new()),
            driver: Mutex::new(Some(driver)),
            sampler_thread: Mutex::new(None),
            writer_thread: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Start the pipeline. Returns the receiver for day-completion
    /// notifications.
    ///
    /// Fails fatally if the sensor does not start or the data directory
    /// cannot be created; a logger that failed to start must not be
    /// started again.
    pub fn start(&self) -> Result<mpsc::Receiver<RotationEvent>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SeismoError::InvalidState(
                "logger was already started".into(),
            ));
        }

        let data_dir = self.config.data_dir();
        fs::create_dir_all(&data_dir)?;

        let mut driver = self
            .driver
            .lock()
            .take()
            .ok_or_else(|| SeismoError::InvalidState("sensor driver already consumed".into()))?;
        driver.start()?;

        let (notify_tx, notify_rx) = rotation_channel();

        let sampler_state = Arc::clone(&self.state);
        let sampler_queue = Arc::clone(&self.queue);
        let decimation = self.config.acquisition.decimation_factor;
        let calibration = self.config.acquisition.calibration_readings;
        let sampler_handle = thread::Builder::new()
            .name("sampler".into())
            .spawn(move || {
                sampler::run(driver, sampler_state, sampler_queue, decimation, calibration)
            })?;
        *self.sampler_thread.lock() = Some(sampler_handle);

        let writer_state = Arc::clone(&self.state);
        let writer_queue = Arc::clone(&self.queue);
        let extension = self.config.storage.extension.clone();
        let flush_interval = Duration::from_secs(self.config.storage.flush_interval_secs);
        let writer_handle = thread::Builder::new()
            .name("day-writer".into())
            .spawn(move || {
                writer::run(
                    writer_state,
                    writer_queue,
                    data_dir,
                    extension,
                    flush_interval,
                    notify_tx,
                )
            })?;
        *self.writer_thread.lock() = Some(writer_handle);

        info!(
            data_dir = %self.config.data_dir().display(),
            "logging daemon started"
        );
        Ok(notify_rx)
    }

    /// Whether the pipeline is currently running.
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && self.state.is_running()
    }

    /// Request shutdown and join both worker threads. The sampler exits
    /// promptly; the writer then flushes everything still queued.
    pub fn stop(&self) {
        if !self.started.load(Ordering::SeqCst) {
            return;
        }
        self.state.request_shutdown();

        if let Some(handle) = self.sampler_thread.lock().take() {
            if handle.join().is_err() {
                error!(thread = "sampler", "worker thread panicked");
            }
        }
        // A panicked sampler never marks itself finished, and the writer's
        // final drain waits on that mark.
        self.state.mark_sampling_finished();

        if let Some(handle) = self.writer_thread.lock().take() {
            if handle.join().is_err() {
                error!(thread = "day-writer", "worker thread panicked");
            }
        }
        info!("logging daemon stopped");
    }
}

impl Drop for SeismoLogger {
    fn drop(&mut self) {
        self.stop();
    }
}
