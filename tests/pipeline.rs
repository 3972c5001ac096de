//! End-to-end pipeline test: scripted sensor in, day files out.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use seismolog::record::{DayRecord, RECORD_LEN};
use seismolog::{Config, RawSample, Result, SeismoLogger, SensorDriver};

/// Serves a fixed sequence of samples in small bursts, then goes quiet.
struct ScriptedSensor {
    script: Vec<RawSample>,
    burst: usize,
    cursor: usize,
}

impl ScriptedSensor {
    fn new(script: Vec<RawSample>) -> Self {
        Self {
            script,
            burst: 6,
            cursor: 0,
        }
    }
}

impl SensorDriver for ScriptedSensor {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll(&mut self) -> Result<Vec<RawSample>> {
        let end = (self.cursor + self.burst).min(self.script.len());
        let burst = self.script[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(burst)
    }

    fn stop(&mut self) {}
}

fn day_files(dir: &std::path::Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    files.sort();
    files
}

#[test]
fn scripted_sensor_to_calibrated_day_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.root_dir = dir.path().to_path_buf();
    config.storage.flush_interval_secs = 1;
    config.acquisition.decimation_factor = 4;
    config.acquisition.calibration_readings = 2;

    // Phase 1: 8 samples of the resting bias, consumed by calibration.
    // Offsets become (40, -20, 400) in the sum domain.
    let mut script = vec![
        RawSample {
            x: 10,
            y: -5,
            z: 100
        };
        8
    ];
    // Phase 2: 20 samples shifted by +4/+4/+4 counts: five readings of
    // (56, -4, 416), i.e. (16, 16, 16) after offset subtraction.
    script.extend(vec![
        RawSample {
            x: 14,
            y: -1,
            z: 104
        };
        20
    ]);

    let data_dir = config.data_dir();
    let extension = config.storage.extension.clone();
    let logger = SeismoLogger::new(config, Box::new(ScriptedSensor::new(script)));
    let _rotations = logger.start().unwrap();

    // Wait for the writer to flush all five records (50 bytes total,
    // possibly split across two files if the test straddles midnight).
    let deadline = Instant::now() + Duration::from_secs(15);
    loop {
        let total: u64 = day_files(&data_dir, &extension)
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();
        if total >= (5 * RECORD_LEN) as u64 {
            break;
        }
        assert!(Instant::now() < deadline, "timed out waiting for records");
        std::thread::sleep(Duration::from_millis(100));
    }

    logger.stop();

    let mut records = Vec::new();
    for path in day_files(&data_dir, &extension) {
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len() % RECORD_LEN, 0);
        for chunk in bytes.chunks_exact(RECORD_LEN) {
            records.push(DayRecord::decode(chunk).unwrap());
        }
    }

    assert_eq!(records.len(), 5);
    for record in &records {
        assert_eq!(record.x, 16);
        assert_eq!(record.y, 16);
        assert_eq!(record.z, 16);
        assert!(record.ms_of_day < 86_400_000);
    }
}

#[test]
fn shutdown_flushes_inflight_readings() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.root_dir = dir.path().to_path_buf();
    // Long flush interval: records only reach disk via the final flush.
    config.storage.flush_interval_secs = 60;
    config.acquisition.decimation_factor = 1;
    config.acquisition.calibration_readings = 1;

    let script = vec![RawSample { x: 5, y: 5, z: 5 }; 4];
    let data_dir = config.data_dir();
    let extension = config.storage.extension.clone();
    let logger = SeismoLogger::new(config, Box::new(ScriptedSensor::new(script)));
    let _rotations = logger.start().unwrap();

    // Give the sampler time to calibrate (first reading) and queue the
    // remaining three.
    std::thread::sleep(Duration::from_millis(500));
    logger.stop();

    let total: u64 = day_files(&data_dir, &extension)
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum();
    assert_eq!(total, (3 * RECORD_LEN) as u64);
}
