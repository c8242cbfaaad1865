use std::time::Instant;

use crate::detection::domain::body_detector::BodyDetector;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::config::DetectionConfig;
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchmarkReport {
    /// First detection, including lazy backend initialization.
    pub warmup_ms: f64,
    pub average_ms: f64,
    pub iterations: usize,
}

/// Repeated detection of one frame to measure steady-state latency.
///
/// Result reuse is switched off for the run, so every iteration performs
/// real inference.
pub struct BenchmarkUseCase {
    body_detector: Box<dyn BodyDetector>,
    face_detector: Option<Box<dyn FaceDetector>>,
    config: DetectionConfig,
}

impl BenchmarkUseCase {
    pub fn new(
        body_detector: Box<dyn BodyDetector>,
        face_detector: Option<Box<dyn FaceDetector>>,
        config: DetectionConfig,
    ) -> Self {
        Self {
            body_detector,
            face_detector,
            config: DetectionConfig {
                skip_frame: false,
                ..config
            },
        }
    }

    pub fn execute(
        &mut self,
        frame: &Frame,
        iterations: usize,
    ) -> Result<BenchmarkReport, Box<dyn std::error::Error>> {
        if iterations == 0 {
            return Err("benchmark needs at least one iteration".into());
        }

        let start = Instant::now();
        self.detect_once(frame)?;
        let warmup_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::info!("Warmup: {warmup_ms:.0}ms");

        let start = Instant::now();
        for _ in 0..iterations {
            self.detect_once(frame)?;
        }
        let average_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;
        log::info!("Average: {average_ms:.1}ms over {iterations} iterations");

        Ok(BenchmarkReport {
            warmup_ms,
            average_ms,
            iterations,
        })
    }

    fn detect_once(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.body_detector.predict(frame, &self.config)?;
        if let Some(detector) = self.face_detector.as_mut().filter(|_| self.config.face.enabled) {
            detector.detect(frame, &self.config.face)?;
        }
        Ok(())
    }
}
