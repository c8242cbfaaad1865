use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::body_detector::{BodyDetector, PredictionSource};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::config::DetectionConfig;
use crate::shared::frame::Frame;
use crate::video::domain::frame_reader::FrameReader;

use super::pipeline_logger::PipelineLogger;
use super::result_writer::{FrameDetections, ResultWriter};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectSummary {
    pub frames: usize,
    pub cache_hits: usize,
    /// Frames where a detector failed and empty results were written.
    pub degraded_frames: usize,
    pub bodies: usize,
    pub faces: usize,
}

/// Frame-sequence detection pipeline: read → bodies → faces → write.
///
/// Frames are processed strictly in source order on the calling thread;
/// the body detector's cache depends on it. A detector error degrades only
/// the frame it happened on.
pub struct DetectFramesUseCase {
    reader: Box<dyn FrameReader>,
    body_detector: Box<dyn BodyDetector>,
    face_detector: Option<Box<dyn FaceDetector>>,
    writer: Box<dyn ResultWriter>,
    logger: Box<dyn PipelineLogger>,
    config: DetectionConfig,
}

impl DetectFramesUseCase {
    pub fn new(
        reader: Box<dyn FrameReader>,
        body_detector: Box<dyn BodyDetector>,
        face_detector: Option<Box<dyn FaceDetector>>,
        writer: Box<dyn ResultWriter>,
        logger: Box<dyn PipelineLogger>,
        config: DetectionConfig,
    ) -> Self {
        Self {
            reader,
            body_detector,
            face_detector,
            writer,
            logger,
            config,
        }
    }

    pub fn execute(&mut self, input_path: &Path) -> Result<DetectSummary, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input_path)?;
        let total = metadata.total_frames;
        self.logger.info(&format!(
            "Detecting {total} frame(s) from {} ({}x{})",
            input_path.display(),
            metadata.width,
            metadata.height
        ));

        let mut summary = DetectSummary::default();
        for frame in self.reader.frames() {
            let frame = frame?;
            let detections = detect_frame(
                &frame,
                self.body_detector.as_mut(),
                self.face_detector.as_mut(),
                &self.config,
                self.logger.as_mut(),
            );

            summary.frames += 1;
            summary.bodies += detections.bodies.len();
            summary.faces += detections.faces.len();
            if detections.source == PredictionSource::Cached {
                summary.cache_hits += 1;
            }
            if detections.error.is_some() {
                summary.degraded_frames += 1;
            }

            let start = Instant::now();
            self.writer.write(&detections)?;
            self.logger
                .timing("write", start.elapsed().as_secs_f64() * 1000.0);
            self.logger.progress(summary.frames, total);
        }

        self.writer.finish()?;
        self.reader.close();
        if summary.degraded_frames > 0 {
            log::warn!(
                "{} of {} frame(s) were degraded by detector errors",
                summary.degraded_frames,
                summary.frames
            );
        }
        self.logger.summary();
        Ok(summary)
    }
}

fn detect_frame(
    frame: &Frame,
    body_detector: &mut dyn BodyDetector,
    face_detector: Option<&mut Box<dyn FaceDetector>>,
    config: &DetectionConfig,
    logger: &mut dyn PipelineLogger,
) -> FrameDetections {
    let mut errors = Vec::new();

    let start = Instant::now();
    let (bodies, source) = match body_detector.predict(frame, config) {
        Ok(prediction) => (prediction.bodies, prediction.source),
        Err(e) => {
            log::warn!("Frame {}: body detection failed: {e}", frame.index());
            errors.push(e.to_string());
            (Arc::from(Vec::new()), PredictionSource::Unavailable)
        }
    };
    logger.timing("body", start.elapsed().as_secs_f64() * 1000.0);
    logger.metric("cache_hit", if source == PredictionSource::Cached { 1.0 } else { 0.0 });
    logger.metric("bodies", bodies.len() as f64);

    let mut faces = Vec::new();
    if let Some(detector) = face_detector.filter(|_| config.face.enabled) {
        let start = Instant::now();
        match detector.detect(frame, &config.face) {
            Ok(found) => faces = found,
            Err(e) => {
                log::warn!("Frame {}: face detection failed: {e}", frame.index());
                errors.push(e.to_string());
            }
        }
        logger.timing("face", start.elapsed().as_secs_f64() * 1000.0);
        logger.metric("faces", faces.len() as f64);
    }

    FrameDetections {
        frame: frame.index(),
        source,
        bodies,
        faces,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}
