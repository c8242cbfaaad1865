use std::sync::Arc;

use serde::Serialize;

use crate::detection::domain::body_detector::PredictionSource;
use crate::detection::domain::body_result::BodyResult;
use crate::detection::domain::face_detector::FaceResult;

/// Everything detected in one frame.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDetections {
    pub frame: usize,
    pub source: PredictionSource,
    /// Shared with the detector's cache; identical across cache-hit frames.
    pub bodies: Arc<[BodyResult]>,
    pub faces: Vec<FaceResult>,
    /// Set when a detector failed on this frame and its results are empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Sink for per-frame detection records.
pub trait ResultWriter: Send {
    fn write(&mut self, detections: &FrameDetections) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes anything buffered. Called once after the last frame.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
